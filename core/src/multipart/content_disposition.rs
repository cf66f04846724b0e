/*
 * content_disposition.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Cartella, an HTTP client toolkit.
 *
 * Cartella is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Cartella is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Cartella.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Content-Disposition (RFC 2183, RFC 7578) and the `name=value; ...` parameter lists shared with
//! Content-Type.

use percent_encoding::percent_decode_str;

use super::utils::is_token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    disposition_type: String,
    /// Names lowercased; first occurrence wins.
    parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    pub fn new(disposition_type: impl Into<String>, parameters: Vec<(String, String)>) -> Self {
        let mut deduped: Vec<(String, String)> = Vec::with_capacity(parameters.len());
        for (name, value) in parameters {
            let name = name.to_lowercase();
            if !deduped.iter().any(|(n, _)| *n == name) {
                deduped.push((name, value));
            }
        }
        Self {
            disposition_type: disposition_type.into(),
            parameters: deduped,
        }
    }

    pub fn get_disposition_type(&self) -> &str {
        &self.disposition_type
    }

    pub fn is_disposition_type(&self, t: &str) -> bool {
        self.disposition_type.eq_ignore_ascii_case(t)
    }

    pub fn get_parameter(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.parameters
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.get_parameter(name).is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.get_parameter("name")
    }

    /// `filename*` (RFC 5987 ext-value) when present and decodable, else `filename`.
    pub fn filename(&self) -> Option<String> {
        self.get_parameter("filename*")
            .and_then(decode_ext_value)
            .or_else(|| self.get_parameter("filename").map(str::to_string))
    }
}

pub fn parse_content_disposition(value: &str) -> Option<ContentDisposition> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (disp_part, params_part) = match value.find(';') {
        Some(i) => {
            let (a, b) = value.split_at(i);
            (a.trim(), b[1..].trim())
        }
        None => (value, ""),
    };
    if !is_token(disp_part) {
        return None;
    }
    Some(ContentDisposition::new(disp_part, parse_parameter_list(params_part)))
}

/// Parse a semicolon-separated parameter list (`name=value; name="value"`).
/// Names must be tokens; entries without `=` are skipped.
pub fn parse_parameter_list(params_part: &str) -> Vec<(String, String)> {
    let mut parameters = Vec::new();
    let bytes = params_part.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        while pos < len && (bytes[pos] == b';' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        let entry_end = bytes[pos..]
            .iter()
            .position(|&b| b == b';')
            .map_or(len, |i| pos + i);
        let eq_abs = match bytes[pos..entry_end].iter().position(|&b| b == b'=') {
            Some(eq) => pos + eq,
            None => {
                pos = entry_end;
                continue;
            }
        };
        let name = params_part[pos..eq_abs].trim();
        if !is_token(name) {
            pos = entry_end;
            continue;
        }
        pos = eq_abs + 1;
        while pos < len && bytes[pos] == b' ' {
            pos += 1;
        }
        let value = if pos < len && bytes[pos] == b'"' {
            pos += 1;
            let mut v = Vec::new();
            while pos < len {
                let c = bytes[pos];
                if c == b'\\' && pos + 1 < len {
                    v.push(bytes[pos + 1]);
                    pos += 2;
                } else if c == b'"' {
                    pos += 1;
                    break;
                } else {
                    v.push(c);
                    pos += 1;
                }
            }
            String::from_utf8_lossy(&v).into_owned()
        } else {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b';')
                .map_or(len, |i| pos + i);
            let v = params_part[pos..end].trim().to_string();
            pos = end;
            v
        };
        parameters.push((name.to_string(), value));
    }
    parameters
}

/// `boundary` parameter of a `multipart/*` Content-Type value.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let (media_type, params) = match content_type.find(';') {
        Some(i) => (&content_type[..i], &content_type[i + 1..]),
        None => return None,
    };
    let media_type = media_type.trim();
    let is_multipart = media_type
        .split_once('/')
        .map_or(false, |(primary, _)| primary.trim().eq_ignore_ascii_case("multipart"));
    if !is_multipart {
        return None;
    }
    parse_parameter_list(params)
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// `charset'language'percent-encoded` (RFC 5987). Only UTF-8 and ISO-8859-1 are decoded.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    let decoded = percent_decode_str(encoded);
    if charset.eq_ignore_ascii_case("utf-8") {
        decoded.decode_utf8().ok().map(|s| s.into_owned())
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(decoded.map(|b| b as char).collect())
    } else {
        None
    }
}
