/*
 * writer.rs
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

//! Building `multipart/*` bodies.

use std::io::{self, Write};

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::headers::Headers;
use super::utils::{find_bytes, is_valid_boundary};
use crate::error::MultipartError;

const GENERATED_BOUNDARY_LEN: usize = 32;

#[derive(Debug, Clone)]
struct Part {
    headers: Headers,
    content: Bytes,
}

/// Accumulates parts and serializes them with CRLF framing.
#[derive(Debug, Clone)]
pub struct MultipartWriter {
    boundary: String,
    subtype: String,
    preamble: Option<Bytes>,
    epilogue: Option<Bytes>,
    parts: Vec<Part>,
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartWriter {
    /// `multipart/form-data` writer with a random boundary.
    pub fn new() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_BOUNDARY_LEN)
            .map(char::from)
            .collect();
        Self::unchecked(format!("cartella-{}", suffix))
    }

    pub fn with_boundary(boundary: &str) -> Result<Self, MultipartError> {
        if !is_valid_boundary(boundary) {
            return Err(MultipartError::InvalidBoundary(boundary.to_string()));
        }
        Ok(Self::unchecked(boundary.to_string()))
    }

    fn unchecked(boundary: String) -> Self {
        Self {
            boundary,
            subtype: "form-data".to_string(),
            preamble: None,
            epilogue: None,
            parts: Vec::new(),
        }
    }

    /// Media subtype for `content_type()`, e.g. `mixed`.
    #[must_use]
    pub fn subtype(mut self, subtype: &str) -> Self {
        self.subtype = subtype.to_string();
        self
    }

    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<Bytes>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    #[must_use]
    pub fn with_epilogue(mut self, epilogue: impl Into<Bytes>) -> Self {
        self.epilogue = Some(epilogue.into());
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Header value announcing this body, e.g. `multipart/form-data; boundary="..."`.
    pub fn content_type(&self) -> String {
        format!("multipart/{}; boundary=\"{}\"", self.subtype, self.boundary)
    }

    pub fn add_part(&mut self, headers: Headers, content: impl Into<Bytes>) -> &mut Self {
        self.parts.push(Part {
            headers,
            content: content.into(),
        });
        self
    }

    pub fn add_field(&mut self, name: &str, value: &str) -> &mut Self {
        let mut headers = Headers::new();
        headers.append(
            "Content-Disposition",
            format!("form-data; name={}", quote(name)),
        );
        self.add_part(headers, Bytes::copy_from_slice(value.as_bytes()))
    }

    pub fn add_file(
        &mut self,
        name: &str,
        filename: &str,
        content_type: Option<&str>,
        content: impl Into<Bytes>,
    ) -> &mut Self {
        let mut disposition = format!(
            "form-data; name={}; filename={}",
            quote(name),
            quote(filename)
        );
        if !filename.is_ascii() {
            disposition.push_str("; filename*=UTF-8''");
            disposition.extend(utf8_percent_encode(filename, NON_ALPHANUMERIC));
        }
        let mut headers = Headers::new();
        headers.append("Content-Disposition", disposition);
        headers.append(
            "Content-Type",
            content_type.unwrap_or("application/octet-stream"),
        );
        self.add_part(headers, content)
    }

    /// Serialize the body. Fails with `InvalidInput`, before writing anything, when the preamble or
    /// a part's content contains the delimiter, or a header contains CR or LF.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        let dash_boundary = format!("--{}", self.boundary);
        let delimiter = format!("\r\n{}", dash_boundary);
        if let Some(preamble) = &self.preamble {
            if preamble.starts_with(dash_boundary.as_bytes())
                || find_bytes(preamble, delimiter.as_bytes(), 0).is_some()
            {
                return Err(invalid_input(format!(
                    "preamble contains boundary {:?}",
                    self.boundary
                )));
            }
        }
        for part in &self.parts {
            if find_bytes(&part.content, delimiter.as_bytes(), 0).is_some() {
                return Err(invalid_input(format!(
                    "part content contains boundary {:?}",
                    self.boundary
                )));
            }
            if let Some((name, _)) = part
                .headers
                .iter()
                .find(|(name, value)| has_line_break(name) || has_line_break(value))
            {
                return Err(invalid_input(format!("line break in header {:?}", name)));
            }
        }
        if let Some(preamble) = &self.preamble {
            out.write_all(preamble)?;
            out.write_all(b"\r\n")?;
        }
        for part in &self.parts {
            out.write_all(dash_boundary.as_bytes())?;
            out.write_all(b"\r\n")?;
            for (name, value) in part.headers.iter() {
                write!(out, "{}: {}\r\n", name, value)?;
            }
            out.write_all(b"\r\n")?;
            out.write_all(&part.content)?;
            out.write_all(b"\r\n")?;
        }
        out.write_all(dash_boundary.as_bytes())?;
        out.write_all(b"--\r\n")?;
        if let Some(epilogue) = &self.epilogue {
            out.write_all(epilogue)?;
        }
        out.flush()
    }

    pub fn to_bytes(&self) -> io::Result<Bytes> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(Bytes::from(out))
    }
}

fn invalid_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

fn has_line_break(s: &str) -> bool {
    s.contains(|c: char| c == '\r' || c == '\n')
}

/// Quoted-string for a Content-Disposition parameter. CR and LF are percent-encoded as in
/// RFC 7578 section 2.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\r' => quoted.push_str("%0D"),
            '\n' => quoted.push_str("%0A"),
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::{Event, MultipartReader, TextEncoding};

    #[test]
    fn framing() {
        let mut writer = MultipartWriter::with_boundary("xyz").unwrap();
        writer.add_field("a", "1");
        assert_eq!(
            &writer.to_bytes().unwrap()[..],
            &b"--xyz\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--xyz--\r\n"[..]
        );
    }

    #[test]
    fn preamble_and_epilogue() {
        let writer = MultipartWriter::with_boundary("xyz")
            .unwrap()
            .with_preamble("pre")
            .with_epilogue("post");
        assert_eq!(&writer.to_bytes().unwrap()[..], &b"pre\r\n--xyz--\r\npost"[..]);
    }

    #[test]
    fn random_boundaries_are_valid_and_distinct() {
        let a = MultipartWriter::new();
        let b = MultipartWriter::new();
        assert!(is_valid_boundary(a.boundary()));
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.content_type().starts_with("multipart/form-data; boundary=\"cartella-"));
    }

    #[test]
    fn quotes_parameters() {
        let mut writer = MultipartWriter::with_boundary("xyz").unwrap();
        writer.add_file("f", "say \"hi\".txt", Some("text/plain"), "x");
        let body = writer.to_bytes().unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("filename=\"say \\\"hi\\\".txt\""));
        assert!(text.contains("Content-Type: text/plain\r\n"));
    }

    #[test]
    fn refuses_content_containing_delimiter() {
        let mut writer = MultipartWriter::with_boundary("xyz").unwrap();
        writer.add_field("a", "line\r\n--xyz\r\n");
        let err = writer.to_bytes().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn line_breaks_in_names_stay_inside_the_header() {
        let mut writer = MultipartWriter::with_boundary("xyz").unwrap();
        writer
            .add_field("a\"\r\nX-Injected: yes\r\nY: \"", "v")
            .add_file("f", "two\nlines.txt", None, "x");
        let body = writer.to_bytes().unwrap();
        let mut reader = MultipartReader::new(&body[..], TextEncoding::Utf8, "xyz").unwrap();
        let mut headers = Vec::new();
        while let Some(event) = reader.next_event().unwrap() {
            if let Event::Section(section) = event {
                headers.push(section.headers().clone());
            }
        }
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].len(), 1);
        assert!(!headers[0].contains("X-Injected"));
        assert_eq!(
            headers[0].content_disposition().unwrap().name(),
            Some("a\"%0D%0AX-Injected: yes%0D%0AY: \"")
        );
        assert_eq!(
            headers[1].content_disposition().unwrap().filename().as_deref(),
            Some("two%0Alines.txt")
        );
    }

    #[test]
    fn refuses_line_breaks_in_part_headers() {
        let mut writer = MultipartWriter::with_boundary("xyz").unwrap();
        writer.add_file("f", "a.txt", Some("text/plain\r\nX-Injected: yes"), "x");
        assert_eq!(writer.to_bytes().unwrap_err().kind(), io::ErrorKind::InvalidInput);

        let mut headers = Headers::new();
        headers.append("X-Bad\r\nName", "v");
        let mut writer = MultipartWriter::with_boundary("xyz").unwrap();
        writer.add_part(headers, "x");
        assert_eq!(writer.to_bytes().unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn refuses_preamble_containing_delimiter() {
        for preamble in ["intro\r\n--xyz\r\nmore", "--xyz\r\nstarts with it"] {
            let writer = MultipartWriter::with_boundary("xyz")
                .unwrap()
                .with_preamble(preamble);
            assert_eq!(
                writer.to_bytes().unwrap_err().kind(),
                io::ErrorKind::InvalidInput,
                "preamble {:?}",
                preamble
            );
        }
        let writer = MultipartWriter::with_boundary("xyz")
            .unwrap()
            .with_preamble("mentions --xyz mid-line");
        assert!(writer.to_bytes().is_ok());
    }

    #[test]
    fn rejects_bad_boundary() {
        assert!(MultipartWriter::with_boundary("").is_err());
        assert!(MultipartWriter::with_boundary("trailing ").is_err());
    }
}
