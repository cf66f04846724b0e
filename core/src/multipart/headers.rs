/*
 * headers.rs
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

//! Section headers: an ordered multimap with case-insensitive names.

use super::content_disposition::{parse_content_disposition, ContentDisposition};
use super::encoding::TextEncoding;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Value of the last header with this name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for this name, in document order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn content_disposition(&self) -> Option<ContentDisposition> {
        self.get("Content-Disposition").and_then(parse_content_disposition)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get("Content-Type")
    }

    /// Parse a header block (lines separated by CRLF, blank line already removed).
    /// Lines without a colon, or with an empty name, are skipped.
    pub fn parse(block: &[u8], encoding: TextEncoding) -> Self {
        let mut headers = Headers::new();
        for line in split_lines(block) {
            if line.is_empty() {
                continue;
            }
            match split_header(line) {
                Some((name, value)) => {
                    let name = encoding.decode(name);
                    let value = encoding.decode(value);
                    headers.append(name.trim(), value.trim());
                }
                None => {
                    tracing::debug!(line = %encoding.decode(line), "skipping malformed header line");
                }
            }
        }
        headers
    }
}

fn split_lines(block: &[u8]) -> impl Iterator<Item = &[u8]> {
    block
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn split_header(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let colon = line.iter().position(|&b| b == b':')?;
    let name = &line[..colon];
    if name.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    Some((name, &line[colon + 1..]))
}
