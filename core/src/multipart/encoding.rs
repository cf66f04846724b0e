/*
 * encoding.rs
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

//! Text encodings for header lines and text fields.

use std::borrow::Cow;

/// Encoding used to turn header bytes into text. Section content is never decoded by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Invalid sequences become U+FFFD.
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// Bytes above 0x7F become U+FFFD.
    Ascii,
}

impl TextEncoding {
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes),
            TextEncoding::Latin1 => match std::str::from_utf8(bytes) {
                Ok(s) if s.is_ascii() => Cow::Borrowed(s),
                _ => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
            },
            TextEncoding::Ascii => match std::str::from_utf8(bytes) {
                Ok(s) if s.is_ascii() => Cow::Borrowed(s),
                _ => Cow::Owned(
                    bytes
                        .iter()
                        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                        .collect(),
                ),
            },
        }
    }

    /// Look up an encoding by charset label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(TextEncoding::Utf8),
            "iso-8859-1" | "latin1" | "l1" | "iso_8859-1" => Some(TextEncoding::Latin1),
            "us-ascii" | "ascii" => Some(TextEncoding::Ascii),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_non_ascii_through() {
        assert_eq!(TextEncoding::Utf8.decode("naïve.txt".as_bytes()), "naïve.txt");
        assert_eq!(TextEncoding::Utf8.decode(b"a\xffb"), "a\u{fffd}b");
    }

    #[test]
    fn latin1_maps_bytes() {
        assert_eq!(TextEncoding::Latin1.decode(b"caf\xe9"), "café");
    }

    #[test]
    fn ascii_replaces_high_bytes() {
        assert_eq!(TextEncoding::Ascii.decode(b"caf\xe9"), "caf\u{fffd}");
        assert!(matches!(TextEncoding::Ascii.decode(b"plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn labels() {
        assert_eq!(TextEncoding::from_label("UTF-8"), Some(TextEncoding::Utf8));
        assert_eq!(TextEncoding::from_label(" ISO-8859-1 "), Some(TextEncoding::Latin1));
        assert_eq!(TextEncoding::from_label("koi8-r"), None);
    }
}
