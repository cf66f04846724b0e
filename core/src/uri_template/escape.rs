/*
 * escape.rs
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

//! Percent-encoding of substituted values.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};

/// Form-style unreserved set: everything except ALPHA, DIGIT and `- _ . ! * ( ) ~` is encoded.
/// Space is left alone here and rewritten to `+` afterwards.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'*')
    .remove(b'(')
    .remove(b')')
    .remove(b'~')
    .remove(b' ');

/// Reserved characters pass through; only controls and non-ASCII are encoded.
const RESERVED_ALLOWED: &AsciiSet = CONTROLS;

/// Encode every reserved character (`/ : ? # [ ] @ $ & ' + , ; =` and the rest).
pub fn escape_unreserved(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED)
        .to_string()
        .replace(' ', "+")
}

/// Leave reserved characters literal; space still becomes `+`.
pub fn escape_reserved(value: &str) -> String {
    utf8_percent_encode(value, RESERVED_ALLOWED)
        .to_string()
        .replace(' ', "+")
}

/// Keep at most `max_length` characters (not bytes).
pub fn truncate(value: &str, max_length: Option<usize>) -> &str {
    match max_length {
        Some(n) => match value.char_indices().nth(n) {
            Some((end, _)) => &value[..end],
            None => value,
        },
        None => value,
    }
}
