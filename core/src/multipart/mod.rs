/*
 * mod.rs
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

//! Streaming `multipart/*` parsing (RFC 2046, RFC 7578) and generation.
//!
//! The boundary search lives in a push-fed [`MultipartScanner`]. [`MultipartReader`] drives it
//! from a blocking `std::io::Read`, [`AsyncMultipartReader`] from a tokio `AsyncRead`. Both yield
//! events in document order: one preamble, one event per section, one epilogue. Section content is
//! streamed through `Read`/`AsyncRead` and never buffered whole by the parser.

mod async_reader;
mod buffer;
mod content_disposition;
mod encoding;
mod form;
mod headers;
mod reader;
mod scanner;
mod utils;
mod writer;

pub use async_reader::{AsyncEvent, AsyncMultipartReader, AsyncSection};
pub use content_disposition::{
    boundary_from_content_type, parse_content_disposition, parse_parameter_list, ContentDisposition,
};
pub use encoding::TextEncoding;
pub use form::{FormFile, MultipartForm};
pub use headers::Headers;
pub use reader::{parse, Event, MultipartReader, Section};
pub use scanner::{BodyStep, MultipartScanner, ScanState, ScanStep};
pub use utils::{is_boundary_char, is_token, is_token_char, is_valid_boundary};
pub use writer::MultipartWriter;
