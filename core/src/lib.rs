/*
 * lib.rs
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

//! Cartella core: RFC 6570 URI templates and streaming multipart bodies, the two halves of
//! building HTTP requests and reading form uploads.

pub mod config;
pub mod error;
pub mod multipart;
pub mod uri_template;

pub use config::MultipartConfig;
pub use error::MultipartError;
pub use multipart::{AsyncMultipartReader, MultipartReader, MultipartWriter, TextEncoding};
pub use uri_template::{expand, Parameters, UriTemplate, Value, VariableLookup};
