/*
 * form.rs
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

//! `multipart/form-data` collected into memory (RFC 7578).

use std::io::Read;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use tokio::io::AsyncRead;

use super::async_reader::{AsyncEvent, AsyncMultipartReader};
use super::encoding::TextEncoding;
use super::headers::Headers;
use super::reader::{Event, MultipartReader};
use crate::error::MultipartError;

/// An uploaded file: a form-data section carrying a `filename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    name: String,
    filename: String,
    content_type: Option<String>,
    headers: Headers,
    contents: Bytes,
}

impl FormFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Contents as transmitted.
    pub fn contents(&self) -> &Bytes {
        &self.contents
    }

    /// Contents with `Content-Transfer-Encoding: base64` undone. Other encodings are returned as
    /// transmitted.
    pub fn decoded_contents(&self) -> Result<Bytes, base64::DecodeError> {
        let is_base64 = self
            .headers
            .get("Content-Transfer-Encoding")
            .map_or(false, |cte| cte.trim().eq_ignore_ascii_case("base64"));
        if !is_base64 {
            return Ok(self.contents.clone());
        }
        let compact: Vec<u8> = self
            .contents
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        BASE64.decode(compact).map(Bytes::from)
    }
}

/// Text fields and files of a form, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<FormFile>,
}

impl MultipartForm {
    pub fn read_from<R: Read>(mut reader: MultipartReader<R>) -> Result<Self, MultipartError> {
        let encoding = reader.encoding();
        let mut form = MultipartForm::default();
        while let Some(event) = reader.next_event()? {
            if let Event::Section(mut section) = event {
                let headers = section.headers().clone();
                let contents = section.read_all()?;
                form.collect(headers, contents, encoding);
            }
        }
        Ok(form)
    }

    pub async fn read_from_async<R: AsyncRead + Unpin>(
        mut reader: AsyncMultipartReader<R>,
    ) -> Result<Self, MultipartError> {
        let encoding = reader.encoding();
        let mut form = MultipartForm::default();
        while let Some(event) = reader.next_event().await? {
            if let AsyncEvent::Section(mut section) = event {
                let headers = section.headers().clone();
                let contents = section.read_all().await?;
                form.collect(headers, contents, encoding);
            }
        }
        Ok(form)
    }

    fn collect(&mut self, headers: Headers, contents: Bytes, encoding: TextEncoding) {
        let disposition = headers.content_disposition();
        let name = match disposition.as_ref().and_then(|cd| cd.name()) {
            Some(name) => name.to_string(),
            None => {
                tracing::debug!(headers = headers.len(), "skipping form section without a name");
                return;
            }
        };
        match disposition.and_then(|cd| cd.filename()) {
            Some(filename) => self.files.push(FormFile {
                name,
                filename,
                content_type: headers.content_type().map(str::to_string),
                headers,
                contents,
            }),
            None => {
                let value = encoding.decode(&contents).into_owned();
                self.fields.push((name, value));
            }
        }
    }

    /// First field with this name.
    pub fn get_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_file(&self, name: &str) -> Option<&FormFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[FormFile] {
        &self.files
    }
}
