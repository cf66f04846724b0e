/*
 * async_reader.rs
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

//! Multipart reader over a tokio `AsyncRead`. Same events and errors as the blocking reader.

use std::future::poll_fn;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use super::content_disposition::boundary_from_content_type;
use super::encoding::TextEncoding;
use super::headers::Headers;
use super::scanner::{BodyStep, MultipartScanner, ScanStep};
use crate::config::MultipartConfig;
use crate::error::MultipartError;

#[derive(Debug)]
pub enum AsyncEvent<'a, R: AsyncRead + Unpin> {
    Preamble(Bytes),
    Section(AsyncSection<'a, R>),
    Epilogue(Bytes),
}

#[derive(Debug)]
pub struct AsyncMultipartReader<R: AsyncRead + Unpin> {
    source: R,
    scanner: MultipartScanner,
    chunk: Vec<u8>,
}

impl<R: AsyncRead + Unpin> AsyncMultipartReader<R> {
    pub fn new(source: R, encoding: TextEncoding, boundary: &str) -> Result<Self, MultipartError> {
        Self::with_config(source, encoding, boundary, MultipartConfig::default())
    }

    pub fn with_config(
        source: R,
        encoding: TextEncoding,
        boundary: &str,
        config: MultipartConfig,
    ) -> Result<Self, MultipartError> {
        let scanner = MultipartScanner::with_config(boundary, encoding, config)?;
        Ok(Self {
            source,
            scanner,
            chunk: vec![0; config.get_chunk_size()],
        })
    }

    pub fn from_content_type(
        source: R,
        encoding: TextEncoding,
        content_type: &str,
    ) -> Result<Self, MultipartError> {
        let boundary = boundary_from_content_type(content_type)
            .ok_or_else(|| MultipartError::InvalidBoundary(content_type.to_string()))?;
        Self::new(source, encoding, &boundary)
    }

    pub fn encoding(&self) -> TextEncoding {
        self.scanner.encoding()
    }

    /// Next event, or `None` when the body is finished. An unread section is skipped first.
    pub async fn next_event(&mut self) -> Result<Option<AsyncEvent<'_, R>>, MultipartError> {
        loop {
            match self.scanner.next_step()? {
                ScanStep::NeedInput => {
                    poll_fn(|cx| self.poll_fill(cx))
                        .await
                        .map_err(MultipartError::Io)?;
                }
                ScanStep::Preamble(data) => return Ok(Some(AsyncEvent::Preamble(data))),
                ScanStep::Epilogue(data) => return Ok(Some(AsyncEvent::Epilogue(data))),
                ScanStep::Done => return Ok(None),
                ScanStep::Section(headers) => {
                    return Ok(Some(AsyncEvent::Section(AsyncSection {
                        headers,
                        reader: self,
                    })))
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn poll_fill(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        loop {
            let mut read_buf = ReadBuf::new(&mut self.chunk);
            match ready!(Pin::new(&mut self.source).poll_read(cx, &mut read_buf)) {
                Ok(()) => {
                    let filled = read_buf.filled();
                    if filled.is_empty() {
                        self.scanner.finish();
                    } else {
                        self.scanner.feed(filled);
                    }
                    return Poll::Ready(Ok(()));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let error = self.scanner.abort(MultipartError::Io(e));
                    return Poll::Ready(Err(error.into_io()));
                }
            }
        }
    }

    fn poll_read_body(&mut self, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        loop {
            match self.scanner.read_body(buf.initialize_unfilled()) {
                Ok(BodyStep::Data(n)) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Ok(BodyStep::End) => return Poll::Ready(Ok(())),
                Ok(BodyStep::NeedInput) => ready!(self.poll_fill(cx))?,
                Err(e) => return Poll::Ready(Err(e.into_io())),
            }
        }
    }
}

/// A section whose content is read through `AsyncRead`.
#[derive(Debug)]
pub struct AsyncSection<'a, R: AsyncRead + Unpin> {
    headers: Headers,
    reader: &'a mut AsyncMultipartReader<R>,
}

impl<R: AsyncRead + Unpin> AsyncSection<'_, R> {
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn name(&self) -> Option<String> {
        self.headers
            .content_disposition()
            .and_then(|cd| cd.name().map(str::to_string))
    }

    pub fn filename(&self) -> Option<String> {
        self.headers.content_disposition().and_then(|cd| cd.filename())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.content_type()
    }

    pub fn encoding(&self) -> TextEncoding {
        self.reader.encoding()
    }

    pub async fn read_all(&mut self) -> Result<Bytes, MultipartError> {
        let mut out = Vec::new();
        self.read_to_end(&mut out)
            .await
            .map_err(MultipartError::from_io)?;
        Ok(Bytes::from(out))
    }

    pub async fn text(&mut self) -> Result<String, MultipartError> {
        let encoding = self.encoding();
        let bytes = self.read_all().await?;
        Ok(encoding.decode(&bytes).into_owned())
    }

    pub async fn skip(mut self) -> Result<(), MultipartError> {
        tokio::io::copy(&mut self, &mut tokio::io::sink())
            .await
            .map_err(MultipartError::from_io)?;
        Ok(())
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for AsyncSection<'_, R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.get_mut().reader.poll_read_body(cx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_sections() {
        let body: &[u8] =
            b"--b\r\nContent-Disposition: form-data; name=\"one\"\r\n\r\nfirst\r\n--b\r\nContent-Disposition: form-data; name=\"two\"\r\n\r\nsecond\r\n--b--\r\n";
        let mut reader = AsyncMultipartReader::new(body, TextEncoding::Utf8, "b").unwrap();
        let mut fields = Vec::new();
        while let Some(event) = reader.next_event().await.unwrap() {
            if let AsyncEvent::Section(mut section) = event {
                let name = section.name().unwrap();
                fields.push((name, section.text().await.unwrap()));
            }
        }
        assert_eq!(
            fields,
            vec![
                ("one".to_string(), "first".to_string()),
                ("two".to_string(), "second".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn unterminated_body_surfaces_from_section() {
        let body: &[u8] = b"--b\r\n\r\ndangling";
        let mut reader = AsyncMultipartReader::new(body, TextEncoding::Utf8, "b").unwrap();
        reader.next_event().await.unwrap();
        let mut section = match reader.next_event().await.unwrap() {
            Some(AsyncEvent::Section(s)) => s,
            other => panic!("expected section, got {:?}", other),
        };
        let err = section.read_all().await.unwrap_err();
        assert!(matches!(err, MultipartError::UnterminatedBody));
        let mut buf = [0u8; 8];
        let err = section.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    /// Fails the first poll, then serves `data`.
    struct FailOnce {
        failed: bool,
        data: &'static [u8],
    }

    impl AsyncRead for FailOnce {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if !self.failed {
                self.failed = true;
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
            }
            Pin::new(&mut self.data).poll_read(cx, buf)
        }
    }

    #[tokio::test]
    async fn source_error_finishes_reader() {
        let source = FailOnce {
            failed: false,
            data: b"--b\r\n\r\nx\r\n--b--",
        };
        let mut reader = AsyncMultipartReader::new(source, TextEncoding::Utf8, "b").unwrap();
        match reader.next_event().await {
            Err(MultipartError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected source error, got {:?}", other.map(|e| e.is_some())),
        }
        assert!(reader.next_event().await.unwrap().is_none());
    }
}
