/*
 * reader.rs
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

//! Blocking multipart reader over any `std::io::Read`.

use std::io::{self, Read};

use bytes::Bytes;

use super::content_disposition::boundary_from_content_type;
use super::encoding::TextEncoding;
use super::headers::Headers;
use super::scanner::{BodyStep, MultipartScanner, ScanStep};
use crate::config::MultipartConfig;
use crate::error::MultipartError;

/// One parse event. A `Section` borrows the reader, so it must be dropped before asking for the
/// next event.
#[derive(Debug)]
pub enum Event<'a, R: Read> {
    Preamble(Bytes),
    Section(Section<'a, R>),
    Epilogue(Bytes),
}

/// Pull-style parser for a `multipart/*` body.
///
/// ```
/// use std::io::Read;
/// use cartella_core::multipart::{Event, MultipartReader, TextEncoding};
///
/// let body = b"--xyz\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nhello\r\n--xyz--\r\n";
/// let mut reader = MultipartReader::new(&body[..], TextEncoding::Utf8, "xyz").unwrap();
/// while let Some(event) = reader.next_event().unwrap() {
///     if let Event::Section(mut section) = event {
///         let mut text = String::new();
///         section.read_to_string(&mut text).unwrap();
///         assert_eq!(section.name().as_deref(), Some("a"));
///         assert_eq!(text, "hello");
///     }
/// }
/// ```
#[derive(Debug)]
pub struct MultipartReader<R: Read> {
    source: R,
    scanner: MultipartScanner,
    chunk: Vec<u8>,
}

impl<R: Read> MultipartReader<R> {
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

    /// Build from a `Content-Type` header value carrying a `boundary` parameter.
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

    /// Next event, or `None` when the body is finished. Any unread part of the previous section
    /// is skipped first. After an error the reader stays finished.
    pub fn next_event(&mut self) -> Result<Option<Event<'_, R>>, MultipartError> {
        loop {
            match self.scanner.next_step()? {
                ScanStep::NeedInput => self.fill()?,
                ScanStep::Preamble(data) => return Ok(Some(Event::Preamble(data))),
                ScanStep::Epilogue(data) => return Ok(Some(Event::Epilogue(data))),
                ScanStep::Done => return Ok(None),
                ScanStep::Section(headers) => {
                    return Ok(Some(Event::Section(Section {
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

    fn fill(&mut self) -> Result<(), MultipartError> {
        loop {
            match self.source.read(&mut self.chunk) {
                Ok(0) => {
                    self.scanner.finish();
                    return Ok(());
                }
                Ok(n) => {
                    self.scanner.feed(&self.chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.scanner.abort(MultipartError::Io(e))),
            }
        }
    }

    fn read_body(&mut self, out: &mut [u8]) -> Result<usize, MultipartError> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            match self.scanner.read_body(out)? {
                BodyStep::Data(n) => return Ok(n),
                BodyStep::End => return Ok(0),
                BodyStep::NeedInput => self.fill()?,
            }
        }
    }
}

/// Start a pull parse of `source`. Shorthand for [`MultipartReader::new`].
pub fn parse<R: Read>(
    source: R,
    encoding: TextEncoding,
    boundary: &str,
) -> Result<MultipartReader<R>, MultipartError> {
    MultipartReader::new(source, encoding, boundary)
}

/// A section whose content is read through `std::io::Read`. Parse errors surface as
/// `io::ErrorKind::InvalidData`; [`MultipartError::from_io`] recovers them.
#[derive(Debug)]
pub struct Section<'a, R: Read> {
    headers: Headers,
    reader: &'a mut MultipartReader<R>,
}

impl<R: Read> Section<'_, R> {
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// `name` parameter of Content-Disposition.
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

    /// Read the remaining content into memory.
    pub fn read_all(&mut self) -> Result<Bytes, MultipartError> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match self.reader.read_body(&mut chunk)? {
                0 => return Ok(Bytes::from(out)),
                n => out.extend_from_slice(&chunk[..n]),
            }
        }
    }

    /// Remaining content decoded with the reader's encoding.
    pub fn text(&mut self) -> Result<String, MultipartError> {
        let encoding = self.encoding();
        let bytes = self.read_all()?;
        Ok(encoding.decode(&bytes).into_owned())
    }

    /// Discard the remaining content.
    pub fn skip(self) -> Result<(), MultipartError> {
        let mut chunk = [0u8; 1024];
        while self.reader.read_body(&mut chunk)? > 0 {}
        Ok(())
    }
}

impl<R: Read> Read for Section<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read_body(buf).map_err(MultipartError::into_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_in_order() {
        let body = b"preamble\r\n--b\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\n1\r\n--b\r\n\r\n2\r\n--b--\r\nepilogue";
        let mut reader = MultipartReader::new(&body[..], TextEncoding::Utf8, "b").unwrap();
        let mut seen = Vec::new();
        while let Some(event) = reader.next_event().unwrap() {
            seen.push(match event {
                Event::Preamble(data) => format!("preamble:{}", String::from_utf8_lossy(&data)),
                Event::Section(mut s) => format!("{:?}={}", s.name(), s.text().unwrap()),
                Event::Epilogue(data) => format!("epilogue:{}", String::from_utf8_lossy(&data)),
            });
        }
        assert_eq!(
            seen,
            vec![
                "preamble:preamble",
                "Some(\"x\")=1",
                "None=2",
                "epilogue:epilogue",
            ]
        );
        assert!(reader.next_event().unwrap().is_none());
    }

    #[test]
    fn read_all_on_owned_section() {
        let body = b"--b\r\n\r\n\x00\xffraw\r\n--b--";
        let mut reader = MultipartReader::new(&body[..], TextEncoding::Utf8, "b").unwrap();
        reader.next_event().unwrap();
        let content = match reader.next_event().unwrap() {
            Some(Event::Section(mut section)) => section.read_all().unwrap(),
            other => panic!("expected section, got {:?}", other),
        };
        assert_eq!(&content[..], b"\x00\xffraw");
    }

    #[test]
    fn content_type_boundary() {
        let body = b"--AaB03x\r\n\r\nv\r\n--AaB03x--";
        let mut reader = MultipartReader::from_content_type(
            &body[..],
            TextEncoding::Utf8,
            "multipart/form-data; boundary=AaB03x",
        )
        .unwrap();
        assert!(matches!(reader.next_event().unwrap(), Some(Event::Preamble(_))));
        assert!(matches!(reader.next_event().unwrap(), Some(Event::Section(_))));
    }

    #[test]
    fn content_type_without_boundary() {
        assert!(matches!(
            MultipartReader::from_content_type(&b""[..], TextEncoding::Utf8, "text/plain"),
            Err(MultipartError::InvalidBoundary(_))
        ));
    }

    #[test]
    fn section_read_reports_parse_error() {
        let body = b"--b\r\n\r\nno end";
        let mut reader = MultipartReader::new(&body[..], TextEncoding::Utf8, "b").unwrap();
        reader.next_event().unwrap();
        let mut section = match reader.next_event().unwrap() {
            Some(Event::Section(s)) => s,
            other => panic!("expected section, got {:?}", other),
        };
        let mut out = Vec::new();
        let err = section.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(MultipartError::from_io(err), MultipartError::UnterminatedBody));
        let mut buf = [0u8; 8];
        for _ in 0..2 {
            let err = section.read(&mut buf).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        }
    }

    /// Fails the first read, then serves `data`.
    struct FailOnce {
        failed: bool,
        data: &'static [u8],
    }

    impl Read for FailOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn source_error_finishes_reader() {
        let source = FailOnce {
            failed: false,
            data: b"--b\r\n\r\nx\r\n--b--",
        };
        let mut reader = MultipartReader::new(source, TextEncoding::Utf8, "b").unwrap();
        match reader.next_event() {
            Err(MultipartError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected source error, got {:?}", other.map(|e| e.is_some())),
        }
        assert!(reader.next_event().unwrap().is_none());
    }

    #[test]
    fn skip_section() {
        let body = b"--b\r\n\r\nskip me\r\n--b\r\n\r\nkeep\r\n--b--";
        let mut reader = MultipartReader::new(&body[..], TextEncoding::Utf8, "b").unwrap();
        reader.next_event().unwrap();
        if let Some(Event::Section(s)) = reader.next_event().unwrap() {
            s.skip().unwrap();
        }
        match reader.next_event().unwrap() {
            Some(Event::Section(mut s)) => assert_eq!(s.text().unwrap(), "keep"),
            other => panic!("expected section, got {:?}", other),
        }
    }
}
