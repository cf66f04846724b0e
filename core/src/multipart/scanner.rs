/*
 * scanner.rs
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

//! Sans-io multipart state machine.
//!
//! The scanner never reads from a source itself. Callers push bytes with [`MultipartScanner::feed`],
//! signal end of input with [`MultipartScanner::finish`], and pull steps with
//! [`MultipartScanner::next_step`] and [`MultipartScanner::read_body`]. When either returns
//! `NeedInput` the caller reads more from its source and tries again. The blocking and tokio readers
//! are thin loops around this.
//!
//! State flow: `Start -> Preamble -> Headers -> Body -> (Headers | AfterClose) -> Epilogue -> Done`.
//! Any failure moves to `Failed`, after which `next_step` only reports `Done` and `read_body`
//! repeats the failure.

use bytes::{Bytes, BytesMut};

use super::buffer::{Scan, ScanBuffer};
use super::encoding::TextEncoding;
use super::headers::Headers;
use super::utils::is_valid_boundary;
use crate::config::MultipartConfig;
use crate::error::MultipartError;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Nothing examined yet; the body may open directly with `--boundary`.
    Start,
    Preamble,
    Headers,
    Body,
    /// Closing `--boundary--` seen; the CRLF ending that line is not yet consumed.
    AfterClose,
    Epilogue,
    Done,
    Failed,
}

/// Outcome of [`MultipartScanner::next_step`].
#[derive(Debug, PartialEq, Eq)]
pub enum ScanStep {
    NeedInput,
    Preamble(Bytes),
    /// A section's headers are parsed; its body is now readable with `read_body`.
    Section(Headers),
    Epilogue(Bytes),
    Done,
}

/// Outcome of [`MultipartScanner::read_body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStep {
    /// This many bytes were copied into the caller's buffer.
    Data(usize),
    /// The current section has no more content.
    End,
    NeedInput,
}

/// What follows `--boundary` on a candidate boundary line.
enum Marker {
    /// Boundary line; this many bytes (optional whitespace plus CRLF) follow the boundary.
    Open(usize),
    /// `--boundary--`
    Close,
    NotBoundary,
    Incomplete,
}

fn classify(rest: &[u8]) -> Marker {
    match rest {
        [] | [b'-'] => return Marker::Incomplete,
        [b'-', b'-', ..] => return Marker::Close,
        _ => {}
    }
    let padding = rest
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    match &rest[padding..] {
        [] | [b'\r'] => Marker::Incomplete,
        [b'\r', b'\n', ..] => Marker::Open(padding + CRLF.len()),
        _ => Marker::NotBoundary,
    }
}

/// Push-fed multipart scanner for one body.
#[derive(Debug)]
pub struct MultipartScanner {
    state: ScanState,
    buffer: ScanBuffer,
    /// `--boundary`
    dash_boundary: Vec<u8>,
    /// `\r\n--boundary`
    delimiter: Vec<u8>,
    encoding: TextEncoding,
    max_header_size: usize,
    /// Preamble or epilogue bytes already released from the buffer.
    held: BytesMut,
    eof: bool,
    sections: usize,
    /// Set when the scanner enters `Failed`.
    failure: Option<MultipartError>,
}

impl MultipartScanner {
    pub fn new(boundary: &str, encoding: TextEncoding) -> Result<Self, MultipartError> {
        Self::with_config(boundary, encoding, MultipartConfig::default())
    }

    pub fn with_config(
        boundary: &str,
        encoding: TextEncoding,
        config: MultipartConfig,
    ) -> Result<Self, MultipartError> {
        if !is_valid_boundary(boundary) {
            return Err(MultipartError::InvalidBoundary(boundary.to_string()));
        }
        let mut dash_boundary = Vec::with_capacity(boundary.len() + 2);
        dash_boundary.extend_from_slice(b"--");
        dash_boundary.extend_from_slice(boundary.as_bytes());
        let mut delimiter = Vec::with_capacity(dash_boundary.len() + 2);
        delimiter.extend_from_slice(CRLF);
        delimiter.extend_from_slice(&dash_boundary);
        Ok(Self {
            state: ScanState::Start,
            buffer: ScanBuffer::with_capacity(config.get_chunk_size() + delimiter.len()),
            dash_boundary,
            delimiter,
            encoding,
            max_header_size: config.get_max_header_size(),
            held: BytesMut::new(),
            eof: false,
            sections: 0,
            failure: None,
        })
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Append input. Ignored after `finish`.
    pub fn feed(&mut self, chunk: &[u8]) {
        if !self.eof {
            self.buffer.extend(chunk);
        }
    }

    /// The source is exhausted.
    pub fn finish(&mut self) {
        self.eof = true;
    }

    pub fn is_finished(&self) -> bool {
        self.eof
    }

    /// True while a section body is being delivered.
    pub fn in_body(&self) -> bool {
        self.state == ScanState::Body
    }

    /// Stop the parse because the byte source failed. Later body reads report `error` again
    /// and `next_step` reports `Done`.
    pub fn abort(&mut self, error: MultipartError) -> MultipartError {
        self.fail(error)
    }

    fn fail(&mut self, error: MultipartError) -> MultipartError {
        tracing::debug!(state = ?self.state, %error, "multipart parse failed");
        self.state = ScanState::Failed;
        self.failure = Some(error.replay());
        error
    }

    fn enter(&mut self, state: ScanState) {
        tracing::trace!(from = ?self.state, to = ?state, "multipart scanner transition");
        self.buffer.reset_scan();
        self.state = state;
    }

    /// Advance to the next event. An unread section body is skipped.
    pub fn next_step(&mut self) -> Result<ScanStep, MultipartError> {
        loop {
            match self.state {
                ScanState::Start => {
                    if let Some(step) = self.scan_start()? {
                        return Ok(step);
                    }
                }
                ScanState::Preamble => {
                    if let Some(step) = self.scan_preamble()? {
                        return Ok(step);
                    }
                }
                ScanState::Headers => return self.scan_headers(),
                ScanState::Body => match self.body_available()? {
                    BodyStep::Data(n) => self.buffer.advance(n),
                    BodyStep::End => {}
                    BodyStep::NeedInput => return Ok(ScanStep::NeedInput),
                },
                ScanState::AfterClose => {
                    if self.buffer.len() < CRLF.len() && !self.eof {
                        return Ok(ScanStep::NeedInput);
                    }
                    if self.buffer.as_slice().starts_with(CRLF) {
                        self.buffer.advance(CRLF.len());
                    }
                    self.enter(ScanState::Epilogue);
                }
                ScanState::Epilogue => {
                    let len = self.buffer.len();
                    self.held.extend_from_slice(&self.buffer.split_to(len));
                    if !self.eof {
                        return Ok(ScanStep::NeedInput);
                    }
                    self.enter(ScanState::Done);
                    return Ok(ScanStep::Epilogue(self.held.split().freeze()));
                }
                ScanState::Done | ScanState::Failed => return Ok(ScanStep::Done),
            }
        }
    }

    /// Copy section content into `out`. Returns `End` once the closing delimiter is reached, and
    /// keeps returning `End` until the next section is opened by `next_step`. After a failure
    /// every call returns the failure again.
    pub fn read_body(&mut self, out: &mut [u8]) -> Result<BodyStep, MultipartError> {
        if let Some(failure) = &self.failure {
            return Err(failure.replay());
        }
        if self.state != ScanState::Body {
            return Ok(BodyStep::End);
        }
        Ok(match self.body_available()? {
            BodyStep::Data(n) => BodyStep::Data(self.buffer.copy_to(n, out)),
            other => other,
        })
    }

    /// `Ok(None)` means the state changed and scanning continues.
    fn scan_start(&mut self) -> Result<Option<ScanStep>, MultipartError> {
        let dash_len = self.dash_boundary.len();
        if self.buffer.len() < dash_len && !self.eof {
            return Ok(Some(ScanStep::NeedInput));
        }
        if !self.buffer.as_slice().starts_with(&self.dash_boundary) {
            self.enter(ScanState::Preamble);
            return Ok(None);
        }
        match classify(&self.buffer.as_slice()[dash_len..]) {
            Marker::Open(n) => {
                self.buffer.advance(dash_len + n);
                self.enter(ScanState::Headers);
                Ok(Some(ScanStep::Preamble(Bytes::new())))
            }
            Marker::Close => {
                self.buffer.advance(dash_len + 2);
                self.enter(ScanState::AfterClose);
                Ok(Some(ScanStep::Preamble(Bytes::new())))
            }
            Marker::Incomplete if self.eof => Err(self.fail(MultipartError::UnterminatedPreamble)),
            Marker::Incomplete => Ok(Some(ScanStep::NeedInput)),
            Marker::NotBoundary => {
                self.enter(ScanState::Preamble);
                Ok(None)
            }
        }
    }

    fn scan_preamble(&mut self) -> Result<Option<ScanStep>, MultipartError> {
        let delimiter_len = self.delimiter.len();
        loop {
            match self.buffer.find(&self.delimiter) {
                Scan::Found(at) => {
                    let next = match classify(&self.buffer.as_slice()[at + delimiter_len..]) {
                        Marker::Open(n) => Some((n, ScanState::Headers)),
                        Marker::Close => Some((2, ScanState::AfterClose)),
                        Marker::Incomplete if self.eof => {
                            return Err(self.fail(MultipartError::UnterminatedPreamble))
                        }
                        Marker::Incomplete => return Ok(Some(ScanStep::NeedInput)),
                        Marker::NotBoundary => None,
                    };
                    let (marker_len, state) = match next {
                        Some(next) => next,
                        None => {
                            self.buffer.reject(at);
                            continue;
                        }
                    };
                    self.held.extend_from_slice(&self.buffer.split_to(at));
                    self.buffer.advance(delimiter_len + marker_len);
                    self.enter(state);
                    return Ok(Some(ScanStep::Preamble(self.held.split().freeze())));
                }
                Scan::NotFound { safe } => {
                    self.held.extend_from_slice(&self.buffer.split_to(safe));
                    if self.eof {
                        return Err(self.fail(MultipartError::UnterminatedPreamble));
                    }
                    return Ok(Some(ScanStep::NeedInput));
                }
            }
        }
    }

    fn scan_headers(&mut self) -> Result<ScanStep, MultipartError> {
        if self.buffer.as_slice().starts_with(CRLF) {
            self.buffer.advance(CRLF.len());
            return Ok(self.open_section(Headers::new()));
        }
        if self.buffer.len() < CRLF.len() {
            if self.eof {
                return Err(self.fail(MultipartError::UnterminatedHeaders));
            }
            return Ok(ScanStep::NeedInput);
        }
        match self.buffer.find(HEADER_END) {
            Scan::Found(at) => {
                if at + HEADER_END.len() > self.max_header_size {
                    let limit = self.max_header_size;
                    return Err(self.fail(MultipartError::HeadersTooLarge { limit }));
                }
                let block = self.buffer.split_to(at);
                self.buffer.advance(HEADER_END.len());
                let headers = Headers::parse(&block, self.encoding);
                Ok(self.open_section(headers))
            }
            Scan::NotFound { .. } => {
                if self.buffer.len() > self.max_header_size {
                    let limit = self.max_header_size;
                    return Err(self.fail(MultipartError::HeadersTooLarge { limit }));
                }
                if self.eof {
                    return Err(self.fail(MultipartError::UnterminatedHeaders));
                }
                Ok(ScanStep::NeedInput)
            }
        }
    }

    fn open_section(&mut self, headers: Headers) -> ScanStep {
        self.sections += 1;
        tracing::trace!(section = self.sections, headers = headers.len(), "multipart section");
        self.enter(ScanState::Body);
        ScanStep::Section(headers)
    }

    /// How many leading buffer bytes are section content. Handles the delimiter when it is at the
    /// front of the buffer.
    fn body_available(&mut self) -> Result<BodyStep, MultipartError> {
        let delimiter_len = self.delimiter.len();
        loop {
            match self.buffer.find(&self.delimiter) {
                Scan::Found(0) => match classify(&self.buffer.as_slice()[delimiter_len..]) {
                    Marker::Open(n) => {
                        self.buffer.advance(delimiter_len + n);
                        self.enter(ScanState::Headers);
                        return Ok(BodyStep::End);
                    }
                    Marker::Close => {
                        self.buffer.advance(delimiter_len + 2);
                        tracing::trace!(sections = self.sections, "closing boundary");
                        self.enter(ScanState::AfterClose);
                        return Ok(BodyStep::End);
                    }
                    Marker::Incomplete if self.eof => {
                        return Err(self.fail(MultipartError::UnterminatedBody))
                    }
                    Marker::Incomplete => return Ok(BodyStep::NeedInput),
                    Marker::NotBoundary => self.buffer.reject(0),
                },
                Scan::Found(at) => return Ok(BodyStep::Data(at)),
                Scan::NotFound { safe } if safe > 0 => return Ok(BodyStep::Data(safe)),
                Scan::NotFound { .. } if self.eof => {
                    return Err(self.fail(MultipartError::UnterminatedBody))
                }
                Scan::NotFound { .. } => return Ok(BodyStep::NeedInput),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(boundary: &str) -> MultipartScanner {
        MultipartScanner::new(boundary, TextEncoding::Utf8).unwrap()
    }

    fn drain_body(s: &mut MultipartScanner) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            match s.read_body(&mut buf).unwrap() {
                BodyStep::Data(n) => out.extend_from_slice(&buf[..n]),
                BodyStep::End => return out,
                BodyStep::NeedInput => panic!("unexpected NeedInput"),
            }
        }
    }

    #[test]
    fn rejects_invalid_boundary() {
        assert!(matches!(
            MultipartScanner::new("bad;boundary", TextEncoding::Utf8),
            Err(MultipartError::InvalidBoundary(_))
        ));
    }

    #[test]
    fn whole_body_in_one_feed() {
        let mut s = scanner("xyz");
        s.feed(b"pre\r\n--xyz\r\nA: 1\r\n\r\nbody\r\n--xyz--\r\nepi");
        s.finish();
        assert_eq!(s.next_step().unwrap(), ScanStep::Preamble(Bytes::from_static(b"pre")));
        match s.next_step().unwrap() {
            ScanStep::Section(h) => assert_eq!(h.get("a"), Some("1")),
            other => panic!("expected section, got {:?}", other),
        }
        assert_eq!(drain_body(&mut s), b"body");
        assert_eq!(s.next_step().unwrap(), ScanStep::Epilogue(Bytes::from_static(b"epi")));
        assert_eq!(s.next_step().unwrap(), ScanStep::Done);
    }

    #[test]
    fn boundary_at_start_has_empty_preamble() {
        let mut s = scanner("xyz");
        s.feed(b"--xyz\r\n\r\ncontent\r\n--xyz--");
        s.finish();
        assert_eq!(s.next_step().unwrap(), ScanStep::Preamble(Bytes::new()));
        assert_eq!(s.next_step().unwrap(), ScanStep::Section(Headers::new()));
        assert_eq!(drain_body(&mut s), b"content");
        assert_eq!(s.next_step().unwrap(), ScanStep::Epilogue(Bytes::new()));
    }

    #[test]
    fn needs_input_until_boundary_resolves() {
        let mut s = scanner("xyz");
        s.feed(b"--xy");
        assert_eq!(s.next_step().unwrap(), ScanStep::NeedInput);
        s.feed(b"z");
        assert_eq!(s.next_step().unwrap(), ScanStep::NeedInput);
        s.feed(b"\r\n\r\n");
        assert_eq!(s.next_step().unwrap(), ScanStep::Preamble(Bytes::new()));
        assert_eq!(s.next_step().unwrap(), ScanStep::Section(Headers::new()));
        let mut buf = [0u8; 8];
        assert_eq!(s.read_body(&mut buf).unwrap(), BodyStep::NeedInput);
    }

    #[test]
    fn lookalike_boundary_is_content() {
        let mut s = scanner("xyz");
        s.feed(b"--xyz\r\n\r\na\r\n--xyzzy\r\nb\r\n--xyz --\r\n--xyz--");
        s.finish();
        s.next_step().unwrap();
        s.next_step().unwrap();
        assert_eq!(drain_body(&mut s), b"a\r\n--xyzzy\r\nb\r\n--xyz --");
    }

    #[test]
    fn transport_padding_after_boundary() {
        let mut s = scanner("xyz");
        s.feed(b"--xyz \t\r\n\r\none\r\n--xyz  \r\n\r\ntwo\r\n--xyz--");
        s.finish();
        s.next_step().unwrap();
        s.next_step().unwrap();
        assert_eq!(drain_body(&mut s), b"one");
        s.next_step().unwrap();
        assert_eq!(drain_body(&mut s), b"two");
    }

    #[test]
    fn unread_body_is_skipped() {
        let mut s = scanner("xyz");
        s.feed(b"--xyz\r\nN: 1\r\n\r\nskipped\r\n--xyz\r\nN: 2\r\n\r\nread\r\n--xyz--");
        s.finish();
        s.next_step().unwrap();
        assert!(matches!(s.next_step().unwrap(), ScanStep::Section(h) if h.get("n") == Some("1")));
        assert!(matches!(s.next_step().unwrap(), ScanStep::Section(h) if h.get("n") == Some("2")));
        assert_eq!(drain_body(&mut s), b"read");
    }

    #[test]
    fn no_sections() {
        let mut s = scanner("xyz");
        s.feed(b"only preamble\r\n--xyz--\r\nafter");
        s.finish();
        assert_eq!(
            s.next_step().unwrap(),
            ScanStep::Preamble(Bytes::from_static(b"only preamble"))
        );
        assert_eq!(s.next_step().unwrap(), ScanStep::Epilogue(Bytes::from_static(b"after")));
    }

    #[test]
    fn missing_boundary_fails() {
        let mut s = scanner("xyz");
        s.feed(b"no boundary anywhere");
        s.finish();
        assert!(matches!(s.next_step(), Err(MultipartError::UnterminatedPreamble)));
        assert_eq!(s.state(), ScanState::Failed);
        assert_eq!(s.next_step().unwrap(), ScanStep::Done);
    }

    #[test]
    fn unterminated_headers_fail() {
        let mut s = scanner("xyz");
        s.feed(b"--xyz\r\nA: 1\r\nB: 2");
        s.finish();
        s.next_step().unwrap();
        assert!(matches!(s.next_step(), Err(MultipartError::UnterminatedHeaders)));
    }

    #[test]
    fn oversized_headers_fail() {
        let config = MultipartConfig::new().max_header_size(16);
        let mut s = MultipartScanner::with_config("xyz", TextEncoding::Utf8, config).unwrap();
        s.feed(b"--xyz\r\nX-Long: aaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        s.next_step().unwrap();
        assert!(matches!(
            s.next_step(),
            Err(MultipartError::HeadersTooLarge { limit: 16 })
        ));
    }

    #[test]
    fn unterminated_body_fails() {
        let mut s = scanner("xyz");
        s.feed(b"--xyz\r\n\r\ncontent without end");
        s.finish();
        s.next_step().unwrap();
        s.next_step().unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        let err = loop {
            match s.read_body(&mut buf) {
                Ok(BodyStep::Data(n)) => out.extend_from_slice(&buf[..n]),
                Ok(other) => panic!("unexpected {:?}", other),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, MultipartError::UnterminatedBody));
        assert!(out.starts_with(b"content"));
        for _ in 0..2 {
            assert!(matches!(s.read_body(&mut buf), Err(MultipartError::UnterminatedBody)));
        }
        assert_eq!(s.next_step().unwrap(), ScanStep::Done);
    }

    #[test]
    fn abort_stops_the_scan() {
        let mut s = scanner("xyz");
        s.feed(b"--xyz\r\n\r\npartial");
        s.next_step().unwrap();
        s.next_step().unwrap();
        let err = s.abort(MultipartError::Io(std::io::ErrorKind::BrokenPipe.into()));
        assert!(matches!(err, MultipartError::Io(_)));
        assert_eq!(s.state(), ScanState::Failed);
        s.feed(b"\r\n--xyz--");
        s.finish();
        let mut buf = [0u8; 8];
        match s.read_body(&mut buf) {
            Err(MultipartError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(s.next_step().unwrap(), ScanStep::Done);
    }

    #[test]
    fn binary_content_with_crlf() {
        let mut body = b"--b\r\n\r\n".to_vec();
        let content: Vec<u8> = (0u8..=255).chain([b'\r', b'\n', b'-', b'-', 0xff]).collect();
        body.extend_from_slice(&content);
        body.extend_from_slice(b"\r\n--b--");
        let mut s = scanner("b");
        s.feed(&body);
        s.finish();
        s.next_step().unwrap();
        s.next_step().unwrap();
        assert_eq!(drain_body(&mut s), content);
    }
}
