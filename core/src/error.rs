/*
 * error.rs
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

//! Multipart parse errors.

use std::io;

/// Errors from the multipart parser. Everything except `InvalidBoundary` halts the parse.
#[derive(Debug, thiserror::Error)]
pub enum MultipartError {
    /// The boundary is empty, longer than 70 characters, or uses characters outside RFC 2046.
    #[error("invalid multipart boundary {0:?}")]
    InvalidBoundary(String),

    /// End of stream before any boundary line.
    #[error("end of stream before the first boundary")]
    UnterminatedPreamble,

    /// End of stream inside a section's header block.
    #[error("end of stream before the end of section headers")]
    UnterminatedHeaders,

    /// A section's header block grew past the configured limit.
    #[error("section headers exceed {limit} bytes")]
    HeadersTooLarge { limit: usize },

    /// End of stream inside a section body (no closing boundary).
    #[error("end of stream before the closing boundary")]
    UnterminatedBody,

    /// The underlying source failed.
    #[error("error reading multipart source")]
    Io(#[from] io::Error),
}

impl MultipartError {
    /// True for failures caused by the shape of the input rather than the source.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            MultipartError::UnterminatedPreamble
                | MultipartError::UnterminatedHeaders
                | MultipartError::HeadersTooLarge { .. }
                | MultipartError::UnterminatedBody
        )
    }

    /// Copy of this error for repeated reporting. Source errors keep their kind and message.
    pub(crate) fn replay(&self) -> MultipartError {
        match self {
            MultipartError::InvalidBoundary(b) => MultipartError::InvalidBoundary(b.clone()),
            MultipartError::UnterminatedPreamble => MultipartError::UnterminatedPreamble,
            MultipartError::UnterminatedHeaders => MultipartError::UnterminatedHeaders,
            MultipartError::HeadersTooLarge { limit } => {
                MultipartError::HeadersTooLarge { limit: *limit }
            }
            MultipartError::UnterminatedBody => MultipartError::UnterminatedBody,
            MultipartError::Io(e) => MultipartError::Io(io::Error::new(e.kind(), e.to_string())),
        }
    }

    /// Wrap for delivery through `std::io::Read`/`AsyncRead`. Source errors are unwrapped.
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            MultipartError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }

    /// Recover a parse error that went through `into_io`.
    pub fn from_io(error: io::Error) -> Self {
        if !error.get_ref().map_or(false, |inner| inner.is::<MultipartError>()) {
            return MultipartError::Io(error);
        }
        let kind = error.kind();
        match error.into_inner().map(|inner| inner.downcast::<MultipartError>()) {
            Some(Ok(e)) => *e,
            Some(Err(inner)) => MultipartError::Io(io::Error::new(kind, inner)),
            None => MultipartError::Io(io::Error::from(kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_round_trip_keeps_variant() {
        let e = MultipartError::UnterminatedBody.into_io();
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(MultipartError::from_io(e), MultipartError::UnterminatedBody));
    }

    #[test]
    fn source_errors_pass_through() {
        let e = MultipartError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).into_io();
        assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
        assert!(!MultipartError::from_io(e).is_structural());
    }

    #[test]
    fn replay_keeps_kind() {
        let e = MultipartError::HeadersTooLarge { limit: 8 };
        assert!(matches!(e.replay(), MultipartError::HeadersTooLarge { limit: 8 }));
        let e = MultipartError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        match e.replay() {
            MultipartError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::ConnectionReset);
                assert_eq!(inner.to_string(), "reset");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn structural_classification() {
        assert!(MultipartError::UnterminatedPreamble.is_structural());
        assert!(MultipartError::HeadersTooLarge { limit: 1 }.is_structural());
        assert!(!MultipartError::InvalidBoundary("".into()).is_structural());
    }
}
