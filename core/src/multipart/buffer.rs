/*
 * buffer.rs
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

//! Working buffer for the boundary scan.
//!
//! Bytes are appended as they arrive from the source and released from the front once the scanner
//! knows they cannot be part of a delimiter. A failed search remembers how far it got, so the next
//! search after more input only revisits the last `needle.len() - 1` bytes.

use bytes::{Buf, Bytes, BytesMut};

use super::utils::find_bytes;

/// Result of a delimiter search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// The needle starts at this offset.
    Found(usize),
    /// Not found; the first `safe` bytes cannot begin a match and may be released.
    NotFound { safe: usize },
}

#[derive(Debug, Default)]
pub struct ScanBuffer {
    buf: BytesMut,
    /// Offset below which no match can start.
    scanned: usize,
}

impl ScanBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            scanned: 0,
        }
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Search for `needle` from where the previous search stopped.
    pub fn find(&mut self, needle: &[u8]) -> Scan {
        match find_bytes(&self.buf, needle, self.scanned) {
            Some(at) => {
                self.scanned = at;
                Scan::Found(at)
            }
            None => {
                let tail = needle.len().saturating_sub(1);
                self.scanned = self.scanned.max(self.buf.len().saturating_sub(tail));
                Scan::NotFound { safe: self.scanned }
            }
        }
    }

    /// A match at `at` turned out not to be a delimiter; resume after its first byte.
    pub fn reject(&mut self, at: usize) {
        self.scanned = self.scanned.max(at + 1);
    }

    /// Forget search progress. Needed when the needle changes.
    pub fn reset_scan(&mut self) {
        self.scanned = 0;
    }

    /// Remove and return the first `n` bytes.
    pub fn split_to(&mut self, n: usize) -> Bytes {
        self.scanned = self.scanned.saturating_sub(n);
        self.buf.split_to(n).freeze()
    }

    /// Copy up to `out.len()` of the first `available` bytes into `out` and drop them.
    pub fn copy_to(&mut self, available: usize, out: &mut [u8]) -> usize {
        let n = available.min(out.len()).min(self.buf.len());
        out[..n].copy_from_slice(&self.buf[..n]);
        self.advance(n);
        n
    }

    pub fn advance(&mut self, n: usize) {
        self.scanned = self.scanned.saturating_sub(n);
        self.buf.advance(n);
    }
}
