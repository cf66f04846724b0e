/*
 * config.rs
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

//! Multipart parser tunables.

/// Bytes requested from the source per read.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Upper bound on one section's header block, blank line included.
pub const DEFAULT_MAX_HEADER_SIZE: usize = 16 * 1024;

/// Configuration for the multipart readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultipartConfig {
    chunk_size: usize,
    max_header_size: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
        }
    }
}

impl MultipartConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read size. Zero is raised to one.
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    #[must_use]
    pub fn max_header_size(mut self, size: usize) -> Self {
        self.max_header_size = size;
        self
    }

    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn get_max_header_size(&self) -> usize {
        self.max_header_size
    }
}
