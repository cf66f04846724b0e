/*
 * variable.rs
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

//! Variable specifications inside an expression: `name`, `name:maxLength`, `name*`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    max_length: Option<usize>,
    exploded: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_length: None,
            exploded: false,
        }
    }

    /// Parse one varspec. Returns None for an empty name.
    ///
    /// A `:` suffix that is not a positive integer stays part of the name.
    pub fn parse(spec: &str) -> Option<Self> {
        let (spec, exploded) = match spec.strip_suffix('*') {
            Some(rest) => (rest, true),
            None => (spec, false),
        };
        let (name, max_length) = match spec.rfind(':') {
            Some(colon) => match spec[colon + 1..].parse::<usize>() {
                Ok(n) if n > 0 => (&spec[..colon], Some(n)),
                _ => (spec, None),
            },
            None => (spec, None),
        };
        if name.is_empty() || name.contains(|c: char| c == '{' || c == '}') {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            max_length,
            exploded,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn is_exploded(&self) -> bool {
        self.exploded
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(n) = self.max_length {
            write!(f, ":{}", n)?;
        }
        if self.exploded {
            f.write_str("*")?;
        }
        Ok(())
    }
}
