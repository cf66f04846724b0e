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

//! URI Template expansion (RFC 6570, levels 1 to 4).
//!
//! A template is compiled once into an ordered list of [`Segment`]s and can then be expanded any
//! number of times, from any thread, against a [`VariableLookup`]. Compilation never fails: text
//! that does not form a valid `{...}` expression is kept as literal text. Expansion never fails
//! either: absent variables are dropped from their expression.
//!
//! ```
//! use cartella_core::uri_template::{Parameters, UriTemplate};
//!
//! let template = UriTemplate::new("/customers{/id}{?fields*}");
//! let params = Parameters::new().set("id", 42).set("fields", vec!["name", "email"]);
//! assert_eq!(template.expand(&params), "/customers/42?fields=name&fields=email");
//! ```

mod escape;
mod generator;
mod operator;
mod value;
mod variable;

use std::fmt;

pub use generator::{Placeholder, Segment};
pub use operator::Operator;
pub use value::{Parameters, Value, VariableLookup};
pub use variable::Variable;

/// A compiled URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    template: String,
    segments: Vec<Segment>,
    case_sensitive: bool,
}

impl UriTemplate {
    /// Compile with case-sensitive variable matching.
    pub fn new(template: impl Into<String>) -> Self {
        Self::compile(template, true)
    }

    pub fn compile(template: impl Into<String>, case_sensitive: bool) -> Self {
        let template = template.into();
        let segments = parse_segments(&template);
        Self {
            template,
            segments,
            case_sensitive,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Names of all variables, in template order, without duplicates.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(p) = segment {
                for v in p.variables() {
                    if !names.contains(&v.name()) {
                        names.push(v.name());
                    }
                }
            }
        }
        names
    }

    pub fn expand<L>(&self, params: &L) -> String
    where
        L: VariableLookup + ?Sized,
    {
        let mut out = String::with_capacity(self.template.len());
        for segment in &self.segments {
            segment.generate(params, self.case_sensitive, &mut out);
        }
        out
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl From<&str> for UriTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

/// Compile and expand in one step.
pub fn expand<L>(template: &str, params: &L) -> String
where
    L: VariableLookup + ?Sized,
{
    UriTemplate::new(template).expand(params)
}

fn parse_segments(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;
    while let Some(open) = template[pos..].find('{').map(|i| pos + i) {
        let rest = &template[open + 1..];
        let next = match rest.find(|c: char| c == '{' || c == '}') {
            Some(i) => open + 1 + i,
            None => break,
        };
        if template.as_bytes()[next] == b'{' {
            // Unbalanced: the earlier brace is literal text.
            pos = next;
            continue;
        }
        if let Some(placeholder) = parse_expression(&template[open + 1..next]) {
            if open > literal_start {
                segments.push(Segment::Constant(template[literal_start..open].to_string()));
            }
            segments.push(Segment::Placeholder(placeholder));
            literal_start = next + 1;
        }
        pos = next + 1;
    }
    if literal_start < template.len() {
        segments.push(Segment::Constant(template[literal_start..].to_string()));
    }
    segments
}

fn parse_expression(body: &str) -> Option<Placeholder> {
    let first = body.chars().next()?;
    let (operator, specs) = match Operator::from_sigil(first) {
        Some(op) => (op, &body[first.len_utf8()..]),
        None => (Operator::Simple, body),
    };
    if specs.is_empty() {
        return None;
    }
    let variables = specs
        .split(',')
        .map(Variable::parse)
        .collect::<Option<Vec<_>>>()?;
    Some(Placeholder::new(operator, variables))
}
