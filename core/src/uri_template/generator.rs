/*
 * generator.rs
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

//! Segment generators: a compiled template is an ordered list of constants and placeholders.

use super::escape::{escape_reserved, escape_unreserved, truncate};
use super::operator::Operator;
use super::value::{Value, VariableLookup};
use super::variable::Variable;

/// One piece of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, emitted verbatim.
    Constant(String),
    Placeholder(Placeholder),
}

impl Segment {
    /// Append this segment's expansion to `out`.
    pub fn generate<L>(&self, params: &L, case_sensitive: bool, out: &mut String)
    where
        L: VariableLookup + ?Sized,
    {
        match self {
            Segment::Constant(text) => out.push_str(text),
            Segment::Placeholder(placeholder) => placeholder.generate(params, case_sensitive, out),
        }
    }
}

/// A `{...}` expression: one operator applied to one or more variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    operator: Operator,
    variables: Vec<Variable>,
}

impl Placeholder {
    pub fn new(operator: Operator, variables: Vec<Variable>) -> Self {
        Self {
            operator,
            variables,
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Expand into `out`. Nothing (not even the prefix) is written when no variable is defined.
    pub fn generate<L>(&self, params: &L, case_sensitive: bool, out: &mut String)
    where
        L: VariableLookup + ?Sized,
    {
        let mut substitutions = Vec::new();
        for variable in &self.variables {
            let value = match params.lookup(variable.name(), case_sensitive) {
                Some(v) if !v.is_undefined() => v,
                _ => continue,
            };
            self.substitute(variable, &value, &mut substitutions);
        }
        if substitutions.is_empty() {
            return;
        }
        out.push_str(self.operator.prefix());
        out.push_str(&substitutions.join(self.operator.separator()));
    }

    fn substitute(&self, variable: &Variable, value: &Value, substitutions: &mut Vec<String>) {
        match value {
            Value::Scalar(s) => {
                let escaped = self.escape(truncate(s, variable.max_length()));
                substitutions.push(self.qualify(variable, escaped));
            }
            Value::List(items) => {
                let escaped = items
                    .iter()
                    .map(|item| self.escape(truncate(item, variable.max_length())));
                if variable.is_exploded() {
                    substitutions.extend(escaped.map(|e| self.qualify(variable, e)));
                } else {
                    let joined = escaped.collect::<Vec<_>>().join(",");
                    substitutions.push(self.qualify(variable, joined));
                }
            }
            Value::Map(pairs) => {
                if variable.is_exploded() {
                    substitutions.extend(
                        pairs
                            .iter()
                            .map(|(k, v)| format!("{}={}", self.escape(k), self.escape(v))),
                    );
                } else {
                    let joined = pairs
                        .iter()
                        .flat_map(|(k, v)| [self.escape(k), self.escape(v)])
                        .collect::<Vec<_>>()
                        .join(",");
                    substitutions.push(self.qualify(variable, joined));
                }
            }
        }
    }

    fn escape(&self, value: &str) -> String {
        if self.operator.allows_reserved() {
            escape_reserved(value)
        } else {
            escape_unreserved(value)
        }
    }

    fn qualify(&self, variable: &Variable, value: String) -> String {
        if !self.operator.is_qualified() {
            return value;
        }
        if !self.operator.qualifies_empty() && value.trim().is_empty() {
            return variable.name().to_string();
        }
        format!("{}={}", variable.name(), value)
    }
}
