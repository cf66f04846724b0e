/*
 * value.rs
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

//! Parameter values and the named-value lookup consumed by template expansion.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

/// A resolved parameter value: one scalar, an ordered list of scalars, or key/value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
    /// Pairs are expanded in the order given. Unordered sources (HashMap) yield arbitrary order.
    Map(Vec<(String, String)>),
}

impl Value {
    pub fn scalar(value: impl ToString) -> Self {
        Value::Scalar(value.to_string())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Value::List(items.into_iter().map(|item| item.to_string()).collect())
    }

    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Empty lists and maps count as undefined (RFC 6570 section 2.3).
    pub fn is_undefined(&self) -> bool {
        match self {
            Value::Scalar(_) => false,
            Value::List(items) => items.is_empty(),
            Value::Map(pairs) => pairs.is_empty(),
        }
    }

    /// Convert a JSON value. Null and anything nested deeper than a list or map of scalars is unsupported.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        if let Some(s) = json_scalar(json) {
            return Some(Value::Scalar(s));
        }
        match json {
            serde_json::Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::Null => continue,
                        other => list.push(json_scalar(other)?),
                    }
                }
                Some(Value::List(list))
            }
            serde_json::Value::Object(members) => {
                let mut pairs = Vec::with_capacity(members.len());
                for (key, member) in members {
                    match member {
                        serde_json::Value::Null => continue,
                        other => pairs.push((key.clone(), json_scalar(other)?)),
                    }
                }
                Some(Value::Map(pairs))
            }
            _ => None,
        }
    }
}

fn json_scalar(json: &serde_json::Value) -> Option<String> {
    match json {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Scalar(s.clone())
    }
}

macro_rules! scalar_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Scalar(v.to_string())
                }
            }
        )*
    };
}

scalar_from!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char);

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::list(items)
    }
}

impl<const N: usize> From<[&str; N]> for Value {
    fn from(items: [&str; N]) -> Self {
        Value::list(items)
    }
}

impl From<Vec<(String, String)>> for Value {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Value::Map(pairs)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::Map(map.into_iter().collect())
    }
}

impl From<HashMap<String, String>> for Value {
    fn from(map: HashMap<String, String>) -> Self {
        Value::Map(map.into_iter().collect())
    }
}

fn names_match(candidate: &str, name: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        candidate == name
    } else {
        candidate.to_lowercase() == name.to_lowercase()
    }
}

/// Named-value lookup: the source of values for template variables.
///
/// Returning `None` means the variable is absent and contributes nothing to its expression.
pub trait VariableLookup {
    fn lookup(&self, name: &str, case_sensitive: bool) -> Option<Cow<'_, Value>>;
}

impl<L: VariableLookup + ?Sized> VariableLookup for &L {
    fn lookup(&self, name: &str, case_sensitive: bool) -> Option<Cow<'_, Value>> {
        (**self).lookup(name, case_sensitive)
    }
}

impl VariableLookup for HashMap<String, Value> {
    fn lookup(&self, name: &str, case_sensitive: bool) -> Option<Cow<'_, Value>> {
        if case_sensitive {
            return self.get(name).map(Cow::Borrowed);
        }
        self.iter()
            .find(|(k, _)| names_match(k, name, false))
            .map(|(_, v)| Cow::Borrowed(v))
    }
}

impl VariableLookup for BTreeMap<String, Value> {
    fn lookup(&self, name: &str, case_sensitive: bool) -> Option<Cow<'_, Value>> {
        if case_sensitive {
            return self.get(name).map(Cow::Borrowed);
        }
        self.iter()
            .find(|(k, _)| names_match(k, name, false))
            .map(|(_, v)| Cow::Borrowed(v))
    }
}

impl VariableLookup for serde_json::Value {
    fn lookup(&self, name: &str, case_sensitive: bool) -> Option<Cow<'_, Value>> {
        let members = self.as_object()?;
        let member = if case_sensitive {
            members.get(name)?
        } else {
            members
                .iter()
                .find(|(k, _)| names_match(k, name, false))
                .map(|(_, v)| v)?
        };
        let value = Value::from_json(member);
        if value.is_none() && !member.is_null() {
            tracing::debug!(variable = name, "unsupported parameter value kind, treating as absent");
        }
        value.map(Cow::Owned)
    }
}

/// Ordered parameter container; insertion order is kept, later `set` replaces an earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, Value)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build parameters from the fields of a serializable struct or map.
    /// Members of unsupported kind (null, deeply nested) are left out.
    pub fn from_serialize<T: Serialize + ?Sized>(source: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_value(source)?;
        let members = match json {
            serde_json::Value::Object(members) => members,
            _ => {
                return Err(<serde_json::Error as serde::ser::Error>::custom(
                    "template parameters must serialize to a map or struct",
                ))
            }
        };
        let mut parameters = Parameters::new();
        for (name, member) in &members {
            match Value::from_json(member) {
                Some(value) => parameters.insert(name.clone(), value),
                None => {
                    if !member.is_null() {
                        tracing::debug!(variable = %name, "unsupported parameter value kind, dropped");
                    }
                }
            }
        }
        Ok(parameters)
    }
}

impl VariableLookup for Parameters {
    fn lookup(&self, name: &str, case_sensitive: bool) -> Option<Cow<'_, Value>> {
        self.entries
            .iter()
            .find(|(k, _)| names_match(k, name, case_sensitive))
            .map(|(_, v)| Cow::Borrowed(v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = Parameters::new();
        for (k, v) in iter {
            parameters.insert(k, v);
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Keys {
        semi: &'static str,
        dot: &'static str,
        comma: &'static str,
    }

    #[derive(Serialize)]
    struct Query {
        q: &'static str,
        pagenum: u32,
        pagesize: Option<u32>,
        keys: Keys,
        list: Vec<&'static str>,
    }

    #[test]
    fn json_scalars_and_composites() {
        assert_eq!(Value::from_json(&json!(1024)), Some(Value::scalar("1024")));
        assert_eq!(Value::from_json(&json!(true)), Some(Value::scalar("true")));
        assert_eq!(
            Value::from_json(&json!(["red", 2, null])),
            Some(Value::list(["red", "2"]))
        );
        assert_eq!(Value::from_json(&json!(null)), None);
        assert_eq!(Value::from_json(&json!([["nested"]])), None);
        assert_eq!(Value::from_json(&json!({"a": {"b": 1}})), None);
    }

    #[test]
    fn from_serialize_keeps_field_order() {
        let params = Parameters::from_serialize(&Query {
            q: "rest",
            pagenum: 3,
            pagesize: None,
            keys: Keys {
                semi: ";",
                dot: ".",
                comma: ",",
            },
            list: vec!["red", "green"],
        })
        .unwrap();
        assert_eq!(params.get("q"), Some(&Value::scalar("rest")));
        assert_eq!(params.get("pagenum"), Some(&Value::scalar("3")));
        assert_eq!(params.get("pagesize"), None);
        assert_eq!(
            params.get("keys"),
            Some(&Value::map([("semi", ";"), ("dot", "."), ("comma", ",")]))
        );
        assert_eq!(params.get("list"), Some(&Value::list(["red", "green"])));
    }

    #[test]
    fn from_serialize_rejects_non_map() {
        assert!(Parameters::from_serialize(&vec![1, 2, 3]).is_err());
    }

    #[test]
    fn set_replaces_existing() {
        let params = Parameters::new().set("x", 1).set("y", 2).set("x", "three");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("x"), Some(&Value::scalar("three")));
    }

    #[test]
    fn case_insensitive_lookup() {
        let params = Parameters::new().set("Var", "value");
        assert!(params.lookup("var", true).is_none());
        assert_eq!(
            params.lookup("var", false).as_deref(),
            Some(&Value::scalar("value"))
        );
        let json = json!({"Var": "value"});
        assert!(json.lookup("var", true).is_none());
        assert_eq!(json.lookup("VAR", false).as_deref(), Some(&Value::scalar("value")));
    }

    #[test]
    fn empty_composites_are_undefined() {
        assert!(Value::List(Vec::new()).is_undefined());
        assert!(Value::Map(Vec::new()).is_undefined());
        assert!(!Value::scalar("").is_undefined());
    }
}
