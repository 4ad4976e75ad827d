// Form parameter encoding
//
// The platform takes every argument as `application/x-www-form-urlencoded`.
// Numbers and booleans go in their canonical text form; list arguments
// (`drivers`, `accounts`, `imageIds`, ...) go as one value holding a JSON array.

use std::fmt;

use serde::Serialize;

use crate::error::Error;

/// Ordered multimap of form parameters.
///
/// Keys may repeat. Order is preserved for readability of logs and wire
/// captures; the platform does not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string-valued parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Append an integer in decimal form.
    pub fn push_int(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.push(key, value.to_string())
    }

    /// Append a boolean as `true` / `false`.
    pub fn push_bool(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.push(key, if value { "true" } else { "false" })
    }

    /// Append a string only when present.
    pub fn push_opt(&mut self, key: impl Into<String>, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Append an integer only when present.
    pub fn push_int_opt(&mut self, key: impl Into<String>, value: Option<i64>) -> &mut Self {
        if let Some(value) = value {
            self.push_int(key, value);
        }
        self
    }

    /// Append a list as a single value whose text is a JSON array.
    pub fn push_list<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        values: &[T],
    ) -> Result<&mut Self, Error> {
        let encoded = serde_json::to_string(values).map_err(|e| Error::Deserialization {
            message: format!("cannot encode list parameter: {e}"),
            body: String::new(),
        })?;
        Ok(self.push(key, encoded))
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value stored under `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as an `application/x-www-form-urlencoded` body.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FormParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.pairs
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

/// Renders keys only. Values may hold secrets and are never printed.
impl fmt::Display for FormParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.keys().collect();
        write!(f, "[{}]", keys.join(", "))
    }
}
