// ── Attribute flattener ──
//
// Converts platform entities into the host's flat attribute maps and back.
// Nested records become single-element lists of maps; lists of records stay
// lists. Maps use sorted keys, so equal entities flatten to byte-identical
// output.

mod disk;
mod lb;

pub use disk::{
    expand_disk, expand_iotune, expand_snapshot, flatten_disk, flatten_iotune, flatten_snapshot,
};
pub use lb::{
    expand_backend, expand_binding, expand_frontend, expand_load_balancer, expand_node,
    expand_server, expand_server_settings, flatten_backend, flatten_binding, flatten_frontend,
    flatten_load_balancer, flatten_node, flatten_server, flatten_server_settings,
};

use serde_json::Value;

use crate::error::CoreError;
use crate::host::data::{AttrMap, as_i64};

/// Map out of a `json!({...})` literal.
pub(crate) fn object(value: Value) -> AttrMap {
    match value {
        Value::Object(map) => map,
        _ => AttrMap::new(),
    }
}

/// Wrap a record as the host's nested-block value.
pub(crate) fn nested(map: AttrMap) -> Value {
    Value::Array(vec![Value::Object(map)])
}

pub(crate) fn records(maps: impl IntoIterator<Item = AttrMap>) -> Value {
    Value::Array(maps.into_iter().map(Value::Object).collect())
}

/// Opaque JSON kept as text.
pub(crate) fn json_text(value: &Value) -> Value {
    Value::String(value.to_string())
}

/// Typed access into a flattened map.
///
/// Absent keys read as the type's default; present values of the wrong type
/// are errors.
pub(crate) struct Reader<'a> {
    map: &'a AttrMap,
    entity: &'static str,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(map: &'a AttrMap, entity: &'static str) -> Self {
        Self { map, entity }
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn mismatch(&self, key: &str, expected: &str) -> CoreError {
        CoreError::Deserialization {
            message: format!("{}.{key}: expected {expected}", self.entity),
        }
    }

    pub(crate) fn string(&self, key: &str) -> Result<String, CoreError> {
        match self.present(key) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.mismatch(key, "string")),
        }
    }

    pub(crate) fn i64(&self, key: &str) -> Result<i64, CoreError> {
        match self.present(key) {
            None => Ok(0),
            Some(v) => as_i64(v).ok_or_else(|| self.mismatch(key, "integer")),
        }
    }

    pub(crate) fn u64(&self, key: &str) -> Result<u64, CoreError> {
        u64::try_from(self.i64(key)?).map_err(|_| self.mismatch(key, "non-negative integer"))
    }

    pub(crate) fn u16(&self, key: &str) -> Result<u16, CoreError> {
        u16::try_from(self.i64(key)?).map_err(|_| self.mismatch(key, "port number"))
    }

    pub(crate) fn f64(&self, key: &str) -> Result<f64, CoreError> {
        match self.present(key) {
            None => Ok(0.0),
            Some(v) => v.as_f64().ok_or_else(|| self.mismatch(key, "number")),
        }
    }

    pub(crate) fn bool(&self, key: &str) -> Result<bool, CoreError> {
        match self.present(key) {
            None => Ok(false),
            Some(v) => v.as_bool().ok_or_else(|| self.mismatch(key, "bool")),
        }
    }

    /// Parse a string attribute into a `FromStr` type; absent reads as default.
    pub(crate) fn parsed<T>(&self, key: &str) -> Result<T, CoreError>
    where
        T: std::str::FromStr + Default,
    {
        let text = self.string(key)?;
        if text.is_empty() {
            return Ok(T::default());
        }
        text.parse()
            .map_err(|_| self.mismatch(key, "a known enumeration value"))
    }

    /// Opaque JSON stored as text.
    pub(crate) fn json(&self, key: &str) -> Result<Value, CoreError> {
        let text = self.string(key)?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|_| self.mismatch(key, "JSON text"))
    }

    /// The single record of a nested block, or an empty map.
    pub(crate) fn block(&self, key: &str) -> Result<AttrMap, CoreError> {
        Ok(self.blocks(key)?.into_iter().next().unwrap_or_default())
    }

    pub(crate) fn blocks(&self, key: &str) -> Result<Vec<AttrMap>, CoreError> {
        match self.present(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_object()
                        .cloned()
                        .ok_or_else(|| self.mismatch(key, "list of records"))
                })
                .collect(),
            Some(_) => Err(self.mismatch(key, "list of records")),
        }
    }
}
