// ── Per-resource attribute store ──
//
// What a CRUD callback sees of one resource instance: its id, the state the
// host persisted last time, the attributes the user declares now, and the
// values the callback computes. Nested records follow the host convention
// of a single-element list of maps.

use serde_json::{Map, Value};

/// Flat attribute map. Keys are sorted, so equal maps serialize identically.
pub type AttrMap = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    prior: AttrMap,
    config: AttrMap,
    computed: AttrMap,
}

impl ResourceData {
    /// A resource about to be created from declared attributes.
    pub fn from_config(config: AttrMap) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// A resource known to the host, with no new declaration (read / delete).
    pub fn from_state(id: impl Into<String>, state: AttrMap) -> Self {
        Self {
            id: Some(id.into()),
            prior: state,
            ..Self::default()
        }
    }

    /// A known resource whose declaration may have changed (update).
    pub fn with_change(id: impl Into<String>, prior: AttrMap, config: AttrMap) -> Self {
        Self {
            id: Some(id.into()),
            prior,
            config,
            computed: AttrMap::new(),
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Mark the resource as gone; the host plans re-creation.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current value: computed in this callback, else declared, else prior.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.computed
            .get(key)
            .or_else(|| self.config.get(key))
            .or_else(|| self.prior.get(key))
            .filter(|v| !v.is_null())
    }

    /// Whether the user declared `key` in the current configuration.
    pub fn is_declared(&self, key: &str) -> bool {
        self.config.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(as_i64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get_i64(key).and_then(|v| u64::try_from(v).ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// First record of a nested block.
    pub fn get_block(&self, key: &str) -> Option<&AttrMap> {
        block(self.get(key)?)
    }

    /// `(prior, declared)` pair for `key`. An undeclared key reports its
    /// prior value on both sides.
    pub fn get_change(&self, key: &str) -> (Option<&Value>, Option<&Value>) {
        let old = self.prior.get(key).filter(|v| !v.is_null());
        let new = self.config.get(key).filter(|v| !v.is_null()).or(old);
        (old, new)
    }

    pub fn has_change(&self, key: &str) -> bool {
        match self.get_change(key) {
            (Some(old), Some(new)) => !same_value(old, new),
            (old, new) => old != new,
        }
    }

    pub fn prior(&self) -> &AttrMap {
        &self.prior
    }

    pub fn config(&self) -> &AttrMap {
        &self.config
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.computed.insert(key.into(), value.into());
    }

    /// Copy every entry of a flattened map into the store.
    pub fn set_all(&mut self, attrs: AttrMap) {
        self.computed.extend(attrs);
    }

    /// Forget values computed so far (used before a fresh read-back).
    pub fn reset_computed(&mut self) {
        self.computed.clear();
    }

    /// The state the host should persist: prior overlaid with the
    /// declaration, overlaid with computed values.
    pub fn state(&self) -> AttrMap {
        let mut state = self.prior.clone();
        state.extend(self.config.clone());
        state.extend(self.computed.clone());
        state
    }

    /// Values computed during this callback only.
    pub fn computed(&self) -> &AttrMap {
        &self.computed
    }
}

/// Integer view of a JSON value, accepting numeric strings the way the
/// host hands them over from text configuration.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok())),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Equality that treats `17` and `"17"` as the same declared value.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (as_i64(a), as_i64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// First record of a nested block value (`[ { ... } ]` or a bare map).
pub fn block(value: &Value) -> Option<&AttrMap> {
    match value {
        Value::Array(items) => items.first().and_then(Value::as_object),
        Value::Object(map) => Some(map),
        _ => None,
    }
}
