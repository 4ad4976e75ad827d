// ── Resource schemas ──
//
// Declares which attributes a resource accepts, their types, and how the
// host treats them: required, optional, computed (read-only), or forcing
// replacement when changed.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::data::{AttrMap, as_i64, same_value};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum AttrType {
    String,
    Int,
    Float,
    Bool,
    /// Ordered sequence of scalars.
    List(Box<AttrType>),
    /// Ordered sequence of nested records.
    Block(Schema),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Attribute {
    #[serde(flatten)]
    pub ty: AttrType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    /// Nested blocks only: upper bound on records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<&'static [&'static str]>,
    pub description: &'static str,
}

impl Attribute {
    fn base(ty: AttrType) -> Self {
        Self {
            ty,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            max_items: None,
            default: None,
            one_of: None,
            description: "",
        }
    }

    pub fn required(ty: AttrType) -> Self {
        Self {
            required: true,
            ..Self::base(ty)
        }
    }

    pub fn optional(ty: AttrType) -> Self {
        Self {
            optional: true,
            ..Self::base(ty)
        }
    }

    /// Read-only: populated from the platform, never declared.
    pub fn computed(ty: AttrType) -> Self {
        Self {
            computed: true,
            ..Self::base(ty)
        }
    }

    /// Declarable, filled from the platform when not declared.
    pub fn optional_computed(ty: AttrType) -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::base(ty)
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.one_of = Some(allowed);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn is_declarable(&self) -> bool {
        self.required || self.optional
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Fill declared-but-absent attributes that carry a default.
    pub fn apply_defaults(&self, config: &mut AttrMap) {
        for (name, attr) in &self.attributes {
            let Some(default) = &attr.default else {
                continue;
            };
            if config.get(*name).is_none_or(Value::is_null) {
                config.insert((*name).to_owned(), default.clone());
            }
        }
    }

    /// Check a declaration against the schema.
    ///
    /// Rejects unknown keys, declared read-only attributes, missing required
    /// attributes, type mismatches, and values outside an enumerated set.
    pub fn validate(&self, config: &AttrMap) -> Result<(), CoreError> {
        self.validate_at("", config)
    }

    fn validate_at(&self, prefix: &str, config: &AttrMap) -> Result<(), CoreError> {
        for key in config.keys() {
            match self.attributes.get(key.as_str()) {
                None => {
                    return Err(CoreError::validation(format!(
                        "unsupported argument \"{prefix}{key}\""
                    )));
                }
                Some(attr) if !attr.is_declarable() => {
                    return Err(CoreError::validation(format!(
                        "\"{prefix}{key}\" is computed and cannot be set"
                    )));
                }
                Some(_) => {}
            }
        }

        for (name, attr) in &self.attributes {
            let path = format!("{prefix}{name}");
            match config.get(*name).filter(|v| !v.is_null()) {
                None if attr.required && attr.default.is_none() => {
                    return Err(CoreError::validation(format!(
                        "missing required argument \"{path}\""
                    )));
                }
                None => {}
                Some(value) => check_value(&path, attr, value)?,
            }
        }
        Ok(())
    }

    /// Declared attributes whose change forces the resource to be replaced.
    pub fn replacement_triggers(&self, prior: &AttrMap, config: &AttrMap) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .filter(|(name, _)| {
                config
                    .get(**name)
                    .filter(|v| !v.is_null())
                    .is_some_and(|new| prior.get(**name).is_some_and(|old| !same_value(old, new)))
            })
            .map(|(name, _)| *name)
            .collect()
    }
}

fn check_value(path: &str, attr: &Attribute, value: &Value) -> Result<(), CoreError> {
    let type_ok = match &attr.ty {
        AttrType::String => value.is_string(),
        AttrType::Int => as_i64(value).is_some(),
        AttrType::Float => value.is_number(),
        AttrType::Bool => value.is_boolean(),
        AttrType::List(_) | AttrType::Block(_) => value.is_array(),
    };
    if !type_ok {
        return Err(CoreError::validation(format!(
            "\"{path}\" has the wrong type, expected {}",
            type_label(&attr.ty)
        )));
    }

    if let (Some(allowed), Some(text)) = (attr.one_of, value.as_str()) {
        if !allowed.contains(&text) {
            return Err(CoreError::validation(format!(
                "\"{path}\" must be one of [{}], got \"{text}\"",
                allowed.join(", ")
            )));
        }
    }

    if let AttrType::Block(nested) = &attr.ty {
        let records = value.as_array().map_or(&[][..], Vec::as_slice);
        if attr.max_items.is_some_and(|max| records.len() > max) {
            return Err(CoreError::validation(format!(
                "\"{path}\" accepts at most {} block(s)",
                attr.max_items.unwrap_or_default()
            )));
        }
        for (idx, record) in records.iter().enumerate() {
            let map = record.as_object().ok_or_else(|| {
                CoreError::validation(format!("\"{path}.{idx}\" must be a record"))
            })?;
            nested.validate_at(&format!("{path}.{idx}."), map)?;
        }
    }
    Ok(())
}

fn type_label(ty: &AttrType) -> &'static str {
    match ty {
        AttrType::String => "string",
        AttrType::Int => "int",
        AttrType::Float => "float",
        AttrType::Bool => "bool",
        AttrType::List(_) => "list",
        AttrType::Block(_) => "block",
    }
}
