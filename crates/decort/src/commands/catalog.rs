//! Catalog commands: what the provider serves, without touching the platform.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use decort_core::{AttrType, Attribute, Provider, Schema, Timeouts};

use crate::cli::{GlobalOpts, OutputFormat, SchemaArgs};
use crate::error::CliError;
use crate::output;

// ── Resources ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    type_name: &'static str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeouts: Option<Timeouts>,
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Type")]
    type_name: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Create")]
    create: String,
    #[tabled(rename = "Read")]
    read: String,
    #[tabled(rename = "Update")]
    update: String,
    #[tabled(rename = "Delete")]
    delete: String,
}

fn catalog_row(e: &CatalogEntry) -> CatalogRow {
    let secs = |pick: fn(&Timeouts) -> Duration| {
        e.timeouts
            .as_ref()
            .map_or_else(|| "-".into(), |t| format!("{}s", pick(t).as_secs()))
    };
    CatalogRow {
        type_name: e.type_name,
        kind: e.kind,
        create: secs(|t| t.create),
        read: secs(|t| t.read),
        update: secs(|t| t.update),
        delete: secs(|t| t.delete),
    }
}

pub fn resources(provider: &Provider, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = provider.registry();
    let entries: Vec<CatalogEntry> = registry
        .resources()
        .map(|r| CatalogEntry {
            type_name: r.type_name(),
            kind: "resource",
            timeouts: Some(r.timeouts()),
        })
        .chain(registry.data_sources().map(|s| CatalogEntry {
            type_name: s.type_name(),
            kind: "data source",
            timeouts: None,
        }))
        .collect();

    output::print_output(&output::render_list(global.output, &entries, catalog_row));
    Ok(())
}

// ── Schema ───────────────────────────────────────────────────────────

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    ty: String,
    #[tabled(rename = "Mode")]
    mode: &'static str,
    #[tabled(rename = "Force New")]
    force_new: &'static str,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Description")]
    description: &'static str,
}

impl AttributeRow {
    fn new(name: String, a: &Attribute) -> Self {
        Self {
            name,
            ty: type_label(&a.ty),
            mode: mode_label(a),
            force_new: if a.force_new { "yes" } else { "" },
            default: a.default.as_ref().map(Value::to_string).unwrap_or_default(),
            description: a.description,
        }
    }
}

pub fn schema(provider: &Provider, args: &SchemaArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = provider.registry();
    let schema = if args.data_source {
        registry.data_source(&args.type_name)?.schema()
    } else {
        registry.resource(&args.type_name)?.schema()
    };

    let rendered = match global.output {
        OutputFormat::Table => {
            let mut rows = Vec::new();
            collect_rows(&schema, "", &mut rows);
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json | OutputFormat::Yaml => output::render_document(global.output, &schema),
    };
    output::print_output(&rendered);
    Ok(())
}

/// Nested block attributes appear as `parent.child` rows after their parent.
fn collect_rows(schema: &Schema, prefix: &str, rows: &mut Vec<AttributeRow>) {
    for (name, attribute) in &schema.attributes {
        let path = format!("{prefix}{name}");
        rows.push(AttributeRow::new(path.clone(), attribute));
        if let AttrType::Block(inner) = &attribute.ty {
            collect_rows(inner, &format!("{path}."), rows);
        }
    }
}

fn type_label(ty: &AttrType) -> String {
    match ty {
        AttrType::String => "string".into(),
        AttrType::Int => "int".into(),
        AttrType::Float => "float".into(),
        AttrType::Bool => "bool".into(),
        AttrType::List(inner) => format!("list({})", type_label(inner)),
        AttrType::Block(_) => "block".into(),
    }
}

fn mode_label(a: &Attribute) -> &'static str {
    match (a.required, a.optional, a.computed) {
        (true, _, _) => "required",
        (false, true, true) => "optional+computed",
        (false, true, false) => "optional",
        (false, false, _) => "computed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_nested_types() {
        assert_eq!(type_label(&AttrType::List(Box::new(AttrType::Int))), "list(int)");
        assert_eq!(type_label(&AttrType::Block(Schema::new())), "block");
    }

    #[test]
    fn mode_prefers_required() {
        assert_eq!(mode_label(&Attribute::required(AttrType::String)), "required");
        assert_eq!(
            mode_label(&Attribute::optional_computed(AttrType::Bool)),
            "optional+computed"
        );
        assert_eq!(mode_label(&Attribute::computed(AttrType::Int)), "computed");
    }

    #[test]
    fn block_children_are_dotted() {
        let schema = Schema::new().with(
            "iotune",
            Attribute::optional(AttrType::Block(
                Schema::new().with("read_iops_sec", Attribute::optional(AttrType::Int)),
            )),
        );
        let mut rows = Vec::new();
        collect_rows(&schema, "", &mut rows);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["iotune", "iotune.read_iops_sec"]);
    }
}
