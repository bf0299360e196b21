pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Row-shaped arrays inside a result, keyed by their dotted path
/// (`expenses.categories.0.rows`, `tenants`, ...). Arrays of scalars and
/// empty arrays are skipped.
pub(crate) fn row_sets<'a>(prefix: &str, value: &'a Value, out: &mut Vec<(String, &'a [Value])>) {
    match value {
        Value::Array(items) if items.first().is_some_and(Value::is_object) => {
            out.push((prefix.to_string(), items.as_slice()));
            for (i, item) in items.iter().enumerate() {
                row_sets(&join(prefix, &i.to_string()), item, out);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                row_sets(&join(prefix, key), child, out);
            }
        }
        _ => {}
    }
}

/// Scalar fields of an object, flattened to dotted paths. Arrays are left to
/// [`row_sets`].
pub(crate) fn scalar_fields(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                scalar_fields(&join(prefix, key), child, out);
            }
        }
        Value::Array(_) => {}
        scalar => out.push((prefix.to_string(), format_scalar(scalar))),
    }
}

/// Column names of a row set: the scalar fields of its first row.
pub(crate) fn columns(rows: &[Value]) -> Vec<String> {
    match rows.first() {
        Some(Value::Object(first)) => first
            .iter()
            .filter(|(_, v)| !v.is_object() && !v.is_array())
            .map(|(k, _)| k.clone())
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
