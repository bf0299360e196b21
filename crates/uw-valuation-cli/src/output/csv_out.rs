use serde_json::Value;
use std::io;

use super::{columns, format_scalar, row_sets, scalar_fields};

/// CSV on stdout. A result holding one set of line items or tenants is
/// written as that set; several leaf sets share one stream behind a `set`
/// column. Anything else becomes two-column `field,value`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    // Row sets differ in width, so records may too.
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let mut sets = Vec::new();
    row_sets("", result, &mut sets);
    // Footer arrays hold their own row arrays; keep only the leaf sets.
    let leaves: Vec<&(String, &[Value])> = sets
        .iter()
        .filter(|(path, _)| !sets.iter().any(|(other, _)| other.starts_with(&format!("{path}."))))
        .collect();

    match leaves.as_slice() {
        [] => {
            let mut fields = Vec::new();
            scalar_fields("", result, &mut fields);
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in fields {
                let _ = wtr.write_record([key, val]);
            }
        }
        [(_, rows)] => {
            write_rows(&mut wtr, None, rows, &mut Vec::new());
        }
        many => {
            let mut header = Vec::new();
            for (path, rows) in many.iter() {
                write_rows(&mut wtr, Some(path.as_str()), rows, &mut header);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_rows(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    set: Option<&str>,
    rows: &[Value],
    last_header: &mut Vec<String>,
) {
    let headers = columns(rows);
    // A header line only where the columns change.
    if *last_header != headers {
        let mut record: Vec<&str> = Vec::new();
        if set.is_some() {
            record.push("set");
        }
        record.extend(headers.iter().map(String::as_str));
        let _ = wtr.write_record(&record);
        *last_header = headers.clone();
    }
    for item in rows {
        if let Value::Object(map) = item {
            let mut record: Vec<String> = set.map(|s| vec![s.to_string()]).unwrap_or_default();
            record.extend(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_scalar).unwrap_or_default()),
            );
            let _ = wtr.write_record(&record);
        }
    }
}
