use serde_json::Value;

use super::format_scalar;

/// Headline figure of each command, in the order they are looked for.
const PRIORITY_KEYS: [&str; 6] = [
    "egi",
    "grand_total_annual",
    "total_annual",
    "total_annual_recovery",
    "total_annual_rent",
    "annual",
];

/// Print just the headline figure.
///
/// A full valuation prints its EGI from the nested aggregates; other results
/// are searched for the priority keys, then fall back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        println!("{}", format_scalar(result_obj));
        return;
    };

    let candidates = [Some(map), map.get("aggregates").and_then(Value::as_object)];
    for key in PRIORITY_KEYS {
        for obj in candidates.iter().flatten() {
            if let Some(val) = obj.get(key).filter(|v| !v.is_null()) {
                println!("{}", format_scalar(val));
                return;
            }
        }
    }

    if let Some((key, val)) = map.iter().next() {
        println!("{}: {}", key, format_scalar(val));
    }
}
