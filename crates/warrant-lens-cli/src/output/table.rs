use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, flatten, headers, result_of, rows_of};

/// Render a command result as tables: the row collection (if any) plus the scalar fields.
pub fn print_table(value: &Value) {
    let result = result_of(value);

    match rows_of(result) {
        Some(rows) => {
            if let Value::Object(map) = result {
                let scalars: Map<String, Value> = map
                    .iter()
                    .filter(|(_, v)| !v.is_array())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                if !scalars.is_empty() {
                    print_fields(&flatten(&Value::Object(scalars)));
                    println!();
                }
            }
            print_rows(rows);
        }
        None => print_fields(&flatten(result)),
    }

    if let Some(envelope) = value.as_object().filter(|m| m.contains_key("result")) {
        print_envelope_notes(envelope);
    }
}

fn print_fields(fields: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.clone(), cell(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(no rows)");
        return;
    }
    let flat: Vec<Map<String, Value>> = rows.iter().map(flatten).collect();
    let headers = headers(&flat);

    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in &flat {
        builder.push_record(
            headers
                .iter()
                .map(|h| row.get(h).map(cell).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
