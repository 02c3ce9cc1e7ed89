use serde_json::{Map, Value};
use std::io;

use super::{cell, flatten, headers, result_of, rows_of};

/// Write a command result as CSV to stdout.
///
/// Row collections become one record per row; anything else is a two-column
/// `field,value` listing of the flattened result.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let result = result_of(value);

    match rows_of(result) {
        Some(rows) => {
            let flat: Vec<Map<String, Value>> = rows.iter().map(flatten).collect();
            let headers = headers(&flat);
            if !headers.is_empty() {
                let _ = wtr.write_record(&headers);
            }
            for row in &flat {
                let record: Vec<String> = headers
                    .iter()
                    .map(|h| row.get(h).map(cell).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&record);
            }
        }
        None => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in flatten(result) {
                let _ = wtr.write_record([key, cell(&val)]);
            }
        }
    }

    let _ = wtr.flush();
}
