use serde_json::Value;

use super::{cell, result_of};

/// Headline field per command, in priority order.
const PRIORITY_KEYS: [&str; 9] = [
    "profit",
    "break_even_price",
    "estimated_price",
    "intrinsic_value",
    "matched",
    "total",
    "total_warrants",
    "expected_expiry",
    "version",
];

/// Print just the key answer of a command.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                println!("{}", cell(val));
                return;
            }
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, cell(val));
            return;
        }
    }

    println!("{}", cell(result));
}
