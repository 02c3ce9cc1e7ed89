pub mod file;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{self, Read};

use crate::config::Settings;

/// JSON/YAML from `--input <file>`, else JSON piped on stdin.
pub fn read_value(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(file::read_document(path)?)),
        None => read_piped(),
    }
}

/// Read a command input with settings filled in, or None when nothing was supplied.
pub fn read_with_settings<T: DeserializeOwned>(
    path: Option<&str>,
    settings: &Settings,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let Some(mut value) = read_value(path)? else {
        return Ok(None);
    };
    settings.fill_defaults(&mut value)?;
    Ok(Some(serde_json::from_value(value)?))
}

fn read_piped() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}
