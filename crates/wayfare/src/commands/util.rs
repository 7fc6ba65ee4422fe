//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;

use wayfare_core::EntityId;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Parse a record id argument. Blank ids never address a record.
pub fn parse_id(raw: &str) -> Result<EntityId, CliError> {
    let id = EntityId::from(raw.trim());
    if id.is_blank() {
        return Err(CliError::Validation {
            field: "id".into(),
            reason: "must not be empty or 0".into(),
        });
    }
    Ok(id)
}

/// A stderr spinner, hidden when quiet or when stderr is not a terminal.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Key/value detail view of any record, keys sorted.
pub fn detail<T: Serialize>(item: &T, color: bool) -> String {
    let Ok(Value::Object(fields)) = serde_json::to_value(item) else {
        return String::new();
    };
    let width = fields.keys().map(String::len).max().unwrap_or(0);

    fields
        .iter()
        .map(|(key, value)| {
            let padded = format!("{key:<width$}");
            format!("{}  {}", output::label(&padded, color), scalar(value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => "-".into(),
        other => other.to_string(),
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wayfare_core::{Location, MealPlan};

    #[test]
    fn parse_id_normalizes_and_rejects_blank() {
        assert_eq!(parse_id(" 42 ").unwrap(), EntityId::Num(42));
        assert_eq!(parse_id("goa").unwrap(), EntityId::Str("goa".into()));
        assert!(parse_id("0").is_err());
        assert!(parse_id("   ").is_err());
    }

    #[test]
    fn detail_aligns_keys() {
        let loc = Location {
            id: EntityId::Num(4),
            name: "Goa".into(),
            short_name: None,
        };
        insta::assert_snapshot!(detail(&loc, false), @r"
        id          4
        name        Goa
        short_name  -
        ");
    }

    #[test]
    fn detail_of_non_object_is_empty() {
        assert_eq!(detail(&3_u8, false), "");
        let plan = MealPlan {
            id: EntityId::Num(1),
            name: "CP".into(),
            description: None,
        };
        assert!(detail(&plan, false).contains("CP"));
    }
}
