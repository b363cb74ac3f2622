use serde_json::{Map, Value};

use crate::output::format::{create_styled_table, header_cell, styled_cell, to_pretty_json};

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// One row per record field
pub(crate) fn print_settings_table(records: &[(&str, Value)], use_color: bool) {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Record", use_color),
        header_cell("Field", use_color),
        header_cell("Value", use_color),
    ]);
    for (name, value) in records {
        match value {
            Value::Object(fields) => {
                for (i, (field, v)) in fields.iter().enumerate() {
                    let record = if i == 0 { *name } else { "" };
                    table.add_row(vec![
                        styled_cell(record, None, true),
                        styled_cell(field, None, false),
                        styled_cell(&render_value(v), None, false),
                    ]);
                }
            }
            other => {
                table.add_row(vec![
                    styled_cell(name, None, true),
                    styled_cell("", None, false),
                    styled_cell(&render_value(other), None, false),
                ]);
            }
        }
    }
    println!("\n  Dashboard Settings\n");
    println!("{table}");
}

pub(crate) fn output_settings_json(records: &[(&str, Value)]) -> String {
    let map: Map<String, Value> = records
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect();
    to_pretty_json(&map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_value_unquotes_strings() {
        assert_eq!(render_value(&json!("09:00")), "09:00");
        assert_eq!(render_value(&json!(5)), "5");
        assert_eq!(render_value(&Value::Null), "-");
    }

    #[test]
    fn json_keys_by_record_name() {
        let json = output_settings_json(&[("currency", json!({"code": "EUR"}))]);
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["currency"]["code"], "EUR");
    }
}
