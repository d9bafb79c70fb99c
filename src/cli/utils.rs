use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_json(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// `{"success": true, "message": ...}` with the fields of `data` merged in
fn success_json(message: &str, data: Option<Value>) -> Value {
    let mut response = Map::new();
    response.insert("success".to_string(), json!(true));
    response.insert("message".to_string(), json!(message));

    match data {
        Some(Value::Object(fields)) => response.extend(fields),
        Some(other) => {
            response.insert("data".to_string(), other);
        }
        None => {}
    }

    Value::Object(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_object_data_into_response() {
        let value = success_json("Pruned", Some(json!({ "pruned": 3 })));
        assert_eq!(value, json!({ "success": true, "message": "Pruned", "pruned": 3 }));
    }

    #[test]
    fn wraps_non_object_data() {
        let value = success_json("Done", Some(json!([1, 2])));
        assert_eq!(value["data"], json!([1, 2]));
    }
}
