use serde_json::Value as JsonValue;

use super::model::RawRecord;

// ---------------------------------------------------------------------------
// Top-level shapes
// ---------------------------------------------------------------------------

/// The wrapper shapes producers use around their readings, in the order they
/// are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// `[ {...}, {...} ]`
    Array,
    /// `{ "data": [...] }`
    DataField,
    /// `{ "readings": [...] }`
    ReadingsField,
    /// `{ "<anything>": [...] }`, first array-valued field in document order.
    FirstArrayField,
}

impl InputShape {
    const CHAIN: [InputShape; 4] = [
        InputShape::Array,
        InputShape::DataField,
        InputShape::ReadingsField,
        InputShape::FirstArrayField,
    ];

    fn matches<'a>(self, input: &'a JsonValue) -> Option<&'a Vec<JsonValue>> {
        match self {
            InputShape::Array => input.as_array(),
            InputShape::DataField => input.get("data").and_then(JsonValue::as_array),
            InputShape::ReadingsField => input.get("readings").and_then(JsonValue::as_array),
            InputShape::FirstArrayField => input
                .as_object()
                .and_then(|obj| obj.values().find_map(JsonValue::as_array)),
        }
    }
}

/// Which shape matcher accepts `input`, if any.
pub fn detect_shape(input: &JsonValue) -> Option<InputShape> {
    if is_falsy(input) {
        return None;
    }
    InputShape::CHAIN
        .into_iter()
        .find(|shape| shape.matches(input).is_some())
}

/// Pull the record sequence out of an arbitrary JSON document.
pub fn normalize(input: &JsonValue) -> Vec<RawRecord> {
    if is_falsy(input) {
        return Vec::new();
    }
    for shape in InputShape::CHAIN {
        if let Some(records) = shape.matches(input) {
            log::debug!("Input matched {shape:?} with {} records", records.len());
            return records.clone();
        }
    }
    log::debug!("No record array found in input");
    Vec::new()
}

fn is_falsy(input: &JsonValue) -> bool {
    match input {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v == 0.0 || v.is_nan()),
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_is_unchanged() {
        assert_eq!(normalize(&json!([1, 2, 3])), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(detect_shape(&json!([])), Some(InputShape::Array));
    }

    #[test]
    fn readings_field() {
        let input = json!({"readings": [{"a": 1}]});
        assert_eq!(normalize(&input), vec![json!({"a": 1})]);
        assert_eq!(detect_shape(&input), Some(InputShape::ReadingsField));
    }

    #[test]
    fn data_field_beats_readings() {
        let input = json!({"readings": [{"r": 1}], "data": [{"d": 1}]});
        assert_eq!(normalize(&input), vec![json!({"d": 1})]);
    }

    #[test]
    fn first_array_field_in_document_order() {
        let input: JsonValue =
            serde_json::from_str(r#"{"meta": {"id": 4}, "zeta": [1], "alpha": [2]}"#).unwrap();
        assert_eq!(normalize(&input), vec![json!(1)]);
        assert_eq!(detect_shape(&input), Some(InputShape::FirstArrayField));
    }

    #[test]
    fn non_array_data_field_is_skipped() {
        let input = json!({"data": {"nested": true}, "items": [{"x": 1}]});
        assert_eq!(normalize(&input), vec![json!({"x": 1})]);
    }

    #[test]
    fn unrecognised_and_falsy_inputs_are_empty() {
        assert!(normalize(&json!({"foo": "bar"})).is_empty());
        assert!(normalize(&json!(null)).is_empty());
        assert!(normalize(&json!(0)).is_empty());
        assert!(normalize(&json!("")).is_empty());
        assert!(normalize(&json!("text")).is_empty());
        assert_eq!(detect_shape(&json!({"foo": "bar"})), None);
    }
}
