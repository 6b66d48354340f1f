/// Example-document generation: field descriptions in the EMD schema embed
/// sample values as ``Example: `...` `` snippets; those are mined first,
/// with shape-based fallbacks for fields that carry none.
use crate::ast::{CompiledSchema, Format, SchemaNode, SchemaType};
use crate::semantics::{self, FieldClass};
use serde_json::{json, Map, Value};

/// Build a document with one populated item per section.
pub fn example_document(schema: &CompiledSchema) -> Value {
    let mut output = Map::new();
    for (key, section) in schema.sections() {
        if section.ty != Some(SchemaType::Array) {
            continue;
        }
        if let Some(items) = section.items.as_deref() {
            output.insert(key.clone(), json!([example_value(items, key)]));
        }
    }
    Value::Object(output)
}

/// An example value for one schema node.
pub fn example_value(node: &SchemaNode, key: &str) -> Value {
    match node.ty {
        Some(SchemaType::Object) => {
            let mut obj = Map::new();
            for (name, property) in &node.properties {
                obj.insert(name.clone(), example_value(property, name));
            }
            Value::Object(obj)
        }
        Some(SchemaType::Array) => match node.items.as_deref() {
            Some(items) if items.ty == Some(SchemaType::Integer) => json!([1, 2]),
            Some(items) => json!([example_value(items, key)]),
            None => json!([]),
        },
        Some(SchemaType::String) => example_string(node),
        Some(SchemaType::Integer) => json!(mined_number(node).map(|n| n as i64).unwrap_or(1)),
        Some(SchemaType::Number) => example_number(node, key),
        Some(SchemaType::Boolean) => json!(true),
        Some(SchemaType::Null) | None => Value::Null,
    }
}

fn example_string(node: &SchemaNode) -> Value {
    if let Some(first) = node.enum_values.first() {
        return json!(first);
    }
    if let Some(example) = mined_example(node) {
        return json!(example);
    }
    match node.format {
        Some(Format::Date) => return json!("2024-12-24"),
        Some(Format::Time) => return json!("12:00"),
        Some(Format::DateTime) => return json!("2024-12-24T12:00"),
        Some(Format::Email) => return json!("customer@example.com"),
        Some(Format::Uri) => return json!("https://example.com/"),
        None => {}
    }
    // Exact-length bounds mark location and carrier codes.
    if node.min_length == Some(3) && node.max_length == Some(3) {
        return json!("ABC");
    }
    if node.min_length == Some(2) && node.max_length == Some(2) {
        return json!("AB");
    }
    json!("Example")
}

fn example_number(node: &SchemaNode, key: &str) -> Value {
    if let Some(mined) = mined_number(node) {
        return json!(mined);
    }
    if semantics::classify(key, node) == Some(FieldClass::Monetary) {
        return json!(10000.0);
    }
    json!(100.0)
}

/// The value between backticks in an ``Example: `...` `` description snippet.
fn mined_example(node: &SchemaNode) -> Option<String> {
    let description = node.description.as_deref()?;
    let (_, rest) = description.split_once("Example: `")?;
    let (example, _) = rest.split_once('`')?;
    Some(example.to_string())
}

fn mined_number(node: &SchemaNode) -> Option<f64> {
    let raw = mined_example(node)?;
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;

    #[test]
    fn test_mined_examples_win_over_fallbacks() {
        let schema = compile(&json!({
            "type": "string",
            "description": "Trip booking number. Example: `VH67899`"
        }))
        .unwrap();
        assert_eq!(example_value(&schema.root, "pnr"), json!("VH67899"));
    }

    #[test]
    fn test_enum_uses_first_value() {
        let schema = compile(&json!({
            "type": "string",
            "enum": ["pick_up", "email"],
            "description": "Example: `post`"
        }))
        .unwrap();
        assert_eq!(example_value(&schema.root, "delivery"), json!("pick_up"));
    }

    #[test]
    fn test_code_fallbacks_by_length_bounds() {
        let iata = compile(&json!({"type": "string", "minLength": 3, "maxLength": 3})).unwrap();
        assert_eq!(example_value(&iata.root, "departure"), json!("ABC"));
        let carrier = compile(&json!({"type": "string", "minLength": 2, "maxLength": 2})).unwrap();
        assert_eq!(example_value(&carrier.root, "carrier"), json!("AB"));
    }

    #[test]
    fn test_mined_number_strips_currency_text() {
        let schema = compile(&json!({
            "type": "number",
            "description": "Price in minor units. Example: `12000 SEK`"
        }))
        .unwrap();
        assert_eq!(example_value(&schema.root, "ticket_price"), json!(12000.0));
    }

    #[test]
    fn test_integer_array_fallback() {
        let schema = compile(&json!({"type": "array", "items": {"type": "integer"}})).unwrap();
        assert_eq!(example_value(&schema.root, "passenger_id"), json!([1, 2]));
    }

    #[test]
    fn test_example_document_builds_one_item_per_section() {
        let schema = compile(&json!({
            "type": "object",
            "properties": {
                "voucher": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "voucher_name": {"type": "string", "description": "Example: `City tour`"},
                            "voucher_price": {"type": "number", "description": "Example: `2500`"}
                        }
                    }
                }
            }
        }))
        .unwrap();
        assert_eq!(
            example_document(&schema),
            json!({"voucher": [{"voucher_name": "City tour", "voucher_price": 2500.0}]})
        );
    }
}
