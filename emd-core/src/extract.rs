/// Form-to-JSON extraction: walks a rendered form's field values in
/// schema-declared order and assembles the nested document the schema
/// describes. Coercion is lenient by omission: a field that fails its
/// type or domain constraint is left out of the document and recorded in
/// the companion drop list, and correctness enforcement stays with the
/// validator.
use crate::ast::{CompiledSchema, SchemaNode, SchemaType};
use crate::paths::{join_index, join_key};
use crate::semantics::{self, FieldClass};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Snapshot of the whole form: section key (schema property name) to the
/// repeated item groups the user added under it. The rendering layer owns
/// the DOM; this is the semantic content it hands over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    #[serde(default)]
    pub sections: BTreeMap<String, Vec<ItemGroup>>,
}

impl FormData {
    pub fn new() -> FormData {
        FormData::default()
    }

    pub fn add_item(&mut self, section: &str, item: ItemGroup) {
        self.sections.entry(section.to_string()).or_default().push(item);
    }
}

/// One item group: scalar inputs by field name, plus nested object and
/// nested array sub-groups keyed by their schema field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemGroup {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub objects: BTreeMap<String, ItemGroup>,
    #[serde(default)]
    pub arrays: BTreeMap<String, Vec<ItemGroup>>,
}

impl ItemGroup {
    pub fn new() -> ItemGroup {
        ItemGroup::default()
    }

    pub fn field(mut self, name: &str, value: &str) -> ItemGroup {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn object(mut self, name: &str, group: ItemGroup) -> ItemGroup {
        self.objects.insert(name.to_string(), group);
        self
    }

    pub fn array_item(mut self, name: &str, group: ItemGroup) -> ItemGroup {
        self.arrays.entry(name.to_string()).or_default().push(group);
        self
    }
}

/// Why a field was left out of the extracted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NotANumber,
    NotAnInteger,
    NegativeAmount,
    NonPositiveIdentifier,
    NotABoolean,
    EnumMismatch,
    PatternMismatch,
    TooShort,
    TooLong,
    InvalidIntegerList,
    UnsupportedShape,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropReason::NotANumber => "value is not a number",
            DropReason::NotAnInteger => "value is not an integer",
            DropReason::NegativeAmount => "amount must not be negative",
            DropReason::NonPositiveIdentifier => "identifier must be a positive integer",
            DropReason::NotABoolean => "value is not 'true' or 'false'",
            DropReason::EnumMismatch => "value is not one of the allowed options",
            DropReason::PatternMismatch => "value does not match the required pattern",
            DropReason::TooShort => "value is too short",
            DropReason::TooLong => "value is too long",
            DropReason::InvalidIntegerList => "value is not a list of integers",
            DropReason::UnsupportedShape => "field cannot hold a scalar value",
        };
        f.write_str(text)
    }
}

/// A field omitted from the document during extraction, with the raw input
/// that failed coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedField {
    pub path: String,
    pub raw: String,
    pub reason: DropReason,
}

/// The extracted document plus everything that was dropped on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub document: Value,
    pub dropped: Vec<DroppedField>,
}

/// Assemble a candidate document from a form snapshot. Sections are walked
/// in schema-declared order; sections the user never populated are omitted
/// entirely, as are item groups with zero populated fields.
pub fn extract(form: &FormData, schema: &CompiledSchema) -> Extraction {
    let mut dropped = Vec::new();
    let mut output = Map::new();

    for (section_key, section_node) in schema.sections() {
        if section_node.ty != Some(SchemaType::Array) {
            continue;
        }
        let Some(item_node) = section_node.items.as_deref() else { continue };
        let Some(groups) = form.sections.get(section_key) else { continue };

        let mut items = Vec::new();
        for (index, group) in groups.iter().enumerate() {
            let item_path = join_index(section_key, index);
            let item = extract_group(group, item_node, &item_path, &mut dropped);
            if !item.is_empty() {
                items.push(Value::Object(item));
            }
        }
        if !items.is_empty() {
            output.insert(section_key.clone(), Value::Array(items));
        }
    }

    let mut document = Value::Object(output);
    round_monetary_values(&mut document);
    Extraction { document, dropped }
}

fn extract_group(
    group: &ItemGroup,
    node: &SchemaNode,
    path: &str,
    dropped: &mut Vec<DroppedField>,
) -> Map<String, Value> {
    let mut out = Map::new();

    // Scalar fields, in schema order; inputs without a schema entry are
    // ignored, untouched inputs are skipped without being recorded.
    for (key, field_node) in &node.properties {
        let Some(raw) = group.fields.get(key) else { continue };
        if raw.trim().is_empty() {
            continue;
        }
        match coerce_scalar(raw, field_node, key) {
            Ok(value) => {
                out.insert(key.clone(), value);
            }
            Err(reason) => dropped.push(DroppedField {
                path: join_key(path, key),
                raw: raw.clone(),
                reason,
            }),
        }
    }

    for (key, sub_group) in &group.objects {
        let Some(object_node) = node.properties.get(key) else { continue };
        if object_node.ty != Some(SchemaType::Object) {
            continue;
        }
        let nested = extract_group(sub_group, object_node, &join_key(path, key), dropped);
        if !nested.is_empty() {
            out.insert(key.clone(), Value::Object(nested));
        }
    }

    for (key, sub_groups) in &group.arrays {
        let Some(array_node) = node.properties.get(key) else { continue };
        if array_node.ty != Some(SchemaType::Array) {
            continue;
        }
        let Some(element_node) = array_node.items.as_deref() else { continue };
        let array_path = join_key(path, key);
        let mut nested_items = Vec::new();
        for (index, sub_group) in sub_groups.iter().enumerate() {
            let nested = extract_group(
                sub_group,
                element_node,
                &join_index(&array_path, index),
                dropped,
            );
            if !nested.is_empty() {
                nested_items.push(Value::Object(nested));
            }
        }
        if !nested_items.is_empty() {
            out.insert(key.clone(), Value::Array(nested_items));
        }
    }

    out
}

fn coerce_scalar(raw: &str, node: &SchemaNode, key: &str) -> Result<Value, DropReason> {
    let class = semantics::classify(key, node);
    if class == Some(FieldClass::PassengerIds) {
        return coerce_passenger_ids(raw);
    }

    // No declared type: string passthrough.
    let Some(ty) = node.ty else {
        return Ok(Value::String(raw.to_string()));
    };

    match ty {
        SchemaType::String => coerce_string(raw, node),
        SchemaType::Integer | SchemaType::Number => coerce_number(raw, ty, class),
        SchemaType::Boolean => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(DropReason::NotABoolean),
        },
        SchemaType::Array => coerce_integer_list(raw, node, class),
        SchemaType::Object | SchemaType::Null => Err(DropReason::UnsupportedShape),
    }
}

fn coerce_string(raw: &str, node: &SchemaNode) -> Result<Value, DropReason> {
    if !node.enum_values.is_empty() && !node.enum_values.iter().any(|v| v == raw) {
        return Err(DropReason::EnumMismatch);
    }
    if let Some(pattern) = &node.pattern {
        if !pattern.is_match(raw) {
            return Err(DropReason::PatternMismatch);
        }
    }
    let length = raw.chars().count() as u64;
    if node.min_length.is_some_and(|min| length < min) {
        return Err(DropReason::TooShort);
    }
    if node.max_length.is_some_and(|max| length > max) {
        return Err(DropReason::TooLong);
    }
    Ok(Value::String(raw.to_string()))
}

fn coerce_number(raw: &str, ty: SchemaType, class: Option<FieldClass>) -> Result<Value, DropReason> {
    let number: f64 = raw.trim().parse().map_err(|_| DropReason::NotANumber)?;
    if !number.is_finite() {
        return Err(DropReason::NotANumber);
    }

    match class {
        Some(FieldClass::Monetary) => {
            if number < 0.0 {
                return Err(DropReason::NegativeAmount);
            }
            // Rounded here and again in the final document walk, so pasted
            // and nested values get the same treatment.
            return Ok(json_number(semantics::round_price(number)));
        }
        Some(FieldClass::Identifier) => {
            if number.fract() != 0.0 || number <= 0.0 {
                return Err(DropReason::NonPositiveIdentifier);
            }
        }
        _ => {}
    }

    if ty == SchemaType::Integer {
        if number.fract() != 0.0 {
            return Err(DropReason::NotAnInteger);
        }
        return Ok(Value::from(number as i64));
    }
    Ok(json_number(number))
}

fn coerce_passenger_ids(raw: &str) -> Result<Value, DropReason> {
    let ids = semantics::parse_integer_list(raw).ok_or(DropReason::InvalidIntegerList)?;
    if ids.iter().any(|id| *id <= 0) {
        return Err(DropReason::NonPositiveIdentifier);
    }
    Ok(Value::Array(ids.into_iter().map(Value::from).collect()))
}

fn coerce_integer_list(
    raw: &str,
    node: &SchemaNode,
    class: Option<FieldClass>,
) -> Result<Value, DropReason> {
    let integer_items = node
        .items
        .as_deref()
        .is_some_and(|items| items.ty == Some(SchemaType::Integer));
    if !integer_items {
        return Err(DropReason::UnsupportedShape);
    }
    let ids = semantics::parse_integer_list(raw).ok_or(DropReason::InvalidIntegerList)?;
    if class == Some(FieldClass::Identifier) && ids.iter().any(|id| *id <= 0) {
        return Err(DropReason::NonPositiveIdentifier);
    }
    Ok(Value::Array(ids.into_iter().map(Value::from).collect()))
}

/// Walk a finished document and round every number under a monetary key.
/// Unconditional normalization at the extraction boundary only; the
/// validator merely warns on drift in externally authored documents.
pub fn round_monetary_values(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(round_monetary_values),
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if semantics::monetary_key(key) {
                    if let Some(number) = entry.as_f64() {
                        *entry = json_number(semantics::round_price(number));
                    }
                }
                round_monetary_values(entry);
            }
        }
        _ => {}
    }
}

/// Integral values are emitted as JSON integers, everything else as floats.
fn json_number(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < (i64::MAX as f64) {
        Value::from(number as i64)
    } else {
        Value::from(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use serde_json::json;

    fn schema() -> CompiledSchema {
        compile(&json!({
            "type": "object",
            "properties": {
                "air_reservation_details": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "pnr": {"type": "string", "maxLength": 10},
                            "insurance_price": {"type": "number", "description": "Total price of the insurance"},
                            "booking_id": {"type": "integer"},
                            "refundable": {"type": "boolean"},
                            "ticket_delivery_method": {"type": "string", "enum": ["pick_up", "email"]},
                            "itinerary": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "departure": {"type": "string", "minLength": 3, "maxLength": 3},
                                        "passenger_id": {"type": "array", "items": {"type": "integer"}}
                                    }
                                }
                            },
                            "affiliate": {
                                "type": "object",
                                "properties": {
                                    "name": {"type": "string"}
                                }
                            }
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_extract_full_item() {
        let mut form = FormData::new();
        form.add_item(
            "air_reservation_details",
            ItemGroup::new()
                .field("pnr", "VH67899")
                .field("insurance_price", "120.5")
                .field("booking_id", "42")
                .field("refundable", "true")
                .field("ticket_delivery_method", "email")
                .array_item(
                    "itinerary",
                    ItemGroup::new()
                        .field("departure", "ARN")
                        .field("passenger_id", "[1,2]"),
                )
                .object("affiliate", ItemGroup::new().field("name", "Acme Travel")),
        );

        let extraction = extract(&form, &schema());
        assert!(extraction.dropped.is_empty());
        assert_eq!(
            extraction.document,
            json!({
                "air_reservation_details": [{
                    "pnr": "VH67899",
                    "insurance_price": 120.5,
                    "booking_id": 42,
                    "refundable": true,
                    "ticket_delivery_method": "email",
                    "itinerary": [{"departure": "ARN", "passenger_id": [1, 2]}],
                    "affiliate": {"name": "Acme Travel"}
                }]
            })
        );
    }

    #[test]
    fn test_blank_fields_are_skipped_silently() {
        let mut form = FormData::new();
        form.add_item(
            "air_reservation_details",
            ItemGroup::new().field("pnr", "VH1").field("booking_id", "  "),
        );
        let extraction = extract(&form, &schema());
        assert!(extraction.dropped.is_empty());
        assert_eq!(
            extraction.document,
            json!({"air_reservation_details": [{"pnr": "VH1"}]})
        );
    }

    #[test]
    fn test_failed_coercions_are_recorded() {
        let mut form = FormData::new();
        form.add_item(
            "air_reservation_details",
            ItemGroup::new()
                .field("pnr", "VH67899")
                .field("insurance_price", "-10")
                .field("booking_id", "2.5")
                .field("refundable", "yes")
                .field("ticket_delivery_method", "fax"),
        );
        let extraction = extract(&form, &schema());
        assert_eq!(
            extraction.document,
            json!({"air_reservation_details": [{"pnr": "VH67899"}]})
        );

        let reasons: Vec<(&str, DropReason)> = extraction
            .dropped
            .iter()
            .map(|d| (d.path.as_str(), d.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("air_reservation_details[0].booking_id", DropReason::NonPositiveIdentifier),
                ("air_reservation_details[0].insurance_price", DropReason::NegativeAmount),
                ("air_reservation_details[0].refundable", DropReason::NotABoolean),
                ("air_reservation_details[0].ticket_delivery_method", DropReason::EnumMismatch),
            ]
        );
    }

    #[test]
    fn test_empty_groups_and_sections_are_omitted() {
        let mut form = FormData::new();
        form.add_item("air_reservation_details", ItemGroup::new().field("pnr", ""));
        let extraction = extract(&form, &schema());
        assert_eq!(extraction.document, json!({}));
    }

    #[test]
    fn test_unknown_sections_and_fields_are_ignored() {
        let mut form = FormData::new();
        form.add_item("bike_rental_details", ItemGroup::new().field("frame", "54"));
        form.add_item(
            "air_reservation_details",
            ItemGroup::new().field("pnr", "VH1").field("no_such_field", "x"),
        );
        let extraction = extract(&form, &schema());
        assert_eq!(
            extraction.document,
            json!({"air_reservation_details": [{"pnr": "VH1"}]})
        );
        assert!(extraction.dropped.is_empty());
    }

    #[test]
    fn test_passenger_id_forms_extract_identically() {
        let schema = schema();
        for raw in ["[1,2,3]", "1, 2, 3"] {
            let mut form = FormData::new();
            form.add_item(
                "air_reservation_details",
                ItemGroup::new().array_item(
                    "itinerary",
                    ItemGroup::new().field("passenger_id", raw),
                ),
            );
            let extraction = extract(&form, &schema);
            assert_eq!(
                extraction.document,
                json!({"air_reservation_details": [{"itinerary": [{"passenger_id": [1, 2, 3]}]}]}),
                "raw input {raw:?}"
            );
        }
    }

    #[test]
    fn test_passenger_id_rejects_non_positive_elements() {
        let mut form = FormData::new();
        form.add_item(
            "air_reservation_details",
            ItemGroup::new().array_item(
                "itinerary",
                ItemGroup::new().field("passenger_id", "[1,-2]"),
            ),
        );
        let extraction = extract(&form, &schema());
        assert_eq!(extraction.document, json!({}));
        assert_eq!(extraction.dropped.len(), 1);
        assert_eq!(extraction.dropped[0].reason, DropReason::NonPositiveIdentifier);
    }

    #[test]
    fn test_monetary_values_are_rounded() {
        let mut form = FormData::new();
        form.add_item(
            "air_reservation_details",
            ItemGroup::new().field("insurance_price", "3390.9999999999995"),
        );
        let extraction = extract(&form, &schema());
        let price = extraction.document["air_reservation_details"][0]["insurance_price"]
            .as_f64()
            .unwrap();
        assert_eq!(price, 3391.0);
    }

    #[test]
    fn test_round_monetary_values_walks_nested_documents() {
        let mut document = json!({
            "event": [{"tickets": [{"ticket_price": 12.345}], "name": "gig"}],
            "total_amount_paid_purchases": 9.999999999
        });
        round_monetary_values(&mut document);
        assert_eq!(
            document["event"][0]["tickets"][0]["ticket_price"].as_f64().unwrap(),
            12.35
        );
        assert_eq!(document["total_amount_paid_purchases"].as_f64().unwrap(), 10.0);
        assert_eq!(document["event"][0]["name"], json!("gig"));
    }

    #[test]
    fn test_string_constraint_failures_drop() {
        let mut form = FormData::new();
        form.add_item(
            "air_reservation_details",
            ItemGroup::new().field("pnr", "WAY-TOO-LONG-PNR"),
        );
        let extraction = extract(&form, &schema());
        assert_eq!(extraction.document, json!({}));
        assert_eq!(extraction.dropped[0].reason, DropReason::TooLong);
    }
}
