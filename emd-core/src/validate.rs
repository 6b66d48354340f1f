/// The schema validator: a recursive walk over (value, node) pairs that
/// collects path-qualified diagnostics. Validation never short-circuits the
/// overall walk; only a type mismatch stops further checks on that one node,
/// since constraint checks on a mistyped value would just cascade noise.
///
/// Pure functions throughout: the schema is always an explicit parameter,
/// never ambient state.
use crate::ast::{CompiledSchema, SchemaNode, SchemaType};
use crate::paths::{join_index, join_key, leaf_field_name};
use crate::semantics::{self, FieldClass};
use crate::formats;
use serde::Serialize;
use serde_json::Value;

/// Tolerance for `multipleOf` with non-integral divisors, where the float
/// remainder is never exactly zero.
const MULTIPLE_OF_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One path-qualified finding. Warnings never block validity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub path: String,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// The full, ordered diagnostic list for one validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// A document is valid when no error-severity diagnostic was produced;
    /// precision warnings do not block.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Malformed JSON text supplied to the validator: reported as a single
/// top-level parse failure, distinct from schema diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("invalid JSON input: {0}")]
pub struct InputError(#[from] serde_json::Error);

/// Parse and validate externally supplied JSON text.
pub fn validate_json(input: &str, schema: &CompiledSchema) -> Result<Report, InputError> {
    let document: Value = serde_json::from_str(input)?;
    Ok(validate_document(&document, schema))
}

/// Validate a parsed document against the compiled schema.
pub fn validate_document(document: &Value, schema: &CompiledSchema) -> Report {
    let mut diagnostics = Vec::new();
    validate_node(document, &schema.root, "", "", &mut diagnostics);
    Report { diagnostics }
}

/// Validate a single value against a schema node at the given instance path.
/// The field name used for semantic classification is derived from the path's
/// last segment.
pub fn validate_value(value: &Value, node: &SchemaNode, path: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_node(value, node, leaf_field_name(path), path, &mut diagnostics);
    diagnostics
}

fn validate_node(
    value: &Value,
    node: &SchemaNode,
    key: &str,
    path: &str,
    out: &mut Vec<Diagnostic>,
) {
    // Passenger identifiers are always an array of positive integers,
    // whatever shape their schema node declares.
    if semantics::classify(key, node) == Some(FieldClass::PassengerIds) {
        validate_passenger_ids(value, path, out);
        return;
    }

    // A node without a declared type carries no constraints.
    let Some(ty) = node.ty else { return };

    if !type_matches(value, ty) {
        out.push(Diagnostic::error(
            path,
            format!("Expected type {}, got {}", ty.as_str(), json_type_name(value)),
        ));
        return;
    }

    match ty {
        SchemaType::Object => validate_object(value, node, path, out),
        SchemaType::Array => validate_array(value, node, path, out),
        SchemaType::String => {
            if let Some(text) = value.as_str() {
                validate_string(text, node, key, path, out);
            }
        }
        SchemaType::Number | SchemaType::Integer => validate_number(value, node, key, path, out),
        SchemaType::Boolean | SchemaType::Null => {}
    }
}

fn type_matches(value: &Value, ty: SchemaType) -> bool {
    match ty {
        SchemaType::String => value.is_string(),
        SchemaType::Number => value.is_number(),
        SchemaType::Integer => value.as_f64().is_some_and(|n| n.fract() == 0.0),
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Array => value.is_array(),
        SchemaType::Object => value.is_object(),
        SchemaType::Null => value.is_null(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn validate_object(value: &Value, node: &SchemaNode, path: &str, out: &mut Vec<Diagnostic>) {
    let Some(map) = value.as_object() else { return };

    for name in &node.required {
        if !map.contains_key(name) {
            out.push(Diagnostic::error(
                join_key(path, name),
                format!("Missing required property: {name}"),
            ));
        }
    }

    for (name, entry) in map {
        match node.properties.get(name) {
            Some(child) => validate_node(entry, child, name, &join_key(path, name), out),
            None => {
                // Unknown keys are tolerated unless the schema explicitly
                // forbids them; the outer document container holds multiple
                // unrelated sections.
                if node.additional_properties == Some(false) {
                    out.push(Diagnostic::error(
                        join_key(path, name),
                        format!("Unknown property: {name}"),
                    ));
                }
            }
        }
    }
}

fn validate_array(value: &Value, node: &SchemaNode, path: &str, out: &mut Vec<Diagnostic>) {
    let Some(items) = value.as_array() else { return };

    if let Some(item_node) = node.items.as_deref() {
        if item_node.ty == Some(SchemaType::Integer) && item_node.properties.is_empty() {
            // Integer-element fast path: every failing element is reported
            // individually, not just the first.
            for (index, item) in items.iter().enumerate() {
                if !type_matches(item, SchemaType::Integer) {
                    out.push(Diagnostic::error(
                        join_index(path, index),
                        format!("Expected an integer, got {}", json_type_name(item)),
                    ));
                }
            }
        } else {
            for (index, item) in items.iter().enumerate() {
                validate_node(item, item_node, "", &join_index(path, index), out);
            }
        }
    }

    if let Some(min) = node.min_items {
        if (items.len() as u64) < min {
            out.push(Diagnostic::error(
                path,
                format!("Array has too few items ({}), minimum is {min}", items.len()),
            ));
        }
    }
    if let Some(max) = node.max_items {
        if (items.len() as u64) > max {
            out.push(Diagnostic::error(
                path,
                format!("Array has too many items ({}), maximum is {max}", items.len()),
            ));
        }
    }

    if node.unique_items {
        // serde_json maps are key-sorted, so the serialized form is canonical
        // and string comparison is a sound deep-equality check.
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if !seen.insert(item.to_string()) {
                duplicates.push(index.to_string());
            }
        }
        if !duplicates.is_empty() {
            out.push(Diagnostic::error(
                path,
                format!(
                    "Array must have unique items. Duplicates found at indices: {}",
                    duplicates.join(", ")
                ),
            ));
        }
    }
}

fn validate_string(text: &str, node: &SchemaNode, key: &str, path: &str, out: &mut Vec<Diagnostic>) {
    let length = text.chars().count() as u64;
    let mut length_ok = true;
    if let Some(min) = node.min_length {
        if length < min {
            length_ok = false;
            out.push(Diagnostic::error(
                path,
                format!("String is too short ({length} chars), minimum is {min}"),
            ));
        }
    }
    if let Some(max) = node.max_length {
        if length > max {
            length_ok = false;
            out.push(Diagnostic::error(
                path,
                format!("String is too long ({length} chars), maximum is {max}"),
            ));
        }
    }
    // Pattern checks presume a value of legal length; a length violation
    // already tells the user what to fix.
    if length_ok {
        if let Some(pattern) = &node.pattern {
            if !pattern.is_match(text) {
                out.push(Diagnostic::error(
                    path,
                    format!("String does not match pattern: {}", pattern.source()),
                ));
            }
        }
    }
    if !node.enum_values.is_empty() && !node.enum_values.iter().any(|v| v == text) {
        out.push(Diagnostic::error(
            path,
            format!("Value must be one of: {}", node.enum_values.join(", ")),
        ));
    }
    if let Some(format) = node.format {
        if let Some(message) = formats::check(format, text) {
            out.push(Diagnostic::error(path, message));
        }
    }

    // Location/carrier code fields whose schema entry declares only length
    // bounds get the IATA pattern supplied here; a schema-declared pattern
    // takes precedence, and a length violation is already reported above.
    if length_ok && node.pattern.is_none() {
        match semantics::classify(key, node) {
            Some(FieldClass::LocationCode) if !semantics::is_valid_location_code(text) => {
                out.push(Diagnostic::error(
                    path,
                    "Invalid IATA location code: expected three uppercase letters",
                ));
            }
            Some(FieldClass::CarrierCode) if !semantics::is_valid_carrier_code(text) => {
                out.push(Diagnostic::error(
                    path,
                    "Invalid IATA carrier code: expected two uppercase letters",
                ));
            }
            _ => {}
        }
    }
}

fn validate_number(value: &Value, node: &SchemaNode, key: &str, path: &str, out: &mut Vec<Diagnostic>) {
    let Some(number) = value.as_f64() else { return };

    if let Some(min) = node.minimum {
        if number < min {
            out.push(Diagnostic::error(
                path,
                format!("Value {number} is less than minimum {min}"),
            ));
        }
    }
    if let Some(max) = node.maximum {
        if number > max {
            out.push(Diagnostic::error(
                path,
                format!("Value {number} is greater than maximum {max}"),
            ));
        }
    }
    if let Some(divisor) = node.multiple_of {
        // Compare against the rounded quotient instead of taking `%`: for
        // non-integral divisors like 0.01 the raw remainder is float noise.
        let quotient = number / divisor;
        if (quotient - quotient.round()).abs() > MULTIPLE_OF_EPSILON {
            out.push(Diagnostic::error(
                path,
                format!("Value {number} is not a multiple of {divisor}"),
            ));
        }
    }

    match semantics::classify(key, node) {
        Some(FieldClass::Monetary) => {
            let rounded = semantics::round_price(number);
            if rounded != number {
                out.push(Diagnostic::warning(
                    path,
                    format!(
                        "Floating-point precision issue detected: {number} should be rounded to {rounded:.2}"
                    ),
                ));
            }
        }
        Some(FieldClass::Identifier) => {
            if number.fract() != 0.0 || number <= 0.0 {
                out.push(Diagnostic::error(
                    path,
                    "Must be a positive integer greater than 0",
                ));
            }
        }
        _ => {}
    }
}

/// Passenger identifiers: a native array of positive integers, or the same
/// list in bracketed string form. Both validate identically.
fn validate_passenger_ids(value: &Value, path: &str, out: &mut Vec<Diagnostic>) {
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if !type_matches(item, SchemaType::Integer) {
                    out.push(Diagnostic::error(
                        join_index(path, index),
                        format!("Expected an integer, got {}", json_type_name(item)),
                    ));
                } else if item.as_f64().is_some_and(|n| n <= 0.0) {
                    out.push(Diagnostic::error(
                        join_index(path, index),
                        "Passenger identifiers must be positive integers",
                    ));
                }
            }
        }
        Value::String(text) => match semantics::parse_integer_list(text) {
            Some(ids) => {
                for (index, id) in ids.iter().enumerate() {
                    if *id <= 0 {
                        out.push(Diagnostic::error(
                            join_index(path, index),
                            "Passenger identifiers must be positive integers",
                        ));
                    }
                }
            }
            None => out.push(Diagnostic::error(
                path,
                "Expected an array of integers, got string",
            )),
        },
        other => out.push(Diagnostic::error(
            path,
            format!("Expected an array of integers, got {}", json_type_name(other)),
        )),
    }
}
