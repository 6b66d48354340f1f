/// Schema compiler: parses the EMD schema document (as fetched from
/// Klarna's API) into the typed node tree.
///
/// A node without a `type` keyword compiles to an unconstrained node rather
/// than an error, so the walk degrades gracefully on sparse schema entries.
/// Structurally malformed keyword values fail loudly here, once, instead of
/// surfacing mid-validation.
use crate::ast::{CompiledSchema, Format, Pattern, SchemaNode, SchemaType};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("schema must be a JSON object")]
    NotAnObject,
    #[error("'type' must be a string")]
    TypeNotString,
    #[error("unknown type keyword: '{0}'")]
    UnknownType(String),
    #[error("'properties' must be a JSON object")]
    PropertiesNotObject,
    #[error("'required' must be an array of strings")]
    InvalidRequired,
    #[error("'enum' must be a non-empty array of strings")]
    InvalidEnum,
    #[error("'pattern' must be a string")]
    PatternNotString,
    #[error("invalid 'pattern' regex '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("'{0}' must be a number")]
    BoundNotNumber(&'static str),
    #[error("'{0}' must be a non-negative integer")]
    CountNotInteger(&'static str),
}

/// Compile a schema document from a JSON value.
pub fn compile(schema: &Value) -> Result<CompiledSchema, CompileError> {
    Ok(CompiledSchema {
        root: compile_node(schema)?,
    })
}

fn compile_node(json: &Value) -> Result<SchemaNode, CompileError> {
    let obj = json.as_object().ok_or(CompileError::NotAnObject)?;
    let mut node = SchemaNode::default();

    if let Some(ty_val) = obj.get("type") {
        let ty_str = ty_val.as_str().ok_or(CompileError::TypeNotString)?;
        let ty = SchemaType::parse(ty_str)
            .ok_or_else(|| CompileError::UnknownType(ty_str.to_string()))?;
        node.ty = Some(ty);
    }

    if let Some(props_val) = obj.get("properties") {
        let props = props_val
            .as_object()
            .ok_or(CompileError::PropertiesNotObject)?;
        for (key, sub) in props {
            node.properties.insert(key.clone(), compile_node(sub)?);
        }
    }

    if let Some(items_val) = obj.get("items") {
        node.items = Some(Box::new(compile_node(items_val)?));
    }

    if let Some(req_val) = obj.get("required") {
        let arr = req_val.as_array().ok_or(CompileError::InvalidRequired)?;
        for entry in arr {
            let name = entry.as_str().ok_or(CompileError::InvalidRequired)?;
            node.required.push(name.to_string());
        }
    }

    if let Some(enum_val) = obj.get("enum") {
        let arr = enum_val.as_array().ok_or(CompileError::InvalidEnum)?;
        if arr.is_empty() {
            return Err(CompileError::InvalidEnum);
        }
        for entry in arr {
            let value = entry.as_str().ok_or(CompileError::InvalidEnum)?;
            node.enum_values.push(value.to_string());
        }
    }

    if let Some(pattern_val) = obj.get("pattern") {
        let source = pattern_val.as_str().ok_or(CompileError::PatternNotString)?;
        let pattern = Pattern::new(source).map_err(|e| CompileError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        })?;
        node.pattern = Some(pattern);
    }

    node.min_length = count_keyword(obj, "minLength")?;
    node.max_length = count_keyword(obj, "maxLength")?;
    node.min_items = count_keyword(obj, "minItems")?;
    node.max_items = count_keyword(obj, "maxItems")?;
    node.minimum = number_keyword(obj, "minimum")?;
    node.maximum = number_keyword(obj, "maximum")?;
    node.multiple_of = number_keyword(obj, "multipleOf")?;
    node.unique_items = obj
        .get("uniqueItems")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    // Unknown format strings are dropped rather than rejected.
    node.format = obj.get("format").and_then(Value::as_str).and_then(Format::parse);
    node.description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    node.additional_properties = obj.get("additionalProperties").and_then(Value::as_bool);

    Ok(node)
}

fn count_keyword(
    obj: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<u64>, CompileError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or(CompileError::CountNotInteger(key)),
    }
}

fn number_keyword(
    obj: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<f64>, CompileError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or(CompileError::BoundNotNumber(key)),
    }
}
