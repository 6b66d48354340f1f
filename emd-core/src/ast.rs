/// Typed model of the EMD JSON Schema subset. These are immutable values
/// produced once by the compiler and shared read-only by the validator and
/// the extractor for the rest of the session.
use regex::Regex;
use std::collections::BTreeMap;

/// The seven type keywords the EMD schema uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaType {
    pub fn parse(s: &str) -> Option<SchemaType> {
        match s {
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "array" => Some(SchemaType::Array),
            "object" => Some(SchemaType::Object),
            "null" => Some(SchemaType::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Null => "null",
        }
    }
}

/// Semantic string subtypes carried by the `format` keyword.
/// `date-time` fields always pair the format with an explicit pattern in the
/// EMD schema, so the format itself adds no independent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Date,
    Time,
    DateTime,
    Email,
    Uri,
}

impl Format {
    pub fn parse(s: &str) -> Option<Format> {
        match s {
            "date" => Some(Format::Date),
            "time" => Some(Format::Time),
            "date-time" => Some(Format::DateTime),
            "email" => Some(Format::Email),
            "uri" => Some(Format::Uri),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Date => "date",
            Format::Time => "time",
            Format::DateTime => "date-time",
            Format::Email => "email",
            Format::Uri => "uri",
        }
    }
}

/// A schema pattern, compiled once at schema-compile time.
/// Equality is by source text so node trees stay comparable in tests.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Pattern, regex::Error> {
        Ok(Pattern {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// One recursive unit of the schema: the constraints a single value position
/// must satisfy. A node with no `ty` carries no constraints of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    pub ty: Option<SchemaType>,
    pub properties: BTreeMap<String, SchemaNode>,
    pub items: Option<Box<SchemaNode>>,
    pub required: Vec<String>,
    pub enum_values: Vec<String>,
    pub pattern: Option<Pattern>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub format: Option<Format>,
    pub description: Option<String>,
    pub additional_properties: Option<bool>,
}

/// A compiled EMD schema: the root object whose properties enumerate the
/// known sections (air reservations, hotels, vouchers, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    pub root: SchemaNode,
}

impl CompiledSchema {
    /// The top-level sections in declared (key-sorted) order.
    pub fn sections(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.root.properties.iter()
    }
}
