//! Schema-driven tooling for Klarna Extra Merchant Data (EMD) payloads.
//!
//! The EMD schema document (fetched once per session by the embedding host)
//! is compiled into a typed node tree, which then drives two directions of
//! work that stay algorithmically consistent with each other:
//!
//! - [`validate_document`] / [`validate_json`] walk a candidate document and
//!   collect path-qualified [`Diagnostic`]s; errors block validity,
//!   precision warnings never do;
//! - [`extract`] walks a rendered form's field values and assembles the
//!   nested document the schema describes, recording every field dropped
//!   during coercion.
//!
//! [`envelope`] holds the export transforms (double-encoded string form and
//! the payment-ready attachment), and [`example`] generates sample documents
//! from the schema's embedded description examples.

pub mod ast;
pub mod compiler;
pub mod envelope;
pub mod example;
pub mod extract;
pub mod formats;
pub mod paths;
pub mod semantics;
pub mod validate;

pub use ast::{CompiledSchema, Format, Pattern, SchemaNode, SchemaType};
pub use compiler::{compile, CompileError};
pub use envelope::{decode_embedded, double_encoded, payment_ready, DecodeError, EMD_CONTENT_TYPE};
pub use example::example_document;
pub use extract::{extract, DropReason, DroppedField, Extraction, FormData, ItemGroup};
pub use validate::{
    validate_document, validate_json, validate_value, Diagnostic, InputError, Report, Severity,
};
