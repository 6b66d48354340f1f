use emd_core::{CompiledSchema, FormData};
use wasm_bindgen::prelude::*;

/// One session over a fetched EMD schema document. The JS host fetches the
/// schema once at startup and constructs the session from it; a failed
/// fetch or a malformed schema is fatal to the page, surfaced as a JsError
/// the host turns into its startup alert.
#[wasm_bindgen]
pub struct EmdSession {
    schema: CompiledSchema,
}

#[wasm_bindgen]
impl EmdSession {
    #[wasm_bindgen(constructor)]
    pub fn new(schema_json: &str) -> Result<EmdSession, JsError> {
        let schema_value: serde_json::Value = serde_json::from_str(schema_json)
            .map_err(|e| JsError::new(&format!("Invalid schema JSON: {e}")))?;
        let schema = emd_core::compile(&schema_value)
            .map_err(|e| JsError::new(&format!("Invalid EMD schema: {e}")))?;
        Ok(EmdSession { schema })
    }

    /// Validate a JSON document. Returns a JS array of error objects, each
    /// with `path`, `message` and `severity`. Returns an empty array `[]`
    /// when the document is valid with no warnings.
    pub fn validate(&self, document_json: &str) -> Result<JsValue, JsError> {
        let report = emd_core::validate_json(document_json, &self.schema)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let arr = js_sys::Array::new();
        for diagnostic in &report.diagnostics {
            let obj = js_sys::Object::new();
            js_sys::Reflect::set(&obj, &"path".into(), &diagnostic.path.as_str().into()).unwrap();
            js_sys::Reflect::set(&obj, &"message".into(), &diagnostic.message.as_str().into())
                .unwrap();
            js_sys::Reflect::set(
                &obj,
                &"severity".into(),
                &diagnostic.severity.as_str().into(),
            )
            .unwrap();
            arr.push(&obj);
        }
        Ok(arr.into())
    }

    /// True when the document parses and produces no error-severity
    /// diagnostics; precision warnings do not count against validity.
    pub fn is_valid(&self, document_json: &str) -> bool {
        emd_core::validate_json(document_json, &self.schema)
            .map(|report| report.is_valid())
            .unwrap_or(false)
    }

    /// Assemble a document from a form snapshot (the `FormData` wire format).
    /// Returns `{document, dropped}` where `document` is the pretty-printed
    /// JSON text and `dropped` lists the fields omitted during coercion.
    pub fn generate(&self, form_json: &str) -> Result<JsValue, JsError> {
        let form: FormData = serde_json::from_str(form_json)
            .map_err(|e| JsError::new(&format!("Invalid form snapshot: {e}")))?;
        let extraction = emd_core::extract(&form, &self.schema);

        let document = serde_json::to_string_pretty(&extraction.document)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let dropped = js_sys::Array::new();
        for field in &extraction.dropped {
            let obj = js_sys::Object::new();
            js_sys::Reflect::set(&obj, &"path".into(), &field.path.as_str().into()).unwrap();
            js_sys::Reflect::set(&obj, &"raw".into(), &field.raw.as_str().into()).unwrap();
            js_sys::Reflect::set(&obj, &"reason".into(), &field.reason.to_string().into())
                .unwrap();
            dropped.push(&obj);
        }

        let result = js_sys::Object::new();
        js_sys::Reflect::set(&result, &"document".into(), &document.into()).unwrap();
        js_sys::Reflect::set(&result, &"dropped".into(), &dropped.into()).unwrap();
        Ok(result.into())
    }

    /// The double-encoded string form of a document.
    pub fn serialize(&self, document_json: &str) -> Result<String, JsError> {
        let document = parse_document(document_json)?;
        Ok(emd_core::double_encoded(&document))
    }

    /// The payment-ready attachment envelope, pretty-printed.
    pub fn payment_ready(&self, document_json: &str) -> Result<String, JsError> {
        let document = parse_document(document_json)?;
        serde_json::to_string_pretty(&emd_core::payment_ready(&document))
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Recover pretty-printed JSON from a pasted serialized string.
    pub fn decode(&self, text: &str) -> Result<String, JsError> {
        let document = emd_core::decode_embedded(text)
            .map_err(|e| JsError::new(&e.to_string()))?;
        serde_json::to_string_pretty(&document).map_err(|e| JsError::new(&e.to_string()))
    }

    /// A pretty-printed example document with one item per section.
    pub fn example(&self) -> String {
        let document = emd_core::example_document(&self.schema);
        serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string())
    }
}

fn parse_document(document_json: &str) -> Result<serde_json::Value, JsError> {
    serde_json::from_str(document_json).map_err(|e| JsError::new(&format!("Invalid JSON: {e}")))
}
