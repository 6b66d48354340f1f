/// Instance path construction: dotted keys, bracketed indices.
/// Paths are deterministic for a given (document, schema) pair, so every
/// diagnostic can be resolved by re-walking the same document.

/// Append a property key: `"" + "pnr"` is `pnr`, `"a" + "b"` is `a.b`.
pub fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Append an array index: `a.itinerary` + 2 is `a.itinerary[2]`.
pub fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// The field name a path ends in, with any trailing index stripped.
pub fn leaf_field_name(path: &str) -> &str {
    let tail = path.rsplit('.').next().unwrap_or(path);
    match tail.find('[') {
        Some(bracket) => &tail[..bracket],
        None => tail,
    }
}
