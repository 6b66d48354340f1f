/// Semantic field classifiers: one declarative table mapping field
/// name/description heuristics to the extra constraints certain EMD fields
/// carry beyond their declared schema node. Both the validator and the
/// extractor consult this table, keeping the two directions consistent.
use crate::ast::SchemaNode;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// `passenger_id`: an array of positive integers regardless of the
    /// declared node shape; a bracketed string form is accepted as input.
    PassengerIds,
    /// Currency amounts, normalized/checked against 2-decimal rounding.
    Monetary,
    /// Positive-integer identifiers.
    Identifier,
    /// Three-letter IATA location codes (departure/arrival).
    LocationCode,
    /// Two-letter IATA carrier codes.
    CarrierCode,
}

type Predicate = fn(&str, &SchemaNode) -> bool;

/// Ordered rule table; the first matching rule wins, so the passenger rule
/// shadows the broader identifier heuristic.
const RULES: &[(FieldClass, Predicate)] = &[
    (FieldClass::PassengerIds, is_passenger_ids),
    (FieldClass::Monetary, is_monetary),
    (FieldClass::Identifier, is_identifier),
    (FieldClass::LocationCode, is_location_code),
    (FieldClass::CarrierCode, is_carrier_code),
];

pub fn classify(key: &str, node: &SchemaNode) -> Option<FieldClass> {
    RULES
        .iter()
        .find(|(_, applies)| applies(key, node))
        .map(|(class, _)| *class)
}

/// Key-only monetary heuristic, for document walks where no schema node is
/// at hand (post-extraction rounding).
pub fn monetary_key(key: &str) -> bool {
    key.ends_with("_price") || key.contains("price") || key == "total_amount_paid_purchases"
}

fn description_mentions(node: &SchemaNode, needle: &str) -> bool {
    node.description
        .as_deref()
        .is_some_and(|d| d.contains(needle))
}

fn is_passenger_ids(key: &str, _node: &SchemaNode) -> bool {
    key == "passenger_id"
}

fn is_monetary(key: &str, node: &SchemaNode) -> bool {
    monetary_key(key) || description_mentions(node, "price")
}

fn is_identifier(key: &str, node: &SchemaNode) -> bool {
    key == "id" || key.ends_with("_id") || description_mentions(node, "id")
}

fn is_location_code(key: &str, node: &SchemaNode) -> bool {
    (key == "departure" || key == "arrival")
        && node.min_length == Some(3)
        && node.max_length == Some(3)
}

fn is_carrier_code(key: &str, node: &SchemaNode) -> bool {
    key == "carrier" && node.min_length == Some(2) && node.max_length == Some(2)
}

fn location_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("valid literal regex"))
}

fn carrier_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}$").expect("valid literal regex"))
}

pub fn is_valid_location_code(value: &str) -> bool {
    location_code_re().is_match(value)
}

pub fn is_valid_carrier_code(value: &str) -> bool {
    carrier_code_re().is_match(value)
}

/// Round a currency amount to 2 decimal places. Idempotent; values like
/// `3390.9999999999995` become `3391.0`. Currencies without decimals are
/// unaffected.
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse an integer list from either its bracketed JSON form (`[1,2,3]`) or
/// a comma-separated form (`1, 2, 3`). The bracketed form must parse
/// cleanly; the comma form skips elements that do not parse.
pub fn parse_integer_list(raw: &str) -> Option<Vec<i64>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) else {
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(item.as_i64()?);
        }
        return Some(out);
    }
    let out: Vec<i64> = trimmed
        .split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SchemaNode;

    fn node_with_description(text: &str) -> SchemaNode {
        SchemaNode {
            description: Some(text.to_string()),
            ..SchemaNode::default()
        }
    }

    #[test]
    fn test_passenger_rule_shadows_identifier() {
        let node = SchemaNode::default();
        assert_eq!(classify("passenger_id", &node), Some(FieldClass::PassengerIds));
        assert_eq!(classify("order_id", &node), Some(FieldClass::Identifier));
    }

    #[test]
    fn test_monetary_classification() {
        let node = SchemaNode::default();
        assert_eq!(classify("ticket_price", &node), Some(FieldClass::Monetary));
        assert_eq!(classify("price_per_night", &node), Some(FieldClass::Monetary));
        assert_eq!(
            classify("total_amount_paid_purchases", &node),
            Some(FieldClass::Monetary)
        );
        let described = node_with_description("Total price of the booking, in minor units");
        assert_eq!(classify("amount", &described), Some(FieldClass::Monetary));
        assert_eq!(classify("pnr", &node), None);
    }

    #[test]
    fn test_identifier_by_description() {
        let described = node_with_description("The id of the customer account");
        assert_eq!(classify("account", &described), Some(FieldClass::Identifier));
    }

    #[test]
    fn test_code_classes_require_exact_length_bounds() {
        let iata = SchemaNode {
            min_length: Some(3),
            max_length: Some(3),
            ..SchemaNode::default()
        };
        assert_eq!(classify("departure", &iata), Some(FieldClass::LocationCode));
        assert_eq!(classify("arrival", &iata), Some(FieldClass::LocationCode));
        // Without the exact bounds it is just an ordinary string field.
        assert_eq!(classify("departure", &SchemaNode::default()), None);

        let carrier = SchemaNode {
            min_length: Some(2),
            max_length: Some(2),
            ..SchemaNode::default()
        };
        assert_eq!(classify("carrier", &carrier), Some(FieldClass::CarrierCode));
    }

    #[test]
    fn test_code_patterns() {
        assert!(is_valid_location_code("JFK"));
        assert!(!is_valid_location_code("jfk"));
        assert!(!is_valid_location_code("JFKX"));
        assert!(is_valid_carrier_code("BA"));
        assert!(!is_valid_carrier_code("ba"));
    }

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(3390.9999999999995), 3391.0);
        assert_eq!(round_price(12.345), 12.35);
        assert_eq!(round_price(100.0), 100.0);
    }

    #[test]
    fn test_round_price_idempotent() {
        for v in [3390.9999999999995, 0.015, 99.994, 12345.678] {
            assert_eq!(round_price(round_price(v)), round_price(v));
        }
    }

    #[test]
    fn test_parse_integer_list_bracketed() {
        assert_eq!(parse_integer_list("[1,2,3]"), Some(vec![1, 2, 3]));
        assert_eq!(parse_integer_list(" [1, 2] "), Some(vec![1, 2]));
        assert_eq!(parse_integer_list("[1, 2.5]"), None);
        assert_eq!(parse_integer_list("[1, \"x\"]"), None);
    }

    #[test]
    fn test_parse_integer_list_comma_separated() {
        assert_eq!(parse_integer_list("1, 2, 3"), Some(vec![1, 2, 3]));
        // The comma form is lenient: unparseable elements are skipped.
        assert_eq!(parse_integer_list("1, x, 3"), Some(vec![1, 3]));
        assert_eq!(parse_integer_list("x"), None);
        assert_eq!(parse_integer_list(""), None);
    }
}
