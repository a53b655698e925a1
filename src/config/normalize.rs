//! Attribute name normalization
//!
//! Pipeline configurations accept both `kebab-case` and `camelCase` attribute names.
//! Everything downstream reads camelCase, so names are converted once after parsing.

use serde_json::{Map, Value};

/// Keys whose children are identifiers or free-form options and must keep their spelling
const VERBATIM_CHILD_KEYS: [&str; 6] = [
    "connections",
    "dataObjects",
    "actions",
    "options",
    "runtimeOptions",
    "sparkOptions",
];

/// Recursively convert kebab-case object keys to camelCase
///
/// Direct children of identifier maps (see [`VERBATIM_CHILD_KEYS`]) keep their names.
/// Only `null` attribute values are dropped: `false`, `0` and empty objects are kept.
/// Child objects are checked against the converted parent key, so `data-objects`
/// keeps its identifiers just like `dataObjects`.
pub fn normalize_keys(value: Value) -> Value {
    normalize_value(value, None)
}

fn normalize_value(value: Value, parent_key: Option<&str>) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_object(map, parent_key)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize_value(item, parent_key))
                .collect(),
        ),
        other => other,
    }
}

fn normalize_object(map: Map<String, Value>, parent_key: Option<&str>) -> Map<String, Value> {
    let keep_names = parent_key.is_some_and(|key| VERBATIM_CHILD_KEYS.contains(&key));
    let mut normalized = Map::with_capacity(map.len());

    for (key, value) in map {
        if value.is_null() {
            continue;
        }
        let key = if keep_names { key } else { kebab_to_camel_case(&key) };
        let value = normalize_value(value, Some(&key));
        normalized.insert(key, value);
    }

    normalized
}

/// Convert `output-ids` to `outputIds`
pub fn kebab_to_camel_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c == '-' {
            match chars.next() {
                Some(next) => result.extend(next.to_uppercase()),
                None => result.push('-'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kebab_to_camel_case() {
        assert_eq!(kebab_to_camel_case("output-ids"), "outputIds");
        assert_eq!(kebab_to_camel_case("class-name"), "className");
        assert_eq!(kebab_to_camel_case("alreadyCamel"), "alreadyCamel");
        assert_eq!(kebab_to_camel_case("trailing-"), "trailing-");
    }

    #[test]
    fn test_identifiers_keep_their_spelling() {
        let normalized = normalize_keys(json!({
            "dataObjects": {
                "stg-airports": {"path-prefix": "x", "spark-options": {"a-b": 1}}
            },
            "actions": {
                "hist-airports": {
                    "input-id": "stg-airports",
                    "transformer": {"class-name": "Foo", "options": {"keep-me": true}}
                }
            }
        }));

        let data_object = &normalized["dataObjects"]["stg-airports"];
        assert_eq!(data_object["pathPrefix"], json!("x"));
        assert_eq!(data_object["sparkOptions"], json!({"a-b": 1}));

        let action = &normalized["actions"]["hist-airports"];
        assert_eq!(action["inputId"], json!("stg-airports"));
        assert_eq!(action["transformer"]["className"], json!("Foo"));
        assert_eq!(action["transformer"]["options"], json!({"keep-me": true}));
    }

    #[test]
    fn test_null_values_are_dropped() {
        let normalized = normalize_keys(json!({
            "global": {"some-flag": null, "enabled": false, "retries": 0}
        }));
        assert_eq!(normalized["global"], json!({"enabled": false, "retries": 0}));
    }

    #[test]
    fn test_converted_parent_key_guards_identifiers() {
        let normalized = normalize_keys(json!({
            "data-objects": {"stg-airports": {"path-prefix": "x", "metadata": {}}}
        }));
        assert_eq!(
            normalized,
            json!({"dataObjects": {"stg-airports": {"pathPrefix": "x", "metadata": {}}}})
        );
    }

    #[test]
    fn test_arrays_are_normalized_elementwise() {
        let normalized = normalize_keys(json!({
            "global": {"hooks": [{"hook-class": "A"}, "plain"]}
        }));
        assert_eq!(
            normalized["global"]["hooks"],
            json!([{"hookClass": "A"}, "plain"])
        );
    }
}
