//! Response envelope decoding.
//!
//! The store has answered with several shapes over time. Each known shape is a
//! variant of [`Envelope`] with its own normalization; anything else is
//! [`Envelope::Unrecognized`] and decodes to no items.

use serde_json::Value;

/// Keys under which a wrapped response may carry its record array, in lookup
/// order.
pub const WRAPPER_KEYS: [&str; 7] = [
    "data",
    "rows",
    "records",
    "results",
    "result",
    "annotations",
    "items",
];

/// A classified response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `[{...}, {...}]`
    Bare(Vec<Value>),
    /// `[[{...}, ...], [...]]`
    Nested(Vec<Value>),
    /// `{"data": [{...}]}` under one of [`WRAPPER_KEYS`].
    Wrapped {
        /// Wrapper key that matched.
        key: &'static str,
        /// Record values.
        items: Vec<Value>,
    },
    /// `{"data": [[{...}]]}`
    WrappedNested {
        /// Wrapper key that matched.
        key: &'static str,
        /// Inner arrays.
        items: Vec<Value>,
    },
    /// Any other shape, with a short description.
    Unrecognized(String),
}

impl Envelope {
    /// Classify a parsed body.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => classify_array(items),
            Value::Object(mut map) => {
                for key in WRAPPER_KEYS {
                    if !matches!(map.get(key), Some(Value::Array(_))) {
                        continue;
                    }
                    let Some(Value::Array(items)) = map.remove(key) else {
                        continue;
                    };
                    return match classify_array(items) {
                        Self::Nested(items) => Self::WrappedNested { key, items },
                        Self::Bare(items) => Self::Wrapped { key, items },
                        other => other,
                    };
                }
                let mut keys: Vec<_> = map.keys().cloned().collect();
                keys.truncate(5);
                Self::Unrecognized(format!("object with keys [{}]", keys.join(", ")))
            }
            Value::Null => Self::Unrecognized("null".to_string()),
            Value::Bool(_) => Self::Unrecognized("boolean".to_string()),
            Value::Number(_) => Self::Unrecognized("number".to_string()),
            Value::String(_) => Self::Unrecognized("string".to_string()),
        }
    }

    /// Flatten into record values; `None` for an unrecognized shape.
    pub fn into_items(self) -> Option<Vec<Value>> {
        match self {
            Self::Bare(items) | Self::Wrapped { items, .. } => Some(items),
            Self::Nested(items) | Self::WrappedNested { items, .. } => Some(flatten(items)),
            Self::Unrecognized(_) => None,
        }
    }

    /// Short name of the shape, for logging.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Bare(_) => "bare array",
            Self::Nested(_) => "nested array",
            Self::Wrapped { .. } => "wrapped array",
            Self::WrappedNested { .. } => "wrapped nested array",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

fn classify_array(items: Vec<Value>) -> Envelope {
    match items.first() {
        Some(Value::Array(_)) => Envelope::Nested(items),
        _ => Envelope::Bare(items),
    }
}

fn flatten(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .flat_map(|item| match item {
            Value::Array(inner) => inner,
            other => vec![other],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let envelope = Envelope::classify(json!([{"row_key": "Acme"}]));
        assert_eq!(envelope.shape(), "bare array");
        assert_eq!(envelope.into_items().unwrap().len(), 1);
    }

    #[test]
    fn test_doubly_nested_array() {
        let envelope = Envelope::classify(json!([[{"row_key": "Acme"}, {"row_key": "Beta"}]]));
        assert_eq!(envelope.shape(), "nested array");
        assert_eq!(envelope.into_items().unwrap().len(), 2);
    }

    #[test]
    fn test_wrapped_under_known_keys() {
        for key in WRAPPER_KEYS {
            let body = json!({ key: [{"row_key": "Acme"}], "status": "ok" });
            let envelope = Envelope::classify(body);
            assert_eq!(
                envelope,
                Envelope::Wrapped {
                    key,
                    items: vec![json!({"row_key": "Acme"})]
                }
            );
        }
    }

    #[test]
    fn test_wrapped_nested() {
        let envelope = Envelope::classify(json!({"rows": [[{"row_key": "Acme"}]]}));
        assert_eq!(envelope.shape(), "wrapped nested array");
        assert_eq!(envelope.into_items().unwrap(), vec![json!({"row_key": "Acme"})]);
    }

    #[test]
    fn test_empty_array_is_bare() {
        assert_eq!(Envelope::classify(json!([])), Envelope::Bare(vec![]));
    }

    #[test]
    fn test_unrecognized_shapes_yield_nothing() {
        for body in [json!({"error": "nope"}), json!("text"), json!(null), json!({"data": "x"})] {
            let envelope = Envelope::classify(body);
            assert!(matches!(envelope, Envelope::Unrecognized(_)));
            assert!(envelope.into_items().is_none());
        }
    }
}
