//! Field-state tracker for record instances.
//!
//! # Responsibility
//! - Hold a record's field name → value pairs in assignment order.
//! - Decide which fields participate as explicit values in generated SQL.
//!
//! # Invariants
//! - A field name appears at most once; re-assignment overwrites in place.
//! - "Set" and "non-empty" are tracked separately, but SQL generation only
//!   sees fields that are both (see [`Fields::has_value`]).

use rusqlite::types::Value;
use serde_json::{Map, Number, Value as JsonValue};

/// Returns whether `value` counts as empty: SQL NULL or the empty string.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(text) => text.is_empty(),
        _ => false,
    }
}

/// Ordered field container backing every record instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `value` to `name`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Whether `name` has been assigned, regardless of its value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether `name` is set and its value is not empty.
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !is_empty_value(value))
    }

    /// Unsets `name`, returning its previous value.
    pub fn clear(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Bulk assign: every pair overwrites the field of the same name, later
    /// pairs win.
    pub fn dump<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in data {
            self.set(name, value);
        }
    }

    /// Snapshot restricted to `field_list`, in that order, keeping only
    /// fields that are set and non-empty.
    pub fn snapshot<S: AsRef<str>>(&self, field_list: &[S]) -> Fields {
        let entries = field_list
            .iter()
            .filter_map(|field| {
                let field = field.as_ref();
                self.get(field)
                    .filter(|value| !is_empty_value(value))
                    .map(|value| (field.to_string(), value.clone()))
            })
            .collect();
        Fields { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Builds a container from a JSON object.
    ///
    /// Booleans become `0`/`1`, nested arrays and objects are stored as their
    /// JSON text.
    pub fn from_json_object(object: &Map<String, JsonValue>) -> Self {
        object
            .iter()
            .map(|(name, value)| (name.clone(), json_to_value(value)))
            .collect()
    }

    /// Renders the container as a JSON object. Blobs become byte arrays.
    pub fn to_json(&self) -> JsonValue {
        let object = self
            .entries
            .iter()
            .map(|(name, value)| (name.clone(), value_to_json(value)))
            .collect::<Map<_, _>>();
        JsonValue::Object(object)
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        fields.dump(iter);
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(flag) => Value::Integer(i64::from(*flag)),
        JsonValue::Number(number) => match number.as_i64() {
            Some(integer) => Value::Integer(integer),
            None => number.as_f64().map_or(Value::Null, Value::Real),
        },
        JsonValue::String(text) => Value::Text(text.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => Value::Text(value.to_string()),
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(integer) => JsonValue::from(*integer),
        Value::Real(real) => Number::from_f64(*real).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(text) => JsonValue::String(text.clone()),
        Value::Blob(bytes) => JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::{is_empty_value, Fields};
    use rusqlite::types::Value;
    use serde_json::json;

    #[test]
    fn set_overwrites_in_place_and_keeps_order() {
        let mut fields = Fields::new();
        fields.set("name", "Ana".to_string());
        fields.set("email", "a@x.com".to_string());
        fields.set("name", "Bea".to_string());

        let names: Vec<_> = fields.names().collect();
        assert_eq!(names, vec!["name", "email"]);
        assert_eq!(fields.get("name"), Some(&Value::Text("Bea".to_string())));
    }

    #[test]
    fn set_and_non_empty_are_tracked_separately() {
        let mut fields = Fields::new();
        fields.set("email", String::new());
        fields.set("note", Value::Null);
        fields.set("age", 0_i64);

        assert!(fields.is_set("email"));
        assert!(!fields.has_value("email"));
        assert!(fields.is_set("note"));
        assert!(!fields.has_value("note"));
        assert!(fields.has_value("age"));
        assert!(!fields.is_set("missing"));
    }

    #[test]
    fn clear_unsets_field() {
        let mut fields: Fields = [("id", 7_i64)].into_iter().collect();
        assert_eq!(fields.clear("id"), Some(Value::Integer(7)));
        assert!(!fields.is_set("id"));
        assert_eq!(fields.clear("id"), None);
    }

    #[test]
    fn dump_later_keys_win() {
        let mut fields = Fields::new();
        fields.dump([("a", 1_i64), ("b", 2), ("a", 3)]);
        assert_eq!(fields.get("a"), Some(&Value::Integer(3)));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn snapshot_follows_field_list_order_and_drops_empty() {
        let mut fields = Fields::new();
        fields.set("email", "a@x.com".to_string());
        fields.set("extra", "ignored".to_string());
        fields.set("name", "Ana".to_string());
        fields.set("id", String::new());

        let snapshot = fields.snapshot(&["id", "name", "email"]);
        let names: Vec<_> = snapshot.names().collect();
        assert_eq!(names, vec!["name", "email"]);
    }

    #[test]
    fn empty_value_predicate() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&Value::Text(String::new())));
        assert!(!is_empty_value(&Value::Text("0".to_string())));
        assert!(!is_empty_value(&Value::Integer(0)));
        assert!(!is_empty_value(&Value::Blob(Vec::new())));
    }

    #[test]
    fn json_object_conversion() {
        let input = json!({
            "id": 3,
            "score": 1.5,
            "active": true,
            "name": "Ana",
            "tags": ["a", "b"],
            "deleted_at": null
        });
        let fields = Fields::from_json_object(input.as_object().unwrap());

        assert_eq!(fields.get("id"), Some(&Value::Integer(3)));
        assert_eq!(fields.get("score"), Some(&Value::Real(1.5)));
        assert_eq!(fields.get("active"), Some(&Value::Integer(1)));
        assert_eq!(fields.get("tags"), Some(&Value::Text(r#"["a","b"]"#.to_string())));
        assert_eq!(fields.get("deleted_at"), Some(&Value::Null));

        let output = fields.to_json();
        assert_eq!(output["name"], json!("Ana"));
        assert_eq!(output["id"], json!(3));
        assert_eq!(output["deleted_at"], json!(null));
    }
}
