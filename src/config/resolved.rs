//! The fully merged, link-backfilled settings handed to the application.

use super::schema::Schema;
use super::sources::Origin;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// One resolved field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub value: Value,
    pub origin: Origin,
    pub secret: bool,
}

/// Immutable result of settings construction, in declaration order.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    schema_name: String,
    fields: Vec<ResolvedField>,
}

impl ResolvedSettings {
    pub(crate) fn new(schema: &Schema, fields: Vec<ResolvedField>) -> Self {
        Self {
            schema_name: schema.name().to_string(),
            fields,
        }
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Case-insensitive field lookup.
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(|f| &f.value)
    }

    /// String value of a field, `None` when unset or not a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn origin(&self, name: &str) -> Option<&Origin> {
        self.field(name).map(|f| &f.origin)
    }

    /// Deserialize one field into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields.iter()
    }

    /// All values as a JSON object keyed by lowercased field name.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_ascii_lowercase(), f.value.clone()))
            .collect();
        Value::Object(map)
    }

    /// Same as [`to_value`](Self::to_value) with secret fields masked.
    pub fn to_redacted_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| {
                let value = if f.secret && !f.value.is_null() {
                    Value::String(REDACTED.to_string())
                } else {
                    f.value.clone()
                };
                (f.name.to_ascii_lowercase(), value)
            })
            .collect();
        Value::Object(map)
    }

    /// Build a typed settings struct from the resolved values.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

/// Placeholder printed instead of secret values.
pub const REDACTED: &str = "**********";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FieldSpec;
    use serde::Deserialize;
    use serde_json::json;

    fn sample() -> ResolvedSettings {
        let schema = Schema::new("sample")
            .field(FieldSpec::string("Name"))
            .field(FieldSpec::string("token").secret())
            .field(FieldSpec::integer("workers").optional());
        ResolvedSettings::new(
            &schema,
            vec![
                ResolvedField {
                    name: "Name".to_string(),
                    value: json!("api"),
                    origin: Origin::Init,
                    secret: false,
                },
                ResolvedField {
                    name: "token".to_string(),
                    value: json!("hunter2"),
                    origin: Origin::Environment,
                    secret: true,
                },
                ResolvedField {
                    name: "workers".to_string(),
                    value: Value::Null,
                    origin: Origin::Unset,
                    secret: false,
                },
            ],
        )
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let settings = sample();
        assert_eq!(settings.get_str("name"), Some("api"));
        assert_eq!(settings.origin("TOKEN"), Some(&Origin::Environment));
        assert!(settings.get("missing").is_none());
        assert_eq!(settings.schema_name(), "sample");
    }

    #[test]
    fn test_redaction_skips_null_and_public_fields() {
        let redacted = sample().to_redacted_value();
        assert_eq!(redacted, json!({"name": "api", "token": REDACTED, "workers": null}));
        assert_eq!(sample().to_value()["token"], "hunter2");
    }

    #[test]
    fn test_typed_extraction() {
        #[derive(Deserialize)]
        struct Typed {
            name: String,
            workers: Option<u32>,
        }
        let typed: Typed = sample().deserialize().unwrap();
        assert_eq!(typed.name, "api");
        assert_eq!(typed.workers, None);
        assert_eq!(sample().get_as::<Option<u32>>("workers").unwrap(), Some(None));
        assert!(sample().get_as::<u32>("name").is_err());
    }
}
