//! Settings declarations.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s built once when a
//! settings type is defined. Links between fields are ordinary field
//! metadata, so any field can declare one and the linker discovers them by
//! walking [`Schema::links`].

use heck::ToShoutySnakeCase;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Declared semantic type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    /// JSON array; text sources must hold a JSON document.
    List,
    /// JSON object; merged key-by-key across sources.
    Object,
    /// Absolute URL, restricted to `schemes` when non-empty.
    Url { schemes: Vec<String> },
}

impl FieldKind {
    /// URL kind accepting only the given schemes.
    pub fn url<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldKind::Url {
            schemes: schemes.into_iter().map(Into::into).collect(),
        }
    }

    /// Coerce a raw source value to this kind.
    ///
    /// Text coming from environment variables or files is parsed; values
    /// passed at construction are checked as-is. `null` passes through and is
    /// judged later against the field's `optional` flag.
    pub fn coerce(&self, raw: Value) -> Result<Value, String> {
        if raw.is_null() {
            return Ok(raw);
        }
        match self {
            FieldKind::String => match raw {
                Value::String(_) => Ok(raw),
                other => Err(format!("expected a string, got {}", kind_name(&other))),
            },
            FieldKind::Integer => match raw {
                Value::Number(ref n) if n.is_i64() || n.is_u64() => Ok(raw),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| format!("'{}' is not an integer", s)),
                other => Err(format!("expected an integer, got {}", kind_name(&other))),
            },
            FieldKind::Float => match raw {
                Value::Number(_) => Ok(raw),
                Value::String(s) => {
                    let parsed = s
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| format!("'{}' is not a number", s))?;
                    serde_json::Number::from_f64(parsed)
                        .map(Value::Number)
                        .ok_or_else(|| format!("'{}' is not a finite number", s))
                }
                other => Err(format!("expected a number, got {}", kind_name(&other))),
            },
            FieldKind::Boolean => match raw {
                Value::Bool(_) => Ok(raw),
                Value::String(s) => parse_bool(&s)
                    .map(Value::Bool)
                    .ok_or_else(|| format!("'{}' is not a boolean", s)),
                other => Err(format!("expected a boolean, got {}", kind_name(&other))),
            },
            FieldKind::List => match raw {
                Value::Array(_) => Ok(raw),
                Value::String(s) => match serde_json::from_str::<Value>(&s) {
                    Ok(v @ Value::Array(_)) => Ok(v),
                    Ok(other) => Err(format!("expected a JSON array, got {}", kind_name(&other))),
                    Err(e) => Err(format!("invalid JSON list: {}", e)),
                },
                other => Err(format!("expected a list, got {}", kind_name(&other))),
            },
            FieldKind::Object => match raw {
                Value::Object(_) => Ok(raw),
                Value::String(s) => match serde_json::from_str::<Value>(&s) {
                    Ok(v @ Value::Object(_)) => Ok(v),
                    Ok(other) => Err(format!("expected a JSON object, got {}", kind_name(&other))),
                    Err(e) => Err(format!("invalid JSON object: {}", e)),
                },
                other => Err(format!("expected an object, got {}", kind_name(&other))),
            },
            FieldKind::Url { schemes } => match raw {
                Value::String(s) => parse_url(&s, schemes),
                other => Err(format!("expected a URL string, got {}", kind_name(&other))),
            },
        }
    }
}

fn parse_url(text: &str, schemes: &[String]) -> Result<Value, String> {
    let parsed = url::Url::parse(text.trim()).map_err(|e| format!("invalid URL: {}", e))?;
    if !schemes.is_empty() && !schemes.iter().any(|allowed| allowed == parsed.scheme()) {
        return Err(format!(
            "URL scheme '{}' is not one of: {}",
            parsed.scheme(),
            schemes.join(", ")
        ));
    }
    Ok(Value::String(parsed.to_string()))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// One declared field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Value used when no source supplies one.
    pub default: Option<Value>,
    /// Whether the field may resolve to `null`.
    pub optional: bool,
    /// Field whose value is copied in when this one resolves empty.
    pub refer_to: Option<String>,
    pub description: Option<String>,
    /// Masked when settings are printed.
    pub secret: bool,
}

impl FieldSpec {
    /// A required field of the given kind with no default.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            optional: false,
            refer_to: None,
            description: None,
            secret: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::List)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Object)
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    pub fn refer_to(mut self, field: impl Into<String>) -> Self {
        self.refer_to = Some(field.into());
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Lowercased name used for matching against sources.
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Environment variable that feeds this field, with an optional prefix.
    pub fn env_var(&self, prefix: &str) -> String {
        format!("{}{}", prefix.to_ascii_uppercase(), self.name.to_shouty_snake_case())
    }
}

/// Declare a field that copies `refer_to`'s value when it resolves empty.
///
/// The field is optional with no default; chain [`FieldSpec::default`],
/// [`FieldSpec::required`] or [`FieldSpec::describe`] for further
/// constraints. The default only applies when neither a source nor the link
/// produced a value.
///
/// The copied value was already coerced to the target's kind and is not
/// checked again against this field's kind, so declare both with the same
/// kind. A `Url` link restricted to fewer schemes than its target can end up
/// holding a URL outside its own list.
pub fn refer_to_field(
    name: impl Into<String>,
    kind: FieldKind,
    refer_to: impl Into<String>,
) -> FieldSpec {
    FieldSpec::new(name, kind).optional().refer_to(refer_to)
}

/// Ordered set of field declarations for one settings type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field. Declaration order is kept for display.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field case-insensitively.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Every declared link as `(field, refer_to)`.
    pub fn links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|f| f.refer_to.as_deref().map(|target| (f.name.as_str(), target)))
    }
}

/// A typed settings struct with a declared schema.
///
/// Implementors derive `Deserialize` with field names matching the schema's
/// lowercased field names.
pub trait Settings: DeserializeOwned {
    fn schema() -> Schema;
}
