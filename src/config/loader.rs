//! Settings loader.
//!
//! Builds the source chain, merges values field by field (first source that
//! provides a value wins, objects deep-merge), runs the linker and checks
//! required fields. Everything happens synchronously inside [`SettingsLoader::resolve`];
//! callers never see a partially resolved instance.

use super::chain::{ChainOptions, SourceChain};
use super::linker::{Resolved, link_fields, validate_links};
use super::merge::merge_by_priority;
use super::resolved::{ResolvedField, ResolvedSettings};
use super::schema::{FieldKind, Schema, Settings};
use super::sources::{EnvSnapshot, Origin};
use crate::error::{Result, SettingsError};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::debug;

/// Builder for resolving a [`Schema`] against its sources.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    options: ChainOptions,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Loader reading the current process environment.
    pub fn new() -> Self {
        Self {
            options: ChainOptions {
                env: EnvSnapshot::capture(),
                ..ChainOptions::default()
            },
        }
    }

    /// Replace the environment snapshot (also used to find `CONFIG_FILES`).
    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.options.env = env;
        self
    }

    /// Explicit value with the highest priority. Keys match case-insensitively.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options
            .init
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Several explicit values at once.
    pub fn set_all<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in values {
            self = self.set(key, value);
        }
        self
    }

    /// Prefix expected on environment variables and file keys.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.env_prefix = prefix.into();
        self
    }

    /// Name of the variable listing cascading files (default `CONFIG_FILES`).
    pub fn config_files_var(mut self, name: impl Into<String>) -> Self {
        self.options.config_files_var = name.into();
        self
    }

    pub fn default_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.default_file = Some(path.into());
        self
    }

    pub fn without_default_file(mut self) -> Self {
        self.options.default_file = None;
        self
    }

    /// Directory holding one file per secret field.
    pub fn secrets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.secrets_dir = Some(dir.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.options.env_prefix
    }

    /// The source chain this loader will consult, highest priority first.
    pub fn chain(&self) -> SourceChain {
        SourceChain::build(&self.options)
    }

    /// Resolve `schema` into a settings instance.
    pub fn resolve(&self, schema: &Schema) -> Result<ResolvedSettings> {
        validate_schema(schema)?;
        validate_links(schema)?;

        let chain = self.chain();
        let layers = chain.load(schema)?;

        let mut supplied: HashMap<String, Resolved> = HashMap::new();
        for spec in schema.fields() {
            let key = spec.key();
            let mut candidates = layers
                .iter()
                .filter_map(|layer| layer.get(&key).map(|raw| (&layer.origin, raw)))
                .peekable();

            let Some((top_origin, _)) = candidates.peek().copied() else {
                continue;
            };
            let top_origin = top_origin.clone();

            let mut coerced = Vec::new();
            for (origin, raw) in candidates {
                match spec.kind.coerce(raw.clone()) {
                    Ok(value) => coerced.push(value),
                    Err(reason) if coerced.is_empty() => {
                        return Err(SettingsError::InvalidValue {
                            field: spec.name.clone(),
                            origin: origin.to_string(),
                            reason,
                        });
                    }
                    Err(reason) => {
                        debug!(field = %spec.name, origin = %origin, reason = %reason, "Ignoring shadowed invalid value");
                        break;
                    }
                }
                // Only object fields look past the winning source.
                if spec.kind != FieldKind::Object {
                    break;
                }
            }

            let value = merge_by_priority(coerced).unwrap_or(Value::Null);
            supplied.insert(key, Resolved::new(value, top_origin));
        }

        let mut linked = link_fields(schema, &supplied);

        let mut fields = Vec::with_capacity(schema.fields().len());
        for spec in schema.fields() {
            let field = match linked.remove(&spec.key()).flatten() {
                Some(r) if r.value.is_null() && !spec.optional => {
                    return Err(SettingsError::InvalidValue {
                        field: spec.name.clone(),
                        origin: r.origin.to_string(),
                        reason: "null is not allowed for a required field".to_string(),
                    });
                }
                Some(r) => ResolvedField {
                    name: spec.name.clone(),
                    value: r.value,
                    origin: r.origin,
                    secret: spec.secret,
                },
                None if spec.optional => ResolvedField {
                    name: spec.name.clone(),
                    value: Value::Null,
                    origin: Origin::Unset,
                    secret: spec.secret,
                },
                None => {
                    return Err(SettingsError::MissingField {
                        field: spec.name.clone(),
                        env_var: spec.env_var(self.prefix()),
                    });
                }
            };
            fields.push(field);
        }

        debug!(
            schema = %schema.name(),
            sources = chain.len(),
            fields = fields.len(),
            "Resolved settings"
        );
        Ok(ResolvedSettings::new(schema, fields))
    }

    /// Resolve `T`'s schema and build the typed struct.
    pub fn load<T: Settings>(&self) -> Result<T> {
        self.resolve(&T::schema())?.deserialize()
    }
}

fn validate_schema(schema: &Schema) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in schema.fields() {
        if !seen.insert(spec.key()) {
            return Err(SettingsError::DuplicateField {
                field: spec.name.clone(),
            });
        }
    }
    Ok(())
}
