//! Value providers consulted by the loader.
//!
//! Each [`Source`] yields a [`Layer`]: raw values keyed by lowercased field
//! name. A key that is missing from the layer means "not provided"; an
//! explicit `null` passed at construction is a provided value.

use super::schema::Schema;
use crate::error::{Result, SettingsError};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Passed explicitly at construction
    Init,
    /// Process environment
    Environment,
    /// A file listed in the cascading-files variable
    ConfigFile(PathBuf),
    /// The default dotenv file
    DefaultFile(PathBuf),
    /// A file in the secrets directory
    Secrets(PathBuf),
    /// The field's declared default
    Default,
    /// Copied from another field by the linker
    Linked(String),
    /// Optional field nobody supplied
    Unset,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Init => write!(f, "explicit value"),
            Origin::Environment => write!(f, "environment"),
            Origin::ConfigFile(path) => write!(f, "config file {}", path.display()),
            Origin::DefaultFile(path) => write!(f, "default file {}", path.display()),
            Origin::Secrets(path) => write!(f, "secrets dir {}", path.display()),
            Origin::Default => write!(f, "declared default"),
            Origin::Linked(field) => write!(f, "linked from {}", field),
            Origin::Unset => write!(f, "unset"),
        }
    }
}

/// Raw values yielded by one source.
#[derive(Debug, Clone)]
pub struct Layer {
    pub origin: Origin,
    pub values: BTreeMap<String, Value>,
}

impl Layer {
    pub fn empty(origin: Origin) -> Self {
        Self {
            origin,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A provider of raw configuration values.
pub trait Source: fmt::Debug {
    /// Origin attached to every value this source yields.
    fn origin(&self) -> Origin;

    /// Read the values this source holds for `schema`'s fields.
    fn load(&self, schema: &Schema) -> Result<Layer>;
}

/// Map a variable name onto a declared field.
///
/// Names are compared case-insensitively against [`FieldSpec::env_var`], the
/// same name reported when a required field is missing.
///
/// [`FieldSpec::env_var`]: super::schema::FieldSpec::env_var
fn match_field(schema: &Schema, key: &str, prefix: &str) -> Option<String> {
    schema
        .fields()
        .iter()
        .find(|spec| spec.env_var(prefix).eq_ignore_ascii_case(key))
        .map(|spec| spec.key())
}

/// Point-in-time copy of the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment, skipping non-UTF-8 entries.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Values passed explicitly when the settings are constructed.
#[derive(Debug, Clone, Default)]
pub struct InitSource {
    values: BTreeMap<String, Value>,
}

impl InitSource {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

impl Source for InitSource {
    fn origin(&self) -> Origin {
        Origin::Init
    }

    fn load(&self, schema: &Schema) -> Result<Layer> {
        let mut layer = Layer::empty(self.origin());
        for (key, value) in &self.values {
            match schema.get(key) {
                Some(spec) => {
                    layer.values.insert(spec.key(), value.clone());
                }
                None => debug!(key = %key, "Ignoring explicit value for undeclared field"),
            }
        }
        Ok(layer)
    }
}

/// Environment variables, matched case-insensitively after the prefix.
#[derive(Debug, Clone)]
pub struct EnvSource {
    env: EnvSnapshot,
    prefix: String,
}

impl EnvSource {
    pub fn new(env: EnvSnapshot, prefix: impl Into<String>) -> Self {
        Self {
            env,
            prefix: prefix.into(),
        }
    }
}

impl Source for EnvSource {
    fn origin(&self) -> Origin {
        Origin::Environment
    }

    fn load(&self, schema: &Schema) -> Result<Layer> {
        let mut layer = Layer::empty(self.origin());
        for (key, value) in self.env.iter() {
            if let Some(field) = match_field(schema, key, &self.prefix) {
                layer.values.insert(field, Value::String(value.to_string()));
            }
        }
        Ok(layer)
    }
}

/// A dotenv-format file of `KEY=VALUE` lines.
///
/// A missing or unreadable file yields an empty layer. A malformed line is
/// an error.
///
/// `${VAR}` references in unquoted or double-quoted values are expanded by
/// `dotenvy`, which looks in the process environment first and then in
/// earlier lines of the same file. The loader's [`EnvSnapshot`] is not
/// consulted, so a file using references is not isolated from the process.
/// Single-quoted values are taken literally.
#[derive(Debug, Clone)]
pub struct DotEnvSource {
    path: PathBuf,
    prefix: String,
    is_default: bool,
}

impl DotEnvSource {
    /// A file named in the cascading-files variable.
    pub fn config_file(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prefix: prefix.into(),
            is_default: false,
        }
    }

    /// The conventional default file.
    pub fn default_file(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prefix: prefix.into(),
            is_default: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for DotEnvSource {
    fn origin(&self) -> Origin {
        if self.is_default {
            Origin::DefaultFile(self.path.clone())
        } else {
            Origin::ConfigFile(self.path.clone())
        }
    }

    fn load(&self, schema: &Schema) -> Result<Layer> {
        let mut layer = Layer::empty(self.origin());

        let entries = match dotenvy::from_path_iter(&self.path) {
            Ok(entries) => entries,
            Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Config file not found, skipping");
                return Ok(layer);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Config file unreadable, skipping");
                return Ok(layer);
            }
        };

        for entry in entries {
            let (key, value) = entry.map_err(|e| SettingsError::Parse {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
            if let Some(field) = match_field(schema, &key, &self.prefix) {
                layer.values.insert(field, Value::String(value));
            }
        }

        debug!(
            path = %self.path.display(),
            fields = layer.values.len(),
            "Loaded config file"
        );
        Ok(layer)
    }
}

/// One file per field inside a secrets directory; the file body is the value.
#[derive(Debug, Clone)]
pub struct SecretsDirSource {
    dir: PathBuf,
    prefix: String,
}

impl SecretsDirSource {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }
}

impl Source for SecretsDirSource {
    fn origin(&self) -> Origin {
        Origin::Secrets(self.dir.clone())
    }

    fn load(&self, schema: &Schema) -> Result<Layer> {
        let mut layer = Layer::empty(self.origin());

        if !self.dir.is_dir() {
            warn!(dir = %self.dir.display(), "Secrets directory does not exist, skipping");
            return Ok(layer);
        }

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Secrets directory unreadable, skipping");
                return Ok(layer);
            }
        };

        let files: HashMap<String, PathBuf> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                Some((name.to_ascii_lowercase(), entry.path()))
            })
            .collect();

        for (name, path) in &files {
            let Some(field) = match_field(schema, name, &self.prefix) else {
                continue;
            };
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    layer.values.insert(field, Value::String(content.trim().to_string()));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Secret file unreadable, skipping"),
            }
        }

        Ok(layer)
    }
}
