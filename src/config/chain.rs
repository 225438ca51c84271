//! Source chain assembly.
//!
//! Sources are ordered highest priority first:
//! 1. Explicit values passed at construction
//! 2. Environment variables
//! 3. Files listed in `CONFIG_FILES` (last listed wins)
//! 4. The default `.env` file
//! 5. The secrets directory

use super::schema::Schema;
use super::sources::{
    DotEnvSource, EnvSnapshot, EnvSource, InitSource, Layer, Origin, SecretsDirSource, Source,
};
use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Variable holding the comma-separated cascading file list.
pub const CONFIG_FILES_VAR: &str = "CONFIG_FILES";

/// Conventional default dotenv file, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Inputs to [`SourceChain::build`].
#[derive(Debug, Clone)]
pub struct ChainOptions {
    pub init: BTreeMap<String, Value>,
    pub env: EnvSnapshot,
    pub env_prefix: String,
    pub config_files_var: String,
    pub default_file: Option<PathBuf>,
    pub secrets_dir: Option<PathBuf>,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            init: BTreeMap::new(),
            env: EnvSnapshot::default(),
            env_prefix: String::new(),
            config_files_var: CONFIG_FILES_VAR.to_string(),
            default_file: Some(PathBuf::from(DEFAULT_ENV_FILE)),
            secrets_dir: None,
        }
    }
}

/// Split a cascading-files value into paths, in listed order.
///
/// Entries are trimmed and empty entries dropped.
pub fn parse_config_files(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Priority-ordered list of sources; index 0 wins.
#[derive(Debug, Default)]
pub struct SourceChain {
    sources: Vec<Box<dyn Source>>,
}

impl SourceChain {
    /// Assemble the chain from loader options.
    pub fn build(options: &ChainOptions) -> Self {
        let prefix = options.env_prefix.as_str();
        let mut sources: Vec<Box<dyn Source>> = vec![
            Box::new(InitSource::new(options.init.clone())),
            Box::new(EnvSource::new(options.env.clone(), prefix)),
        ];

        if let Some(raw) = options.env.get(&options.config_files_var) {
            let files = parse_config_files(raw);
            debug!(var = %options.config_files_var, count = files.len(), "Cascading config files");
            // Listed order is base-first; reversed so the last listed file is consulted first.
            for path in files.into_iter().rev() {
                sources.push(Box::new(DotEnvSource::config_file(path, prefix)));
            }
        }

        if let Some(ref path) = options.default_file {
            sources.push(Box::new(DotEnvSource::default_file(path.clone(), prefix)));
        }

        if let Some(ref dir) = options.secrets_dir {
            sources.push(Box::new(SecretsDirSource::new(dir.clone(), prefix)));
        }

        Self { sources }
    }

    /// Push a source at the lowest priority.
    pub fn push(&mut self, source: Box<dyn Source>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[Box<dyn Source>] {
        &self.sources
    }

    pub fn origins(&self) -> Vec<Origin> {
        self.sources.iter().map(|s| s.origin()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Load every source, keeping priority order.
    pub fn load(&self, schema: &Schema) -> Result<Vec<Layer>> {
        self.sources.iter().map(|s| s.load(schema)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_with_env(pairs: &[(&str, &str)]) -> ChainOptions {
        ChainOptions {
            env: pairs.iter().copied().collect(),
            ..ChainOptions::default()
        }
    }

    #[test]
    fn test_parse_config_files_trims_and_skips_empty() {
        let files = parse_config_files(" base.env , ,prod.env,");
        assert_eq!(files, vec![PathBuf::from("base.env"), PathBuf::from("prod.env")]);
    }

    #[test]
    fn test_chain_without_config_files() {
        let chain = SourceChain::build(&options_with_env(&[]));
        assert_eq!(
            chain.origins(),
            vec![
                Origin::Init,
                Origin::Environment,
                Origin::DefaultFile(PathBuf::from(".env")),
            ]
        );
    }

    #[test]
    fn test_empty_config_files_adds_nothing() {
        let chain = SourceChain::build(&options_with_env(&[("CONFIG_FILES", "")]));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_config_files_are_reversed() {
        let mut options = options_with_env(&[("CONFIG_FILES", "a.env,b.env,c.env")]);
        options.secrets_dir = Some(PathBuf::from("/run/secrets"));

        let chain = SourceChain::build(&options);
        assert_eq!(
            chain.origins(),
            vec![
                Origin::Init,
                Origin::Environment,
                Origin::ConfigFile(PathBuf::from("c.env")),
                Origin::ConfigFile(PathBuf::from("b.env")),
                Origin::ConfigFile(PathBuf::from("a.env")),
                Origin::DefaultFile(PathBuf::from(".env")),
                Origin::Secrets(PathBuf::from("/run/secrets")),
            ]
        );
    }

    #[test]
    fn test_custom_config_files_var() {
        let mut options = options_with_env(&[("CONFIG_FILES", "ignored.env"), ("APP_FILES", "x.env")]);
        options.config_files_var = "APP_FILES".to_string();
        options.default_file = None;

        let chain = SourceChain::build(&options);
        assert_eq!(
            chain.origins(),
            vec![
                Origin::Init,
                Origin::Environment,
                Origin::ConfigFile(PathBuf::from("x.env")),
            ]
        );
    }
}
