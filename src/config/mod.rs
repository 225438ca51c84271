//! Layered settings resolution.
//!
//! Values are looked up in priority order, first hit wins:
//! 1. **Explicit** - values passed to [`SettingsLoader::set`]
//! 2. **Environment** - process variables, case-insensitive, optional prefix
//! 3. **Cascading files** - dotenv files listed in `CONFIG_FILES`; the last
//!    listed file has the highest priority
//! 4. **Default file** - `.env` in the working directory
//! 5. **Secrets** - one file per field in a secrets directory
//!
//! After merging, fields declared with [`refer_to_field`] that are still empty
//! copy the value of the field they refer to. Missing or unreadable files are
//! skipped; malformed lines, dangling links, link cycles and missing required
//! fields fail construction.
//!
//! ## Environment Variables
//! - `CONFIG_FILES` - comma-separated dotenv files, base first, overrides last

mod chain;
mod linker;
mod loader;
mod merge;
mod resolved;
mod schema;
mod sources;

pub use chain::{CONFIG_FILES_VAR, ChainOptions, DEFAULT_ENV_FILE, SourceChain, parse_config_files};
pub use linker::{Resolved, link_fields, validate_links};
pub use loader::SettingsLoader;
pub use merge::{deep_merge, merge_by_priority};
pub use resolved::{REDACTED, ResolvedField, ResolvedSettings};
pub use schema::{FieldKind, FieldSpec, Schema, Settings, refer_to_field};
pub use sources::{
    DotEnvSource, EnvSnapshot, EnvSource, InitSource, Layer, Origin, SecretsDirSource, Source,
};
