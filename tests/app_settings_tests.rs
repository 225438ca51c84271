//! Integration tests for the application settings and the context built
//! from them.

use backend_settings::config::{EnvSnapshot, Origin, Settings, SettingsLoader};
use backend_settings::context::AppContext;
use backend_settings::error::SettingsError;
use backend_settings::settings::AppSettings;
use backend_settings::store::{KeyValueStore, RelationalStore};
use std::path::Path;
use tempfile::TempDir;

fn loader(temp: &TempDir, env: &[(&str, &str)]) -> SettingsLoader {
    SettingsLoader::new()
        .with_env(env.iter().copied().collect::<EnvSnapshot>())
        .default_file(temp.path().join(".env"))
}

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

#[test]
fn test_secret_key_from_secrets_dir() {
    let temp = TempDir::new().unwrap();
    let secrets = temp.path().join("secrets");
    std::fs::create_dir(&secrets).unwrap();
    std::fs::write(secrets.join("secret_key"), "from-secrets\n").unwrap();
    std::fs::write(temp.path().join(".env"), "DATABASE_URL=sqlite::memory:\n").unwrap();

    let resolved = loader(&temp, &[])
        .secrets_dir(&secrets)
        .resolve(&AppSettings::schema())
        .unwrap();
    assert_eq!(resolved.get_str("secret_key"), Some("from-secrets"));
    assert_eq!(resolved.origin("secret_key"), Some(&Origin::Secrets(secrets)));

    let redacted = resolved.to_redacted_value();
    assert_eq!(redacted["secret_key"], "**********");
    assert_eq!(redacted["database_url"], "sqlite::memory:");
}

#[test]
fn test_cascading_files_for_app_settings() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().join("base.env");
    let local = temp.path().join("local.env");
    std::fs::write(
        &base,
        "PROJECT_NAME=\"Base\"\nDATABASE_URL=sqlite:///srv/app.db\nSECRET_KEY=base\n",
    )
    .unwrap();
    std::fs::write(&local, "PROJECT_NAME=\"Local\"\nDEBUG=true\n").unwrap();

    let files = format!("{},{}", base.display(), local.display());
    let settings: AppSettings = loader(&temp, &[("CONFIG_FILES", files.as_str())])
        .load()
        .unwrap();

    assert_eq!(settings.project_name, "Local");
    assert!(settings.debug);
    assert_eq!(settings.secret_key, "base");
    assert_eq!(settings.test_database_url.as_deref(), Some("sqlite:///srv/app.db"));
}

#[test]
fn test_explicit_test_database_url_wins() {
    let temp = TempDir::new().unwrap();
    let env = [
        ("SECRET_KEY", "k"),
        ("DATABASE_URL", "sqlite:///srv/app.db"),
        ("TEST_DATABASE_URL", "sqlite::memory:"),
    ];
    let settings: AppSettings = loader(&temp, &env).load().unwrap();
    assert_eq!(settings.test_database_url.as_deref(), Some("sqlite::memory:"));
}

#[test]
fn test_missing_database_url_names_variable() {
    let temp = TempDir::new().unwrap();
    let err = loader(&temp, &[("SECRET_KEY", "k")])
        .env_prefix("BACKEND_")
        .set("secret_key", "k")
        .load::<AppSettings>()
        .unwrap_err();
    match err {
        SettingsError::MissingField { field, env_var } => {
            assert_eq!(field, "database_url");
            assert_eq!(env_var, "BACKEND_DATABASE_URL");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_context_with_file_database() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("app.db");
    let db_url = sqlite_url(&db_path);
    let env = [
        ("SECRET_KEY", "k"),
        ("DATABASE_URL", db_url.as_str()),
        ("KV_URL", "memory://"),
        ("DEBUG", "yes"),
    ];
    let settings: AppSettings = loader(&temp, &env).load().unwrap();

    let ctx = AppContext::initialize(
        &settings,
        &["CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL);"],
    )
    .unwrap();
    assert!(ctx.ping_db());
    assert!(ctx.ping_kv());
    assert_eq!(
        ctx.db.execute("INSERT INTO notes (body) VALUES ('hello')").unwrap(),
        1
    );
    ctx.kv.set("greeting", "hello").unwrap();
    assert_eq!(ctx.kv.get("greeting").unwrap().as_deref(), Some("hello"));
    ctx.close().unwrap();

    assert!(db_path.exists());
}

#[test]
fn test_database_without_client_rejected_at_load() {
    let temp = TempDir::new().unwrap();
    let env = [
        ("SECRET_KEY", "k"),
        ("DATABASE_URL", "mysql://root@localhost:3306/app"),
    ];
    let err = loader(&temp, &env).load::<AppSettings>().unwrap_err();
    match err {
        SettingsError::InvalidValue { field, origin, reason } => {
            assert_eq!(field, "database_url");
            assert_eq!(origin, "environment");
            assert!(reason.contains("sqlite"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_context_from_minimal_settings() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("minimal.db");
    let db_url = sqlite_url(&db_path);
    let env = [("SECRET_KEY", "k"), ("DATABASE_URL", db_url.as_str())];
    let settings: AppSettings = loader(&temp, &env).load().unwrap();
    assert_eq!(settings.kv_url().unwrap().scheme(), "redis");

    let ctx = AppContext::initialize(&settings, &[]).unwrap();
    assert!(ctx.ping_kv());
    assert!(ctx.ping_db());
    ctx.close().unwrap();
}
