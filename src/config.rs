//! Process settings and construction of the application router.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use diesel::{
    SqliteConnection,
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError},
};
use diesel_migrations::MigrationHarness;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    MIGRATIONS, admin,
    registration::{api, form},
    site_config::get_config_api,
    state::{AppState, DbPool, tx_commit_layer},
};

pub const DEFAULT_CONFIG_FILE: &str = "teamreg.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_address: String,
    pub database_url: String,
    /// At least 64 bytes. Without one, sessions do not survive a restart.
    pub secret_key: Option<String>,
    /// Argon2 PHC string, see `teamreg hash-password`.
    pub admin_password_hash: Option<String>,
    pub log_level: String,
    pub static_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            database_url: "teamreg.db".to_string(),
            secret_key: None,
            admin_password_hash: None,
            log_level: "info".to_string(),
            static_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Pool(PoolError),
    Migrations(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Read(path, e) => {
                write!(f, "could not read {}: {e}", path.display())
            }
            SettingsError::Parse(path, e) => {
                write!(f, "invalid settings in {}: {e}", path.display())
            }
            SettingsError::Pool(e) => {
                write!(f, "could not open the database: {e}")
            }
            SettingsError::Migrations(e) => {
                write!(f, "could not run migrations: {e}")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl Settings {
    /// Reads the settings from `path` (or `teamreg.toml`, if it exists) and
    /// applies the environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE))
                .filter(|p| p.exists()),
        };

        let mut settings = match path {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| SettingsError::Read(path.clone(), e))?;
                toml::from_str::<Settings>(&text)
                    .map_err(|e| SettingsError::Parse(path, e))?
            }
            None => Settings::default(),
        };

        settings.apply_overrides(|name| std::env::var(name).ok());
        Ok(settings)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = var("BIND_ADDRESS") {
            self.bind_address = v;
        }
        if let Some(v) = var("SECRET_KEY") {
            self.secret_key = Some(v);
        }
        if let Some(v) = var("ADMIN_PASSWORD_HASH") {
            self.admin_password_hash = Some(v);
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = var("STATIC_DIR") {
            self.static_dir = Some(PathBuf::from(v));
        }
    }

    pub fn cookie_key(&self) -> Key {
        match &self.secret_key {
            Some(secret) if secret.len() >= 64 => Key::from(secret.as_bytes()),
            Some(_) => {
                tracing::warn!(
                    "SECRET_KEY is shorter than 64 bytes, generating a key"
                );
                Key::generate()
            }
            None => Key::generate(),
        }
    }
}

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for SqlitePragmas
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// An in-memory database only exists as long as its one connection, so
/// that connection is never recycled.
pub fn make_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let in_memory = database_url == ":memory:";

    let builder = Pool::builder()
        .max_size(if in_memory { 1 } else { 10 })
        .connection_customizer(Box::new(SqlitePragmas));
    let builder = if in_memory {
        builder.idle_timeout(None).max_lifetime(None)
    } else {
        builder.connection_timeout(Duration::from_secs(10))
    };

    builder.build(ConnectionManager::<SqliteConnection>::new(database_url))
}

pub fn run_migrations(pool: &DbPool) -> Result<(), SettingsError> {
    let mut conn = pool.get().map_err(SettingsError::Pool)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| SettingsError::Migrations(e.to_string()))?;
    for migration in applied {
        tracing::info!("applied migration {migration}");
    }
    Ok(())
}

pub fn create_app(pool: DbPool, settings: Settings) -> Router {
    let state = AppState {
        pool,
        key: settings.cookie_key(),
        settings: Arc::new(settings),
    };

    let router = Router::new()
        .route("/", get(form::home))
        .route("/register", get(form::register_page))
        .route("/register/validate", post(form::validate))
        .route("/register/members/add", post(form::add_member))
        .route("/register/members/:id/remove", post(form::remove_member))
        .route("/register/members/:id/toggle", post(form::toggle_member))
        .route("/register/members/:id/captain", post(form::set_captain))
        .route("/register/advisor/add", post(form::add_advisor))
        .route("/register/advisor/remove", post(form::remove_advisor))
        .route("/register/advisor/toggle", post(form::toggle_advisor))
        .route("/register/submit", post(form::submit))
        .route("/api/team/submit", post(api::submit_team))
        .route("/api/teams", get(api::list_teams))
        .route("/api/team/:id", get(api::get_team))
        .route("/api/config", get(get_config_api))
        .route(
            "/admin/login",
            get(admin::login::login_page).post(admin::login::do_login),
        )
        .route("/admin/logout", post(admin::login::do_logout))
        .route("/admin", get(admin::index))
        .route("/admin/teams", get(admin::teams::team_list))
        .route("/admin/teams.csv", get(admin::export::teams_csv))
        .route("/admin/teams/:id", get(admin::teams::team_detail))
        .route("/admin/members", get(admin::teams::member_list))
        .route("/admin/members.csv", get(admin::export::members_csv))
        .route(
            "/admin/config",
            get(admin::config::config_page).post(admin::config::do_set_config),
        );

    let router = match &state.settings.static_dir {
        Some(dir) => router.nest_service("/static", ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(tx_commit_layer)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn environment_overrides_file() {
        let mut settings: Settings = toml::from_str(
            r#"
            database_url = "file.db"
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:5000");

        let env = HashMap::from([
            ("DATABASE_URL", ":memory:"),
            ("ADMIN_PASSWORD_HASH", "$argon2id$stub"),
        ]);
        settings.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.database_url, ":memory:");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(
            settings.admin_password_hash.as_deref(),
            Some("$argon2id$stub")
        );
        assert_eq!(settings.secret_key, None);
    }

    #[test]
    fn mistyped_value_is_an_error() {
        let err = toml::from_str::<Settings>("bind_address = 5").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
