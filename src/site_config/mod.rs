//! Runtime configuration stored in the `configs` table.
//!
//! Entries are plain key/value pairs with a declared type. The registration
//! page reads `DEADLINE` (a datetime) to show the deadline banner.

use std::{fmt, str::FromStr};

use axum::{Json, extract::Query};
use chrono::{NaiveDateTime, Utc};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    schema::configs,
    state::Conn,
    util_resp::{ApiFailure, ApiResponse},
};

pub const DEADLINE_KEY: &str = "DEADLINE";

const DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    Str,
    Int,
    Datetime,
}

impl ConfigType {
    pub const ALL: [ConfigType; 3] =
        [ConfigType::Str, ConfigType::Int, ConfigType::Datetime];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::Str => "str",
            ConfigType::Int => "int",
            ConfigType::Datetime => "datetime",
        }
    }

    /// Checks that `raw` is a value of this type.
    pub fn parse(&self, raw: &str) -> Result<ConfigValue, ConfigValueError> {
        let raw = raw.trim();
        match self {
            ConfigType::Str => Ok(ConfigValue::Str(raw.to_string())),
            ConfigType::Int => raw
                .parse::<i64>()
                .map(ConfigValue::Int)
                .map_err(|_| ConfigValueError::NotAnInteger(raw.to_string())),
            ConfigType::Datetime => parse_datetime(raw)
                .map(ConfigValue::Datetime)
                .ok_or_else(|| ConfigValueError::NotADatetime(raw.to_string())),
        }
    }
}

impl FromStr for ConfigType {
    type Err = ConfigValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigValueError::UnknownType(s.to_string()))
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Str(String),
    Int(i64),
    #[serde(serialize_with = "serialize_datetime")]
    Datetime(NaiveDateTime),
}

fn serialize_datetime<S: serde::Serializer>(
    dt: &NaiveDateTime,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.serialize_str(&dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValueError {
    UnknownType(String),
    NotAnInteger(String),
    NotADatetime(String),
    EmptyKey,
}

impl fmt::Display for ConfigValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValueError::UnknownType(t) => {
                write!(f, "未知的配置类型 `{t}`（可选 str、int、datetime）")
            }
            ConfigValueError::NotAnInteger(v) => {
                write!(f, "`{v}` 不是整数")
            }
            ConfigValueError::NotADatetime(v) => write!(
                f,
                "`{v}` 不是有效的时间（格式：YYYY-MM-DD HH:MM:SS）"
            ),
            ConfigValueError::EmptyKey => f.write_str("配置键不能为空"),
        }
    }
}

impl std::error::Error for ConfigValueError {}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct ConfigEntry {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
    pub config_key: String,
    pub config_value: Option<String>,
    pub config_type: String,
    pub description: Option<String>,
}

impl ConfigEntry {
    pub fn kind(&self) -> ConfigType {
        self.config_type.parse().unwrap_or(ConfigType::Str)
    }

    /// The stored value interpreted as its declared type. Values which do
    /// not parse (e.g. edited directly in the database) are returned as
    /// strings.
    pub fn value(&self) -> Option<ConfigValue> {
        let raw = self.config_value.as_deref()?;
        Some(
            self.kind()
                .parse(raw)
                .unwrap_or_else(|_| ConfigValue::Str(raw.to_string())),
        )
    }
}

pub fn get_config(
    key: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Option<ConfigEntry>, diesel::result::Error> {
    configs::table
        .filter(configs::config_key.eq(key))
        .first::<ConfigEntry>(conn)
        .optional()
}

pub fn list_configs(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Vec<ConfigEntry>, diesel::result::Error> {
    configs::table
        .order_by(configs::config_key.asc())
        .load::<ConfigEntry>(conn)
}

#[derive(Debug)]
pub enum SetConfigError {
    Invalid(ConfigValueError),
    Db(diesel::result::Error),
}

impl fmt::Display for SetConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetConfigError::Invalid(e) => write!(f, "{e}"),
            SetConfigError::Db(e) => write!(f, "database error: {e}"),
        }
    }
}

impl std::error::Error for SetConfigError {}

impl From<diesel::result::Error> for SetConfigError {
    fn from(e: diesel::result::Error) -> Self {
        SetConfigError::Db(e)
    }
}

/// Inserts or updates the entry `key`. An empty `value` clears the value
/// but keeps the entry.
#[tracing::instrument(skip(conn))]
pub fn set_config(
    key: &str,
    value: &str,
    kind: ConfigType,
    description: Option<&str>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), SetConfigError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(SetConfigError::Invalid(ConfigValueError::EmptyKey));
    }

    let value = value.trim();
    let value = if value.is_empty() {
        None
    } else {
        kind.parse(value).map_err(SetConfigError::Invalid)?;
        Some(value)
    };
    let description = description.map(str::trim).filter(|d| !d.is_empty());
    let now = Utc::now().naive_utc();

    let n = match get_config(key, conn)? {
        Some(existing) => diesel::update(
            configs::table.filter(configs::id.eq(existing.id)),
        )
        .set((
            configs::updated_at.eq(now),
            configs::config_value.eq(value),
            configs::config_type.eq(kind.as_str()),
            configs::description.eq(description),
        ))
        .execute(conn)?,
        None => diesel::insert_into(configs::table)
            .values((
                configs::id.eq(Uuid::now_v7().to_string()),
                configs::created_at.eq(now),
                configs::updated_at.eq(now),
                configs::config_key.eq(key),
                configs::config_value.eq(value),
                configs::config_type.eq(kind.as_str()),
                configs::description.eq(description),
            ))
            .execute(conn)?,
    };
    tracing::info!("set config {key} ({n} row)");

    Ok(())
}

/// The registration deadline, if one is configured and valid.
pub fn deadline(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Option<NaiveDateTime>, diesel::result::Error> {
    let entry = get_config(DEADLINE_KEY, conn)?;
    Ok(match entry.and_then(|e| e.value()) {
        Some(ConfigValue::Datetime(dt)) => Some(dt),
        Some(other) => {
            tracing::warn!("{DEADLINE_KEY} is not a datetime: {other:?}");
            None
        }
        None => None,
    })
}

#[derive(Deserialize)]
pub struct ConfigQuery {
    pub config_key: Option<String>,
}

#[derive(Serialize)]
pub struct ConfigData {
    pub key: String,
    pub value: Option<ConfigValue>,
    #[serde(rename = "type")]
    pub kind: ConfigType,
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub success: bool,
    pub data: ConfigData,
}

pub async fn get_config_api(
    Query(query): Query<ConfigQuery>,
    mut conn: Conn<false>,
) -> ApiResponse<ConfigResponse> {
    let Some(key) = query.config_key.filter(|k| !k.trim().is_empty()) else {
        return Err(ApiFailure::bad_request("缺少参数 config_key"));
    };

    let entry = get_config(key.trim(), &mut *conn)?
        .ok_or_else(|| ApiFailure::not_found("配置项不存在"))?;

    Ok(Json(ConfigResponse {
        success: true,
        data: ConfigData {
            value: entry.value(),
            kind: entry.kind(),
            key: entry.config_key,
            description: entry.description,
        },
    }))
}

#[cfg(test)]
mod tests {
    use diesel::{Connection, SqliteConnection};
    use diesel_migrations::MigrationHarness;

    use super::*;
    use crate::MIGRATIONS;

    #[test]
    fn typed_values() {
        assert_eq!(ConfigType::Int.parse(" 42 "), Ok(ConfigValue::Int(42)));
        assert!(ConfigType::Int.parse("4.2").is_err());
        assert!(matches!(
            ConfigType::Datetime.parse("2025-10-31 23:59:59"),
            Ok(ConfigValue::Datetime(_))
        ));
        assert!(ConfigType::Datetime.parse("2025-10-31T23:59:59").is_ok());
        assert!(ConfigType::Datetime.parse("31/10/2025").is_err());
        assert_eq!("datetime".parse(), Ok(ConfigType::Datetime));
        assert!("float".parse::<ConfigType>().is_err());
    }

    #[test]
    fn values_serialize_naturally() {
        let dt = ConfigType::Datetime.parse("2025-10-31T23:59:00").unwrap();
        assert_eq!(
            serde_json::to_value(dt).unwrap(),
            serde_json::json!("2025-10-31 23:59:00")
        );
        assert_eq!(
            serde_json::to_value(ConfigValue::Int(5)).unwrap(),
            serde_json::json!(5)
        );
    }

    #[test]
    fn set_then_update() {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();

        assert_eq!(deadline(&mut conn).unwrap(), None);

        set_config(
            DEADLINE_KEY,
            "2025-10-31 23:59:59",
            ConfigType::Datetime,
            Some("报名截止时间"),
            &mut conn,
        )
        .unwrap();
        assert!(deadline(&mut conn).unwrap().is_some());

        assert!(matches!(
            set_config(DEADLINE_KEY, "soon", ConfigType::Datetime, None, &mut conn),
            Err(SetConfigError::Invalid(_))
        ));

        set_config("MAX_TEAMS", "100", ConfigType::Int, None, &mut conn)
            .unwrap();
        set_config("MAX_TEAMS", "120", ConfigType::Int, None, &mut conn)
            .unwrap();
        let entries = list_configs(&mut conn).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            get_config("MAX_TEAMS", &mut conn).unwrap().unwrap().value(),
            Some(ConfigValue::Int(120))
        );
    }
}
