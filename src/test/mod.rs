//! End-to-end tests which drive the router the way a browser (or an API
//! client) would.

use axum_test::TestServer;

use crate::{
    admin::login::hash_password,
    config::{Settings, create_app, make_pool, run_migrations},
    state::DbPool,
};

mod admin;

pub const ADMIN_PASSWORD: &str = "correct horse";

/// A server over a fresh in-memory database. The pool has exactly one
/// connection, so tests must not hold one across a request.
pub fn test_server() -> (TestServer, DbPool) {
    let pool = make_pool(":memory:").unwrap();
    run_migrations(&pool).unwrap();

    let settings = Settings {
        secret_key: Some("0".repeat(64)),
        admin_password_hash: Some(hash_password(ADMIN_PASSWORD).unwrap()),
        ..Settings::default()
    };

    let server = TestServer::new(create_app(pool.clone(), settings)).unwrap();
    (server, pool)
}

pub type Fields = Vec<(String, String)>;

fn pairs(items: &[(&str, &str)]) -> Fields {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn team_fields(team_name: &str) -> Fields {
    pairs(&[
        ("team[team_name]", team_name),
        ("team[competition_track]", "技术挑战赛"),
        ("team[project_name]", "智能助手"),
        ("team[costrict_uid]", "uid-001"),
    ])
}

pub fn member_fields(pos: usize, id: u32, captain: bool) -> Fields {
    let key = |field: &str| format!("members[{pos}][{field}]");
    let mut fields = vec![
        (key("id"), id.to_string()),
        (key("expanded"), "true".to_string()),
        (key("name"), format!("成员{id}")),
        (key("school"), "清华大学".to_string()),
        (key("department"), "计算机系".to_string()),
        (key("major_grade"), "软件工程 大二".to_string()),
        (key("phone"), "13800138000".to_string()),
        (key("email"), format!("m{id}@example.com")),
        (key("role"), "开发".to_string()),
    ];
    if captain {
        fields.push((key("is_captain"), "on".to_string()));
    }
    fields
}

/// Members with the given ids, the first of them the captain.
pub fn roster_fields(ids: &[u32]) -> Fields {
    let mut fields = ids
        .iter()
        .enumerate()
        .flat_map(|(pos, id)| member_fields(pos, *id, pos == 0))
        .collect::<Fields>();
    let next_id = ids.iter().max().map_or(0, |id| id + 1);
    fields.push(("next_id".to_string(), next_id.to_string()));
    fields
}

/// A form which passes every check, terms accepted.
pub fn complete_form(team_name: &str) -> Fields {
    let mut fields = team_fields(team_name);
    fields.extend(roster_fields(&[0, 1]));
    fields.push(("agree".to_string(), "on".to_string()));
    fields
}
