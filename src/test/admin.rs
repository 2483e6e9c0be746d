use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use crate::{
    admin::ADMIN_COOKIE,
    registration::payload::tests::payload,
    test::{ADMIN_PASSWORD, test_server},
};

async fn login(server: &TestServer) -> axum_test::TestResponse {
    server
        .post("/admin/login")
        .form(&[("password", ADMIN_PASSWORD)])
        .await
}

#[tokio::test]
async fn pages_require_login() {
    let (server, _pool) = test_server();

    for path in [
        "/admin/teams",
        "/admin/members",
        "/admin/teams.csv",
        "/admin/config",
    ] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(response.header("location"), "/admin/login");
    }

    server.get("/admin/login").await.assert_status_ok();
}

#[tokio::test]
async fn wrong_password_is_refused() {
    let (server, _pool) = test_server();

    let response = server
        .post("/admin/login")
        .form(&[("password", "incorrect")])
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.text().contains("密码错误"));
    assert!(response.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn lists_and_exports() {
    let (server, _pool) = test_server();

    let mut body = payload("Orbit");
    body.members[1].tech_stack = "Rust, htmx".to_string();
    server
        .post("/api/team/submit")
        .json(&body)
        .await
        .assert_status_ok();
    server
        .post("/api/team/submit")
        .json(&payload("Nebula"))
        .await
        .assert_status_ok();

    let response = login(&server).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    let cookie = response.cookie(ADMIN_COOKIE);

    let html = server
        .get("/admin/teams")
        .add_cookie(cookie.clone())
        .await
        .text();
    assert!(html.contains("Orbit"));
    assert!(html.contains("Nebula"));

    let html = server
        .get("/admin/teams")
        .add_query_param("q", "Orb")
        .add_cookie(cookie.clone())
        .await
        .text();
    assert!(html.contains("Orbit"));
    assert!(!html.contains("Nebula"));

    let html = server
        .get("/admin/members")
        .add_query_param("q", "htmx")
        .add_cookie(cookie.clone())
        .await
        .text();
    assert!(html.contains("李四"));
    assert!(!html.contains("张三"));

    let teams = server.get("/api/teams").await.json::<Value>();
    let orbit_id = teams["data"][1]["id"].as_str().unwrap().to_string();
    let html = server
        .get(&format!("/admin/teams/{orbit_id}"))
        .add_cookie(cookie.clone())
        .await
        .text();
    assert!(html.contains("智能助手"));
    assert!(html.contains("李四"));

    let response = server
        .get("/admin/teams/missing")
        .add_cookie(cookie.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .get("/admin/teams.csv")
        .add_cookie(cookie.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/csv; charset=utf-8");
    let csv = response.text();
    assert!(csv.contains("团队名称"));
    assert!(csv.contains("Orbit"));
    assert_eq!(csv.lines().count(), 3);

    let csv = server
        .get("/admin/members.csv")
        .add_cookie(cookie)
        .await
        .text();
    assert!(csv.contains("\"Rust, htmx\""));
    assert_eq!(csv.lines().count(), 5);
}

#[tokio::test]
async fn config_can_be_edited() {
    let (server, _pool) = test_server();
    let cookie = login(&server).await.cookie(ADMIN_COOKIE);

    let response = server
        .post("/admin/config")
        .add_cookie(cookie.clone())
        .form(&[
            ("config_key", "DEADLINE"),
            ("config_value", "next week"),
            ("config_type", "datetime"),
            ("description", ""),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.text().contains("不是有效的时间"));

    let response = server
        .post("/admin/config")
        .add_cookie(cookie.clone())
        .form(&[
            ("config_key", "DEADLINE"),
            ("config_value", "2025-10-31 23:59:59"),
            ("config_type", "datetime"),
            ("description", "报名截止时间"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let html = server
        .get("/admin/config")
        .add_cookie(cookie)
        .await
        .text();
    assert!(html.contains("2025-10-31 23:59:59"));

    let json = server
        .get("/api/config")
        .add_query_param("config_key", "DEADLINE")
        .await
        .json::<Value>();
    assert_eq!(json["data"]["type"], "datetime");
}

#[tokio::test]
async fn logout_clears_session() {
    let (server, _pool) = test_server();
    let cookie = login(&server).await.cookie(ADMIN_COOKIE);

    let response = server.post("/admin/logout").add_cookie(cookie).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/admin/login");
}
