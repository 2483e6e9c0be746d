use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{Form, State},
    response::Redirect,
};
use axum_extra::extract::PrivateCookieJar;
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    admin::{Admin, clear_login_cookie, set_login_cookie},
    config::Settings,
    template::Page,
    util_resp::{FailureResponse, StandardResponse, see_other_ok, success},
    widgets::alert::ErrorAlert,
};

pub fn hash_password(
    password: &str,
) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("admin_password_hash is not a valid hash: {e}");
            false
        }
    }
}

fn login_form(error: Option<&str>) -> hypertext::Rendered<String> {
    Page::new()
        .title("管理员登录")
        .body(maud! {
            div class="card login" {
                h1 { "管理员登录" }
                @if let Some(error) = error {
                    ErrorAlert msg=(error);
                }
                form method="post" action="/admin/login" {
                    div class="form-group" {
                        label for="password" { "密码" }
                        input
                            type="password"
                            class="form-control"
                            id="password"
                            name="password"
                            required
                            autofocus;
                    }
                    button type="submit" class="btn btn-primary" { "登录" }
                }
            }
        })
        .render()
}

pub async fn login_page(admin: Option<Admin>) -> StandardResponse {
    if admin.is_some() {
        return see_other_ok(Redirect::to("/admin/teams"));
    }
    success(login_form(None))
}

#[derive(Deserialize)]
pub struct LoginForm {
    password: String,
}

#[tracing::instrument(skip_all)]
pub async fn do_login(
    State(settings): State<Arc<Settings>>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(PrivateCookieJar, Redirect), FailureResponse> {
    let Some(hash) = settings.admin_password_hash.as_deref() else {
        tracing::warn!("admin login attempted but no password is configured");
        return Err(FailureResponse::BadRequest(login_form(Some(
            "尚未配置管理员密码。",
        ))));
    };

    if !verify_password(&form.password, hash) {
        tracing::info!("failed admin login");
        return Err(FailureResponse::BadRequest(login_form(Some(
            "密码错误，请重试。",
        ))));
    }

    tracing::info!("admin logged in");
    Ok((set_login_cookie(jar)?, Redirect::to("/admin/teams")))
}

pub async fn do_logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Redirect) {
    (clear_login_cookie(jar), Redirect::to("/admin/login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not a hash"));
    }
}
