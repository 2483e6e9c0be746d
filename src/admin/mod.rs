//! The administration area: registered teams and members, CSV exports and
//! the runtime configuration.
//!
//! There are no admin accounts. Logging in with the configured password
//! stores a [`LoginSession`] in a private (encrypted) cookie.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util_resp::{FailureResponse, StandardResponse, see_other_ok};

pub mod config;
pub mod export;
pub mod login;
pub mod teams;

pub const ADMIN_COOKIE: &str = "teamreg_admin";

const SESSION_HOURS: i64 = 12;

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginSession {
    expiry: NaiveDateTime,
}

/// Extractor which only succeeds for requests carrying a valid admin
/// session.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthorized => {
                Redirect::to("/admin/login").into_response()
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Admin
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar<Key> =
            PrivateCookieJar::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthError::Unauthorized)?;

        let Some(cookie) = jar.get(ADMIN_COOKIE) else {
            return Err(AuthError::Unauthorized);
        };

        match serde_json::from_str::<LoginSession>(cookie.value()) {
            Ok(session) if Utc::now().naive_utc() < session.expiry => Ok(Admin),
            _ => {
                tracing::debug!("expired or malformed admin session");
                Err(AuthError::Unauthorized)
            }
        }
    }
}

pub fn set_login_cookie(
    jar: PrivateCookieJar,
) -> Result<PrivateCookieJar, FailureResponse> {
    let session = LoginSession {
        expiry: Utc::now().naive_utc() + Duration::hours(SESSION_HOURS),
    };
    let value = serde_json::to_string(&session).map_err(|e| {
        tracing::error!("could not encode session: {e}");
        FailureResponse::ServerError(())
    })?;

    Ok(jar.add(
        Cookie::build((ADMIN_COOKIE, value))
            .path("/admin")
            .http_only(true)
            .same_site(SameSite::Lax),
    ))
}

pub fn clear_login_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build((ADMIN_COOKIE, "")).path("/admin"))
}

pub async fn index(_admin: Admin) -> StandardResponse {
    see_other_ok(Redirect::to("/admin/teams"))
}
