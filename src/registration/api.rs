//! JSON endpoints under `/api`.

use axum::{
    Json,
    extract::{Path, rejection::JsonRejection},
};
use diesel::{connection::LoadConnection, sqlite::Sqlite};
use serde::Serialize;

use crate::{
    registration::{
        TeamRecord,
        payload::{SUCCESS_MESSAGE, SubmitError, SubmitPayload},
        store::{fetch_team, read_teams, save_team},
    },
    state::Conn,
    util_resp::{ApiFailure, ApiResponse},
};

#[derive(Debug)]
pub enum RegisterError {
    Rejected(SubmitError),
    Storage(diesel::result::Error),
}

impl From<diesel::result::Error> for RegisterError {
    fn from(e: diesel::result::Error) -> Self {
        RegisterError::Storage(e)
    }
}

impl From<RegisterError> for ApiFailure {
    fn from(e: RegisterError) -> Self {
        match e {
            RegisterError::Rejected(e) => ApiFailure::bad_request(e.0),
            RegisterError::Storage(e) => ApiFailure::from(e),
        }
    }
}

/// Accepts and stores a registration. Both the JSON API and the htmx form
/// submit through here.
pub fn register(
    payload: SubmitPayload,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<String, RegisterError> {
    let accepted = payload.accept().map_err(|e| {
        tracing::info!("registration rejected: {e}");
        RegisterError::Rejected(e)
    })?;
    Ok(save_team(&accepted, conn)?)
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
    pub team_id: String,
}

#[tracing::instrument(skip(conn, body))]
pub async fn submit_team(
    mut conn: Conn<true>,
    body: Result<Json<SubmitPayload>, JsonRejection>,
) -> ApiResponse<SubmitResponse> {
    let Json(payload) = body.map_err(|e| {
        tracing::warn!("unparsable submission: {e}");
        ApiFailure::bad_request("请求数据格式不正确")
    })?;

    let team_id = register(payload, &mut *conn)?;

    Ok(Json(SubmitResponse {
        success: true,
        message: SUCCESS_MESSAGE,
        team_id,
    }))
}

#[derive(Serialize)]
pub struct TeamList {
    pub success: bool,
    pub data: Vec<TeamRecord>,
    pub count: usize,
}

pub async fn list_teams(mut conn: Conn<false>) -> ApiResponse<TeamList> {
    let data = read_teams(&mut *conn)?;
    Ok(Json(TeamList {
        success: true,
        count: data.len(),
        data,
    }))
}

#[derive(Serialize)]
pub struct TeamDetail {
    pub success: bool,
    pub data: TeamRecord,
}

pub async fn get_team(
    Path(team_id): Path<String>,
    mut conn: Conn<false>,
) -> ApiResponse<TeamDetail> {
    match fetch_team(&team_id, &mut *conn)? {
        Some(data) => Ok(Json(TeamDetail {
            success: true,
            data,
        })),
        None => Err(ApiFailure::not_found("团队不存在")),
    }
}
