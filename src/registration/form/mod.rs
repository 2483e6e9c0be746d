//! The htmx-driven registration page.

use axum::{
    extract::{Path, Query},
    response::Redirect,
};
use chrono::Utc;
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    registration::{
        api::{RegisterError, register},
        draft::{QsForm, RegistrationDraft, RegistrationForm},
        fields::FieldId,
        roster::{EntryId, RosterError},
    },
    site_config::deadline,
    state::Conn,
    template::Page,
    util_resp::{
        FailureResponse, StandardResponse, SuccessResponse, see_other_ok,
        success,
    },
    validation::validate_field,
    widgets::toast::Toast,
};

pub mod views;

use views::{
    DeadlineBanner, ErrorSlot, FormView, NameDisplay, RosterView, SuccessPanel,
};

pub async fn home() -> StandardResponse {
    see_other_ok(Redirect::to("/register"))
}

pub async fn register_page(mut conn: Conn<false>) -> StandardResponse {
    let deadline = deadline(&mut *conn)?;
    let now = Utc::now().naive_utc();
    let draft = RegistrationDraft::new();

    success(
        Page::new()
            .body(maud! {
                div class="card intro" {
                    h1 { "团队报名" }
                    p {
                        "请填写团队基本信息、团队成员（1-5人）及可选的指导老师。"
                        "带 * 的为必填项。"
                    }
                }
                @if let Some(deadline) = deadline {
                    (DeadlineBanner { deadline, now })
                }
                div id="registration" {
                    (FormView { draft: &draft, report: None })
                }
                (SuccessPanel { id: "success-message", hidden: true })
            })
            .render(),
    )
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub field: String,
    pub mode: Option<String>,
}

/// Validates one field of the posted form and returns its error slot.
///
/// While typing (`mode=input`) an invalid value leaves the slot untouched,
/// so errors appear on blur and disappear as soon as the value is fixed.
#[tracing::instrument(skip(form))]
pub async fn validate(
    Query(query): Query<ValidateQuery>,
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let Ok(id) = query.field.parse::<FieldId>() else {
        tracing::debug!("unknown field {}", query.field);
        return Ok(SuccessResponse::NoContent);
    };

    let draft = RegistrationDraft::from(form);
    let value = draft.value_of(&id).unwrap_or_default();
    let result = validate_field(&id, value);

    if result.is_err() && query.mode.as_deref() == Some("input") {
        return Ok(SuccessResponse::NoContent);
    }

    let name_display = NameDisplay::member_dom_id(&id);

    success(
        maud! {
            (ErrorSlot { id: &id, error: result.err() })
            @if let Some(dom_id) = &name_display {
                (NameDisplay { dom_id: dom_id.clone(), name: value, out_of_band: true })
            }
        }
        .render(),
    )
}

/// Renders the roster after an operation; failed operations leave the
/// roster as it was and add a toast explaining why.
fn roster_response(
    draft: &RegistrationDraft,
    result: Result<(), RosterError>,
) -> StandardResponse {
    if let Err(e) = &result {
        tracing::debug!("roster operation rejected: {e}");
    }

    success(
        maud! {
            (RosterView { roster: &draft.roster, report: None })
            @if let Err(e) = &result {
                (Toast::error(e.title(), e.message()))
            }
        }
        .render(),
    )
}

pub async fn add_member(
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let mut draft = RegistrationDraft::from(form);
    let result = draft.roster.add_member().map(|_| ());
    roster_response(&draft, result)
}

pub async fn remove_member(
    Path(id): Path<u32>,
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let mut draft = RegistrationDraft::from(form);
    let result = draft.roster.remove_member(EntryId(id));
    roster_response(&draft, result)
}

pub async fn toggle_member(
    Path(id): Path<u32>,
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let mut draft = RegistrationDraft::from(form);
    let result = draft.roster.toggle_member(EntryId(id)).map(|_| ());
    roster_response(&draft, result)
}

/// The posted form already carries the new state of the clicked checkbox;
/// applying it clears every other captain.
pub async fn set_captain(
    Path(id): Path<u32>,
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let mut draft = RegistrationDraft::from(form);
    let id = EntryId(id);
    let result = match draft.roster.member(id).map(|m| m.is_captain) {
        Some(checked) => draft.roster.set_captain(id, checked),
        None => Err(RosterError::NotFound(id)),
    };
    roster_response(&draft, result)
}

pub async fn add_advisor(
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let mut draft = RegistrationDraft::from(form);
    let result = draft.roster.add_advisor();
    roster_response(&draft, result)
}

pub async fn remove_advisor(
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let mut draft = RegistrationDraft::from(form);
    draft.roster.remove_advisor();
    roster_response(&draft, Ok(()))
}

pub async fn toggle_advisor(
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let mut draft = RegistrationDraft::from(form);
    draft.roster.toggle_advisor();
    roster_response(&draft, Ok(()))
}

#[tracing::instrument(skip(conn, form))]
pub async fn submit(
    mut conn: Conn<true>,
    QsForm(form): QsForm<RegistrationForm>,
) -> StandardResponse {
    let draft = RegistrationDraft::from(form);

    if !draft.agreed {
        return success(
            maud! {
                (FormView { draft: &draft, report: None })
                (Toast::error("未同意条款", "请先勾选同意\"报名须知\"。"))
            }
            .render(),
        );
    }

    let report = draft.validate();
    if !report.is_valid() {
        tracing::debug!(
            "submission blocked with {} field errors",
            report.fields.len()
        );
        return success(
            maud! {
                (FormView { draft: &draft, report: Some(&report) })
                (Toast::error("验证失败", report.summary()))
            }
            .render(),
        );
    }

    match register(draft.to_payload(), &mut *conn) {
        Ok(team_id) => {
            tracing::info!("registration stored for team {team_id}");
            success(
                maud! {
                    (SuccessPanel { id: "success-panel", hidden: false })
                    (Toast::success("报名成功", "报名信息已提交"))
                }
                .render(),
            )
        }
        Err(RegisterError::Rejected(e)) => {
            let message = format!("提交失败：{e}");
            success(
                maud! {
                    (FormView { draft: &draft, report: None })
                    (Toast::error("提交失败", &message))
                }
                .render(),
            )
        }
        Err(RegisterError::Storage(e)) => Err(FailureResponse::from(e)),
    }
}
