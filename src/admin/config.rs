use axum::{extract::Form, response::Redirect};
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    admin::Admin,
    site_config::{
        ConfigEntry, ConfigType, DEADLINE_KEY, SetConfigError, list_configs,
        set_config,
    },
    state::Conn,
    template::Page,
    util_resp::{FailureResponse, StandardResponse, see_other_ok, success},
    widgets::alert::ErrorAlert,
};

fn config_view(
    entries: &[ConfigEntry],
    error: Option<&str>,
) -> hypertext::Rendered<String> {
    Page::new()
        .title("配置")
        .admin()
        .body(maud! {
            h1 { "配置" }
            @if let Some(error) = error {
                ErrorAlert msg=(error);
            }
            table class="table" {
                thead {
                    tr {
                        th scope="col" { "键" }
                        th scope="col" { "值" }
                        th scope="col" { "类型" }
                        th scope="col" { "说明" }
                        th scope="col" { "更新时间" }
                    }
                }
                tbody {
                    @for entry in entries {
                        tr {
                            td { code { (entry.config_key) } }
                            td { (entry.config_value.as_deref().unwrap_or("")) }
                            td { (entry.config_type) }
                            td { (entry.description.as_deref().unwrap_or("")) }
                            td { (entry.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()) }
                        }
                    }
                }
            }
            h2 { "新增或修改" }
            form method="post" action="/admin/config" class="config-form" {
                div class="form-group" {
                    label for="config_key" { "键" }
                    input type="text" class="form-control" id="config_key"
                        name="config_key" required placeholder=(DEADLINE_KEY);
                }
                div class="form-group" {
                    label for="config_value" { "值" }
                    input type="text" class="form-control" id="config_value"
                        name="config_value" placeholder="2025-10-31 23:59:59";
                }
                div class="form-group" {
                    label for="config_type" { "类型" }
                    select class="form-control" id="config_type" name="config_type" {
                        @for kind in ConfigType::ALL {
                            option value=(kind.as_str()) { (kind.as_str()) }
                        }
                    }
                }
                div class="form-group" {
                    label for="description" { "说明" }
                    input type="text" class="form-control" id="description"
                        name="description";
                }
                button type="submit" class="btn btn-primary" { "保存" }
            }
        })
        .render()
}

pub async fn config_page(
    _admin: Admin,
    mut conn: Conn<false>,
) -> StandardResponse {
    let entries = list_configs(&mut *conn)?;
    success(config_view(&entries, None))
}

#[derive(Debug, Deserialize)]
pub struct ConfigForm {
    config_key: String,
    #[serde(default)]
    config_value: String,
    config_type: String,
    description: Option<String>,
}

#[tracing::instrument(skip(conn))]
pub async fn do_set_config(
    _admin: Admin,
    mut conn: Conn<true>,
    Form(form): Form<ConfigForm>,
) -> StandardResponse {
    let result = form
        .config_type
        .parse::<ConfigType>()
        .map_err(SetConfigError::Invalid)
        .and_then(|kind| {
            set_config(
                &form.config_key,
                &form.config_value,
                kind,
                form.description.as_deref(),
                &mut *conn,
            )
        });

    match result {
        Ok(()) => see_other_ok(Redirect::to("/admin/config")),
        Err(SetConfigError::Invalid(e)) => {
            let entries = list_configs(&mut *conn)?;
            Err(FailureResponse::BadRequest(config_view(
                &entries,
                Some(&e.to_string()),
            )))
        }
        Err(SetConfigError::Db(e)) => Err(FailureResponse::from(e)),
    }
}
