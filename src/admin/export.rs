//! CSV downloads of the registrations.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    admin::Admin,
    registration::{
        TeamMember, TeamRecord,
        store::{read_teams, search_members},
    },
    state::Conn,
    util_resp::FailureResponse,
};

/// Spreadsheet programs only detect UTF-8 with a byte order mark.
const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Serialize)]
struct TeamRow<'r> {
    #[serde(rename = "团队ID")]
    id: &'r str,
    #[serde(rename = "团队名称")]
    team_name: &'r str,
    #[serde(rename = "参赛赛道")]
    competition_track: &'r str,
    #[serde(rename = "作品名称")]
    project_name: &'r str,
    #[serde(rename = "代码仓库")]
    repo_url: &'r str,
    #[serde(rename = "CoStrict UID")]
    costrict_uid: &'r str,
    #[serde(rename = "队长")]
    captain: &'r str,
    #[serde(rename = "人数")]
    headcount: usize,
    #[serde(rename = "作品简介")]
    project_intro: &'r str,
    #[serde(rename = "技术方案")]
    tech_solution: &'r str,
    #[serde(rename = "目标与展望")]
    goals_and_outlook: &'r str,
    #[serde(rename = "报名时间")]
    created_at: String,
    #[serde(rename = "更新时间")]
    updated_at: String,
}

impl<'r> From<&'r TeamRecord> for TeamRow<'r> {
    fn from(record: &'r TeamRecord) -> Self {
        let team = &record.team;
        TeamRow {
            id: &team.id,
            team_name: &team.team_name,
            competition_track: &team.competition_track,
            project_name: &team.project_name,
            repo_url: &team.repo_url,
            costrict_uid: &team.costrict_uid,
            captain: record.captain().map(|c| c.name.as_str()).unwrap_or(""),
            headcount: record.members.len(),
            project_intro: &team.project_intro,
            tech_solution: &team.tech_solution,
            goals_and_outlook: &team.goals_and_outlook,
            created_at: team.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: team.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Serialize)]
struct MemberRow<'r> {
    #[serde(rename = "团队名称")]
    team_name: &'r str,
    #[serde(rename = "序号")]
    position: i64,
    #[serde(rename = "姓名")]
    name: &'r str,
    #[serde(rename = "身份")]
    member_type: &'r str,
    #[serde(rename = "是否队长")]
    is_captain: &'static str,
    #[serde(rename = "学校")]
    school: &'r str,
    #[serde(rename = "院系")]
    department: &'r str,
    #[serde(rename = "专业年级")]
    major_grade: &'r str,
    #[serde(rename = "手机")]
    phone: &'r str,
    #[serde(rename = "邮箱")]
    email: &'r str,
    #[serde(rename = "学号")]
    student_id: &'r str,
    #[serde(rename = "角色")]
    role: &'r str,
    #[serde(rename = "技术栈")]
    tech_stack: &'r str,
    #[serde(rename = "简介")]
    description: &'r str,
}

impl<'r> From<&'r TeamMember> for MemberRow<'r> {
    fn from(m: &'r TeamMember) -> Self {
        MemberRow {
            team_name: &m.team_name,
            position: m.seq + 1,
            name: &m.name,
            member_type: &m.member_type,
            is_captain: if m.is_captain { "是" } else { "否" },
            school: &m.school,
            department: &m.department,
            major_grade: &m.major_grade,
            phone: &m.phone,
            email: &m.email,
            student_id: &m.student_id,
            role: &m.role,
            tech_stack: &m.tech_stack,
            description: &m.description,
        }
    }
}

fn write_csv<T: Serialize>(
    rows: impl IntoIterator<Item = T>,
) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(BOM.to_vec());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

fn csv_response(
    filename: &str,
    body: Result<Vec<u8>, csv::Error>,
) -> Result<Response, FailureResponse> {
    let body = body.map_err(|e| {
        tracing::error!("could not write {filename}: {e}");
        FailureResponse::ServerError(())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn teams_csv(
    _admin: Admin,
    mut conn: Conn<false>,
) -> Result<Response, FailureResponse> {
    let teams = read_teams(&mut *conn)?;
    tracing::info!("exporting {} teams", teams.len());
    csv_response("teams.csv", write_csv(teams.iter().map(TeamRow::from)))
}

pub async fn members_csv(
    _admin: Admin,
    mut conn: Conn<false>,
) -> Result<Response, FailureResponse> {
    let members = search_members(None, &mut *conn)?;
    tracing::info!("exporting {} members", members.len());
    csv_response(
        "members.csv",
        write_csv(members.iter().map(MemberRow::from)),
    )
}
