use axum::extract::{Path, Query};
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    admin::Admin,
    registration::{
        TeamRecord,
        store::{fetch_team, search_members, search_teams},
    },
    state::Conn,
    template::Page,
    util_resp::{StandardResponse, err_not_found, success},
    validation::TRACKS,
    widgets::{actions::Actions, alert::InfoAlert},
};

#[derive(Debug, Deserialize)]
pub struct TeamSearch {
    pub q: Option<String>,
    pub track: Option<String>,
}

#[tracing::instrument(skip(conn))]
pub async fn team_list(
    _admin: Admin,
    Query(search): Query<TeamSearch>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let teams = search_teams(
        search.q.as_deref(),
        search.track.as_deref(),
        &mut *conn,
    )?;
    let q = search.q.as_deref().unwrap_or_default();
    let track = search.track.as_deref().unwrap_or_default();

    success(
        Page::new()
            .title("团队列表")
            .admin()
            .body(maud! {
                h1 { "团队列表" }
                Actions options=(&[("/admin/teams.csv", "导出团队 CSV")]);
                form class="search" method="get" action="/admin/teams" {
                    input
                        type="search"
                        class="form-control"
                        name="q"
                        value=(q)
                        placeholder="团队名称 / 作品名称 / 赛道";
                    select class="form-control" name="track" {
                        option value="" selected[track.is_empty()] { "全部赛道" }
                        @for t in TRACKS {
                            option value=(*t) selected[track == *t] { (*t) }
                        }
                    }
                    button type="submit" class="btn btn-primary" { "搜索" }
                }
                @if teams.is_empty() {
                    InfoAlert msg=("没有符合条件的团队。");
                } @else {
                    p { "共 " (teams.len()) " 个团队" }
                    (TeamTable { teams: &teams })
                }
            })
            .render(),
    )
}

struct TeamTable<'r> {
    teams: &'r [TeamRecord],
}

impl Renderable for TeamTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            table class="table" {
                thead {
                    tr {
                        th scope="col" { "团队名称" }
                        th scope="col" { "赛道" }
                        th scope="col" { "作品名称" }
                        th scope="col" { "队长" }
                        th scope="col" { "人数" }
                        th scope="col" { "报名时间" }
                    }
                }
                tbody {
                    @for record in self.teams {
                        tr {
                            td {
                                a href=(format!("/admin/teams/{}", record.team.id)) {
                                    (record.team.team_name)
                                }
                            }
                            td { (record.team.competition_track) }
                            td { (record.team.project_name) }
                            td {
                                @if let Some(captain) = record.captain() {
                                    (captain.name)
                                }
                            }
                            td { (record.members.len()) }
                            td { (record.team.created_at.format("%Y-%m-%d %H:%M").to_string()) }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

pub async fn team_detail(
    _admin: Admin,
    Path(team_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let Some(record) = fetch_team(&team_id, &mut *conn)? else {
        return err_not_found();
    };
    let team = &record.team;

    let texts = [
        ("作品简介", &team.project_intro),
        ("技术方案", &team.tech_solution),
        ("目标与展望", &team.goals_and_outlook),
    ];

    success(
        Page::new()
            .title(team.team_name.clone())
            .admin()
            .body(maud! {
                h1 { (team.team_name) }
                dl class="details" {
                    dt { "参赛赛道" } dd { (team.competition_track) }
                    dt { "作品名称" } dd { (team.project_name) }
                    dt { "CoStrict UID" } dd { (team.costrict_uid) }
                    dt { "代码仓库" }
                    dd {
                        @if !team.repo_url.is_empty() {
                            a href=(team.repo_url) { (team.repo_url) }
                        }
                    }
                    dt { "报名时间" } dd { (team.created_at.format("%Y-%m-%d %H:%M:%S").to_string()) }
                    dt { "最后更新" } dd { (team.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()) }
                }
                @for (title, text) in &texts {
                    @if !text.is_empty() {
                        h2 { (*title) }
                        p class="long-text" { (text.as_str()) }
                    }
                }
                h2 { "团队成员" }
                table class="table" {
                    thead {
                        tr {
                            th scope="col" { "#" }
                            th scope="col" { "姓名" }
                            th scope="col" { "身份" }
                            th scope="col" { "学校" }
                            th scope="col" { "院系" }
                            th scope="col" { "专业年级" }
                            th scope="col" { "手机" }
                            th scope="col" { "邮箱" }
                            th scope="col" { "学号" }
                            th scope="col" { "角色" }
                            th scope="col" { "技术栈" }
                        }
                    }
                    tbody {
                        @for member in &record.members {
                            tr {
                                td { (member.seq + 1) }
                                td {
                                    (member.name)
                                    @if member.is_captain {
                                        " "
                                        span class="badge" { "队长" }
                                    }
                                }
                                td { (member.member_type) }
                                td { (member.school) }
                                td { (member.department) }
                                td { (member.major_grade) }
                                td { (member.phone) }
                                td { (member.email) }
                                td { (member.student_id) }
                                td { (member.role) }
                                td { (member.tech_stack) }
                            }
                        }
                    }
                }
                a href="/admin/teams" { "返回团队列表" }
            })
            .render(),
    )
}

#[derive(Debug, Deserialize)]
pub struct MemberSearch {
    pub q: Option<String>,
}

#[tracing::instrument(skip(conn))]
pub async fn member_list(
    _admin: Admin,
    Query(search): Query<MemberSearch>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let members = search_members(search.q.as_deref(), &mut *conn)?;
    let q = search.q.as_deref().unwrap_or_default();

    success(
        Page::new()
            .title("成员列表")
            .admin()
            .body(maud! {
                h1 { "成员列表" }
                Actions options=(&[("/admin/members.csv", "导出成员 CSV")]);
                form class="search" method="get" action="/admin/members" {
                    input
                        type="search"
                        class="form-control"
                        name="q"
                        value=(q)
                        placeholder="姓名 / 学校 / 手机 / 邮箱 / 团队 / 技术栈";
                    button type="submit" class="btn btn-primary" { "搜索" }
                }
                @if members.is_empty() {
                    InfoAlert msg=("没有符合条件的成员。");
                } @else {
                    p { "共 " (members.len()) " 名成员" }
                    table class="table" {
                        thead {
                            tr {
                                th scope="col" { "姓名" }
                                th scope="col" { "团队" }
                                th scope="col" { "身份" }
                                th scope="col" { "学校" }
                                th scope="col" { "手机" }
                                th scope="col" { "邮箱" }
                                th scope="col" { "技术栈" }
                            }
                        }
                        tbody {
                            @for member in &members {
                                tr {
                                    td { (member.name) }
                                    td {
                                        a href=(format!("/admin/teams/{}", member.team_id)) {
                                            (member.team_name)
                                        }
                                    }
                                    td {
                                        (member.member_type)
                                        @if member.is_captain {
                                            "（队长）"
                                        }
                                    }
                                    td { (member.school) }
                                    td { (member.phone) }
                                    td { (member.email) }
                                    td { (member.tech_stack) }
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}
