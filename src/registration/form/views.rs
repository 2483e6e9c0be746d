//! Fragments of the registration page.
//!
//! Everything here is a pure function of a [`RegistrationDraft`] (and,
//! after a failed submission, its [`ValidationReport`]). The handlers pick
//! which fragment to send back for each htmx request.

use chrono::NaiveDateTime;
use hypertext::prelude::*;

use crate::{
    registration::{
        draft::{RegistrationDraft, ValidationReport},
        fields::{AdvisorField, FieldId, MemberField, TeamField},
        payload::{SUCCESS_MESSAGE, TeamInfo},
        roster::{AdvisorEntry, MemberEntry, Roster},
    },
    validation::TRACKS,
};

fn validate_url(id: &FieldId) -> String {
    format!("/register/validate?field={id}")
}

/// The inline error slot of a field. Validation responses replace it
/// (`outerHTML`), so the element keeps its id.
pub struct ErrorSlot<'a> {
    pub id: &'a FieldId,
    pub error: Option<&'a str>,
}

impl Renderable for ErrorSlot<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            span class="error-message" id=(self.id.error_slot()) {
                @if let Some(error) = self.error {
                    (error)
                }
            }
        }
        .render_to(buffer);
    }
}

/// The ": <name>" suffix in the header of a member or advisor card.
pub struct NameDisplay<'a> {
    pub dom_id: String,
    pub name: &'a str,
    pub out_of_band: bool,
}

impl NameDisplay<'_> {
    pub fn member_dom_id(id: &FieldId) -> Option<String> {
        match id {
            FieldId::Member(entry, MemberField::Name) => {
                Some(format!("member-name-display-{}", entry.0))
            }
            FieldId::Advisor(AdvisorField::Name) => {
                Some("advisor-name-display".to_string())
            }
            _ => None,
        }
    }
}

impl Renderable for NameDisplay<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let name = self.name.trim();
        let text = if name.is_empty() {
            String::new()
        } else {
            format!(": {name}")
        };

        maud! {
            @if self.out_of_band {
                span class="member-name-display" id=(self.dom_id) hx-swap-oob="true" {
                    (text)
                }
            } @else {
                span class="member-name-display" id=(self.dom_id) {
                    (text)
                }
            }
        }
        .render_to(buffer);
    }
}

enum Control {
    Input(&'static str),
    TextArea,
    TrackSelect,
}

/// A labelled input together with its error slot.
struct FieldGroup<'a> {
    id: FieldId,
    name: String,
    label: &'static str,
    required: bool,
    control: Control,
    placeholder: &'static str,
    value: &'a str,
    error: Option<&'static str>,
    first: bool,
}

impl Renderable for FieldGroup<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let dom_id = self.id.to_string();
        let url = validate_url(&self.id);
        let target = format!("#{}", self.id.error_slot());
        let label_class = if self.required { "required" } else { "" };

        maud! {
            div class="form-group" data-first-error[self.first] {
                label for=(dom_id) class=(label_class) { (self.label) }
                @match self.control {
                    Control::Input(kind) => {
                        input type=(kind)
                            id=(dom_id)
                            name=(self.name)
                            value=(self.value)
                            placeholder=(self.placeholder)
                            hx-post=(url)
                            hx-trigger="blur, input changed delay:400ms"
                            hx-target=(target)
                            hx-swap="outerHTML";
                    }
                    Control::TextArea => {
                        textarea id=(dom_id)
                            name=(self.name)
                            rows="5"
                            placeholder=(self.placeholder)
                            hx-post=(url)
                            hx-trigger="blur, input changed delay:400ms"
                            hx-target=(target)
                            hx-swap="outerHTML" {
                            (self.value)
                        }
                    }
                    Control::TrackSelect => {
                        select id=(dom_id)
                            name=(self.name)
                            hx-post=(url)
                            hx-trigger="change, blur"
                            hx-target=(target)
                            hx-swap="outerHTML" {
                            option value="" selected[self.value.is_empty()] {
                                "请选择参赛赛道"
                            }
                            @for track in TRACKS {
                                option value=(*track) selected[*track == self.value] {
                                    (*track)
                                }
                            }
                        }
                    }
                }
                (ErrorSlot { id: &self.id, error: self.error })
            }
        }
        .render_to(buffer);
    }
}

fn error_of(
    report: Option<&ValidationReport>,
    id: &FieldId,
) -> (Option<&'static str>, bool) {
    match report {
        Some(report) => (
            report.error_for(id),
            report.first_error() == Some(id),
        ),
        None => (None, false),
    }
}

pub struct TeamFields<'a> {
    pub team: &'a TeamInfo,
    pub report: Option<&'a ValidationReport>,
}

impl TeamFields<'_> {
    fn placeholder(field: TeamField) -> &'static str {
        match field {
            TeamField::TeamName => "请输入团队名称",
            TeamField::CompetitionTrack => "",
            TeamField::ProjectName => "请输入作品名称",
            TeamField::RepoUrl => "https://github.com/your/repo（可选）",
            TeamField::CostrictUid => "请输入CoStrict 用户ID",
            TeamField::ProjectIntro => "简要介绍项目背景与功能（200-500字，可选）",
            TeamField::TechSolution => "介绍技术架构与实现方案（200-500字，可选）",
            TeamField::GoalsOutlook => "介绍项目目标与未来规划（200-500字，可选）",
        }
    }
}

impl Renderable for TeamFields<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            @for field in TeamField::ALL {
                @let id = FieldId::Team(field);
                @let (error, first) = error_of(self.report, &id);
                (FieldGroup {
                    id,
                    name: format!("team[{}]", field.key()),
                    label: field.label(),
                    required: field.is_required(),
                    control: match field {
                        TeamField::CompetitionTrack => Control::TrackSelect,
                        TeamField::ProjectIntro
                        | TeamField::TechSolution
                        | TeamField::GoalsOutlook => Control::TextArea,
                        _ => Control::Input("text"),
                    },
                    placeholder: Self::placeholder(field),
                    value: self.team.get(field),
                    error,
                    first,
                })
            }
        }
        .render_to(buffer);
    }
}

pub struct MemberCard<'a> {
    pub member: &'a MemberEntry,
    /// 0-based position in the roster.
    pub position: usize,
    pub report: Option<&'a ValidationReport>,
}

impl Renderable for MemberCard<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let m = self.member;
        let id = m.id.0;
        let pos = self.position;
        let base = format!("/register/members/{id}");
        // a card holding a reported error opens so the error can be seen
        let expanded = m.expanded
            || self.report.is_some_and(|r| r.touches_member(m.id));
        let captain_class = if m.is_captain {
            "member-captain captain-selected"
        } else {
            "member-captain"
        };

        maud! {
            div class="member-item" id=(format!("member-{id}")) data-member-id=(id.to_string()) {
                input type="hidden" name=(format!("members[{pos}][id]")) value=(id.to_string());
                input type="hidden"
                    name=(format!("members[{pos}][expanded]"))
                    value=(if expanded { "true" } else { "false" });
                div class="member-header" {
                    h3 {
                        (format!("成员 {}", pos + 1))
                        " "
                        button type="button"
                            class="toggle-btn"
                            hx-post=(format!("{base}/toggle"))
                            hx-target="#roster"
                            hx-swap="outerHTML" {
                            (if expanded { "折叠" } else { "展开" })
                        }
                        " "
                        (NameDisplay {
                            dom_id: format!("member-name-display-{id}"),
                            name: &m.fields.name,
                            out_of_band: false,
                        })
                    }
                    div class="member-actions" {
                        label class=(captain_class) {
                            input type="checkbox"
                                class="captain-checkbox"
                                name=(format!("members[{pos}][is_captain]"))
                                checked[m.is_captain]
                                hx-post=(format!("{base}/captain"))
                                hx-trigger="change"
                                hx-target="#roster"
                                hx-swap="outerHTML";
                            " 队长"
                        }
                        button type="button"
                            class="remove-member-btn"
                            hx-post=(format!("{base}/remove"))
                            hx-target="#roster"
                            hx-swap="outerHTML" {
                            "删除"
                        }
                    }
                }
                div class="member-content" id=(format!("member-content-{id}")) hidden[!expanded] {
                    @for field in MemberField::ALL {
                        @let field_id = FieldId::Member(m.id, field);
                        @let (error, first) = error_of(self.report, &field_id);
                        (FieldGroup {
                            id: field_id,
                            name: format!("members[{pos}][{}]", field.key()),
                            label: field.label(),
                            required: field.is_required(),
                            control: Control::Input(field.input_type()),
                            placeholder: field.placeholder(),
                            value: m.fields.get(field),
                            error,
                            first,
                        })
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

pub struct AdvisorCard<'a> {
    pub advisor: &'a AdvisorEntry,
    pub report: Option<&'a ValidationReport>,
}

impl Renderable for AdvisorCard<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let a = self.advisor;
        let expanded = a.expanded
            || self.report.is_some_and(ValidationReport::touches_advisor);

        maud! {
            div class="member-item advisor-item" id="advisor" {
                input type="hidden"
                    name="advisor[expanded]"
                    value=(if expanded { "true" } else { "false" });
                div class="member-header" {
                    h3 {
                        "指导老师 "
                        button type="button"
                            class="toggle-btn"
                            hx-post="/register/advisor/toggle"
                            hx-target="#roster"
                            hx-swap="outerHTML" {
                            (if expanded { "折叠" } else { "展开" })
                        }
                        " "
                        (NameDisplay {
                            dom_id: "advisor-name-display".to_string(),
                            name: &a.fields.name,
                            out_of_band: false,
                        })
                    }
                    div class="member-actions" {
                        button type="button"
                            class="remove-member-btn"
                            hx-post="/register/advisor/remove"
                            hx-target="#roster"
                            hx-swap="outerHTML" {
                            "删除"
                        }
                    }
                }
                div class="member-content" id="advisor-content" hidden[!expanded] {
                    @for field in AdvisorField::ALL {
                        @let field_id = FieldId::Advisor(field);
                        @let (error, first) = error_of(self.report, &field_id);
                        (FieldGroup {
                            id: field_id,
                            name: format!("advisor[{}]", field.key()),
                            label: field.label(),
                            required: field.is_required(),
                            control: match field {
                                AdvisorField::Intro => Control::TextArea,
                                _ => Control::Input(field.input_type()),
                            },
                            placeholder: field.placeholder(),
                            value: a.fields.get(field),
                            error,
                            first,
                        })
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

/// The member list, the advisor section and the roster buttons. Every
/// roster operation swaps this whole element.
pub struct RosterView<'a> {
    pub roster: &'a Roster,
    pub report: Option<&'a ValidationReport>,
}

impl Renderable for RosterView<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let general: &[&str] = match self.report {
            Some(report) => &report.general,
            None => &[],
        };
        // scroll to the roster when nothing else is marked
        let first = !general.is_empty()
            && self.report.is_some_and(|r| r.first_error().is_none());

        maud! {
            div id="roster" {
                input type="hidden" name="next_id" value=(self.roster.next_id().to_string());
                div id="members-container" {
                    @for (position, member) in self.roster.members().iter().enumerate() {
                        (MemberCard { member, position, report: self.report })
                    }
                }
                div class="roster-buttons" {
                    button type="button"
                        id="add-member-btn"
                        hx-post="/register/members/add"
                        hx-target="#roster"
                        hx-swap="outerHTML" {
                        "+ 添加成员"
                    }
                    button type="button"
                        id="add-advisor-btn"
                        hx-post="/register/advisor/add"
                        hx-target="#roster"
                        hx-swap="outerHTML" {
                        "+ 添加指导老师"
                    }
                }
                div id="advisor-section" hidden[self.roster.advisor().is_none()] {
                    h2 { "指导老师（可选）" }
                    div id="advisor-container" {
                        @if let Some(advisor) = self.roster.advisor() {
                            (AdvisorCard { advisor, report: self.report })
                        }
                    }
                }
                div class="roster-error" id="roster-error" data-first-error[first] {
                    @for message in general {
                        p { (*message) }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

/// The registration form. After a failed submission `report` carries the
/// errors to show inline.
pub struct FormView<'a> {
    pub draft: &'a RegistrationDraft,
    pub report: Option<&'a ValidationReport>,
}

impl Renderable for FormView<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            form id="team-form"
                novalidate
                hx-post="/register/submit"
                hx-target="#registration"
                hx-swap="innerHTML"
                "hx-disabled-elt"="#submit-btn"
                "hx-indicator"="#submit-btn" {
                section class="card" {
                    h2 { "团队信息" }
                    (TeamFields { team: &self.draft.team, report: self.report })
                }
                section class="card" {
                    h2 { "团队成员" }
                    p class="char-hint" {
                        "每支队伍1-5名成员，须指定一名队长；可另添加一位指导老师，总人数不超过6人。"
                    }
                    (RosterView { roster: &self.draft.roster, report: self.report })
                }
                section class="card terms" {
                    details id="terms" {
                        summary { "报名须知" }
                        ul {
                            li { "参赛作品须为团队原创，不得侵犯他人知识产权。" }
                            li { "报名信息须真实有效，组委会将通过所填联系方式发送赛事通知。" }
                            li { "同一团队名称重复提交时，以最后一次提交的信息为准。" }
                        }
                    }
                    label {
                        input type="checkbox" id="agree" name="agree" checked[self.draft.agreed];
                        " 我已阅读并同意\"报名须知\""
                    }
                }
                button type="submit" id="submit-btn" class="btn-primary" {
                    span class="btn-text" { "提交报名" }
                    span class="btn-loader" { "提交中…" }
                }
            }
        }
        .render_to(buffer);
    }
}

pub struct SuccessPanel<'a> {
    pub id: &'a str,
    pub hidden: bool,
}

impl Renderable for SuccessPanel<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div id=(self.id) class="card success-message" hidden[self.hidden] {
                h2 { "报名成功！" }
                p { (SUCCESS_MESSAGE) }
            }
        }
        .render_to(buffer);
    }
}

pub struct DeadlineBanner {
    pub deadline: NaiveDateTime,
    pub now: NaiveDateTime,
}

impl Renderable for DeadlineBanner {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let when = self.deadline.format("%Y-%m-%d %H:%M").to_string();
        maud! {
            @if self.now > self.deadline {
                div class="deadline-banner closed" id="deadline-banner" {
                    (format!("报名已截止（截止时间：{when}）"))
                }
            } @else {
                div class="deadline-banner" id="deadline-banner" {
                    (format!("报名截止时间：{when}"))
                }
            }
        }
        .render_to(buffer);
    }
}
