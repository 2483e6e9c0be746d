//! The registration as it currently stands in the browser.
//!
//! Every htmx request of the form carries the complete form, which is parsed
//! into a [`RegistrationForm`] (the raw wire shape) and then into a
//! [`RegistrationDraft`]. Roster operations and validation run on the draft
//! and the affected fragments are rendered from it again.
//!
//! Inputs are named in the nested `serde_qs` style, e.g.
//! `team[team_name]`, `members[2][phone]` or `advisor[intro]`. The index in
//! `members[..]` is only the position on the page; the stable identity of an
//! entry travels in `members[..][id]`.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use hypertext::prelude::*;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    registration::{
        fields::{AdvisorField, FieldId, MemberField, TeamField},
        payload::{MemberPayload, MemberType, SubmitPayload, TeamInfo},
        roster::{
            AdvisorEntry, AdvisorFields, EntryId, MemberEntry, MemberFields,
            Roster,
        },
    },
    util_resp::FailureResponse,
    validation::{
        MAX_HEADCOUNT, MAX_MEMBERS, validate_advisor_field,
        validate_member_field, validate_team_field,
    },
    widgets::alert::ErrorAlert,
};

fn qs_config() -> serde_qs::Config {
    // not strict: browsers percent-encode the brackets
    serde_qs::Config::new(5, false)
}

pub fn parse_form<T: DeserializeOwned>(
    body: &[u8],
) -> Result<T, serde_qs::Error> {
    qs_config().deserialize_bytes(body)
}

/// Extracts an `application/x-www-form-urlencoded` body with nested keys.
pub struct QsForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for QsForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = FailureResponse;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::warn!("could not read form body: {e}");
            malformed()
        })?;

        parse_form(&body).map(QsForm).map_err(|e| {
            tracing::warn!("malformed registration form: {e}");
            malformed()
        })
    }
}

fn malformed() -> FailureResponse {
    FailureResponse::BadRequest(
        maud! {
            ErrorAlert msg=("表单数据格式不正确，请刷新页面后重试");
        }
        .render(),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub team: TeamInfo,
    pub members: Vec<MemberForm>,
    pub advisor: Option<AdvisorForm>,
    pub next_id: u32,
    /// The terms checkbox; browsers only send it when it is checked.
    pub agree: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemberForm {
    pub id: u32,
    pub expanded: String,
    pub is_captain: Option<String>,
    #[serde(flatten)]
    pub fields: MemberFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdvisorForm {
    pub expanded: String,
    #[serde(flatten)]
    pub fields: AdvisorFields,
}

fn is_expanded(value: &str) -> bool {
    !matches!(value, "false" | "0")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub team: TeamInfo,
    pub roster: Roster,
    pub agreed: bool,
}

impl From<RegistrationForm> for RegistrationDraft {
    fn from(form: RegistrationForm) -> Self {
        let mut members = form
            .members
            .into_iter()
            .unique_by(|m| m.id)
            .map(|m| MemberEntry {
                id: EntryId(m.id),
                fields: m.fields,
                is_captain: m.is_captain.is_some(),
                expanded: is_expanded(&m.expanded),
            })
            .collect::<Vec<_>>();

        let advisor = form.advisor.map(|a| AdvisorEntry {
            fields: a.fields,
            expanded: is_expanded(&a.expanded),
        });

        // a form without members still gets the one member a fresh
        // roster starts with
        if members.is_empty() {
            members = Roster::new().members().to_vec();
        }
        let roster = Roster::from_parts(members, advisor, form.next_id);

        Self {
            team: form.team,
            roster,
            agreed: form.agree.is_some(),
        }
    }
}

/// Every problem found in a draft. Field errors keep the order in which the
/// fields appear on the page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub fields: IndexMap<FieldId, &'static str>,
    pub general: Vec<&'static str>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }

    pub fn error_for(&self, id: &FieldId) -> Option<&'static str> {
        self.fields.get(id).copied()
    }

    pub fn first_error(&self) -> Option<&FieldId> {
        self.fields.keys().next()
    }

    /// Whether a field of the member `entry` failed.
    pub fn touches_member(&self, entry: EntryId) -> bool {
        self.fields
            .keys()
            .any(|id| matches!(id, FieldId::Member(e, _) if *e == entry))
    }

    pub fn touches_advisor(&self) -> bool {
        self.fields.keys().any(|id| matches!(id, FieldId::Advisor(_)))
    }

    /// The message of the toast shown when submission is blocked.
    pub fn summary(&self) -> &'static str {
        match self.general.first() {
            Some(message) => message,
            None => "请检查并修正标红的字段后再提交",
        }
    }
}

impl RegistrationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value_of(&self, id: &FieldId) -> Option<&str> {
        match id {
            FieldId::Team(field) => Some(self.team.get(*field)),
            FieldId::Member(entry, field) => {
                self.roster.member(*entry).map(|m| m.fields.get(*field))
            }
            FieldId::Advisor(field) => {
                self.roster.advisor().map(|a| a.fields.get(*field))
            }
        }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        for field in TeamField::ALL {
            if let Err(e) = validate_team_field(field, self.team.get(field)) {
                report.fields.insert(FieldId::Team(field), e);
            }
        }

        for member in self.roster.members() {
            for field in MemberField::ALL {
                if let Err(e) =
                    validate_member_field(field, member.fields.get(field))
                {
                    report.fields.insert(FieldId::Member(member.id, field), e);
                }
            }
        }

        if let Some(advisor) = self.roster.advisor() {
            for field in AdvisorField::ALL {
                if let Err(e) =
                    validate_advisor_field(field, advisor.fields.get(field))
                {
                    report.fields.insert(FieldId::Advisor(field), e);
                }
            }
        }

        match self.roster.captain_count() {
            0 => report.general.push("请指定一名队长"),
            1 => {}
            _ => report.general.push("只能指定一名队长"),
        }
        if self.roster.members().len() > MAX_MEMBERS {
            report.general.push("最多只能添加5个成员");
        }
        if self.roster.headcount() > MAX_HEADCOUNT {
            report
                .general
                .push("团队总人数（成员+指导老师）不能超过6人");
        }

        report
    }

    /// The JSON body `POST /api/team/submit` expects for this draft. The
    /// advisor is sent as the last member entry.
    pub fn to_payload(&self) -> SubmitPayload {
        let mut members = self
            .roster
            .members()
            .iter()
            .map(|m| {
                let f = &m.fields;
                MemberPayload {
                    name: f.name.clone(),
                    member_type: if m.is_captain {
                        MemberType::Captain
                    } else {
                        MemberType::Member
                    },
                    is_captain: m.is_captain,
                    school: f.school.clone(),
                    department: f.department.clone(),
                    major_grade: f.major_grade.clone(),
                    phone: f.phone.clone(),
                    email: f.email.clone(),
                    student_id: f.student_id.clone(),
                    role: f.role.clone(),
                    tech_stack: f.tech_stack.clone(),
                    desc: String::new(),
                }
            })
            .collect::<Vec<_>>();

        if let Some(advisor) = self.roster.advisor() {
            let f = &advisor.fields;
            members.push(MemberPayload {
                name: f.name.clone(),
                member_type: MemberType::Advisor,
                is_captain: false,
                school: f.school.clone(),
                department: f.department.clone(),
                phone: f.phone.clone(),
                email: f.email.clone(),
                role: MemberType::Advisor.as_str().to_string(),
                desc: f.intro.clone(),
                ..Default::default()
            });
        }

        SubmitPayload {
            team_info: self.team.clone(),
            members,
        }
    }
}
