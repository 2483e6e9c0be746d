//! Team registration: the form, its roster, and the stored registrations.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

pub mod api;
pub mod draft;
pub mod fields;
pub mod form;
pub mod payload;
pub mod roster;
pub mod store;

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Team {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
    pub team_name: String,
    pub competition_track: String,
    pub project_name: String,
    pub repo_url: String,
    pub costrict_uid: String,
    pub project_intro: String,
    pub tech_solution: String,
    pub goals_and_outlook: String,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    /// Position of the member in the submitted roster.
    pub seq: i64,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
    pub team_name: String,
    pub name: String,
    pub member_type: String,
    pub is_captain: bool,
    pub school: String,
    pub department: String,
    pub major_grade: String,
    pub phone: String,
    pub email: String,
    pub student_id: String,
    pub role: String,
    pub tech_stack: String,
    #[serde(rename = "desc")]
    pub description: String,
}

/// A team together with its members, ordered as they were submitted.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRecord {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<TeamMember>,
}

impl TeamRecord {
    pub fn captain(&self) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.is_captain)
    }
}
