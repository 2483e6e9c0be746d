//! Identifiers of the inputs of the registration form.
//!
//! A [`FieldId`] doubles as the DOM id of the input (`member-phone-3`); the
//! inline error slot of a field is `<id>-error`.

use std::{fmt, str::FromStr};

use crate::registration::roster::EntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamField {
    TeamName,
    CompetitionTrack,
    ProjectName,
    RepoUrl,
    CostrictUid,
    ProjectIntro,
    TechSolution,
    GoalsOutlook,
}

impl TeamField {
    pub const ALL: [TeamField; 8] = [
        TeamField::TeamName,
        TeamField::CompetitionTrack,
        TeamField::ProjectName,
        TeamField::RepoUrl,
        TeamField::CostrictUid,
        TeamField::ProjectIntro,
        TeamField::TechSolution,
        TeamField::GoalsOutlook,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            TeamField::TeamName => "team-name",
            TeamField::CompetitionTrack => "competition-track",
            TeamField::ProjectName => "project-name",
            TeamField::RepoUrl => "repo-url",
            TeamField::CostrictUid => "costrict-uid",
            TeamField::ProjectIntro => "project-intro",
            TeamField::TechSolution => "tech-solution",
            TeamField::GoalsOutlook => "goals-outlook",
        }
    }

    /// Name of the field in the submitted form and in the JSON payload.
    pub fn key(&self) -> &'static str {
        match self {
            TeamField::TeamName => "team_name",
            TeamField::CompetitionTrack => "competition_track",
            TeamField::ProjectName => "project_name",
            TeamField::RepoUrl => "repo_url",
            TeamField::CostrictUid => "costrict_uid",
            TeamField::ProjectIntro => "project_intro",
            TeamField::TechSolution => "tech_solution",
            TeamField::GoalsOutlook => "goals_and_outlook",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TeamField::TeamName => "团队名称",
            TeamField::CompetitionTrack => "参赛赛道",
            TeamField::ProjectName => "作品名称",
            TeamField::RepoUrl => "代码仓库链接",
            TeamField::CostrictUid => "CoStrict 用户ID",
            TeamField::ProjectIntro => "项目简介",
            TeamField::TechSolution => "技术方案",
            TeamField::GoalsOutlook => "目标与展望",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            TeamField::TeamName
                | TeamField::CompetitionTrack
                | TeamField::ProjectName
                | TeamField::CostrictUid
        )
    }

    fn from_slug(s: &str) -> Option<Self> {
        TeamField::ALL.into_iter().find(|f| f.slug() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberField {
    Name,
    School,
    Department,
    MajorGrade,
    Phone,
    Email,
    StudentId,
    Role,
    TechStack,
}

impl MemberField {
    pub const ALL: [MemberField; 9] = [
        MemberField::Name,
        MemberField::School,
        MemberField::Department,
        MemberField::MajorGrade,
        MemberField::Phone,
        MemberField::Email,
        MemberField::StudentId,
        MemberField::Role,
        MemberField::TechStack,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            MemberField::Name => "name",
            MemberField::School => "school",
            MemberField::Department => "department",
            MemberField::MajorGrade => "major-grade",
            MemberField::Phone => "phone",
            MemberField::Email => "email",
            MemberField::StudentId => "student-id",
            MemberField::Role => "role",
            MemberField::TechStack => "tech-stack",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            MemberField::Name => "name",
            MemberField::School => "school",
            MemberField::Department => "department",
            MemberField::MajorGrade => "major_grade",
            MemberField::Phone => "phone",
            MemberField::Email => "email",
            MemberField::StudentId => "student_id",
            MemberField::Role => "role",
            MemberField::TechStack => "tech_stack",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemberField::Name => "姓名",
            MemberField::School => "学校/单位",
            MemberField::Department => "学院/系别",
            MemberField::MajorGrade => "专业与年级",
            MemberField::Phone => "联系电话",
            MemberField::Email => "电子邮箱",
            MemberField::StudentId => "学号（可选）",
            MemberField::Role => "项目角色",
            MemberField::TechStack => "技术栈/擅长领域",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            MemberField::Name => "请输入姓名",
            MemberField::School => "请输入学校或单位名称",
            MemberField::Department => "请输入学院或系别",
            MemberField::MajorGrade => "例如：计算机科学 大三",
            MemberField::Phone => "请输入11位手机号",
            MemberField::Email => "example@email.com",
            MemberField::StudentId => "用于身份验证，可选",
            MemberField::Role => {
                "例如：前端开发、后端开发、算法、UI/UX设计、产品经理等"
            }
            MemberField::TechStack => {
                "例如：Python, React, Node.js, TensorFlow, Figma"
            }
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, MemberField::StudentId | MemberField::TechStack)
    }

    pub fn input_type(&self) -> &'static str {
        match self {
            MemberField::Phone => "tel",
            MemberField::Email => "email",
            _ => "text",
        }
    }

    fn from_slug(s: &str) -> Option<Self> {
        MemberField::ALL.into_iter().find(|f| f.slug() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisorField {
    Name,
    Phone,
    Email,
    School,
    Department,
    Intro,
}

impl AdvisorField {
    pub const ALL: [AdvisorField; 6] = [
        AdvisorField::Name,
        AdvisorField::Phone,
        AdvisorField::Email,
        AdvisorField::School,
        AdvisorField::Department,
        AdvisorField::Intro,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            AdvisorField::Name => "name",
            AdvisorField::Phone => "phone",
            AdvisorField::Email => "email",
            AdvisorField::School => "school",
            AdvisorField::Department => "department",
            AdvisorField::Intro => "intro",
        }
    }

    pub fn key(&self) -> &'static str {
        self.slug()
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdvisorField::Name => "姓名",
            AdvisorField::Phone => "联系电话",
            AdvisorField::Email => "电子邮箱",
            AdvisorField::School => "学校",
            AdvisorField::Department => "学院",
            AdvisorField::Intro => "简介（500字以内）",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            AdvisorField::Name => "请输入指导老师姓名",
            AdvisorField::Phone => "请输入11位手机号",
            AdvisorField::Email => "example@email.com",
            AdvisorField::School => "请输入学校名称",
            AdvisorField::Department => "请输入学院名称",
            AdvisorField::Intro => "请输入指导老师简介",
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, AdvisorField::Intro)
    }

    pub fn input_type(&self) -> &'static str {
        match self {
            AdvisorField::Phone => "tel",
            AdvisorField::Email => "email",
            _ => "text",
        }
    }

    fn from_slug(s: &str) -> Option<Self> {
        AdvisorField::ALL.into_iter().find(|f| f.slug() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Team(TeamField),
    Member(EntryId, MemberField),
    Advisor(AdvisorField),
}

impl FieldId {
    /// DOM id of the inline error slot of this field.
    pub fn error_slot(&self) -> String {
        format!("{self}-error")
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::Team(field) => write!(f, "{}", field.slug()),
            FieldId::Member(id, field) => {
                write!(f, "member-{}-{}", field.slug(), id.0)
            }
            FieldId::Advisor(field) => write!(f, "advisor-{}", field.slug()),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown form field `{}`", self.0)
    }
}

impl FromStr for FieldId {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownField(s.to_string());

        if let Some(rest) = s.strip_prefix("member-") {
            let (slug, id) = rest.rsplit_once('-').ok_or_else(unknown)?;
            let id = id.parse::<u32>().map_err(|_| unknown())?;
            let field = MemberField::from_slug(slug).ok_or_else(unknown)?;
            return Ok(FieldId::Member(EntryId(id), field));
        }

        if let Some(slug) = s.strip_prefix("advisor-") {
            let field = AdvisorField::from_slug(slug).ok_or_else(unknown)?;
            return Ok(FieldId::Advisor(field));
        }

        TeamField::from_slug(s).map(FieldId::Team).ok_or_else(unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_ids_round_trip() {
        let ids = [
            FieldId::Team(TeamField::GoalsOutlook),
            FieldId::Member(EntryId(12), MemberField::MajorGrade),
            FieldId::Member(EntryId(0), MemberField::TechStack),
            FieldId::Advisor(AdvisorField::Intro),
        ];
        for id in ids {
            assert_eq!(id.to_string().parse::<FieldId>(), Ok(id));
        }
    }

    #[test]
    fn parses_dom_ids() {
        assert_eq!(
            "member-major-grade-4".parse(),
            Ok(FieldId::Member(EntryId(4), MemberField::MajorGrade))
        );
        assert_eq!(
            FieldId::Member(EntryId(4), MemberField::Phone).error_slot(),
            "member-phone-4-error"
        );
        assert!("member-phone".parse::<FieldId>().is_err());
        assert!("member-phone-x".parse::<FieldId>().is_err());
        assert!("advisor-major-grade".parse::<FieldId>().is_err());
        assert!("team_name".parse::<FieldId>().is_err());
    }
}
