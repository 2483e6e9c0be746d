//! Field validation rules.
//!
//! Every input of the registration form is checked against one of the rule
//! tables below. The checks are pure; rendering the resulting message into
//! the inline error slot is done by the form views.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::registration::fields::{
    AdvisorField, FieldId, MemberField, TeamField,
};

/// Maximum number of (non-advisor) members in a team.
pub const MAX_MEMBERS: usize = 5;
/// Maximum number of people in a team, advisor included.
pub const MAX_HEADCOUNT: usize = 6;

/// The `teams.team_name` column held 50 characters.
pub const MAX_TEAM_NAME_CHARS: usize = 50;

pub const TRACKS: &[&str] = &["技术挑战赛", "创新应用赛"];

pub fn is_valid_cn_phone(string: &str) -> Result<(), String> {
    // `\d` would also accept non-ASCII digits
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^1[3-9][0-9]{9}$").unwrap());
    match RE.is_match(string) {
        true => Ok(()),
        false => Err("invalid phone number".to_string()),
    }
}

pub fn is_valid_email(string: &str) -> Result<(), String> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
    match RE.is_match(string) {
        true => Ok(()),
        false => Err("invalid email".to_string()),
    }
}

pub fn is_valid_repo_url(string: &str) -> Result<(), String> {
    match url::Url::parse(string) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(format!("unsupported scheme {}", url.scheme())),
        Err(e) => Err(e.to_string()),
    }
}

/// Number of characters as a browser counts them for CJK text.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-blank after trimming.
    Required,
    /// At least `n` characters after trimming.
    MinChars(usize),
    /// Blank, or between `lo` and `hi` characters (inclusive) after trimming.
    OptionalCharRange(usize, usize),
    /// At most `n` characters after trimming.
    MaxChars(usize),
    Phone,
    Email,
    /// Blank, or an http(s) URL.
    OptionalUrl,
    OneOf(&'static [&'static str]),
}

impl Rule {
    pub fn check(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Rule::Required => !value.is_empty(),
            Rule::MinChars(n) => char_len(value) >= *n,
            Rule::OptionalCharRange(lo, hi) => {
                value.is_empty() || (*lo..=*hi).contains(&char_len(value))
            }
            Rule::MaxChars(n) => char_len(value) <= *n,
            Rule::Phone => is_valid_cn_phone(value).is_ok(),
            Rule::Email => is_valid_email(value).is_ok(),
            Rule::OptionalUrl => {
                value.is_empty() || is_valid_repo_url(value).is_ok()
            }
            Rule::OneOf(options) => options.contains(&value),
        }
    }
}

pub struct FieldRule<F> {
    pub field: F,
    pub rule: Rule,
    pub message: &'static str,
}

pub const TEAM_RULES: &[FieldRule<TeamField>] = &[
    FieldRule {
        field: TeamField::TeamName,
        rule: Rule::Required,
        message: "请填写团队名称",
    },
    FieldRule {
        field: TeamField::TeamName,
        rule: Rule::MaxChars(MAX_TEAM_NAME_CHARS),
        message: "团队名称不能超过50个字符",
    },
    FieldRule {
        field: TeamField::CompetitionTrack,
        rule: Rule::OneOf(TRACKS),
        message: "请选择参赛赛道",
    },
    FieldRule {
        field: TeamField::ProjectName,
        rule: Rule::Required,
        message: "请填写作品名称",
    },
    FieldRule {
        field: TeamField::RepoUrl,
        rule: Rule::OptionalUrl,
        message: "请输入有效的代码仓库链接",
    },
    FieldRule {
        field: TeamField::CostrictUid,
        rule: Rule::Required,
        message: "请填写CoStrict 用户ID",
    },
    FieldRule {
        field: TeamField::ProjectIntro,
        rule: Rule::OptionalCharRange(200, 500),
        message: "项目简介长度必须在200-500字之间",
    },
    FieldRule {
        field: TeamField::TechSolution,
        rule: Rule::OptionalCharRange(200, 500),
        message: "技术方案长度必须在200-500字之间",
    },
    FieldRule {
        field: TeamField::GoalsOutlook,
        rule: Rule::OptionalCharRange(200, 500),
        message: "目标与展望长度必须在200-500字之间",
    },
];

pub const MEMBER_RULES: &[FieldRule<MemberField>] = &[
    FieldRule {
        field: MemberField::Name,
        rule: Rule::MinChars(2),
        message: "姓名至少需要2个字符",
    },
    FieldRule {
        field: MemberField::School,
        rule: Rule::Required,
        message: "请填写学校/单位",
    },
    FieldRule {
        field: MemberField::Department,
        rule: Rule::Required,
        message: "请填写学院/系别",
    },
    FieldRule {
        field: MemberField::MajorGrade,
        rule: Rule::Required,
        message: "请填写专业与年级",
    },
    FieldRule {
        field: MemberField::Phone,
        rule: Rule::Phone,
        message: "请输入有效的11位手机号",
    },
    FieldRule {
        field: MemberField::Email,
        rule: Rule::Email,
        message: "请输入有效的邮箱地址",
    },
    FieldRule {
        field: MemberField::Role,
        rule: Rule::Required,
        message: "请填写项目角色",
    },
];

pub const ADVISOR_RULES: &[FieldRule<AdvisorField>] = &[
    FieldRule {
        field: AdvisorField::Name,
        rule: Rule::MinChars(2),
        message: "姓名至少需要2个字符",
    },
    FieldRule {
        field: AdvisorField::Phone,
        rule: Rule::Phone,
        message: "请输入有效的11位手机号",
    },
    FieldRule {
        field: AdvisorField::Email,
        rule: Rule::Email,
        message: "请输入有效的邮箱地址",
    },
    FieldRule {
        field: AdvisorField::School,
        rule: Rule::Required,
        message: "请填写学校",
    },
    FieldRule {
        field: AdvisorField::Department,
        rule: Rule::Required,
        message: "请填写学院",
    },
    FieldRule {
        field: AdvisorField::Intro,
        rule: Rule::MaxChars(500),
        message: "简介不能超过500字",
    },
];

/// Rules of a field are checked in table order; the first failing one
/// reports.
fn apply<F: PartialEq + 'static>(
    table: &'static [FieldRule<F>],
    field: &F,
    value: &str,
) -> Result<(), &'static str> {
    match table
        .iter()
        .filter(|r| &r.field == field)
        .find(|r| !r.rule.check(value))
    {
        Some(rule) => Err(rule.message),
        None => Ok(()),
    }
}

/// Validates `value` as the content of the field `id`. Fields without a
/// rule (student id, tech stack) always pass.
pub fn validate_field(id: &FieldId, value: &str) -> Result<(), &'static str> {
    match id {
        FieldId::Team(field) => apply(TEAM_RULES, field, value),
        FieldId::Member(_, field) => apply(MEMBER_RULES, field, value),
        FieldId::Advisor(field) => apply(ADVISOR_RULES, field, value),
    }
}

pub fn validate_team_field(
    field: TeamField,
    value: &str,
) -> Result<(), &'static str> {
    apply(TEAM_RULES, &field, value)
}

pub fn validate_member_field(
    field: MemberField,
    value: &str,
) -> Result<(), &'static str> {
    apply(MEMBER_RULES, &field, value)
}

pub fn validate_advisor_field(
    field: AdvisorField,
    value: &str,
) -> Result<(), &'static str> {
    apply(ADVISOR_RULES, &field, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::roster::EntryId;

    #[test]
    fn test_email() {
        assert!(is_valid_email("hello@example.com").is_ok());
        assert!(is_valid_email("hello@example").is_err());
        assert!(is_valid_email("hel lo@example.com").is_err());
        assert!(is_valid_email("@example.com").is_err());
    }

    #[test]
    fn phone_must_be_mainland_mobile() {
        assert!(is_valid_cn_phone("13800138000").is_ok());
        assert!(is_valid_cn_phone("19912345678").is_ok());
        // second digit out of range
        assert!(is_valid_cn_phone("12800138000").is_err());
        assert!(is_valid_cn_phone("10800138000").is_err());
        // wrong length
        assert!(is_valid_cn_phone("1380013800").is_err());
        assert!(is_valid_cn_phone("138001380000").is_err());
        assert!(is_valid_cn_phone("23800138000").is_err());
        // full-width digits are not digits here
        assert!(is_valid_cn_phone("1３800138000").is_err());
    }

    #[test]
    fn long_text_is_optional_but_bounded() {
        let id = FieldId::Team(TeamField::ProjectIntro);
        assert!(validate_field(&id, "").is_ok());
        assert!(validate_field(&id, "   ").is_ok());
        assert_eq!(
            validate_field(&id, &"字".repeat(1)),
            Err("项目简介长度必须在200-500字之间")
        );
        assert!(validate_field(&id, &"字".repeat(199)).is_err());
        assert!(validate_field(&id, &"字".repeat(200)).is_ok());
        assert!(validate_field(&id, &"a".repeat(500)).is_ok());
        assert!(validate_field(&id, &"a".repeat(501)).is_err());
    }

    #[test]
    fn member_name_needs_two_characters() {
        let id = FieldId::Member(EntryId(3), MemberField::Name);
        assert_eq!(validate_field(&id, " 李 "), Err("姓名至少需要2个字符"));
        assert!(validate_field(&id, "李雷").is_ok());
    }

    #[test]
    fn unvalidated_fields_pass() {
        let id = FieldId::Member(EntryId(0), MemberField::StudentId);
        assert!(validate_field(&id, "").is_ok());
        let id = FieldId::Member(EntryId(0), MemberField::TechStack);
        assert!(validate_field(&id, "").is_ok());
    }

    #[test]
    fn track_must_be_known() {
        let id = FieldId::Team(TeamField::CompetitionTrack);
        assert!(validate_field(&id, "技术挑战赛").is_ok());
        assert!(validate_field(&id, "创新应用赛").is_ok());
        assert_eq!(validate_field(&id, ""), Err("请选择参赛赛道"));
        assert!(validate_field(&id, "其他").is_err());
    }

    #[test]
    fn repo_url_is_optional() {
        let id = FieldId::Team(TeamField::RepoUrl);
        assert!(validate_field(&id, "").is_ok());
        assert!(validate_field(&id, "https://github.com/a/b").is_ok());
        assert!(validate_field(&id, "ftp://example.com").is_err());
        assert!(validate_field(&id, "not a url").is_err());
    }

    #[test]
    fn advisor_intro_is_capped() {
        let id = FieldId::Advisor(AdvisorField::Intro);
        assert!(validate_field(&id, "").is_ok());
        assert!(validate_field(&id, &"字".repeat(500)).is_ok());
        assert_eq!(
            validate_field(&id, &"字".repeat(501)),
            Err("简介不能超过500字")
        );
    }

    #[test]
    fn team_name_is_capped_at_fifty_characters() {
        let id = FieldId::Team(TeamField::TeamName);
        assert_eq!(validate_field(&id, " "), Err("请填写团队名称"));
        assert!(validate_field(&id, &"队".repeat(50)).is_ok());
        assert_eq!(
            validate_field(&id, &"队".repeat(51)),
            Err("团队名称不能超过50个字符")
        );
    }
}
