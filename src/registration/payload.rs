//! The JSON body of `POST /api/team/submit` and its server-side acceptance.
//!
//! Both the htmx form and external JSON clients go through
//! [`SubmitPayload::accept`] before anything is stored.

use serde::{Deserialize, Serialize};

use crate::{
    registration::fields::TeamField,
    validation::{
        MAX_HEADCOUNT, MAX_MEMBERS, MAX_TEAM_NAME_CHARS, TRACKS, char_len,
        is_valid_cn_phone, is_valid_email, is_valid_repo_url,
    },
};

pub const SUCCESS_MESSAGE: &str = "您已成功报名参加\"码上AI·2025深信服CoStrict校园挑战赛\"。我们已向您的邮箱发送确认邮件，请查收。";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamInfo {
    pub team_name: String,
    pub competition_track: String,
    pub project_name: String,
    pub repo_url: String,
    pub costrict_uid: String,
    pub project_intro: String,
    pub tech_solution: String,
    pub goals_and_outlook: String,
}

impl TeamInfo {
    pub fn get(&self, field: TeamField) -> &str {
        match field {
            TeamField::TeamName => &self.team_name,
            TeamField::CompetitionTrack => &self.competition_track,
            TeamField::ProjectName => &self.project_name,
            TeamField::RepoUrl => &self.repo_url,
            TeamField::CostrictUid => &self.costrict_uid,
            TeamField::ProjectIntro => &self.project_intro,
            TeamField::TechSolution => &self.tech_solution,
            TeamField::GoalsOutlook => &self.goals_and_outlook,
        }
    }

    fn trimmed(self) -> Self {
        Self {
            team_name: trim(self.team_name),
            competition_track: trim(self.competition_track),
            project_name: trim(self.project_name),
            repo_url: trim(self.repo_url),
            costrict_uid: trim(self.costrict_uid),
            project_intro: trim(self.project_intro),
            tech_solution: trim(self.tech_solution),
            goals_and_outlook: trim(self.goals_and_outlook),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum MemberType {
    #[serde(rename = "队长")]
    Captain,
    #[default]
    #[serde(rename = "队员")]
    Member,
    #[serde(rename = "指导老师")]
    Advisor,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberType::Captain => "队长",
            MemberType::Member => "队员",
            MemberType::Advisor => "指导老师",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "队长" => Some(MemberType::Captain),
            "队员" => Some(MemberType::Member),
            "指导老师" => Some(MemberType::Advisor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberPayload {
    pub name: String,
    pub member_type: MemberType,
    pub is_captain: bool,
    pub school: String,
    pub department: String,
    pub major_grade: String,
    pub phone: String,
    pub email: String,
    pub student_id: String,
    pub role: String,
    pub tech_stack: String,
    pub desc: String,
}

impl MemberPayload {
    pub fn is_advisor(&self) -> bool {
        self.member_type == MemberType::Advisor
    }

    /// Either marker is accepted: older clients only send `member_type`.
    pub fn is_captain(&self) -> bool {
        !self.is_advisor()
            && (self.is_captain || self.member_type == MemberType::Captain)
    }

    fn normalized(self) -> Self {
        let is_captain = self.is_captain();
        let member_type = match self.member_type {
            MemberType::Advisor => MemberType::Advisor,
            _ if is_captain => MemberType::Captain,
            _ => MemberType::Member,
        };
        Self {
            name: trim(self.name),
            member_type,
            is_captain,
            school: trim(self.school),
            department: trim(self.department),
            major_grade: trim(self.major_grade),
            phone: trim(self.phone),
            email: trim(self.email),
            student_id: trim(self.student_id),
            role: trim(self.role),
            tech_stack: trim(self.tech_stack),
            desc: trim(self.desc),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitPayload {
    pub team_info: TeamInfo,
    pub members: Vec<MemberPayload>,
}

/// A payload which passed every check, with all values trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRegistration {
    pub team: TeamInfo,
    pub members: Vec<MemberPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitError(pub String);

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn trim(s: String) -> String {
    let trimmed = s.trim();
    if trimmed.len() == s.len() {
        s
    } else {
        trimmed.to_string()
    }
}

fn reject<T>(message: impl Into<String>) -> Result<T, SubmitError> {
    Err(SubmitError(message.into()))
}

impl SubmitPayload {
    pub fn accept(self) -> Result<AcceptedRegistration, SubmitError> {
        let team = self.team_info.trimmed();
        let members: Vec<MemberPayload> =
            self.members.into_iter().map(MemberPayload::normalized).collect();

        if [
            &team.team_name,
            &team.competition_track,
            &team.project_name,
            &team.costrict_uid,
        ]
        .iter()
        .any(|v| v.is_empty())
        {
            return reject(
                "请填写所有团队必填字段（团队名称、参赛赛道、作品名称、CoStrict UID）",
            );
        }

        if char_len(&team.team_name) > MAX_TEAM_NAME_CHARS {
            return reject("团队名称不能超过50个字符");
        }

        if !TRACKS.contains(&team.competition_track.as_str()) {
            return reject("参赛赛道必须为\"技术挑战赛\"或\"创新应用赛\"");
        }

        for field in [
            TeamField::ProjectIntro,
            TeamField::TechSolution,
            TeamField::GoalsOutlook,
        ] {
            let value = team.get(field);
            if !value.is_empty() && !(200..=500).contains(&char_len(value)) {
                return reject(format!(
                    "{}长度必须在200-500字之间",
                    field.label()
                ));
            }
        }

        if !team.repo_url.is_empty() && is_valid_repo_url(&team.repo_url).is_err()
        {
            return reject("代码仓库链接格式不正确");
        }

        let regular = members.iter().filter(|m| !m.is_advisor()).count();
        let advisors = members.len() - regular;

        if regular == 0 {
            return reject("至少需要添加一名团队成员");
        }
        if regular > MAX_MEMBERS {
            return reject("最多只能添加5个成员");
        }
        if advisors > 1 {
            return reject("只能添加一位指导老师");
        }
        if members.len() > MAX_HEADCOUNT {
            return reject("团队总人数（成员+指导老师）不能超过6人");
        }

        match members.iter().filter(|m| m.is_captain()).count() {
            0 => return reject("团队必须指定一名队长"),
            1 => {}
            _ => return reject("只能指定一名队长"),
        }

        for (i, member) in members.iter().enumerate() {
            if member.is_advisor() {
                check_advisor(member)?;
            } else {
                check_member(i + 1, member)?;
            }
        }

        Ok(AcceptedRegistration { team, members })
    }
}

fn check_member(i: usize, m: &MemberPayload) -> Result<(), SubmitError> {
    if [
        &m.name,
        &m.school,
        &m.department,
        &m.major_grade,
        &m.phone,
        &m.email,
        &m.role,
    ]
    .iter()
    .any(|v| v.is_empty())
    {
        return reject(format!(
            "请填写成员{i}的所有必填字段（姓名、学校/单位、学院/系别、专业与年级、联系电话、电子邮箱、项目角色）"
        ));
    }
    if is_valid_email(&m.email).is_err() {
        return reject(format!("成员{i}的邮箱格式不正确"));
    }
    if is_valid_cn_phone(&m.phone).is_err() {
        return reject(format!(
            "成员{i}的手机号格式不正确（需为大陆11位且以1开头）"
        ));
    }
    if char_len(&m.name) < 2 {
        return reject(format!("成员{i}的姓名至少需要2个字符"));
    }
    Ok(())
}

fn check_advisor(m: &MemberPayload) -> Result<(), SubmitError> {
    if [&m.name, &m.phone, &m.email, &m.school, &m.department]
        .iter()
        .any(|v| v.is_empty())
    {
        return reject(
            "请填写指导老师的所有必填字段（姓名、联系电话、电子邮箱、学校、学院）",
        );
    }
    if is_valid_email(&m.email).is_err() {
        return reject("指导老师的邮箱格式不正确");
    }
    if is_valid_cn_phone(&m.phone).is_err() {
        return reject("指导老师的手机号格式不正确（需为大陆11位且以1开头）");
    }
    if char_len(&m.name) < 2 {
        return reject("指导老师的姓名至少需要2个字符");
    }
    if char_len(&m.desc) > 500 {
        return reject("指导老师简介不能超过500字");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn member(name: &str, captain: bool) -> MemberPayload {
        MemberPayload {
            name: name.to_string(),
            member_type: if captain {
                MemberType::Captain
            } else {
                MemberType::Member
            },
            is_captain: captain,
            school: "清华大学".to_string(),
            department: "计算机系".to_string(),
            major_grade: "计算机科学 大三".to_string(),
            phone: "13800138000".to_string(),
            email: "someone@example.com".to_string(),
            role: "后端开发".to_string(),
            ..Default::default()
        }
    }

    pub fn advisor() -> MemberPayload {
        MemberPayload {
            name: "王老师".to_string(),
            member_type: MemberType::Advisor,
            school: "清华大学".to_string(),
            department: "计算机系".to_string(),
            phone: "13900139000".to_string(),
            email: "advisor@example.com".to_string(),
            role: "指导老师".to_string(),
            desc: "人工智能方向教授".to_string(),
            ..Default::default()
        }
    }

    pub fn payload(team_name: &str) -> SubmitPayload {
        SubmitPayload {
            team_info: TeamInfo {
                team_name: team_name.to_string(),
                competition_track: "技术挑战赛".to_string(),
                project_name: "智能助手".to_string(),
                costrict_uid: "uid-001".to_string(),
                ..Default::default()
            },
            members: vec![member("张三", true), member("李四", false)],
        }
    }

    fn rejection(p: SubmitPayload) -> String {
        p.accept().unwrap_err().0
    }

    #[test]
    fn accepts_and_trims() {
        let mut p = payload("  银河战队 ");
        p.members[1].phone = " 13912345678 ".to_string();
        let accepted = p.accept().unwrap();
        assert_eq!(accepted.team.team_name, "银河战队");
        assert_eq!(accepted.members[1].phone, "13912345678");
    }

    #[test]
    fn requires_team_fields_and_known_track() {
        let mut p = payload("t");
        p.team_info.costrict_uid = "  ".to_string();
        assert!(rejection(p).starts_with("请填写所有团队必填字段"));

        let mut p = payload("t");
        p.team_info.competition_track = "算法赛".to_string();
        assert_eq!(rejection(p), "参赛赛道必须为\"技术挑战赛\"或\"创新应用赛\"");
    }

    #[test]
    fn team_name_is_capped() {
        assert!(payload(&"队".repeat(50)).accept().is_ok());
        assert_eq!(
            rejection(payload(&"队".repeat(80))),
            "团队名称不能超过50个字符"
        );
        // counted after trimming
        assert!(payload(&format!("  {}  ", "队".repeat(50))).accept().is_ok());
    }

    #[test]
    fn long_texts_are_bounded() {
        let mut p = payload("t");
        p.team_info.tech_solution = "字".repeat(120);
        assert_eq!(rejection(p), "技术方案长度必须在200-500字之间");

        let mut p = payload("t");
        p.team_info.tech_solution = "字".repeat(300);
        assert!(p.accept().is_ok());
    }

    #[test]
    fn exactly_one_captain() {
        let mut p = payload("t");
        p.members[0].is_captain = false;
        p.members[0].member_type = MemberType::Member;
        assert_eq!(rejection(p), "团队必须指定一名队长");

        let mut p = payload("t");
        p.members[1].is_captain = true;
        assert_eq!(rejection(p), "只能指定一名队长");
    }

    #[test]
    fn captain_from_member_type_only() {
        let mut p = payload("t");
        p.members[0].is_captain = false;
        let accepted = p.accept().unwrap();
        assert!(accepted.members[0].is_captain);
    }

    #[test]
    fn member_and_headcount_caps() {
        let mut p = payload("t");
        for i in 0..4 {
            p.members.push(member(&format!("队员{i}"), false));
        }
        assert_eq!(rejection(p), "最多只能添加5个成员");

        let mut p = payload("t");
        for i in 0..3 {
            p.members.push(member(&format!("队员{i}"), false));
        }
        p.members.push(advisor());
        assert!(p.clone().accept().is_ok());
        p.members.push(advisor());
        assert_eq!(rejection(p), "只能添加一位指导老师");

        // five members and an advisor is the largest team
        let mut p = payload("t");
        for i in 0..3 {
            p.members.push(member(&format!("队员{i}"), false));
        }
        p.members.push(advisor());
        assert_eq!(p.members.len(), MAX_HEADCOUNT);
        assert!(p.accept().is_ok());
    }

    #[test]
    fn advisor_uses_advisor_rules() {
        let mut p = payload("t");
        p.members.push(advisor());
        // no major/grade needed
        assert!(p.clone().accept().is_ok());

        p.members[2].phone = "12345".to_string();
        assert_eq!(
            rejection(p),
            "指导老师的手机号格式不正确（需为大陆11位且以1开头）"
        );
    }

    #[test]
    fn reports_member_index() {
        let mut p = payload("t");
        p.members[1].email = "nope".to_string();
        assert_eq!(rejection(p), "成员2的邮箱格式不正确");

        let mut p = payload("t");
        p.members[1].phone = "12800138000".to_string();
        assert_eq!(
            rejection(p),
            "成员2的手机号格式不正确（需为大陆11位且以1开头）"
        );
    }

    #[test]
    fn empty_roster_is_rejected() {
        let mut p = payload("t");
        p.members.clear();
        assert_eq!(rejection(p), "至少需要添加一名团队成员");
    }

    #[test]
    fn member_type_uses_chinese_labels() {
        let json = serde_json::to_value(member("张三", true)).unwrap();
        assert_eq!(json["member_type"], "队长");
        let parsed: MemberPayload =
            serde_json::from_str(r#"{"name":"x","member_type":"指导老师"}"#)
                .unwrap();
        assert!(parsed.is_advisor());
        assert_eq!(parsed.phone, "");
    }
}
