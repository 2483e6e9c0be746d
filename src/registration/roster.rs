//! The team roster: an ordered list of members with stable identifiers and
//! an optional advisor.
//!
//! Entry ids are handed out by the roster and are never reused while the
//! registration is being filled in, so DOM ids built from them stay valid
//! when other entries are removed. The number shown to the user ("成员 N")
//! is the position in the list instead, so it is re-indexed on removal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    registration::fields::{AdvisorField, MemberField},
    validation::{MAX_HEADCOUNT, MAX_MEMBERS},
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(pub u32);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberFields {
    pub name: String,
    pub school: String,
    pub department: String,
    pub major_grade: String,
    pub phone: String,
    pub email: String,
    pub student_id: String,
    pub role: String,
    pub tech_stack: String,
}

impl MemberFields {
    pub fn get(&self, field: MemberField) -> &str {
        match field {
            MemberField::Name => &self.name,
            MemberField::School => &self.school,
            MemberField::Department => &self.department,
            MemberField::MajorGrade => &self.major_grade,
            MemberField::Phone => &self.phone,
            MemberField::Email => &self.email,
            MemberField::StudentId => &self.student_id,
            MemberField::Role => &self.role,
            MemberField::TechStack => &self.tech_stack,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorFields {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub school: String,
    pub department: String,
    pub intro: String,
}

impl AdvisorFields {
    pub fn get(&self, field: AdvisorField) -> &str {
        match field {
            AdvisorField::Name => &self.name,
            AdvisorField::Phone => &self.phone,
            AdvisorField::Email => &self.email,
            AdvisorField::School => &self.school,
            AdvisorField::Department => &self.department,
            AdvisorField::Intro => &self.intro,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub id: EntryId,
    pub fields: MemberFields,
    pub is_captain: bool,
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorEntry {
    pub fields: AdvisorFields,
    pub expanded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterError {
    MemberLimit,
    HeadcountLimit,
    LastMember,
    AdvisorLimit,
    NotFound(EntryId),
    /// The posted form carried an id at the end of the id range.
    IdsExhausted,
}

impl RosterError {
    /// Title of the toast reporting this error.
    pub fn title(&self) -> &'static str {
        match self {
            RosterError::MemberLimit | RosterError::HeadcountLimit => {
                "人数限制"
            }
            RosterError::LastMember => "无法删除",
            RosterError::AdvisorLimit => "操作限制",
            RosterError::NotFound(_) | RosterError::IdsExhausted => {
                "操作失败"
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RosterError::MemberLimit => "最多只能添加5个成员",
            RosterError::HeadcountLimit => {
                "团队总人数（成员+指导老师）不能超过6人"
            }
            RosterError::LastMember => "至少需要保留一个成员",
            RosterError::AdvisorLimit => "只能添加一位指导老师",
            RosterError::NotFound(_) => "该成员不存在，请刷新页面后重试",
            RosterError::IdsExhausted => "表单状态异常，请刷新页面后重试",
        }
    }
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::NotFound(id) => write!(f, "no roster entry {}", id.0),
            other => f.write_str(other.message()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    members: Vec<MemberEntry>,
    advisor: Option<AdvisorEntry>,
    next_id: u32,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    /// A fresh roster holds one (expanded) member and no advisor.
    pub fn new() -> Self {
        Self {
            members: vec![MemberEntry {
                id: EntryId(0),
                fields: MemberFields::default(),
                is_captain: false,
                expanded: true,
            }],
            advisor: None,
            next_id: 1,
        }
    }

    /// Rebuilds a roster from submitted form state. `next_id` is raised
    /// past every id in use, so a tampered counter cannot cause clashes.
    /// An id of `u32::MAX` leaves the counter at `u32::MAX`, where
    /// [`Roster::add_member`] refuses to hand out ids.
    pub fn from_parts(
        members: Vec<MemberEntry>,
        advisor: Option<AdvisorEntry>,
        next_id: u32,
    ) -> Self {
        let min_next = members
            .iter()
            .map(|m| m.id.0.saturating_add(1))
            .max()
            .unwrap_or(0);
        Self {
            members,
            advisor,
            next_id: next_id.max(min_next),
        }
    }

    pub fn members(&self) -> &[MemberEntry] {
        &self.members
    }

    pub fn member(&self, id: EntryId) -> Option<&MemberEntry> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn advisor(&self) -> Option<&AdvisorEntry> {
        self.advisor.as_ref()
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Members plus the advisor, if any.
    pub fn headcount(&self) -> usize {
        self.members.len() + usize::from(self.advisor.is_some())
    }

    pub fn captain_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_captain).count()
    }

    /// 0-based position of the member in the roster.
    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }

    fn member_mut(
        &mut self,
        id: EntryId,
    ) -> Result<&mut MemberEntry, RosterError> {
        self.members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(RosterError::NotFound(id))
    }

    pub fn add_member(&mut self) -> Result<EntryId, RosterError> {
        if self.members.len() >= MAX_MEMBERS {
            return Err(RosterError::MemberLimit);
        }
        if self.headcount() >= MAX_HEADCOUNT {
            return Err(RosterError::HeadcountLimit);
        }

        let following = self
            .next_id
            .checked_add(1)
            .ok_or(RosterError::IdsExhausted)?;
        let id = EntryId(self.next_id);
        self.next_id = following;
        self.members.push(MemberEntry {
            id,
            fields: MemberFields::default(),
            is_captain: false,
            expanded: true,
        });
        Ok(id)
    }

    pub fn remove_member(&mut self, id: EntryId) -> Result<(), RosterError> {
        let position = self.position_of(id).ok_or(RosterError::NotFound(id))?;
        if self.members.len() <= 1 {
            return Err(RosterError::LastMember);
        }
        self.members.remove(position);
        Ok(())
    }

    pub fn toggle_member(&mut self, id: EntryId) -> Result<bool, RosterError> {
        let member = self.member_mut(id)?;
        member.expanded = !member.expanded;
        Ok(member.expanded)
    }

    /// Marks (or unmarks) a member as captain. Marking one member clears the
    /// flag on every other member.
    pub fn set_captain(
        &mut self,
        id: EntryId,
        checked: bool,
    ) -> Result<(), RosterError> {
        self.member_mut(id)?;
        for member in &mut self.members {
            if member.id == id {
                member.is_captain = checked;
            } else if checked {
                member.is_captain = false;
            }
        }
        Ok(())
    }

    pub fn add_advisor(&mut self) -> Result<(), RosterError> {
        if self.advisor.is_some() {
            return Err(RosterError::AdvisorLimit);
        }
        if self.headcount() >= MAX_HEADCOUNT {
            return Err(RosterError::HeadcountLimit);
        }
        self.advisor = Some(AdvisorEntry {
            fields: AdvisorFields::default(),
            expanded: true,
        });
        Ok(())
    }

    /// Removes the advisor. Returns whether there was one.
    pub fn remove_advisor(&mut self) -> bool {
        self.advisor.take().is_some()
    }

    pub fn toggle_advisor(&mut self) -> Option<bool> {
        self.advisor.as_mut().map(|advisor| {
            advisor.expanded = !advisor.expanded;
            advisor.expanded
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_expanded_member() {
        let roster = Roster::new();
        assert_eq!(roster.members().len(), 1);
        assert!(roster.members()[0].expanded);
        assert!(roster.advisor().is_none());
        assert_eq!(roster.headcount(), 1);
    }

    #[test]
    fn sixth_member_is_rejected() {
        let mut roster = Roster::new();
        for _ in 0..4 {
            roster.add_member().unwrap();
        }
        assert_eq!(roster.members().len(), 5);
        assert_eq!(roster.add_member(), Err(RosterError::MemberLimit));
        assert_eq!(roster.members().len(), 5);
    }

    #[test]
    fn advisor_fits_next_to_five_members() {
        let mut roster = Roster::new();
        for _ in 0..4 {
            roster.add_member().unwrap();
        }
        roster.add_advisor().unwrap();
        assert_eq!(roster.headcount(), 6);
        assert_eq!(roster.add_member(), Err(RosterError::MemberLimit));
    }

    #[test]
    fn last_member_cannot_be_removed() {
        let mut roster = Roster::new();
        let only = roster.members()[0].id;
        assert_eq!(roster.remove_member(only), Err(RosterError::LastMember));

        let second = roster.add_member().unwrap();
        roster.remove_member(only).unwrap();
        assert_eq!(
            roster.remove_member(second),
            Err(RosterError::LastMember)
        );
        assert_eq!(roster.members().len(), 1);
    }

    #[test]
    fn ids_are_stable_and_positions_reindex() {
        let mut roster = Roster::new();
        let a = roster.members()[0].id;
        let b = roster.add_member().unwrap();
        let c = roster.add_member().unwrap();

        roster.remove_member(b).unwrap();
        assert_eq!(roster.position_of(a), Some(0));
        assert_eq!(roster.position_of(c), Some(1));

        // ids are not reused
        let d = roster.add_member().unwrap();
        assert_ne!(d, b);
        assert!(d > c);
    }

    #[test]
    fn captain_is_exclusive() {
        let mut roster = Roster::new();
        let a = roster.members()[0].id;
        let b = roster.add_member().unwrap();

        roster.set_captain(a, true).unwrap();
        assert_eq!(roster.captain_count(), 1);

        roster.set_captain(b, true).unwrap();
        assert_eq!(roster.captain_count(), 1);
        assert!(roster.member(b).unwrap().is_captain);
        assert!(!roster.member(a).unwrap().is_captain);

        roster.set_captain(b, false).unwrap();
        assert_eq!(roster.captain_count(), 0);

        assert_eq!(
            roster.set_captain(EntryId(99), true),
            Err(RosterError::NotFound(EntryId(99)))
        );
    }

    #[test]
    fn only_one_advisor() {
        let mut roster = Roster::new();
        roster.add_advisor().unwrap();
        assert_eq!(roster.add_advisor(), Err(RosterError::AdvisorLimit));
        assert!(roster.remove_advisor());
        assert!(!roster.remove_advisor());
        roster.add_advisor().unwrap();
    }

    #[test]
    fn toggling_flips_expansion() {
        let mut roster = Roster::new();
        let a = roster.members()[0].id;
        assert_eq!(roster.toggle_member(a), Ok(false));
        assert_eq!(roster.toggle_member(a), Ok(true));

        assert_eq!(roster.toggle_advisor(), None);
        roster.add_advisor().unwrap();
        assert_eq!(roster.toggle_advisor(), Some(false));
    }

    #[test]
    fn restored_counter_never_reuses_ids() {
        let members = vec![MemberEntry {
            id: EntryId(7),
            fields: MemberFields::default(),
            is_captain: true,
            expanded: false,
        }];
        let mut roster = Roster::from_parts(members, None, 2);
        assert_eq!(roster.add_member(), Ok(EntryId(8)));
    }

    fn member_with_id(id: u32) -> MemberEntry {
        MemberEntry {
            id: EntryId(id),
            fields: MemberFields::default(),
            is_captain: false,
            expanded: true,
        }
    }

    #[test]
    fn counter_at_end_of_range_refuses_new_ids() {
        let mut roster =
            Roster::from_parts(vec![member_with_id(0)], None, u32::MAX);
        assert_eq!(roster.add_member(), Err(RosterError::IdsExhausted));
        assert_eq!(roster.members().len(), 1);

        let mut roster =
            Roster::from_parts(vec![member_with_id(0)], None, u32::MAX - 1);
        assert_eq!(roster.add_member(), Ok(EntryId(u32::MAX - 1)));
        assert_eq!(roster.add_member(), Err(RosterError::IdsExhausted));
    }

    #[test]
    fn largest_id_is_never_handed_out_twice() {
        let mut roster =
            Roster::from_parts(vec![member_with_id(u32::MAX)], None, 1);
        assert_eq!(roster.next_id(), u32::MAX);
        assert_eq!(roster.add_member(), Err(RosterError::IdsExhausted));
        assert_eq!(roster.members().len(), 1);
    }

    #[test]
    fn advisor_cannot_join_six_members() {
        let members = (0..6).map(member_with_id).collect();
        let mut roster = Roster::from_parts(members, None, 6);
        assert_eq!(roster.headcount(), 6);
        assert_eq!(roster.add_advisor(), Err(RosterError::HeadcountLimit));
        assert!(roster.advisor().is_none());
    }
}
