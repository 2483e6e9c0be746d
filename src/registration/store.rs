use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use itertools::Itertools;
use uuid::Uuid;

use crate::{
    registration::{
        Team, TeamMember, TeamRecord, payload::AcceptedRegistration,
    },
    schema::{team_members, teams},
};

/// Stores an accepted registration and returns the id of the team.
///
/// Team names are unique: a registration for an existing name updates that
/// team and replaces all of its members. Callers are expected to run this
/// inside a transaction.
#[tracing::instrument(skip(reg, conn), fields(team_name = %reg.team.team_name))]
pub fn save_team(
    reg: &AcceptedRegistration,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<String, diesel::result::Error> {
    let now = Utc::now().naive_utc();
    let team = &reg.team;

    let existing = teams::table
        .filter(teams::team_name.eq(&team.team_name))
        .select(teams::id)
        .first::<String>(conn)
        .optional()?;

    let team_id = match existing {
        Some(id) => {
            diesel::update(teams::table.filter(teams::id.eq(&id)))
                .set((
                    teams::updated_at.eq(now),
                    teams::competition_track.eq(&team.competition_track),
                    teams::project_name.eq(&team.project_name),
                    teams::repo_url.eq(&team.repo_url),
                    teams::costrict_uid.eq(&team.costrict_uid),
                    teams::project_intro.eq(&team.project_intro),
                    teams::tech_solution.eq(&team.tech_solution),
                    teams::goals_and_outlook.eq(&team.goals_and_outlook),
                ))
                .execute(conn)?;

            let removed = diesel::delete(
                team_members::table.filter(team_members::team_id.eq(&id)),
            )
            .execute(conn)?;
            tracing::info!("updating team {id}, replacing {removed} members");
            id
        }
        None => {
            let id = Uuid::now_v7().to_string();
            diesel::insert_into(teams::table)
                .values((
                    teams::id.eq(&id),
                    teams::created_at.eq(now),
                    teams::updated_at.eq(now),
                    teams::team_name.eq(&team.team_name),
                    teams::competition_track.eq(&team.competition_track),
                    teams::project_name.eq(&team.project_name),
                    teams::repo_url.eq(&team.repo_url),
                    teams::costrict_uid.eq(&team.costrict_uid),
                    teams::project_intro.eq(&team.project_intro),
                    teams::tech_solution.eq(&team.tech_solution),
                    teams::goals_and_outlook.eq(&team.goals_and_outlook),
                ))
                .execute(conn)?;
            tracing::info!("created team {id}");
            id
        }
    };

    for (seq, member) in reg.members.iter().enumerate() {
        diesel::insert_into(team_members::table)
            .values((
                team_members::id.eq(Uuid::now_v7().to_string()),
                team_members::team_id.eq(&team_id),
                team_members::seq.eq(seq as i64),
                team_members::created_at.eq(now),
                team_members::updated_at.eq(now),
                team_members::team_name.eq(&team.team_name),
                team_members::name.eq(&member.name),
                team_members::member_type.eq(member.member_type.as_str()),
                team_members::is_captain.eq(member.is_captain),
                team_members::school.eq(&member.school),
                team_members::department.eq(&member.department),
                team_members::major_grade.eq(&member.major_grade),
                team_members::phone.eq(&member.phone),
                team_members::email.eq(&member.email),
                team_members::student_id.eq(&member.student_id),
                team_members::role.eq(&member.role),
                team_members::tech_stack.eq(&member.tech_stack),
                team_members::description.eq(&member.desc),
            ))
            .execute(conn)?;
    }

    Ok(team_id)
}

fn attach_members(
    teams: Vec<Team>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Vec<TeamRecord>, diesel::result::Error> {
    let ids = teams.iter().map(|t| t.id.as_str()).collect::<Vec<_>>();
    let mut members = team_members::table
        .filter(team_members::team_id.eq_any(ids))
        .order_by(team_members::seq.asc())
        .load::<TeamMember>(conn)?
        .into_iter()
        .into_group_map_by(|m| m.team_id.clone());

    Ok(teams
        .into_iter()
        .map(|team| TeamRecord {
            members: members.remove(&team.id).unwrap_or_default(),
            team,
        })
        .collect())
}

/// All teams with their members, most recently created first.
#[tracing::instrument(skip(conn))]
pub fn read_teams(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Vec<TeamRecord>, diesel::result::Error> {
    let teams = teams::table
        .order_by((teams::created_at.desc(), teams::id.desc()))
        .load::<Team>(conn)?;
    attach_members(teams, conn)
}

#[tracing::instrument(skip(conn))]
pub fn fetch_team(
    id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Option<TeamRecord>, diesel::result::Error> {
    let Some(team) = teams::table
        .filter(teams::id.eq(id))
        .first::<Team>(conn)
        .optional()?
    else {
        return Ok(None);
    };
    Ok(attach_members(vec![team], conn)?.pop())
}

const LIKE_ESCAPE: char = '\\';

/// A `LIKE` pattern matching `q` anywhere, with `q` taken literally. Use
/// it together with `.escape(LIKE_ESCAPE)`.
fn like_pattern(q: &str) -> String {
    let mut pattern = String::from("%");
    for c in q.trim().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Teams whose name, project name or track contains `q`, optionally
/// restricted to one track.
#[tracing::instrument(skip(conn))]
pub fn search_teams(
    q: Option<&str>,
    track: Option<&str>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Vec<TeamRecord>, diesel::result::Error> {
    let mut query = teams::table
        .order_by((teams::created_at.desc(), teams::id.desc()))
        .into_boxed();

    if let Some(q) = q.filter(|q| !q.trim().is_empty()) {
        let pattern = like_pattern(q);
        query = query.filter(
            teams::team_name
                .like(pattern.clone())
                .escape(LIKE_ESCAPE)
                .or(teams::project_name
                    .like(pattern.clone())
                    .escape(LIKE_ESCAPE))
                .or(teams::competition_track
                    .like(pattern)
                    .escape(LIKE_ESCAPE)),
        );
    }
    if let Some(track) = track.filter(|t| !t.is_empty()) {
        query = query.filter(teams::competition_track.eq(track.to_string()));
    }

    let teams = query.load::<Team>(conn)?;
    attach_members(teams, conn)
}

/// Members whose name, school, phone, e-mail, team name or tech stack
/// contains `q`.
#[tracing::instrument(skip(conn))]
pub fn search_members(
    q: Option<&str>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Vec<TeamMember>, diesel::result::Error> {
    let mut query = team_members::table
        .order_by((
            team_members::created_at.desc(),
            team_members::team_id.asc(),
            team_members::seq.asc(),
        ))
        .into_boxed();

    if let Some(q) = q.filter(|q| !q.trim().is_empty()) {
        let pattern = like_pattern(q);
        query = query.filter(
            team_members::name
                .like(pattern.clone())
                .escape(LIKE_ESCAPE)
                .or(team_members::school
                    .like(pattern.clone())
                    .escape(LIKE_ESCAPE))
                .or(team_members::phone
                    .like(pattern.clone())
                    .escape(LIKE_ESCAPE))
                .or(team_members::email
                    .like(pattern.clone())
                    .escape(LIKE_ESCAPE))
                .or(team_members::team_name
                    .like(pattern.clone())
                    .escape(LIKE_ESCAPE))
                .or(team_members::tech_stack
                    .like(pattern)
                    .escape(LIKE_ESCAPE)),
        );
    }

    query.load::<TeamMember>(conn)
}

#[cfg(test)]
mod tests {
    use diesel::{Connection, SqliteConnection};
    use diesel_migrations::MigrationHarness;

    use super::*;
    use crate::{MIGRATIONS, registration::payload::tests::payload};

    fn conn() -> SqliteConnection {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();
        conn
    }

    #[test]
    fn same_name_updates_in_place() {
        let mut conn = conn();

        let first = payload("Orbit").accept().unwrap();
        let id = save_team(&first, &mut conn).unwrap();

        let mut second = payload("Orbit");
        second.team_info.project_name = "Helper v2".to_string();
        second.members.truncate(1);
        let second = second.accept().unwrap();
        assert_eq!(save_team(&second, &mut conn).unwrap(), id);

        let teams = read_teams(&mut conn).unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].team.project_name, "Helper v2");
        assert_eq!(teams[0].members.len(), 1);
        assert_eq!(teams[0].captain().unwrap().name, "张三");
    }

    #[test]
    fn members_keep_submission_order() {
        let mut conn = conn();
        let reg = payload("Orbit").accept().unwrap();
        let id = save_team(&reg, &mut conn).unwrap();

        let team = fetch_team(&id, &mut conn).unwrap().unwrap();
        let names = team.members.iter().map(|m| m.name.as_str()).collect_vec();
        assert_eq!(names, ["张三", "李四"]);
        assert_eq!(team.members[0].member_type, "队长");

        assert!(fetch_team("nope", &mut conn).unwrap().is_none());
    }

    #[test]
    fn newest_team_first_and_search() {
        let mut conn = conn();
        save_team(&payload("Alpha").accept().unwrap(), &mut conn).unwrap();
        save_team(&payload("Beta").accept().unwrap(), &mut conn).unwrap();

        let teams = read_teams(&mut conn).unwrap();
        let names = teams.iter().map(|t| t.team.team_name.as_str()).collect_vec();
        assert_eq!(names, ["Beta", "Alpha"]);

        let found = search_teams(Some("alp"), None, &mut conn).unwrap();
        assert_eq!(found.len(), 1);
        assert!(
            search_teams(None, Some("创新应用赛"), &mut conn)
                .unwrap()
                .is_empty()
        );

        let members = search_members(Some("李四"), &mut conn).unwrap();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn wildcards_in_search_are_literal() {
        assert_eq!(like_pattern(" 50%_off\\ "), "%50\\%\\_off\\\\%");

        let mut conn = conn();
        save_team(&payload("Alpha").accept().unwrap(), &mut conn).unwrap();
        save_team(&payload("100%_Team").accept().unwrap(), &mut conn).unwrap();

        assert_eq!(search_teams(Some("%"), None, &mut conn).unwrap().len(), 1);
        assert_eq!(search_teams(Some("_"), None, &mut conn).unwrap().len(), 1);
        let found = search_teams(Some("0%_"), None, &mut conn).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].team.team_name, "100%_Team");
        assert_eq!(search_members(Some("%"), &mut conn).unwrap().len(), 2);
    }
}
