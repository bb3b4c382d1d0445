use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One match as supplied by the season feed, normalized to the fields the
/// model cares about. Goals are `None` until a final score is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub match_id: Option<u64>,
    pub home: String,
    pub away: String,
    pub home_goals: Option<u8>,
    pub away_goals: Option<u8>,
    pub finished: bool,
    pub kickoff_utc: Option<DateTime<Utc>>,
    pub group: Option<String>,
}

impl MatchRecord {
    /// Final score, present only once the feed reported one.
    pub fn final_score(&self) -> Option<(u8, u8)> {
        match (self.home_goals, self.away_goals) {
            (Some(hg), Some(ag)) => Some((hg, ag)),
            _ => None,
        }
    }

    /// Whether this record participates in strength estimation.
    pub fn qualifies(&self) -> bool {
        self.finished
            && self.final_score().is_some()
            && !self.home.trim().is_empty()
            && !self.away.trim().is_empty()
    }
}

/// Parses an OpenLigaDB `getmatchdata` season body into match records.
///
/// Malformed entries are skipped rather than failing the whole document; an
/// empty or `"null"` body parses to an empty list.
pub fn parse_openliga_matches_json(raw: &str) -> Result<Vec<MatchRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid openligadb json")?;
    let Some(arr) = v.as_array() else {
        return Ok(Vec::new());
    };
    Ok(arr.iter().filter_map(parse_match).collect())
}

fn parse_match(v: &Value) -> Option<MatchRecord> {
    let home = team_name(v.get("team1")?);
    let away = team_name(v.get("team2")?);
    if home.is_empty() || away.is_empty() {
        return None;
    }

    let match_id = v.get("matchID").and_then(|x| x.as_u64());
    let finished = v
        .get("matchIsFinished")
        .and_then(|x| x.as_bool())
        .unwrap_or(false);

    let (home_goals, away_goals) = match final_result(v) {
        Some((hg, ag)) => (Some(hg), Some(ag)),
        None => (None, None),
    };

    let kickoff_utc = v
        .get("matchDateTimeUTC")
        .and_then(|x| x.as_str())
        .and_then(parse_utc)
        .or_else(|| {
            v.get("matchDateTime")
                .and_then(|x| x.as_str())
                .and_then(parse_naive)
        });

    let group = v
        .get("group")
        .and_then(|g| g.get("groupName"))
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Some(MatchRecord {
        match_id,
        home,
        away,
        home_goals,
        away_goals,
        finished,
        kickoff_utc,
        group,
    })
}

fn team_name(team: &Value) -> String {
    let name = team
        .get("teamName")
        .and_then(|x| x.as_str())
        .map(str::trim)
        .unwrap_or_default();
    if !name.is_empty() {
        return name.to_string();
    }
    team.get("shortName")
        .and_then(|x| x.as_str())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

// OpenLigaDB lists intermediate results too; the last entry is the final score.
fn final_result(v: &Value) -> Option<(u8, u8)> {
    let results = v.get("matchResults")?.as_array()?;
    let last = results.last()?;
    let hg = last.get("pointsTeam1")?.as_u64()?;
    let ag = last.get("pointsTeam2")?.as_u64()?;
    Some((u8::try_from(hg).ok()?, u8::try_from(ag).ok()?))
}

fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

// `matchDateTime` carries no offset; treat it as UTC rather than dropping it.
fn parse_naive(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}
