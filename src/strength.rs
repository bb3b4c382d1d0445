use std::collections::HashMap;

use serde::Serialize;

use crate::feed::MatchRecord;

/// League-wide fallbacks when the input has no finished matches yet.
pub const LEAGUE_HOME_DEFAULT: f64 = 1.55;
pub const LEAGUE_AWAY_DEFAULT: f64 = 1.25;

// Pseudo-matches blended into every per-venue rate so early-season samples
// cannot produce extreme ratios (or a zero denominator).
const SHRINK_MATCHES: f64 = 6.0;

const FORM_WINDOW: usize = 8;
const FORM_SCALE: f64 = 0.10;
const FORM_MIN: f64 = 0.90;
const FORM_MAX: f64 = 1.10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeagueAverages {
    pub home: f64,
    pub away: f64,
}

/// Attack/defense ratios relative to the league average (1.0 = average),
/// split by venue, plus a recency multiplier from the last few results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStrength {
    pub attack_home: f64,
    pub defense_home: f64,
    pub attack_away: f64,
    pub defense_away: f64,
    pub form_factor: f64,
    pub matches: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrengthModel {
    pub league: LeagueAverages,
    pub teams: HashMap<String, TeamStrength>,
}

#[derive(Debug, Default)]
struct TeamAggregate {
    home_for: u32,
    home_against: u32,
    home_n: u32,
    away_for: u32,
    away_against: u32,
    away_n: u32,
    // +1 win, 0 draw, -1 loss, in input order (assumed chronological).
    form: Vec<i8>,
}

/// Builds the season strength model from a raw match list.
///
/// Unfinished or malformed records are skipped, never an error; an empty
/// filtered set falls back to the default league averages and an empty table.
pub fn estimate_strengths(matches: &[MatchRecord]) -> StrengthModel {
    let mut teams: HashMap<String, TeamAggregate> = HashMap::new();
    let mut home_goal_sum = 0u32;
    let mut away_goal_sum = 0u32;
    let mut n = 0u32;

    for m in matches {
        if !m.qualifies() {
            continue;
        }
        let Some((hg, ag)) = m.final_score() else {
            continue;
        };
        let home = m.home.trim();
        let away = m.away.trim();

        home_goal_sum += u32::from(hg);
        away_goal_sum += u32::from(ag);
        n += 1;

        let home_sign: i8 = match hg.cmp(&ag) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Less => -1,
        };

        let th = teams.entry(home.to_string()).or_default();
        th.home_for += u32::from(hg);
        th.home_against += u32::from(ag);
        th.home_n += 1;
        th.form.push(home_sign);

        let ta = teams.entry(away.to_string()).or_default();
        ta.away_for += u32::from(ag);
        ta.away_against += u32::from(hg);
        ta.away_n += 1;
        ta.form.push(-home_sign);
    }

    let league = if n > 0 {
        LeagueAverages {
            home: f64::from(home_goal_sum) / f64::from(n),
            away: f64::from(away_goal_sum) / f64::from(n),
        }
    } else {
        LeagueAverages {
            home: LEAGUE_HOME_DEFAULT,
            away: LEAGUE_AWAY_DEFAULT,
        }
    };

    let teams = teams
        .into_iter()
        .map(|(name, agg)| (name, team_strength(&agg, league)))
        .collect();

    StrengthModel { league, teams }
}

fn team_strength(agg: &TeamAggregate, league: LeagueAverages) -> TeamStrength {
    let home_for_pg = shrunk_rate(agg.home_for, agg.home_n, league.home);
    let home_against_pg = shrunk_rate(agg.home_against, agg.home_n, league.away);
    let away_for_pg = shrunk_rate(agg.away_for, agg.away_n, league.away);
    let away_against_pg = shrunk_rate(agg.away_against, agg.away_n, league.home);

    TeamStrength {
        attack_home: home_for_pg / league.home,
        defense_home: home_against_pg / league.away,
        attack_away: away_for_pg / league.away,
        defense_away: away_against_pg / league.home,
        form_factor: form_factor(&agg.form),
        matches: agg.home_n + agg.away_n,
    }
}

fn shrunk_rate(observed_sum: u32, observed_n: u32, league_mean: f64) -> f64 {
    (f64::from(observed_sum) + SHRINK_MATCHES * league_mean)
        / (f64::from(observed_n) + SHRINK_MATCHES)
}

fn form_factor(form: &[i8]) -> f64 {
    let recent = &form[form.len().saturating_sub(FORM_WINDOW)..];
    if recent.is_empty() {
        return 1.0;
    }
    let raw = recent.iter().map(|&s| f64::from(s)).sum::<f64>() / recent.len() as f64;
    (1.0 + FORM_SCALE * raw).clamp(FORM_MIN, FORM_MAX)
}
