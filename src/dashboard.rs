use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::feed::MatchRecord;
use crate::markets::{
    ConfidenceLabel, MATRIX_MAX_GOALS, confidence, derived_markets, score_matrix, top_scorelines,
};
use crate::predict::{Outcome, Prediction, TeamNotFound, pct, predict_three_way};
use crate::strength::StrengthModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreLine {
    pub score: String,
    pub p: f64,
    pub pct: f64,
}

/// The "nerd" block: exact scorelines and derived markets for one fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NerdStats {
    pub top_scores: Vec<ScoreLine>,
    pub over_pct: f64,
    pub under_pct: f64,
    pub btts_yes_pct: f64,
    pub btts_no_pct: f64,
    pub confidence: f64,
    pub confidence_pct: u8,
    pub confidence_label: ConfidenceLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Correctness {
    pub pick: Outcome,
    pub actual: Outcome,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    pub home: String,
    pub away: String,
    pub kickoff_utc: Option<DateTime<Utc>>,
    pub group: Option<String>,
    pub finished: bool,
    pub score: Option<String>,
    pub pred: Result<Prediction, TeamNotFound>,
    pub nerd: Option<NerdStats>,
    pub correctness: Option<Correctness>,
}

/// Builds one dashboard row per fixture. Rows keep the input order; sorting
/// belongs to the fixture selection (`current_matchday`).
pub fn build_rows(
    model: &StrengthModel,
    fixtures: &[MatchRecord],
    max_goals: u8,
    top_k: usize,
) -> Vec<DashboardRow> {
    fixtures
        .par_iter()
        .map(|m| build_row(model, m, max_goals, top_k))
        .collect()
}

fn build_row(
    model: &StrengthModel,
    fixture: &MatchRecord,
    max_goals: u8,
    top_k: usize,
) -> DashboardRow {
    let pred = predict_three_way(model, &fixture.home, &fixture.away, max_goals);

    let nerd = pred.as_ref().ok().map(|p| nerd_stats(p, top_k));

    let correctness = match (&pred, fixture.finished, fixture.final_score()) {
        (Ok(p), true, Some((hg, ag))) => {
            let pick = p.p.top_pick();
            let actual = Outcome::from_score(hg, ag);
            Some(Correctness {
                pick,
                actual,
                correct: pick == actual,
            })
        }
        _ => None,
    };

    DashboardRow {
        home: fixture.home.clone(),
        away: fixture.away.clone(),
        kickoff_utc: fixture.kickoff_utc,
        group: fixture.group.clone(),
        finished: fixture.finished,
        score: fixture.final_score().map(|(hg, ag)| format!("{hg}:{ag}")),
        pred,
        nerd,
        correctness,
    }
}

fn nerd_stats(pred: &Prediction, top_k: usize) -> NerdStats {
    let matrix = score_matrix(pred.lambda_home, pred.lambda_away, MATRIX_MAX_GOALS);
    let top_scores = top_scorelines(&matrix, top_k)
        .into_iter()
        .map(|c| ScoreLine {
            score: format!("{}:{}", c.home_goals, c.away_goals),
            p: c.p,
            pct: pct(c.p),
        })
        .collect();
    let mk = derived_markets(&matrix);
    let conf = confidence(&pred.p);

    NerdStats {
        top_scores,
        over_pct: pct(mk.over25),
        under_pct: pct(mk.under25),
        btts_yes_pct: pct(mk.btts_yes),
        btts_no_pct: pct(mk.btts_no),
        confidence: conf,
        confidence_pct: (conf * 100.0).round() as u8,
        confidence_label: ConfidenceLabel::from_value(conf),
    }
}

/// Picks the matchday to show: the first group (in input order) that still
/// has an unfinished fixture, or the last group once the season is done.
/// Fixtures come back kickoff-sorted, unknown kickoffs last.
pub fn current_matchday(records: &[MatchRecord]) -> Vec<MatchRecord> {
    let group = records
        .iter()
        .find(|m| !m.finished)
        .and_then(|m| m.group.clone())
        .or_else(|| records.last().and_then(|m| m.group.clone()));

    let mut out: Vec<MatchRecord> = match &group {
        Some(g) => records
            .iter()
            .filter(|m| m.group.as_deref() == Some(g.as_str()))
            .cloned()
            .collect(),
        // Feed without matchday groups: show everything.
        None => records.to_vec(),
    };

    out.sort_by(|a, b| kickoff_key(a).cmp(&kickoff_key(b)).then(a.home.cmp(&b.home)));
    out
}

fn kickoff_key(m: &MatchRecord) -> i64 {
    m.kickoff_utc.map(|t| t.timestamp()).unwrap_or(i64::MAX)
}
