use serde::Serialize;

use crate::predict::{ThreeWay, poisson_pmf};

/// Score grids for derived markets are capped lower than the 3-way grid;
/// scorelines beyond 6 goals a side carry no displayable mass.
pub const MATRIX_MAX_GOALS: u8 = 6;
pub const TOP_SCORES_DEFAULT: usize = 5;

const CONFIDENCE_HIGH: f64 = 0.55;
const CONFIDENCE_MEDIUM: f64 = 0.35;
const ENTROPY_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreCell {
    pub home_goals: u8,
    pub away_goals: u8,
    pub p: f64,
}

/// Joint score distribution over the capped grid, normalized to sum to 1.
/// Cells come back in enumeration order (home goals ascending, then away).
pub fn score_matrix(lambda_home: f64, lambda_away: f64, max_goals: u8) -> Vec<ScoreCell> {
    let pmf_h = poisson_pmf(lambda_home, max_goals);
    let pmf_a = poisson_pmf(lambda_away, max_goals);

    let mut cells = Vec::with_capacity(pmf_h.len() * pmf_a.len());
    for (hg, ph) in pmf_h.iter().enumerate() {
        for (ag, pa) in pmf_a.iter().enumerate() {
            cells.push(ScoreCell {
                home_goals: hg as u8,
                away_goals: ag as u8,
                p: ph * pa,
            });
        }
    }

    let sum: f64 = cells.iter().map(|c| c.p).sum();
    if sum > 0.0 {
        for c in &mut cells {
            c.p /= sum;
        }
    }
    cells
}

/// The `k` most likely exact scorelines, probability descending. Equal
/// probabilities fall back to enumeration order (ascending home goals, then
/// ascending away goals) so the result is deterministic.
pub fn top_scorelines(matrix: &[ScoreCell], k: usize) -> Vec<ScoreCell> {
    let mut sorted = matrix.to_vec();
    sorted.sort_by(|a, b| {
        b.p.total_cmp(&a.p)
            .then(a.home_goals.cmp(&b.home_goals))
            .then(a.away_goals.cmp(&b.away_goals))
    });
    sorted.truncate(k);
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Markets {
    pub over25: f64,
    pub under25: f64,
    pub btts_yes: f64,
    pub btts_no: f64,
}

/// Over/under 2.5 total goals and both-teams-to-score, summed from the
/// normalized score matrix.
pub fn derived_markets(matrix: &[ScoreCell]) -> Markets {
    let mut over25 = 0.0;
    let mut btts = 0.0;
    for c in matrix {
        if u16::from(c.home_goals) + u16::from(c.away_goals) >= 3 {
            over25 += c.p;
        }
        if c.home_goals >= 1 && c.away_goals >= 1 {
            btts += c.p;
        }
    }
    Markets {
        over25,
        under25: 1.0 - over25,
        btts_yes: btts,
        btts_no: 1.0 - btts,
    }
}

/// One minus the normalized Shannon entropy of the 3-way triple: 0 for a
/// uniform triple, approaching 1 as one outcome dominates.
pub fn confidence(p: &ThreeWay) -> f64 {
    let ps = [p.home, p.draw, p.away].map(|x| x.max(ENTROPY_EPS));
    let h: f64 = -ps.iter().map(|x| x * x.ln()).sum::<f64>();
    (1.0 - h / 3.0f64.ln()).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

impl ConfidenceLabel {
    pub fn from_value(confidence: f64) -> Self {
        if confidence >= CONFIDENCE_HIGH {
            ConfidenceLabel::High
        } else if confidence >= CONFIDENCE_MEDIUM {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLabel::High => "high",
            ConfidenceLabel::Medium => "medium",
            ConfidenceLabel::Low => "low",
        }
    }
}
