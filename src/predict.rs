use serde::Serialize;
use thiserror::Error;

use crate::strength::StrengthModel;

pub const MAX_GOALS_DEFAULT: u8 = 8;

// Expected-goal clamps. The home band is wider than the away band because the
// source data carries a structural home advantage.
const LAMBDA_HOME_MIN: f64 = 0.2;
const LAMBDA_HOME_MAX: f64 = 3.8;
const LAMBDA_AWAY_MIN: f64 = 0.2;
const LAMBDA_AWAY_MAX: f64 = 3.3;

/// The only core-level failure: one of the requested teams has no strength
/// profile (promoted team, typo, wrong season). Both names are echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("TEAM_NOT_FOUND: {home_team} vs {away_team}")]
pub struct TeamNotFound {
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub fn from_score(home_goals: u8, away_goals: u8) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => Outcome::Home,
            std::cmp::Ordering::Equal => Outcome::Draw,
            std::cmp::Ordering::Less => Outcome::Away,
        }
    }
}

/// Normalized 3-way probabilities; always sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThreeWay {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl ThreeWay {
    /// Percent view rounded to the nearest tenth, for display.
    pub fn pct(&self) -> ThreeWayPct {
        ThreeWayPct {
            home: pct(self.home),
            draw: pct(self.draw),
            away: pct(self.away),
        }
    }

    /// Most likely outcome; ties favor home, then draw.
    pub fn top_pick(&self) -> Outcome {
        if self.home >= self.draw && self.home >= self.away {
            Outcome::Home
        } else if self.draw >= self.away {
            Outcome::Draw
        } else {
            Outcome::Away
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThreeWayPct {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub home_team: String,
    pub away_team: String,
    pub lambda_home: f64,
    pub lambda_away: f64,
    pub p: ThreeWay,
}

/// Predicts the 3-way outcome for one fixture from the season model.
///
/// Expected goals cross home attack with away defense (and vice versa),
/// scaled by each side's form; the joint score distribution is two
/// independent Poissons truncated at `max_goals`, with the truncation
/// residual folded away by normalizing the three buckets.
pub fn predict_three_way(
    model: &StrengthModel,
    home_team: &str,
    away_team: &str,
    max_goals: u8,
) -> Result<Prediction, TeamNotFound> {
    let (Some(h), Some(a)) = (
        model.teams.get(home_team.trim()),
        model.teams.get(away_team.trim()),
    ) else {
        return Err(TeamNotFound {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
        });
    };

    let lambda_home = (model.league.home * h.attack_home * a.defense_away * h.form_factor)
        .clamp(LAMBDA_HOME_MIN, LAMBDA_HOME_MAX);
    let lambda_away = (model.league.away * a.attack_away * h.defense_home * a.form_factor)
        .clamp(LAMBDA_AWAY_MIN, LAMBDA_AWAY_MAX);

    let pmf_h = poisson_pmf(lambda_home, max_goals);
    let pmf_a = poisson_pmf(lambda_away, max_goals);

    let mut p_home = 0.0;
    let mut p_draw = 0.0;
    let mut p_away = 0.0;
    for (hg, ph) in pmf_h.iter().enumerate() {
        for (ag, pa) in pmf_a.iter().enumerate() {
            let p = ph * pa;
            if hg > ag {
                p_home += p;
            } else if hg == ag {
                p_draw += p;
            } else {
                p_away += p;
            }
        }
    }

    let sum = p_home + p_draw + p_away;
    let p = if sum > 0.0 {
        ThreeWay {
            home: p_home / sum,
            draw: p_draw / sum,
            away: p_away / sum,
        }
    } else {
        ThreeWay {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    };

    Ok(Prediction {
        home_team: home_team.trim().to_string(),
        away_team: away_team.trim().to_string(),
        lambda_home,
        lambda_away,
        p,
    })
}

/// Poisson pmf for k in 0..=max_k, via the multiplicative recurrence.
pub(crate) fn poisson_pmf(lambda: f64, max_k: u8) -> Vec<f64> {
    let max_k = max_k as usize;
    let lambda = lambda.max(0.0);
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

/// Rounds a probability to a percentage with one decimal place.
pub fn pct(p: f64) -> f64 {
    (p * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strength::{LeagueAverages, StrengthModel, TeamStrength};
    use std::collections::HashMap;

    fn neutral(form_factor: f64) -> TeamStrength {
        TeamStrength {
            attack_home: 1.0,
            defense_home: 1.0,
            attack_away: 1.0,
            defense_away: 1.0,
            form_factor,
            matches: 10,
        }
    }

    fn model_with(teams: Vec<(&str, TeamStrength)>) -> StrengthModel {
        StrengthModel {
            league: LeagueAverages { home: 1.55, away: 1.25 },
            teams: teams
                .into_iter()
                .map(|(n, t)| (n.to_string(), t))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let model = model_with(vec![("H", neutral(1.0)), ("A", neutral(1.0))]);
        let p = predict_three_way(&model, "H", "A", MAX_GOALS_DEFAULT).unwrap();
        let sum = p.p.home + p.p.draw + p.p.away;
        assert!((sum - 1.0).abs() < 1e-9);
        for v in [p.p.home, p.p.draw, p.p.away] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn neutral_teams_favor_home() {
        let model = model_with(vec![("H", neutral(1.0)), ("A", neutral(1.0))]);
        let p = predict_three_way(&model, "H", "A", MAX_GOALS_DEFAULT).unwrap();
        assert!(p.lambda_home > p.lambda_away);
        assert!(p.p.home > p.p.away);
    }

    #[test]
    fn missing_team_echoes_both_names() {
        let model = model_with(vec![("H", neutral(1.0))]);
        let err = predict_three_way(&model, "H", "Nope FC", MAX_GOALS_DEFAULT).unwrap_err();
        assert_eq!(err.home_team, "H");
        assert_eq!(err.away_team, "Nope FC");

        let err = predict_three_way(&model, "Ghost", "H", MAX_GOALS_DEFAULT).unwrap_err();
        assert_eq!(err.home_team, "Ghost");
    }

    #[test]
    fn lookup_trims_but_is_case_sensitive() {
        let model = model_with(vec![("H", neutral(1.0)), ("A", neutral(1.0))]);
        assert!(predict_three_way(&model, " H ", "A", 8).is_ok());
        assert!(predict_three_way(&model, "h", "A", 8).is_err());
    }

    #[test]
    fn lambdas_are_clamped() {
        let mut monster = neutral(1.1);
        monster.attack_home = 50.0;
        monster.attack_away = 50.0;
        let mut sieve = neutral(1.0);
        sieve.defense_home = 50.0;
        sieve.defense_away = 50.0;
        let model = model_with(vec![("M", monster), ("S", sieve)]);

        let p = predict_three_way(&model, "M", "S", MAX_GOALS_DEFAULT).unwrap();
        assert_eq!(p.lambda_home, 3.8);
        assert_eq!(p.lambda_away, 3.3);

        let mut shy = neutral(0.9);
        shy.attack_home = 0.001;
        shy.attack_away = 0.001;
        let mut wall = neutral(1.0);
        wall.defense_home = 0.001;
        wall.defense_away = 0.001;
        let model = model_with(vec![("M", shy), ("S", wall)]);
        let p = predict_three_way(&model, "M", "S", MAX_GOALS_DEFAULT).unwrap();
        assert_eq!(p.lambda_home, 0.2);
        assert_eq!(p.lambda_away, 0.2);
    }

    #[test]
    fn form_factor_moves_lambda() {
        let model = model_with(vec![("H", neutral(1.10)), ("A", neutral(1.0))]);
        let hot = predict_three_way(&model, "H", "A", 8).unwrap();
        let model = model_with(vec![("H", neutral(0.90)), ("A", neutral(1.0))]);
        let cold = predict_three_way(&model, "H", "A", 8).unwrap();
        assert!(hot.lambda_home > cold.lambda_home);
    }

    #[test]
    fn pmf_recurrence_matches_closed_form() {
        let pmf = poisson_pmf(1.7, 8);
        // P(3; 1.7) = 1.7^3 e^-1.7 / 6
        let expected = 1.7f64.powi(3) * (-1.7f64).exp() / 6.0;
        assert!((pmf[3] - expected).abs() < 1e-12);
        assert!(pmf.iter().sum::<f64>() <= 1.0 + 1e-12);
    }

    #[test]
    fn top_pick_ties_favor_home_then_draw() {
        let even = ThreeWay { home: 1.0 / 3.0, draw: 1.0 / 3.0, away: 1.0 / 3.0 };
        assert_eq!(even.top_pick(), Outcome::Home);
        let drawish = ThreeWay { home: 0.2, draw: 0.4, away: 0.4 };
        assert_eq!(drawish.top_pick(), Outcome::Draw);
        let awayish = ThreeWay { home: 0.2, draw: 0.3, away: 0.5 };
        assert_eq!(awayish.top_pick(), Outcome::Away);
    }

    #[test]
    fn pct_rounds_to_tenths() {
        assert_eq!(pct(0.33333), 33.3);
        assert_eq!(pct(0.005), 0.5);
        assert_eq!(pct(1.0), 100.0);
    }
}
