use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};

use bl1_predictor::dashboard::{self, DashboardRow};
use bl1_predictor::fake_feed;
use bl1_predictor::feed::{self, MatchRecord};
use bl1_predictor::markets::{
    MATRIX_MAX_GOALS, TOP_SCORES_DEFAULT, confidence, derived_markets, score_matrix,
    top_scorelines, ConfidenceLabel,
};
use bl1_predictor::predict::{MAX_GOALS_DEFAULT, pct, predict_three_way};
use bl1_predictor::strength::estimate_strengths;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(source) = args.first() else {
        print_usage();
        return Ok(ExitCode::FAILURE);
    };

    let records = load_records(source)?;
    let model = estimate_strengths(&records);

    let max_goals = env_parse("MAX_GOALS", MAX_GOALS_DEFAULT).clamp(4, 12);
    let top_k = env_parse("TOP_SCORES", TOP_SCORES_DEFAULT).clamp(1, 15);

    match args.len() {
        1 => {
            let matchday = dashboard::current_matchday(&records);
            let rows = dashboard::build_rows(&model, &matchday, max_goals, top_k);
            print_dashboard(&rows, model.teams.len());
            Ok(ExitCode::SUCCESS)
        }
        3 => {
            let home = args[1].trim();
            let away = args[2].trim();
            // Caller-side validation; the model itself never sees blank names.
            if home.is_empty() || away.is_empty() {
                bail!("MISSING_PARAMS: need non-empty home and away team names");
            }
            match predict_three_way(&model, home, away, max_goals) {
                Ok(pred) => {
                    print_prediction(&pred, top_k);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    // Expected for teams outside this season; not a crash.
                    eprintln!("{err}");
                    Ok(ExitCode::from(2))
                }
            }
        }
        _ => {
            print_usage();
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_records(source: &str) -> Result<Vec<MatchRecord>> {
    if source == "--fake" {
        let seed = env_parse("FAKE_SEED", 1u64);
        let played = env_parse("FAKE_PLAYED", 22u32).min(34);
        return Ok(fake_feed::generate_season(seed, played));
    }
    let raw = fs::read_to_string(source).with_context(|| format!("read {source}"))?;
    feed::parse_openliga_matches_json(&raw).with_context(|| format!("parse {source}"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn print_prediction(pred: &bl1_predictor::predict::Prediction, top_k: usize) {
    let p = pred.p.pct();
    println!("{} vs {}", pred.home_team, pred.away_team);
    println!(
        "  expected goals  {:.2} : {:.2}",
        pred.lambda_home, pred.lambda_away
    );
    println!(
        "  1X2             H {:.1}%  D {:.1}%  A {:.1}%",
        p.home, p.draw, p.away
    );

    let matrix = score_matrix(pred.lambda_home, pred.lambda_away, MATRIX_MAX_GOALS);
    let mk = derived_markets(&matrix);
    let conf = confidence(&pred.p);
    println!(
        "  over/under 2.5  {:.1}% / {:.1}%   btts {:.1}% / {:.1}%",
        pct(mk.over25),
        pct(mk.under25),
        pct(mk.btts_yes),
        pct(mk.btts_no)
    );
    println!(
        "  confidence      {:.0}% ({})",
        conf * 100.0,
        ConfidenceLabel::from_value(conf).as_str()
    );
    println!("  likely scores:");
    for cell in top_scorelines(&matrix, top_k) {
        println!(
            "    {}:{}  {:.1}%",
            cell.home_goals,
            cell.away_goals,
            pct(cell.p)
        );
    }
}

fn print_dashboard(rows: &[DashboardRow], teams_in_model: usize) {
    if let Some(group) = rows.iter().find_map(|r| r.group.as_deref()) {
        println!("{group}  ({teams_in_model} teams in model)");
    }
    for row in rows {
        let when = row
            .kickoff_utc
            .map(|t| t.format("%a %H:%M").to_string())
            .unwrap_or_else(|| "tbd".to_string());
        match (&row.pred, &row.nerd) {
            (Ok(pred), Some(nerd)) => {
                let p = pred.p.pct();
                let tip = nerd
                    .top_scores
                    .first()
                    .map(|s| s.score.clone())
                    .unwrap_or_default();
                let tail = match &row.correctness {
                    Some(c) if c.correct => format!("  [{} ✓]", row.score.as_deref().unwrap_or("")),
                    Some(_) => format!("  [{} ✗]", row.score.as_deref().unwrap_or("")),
                    None => String::new(),
                };
                println!(
                    "  {when}  {:<28} - {:<28} H {:>5.1}% D {:>5.1}% A {:>5.1}%  tip {tip} ({}){tail}",
                    row.home,
                    row.away,
                    p.home,
                    p.draw,
                    p.away,
                    nerd.confidence_label.as_str(),
                );
            }
            _ => {
                println!(
                    "  {when}  {:<28} - {:<28} no model (team not in season data)",
                    row.home, row.away
                );
            }
        }
    }
}

fn print_usage() {
    eprintln!("usage: bl1_predictor <season.json>            matchday dashboard");
    eprintln!("       bl1_predictor <season.json> HOME AWAY  single prediction");
    eprintln!("       bl1_predictor --fake [HOME AWAY]       synthetic season");
    eprintln!();
    eprintln!("env: MAX_GOALS, TOP_SCORES, FAKE_SEED, FAKE_PLAYED");
}
