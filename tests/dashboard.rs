use std::fs;
use std::path::PathBuf;

use bl1_predictor::dashboard::{build_rows, current_matchday};
use bl1_predictor::feed::parse_openliga_matches_json;
use bl1_predictor::markets::TOP_SCORES_DEFAULT;
use bl1_predictor::predict::{MAX_GOALS_DEFAULT, Outcome};
use bl1_predictor::strength::estimate_strengths;

fn fixture_records() -> Vec<bl1_predictor::feed::MatchRecord> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("openliga_matches.json");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    parse_openliga_matches_json(&raw).expect("fixture should parse")
}

#[test]
fn current_matchday_is_the_first_open_group() {
    let records = fixture_records();
    let day = current_matchday(&records);
    assert!(!day.is_empty());
    assert!(day.iter().all(|m| m.group.as_deref() == Some("4. Spieltag")));
    // Kickoff order.
    assert_eq!(day[0].home, "SV Neustadt");
}

#[test]
fn upcoming_rows_carry_predictions_and_nerd_stats() {
    let records = fixture_records();
    let model = estimate_strengths(&records);
    let day = current_matchday(&records);
    let rows = build_rows(&model, &day, MAX_GOALS_DEFAULT, TOP_SCORES_DEFAULT);

    assert_eq!(rows.len(), day.len());
    for row in &rows {
        let pred = row.pred.as_ref().expect("all matchday-4 teams in model");
        let sum = pred.p.home + pred.p.draw + pred.p.away;
        assert!((sum - 1.0).abs() < 1e-9);

        let nerd = row.nerd.as_ref().expect("nerd stats for ok predictions");
        assert_eq!(nerd.top_scores.len(), TOP_SCORES_DEFAULT);
        assert!((nerd.over_pct + nerd.under_pct - 100.0).abs() <= 0.1);
        assert!((nerd.btts_yes_pct + nerd.btts_no_pct - 100.0).abs() <= 0.1);
        assert!((0.0..=1.0).contains(&nerd.confidence));

        // Unfinished fixtures never get a correctness tag.
        assert!(row.correctness.is_none());
    }
}

#[test]
fn finished_rows_are_scored_against_the_result() {
    let records = fixture_records();
    let model = estimate_strengths(&records);
    let finished: Vec<_> = records.iter().filter(|m| m.qualifies()).cloned().collect();
    let rows = build_rows(&model, &finished, MAX_GOALS_DEFAULT, TOP_SCORES_DEFAULT);

    for row in &rows {
        let c = row.correctness.expect("finished fixtures get scored");
        let pred = row.pred.as_ref().expect("teams in model");
        assert_eq!(c.pick, pred.p.top_pick());
        assert_eq!(c.correct, c.pick == c.actual);
        assert!(row.score.is_some());
    }

    // 2:1 on matchday 1 was a home win.
    let opener = rows
        .iter()
        .find(|r| r.home == "FC Altstadt" && r.away == "SV Neustadt")
        .expect("opener present");
    assert_eq!(opener.correctness.unwrap().actual, Outcome::Home);
}

#[test]
fn unknown_team_rows_degrade_without_nerd_stats() {
    let records = fixture_records();
    let model = estimate_strengths(&records);
    let ghost: Vec<_> = records
        .iter()
        .filter(|m| m.away == "1. FC Test")
        .cloned()
        .collect();
    assert_eq!(ghost.len(), 1);

    let rows = build_rows(&model, &ghost, MAX_GOALS_DEFAULT, TOP_SCORES_DEFAULT);
    let row = &rows[0];
    let err = row.pred.as_ref().unwrap_err();
    assert_eq!(err.home_team, "FC Altstadt");
    assert_eq!(err.away_team, "1. FC Test");
    assert!(row.nerd.is_none());
    assert!(row.correctness.is_none());
}
