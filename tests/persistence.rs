use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::tempdir;

use quizzle::app::App;
use quizzle::best_scores::{BestScoreStore, SqliteBestScores};
use quizzle::config::{Config, ConfigStore, FileConfigStore};
use quizzle::games::ArithmeticSource;
use quizzle::history::HistoryLog;
use quizzle::{Difficulty, DifficultyProfile, GameKind, Status};

fn press(app: &mut App<ArithmeticSource>, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

/// Plays one single-round session; answers correctly when `win` is set
fn play(db: &std::path::Path, log: &HistoryLog, seed: u64, win: bool) -> App<ArithmeticSource> {
    let profile = DifficultyProfile::preset(Difficulty::Hard).with_max_rounds(Some(1));
    let mut app = App::new(ArithmeticSource::seeded(seed), profile)
        .with_best_scores(Box::new(SqliteBestScores::open(db).unwrap()))
        .with_history(log.clone());
    app.start().unwrap();

    if win {
        let answer = app.machine().challenge().unwrap().answer;
        for c in answer.to_string().chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
    } else {
        app.on_tick(Duration::from_secs(60));
    }
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.machine().status(), Status::Complete);
    app
}

#[test]
fn best_score_survives_restarts_and_only_improves() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("state").join("best_scores.db");
    let log = HistoryLog::with_path(dir.path().join("state").join("history.csv"));

    let first = play(&db, &log, 1, true);
    let winning = first.machine().snapshot().score;
    assert!(winning > 0);
    assert!(first.is_new_best());
    drop(first);

    let second = play(&db, &log, 2, false);
    assert_eq!(second.best(), Some(winning));
    assert!(!second.is_new_best());
    drop(second);

    let store = SqliteBestScores::open(&db).unwrap();
    assert_eq!(store.best("arithmetic", Difficulty::Hard).unwrap(), Some(winning));
    assert_eq!(store.best("arithmetic", Difficulty::Easy).unwrap(), None);

    let entries = log.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].score, winning);
    assert_eq!(entries[1].score, 0);
    assert!(entries.iter().all(|e| e.game == "arithmetic" && e.difficulty == Difficulty::Hard));
}

#[test]
fn saved_defaults_feed_the_next_profile() {
    let dir = tempdir().unwrap();
    let store = FileConfigStore::with_path(dir.path().join("config.json"));
    store
        .save(&Config {
            game: GameKind::Words,
            difficulty: Difficulty::Hard,
            rounds: Some(4),
            seconds: None,
            hints: Some(0),
            save_scores: true,
        })
        .unwrap();

    let profile = store.load().to_profile();
    assert_eq!(profile.difficulty, Difficulty::Hard);
    assert_eq!(profile.max_rounds, Some(4));
    assert_eq!(profile.hint_budget, 0);
    assert_eq!(
        profile.time_budget,
        DifficultyProfile::preset(Difficulty::Hard).time_budget
    );
    assert!(profile.validate().is_ok());
}
