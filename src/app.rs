use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tracing::{info, warn};

use crate::best_scores::BestScoreStore;
use crate::clock::Countdown;
use crate::history::{HistoryEntry, HistoryLog};
use crate::machine::{PresentationSink, RoundStateMachine};
use crate::problem::ProblemSource;
use crate::profile::{DifficultyProfile, ProfileError};
use crate::session::{SessionSnapshot, Status};
use crate::summary::SessionSummary;

/// Presentation sink for the terminal: remembers the latest transition
#[derive(Debug, Clone)]
pub struct Screen {
    last: SessionSnapshot,
    transitions: u64,
    seen: u64,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            last: SessionSnapshot::idle(),
            transitions: 0,
            seen: 0,
        }
    }
}

impl Screen {
    pub fn last(&self) -> &SessionSnapshot {
        &self.last
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// The latest snapshot, if it arrived after the previous call
    fn take_changed(&mut self) -> Option<SessionSnapshot> {
        if self.seen == self.transitions {
            return None;
        }
        self.seen = self.transitions;
        Some(self.last.clone())
    }
}

impl PresentationSink for Screen {
    fn on_transition(&mut self, snapshot: &SessionSnapshot) {
        self.last = snapshot.clone();
        self.transitions += 1;
    }
}

/// Terminal front end state around one round state machine
pub struct App<S: ProblemSource> {
    machine: RoundStateMachine<S, Countdown, Screen>,
    profile: DifficultyProfile,
    input: String,
    hint: Option<String>,
    notice: Option<String>,
    best: Option<u64>,
    new_best: bool,
    scores: Option<Box<dyn BestScoreStore>>,
    history: Option<HistoryLog>,
    summary: Option<SessionSummary>,
    recorded: bool,
    round_shown: u32,
    should_quit: bool,
}

impl<S: ProblemSource> App<S> {
    pub fn new(source: S, profile: DifficultyProfile) -> Self {
        Self {
            machine: RoundStateMachine::with_sink(source, Screen::default()),
            profile,
            input: String::new(),
            hint: None,
            notice: None,
            best: None,
            new_best: false,
            scores: None,
            history: None,
            summary: None,
            recorded: false,
            round_shown: 0,
            should_quit: false,
        }
    }

    pub fn with_best_scores(mut self, store: Box<dyn BestScoreStore>) -> Self {
        self.scores = Some(store);
        self
    }

    pub fn with_history(mut self, log: HistoryLog) -> Self {
        self.history = Some(log);
        self
    }

    /// Begin a new session with the app's profile
    pub fn start(&mut self) -> Result<(), ProfileError> {
        self.machine.start(self.profile.clone())?;
        self.input.clear();
        self.hint = None;
        self.notice = None;
        self.summary = None;
        self.new_best = false;
        self.recorded = false;
        self.best = self.load_best();
        self.sync();
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match self.machine.status() {
            Status::Active => match key.code {
                KeyCode::Enter => self.submit(),
                KeyCode::Tab => self.hint(),
                KeyCode::Esc => {
                    self.machine.pause();
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => {
                    self.notice = None;
                    self.input.push(c);
                }
                _ => {}
            },
            Status::Feedback => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.machine.advance();
                }
                KeyCode::Esc => {
                    self.machine.pause();
                }
                _ => {}
            },
            Status::Paused => {
                if key.code == KeyCode::Esc {
                    self.machine.resume();
                }
            }
            status @ (Status::Complete | Status::Idle) => match key.code {
                // enter only starts from idle so a double press cannot skip the results
                KeyCode::Enter if status == Status::Complete => {}
                KeyCode::Char('r') | KeyCode::Enter => {
                    if let Err(err) = self.start() {
                        self.notice = Some(err.to_string());
                    }
                }
                KeyCode::Char('q') | KeyCode::Esc => self.quit(),
                _ => {}
            },
        }
        self.sync();
    }

    /// Drive the round clock by `elapsed` wall time
    pub fn on_tick(&mut self, elapsed: Duration) {
        if self.machine.tick(elapsed).is_some() {
            self.sync();
        }
    }

    fn submit(&mut self) {
        let submitted = self
            .machine
            .submit_input(&self.input)
            .map_err(|raw| raw.trim().to_string());
        match submitted {
            Ok(_) => self.input.clear(),
            Err(raw) if raw.is_empty() => self.notice = Some("type an answer first".to_string()),
            Err(raw) => self.notice = Some(format!("\"{raw}\" is not a valid answer")),
        }
    }

    fn hint(&mut self) {
        match self.machine.use_hint() {
            Some(hint) => self.hint = Some(hint),
            None => self.notice = Some("no hint available".to_string()),
        }
    }

    fn quit(&mut self) {
        if let Some(last) = self.machine.exit() {
            info!(score = last.score, "quit mid-session");
        }
        self.should_quit = true;
    }

    /// React to whatever the machine reported since the last call
    fn sync(&mut self) {
        let Some(snapshot) = self.machine.sink_mut().take_changed() else {
            return;
        };
        if snapshot.round_index != self.round_shown {
            self.round_shown = snapshot.round_index;
            self.input.clear();
            self.hint = None;
            self.notice = None;
        }
        if snapshot.status == Status::Complete {
            self.record_completion();
        }
    }

    fn load_best(&self) -> Option<u64> {
        let store = self.scores.as_ref()?;
        let game_id = self.machine.source().game_id();
        match store.best(game_id, self.profile.difficulty) {
            Ok(best) => best,
            Err(err) => {
                warn!(%err, "could not read best score");
                None
            }
        }
    }

    /// Persist the finished session once; storage failures only get logged
    fn record_completion(&mut self) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        self.summary = self.machine.summary();

        let game_id = self.machine.source().game_id();
        let difficulty = self.profile.difficulty;
        let score = self.machine.snapshot().score;

        if let Some(store) = self.scores.as_mut() {
            match store.record(game_id, difficulty, score) {
                Ok(improved) => {
                    if improved {
                        self.best = Some(score);
                    }
                    self.new_best = improved;
                }
                Err(err) => warn!(%err, "could not save best score"),
            }
        }

        if let (Some(log), Some(summary)) = (&self.history, &self.summary) {
            if let Err(err) = log.append(&HistoryEntry::new(game_id, difficulty, summary)) {
                warn!(%err, path = %log.path().display(), "could not append history");
            }
        }
    }

    pub fn machine(&self) -> &RoundStateMachine<S, Countdown, Screen> {
        &self.machine
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn hint_text(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn best(&self) -> Option<u64> {
        self.best
    }

    pub fn is_new_best(&self) -> bool {
        self.new_best
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::best_scores::MemoryBestScores;
    use crate::games::{ArithmeticChallenge, ArithmeticSource};
    use crate::profile::Difficulty;
    use crate::session::Outcome;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str<S: ProblemSource>(app: &mut App<S>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn answer(app: &App<ArithmeticSource>) -> i64 {
        let challenge: &ArithmeticChallenge = app.machine().challenge().unwrap();
        challenge.answer
    }

    fn app(rounds: u32) -> App<ArithmeticSource> {
        let profile = DifficultyProfile::preset(Difficulty::Easy)
            .with_max_rounds(Some(rounds))
            .with_time_budget(Duration::from_secs(10));
        App::new(ArithmeticSource::seeded(7), profile)
            .with_best_scores(Box::new(MemoryBestScores::default()))
    }

    #[test]
    fn typing_and_enter_submits() {
        let mut app = app(2);
        app.start().unwrap();
        let correct = answer(&app);
        type_str(&mut app, &correct.to_string());
        assert_eq!(app.input(), correct.to_string());

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.machine().status(), Status::Feedback);
        assert!(app.input().is_empty());
        assert_eq!(
            app.machine().snapshot().last_round.unwrap().outcome,
            Outcome::Correct
        );
    }

    #[test]
    fn garbage_input_stays_active_with_notice() {
        let mut app = app(2);
        app.start().unwrap();
        type_str(&mut app, "abc");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.machine().status(), Status::Active);
        assert!(app.notice().unwrap().contains("abc"));

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.input(), "ab");
    }

    #[test]
    fn tab_reveals_hint() {
        let mut app = app(2);
        app.start().unwrap();
        app.handle_key(key(KeyCode::Tab));
        assert!(app.hint_text().is_some());
        assert_eq!(app.machine().snapshot().hints_remaining, 2);
    }

    #[test]
    fn esc_pauses_and_resumes() {
        let mut app = app(2);
        app.start().unwrap();
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.machine().status(), Status::Paused);
        app.on_tick(Duration::from_secs(60));
        assert_eq!(app.machine().status(), Status::Paused);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.machine().status(), Status::Active);
    }

    #[test]
    fn timeout_then_advance_clears_round_state() {
        let mut app = app(2);
        app.start().unwrap();
        type_str(&mut app, "1");
        app.on_tick(Duration::from_secs(10));
        assert_eq!(app.machine().status(), Status::Feedback);

        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.machine().status(), Status::Active);
        assert_eq!(app.machine().snapshot().round_index, 2);
        assert!(app.input().is_empty());
    }

    #[test]
    fn completion_records_best_and_history_once() {
        let dir = tempdir().unwrap();
        let log = HistoryLog::with_path(dir.path().join("history.csv"));
        let mut app = app(1).with_history(log.clone());
        app.start().unwrap();
        let correct = answer(&app);
        type_str(&mut app, &correct.to_string());
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.machine().status(), Status::Complete);
        assert!(app.is_new_best());
        assert_eq!(app.best(), Some(app.machine().snapshot().score));
        assert_eq!(app.summary().unwrap().correct, 1);
        assert_eq!(log.entries().unwrap().len(), 1);

        // further keys on the results screen do not record again
        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(log.entries().unwrap().len(), 1);
    }

    #[test]
    fn restart_from_results() {
        let mut app = app(1);
        app.start().unwrap();
        app.on_tick(Duration::from_secs(10));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.machine().status(), Status::Complete);
        assert!(app.is_new_best());

        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.machine().status(), Status::Active);
        assert_eq!(app.machine().snapshot().score, 0);
        assert_eq!(app.best(), Some(0));
        assert!(!app.is_new_best());
        assert!(app.summary().is_none());
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut app = app(3);
        app.start().unwrap();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
        assert_eq!(app.machine().status(), Status::Idle);
    }

    #[test]
    fn q_quits_from_results() {
        let mut app = app(1);
        app.start().unwrap();
        app.on_tick(Duration::from_secs(10));
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.should_quit());
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn screen_sees_every_transition() {
        let mut app = app(2);
        app.start().unwrap();
        let before = app.machine().sink().transitions();
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.machine().sink().transitions(), before + 2);
        assert_eq!(app.machine().sink().last().status, Status::Active);
    }
}
