use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quizzle::{
    app::App,
    app_dirs::AppDirs,
    best_scores::{MemoryBestScores, SqliteBestScores},
    config::{Config, ConfigStore, FileConfigStore},
    games::{ArithmeticSource, WordList, WordScrambleSource},
    history::HistoryLog,
    problem::ProblemSource,
    profile::{Difficulty, GameKind},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
};

const TICK_RATE_MS: u64 = 100;
const LOG_ENV: &str = "QUIZZLE_LOG";

/// timed quiz rounds with scored feedback in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed quiz rounds with scored feedback: answer before the clock runs out, build streaks for bonus points and chase your personal best per game and difficulty."
)]
pub struct Cli {
    /// game to play
    #[clap(short, long, value_enum)]
    game: Option<GameKind>,

    /// difficulty preset
    #[clap(short, long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of rounds per session
    #[clap(short, long)]
    rounds: Option<u32>,

    /// seconds per round
    #[clap(short, long)]
    seconds: Option<u64>,

    /// hints available per session
    #[clap(long)]
    hints: Option<u32>,

    /// seed for a reproducible sequence of challenges
    #[clap(long)]
    seed: Option<u64>,

    /// do not record best scores or history
    #[clap(long)]
    no_save: bool,

    /// store these options as the new defaults
    #[clap(long)]
    save_defaults: bool,
}

impl Cli {
    /// Command-line values on top of the stored defaults
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(game) = self.game {
            cfg.game = game;
        }
        if let Some(difficulty) = self.difficulty {
            cfg.difficulty = difficulty;
        }
        if self.rounds.is_some() {
            cfg.rounds = self.rounds;
        }
        if self.seconds.is_some() {
            cfg.seconds = self.seconds;
        }
        if self.hints.is_some() {
            cfg.hints = self.hints;
        }
        if self.no_save {
            cfg.save_scores = false;
        }
        cfg
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    let profile = config.to_profile();
    if let Err(err) = profile.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }

    if cli.save_defaults {
        config_store
            .save(&config)
            .with_context(|| format!("saving defaults to {}", config_store.path().display()))?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();
    info!(game = %config.game, difficulty = %config.difficulty, seed = ?cli.seed, "starting");

    match config.game {
        GameKind::Arithmetic => {
            let source = match cli.seed {
                Some(seed) => ArithmeticSource::seeded(seed),
                None => ArithmeticSource::new(),
            };
            run(with_stores(App::new(source, profile), &config))
        }
        GameKind::Words => {
            let list = WordList::load("english").context("loading the word list")?;
            let source = match cli.seed {
                Some(seed) => WordScrambleSource::seeded(list, seed),
                None => WordScrambleSource::new(list),
            };
            run(with_stores(App::new(source, profile), &config))
        }
    }
}

/// Log to a file in the state dir; the terminal belongs to the UI
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn with_stores<S: ProblemSource>(app: App<S>, config: &Config) -> App<S> {
    if !config.save_scores {
        return app.with_best_scores(Box::new(MemoryBestScores::default()));
    }

    let app = match SqliteBestScores::open_default() {
        Ok(store) => app.with_best_scores(Box::new(store)),
        Err(err) => {
            warn!(%err, "best scores unavailable, keeping them in memory");
            app.with_best_scores(Box::new(MemoryBestScores::default()))
        }
    };
    match HistoryLog::open_default() {
        Ok(log) => app.with_history(log),
        Err(err) => {
            warn!(%err, "session history unavailable");
            app
        }
    }
}

fn run<S: ProblemSource>(mut app: App<S>) -> Result<()> {
    app.start().context("starting the session")?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend, S: ProblemSource>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<()> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    while !app.should_quit() {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step();
        // the clock follows wall time whatever woke us up
        app.on_tick(runner.elapsed());
        if let GameEvent::Key(key) = event {
            app.handle_key(key);
        }
    }

    Ok(())
}
