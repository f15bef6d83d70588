use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use kogni::{
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    controller::FRAME_MS,
    level::{self, GameKind, LevelSelector, TOTAL_LEVELS},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, MonotonicClock, Runner, Stamped},
    store::{SqliteResultStore, HISTORY_LIMIT},
    ui::screen::current_screen,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
};

/// cognitive training games in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Four timed mini-games (verbal memory, sustained attention, cognitive flexibility and corridor memory) over 15 levels, with results kept in a local database."
)]
pub struct Cli {
    /// store and read results under this player name
    #[clap(short = 'p', long, global = true)]
    player: Option<String>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// play one level of a game (the default)
    Play(PlayArgs),
    /// list the most recent results
    History {
        #[clap(short = 'n', long, default_value_t = HISTORY_LIMIT)]
        limit: usize,
    },
    /// show totals and the daily trend
    Stats,
    /// write every stored result as CSV (stdout when no path is given)
    Export { path: Option<PathBuf> },
    /// print the level table of a game
    Levels {
        #[clap(short = 'g', long, value_enum)]
        game: GameKind,
    },
    /// delete every stored result of the player
    Clear,
    /// show the saved defaults, or change them
    Config(ConfigArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// game started when none is given
    #[clap(long, value_enum)]
    game: Option<GameKind>,

    /// level started when none is given
    #[clap(long)]
    level: Option<u32>,

    /// keep finished levels in the result database
    #[clap(long)]
    save_results: Option<bool>,

    /// tracing filter used when KOGNI_LOG is unset
    #[clap(long)]
    log_filter: Option<String>,
}

impl ConfigArgs {
    fn is_empty(&self) -> bool {
        self.game.is_none()
            && self.level.is_none()
            && self.save_results.is_none()
            && self.log_filter.is_none()
    }

    /// Apply the given flags; the player flag is global and handled by the caller.
    fn apply(self, config: &mut Config) {
        if let Some(game) = self.game {
            config.default_game = game;
        }
        if let Some(level) = self.level {
            config.default_level = level.clamp(1, TOTAL_LEVELS);
        }
        if let Some(save) = self.save_results {
            config.save_results = save;
        }
        if let Some(filter) = self.log_filter {
            config.log_filter = filter;
        }
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
struct PlayArgs {
    /// game to play
    #[clap(short = 'g', long, value_enum)]
    game: Option<GameKind>,

    /// level 1-15, or "exam" for verbal memory
    #[clap(short = 'l', long)]
    level: Option<String>,

    /// seed the stimulus generator for a reproducible session
    #[clap(long)]
    seed: Option<u64>,
}

fn open_store(config: &Config) -> Result<SqliteResultStore, Box<dyn Error>> {
    let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("kogni.db"));
    Ok(SqliteResultStore::open(path, &config.player)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let (mut config, config_err) = match config_store.load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    if let Some(player) = cli.player.clone() {
        config.player = player;
    }
    if let Some(path) = AppDirs::log_path() {
        if let Err(err) = logging::init(&path, &config.log_filter) {
            eprintln!("logging disabled: {err}");
        }
    }
    if let Some(err) = config_err {
        tracing::warn!(
            path = %config_store.path().display(),
            %err,
            "ignoring unreadable config, using defaults"
        );
        eprintln!("warning: ignoring {}: {err}", config_store.path().display());
    }

    match cli.command.clone().unwrap_or(Command::Play(PlayArgs::default())) {
        Command::Play(args) => play(config, args),
        Command::History { limit } => print_history(&open_store(&config)?, limit),
        Command::Stats => print_stats(&open_store(&config)?),
        Command::Export { path } => {
            let store = open_store(&config)?;
            let rows = match path {
                Some(path) => store.export_csv(File::create(path)?)?,
                None => store.export_csv(io::stdout().lock())?,
            };
            eprintln!("exported {rows} results");
            Ok(())
        }
        Command::Levels { game } => {
            print_levels(game);
            Ok(())
        }
        Command::Clear => {
            let removed = open_store(&config)?.clear()?;
            println!("removed {removed} results for {}", config.player);
            Ok(())
        }
        Command::Config(args) => {
            if !args.is_empty() || cli.player.is_some() {
                args.apply(&mut config);
                config_store.save(&config)?;
                tracing::info!(path = %config_store.path().display(), "config saved");
            }
            println!("{}", config_store.path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn play(config: Config, args: PlayArgs) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let game = args.game.unwrap_or(config.default_game);
    let raw_level = args
        .level
        .unwrap_or_else(|| config.default_level.to_string());
    let level = level::parse_level(game, Some(raw_level.as_str()));
    let mut store = open_store(&config)?;
    tracing::info!(%game, level = %level.label(), player = %config.player, "starting session");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, game, level, args.seed);
    let result = start_tui(&mut terminal, &mut app, &mut store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut SqliteResultStore,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::frames(FRAME_MS),
        MonotonicClock::new(),
    );

    app.start(runner.now_ms());
    loop {
        terminal.draw(|f| current_screen(&app.state).render(&*app, f))?;

        let Stamped { event, at_ms } = runner.step();
        match event {
            GameEvent::Tick | GameEvent::Resize => app.on_tick(at_ms, store),
            GameEvent::Key(key) => {
                if app.handle_key(key, at_ms, store) == Flow::Quit {
                    tracing::info!("session closed");
                    break;
                }
            }
        }
    }

    Ok(())
}

fn print_history(store: &SqliteResultStore, limit: usize) -> Result<(), Box<dyn Error>> {
    for r in store.history(limit)? {
        println!(
            "{}  {:<22} level {:>2}  {}",
            r.played_at.format("%Y-%m-%d %H:%M"),
            r.game_name,
            r.level,
            r.score
        );
    }
    Ok(())
}

fn print_stats(store: &SqliteResultStore) -> Result<(), Box<dyn Error>> {
    let stats = store.stats()?;
    println!("player       {}", store.player());
    println!("tests        {}", stats.total_tests);
    println!("avg level    {:.1}", stats.avg_level);
    println!("active days  {}", stats.active_days);
    if !stats.daily_trend.is_empty() {
        println!();
        for day in &stats.daily_trend {
            println!("{}  {:>5.1}%", day.date, day.avg_score);
        }
    }
    if !stats.recent.is_empty() {
        println!();
        for r in &stats.recent {
            println!("{}  level {:>2}  {}", r.game_name, r.level, r.score);
        }
    }
    Ok(())
}

fn print_levels(game: GameKind) {
    println!("{}", game.title());
    for n in 1..=TOTAL_LEVELS {
        let rounds = level::rounds_per_level(game, LevelSelector::Level(n));
        let row = match game {
            GameKind::VerbalMemory => {
                let m = level::memory_level(n);
                format!(
                    "{} digits, shown {}ms, answer {}ms",
                    m.target, m.display_ms, m.answer_ms
                )
            }
            GameKind::SustainedAttention => {
                format!("speed {:.0}", level::attention_speed(n))
            }
            GameKind::CognitionFlexibility => format!(
                "speed {:.0}, distractors {:.0}%",
                level::flexibility_speed(n),
                level::distractor_chance(n) * 100.0
            ),
            GameKind::CorridorMemory => {
                let c = level::corridor_level(n);
                format!(
                    "{} closed, {} cities, answer {}ms",
                    c.closed, c.cities, c.answer_ms
                )
            }
        };
        println!("{n:>2}  {rounds:>2} rounds  {row}");
    }
    if game.supports_exam() {
        let rounds = level::rounds_per_level(game, LevelSelector::Exam);
        let (first, last) = (level::exam_stage(1), level::exam_stage(rounds));
        println!(
            "exam  {rounds} rounds  {} to {} digits, shown {}ms down to {}ms",
            first.target, last.target, first.display_ms, last.display_ms
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_play() {
        let cli = Cli::parse_from(["kogni"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.player, None);
    }

    #[test]
    fn play_flags() {
        let cli = Cli::parse_from([
            "kogni",
            "play",
            "--game",
            "corridor-memory",
            "-l",
            "exam",
            "--seed",
            "9",
        ]);
        match cli.command {
            Some(Command::Play(args)) => {
                assert_eq!(args.game, Some(GameKind::CorridorMemory));
                assert_eq!(args.level.as_deref(), Some("exam"));
                assert_eq!(args.seed, Some(9));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn player_is_global() {
        let cli = Cli::parse_from(["kogni", "history", "-p", "ada", "-n", "3"]);
        assert_eq!(cli.player.as_deref(), Some("ada"));
        assert!(matches!(cli.command, Some(Command::History { limit: 3 })));
    }

    #[test]
    fn config_flags_update_defaults() {
        let cli = Cli::parse_from(["kogni", "config", "--game", "sustained-attention", "--level", "40"]);
        let Some(Command::Config(args)) = cli.command else {
            panic!("expected config command");
        };
        assert!(!args.is_empty());
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.default_game, GameKind::SustainedAttention);
        assert_eq!(config.default_level, TOTAL_LEVELS);
        assert!(config.save_results);
    }

    #[test]
    fn unknown_game_is_rejected() {
        assert!(Cli::try_parse_from(["kogni", "levels", "--game", "chess"]).is_err());
    }
}
