//! Local persistence of finished levels.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::level::{GameKind, LevelSelector};
use crate::score::Summary;
use crate::util;

pub const RECENT_LIMIT: usize = 5;
pub const HISTORY_LIMIT: usize = 50;
pub const TREND_DAYS: usize = 7;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("unreadable timestamp {0:?}")]
    Timestamp(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// What gets persisted once per completed level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelResult {
    pub game_name: String,
    pub score: String,
    pub level: u32,
}

impl LevelResult {
    pub fn new(game: GameKind, level: LevelSelector, summary: &Summary) -> Self {
        Self {
            game_name: game.to_string(),
            score: summary.format_score(game),
            level: level.number(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub game_name: String,
    pub score: String,
    pub level: u32,
    pub played_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub total_tests: u64,
    pub avg_level: f64,
    pub active_days: u64,
    pub recent: Vec<StoredResult>,
    /// Oldest first.
    pub daily_trend: Vec<DailyAverage>,
}

/// Anything that accepts finished level results.
pub trait ResultSink {
    fn save(&mut self, result: &LevelResult) -> Result<()>;
}

impl ResultSink for Vec<LevelResult> {
    fn save(&mut self, result: &LevelResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }
}

/// Percentage embedded in a score string: the first `N%`, or the whole
/// string when it is a bare number. Anything else counts as zero.
pub fn score_percent(score: &str) -> u32 {
    for (idx, _) in score.match_indices('%') {
        let digits: String = score[..idx]
            .chars()
            .rev()
            .take_while(char::is_ascii_digit)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if let Ok(n) = digits.parse() {
            return n;
        }
    }
    score.trim().parse().unwrap_or(0)
}

#[derive(Debug)]
pub struct SqliteResultStore {
    conn: Connection,
    player: String,
}

impl SqliteResultStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P, player: &str) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, player)
    }

    pub fn in_memory(player: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, player)
    }

    fn with_connection(conn: Connection, player: &str) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player TEXT NOT NULL,
                game_name TEXT NOT NULL,
                score TEXT NOT NULL,
                level INTEGER NOT NULL DEFAULT 1,
                played_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_player_played ON results(player, played_at)",
            [],
        )?;
        Ok(Self {
            conn,
            player: player.to_string(),
        })
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn save_at(&self, result: &LevelResult, played_at: DateTime<Local>) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO results (player, game_name, score, level, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                self.player,
                result.game_name,
                result.score,
                result.level.max(1),
                played_at.to_rfc3339(),
            ],
        )?;
        tracing::info!(
            game = %result.game_name,
            score = %result.score,
            level = result.level,
            "result saved"
        );
        Ok(())
    }

    /// Most recent results first.
    pub fn history(&self, limit: usize) -> Result<Vec<StoredResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT game_name, score, level, played_at
            FROM results
            WHERE player = ?1
            ORDER BY played_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![self.player, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (game_name, score, level, played_at) = row?;
            let played_at = DateTime::parse_from_rfc3339(&played_at)
                .map_err(|_| StoreError::Timestamp(played_at.clone()))?
                .with_timezone(&Local);
            results.push(StoredResult {
                game_name,
                score,
                level,
                played_at,
            });
        }
        Ok(results)
    }

    pub fn stats(&self) -> Result<Stats> {
        let (total_tests, avg_level): (i64, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), AVG(level) FROM results WHERE player = ?1",
            [&self.player],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let active_days: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT substr(played_at, 1, 10)) FROM results WHERE player = ?1",
            [&self.player],
            |row| row.get(0),
        )?;

        Ok(Stats {
            total_tests: total_tests.max(0) as u64,
            avg_level: util::round_to(avg_level.unwrap_or(0.0), 1),
            active_days: active_days.max(0) as u64,
            recent: self.history(RECENT_LIMIT)?,
            daily_trend: self.daily_trend()?,
        })
    }

    /// Average score percentage per day over the latest days with results.
    pub fn daily_trend(&self) -> Result<Vec<DailyAverage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT substr(played_at, 1, 10), score FROM results WHERE player = ?1")?;
        let rows = stmt.query_map([&self.player], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for row in rows {
            let (day, score) = row?;
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|_| StoreError::Timestamp(day.clone()))?;
            by_day
                .entry(date)
                .or_default()
                .push(score_percent(&score) as f64);
        }

        let mut trend: Vec<DailyAverage> = by_day
            .into_iter()
            .rev()
            .take(TREND_DAYS)
            .map(|(date, scores)| DailyAverage {
                date,
                avg_score: util::mean(scores).unwrap_or(0.0),
            })
            .collect();
        trend.reverse();
        Ok(trend)
    }

    /// Write the player's full history as CSV, oldest first. Returns the
    /// number of data rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut history = self.history(usize::MAX >> 1)?;
        history.reverse();
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(["played_at", "game_name", "level", "score"])?;
        for r in &history {
            out.write_record([
                r.played_at.to_rfc3339(),
                r.game_name.clone(),
                r.level.to_string(),
                r.score.clone(),
            ])?;
        }
        out.flush()?;
        Ok(history.len())
    }

    pub fn clear(&self) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM results WHERE player = ?1", [&self.player])?)
    }
}

impl ResultSink for SqliteResultStore {
    fn save(&mut self, result: &LevelResult) -> Result<()> {
        self.save_at(result, Local::now())
    }
}
