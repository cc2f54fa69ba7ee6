use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::report::{DailyDigest, StarPickRecord};
use crate::star::{BetDomain, StarBet};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPick {
    pub day: NaiveDate,
    pub position: u32,
    pub record: StarPickRecord,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS daily_runs (
            day TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            picks INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS star_picks (
            day TEXT NOT NULL,
            position INTEGER NOT NULL,
            home TEXT NOT NULL,
            away TEXT NOT NULL,
            kickoff TEXT NOT NULL,
            star_type TEXT NOT NULL,
            pick TEXT NOT NULL,
            confidence REAL NOT NULL,
            PRIMARY KEY (day, position)
        );
        CREATE INDEX IF NOT EXISTS idx_star_picks_type ON star_picks(star_type);
        CREATE INDEX IF NOT EXISTS idx_star_picks_confidence ON star_picks(confidence);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Stores a day's digest, replacing anything saved earlier for that day.
pub fn save_digest(conn: &mut Connection, digest: &DailyDigest) -> Result<usize> {
    let day = day_key(digest.day);
    let tx = conn.transaction().context("begin history transaction")?;
    tx.execute(
        r#"
        INSERT INTO daily_runs (day, text, picks, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(day) DO UPDATE SET
            text = excluded.text,
            picks = excluded.picks,
            created_at = excluded.created_at
        "#,
        params![
            day,
            digest.text,
            digest.picks.len() as i64,
            Utc::now().to_rfc3339()
        ],
    )
    .context("upsert daily run")?;
    tx.execute("DELETE FROM star_picks WHERE day = ?1", params![day])
        .context("clear star picks")?;

    for (idx, pick) in digest.picks.iter().enumerate() {
        tx.execute(
            r#"
            INSERT INTO star_picks (day, position, home, away, kickoff, star_type, pick, confidence)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                day,
                (idx + 1) as i64,
                pick.home,
                pick.away,
                pick.kickoff,
                pick.star.domain.as_str(),
                pick.star.pick,
                pick.star.confidence,
            ],
        )
        .context("insert star pick")?;
    }
    tx.commit().context("commit history transaction")?;

    info!(day, picks = digest.picks.len(), "saved daily digest");
    Ok(digest.picks.len())
}

pub fn load_digest_text(conn: &Connection, day: NaiveDate) -> Result<Option<String>> {
    conn.query_row(
        "SELECT text FROM daily_runs WHERE day = ?1",
        params![day_key(day)],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .context("query daily run text")
}

/// Picks filtered by star type and minimum confidence, newest day first.
pub fn load_picks(
    conn: &Connection,
    domain: Option<BetDomain>,
    min_confidence: f64,
    limit: Option<usize>,
) -> Result<Vec<StoredPick>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT day, position, home, away, kickoff, star_type, pick, confidence
            FROM star_picks
            WHERE (?1 IS NULL OR star_type = ?1)
              AND confidence >= ?2
            ORDER BY day DESC, position ASC
            LIMIT ?3
            "#,
        )
        .context("prepare load picks query")?;

    let limit = limit.map(|n| n as i64).unwrap_or(-1);
    let rows = stmt
        .query_map(
            params![domain.map(BetDomain::as_str), min_confidence, limit],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, f64>(7)?,
                ))
            },
        )
        .context("query load picks")?;

    let mut out = Vec::new();
    for row in rows {
        let (day, position, home, away, kickoff, star_type, pick, confidence) =
            row.context("decode star pick row")?;
        let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
            .with_context(|| format!("bad stored day {day:?}"))?;
        let domain = BetDomain::parse(&star_type)
            .ok_or_else(|| anyhow!("bad stored star type {star_type:?}"))?;
        out.push(StoredPick {
            day,
            position,
            record: StarPickRecord {
                home,
                away,
                kickoff,
                star: StarBet {
                    domain,
                    pick,
                    confidence,
                },
            },
        });
    }
    Ok(out)
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
