use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use crate::error::AppResult;
use crate::models::leaderboard::{LeaderboardEntry, LeaderboardMetric};

impl TryFrom<&Row<'_>> for LeaderboardEntry {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.get("user_id")?,
            display_name: row.get("display_name")?,
            total_xp: row.get("total_xp")?,
            current_streak: row.get("current_streak")?,
            longest_streak: row.get("longest_streak")?,
            rank_xp: row.get("rank_xp")?,
            rank_streak: row.get("rank_streak")?,
        })
    }
}

pub struct LeaderboardRepository;

impl LeaderboardRepository {
    /// Replaces the whole table. Callers run this inside a transaction.
    pub fn replace_all(
        conn: &Connection,
        entries: &[LeaderboardEntry],
        refreshed_at: &str,
    ) -> AppResult<()> {
        conn.execute("DELETE FROM leaderboard_entries", [])?;

        let mut stmt = conn.prepare(
            r#"
                INSERT INTO leaderboard_entries (
                    user_id,
                    display_name,
                    total_xp,
                    current_streak,
                    longest_streak,
                    rank_xp,
                    rank_streak,
                    refreshed_at
                ) VALUES (
                    :user_id,
                    :display_name,
                    :total_xp,
                    :current_streak,
                    :longest_streak,
                    :rank_xp,
                    :rank_streak,
                    :refreshed_at
                )
            "#,
        )?;

        for entry in entries {
            stmt.execute(named_params! {
                ":user_id": &entry.user_id,
                ":display_name": &entry.display_name,
                ":total_xp": entry.total_xp,
                ":current_streak": entry.current_streak,
                ":longest_streak": entry.longest_streak,
                ":rank_xp": entry.rank_xp,
                ":rank_streak": entry.rank_streak,
                ":refreshed_at": refreshed_at,
            })?;
        }

        Ok(())
    }

    /// Top `limit` rows in display order: rank, then metric value
    /// descending, then user id.
    pub fn list_by_metric(
        conn: &Connection,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> AppResult<Vec<LeaderboardEntry>> {
        let sql = format!(
            r#"
                SELECT
                    user_id,
                    display_name,
                    total_xp,
                    current_streak,
                    longest_streak,
                    rank_xp,
                    rank_streak
                FROM leaderboard_entries
                ORDER BY {rank} ASC, {value} DESC, user_id ASC
                LIMIT :limit
            "#,
            rank = metric.rank_column(),
            value = metric.value_column(),
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(named_params! {":limit": limit as i64}, |row| {
                LeaderboardEntry::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
