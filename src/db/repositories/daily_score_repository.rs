use std::convert::TryFrom;

use chrono::{NaiveDate, Utc};
use rusqlite::{named_params, Connection, Row};

use crate::error::{AppError, AppResult};
use crate::models::activity::{parse_date, DateRange};
use crate::models::score::DailyScore;

#[derive(Debug, Clone)]
pub struct DailyScoreRow {
    pub user_id: String,
    pub score_date: String,
    pub global_score: f64,
    pub habits_score: f64,
    pub tasks_score: f64,
    pub finance_score: f64,
    pub health_score: f64,
    pub momentum_index: f64,
    pub burnout_index: f64,
    pub computed_at: String,
}

impl DailyScoreRow {
    pub fn from_score(user_id: &str, score: &DailyScore, computed_at: String) -> Self {
        Self {
            user_id: user_id.to_string(),
            score_date: score.date.to_string(),
            global_score: score.global_score,
            habits_score: score.habits_score,
            tasks_score: score.tasks_score,
            finance_score: score.finance_score,
            health_score: score.health_score,
            momentum_index: score.momentum_index,
            burnout_index: score.burnout_index,
            computed_at,
        }
    }

    pub fn into_score(self) -> AppResult<DailyScore> {
        Ok(DailyScore {
            date: parse_date(&self.score_date)?,
            global_score: self.global_score,
            habits_score: self.habits_score,
            tasks_score: self.tasks_score,
            finance_score: self.finance_score,
            health_score: self.health_score,
            momentum_index: self.momentum_index,
            burnout_index: self.burnout_index,
        })
    }
}

impl TryFrom<&Row<'_>> for DailyScoreRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.get("user_id")?,
            score_date: row.get("score_date")?,
            global_score: row.get("global_score")?,
            habits_score: row.get("habits_score")?,
            tasks_score: row.get("tasks_score")?,
            finance_score: row.get("finance_score")?,
            health_score: row.get("health_score")?,
            momentum_index: row.get("momentum_index")?,
            burnout_index: row.get("burnout_index")?,
            computed_at: row.get("computed_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        user_id,
        score_date,
        global_score,
        habits_score,
        tasks_score,
        finance_score,
        health_score,
        momentum_index,
        burnout_index,
        computed_at
    FROM daily_scores
"#;

pub struct DailyScoreRepository;

impl DailyScoreRepository {
    /// Inserts or overwrites the score for `(user_id, score.date)`.
    pub fn upsert(conn: &Connection, user_id: &str, score: &DailyScore) -> AppResult<()> {
        let row = DailyScoreRow::from_score(user_id, score, Utc::now().to_rfc3339());

        conn.execute(
            r#"
                INSERT INTO daily_scores (
                    user_id,
                    score_date,
                    global_score,
                    habits_score,
                    tasks_score,
                    finance_score,
                    health_score,
                    momentum_index,
                    burnout_index,
                    computed_at
                ) VALUES (
                    :user_id,
                    :score_date,
                    :global_score,
                    :habits_score,
                    :tasks_score,
                    :finance_score,
                    :health_score,
                    :momentum_index,
                    :burnout_index,
                    :computed_at
                )
                ON CONFLICT(user_id, score_date) DO UPDATE SET
                    global_score = excluded.global_score,
                    habits_score = excluded.habits_score,
                    tasks_score = excluded.tasks_score,
                    finance_score = excluded.finance_score,
                    health_score = excluded.health_score,
                    momentum_index = excluded.momentum_index,
                    burnout_index = excluded.burnout_index,
                    computed_at = excluded.computed_at
            "#,
            named_params! {
                ":user_id": &row.user_id,
                ":score_date": &row.score_date,
                ":global_score": &row.global_score,
                ":habits_score": &row.habits_score,
                ":tasks_score": &row.tasks_score,
                ":finance_score": &row.finance_score,
                ":health_score": &row.health_score,
                ":momentum_index": &row.momentum_index,
                ":burnout_index": &row.burnout_index,
                ":computed_at": &row.computed_at,
            },
        )?;

        Ok(())
    }

    /// Scores in the inclusive range, most recent first.
    pub fn list_range(
        conn: &Connection,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<DailyScore>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE user_id = :user_id
             AND score_date BETWEEN :from_date AND :to_date ORDER BY score_date DESC"
        );
        let mut stmt = conn.prepare(&sql)?;

        let scores = stmt
            .query_map(
                named_params! {
                    ":user_id": user_id,
                    ":from_date": range.from.to_string(),
                    ":to_date": range.to.to_string(),
                },
                |row| DailyScoreRow::try_from(row),
            )?
            .map(|row| row.map_err(AppError::from).and_then(|row| row.into_score()))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(scores)
    }

    /// Full history for one user, most recent first.
    pub fn list_all_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<DailyScore>> {
        let sql = format!("{SELECT_COLUMNS} WHERE user_id = :user_id ORDER BY score_date DESC");
        let mut stmt = conn.prepare(&sql)?;

        let scores = stmt
            .query_map(named_params! {":user_id": user_id}, |row| {
                DailyScoreRow::try_from(row)
            })?
            .map(|row| row.map_err(AppError::from).and_then(|row| row.into_score()))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(scores)
    }

    pub fn delete_before(conn: &Connection, user_id: &str, cutoff: &NaiveDate) -> AppResult<usize> {
        let deleted = conn.execute(
            r#"
                DELETE FROM daily_scores
                WHERE user_id = :user_id AND score_date < :cutoff
            "#,
            named_params! {":user_id": user_id, ":cutoff": cutoff.to_string()},
        )?;

        Ok(deleted)
    }
}
