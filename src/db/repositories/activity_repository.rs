use std::convert::TryFrom;

use chrono::{NaiveDate, Utc};
use rusqlite::{named_params, Connection, Row};

use crate::error::AppResult;
use crate::models::activity::{
    ActivityEvent, ActivityMetrics, DateRange, FinanceMetrics, HabitMetrics, HealthMetrics,
    TaskMetrics,
};

/// Column increments produced by one [`ActivityEvent`]. `Some` fields
/// overwrite the stored value instead of adding to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityDelta {
    pub habits_completed: i64,
    pub habits_total: i64,
    pub habits_expected: Option<i64>,
    pub tasks_completed: i64,
    pub tasks_total: i64,
    pub focus_minutes: i64,
    pub sleep_minutes: i64,
    pub exercise_minutes: i64,
    pub budget_cents: Option<i64>,
    pub spent_cents: i64,
}

impl From<ActivityEvent> for ActivityDelta {
    fn from(event: ActivityEvent) -> Self {
        let mut delta = ActivityDelta::default();
        match event {
            ActivityEvent::HabitsExpected { count } => delta.habits_expected = Some(count),
            ActivityEvent::HabitCheckIn => {
                delta.habits_completed = 1;
                delta.habits_total = 1;
            }
            ActivityEvent::HabitMissed => delta.habits_total = 1,
            ActivityEvent::TaskCreated => delta.tasks_total = 1,
            ActivityEvent::TaskCompleted => delta.tasks_completed = 1,
            ActivityEvent::FocusSession { minutes } => delta.focus_minutes = minutes,
            ActivityEvent::Health {
                sleep_minutes,
                exercise_minutes,
            } => {
                delta.sleep_minutes = sleep_minutes;
                delta.exercise_minutes = exercise_minutes;
            }
            ActivityEvent::Finance {
                budget_cents,
                spent_cents,
            } => {
                delta.budget_cents = (budget_cents > 0).then_some(budget_cents);
                delta.spent_cents = spent_cents;
            }
        }
        delta
    }
}

#[derive(Debug, Clone)]
pub struct ActivityTotalsRow {
    pub habits_completed: i64,
    pub habits_total: i64,
    pub habits_expected: i64,
    pub tasks_completed: i64,
    pub tasks_total: i64,
    pub focus_minutes: i64,
    pub sleep_minutes: i64,
    pub exercise_minutes: i64,
    pub budget_cents: i64,
    pub spent_cents: i64,
}

impl ActivityTotalsRow {
    pub fn into_metrics(self) -> ActivityMetrics {
        ActivityMetrics {
            habits: HabitMetrics {
                completed: self.habits_completed,
                total: self.habits_total,
                expected: self.habits_expected,
            },
            tasks: TaskMetrics {
                completed: self.tasks_completed,
                total: self.tasks_total,
            },
            focus_minutes: self.focus_minutes,
            health: HealthMetrics {
                sleep_minutes: self.sleep_minutes,
                exercise_minutes: self.exercise_minutes,
            },
            finance: FinanceMetrics {
                budget_cents: self.budget_cents,
                spent_cents: self.spent_cents,
            },
        }
    }
}

impl TryFrom<&Row<'_>> for ActivityTotalsRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            habits_completed: row.get("habits_completed")?,
            habits_total: row.get("habits_total")?,
            habits_expected: row.get("habits_expected")?,
            tasks_completed: row.get("tasks_completed")?,
            tasks_total: row.get("tasks_total")?,
            focus_minutes: row.get("focus_minutes")?,
            sleep_minutes: row.get("sleep_minutes")?,
            exercise_minutes: row.get("exercise_minutes")?,
            budget_cents: row.get("budget_cents")?,
            spent_cents: row.get("spent_cents")?,
        })
    }
}

pub struct ActivityRepository;

impl ActivityRepository {
    pub fn apply_delta(
        conn: &Connection,
        user_id: &str,
        date: &NaiveDate,
        delta: &ActivityDelta,
    ) -> AppResult<()> {
        let updated_at = Utc::now().to_rfc3339();

        conn.execute(
            r#"
                INSERT INTO daily_activity (
                    user_id,
                    activity_date,
                    habits_completed,
                    habits_total,
                    habits_expected,
                    tasks_completed,
                    tasks_total,
                    focus_minutes,
                    sleep_minutes,
                    exercise_minutes,
                    budget_cents,
                    spent_cents,
                    updated_at
                ) VALUES (
                    :user_id,
                    :activity_date,
                    :habits_completed,
                    :habits_total,
                    COALESCE(:habits_expected, 0),
                    :tasks_completed,
                    :tasks_total,
                    :focus_minutes,
                    :sleep_minutes,
                    :exercise_minutes,
                    COALESCE(:budget_cents, 0),
                    :spent_cents,
                    :updated_at
                )
                ON CONFLICT(user_id, activity_date) DO UPDATE SET
                    habits_completed = habits_completed + excluded.habits_completed,
                    habits_total = habits_total + excluded.habits_total,
                    habits_expected = CASE
                        WHEN :habits_expected IS NULL THEN habits_expected
                        ELSE excluded.habits_expected
                    END,
                    tasks_completed = tasks_completed + excluded.tasks_completed,
                    tasks_total = tasks_total + excluded.tasks_total,
                    focus_minutes = focus_minutes + excluded.focus_minutes,
                    sleep_minutes = sleep_minutes + excluded.sleep_minutes,
                    exercise_minutes = exercise_minutes + excluded.exercise_minutes,
                    budget_cents = CASE
                        WHEN :budget_cents IS NULL THEN budget_cents
                        ELSE excluded.budget_cents
                    END,
                    spent_cents = spent_cents + excluded.spent_cents,
                    updated_at = excluded.updated_at
            "#,
            named_params! {
                ":user_id": user_id,
                ":activity_date": date.to_string(),
                ":habits_completed": delta.habits_completed,
                ":habits_total": delta.habits_total,
                ":habits_expected": delta.habits_expected,
                ":tasks_completed": delta.tasks_completed,
                ":tasks_total": delta.tasks_total,
                ":focus_minutes": delta.focus_minutes,
                ":sleep_minutes": delta.sleep_minutes,
                ":exercise_minutes": delta.exercise_minutes,
                ":budget_cents": delta.budget_cents,
                ":spent_cents": delta.spent_cents,
                ":updated_at": updated_at,
            },
        )?;

        Ok(())
    }

    /// Sums every day row in the range; `None` when the user has no rows
    /// there at all.
    pub fn sum_range(
        conn: &Connection,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Option<ActivityMetrics>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT
                    COUNT(*) AS day_count,
                    COALESCE(SUM(habits_completed), 0) AS habits_completed,
                    COALESCE(SUM(habits_total), 0) AS habits_total,
                    COALESCE(SUM(habits_expected), 0) AS habits_expected,
                    COALESCE(SUM(tasks_completed), 0) AS tasks_completed,
                    COALESCE(SUM(tasks_total), 0) AS tasks_total,
                    COALESCE(SUM(focus_minutes), 0) AS focus_minutes,
                    COALESCE(SUM(sleep_minutes), 0) AS sleep_minutes,
                    COALESCE(SUM(exercise_minutes), 0) AS exercise_minutes,
                    COALESCE(SUM(budget_cents), 0) AS budget_cents,
                    COALESCE(SUM(spent_cents), 0) AS spent_cents
                FROM daily_activity
                WHERE user_id = :user_id
                  AND activity_date BETWEEN :from_date AND :to_date
            "#,
        )?;

        let (day_count, row) = stmt.query_row(
            named_params! {
                ":user_id": user_id,
                ":from_date": range.from.to_string(),
                ":to_date": range.to.to_string(),
            },
            |row| {
                let day_count: i64 = row.get("day_count")?;
                Ok((day_count, ActivityTotalsRow::try_from(row)?))
            },
        )?;

        if day_count == 0 {
            return Ok(None);
        }

        Ok(Some(row.into_metrics()))
    }
}
