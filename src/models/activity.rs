use std::fmt;
use std::ops::AddAssign;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(AppError::from)
}

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> AppResult<Self> {
        if from > to {
            return Err(AppError::compute_failure(format!(
                "negative date range: {from} is after {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    pub fn parse(from: &str, to: &str) -> AppResult<Self> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    /// The `days` days immediately before `day`, not including it.
    pub fn trailing(day: NaiveDate, days: i64) -> Option<Self> {
        if days <= 0 {
            return None;
        }
        Some(Self {
            from: day - Duration::days(days),
            to: day - Duration::days(1),
        })
    }

    pub fn num_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitMetrics {
    pub completed: i64,
    pub total: i64,
    pub expected: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetrics {
    pub completed: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub sleep_minutes: i64,
    pub exercise_minutes: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceMetrics {
    pub budget_cents: i64,
    pub spent_cents: i64,
}

/// Raw per-category counts for one day or a window of days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMetrics {
    pub habits: HabitMetrics,
    pub tasks: TaskMetrics,
    pub focus_minutes: i64,
    #[serde(default)]
    pub health: HealthMetrics,
    #[serde(default)]
    pub finance: FinanceMetrics,
}

impl ActivityMetrics {
    pub fn is_empty(&self) -> bool {
        *self == ActivityMetrics::default()
    }

    pub fn validate(&self) -> AppResult<()> {
        let fields = [
            ("habits.completed", self.habits.completed),
            ("habits.total", self.habits.total),
            ("habits.expected", self.habits.expected),
            ("tasks.completed", self.tasks.completed),
            ("tasks.total", self.tasks.total),
            ("focusMinutes", self.focus_minutes),
            ("health.sleepMinutes", self.health.sleep_minutes),
            ("health.exerciseMinutes", self.health.exercise_minutes),
            ("finance.budgetCents", self.finance.budget_cents),
            ("finance.spentCents", self.finance.spent_cents),
        ];

        if let Some((name, value)) = fields.iter().find(|(_, value)| *value < 0) {
            return Err(AppError::compute_failure(format!(
                "metric {name} is negative ({value})"
            )));
        }

        Ok(())
    }
}

impl AddAssign for ActivityMetrics {
    fn add_assign(&mut self, other: Self) {
        self.habits.completed += other.habits.completed;
        self.habits.total += other.habits.total;
        self.habits.expected += other.habits.expected;
        self.tasks.completed += other.tasks.completed;
        self.tasks.total += other.tasks.total;
        self.focus_minutes += other.focus_minutes;
        self.health.sleep_minutes += other.health.sleep_minutes;
        self.health.exercise_minutes += other.health.exercise_minutes;
        self.finance.budget_cents += other.finance.budget_cents;
        self.finance.spent_cents += other.finance.spent_cents;
    }
}

/// A single user action that feeds the per-day aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityEvent {
    /// Number of habit occurrences scheduled for the day; replaces the
    /// previous value rather than adding to it.
    HabitsExpected { count: i64 },
    HabitCheckIn,
    /// A tracked habit occurrence that was not completed.
    HabitMissed,
    TaskCreated,
    TaskCompleted,
    FocusSession { minutes: i64 },
    Health {
        sleep_minutes: i64,
        exercise_minutes: i64,
    },
    Finance {
        budget_cents: i64,
        spent_cents: i64,
    },
}

impl ActivityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityEvent::HabitsExpected { .. } => "habits_expected",
            ActivityEvent::HabitCheckIn => "habit_check_in",
            ActivityEvent::HabitMissed => "habit_missed",
            ActivityEvent::TaskCreated => "task_created",
            ActivityEvent::TaskCompleted => "task_completed",
            ActivityEvent::FocusSession { .. } => "focus_session",
            ActivityEvent::Health { .. } => "health",
            ActivityEvent::Finance { .. } => "finance",
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        let negative = match *self {
            ActivityEvent::HabitsExpected { count } => count < 0,
            ActivityEvent::FocusSession { minutes } => minutes <= 0,
            ActivityEvent::Health {
                sleep_minutes,
                exercise_minutes,
            } => sleep_minutes < 0 || exercise_minutes < 0,
            ActivityEvent::Finance {
                budget_cents,
                spent_cents,
            } => budget_cents < 0 || spent_cents < 0,
            ActivityEvent::HabitCheckIn
            | ActivityEvent::HabitMissed
            | ActivityEvent::TaskCreated
            | ActivityEvent::TaskCompleted => false,
        };

        if negative {
            return Err(AppError::validation_with_details(
                format!("invalid quantity for {} event", self.as_str()),
                serde_json::to_value(self)?,
            ));
        }

        Ok(())
    }
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
