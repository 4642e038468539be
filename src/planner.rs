//! Greedy study-plan scheduler.
//!
//! Spreads the remaining hours of every unfinished task over a run of days.
//! Tasks are ordered once by (deadline, priority) and that order is walked
//! day after day; each day takes hours from the front of the queue until its
//! capacity is spent, and what a task gives up on one day is gone for the
//! next. No backtracking and no balancing: identical input always yields an
//! identical plan.
//!
//! Planning works on private copies of the task hours. Stored tasks are
//! never modified.

use chrono::{Days, NaiveDate};
use serde::ser::{Serialize, Serializer};

use crate::error::Result;
use crate::tasks::{Task, TaskStatus, TaskStore};
use crate::tasks::types::DEADLINE_FORMAT;

/// Remaining hours at or below this count as used up, so float residue from
/// repeated subtraction does not produce zero-hour slots.
const HOURS_EPSILON: f64 = 1e-9;

/// Hours allotted to one task on one day.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlanSlot {
    /// Id of the scheduled task.
    pub task_id: u64,
    /// Task title at planning time.
    pub title: String,
    /// Allotted hours, rounded to two decimals.
    pub hours: f64,
}

/// One calendar day of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDay {
    /// The day.
    pub date: NaiveDate,
    /// Slots in allocation order; empty when nothing was scheduled.
    pub slots: Vec<PlanSlot>,
}

impl PlanDay {
    /// The date as `YYYY-MM-DD`.
    #[must_use]
    pub fn date_string(&self) -> String {
        self.date.format(DEADLINE_FORMAT).to_string()
    }

    /// Sum of the slot hours on this day.
    #[must_use]
    pub fn total_hours(&self) -> f64 {
        self.slots.iter().map(|s| s.hours).sum()
    }
}

/// A multi-day plan, ordered by date.
///
/// Serializes as a JSON object mapping `YYYY-MM-DD` to that day's slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    days: Vec<PlanDay>,
}

impl Plan {
    /// Days in chronological order.
    #[must_use]
    pub fn days(&self) -> &[PlanDay] {
        &self.days
    }

    /// Slots for a `YYYY-MM-DD` date, if the date is in the plan.
    #[must_use]
    pub fn get(&self, date: &str) -> Option<&[PlanSlot]> {
        self.days
            .iter()
            .find(|d| d.date_string() == date)
            .map(|d| d.slots.as_slice())
    }

    /// Number of days covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Returns `true` if the plan covers no days.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Returns `true` if no day has any slot.
    #[must_use]
    pub fn has_no_slots(&self) -> bool {
        self.days.iter().all(|d| d.slots.is_empty())
    }

    /// Total hours allotted to `task_id` across all days.
    #[must_use]
    pub fn hours_for_task(&self, task_id: u64) -> f64 {
        self.days
            .iter()
            .flat_map(|d| &d.slots)
            .filter(|s| s.task_id == task_id)
            .map(|s| s.hours)
            .sum()
    }
}

impl Serialize for Plan {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.days.iter().map(|d| (d.date_string(), &d.slots)))
    }
}

/// Working copy of a task while planning.
struct Pending<'a> {
    task: &'a Task,
    remaining: f64,
    deadline: NaiveDate,
    rank: u8,
}

/// Build a plan of `num_days` days starting at `today`, each with
/// `daily_hours` of capacity, from the given tasks.
///
/// Done tasks are skipped. The rest are sorted stably by deadline, then
/// priority (high first); an unparsable deadline sorts after every real
/// date. Degenerate input (no capacity, zero days) yields empty days or an
/// empty plan rather than an error.
#[must_use]
pub fn generate_plan(tasks: &[Task], daily_hours: f64, num_days: u32, today: NaiveDate) -> Plan {
    let mut queue: Vec<Pending<'_>> = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done)
        .map(|task| Pending {
            task,
            remaining: if task.estimated_hours.is_finite() {
                task.estimated_hours
            } else {
                0.0
            },
            deadline: task.deadline_date().unwrap_or(NaiveDate::MAX),
            rank: task.priority.rank(),
        })
        .collect();
    queue.sort_by_key(|p| (p.deadline, p.rank));

    let mut days = Vec::new();
    for offset in 0..num_days {
        let Some(date) = today.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };

        let mut capacity = daily_hours;
        let mut slots = Vec::new();
        for item in &mut queue {
            if item.remaining <= HOURS_EPSILON || capacity <= HOURS_EPSILON {
                continue;
            }
            let hours = item.remaining.min(capacity);
            slots.push(PlanSlot {
                task_id: item.task.id,
                title: item.task.title.clone(),
                hours: round_hours(hours),
            });
            item.remaining -= hours;
            capacity -= hours;
        }

        days.push(PlanDay { date, slots });
    }

    Plan { days }
}

/// Read every task from `store` and plan over it.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn plan_from_store(
    store: &dyn TaskStore,
    daily_hours: f64,
    num_days: u32,
    today: NaiveDate,
) -> Result<Plan> {
    let tasks = store.list(None)?;
    Ok(generate_plan(&tasks, daily_hours, num_days, today))
}

/// Today's date in the local timezone.
#[must_use]
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
