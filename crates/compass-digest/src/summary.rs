//! Rolling-window summary of a user's logs.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use compass_shared::constants::RECENT_NOTES_LIMIT;
use compass_store::{PredictiveLog, SharedDatabase, SymptomLog};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Immutable aggregate over one user's logs in a [`Period`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub period: Period,
    /// Mean of the numeric moods, rounded to two decimals.  Serialized as a
    /// fixed two-decimal string such as `"4.00"`.
    #[serde(serialize_with = "serialize_mood")]
    pub avg_mood: Option<f64>,
    /// Up to three most recent non-empty notes, oldest first.
    pub recent_notes: Vec<String>,
    pub predictive_snapshot: Option<serde_json::Value>,
    pub logs_count: usize,
}

impl Summary {
    /// Aggregate `logs`, which must already be ordered oldest first.
    pub fn from_logs(period: Period, logs: &[SymptomLog], latest: Option<PredictiveLog>) -> Self {
        let moods: Vec<f64> = logs
            .iter()
            .filter_map(|l| l.mood.as_deref())
            .filter_map(parse_mood)
            .collect();

        let avg_mood = if moods.is_empty() {
            None
        } else {
            let mean = moods.iter().sum::<f64>() / moods.len() as f64;
            Some((mean * 100.0).round() / 100.0)
        };

        let mut recent_notes: Vec<String> = logs
            .iter()
            .rev()
            .filter_map(|l| l.notes.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .take(RECENT_NOTES_LIMIT)
            .map(str::to_string)
            .collect();
        recent_notes.reverse();

        Self {
            period,
            avg_mood,
            recent_notes,
            predictive_snapshot: latest.map(|p| p.predicted_symptoms),
            logs_count: logs.len(),
        }
    }

    /// The newest note in the window, if any.
    pub fn latest_note(&self) -> Option<&str> {
        self.recent_notes.last().map(String::as_str)
    }
}

fn serialize_mood<S: Serializer>(mood: &Option<f64>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match mood {
        Some(m) => s.serialize_str(&format!("{m:.2}")),
        None => s.serialize_none(),
    }
}

fn parse_mood(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|m| m.is_finite())
}

/// Read the user's logs since `window_start` and their latest forecast, then
/// aggregate.  Read-only.
pub async fn build_summary(
    db: &SharedDatabase,
    user_id: Uuid,
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Summary> {
    let (logs, latest) = db
        .call(move |db| {
            let logs = db.symptom_logs_since(user_id, window_start)?;
            let latest = db.latest_predictive_log(user_id)?;
            Ok((logs, latest))
        })
        .await?;

    tracing::debug!(user = %user_id, logs = logs.len(), "aggregated summary window");

    Ok(Summary::from_logs(
        Period {
            from: window_start,
            to: now,
        },
        &logs,
        latest,
    ))
}
