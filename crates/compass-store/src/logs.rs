//! Symptom and predictive log reads.  Both tables are written by the logging
//! subsystem; inserts here back fixtures and local tooling.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::{json_at, optional, ts_at, ts_to_sql, uuid_at, PredictiveLog, SymptomLog};

/// One second, in days.
const JULIANDAY_SLACK: f64 = 1.0 / 86_400.0;

impl Database {
    pub fn insert_symptom_log(&self, log: &SymptomLog) -> Result<()> {
        self.conn().execute(
            "INSERT INTO symptom_logs (id, user_id, log_date, mood, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                log.id.to_string(),
                log.user_id.to_string(),
                ts_to_sql(&log.log_date),
                log.mood,
                log.notes,
            ],
        )?;
        Ok(())
    }

    /// All logs for `user_id` with `log_date >= since`, oldest first.
    ///
    /// `log_date` may hold any RFC 3339 form (offset, precision).  SQL narrows
    /// by `julianday`, which is only millisecond-accurate, so the exact bound
    /// and order are applied to the parsed instants.
    pub fn symptom_logs_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<SymptomLog>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, log_date, mood, notes
             FROM symptom_logs
             WHERE user_id = ?1 AND julianday(log_date) >= julianday(?2) - ?3
             ORDER BY julianday(log_date) ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(
            params![user_id.to_string(), ts_to_sql(&since), JULIANDAY_SLACK],
            row_to_symptom_log,
        )?;

        let mut logs = Vec::new();
        for row in rows {
            let log = row?;
            if log.log_date >= since {
                logs.push(log);
            }
        }
        logs.sort_by_key(|l| l.log_date);
        Ok(logs)
    }

    pub fn insert_predictive_log(&self, log: &PredictiveLog) -> Result<()> {
        self.conn().execute(
            "INSERT INTO predictive_logs (id, user_id, predicted_symptoms, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                log.id.to_string(),
                log.user_id.to_string(),
                serde_json::to_string(&log.predicted_symptoms)?,
                ts_to_sql(&log.created_at),
            ],
        )?;
        Ok(())
    }

    /// Most recent forecast for `user_id`, if any.
    pub fn latest_predictive_log(&self, user_id: Uuid) -> Result<Option<PredictiveLog>> {
        optional(self.conn().query_row(
            "SELECT id, user_id, predicted_symptoms, created_at
             FROM predictive_logs
             WHERE user_id = ?1
             ORDER BY julianday(created_at) DESC, rowid DESC
             LIMIT 1",
            params![user_id.to_string()],
            |row| {
                Ok(PredictiveLog {
                    id: uuid_at(row, 0)?,
                    user_id: uuid_at(row, 1)?,
                    predicted_symptoms: json_at(row, 2)?,
                    created_at: ts_at(row, 3)?,
                })
            },
        ))
    }
}

fn row_to_symptom_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymptomLog> {
    Ok(SymptomLog {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        log_date: ts_at(row, 2)?,
        mood: row.get(3)?,
        notes: row.get(4)?,
    })
}
