//! v001 -- Initial schema creation.
//!
//! Creates the read side of the pipeline: `users`, `symptom_logs`,
//! `predictive_logs` and `partner_shares`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    email      TEXT UNIQUE,
    role       TEXT NOT NULL DEFAULT 'user',
    partner_id TEXT,                         -- nullable FK -> users(id)
    created_at TEXT NOT NULL,                -- RFC-3339

    FOREIGN KEY (partner_id) REFERENCES users(id) ON DELETE SET NULL
);

-- ----------------------------------------------------------------
-- Symptom logs
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS symptom_logs (
    id       TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    user_id  TEXT NOT NULL,                  -- FK -> users(id)
    log_date TEXT NOT NULL,                  -- RFC-3339, any offset
    mood     TEXT,                           -- numeric scalar when valid
    notes    TEXT,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_symptom_logs_user_date
    ON symptom_logs(user_id, log_date);

-- ----------------------------------------------------------------
-- Predictive logs
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS predictive_logs (
    id                 TEXT PRIMARY KEY NOT NULL,
    user_id            TEXT NOT NULL,
    predicted_symptoms TEXT NOT NULL,        -- JSON
    created_at         TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_predictive_logs_user_created
    ON predictive_logs(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Partner shares (consent relationships)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS partner_shares (
    id            TEXT PRIMARY KEY NOT NULL,
    user_id       TEXT NOT NULL,
    partner_id    TEXT NOT NULL,
    consent       INTEGER NOT NULL DEFAULT 1, -- boolean 0/1
    shared_fields TEXT NOT NULL DEFAULT '[]', -- JSON array of field ids
    last_shared   TEXT,

    UNIQUE (user_id, partner_id)
);

CREATE INDEX IF NOT EXISTS idx_partner_shares_consent ON partner_shares(consent);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
