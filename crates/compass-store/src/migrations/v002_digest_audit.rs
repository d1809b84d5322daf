//! v002 -- Digest delivery records and the audit trail.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS digest_logs (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4, generated per attempt
    user_id       TEXT NOT NULL,
    partner_id    TEXT NOT NULL,
    digest_type   TEXT NOT NULL,
    fields_shared TEXT NOT NULL,              -- JSON array snapshot
    sent_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_digest_logs_pair
    ON digest_logs(user_id, partner_id, sent_at);

CREATE TABLE IF NOT EXISTS audit_logs (
    id           TEXT PRIMARY KEY NOT NULL,
    actor_id     TEXT NOT NULL,
    action       TEXT NOT NULL,
    target_table TEXT NOT NULL,
    target_id    TEXT NOT NULL,
    ip_address   TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_logs_target
    ON audit_logs(target_table, target_id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
