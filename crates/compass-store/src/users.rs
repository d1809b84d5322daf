//! Account lookups.  Accounts are owned by the account subsystem; the insert
//! helper exists for fixtures and local tooling.

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::{opt_uuid_at, optional, ts_at, ts_to_sql, uuid_at, User};

impl Database {
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, email, role, partner_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.email,
                user.role,
                user.partner_id.map(|p| p.to_string()),
                ts_to_sql(&user.created_at),
            ],
        )?;
        Ok(())
    }

    /// Fetch a user by id, `None` when absent.
    pub fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        optional(self.conn().query_row(
            "SELECT id, email, role, partner_id, created_at
             FROM users WHERE id = ?1",
            params![id.to_string()],
            row_to_user,
        ))
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        email: row.get(1)?,
        role: row.get(2)?,
        partner_id: opt_uuid_at(row, 3)?,
        created_at: ts_at(row, 4)?,
    })
}
