use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;
use crate::models::profile::UserProfileRecord;

impl TryFrom<&Row<'_>> for UserProfileRecord {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.get("user_id")?,
            display_name: row.get("display_name")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct ProfileRepository;

impl ProfileRepository {
    pub fn insert(conn: &Connection, record: &UserProfileRecord) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO user_profiles (user_id, display_name, created_at)
                VALUES (:user_id, :display_name, :created_at)
            "#,
            named_params! {
                ":user_id": &record.user_id,
                ":display_name": &record.display_name,
                ":created_at": &record.created_at,
            },
        )?;

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, user_id: &str) -> AppResult<Option<UserProfileRecord>> {
        let mut stmt = conn.prepare(
            "SELECT user_id, display_name, created_at FROM user_profiles WHERE user_id = ?1",
        )?;

        let row = stmt
            .query_row([user_id], |row| UserProfileRecord::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<UserProfileRecord>> {
        let mut stmt = conn.prepare(
            "SELECT user_id, display_name, created_at FROM user_profiles ORDER BY user_id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| UserProfileRecord::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
