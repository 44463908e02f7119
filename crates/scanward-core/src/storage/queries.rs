use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::models::{OwnerRef, TrackedFile};
use super::sqlite::Database;
use super::FileStore;
use crate::error::{Error, Result};
use crate::status::FileStatus;

const SELECT_TRACKED_FILE: &str = "SELECT id, path, status, owner_type, owner_id, viruses_found, \
     url, created_at, updated_at, scanned_at FROM tracked_file";

impl ToSql for FileStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for FileStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = i64::column_result(value)?;
        FileStatus::from_code(code).map_err(|_| FromSqlError::OutOfRange(code))
    }
}

fn tracked_file_from_row(row: &Row<'_>) -> rusqlite::Result<TrackedFile> {
    let owner_type: Option<String> = row.get(3)?;
    let owner_id: Option<i64> = row.get(4)?;
    let owner = match (owner_type, owner_id) {
        (Some(entity_type), Some(entity_id)) => Some(OwnerRef {
            entity_type,
            entity_id,
        }),
        _ => None,
    };

    Ok(TrackedFile {
        id: row.get(0)?,
        path: row.get(1)?,
        status: row.get(2)?,
        owner,
        viruses_found: row.get(5)?,
        url: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        scanned_at: row.get(9)?,
    })
}

impl Database {
    fn query_files<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<TrackedFile>> {
        let mut stmt = self.connection().prepare(sql)?;
        let files = stmt
            .query_map(params, tracked_file_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    fn query_file<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Option<TrackedFile>> {
        let file = self
            .connection()
            .query_row(sql, params, tracked_file_from_row)
            .optional()?;
        Ok(file)
    }

    pub fn count_by_status(&self) -> Result<Vec<(FileStatus, i64)>> {
        let mut stmt = self.connection().prepare(
            "SELECT status, COUNT(*) FROM tracked_file GROUP BY status ORDER BY status DESC",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }
}

impl FileStore for Database {
    fn get_or_create(
        &self,
        owner: Option<&OwnerRef>,
        path: &str,
        url: Option<&str>,
    ) -> Result<TrackedFile> {
        let now = chrono::Utc::now().to_rfc3339();
        let inserted = self.connection().execute(
            "INSERT INTO tracked_file \
             (path, status, owner_type, owner_id, viruses_found, url, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, '', ?5, ?6, ?6) \
             ON CONFLICT(path) DO NOTHING",
            params![
                path,
                FileStatus::Standing,
                owner.map(|o| o.entity_type.as_str()),
                owner.map(|o| o.entity_id),
                url,
                now,
            ],
        )?;
        if inserted > 0 {
            debug!("Tracking new file {}", path);
        }

        self.get_by_path(path)?
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    fn get(&self, id: i64) -> Result<Option<TrackedFile>> {
        self.query_file(&format!("{} WHERE id = ?1", SELECT_TRACKED_FILE), params![id])
    }

    fn get_by_path(&self, path: &str) -> Result<Option<TrackedFile>> {
        self.query_file(
            &format!("{} WHERE path = ?1", SELECT_TRACKED_FILE),
            params![path],
        )
    }

    fn save(&self, file: &TrackedFile) -> Result<()> {
        let updated = self.connection().execute(
            "UPDATE tracked_file SET status = ?1, viruses_found = ?2, updated_at = ?3, \
             scanned_at = ?4 WHERE id = ?5",
            params![
                file.status,
                file.viruses_found,
                file.updated_at,
                file.scanned_at,
                file.id
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("id {}", file.id)));
        }
        debug!("Saved {} as '{}'", file.path, file.status);
        Ok(())
    }

    fn list(&self, status: Option<FileStatus>) -> Result<Vec<TrackedFile>> {
        self.query_files(
            &format!(
                "{} WHERE (?1 IS NULL OR status = ?1) ORDER BY id",
                SELECT_TRACKED_FILE
            ),
            params![status],
        )
    }

    fn list_for_owner(&self, owner: &OwnerRef) -> Result<Vec<TrackedFile>> {
        self.query_files(
            &format!(
                "{} WHERE owner_type = ?1 AND owner_id = ?2 ORDER BY id",
                SELECT_TRACKED_FILE
            ),
            params![owner.entity_type, owner.entity_id],
        )
    }

    fn truncate_all(&self) -> Result<()> {
        self.connection().execute_batch("DELETE FROM tracked_file;")?;
        debug!("All tracked files deleted");
        Ok(())
    }
}
