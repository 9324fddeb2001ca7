//! File upload database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{decode_text, Database, DbError, DbResult};
use crate::models::{FileType, FileUpload};

const FILE_COLUMNS: &str = "id, external_id, name, internal_name, file_type, associating_id, \
     upload_completed, is_archived, archive_reason, created_at";

fn file_upload_from_row(row: &Row<'_>) -> rusqlite::Result<FileUpload> {
    Ok(FileUpload {
        id: row.get(0)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        internal_name: row.get(3)?,
        file_type: decode_text(4, row.get(4)?, FileType::parse)?,
        associating_id: row.get(5)?,
        upload_completed: row.get(6)?,
        is_archived: row.get(7)?,
        archive_reason: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl Database {
    /// Insert file metadata, returning its row ID.
    pub fn insert_file_upload(&self, file: &FileUpload) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO file_uploads (
                external_id, name, internal_name, file_type, associating_id,
                upload_completed, is_archived, archive_reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                file.external_id,
                file.name,
                file.internal_name,
                file.file_type.as_str(),
                file.associating_id,
                file.upload_completed,
                file.is_archived,
                file.archive_reason,
                file.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update mutable file metadata.
    pub fn update_file_upload(&self, file: &FileUpload) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE file_uploads SET
                name = ?2,
                upload_completed = ?3,
                is_archived = ?4,
                archive_reason = ?5
            WHERE id = ?1
            "#,
            params![
                file.id,
                file.name,
                file.upload_completed,
                file.is_archived,
                file.archive_reason,
            ],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("file upload {}", file.id)));
        }
        Ok(())
    }

    /// Get a file upload by row ID.
    pub fn get_file_upload(&self, id: i64) -> DbResult<Option<FileUpload>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM file_uploads WHERE id = ?", FILE_COLUMNS),
                [id],
                file_upload_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a file upload by external ID.
    pub fn get_file_upload_by_external_id(&self, external_id: &str) -> DbResult<Option<FileUpload>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM file_uploads WHERE external_id = ?", FILE_COLUMNS),
                [external_id],
                file_upload_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Completed, non-archived files of a type attached to a record.
    pub fn list_file_uploads(
        &self,
        associating_id: &str,
        file_type: FileType,
    ) -> DbResult<Vec<FileUpload>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM file_uploads
            WHERE associating_id = ?1
              AND file_type = ?2
              AND upload_completed = 1
              AND is_archived = 0
            ORDER BY created_at, id
            "#,
            FILE_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![associating_id, file_type.as_str()],
            file_upload_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
