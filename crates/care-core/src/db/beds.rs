//! Bed database operations.

use rusqlite::params;

use super::{decode_code, Database, DbResult};
use crate::models::{Bed, BedType, ConsultationBed};

impl Database {
    /// Insert a bed, returning its row ID.
    pub fn insert_bed(&self, bed: &Bed) -> DbResult<i64> {
        self.conn.execute(
            "INSERT INTO beds (external_id, facility_id, name, bed_type) VALUES (?1, ?2, ?3, ?4)",
            params![bed.external_id, bed.facility_id, bed.name, bed.bed_type.code()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Assign a bed to a consultation.
    pub fn insert_consultation_bed(&self, assignment: &ConsultationBed) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO consultation_beds (consultation_id, bed_id, start_date, end_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                assignment.consultation_id,
                assignment.bed_id,
                assignment.start_date,
                assignment.end_date,
                assignment.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Bed types of every assignment, newest assignment first. May repeat.
    pub fn assigned_bed_types(&self, consultation_id: i64) -> DbResult<Vec<BedType>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT b.bed_type
            FROM consultation_beds cb
            JOIN beds b ON b.id = cb.bed_id
            WHERE cb.consultation_id = ?
            ORDER BY cb.created_at DESC, cb.id DESC
            "#,
        )?;
        let rows = stmt.query_map([consultation_id], |row| {
            decode_code(0, row.get(0)?, BedType::from_code)
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
