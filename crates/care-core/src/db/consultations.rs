//! Consultation database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{decode_text, Database, DbResult};
use crate::models::{Consultation, DischargeReason};

const CONSULTATION_COLUMNS: &str = "c.id, c.external_id, c.patient_id, c.facility_id, \
     c.encounter_date, c.discharge_date, c.discharge_reason, c.discharge_notes, \
     c.ip_no, c.op_no, c.treating_physician, c.created_at";

fn consultation_from_row(row: &Row<'_>) -> rusqlite::Result<Consultation> {
    let reason: Option<String> = row.get(6)?;
    Ok(Consultation {
        id: row.get(0)?,
        external_id: row.get(1)?,
        patient_id: row.get(2)?,
        facility_id: row.get(3)?,
        encounter_date: row.get(4)?,
        discharge_date: row.get(5)?,
        discharge_reason: reason
            .map(|raw| decode_text(6, raw, DischargeReason::parse))
            .transpose()?,
        discharge_notes: row.get(7)?,
        ip_no: row.get(8)?,
        op_no: row.get(9)?,
        treating_physician: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl Database {
    /// Insert a consultation, returning its row ID.
    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO consultations (
                external_id, patient_id, facility_id, encounter_date, discharge_date,
                discharge_reason, discharge_notes, ip_no, op_no, treating_physician, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                consultation.external_id,
                consultation.patient_id,
                consultation.facility_id,
                consultation.encounter_date,
                consultation.discharge_date,
                consultation.discharge_reason.map(|r| r.as_str()),
                consultation.discharge_notes,
                consultation.ip_no,
                consultation.op_no,
                consultation.treating_physician,
                consultation.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a consultation by row ID.
    pub fn get_consultation(&self, id: i64) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM consultations c WHERE c.id = ?", CONSULTATION_COLUMNS),
                [id],
                consultation_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a consultation by external ID.
    pub fn get_consultation_by_external_id(
        &self,
        external_id: &str,
    ) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM consultations c WHERE c.external_id = ?",
                    CONSULTATION_COLUMNS
                ),
                [external_id],
                consultation_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Most recently created consultation of a patient, by patient external ID.
    pub fn latest_consultation_for_patient(
        &self,
        patient_external_id: &str,
    ) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT {}
                    FROM consultations c
                    JOIN patients p ON p.id = c.patient_id
                    WHERE p.external_id = ?
                    ORDER BY c.created_at DESC, c.id DESC
                    LIMIT 1
                    "#,
                    CONSULTATION_COLUMNS
                ),
                [patient_external_id],
                consultation_from_row,
            )
            .optional()
            .map_err(Into::into)
    }
}
