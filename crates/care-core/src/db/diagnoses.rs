//! Diagnosis database operations.

use rusqlite::{params, params_from_iter, OptionalExtension};

use super::{decode_text, Database, DbResult};
use crate::models::{
    ConsultationDiagnosis, Icd11Diagnosis, VerificationStatus, ACTIVE_VERIFICATION_STATUSES,
};

impl Database {
    /// Insert or replace an ICD-11 reference entry.
    pub fn upsert_icd11_diagnosis(&self, diagnosis: &Icd11Diagnosis) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO icd11_diagnoses (id, label, chapter) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET label = excluded.label, chapter = excluded.chapter
            "#,
            params![diagnosis.id, diagnosis.label, diagnosis.chapter],
        )?;
        Ok(())
    }

    /// Look up an ICD-11 reference entry.
    pub fn get_icd11_diagnosis(&self, id: i64) -> DbResult<Option<Icd11Diagnosis>> {
        self.conn
            .query_row(
                "SELECT id, label, chapter FROM icd11_diagnoses WHERE id = ?",
                [id],
                |row| {
                    Ok(Icd11Diagnosis {
                        id: row.get(0)?,
                        label: row.get(1)?,
                        chapter: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Record a diagnosis against a consultation.
    pub fn insert_consultation_diagnosis(&self, diagnosis: &ConsultationDiagnosis) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO consultation_diagnoses (
                consultation_id, diagnosis_id, verification_status, is_principal, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                diagnosis.consultation_id,
                diagnosis.diagnosis_id,
                diagnosis.verification_status.as_str(),
                diagnosis.is_principal,
                diagnosis.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Diagnoses with an active verification status, newest first.
    pub fn active_consultation_diagnoses(
        &self,
        consultation_id: i64,
    ) -> DbResult<Vec<ConsultationDiagnosis>> {
        let placeholders = vec!["?"; ACTIVE_VERIFICATION_STATUSES.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, consultation_id, diagnosis_id, verification_status, is_principal, created_at
            FROM consultation_diagnoses
            WHERE consultation_id = ? AND verification_status IN ({})
            ORDER BY created_at DESC, id DESC
            "#,
            placeholders
        );

        let mut values: Vec<rusqlite::types::Value> = vec![consultation_id.into()];
        values.extend(
            ACTIVE_VERIFICATION_STATUSES
                .iter()
                .map(|status| status.as_str().to_string().into()),
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(ConsultationDiagnosis {
                id: row.get(0)?,
                consultation_id: row.get(1)?,
                diagnosis_id: row.get(2)?,
                verification_status: decode_text(3, row.get(3)?, VerificationStatus::parse)?,
                is_principal: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
