//! Insurance policy and lab sample database operations.

use rusqlite::{params, OptionalExtension};

use super::{decode_code, decode_text, Database, DbResult};
use crate::models::{PatientSample, Policy, PolicyStatus, SampleFlowStatus, SampleResult};

impl Database {
    /// Insert a policy, returning its row ID.
    pub fn insert_policy(&self, policy: &Policy) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO policies (
                external_id, patient_id, subscriber_id, policy_id, insurer_id,
                insurer_name, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                policy.external_id,
                policy.patient_id,
                policy.subscriber_id,
                policy.policy_id,
                policy.insurer_id,
                policy.insurer_name,
                policy.status.map(|s| s.as_str()),
                policy.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All policies held by a patient.
    pub fn policies_for_patient(&self, patient_id: i64) -> DbResult<Vec<Policy>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, external_id, patient_id, subscriber_id, policy_id, insurer_id,
                   insurer_name, status, created_at
            FROM policies
            WHERE patient_id = ?
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            let status: Option<String> = row.get(7)?;
            Ok(Policy {
                id: row.get(0)?,
                external_id: row.get(1)?,
                patient_id: row.get(2)?,
                subscriber_id: row.get(3)?,
                policy_id: row.get(4)?,
                insurer_id: row.get(5)?,
                insurer_name: row.get(6)?,
                status: status
                    .map(|raw| decode_text(7, raw, PolicyStatus::parse))
                    .transpose()?,
                created_at: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a lab sample, returning its row ID.
    pub fn insert_patient_sample(&self, sample: &PatientSample) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO patient_samples (
                external_id, patient_id, consultation_id, sample_type, status, result,
                date_of_sample, date_of_result, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                sample.external_id,
                sample.patient_id,
                sample.consultation_id,
                sample.sample_type,
                sample.status.code(),
                sample.result.code(),
                sample.date_of_sample,
                sample.date_of_result,
                sample.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Persist a sample's flow status and result.
    pub fn update_patient_sample(&self, sample: &PatientSample) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_samples SET
                status = ?2,
                result = ?3,
                date_of_sample = ?4,
                date_of_result = ?5
            WHERE id = ?1
            "#,
            params![
                sample.id,
                sample.status.code(),
                sample.result.code(),
                sample.date_of_sample,
                sample.date_of_result,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a sample by row ID.
    pub fn get_patient_sample(&self, id: i64) -> DbResult<Option<PatientSample>> {
        self.query_samples("WHERE id = ?1", params![id])
            .map(|mut samples| samples.pop())
    }

    /// Samples taken for a patient during one consultation.
    pub fn samples_for_consultation(
        &self,
        patient_id: i64,
        consultation_id: i64,
    ) -> DbResult<Vec<PatientSample>> {
        self.query_samples(
            "WHERE patient_id = ?1 AND consultation_id = ?2",
            params![patient_id, consultation_id],
        )
    }

    fn query_samples(
        &self,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> DbResult<Vec<PatientSample>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT id, external_id, patient_id, consultation_id, sample_type, status, result,
                   date_of_sample, date_of_result, created_at
            FROM patient_samples
            {}
            ORDER BY id
            "#,
            filter
        ))?;
        let rows = stmt.query_map(params, |row| {
            Ok(PatientSample {
                id: row.get(0)?,
                external_id: row.get(1)?,
                patient_id: row.get(2)?,
                consultation_id: row.get(3)?,
                sample_type: row.get(4)?,
                status: decode_code(5, row.get(5)?, SampleFlowStatus::from_code)?,
                result: decode_code(6, row.get(6)?, SampleResult::from_code)?,
                date_of_sample: row.get(7)?,
                date_of_result: row.get(8)?,
                created_at: row.get(9)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
