//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{decode_text, Database, DbResult};
use crate::models::{Gender, MedicalHistoryEntry, Patient, RationCardCategory};

const PATIENT_COLUMNS: &str = "id, external_id, facility_id, name, gender, date_of_birth, \
     year_of_birth, phone_number, address, blood_group, ration_card_category, created_at";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let ration_card: Option<String> = row.get(10)?;
    Ok(Patient {
        id: row.get(0)?,
        external_id: row.get(1)?,
        facility_id: row.get(2)?,
        name: row.get(3)?,
        gender: decode_text(4, row.get(4)?, Gender::parse)?,
        date_of_birth: row.get(5)?,
        year_of_birth: row.get(6)?,
        phone_number: row.get(7)?,
        address: row.get(8)?,
        blood_group: row.get(9)?,
        ration_card_category: ration_card
            .map(|raw| decode_text(10, raw, RationCardCategory::parse))
            .transpose()?,
        created_at: row.get(11)?,
    })
}

impl Database {
    /// Insert a patient, returning its row ID.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                external_id, facility_id, name, gender, date_of_birth, year_of_birth,
                phone_number, address, blood_group, ration_card_category, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                patient.external_id,
                patient.facility_id,
                patient.name,
                patient.gender.as_str(),
                patient.date_of_birth,
                patient.year_of_birth,
                patient.phone_number,
                patient.address,
                patient.blood_group,
                patient.ration_card_category.map(|c| c.as_str()),
                patient.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a patient by row ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient by external ID.
    pub fn get_patient_by_external_id(&self, external_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE external_id = ?", PATIENT_COLUMNS),
                [external_id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Record a pre-existing condition.
    pub fn insert_medical_history(&self, entry: &MedicalHistoryEntry) -> DbResult<i64> {
        self.conn.execute(
            "INSERT INTO medical_history (patient_id, disease, details) VALUES (?1, ?2, ?3)",
            params![entry.patient_id, entry.disease, entry.details],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Full medical history for a patient.
    pub fn medical_history_for_patient(&self, patient_id: i64) -> DbResult<Vec<MedicalHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, disease, details
            FROM medical_history
            WHERE patient_id = ?
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(MedicalHistoryEntry {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                disease: row.get(2)?,
                details: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_insert_and_get_patient() {
        let db = Database::open_in_memory().unwrap();
        let mut patient = Patient::new("Asha".into(), Gender::Female);
        patient.date_of_birth = NaiveDate::from_ymd_opt(1990, 6, 15);
        patient.ration_card_category = Some(RationCardCategory::Bpl);
        patient.blood_group = Some("O+".into());

        let id = db.insert_patient(&patient).unwrap();
        let loaded = db.get_patient(id).unwrap().unwrap();
        assert_eq!(loaded.name, "Asha");
        assert_eq!(loaded.gender, Gender::Female);
        assert_eq!(loaded.date_of_birth, patient.date_of_birth);
        assert_eq!(loaded.ration_card_category, Some(RationCardCategory::Bpl));

        let by_external = db.get_patient_by_external_id(&patient.external_id).unwrap().unwrap();
        assert_eq!(by_external.id, id);
        assert!(db.get_patient_by_external_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_unknown_gender_is_a_decode_error() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_patient(&Patient::new("X".into(), Gender::Male)).unwrap();
        db.conn()
            .execute("UPDATE patients SET gender = 'robot' WHERE id = ?", [id])
            .unwrap();
        assert!(db.get_patient(id).is_err());
    }

    #[test]
    fn test_medical_history() {
        let db = Database::open_in_memory().unwrap();
        let patient_id = db.insert_patient(&Patient::new("Ravi".into(), Gender::Male)).unwrap();
        db.insert_medical_history(&MedicalHistoryEntry::new(patient_id, "Diabetes".into())).unwrap();
        let mut hypertension = MedicalHistoryEntry::new(patient_id, "Hypertension".into());
        hypertension.details = Some("since 2015".into());
        db.insert_medical_history(&hypertension).unwrap();

        let history = db.medical_history_for_patient(patient_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].disease, "Diabetes");
        assert_eq!(history[1].details.as_deref(), Some("since 2015"));
    }
}
