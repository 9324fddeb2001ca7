//! Symptom, prescription and investigation database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{decode_text, Database, DbResult};
use crate::models::{
    ClinicalImpressionStatus, DosageType, EncounterSymptom, InvestigationValue, Prescription,
    PrescriptionType,
};

const PRESCRIPTION_COLUMNS: &str = "id, consultation_id, medicine, prescription_type, \
     dosage_type, base_dosage, target_dosage, route, frequency, days, indicator, max_dosage, \
     min_hours_between_doses, notes, discontinued, created_at";

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    Ok(Prescription {
        id: row.get(0)?,
        consultation_id: row.get(1)?,
        medicine: row.get(2)?,
        prescription_type: decode_text(3, row.get(3)?, PrescriptionType::parse)?,
        dosage_type: decode_text(4, row.get(4)?, DosageType::parse)?,
        base_dosage: row.get(5)?,
        target_dosage: row.get(6)?,
        route: row.get(7)?,
        frequency: row.get(8)?,
        days: row.get(9)?,
        indicator: row.get(10)?,
        max_dosage: row.get(11)?,
        min_hours_between_doses: row.get(12)?,
        notes: row.get(13)?,
        discontinued: row.get(14)?,
        created_at: row.get(15)?,
    })
}

impl Database {
    /// Record a symptom.
    pub fn insert_encounter_symptom(&self, symptom: &EncounterSymptom) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO encounter_symptoms (
                consultation_id, symptom, other_symptom, onset_date, cure_date,
                clinical_impression_status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                symptom.consultation_id,
                symptom.symptom,
                symptom.other_symptom,
                symptom.onset_date,
                symptom.cure_date,
                symptom.clinical_impression_status.as_str(),
                symptom.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Symptoms that began before `encounter_date`, excluding entries made in error.
    pub fn symptoms_before_encounter(
        &self,
        consultation_id: i64,
        encounter_date: DateTime<Utc>,
    ) -> DbResult<Vec<EncounterSymptom>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, consultation_id, symptom, other_symptom, onset_date, cure_date,
                   clinical_impression_status, created_at
            FROM encounter_symptoms
            WHERE consultation_id = ?1
              AND julianday(onset_date) < julianday(?2)
              AND clinical_impression_status != ?3
            ORDER BY onset_date, id
            "#,
        )?;
        let rows = stmt.query_map(
            params![
                consultation_id,
                encounter_date,
                ClinicalImpressionStatus::EnteredInError.as_str()
            ],
            |row| {
                Ok(EncounterSymptom {
                    id: row.get(0)?,
                    consultation_id: row.get(1)?,
                    symptom: row.get(2)?,
                    other_symptom: row.get(3)?,
                    onset_date: row.get(4)?,
                    cure_date: row.get(5)?,
                    clinical_impression_status: decode_text(
                        6,
                        row.get(6)?,
                        ClinicalImpressionStatus::parse,
                    )?,
                    created_at: row.get(7)?,
                })
            },
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record a prescription.
    pub fn insert_prescription(&self, prescription: &Prescription) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                consultation_id, medicine, prescription_type, dosage_type, base_dosage,
                target_dosage, route, frequency, days, indicator, max_dosage,
                min_hours_between_doses, notes, discontinued, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                prescription.consultation_id,
                prescription.medicine,
                prescription.prescription_type.as_str(),
                prescription.dosage_type.as_str(),
                prescription.base_dosage,
                prescription.target_dosage,
                prescription.route,
                prescription.frequency,
                prescription.days,
                prescription.indicator,
                prescription.max_dosage,
                prescription.min_hours_between_doses,
                prescription.notes,
                prescription.discontinued,
                prescription.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Prescriptions of one type: regular doses, then titrated, then PRN; ties by ID.
    pub fn prescriptions_by_priority(
        &self,
        consultation_id: i64,
        prescription_type: PrescriptionType,
    ) -> DbResult<Vec<Prescription>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM prescriptions
            WHERE consultation_id = ?1 AND prescription_type = ?2
            ORDER BY CASE dosage_type
                         WHEN '{}' THEN {}
                         WHEN '{}' THEN {}
                         ELSE {}
                     END,
                     id
            "#,
            PRESCRIPTION_COLUMNS,
            DosageType::Prn.as_str(),
            DosageType::Prn.order_priority(),
            DosageType::Titrated.as_str(),
            DosageType::Titrated.order_priority(),
            DosageType::Regular.order_priority(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![consultation_id, prescription_type.as_str()],
            prescription_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record an investigation value.
    pub fn insert_investigation_value(&self, value: &InvestigationValue) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO investigation_values (
                consultation_id, investigation, investigation_group, value, notes,
                unit, ideal_value, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                value.consultation_id,
                value.investigation,
                value.group,
                value.value,
                value.notes,
                value.unit,
                value.ideal_value,
                value.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Investigations that carry a value or a note.
    pub fn investigations_with_results(&self, consultation_id: i64) -> DbResult<Vec<InvestigationValue>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, consultation_id, investigation, investigation_group, value, notes,
                   unit, ideal_value, created_at
            FROM investigation_values
            WHERE consultation_id = ? AND (value IS NOT NULL OR notes IS NOT NULL)
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([consultation_id], |row| {
            Ok(InvestigationValue {
                id: row.get(0)?,
                consultation_id: row.get(1)?,
                investigation: row.get(2)?,
                group: row.get(3)?,
                value: row.get(4)?,
                notes: row.get(5)?,
                unit: row.get(6)?,
                ideal_value: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
