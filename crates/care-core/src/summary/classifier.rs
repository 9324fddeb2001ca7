//! Diagnosis classification.
//!
//! Recorded diagnoses reference ICD-11 entities by ID. Each reference is
//! resolved; those that do not resolve are dropped and counted. Every
//! resolved diagnosis lands in exactly one verification-status bucket and,
//! if flagged, also in the principal bucket.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::models::{
    ConsultationDiagnosis, DiagnosisResolution, Icd11Diagnosis, ResolvedDiagnosis,
    VerificationStatus,
};

/// Resolves ICD-11 references.
pub trait DiagnosisLookup {
    fn resolve(&self, diagnosis_id: i64) -> DbResult<DiagnosisResolution>;
}

impl DiagnosisLookup for Database {
    fn resolve(&self, diagnosis_id: i64) -> DbResult<DiagnosisResolution> {
        Ok(match self.get_icd11_diagnosis(diagnosis_id)? {
            Some(diagnosis) => DiagnosisResolution::Found(diagnosis),
            None => DiagnosisResolution::NotFound(diagnosis_id),
        })
    }
}

impl DiagnosisLookup for HashMap<i64, Icd11Diagnosis> {
    fn resolve(&self, diagnosis_id: i64) -> DbResult<DiagnosisResolution> {
        Ok(match self.get(&diagnosis_id) {
            Some(diagnosis) => DiagnosisResolution::Found(diagnosis.clone()),
            None => DiagnosisResolution::NotFound(diagnosis_id),
        })
    }
}

/// Diagnoses partitioned by role and verification status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagnosisBuckets {
    pub principal: Vec<ResolvedDiagnosis>,
    pub unconfirmed: Vec<ResolvedDiagnosis>,
    pub provisional: Vec<ResolvedDiagnosis>,
    pub differential: Vec<ResolvedDiagnosis>,
    pub confirmed: Vec<ResolvedDiagnosis>,
    /// IDs that did not resolve
    pub unresolved: Vec<i64>,
}

impl DiagnosisBuckets {
    /// Status buckets in report order: confirmed, provisional, unconfirmed, differential.
    pub fn flattened(&self) -> Vec<ResolvedDiagnosis> {
        self.confirmed
            .iter()
            .chain(&self.provisional)
            .chain(&self.unconfirmed)
            .chain(&self.differential)
            .cloned()
            .collect()
    }

    pub fn dropped(&self) -> usize {
        self.unresolved.len()
    }
}

/// Classify `entries`, which should be newest first. Order is kept within buckets.
///
/// Entries with an inactive status are ignored.
pub fn classify_diagnoses(
    entries: &[ConsultationDiagnosis],
    lookup: &dyn DiagnosisLookup,
) -> DbResult<DiagnosisBuckets> {
    let mut buckets = DiagnosisBuckets::default();

    for entry in entries.iter().filter(|e| e.verification_status.is_active()) {
        let diagnosis = match lookup.resolve(entry.diagnosis_id)? {
            DiagnosisResolution::Found(diagnosis) => diagnosis,
            DiagnosisResolution::NotFound(id) => {
                tracing::debug!(diagnosis_id = id, "skipping unresolved diagnosis");
                buckets.unresolved.push(id);
                continue;
            }
        };

        let resolved = ResolvedDiagnosis {
            diagnosis,
            verification_status: entry.verification_status,
        };

        if entry.is_principal {
            buckets.principal.push(resolved.clone());
        }
        match entry.verification_status {
            VerificationStatus::Unconfirmed => buckets.unconfirmed.push(resolved),
            VerificationStatus::Provisional => buckets.provisional.push(resolved),
            VerificationStatus::Differential => buckets.differential.push(resolved),
            VerificationStatus::Confirmed => buckets.confirmed.push(resolved),
            VerificationStatus::Refuted | VerificationStatus::EnteredInError => {}
        }
    }

    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn icd(id: i64) -> Icd11Diagnosis {
        Icd11Diagnosis {
            id,
            label: format!("Diagnosis {}", id),
            chapter: None,
        }
    }

    fn entry(diagnosis_id: i64, status: VerificationStatus, principal: bool) -> ConsultationDiagnosis {
        ConsultationDiagnosis::new(1, diagnosis_id, status, principal)
    }

    fn catalog(ids: &[i64]) -> HashMap<i64, Icd11Diagnosis> {
        ids.iter().map(|&id| (id, icd(id))).collect()
    }

    #[test]
    fn test_principal_also_in_status_bucket() {
        let lookup = catalog(&[1, 2]);
        let entries = vec![
            entry(1, VerificationStatus::Confirmed, true),
            entry(2, VerificationStatus::Provisional, false),
        ];

        let buckets = classify_diagnoses(&entries, &lookup).unwrap();
        assert_eq!(buckets.principal.len(), 1);
        assert_eq!(buckets.principal[0].diagnosis.id, 1);
        assert_eq!(buckets.confirmed.len(), 1);
        assert_eq!(buckets.provisional.len(), 1);
        assert_eq!(buckets.confirmed[0].verification_status, VerificationStatus::Confirmed);
    }

    #[test]
    fn test_unresolved_are_dropped() {
        let lookup = catalog(&[1]);
        let entries = vec![
            entry(1, VerificationStatus::Differential, false),
            entry(404, VerificationStatus::Confirmed, true),
        ];

        let buckets = classify_diagnoses(&entries, &lookup).unwrap();
        assert_eq!(buckets.differential.len(), 1);
        assert!(buckets.confirmed.is_empty());
        assert!(buckets.principal.is_empty());
        assert_eq!(buckets.unresolved, vec![404]);
        assert_eq!(buckets.dropped(), 1);
    }

    #[test]
    fn test_flattened_order() {
        let lookup = catalog(&[1, 2, 3, 4]);
        let entries = vec![
            entry(1, VerificationStatus::Differential, false),
            entry(2, VerificationStatus::Unconfirmed, false),
            entry(3, VerificationStatus::Provisional, false),
            entry(4, VerificationStatus::Confirmed, false),
        ];

        let ids: Vec<i64> = classify_diagnoses(&entries, &lookup)
            .unwrap()
            .flattened()
            .iter()
            .map(|d| d.diagnosis.id)
            .collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_inactive_entries_ignored() {
        let lookup = catalog(&[1, 2]);
        let entries = vec![
            entry(1, VerificationStatus::Refuted, true),
            entry(2, VerificationStatus::EnteredInError, false),
        ];
        let buckets = classify_diagnoses(&entries, &lookup).unwrap();
        assert_eq!(buckets, DiagnosisBuckets::default());
    }

    #[test]
    fn test_database_lookup() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_icd11_diagnosis(&icd(7)).unwrap();
        assert_eq!(db.resolve(7).unwrap(), DiagnosisResolution::Found(icd(7)));
        assert_eq!(db.resolve(8).unwrap(), DiagnosisResolution::NotFound(8));
    }

    fn active_status() -> impl Strategy<Value = VerificationStatus> {
        prop_oneof![
            Just(VerificationStatus::Unconfirmed),
            Just(VerificationStatus::Provisional),
            Just(VerificationStatus::Differential),
            Just(VerificationStatus::Confirmed),
        ]
    }

    proptest! {
        #[test]
        fn prop_each_diagnosis_in_exactly_one_status_bucket(
            records in prop::collection::vec((0i64..20, active_status(), any::<bool>()), 0..30)
        ) {
            // Even IDs resolve, odd IDs do not
            let known: Vec<i64> = (0..20).filter(|id| id % 2 == 0).collect();
            let lookup = catalog(&known);
            let entries: Vec<ConsultationDiagnosis> = records
                .iter()
                .map(|&(id, status, principal)| entry(id, status, principal))
                .collect();

            let buckets = classify_diagnoses(&entries, &lookup).unwrap();

            let resolved = records.iter().filter(|(id, _, _)| id % 2 == 0).count();
            let in_status_buckets = buckets.confirmed.len()
                + buckets.provisional.len()
                + buckets.unconfirmed.len()
                + buckets.differential.len();
            prop_assert_eq!(in_status_buckets, resolved);
            prop_assert_eq!(buckets.dropped(), records.len() - resolved);

            let principal = records
                .iter()
                .filter(|(id, _, principal)| id % 2 == 0 && *principal)
                .count();
            prop_assert_eq!(buckets.principal.len(), principal);

            for (bucket, status) in [
                (&buckets.confirmed, VerificationStatus::Confirmed),
                (&buckets.provisional, VerificationStatus::Provisional),
                (&buckets.unconfirmed, VerificationStatus::Unconfirmed),
                (&buckets.differential, VerificationStatus::Differential),
            ] {
                prop_assert!(bucket.iter().all(|d| d.verification_status == status));
            }
        }
    }
}
