//! Prescription ordering on discharge summaries.

use chrono::Utc;
use proptest::prelude::*;

use care_core::db::Database;
use care_core::models::{Consultation, DosageType, Gender, Patient, Prescription, PrescriptionType};

fn consultation(db: &Database) -> Consultation {
    let mut patient = Patient::new("Meera".into(), Gender::Female);
    patient.id = db.insert_patient(&patient).unwrap();
    let mut consultation = Consultation::new(patient.id, Utc::now());
    consultation.id = db.insert_consultation(&consultation).unwrap();
    consultation
}

fn dosage_type() -> impl Strategy<Value = DosageType> {
    prop_oneof![
        Just(DosageType::Regular),
        Just(DosageType::Prn),
        Just(DosageType::Titrated),
    ]
}

#[test]
fn test_regular_and_discharge_lists_are_separate() {
    let db = Database::open_in_memory().unwrap();
    let consultation = consultation(&db);

    for (medicine, ptype) in [
        ("Ceftriaxone", PrescriptionType::Regular),
        ("Amoxicillin", PrescriptionType::Discharge),
    ] {
        let prescription =
            Prescription::new(consultation.id, medicine.into(), ptype, DosageType::Regular);
        db.insert_prescription(&prescription).unwrap();
    }

    let regular = db
        .prescriptions_by_priority(consultation.id, PrescriptionType::Regular)
        .unwrap();
    let discharge = db
        .prescriptions_by_priority(consultation.id, PrescriptionType::Discharge)
        .unwrap();

    assert_eq!(regular.len(), 1);
    assert_eq!(regular[0].medicine, "Ceftriaxone");
    assert_eq!(discharge.len(), 1);
    assert_eq!(discharge[0].medicine, "Amoxicillin");
}

proptest! {
    #[test]
    fn prop_regular_then_titrated_then_prn(types in prop::collection::vec(dosage_type(), 0..12)) {
        let db = Database::open_in_memory().unwrap();
        let consultation = consultation(&db);

        for (i, dosage_type) in types.iter().enumerate() {
            let prescription = Prescription::new(
                consultation.id,
                format!("medicine-{}", i),
                PrescriptionType::Regular,
                *dosage_type,
            );
            db.insert_prescription(&prescription).unwrap();
        }

        let ordered = db
            .prescriptions_by_priority(consultation.id, PrescriptionType::Regular)
            .unwrap();

        prop_assert_eq!(ordered.len(), types.len());
        for pair in ordered.windows(2) {
            let key = |p: &Prescription| (p.dosage_type.order_priority(), p.id);
            prop_assert!(key(&pair[0]) < key(&pair[1]));
        }
    }
}
