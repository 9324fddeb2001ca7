//! SQLite schema definition.

/// Complete database schema for the care backend.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Facilities & Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS facilities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    district TEXT NOT NULL,
    facility_type TEXT NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    latitude REAL,
    longitude REAL,
    oxygen_capacity INTEGER NOT NULL DEFAULT 0,
    phone_number TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    facility_id INTEGER REFERENCES facilities(id),
    name TEXT NOT NULL,
    gender TEXT NOT NULL,                        -- male | female | non_binary
    date_of_birth TEXT,
    year_of_birth INTEGER,
    phone_number TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    blood_group TEXT,
    ration_card_category TEXT,                   -- NO_CARD | BPL | APL
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_facility ON patients(facility_id);

-- ============================================================================
-- Consultations
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    facility_id INTEGER REFERENCES facilities(id),
    encounter_date TEXT NOT NULL,
    discharge_date TEXT,
    discharge_reason TEXT,                       -- REC | REF | EXP | LAMA
    discharge_notes TEXT,
    ip_no TEXT,
    op_no TEXT,
    treating_physician TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient ON consultations(patient_id, created_at);

-- ============================================================================
-- Diagnoses
-- ============================================================================

-- ICD-11 reference data
CREATE TABLE IF NOT EXISTS icd11_diagnoses (
    id INTEGER PRIMARY KEY,
    label TEXT NOT NULL,
    chapter TEXT
);

-- No foreign key on diagnosis_id: references may not resolve
CREATE TABLE IF NOT EXISTS consultation_diagnoses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    consultation_id INTEGER NOT NULL REFERENCES consultations(id),
    diagnosis_id INTEGER NOT NULL,
    verification_status TEXT NOT NULL,
    is_principal INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consultation_diagnoses ON consultation_diagnoses(consultation_id, created_at);

-- ============================================================================
-- Clinical records
-- ============================================================================

CREATE TABLE IF NOT EXISTS encounter_symptoms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    consultation_id INTEGER NOT NULL REFERENCES consultations(id),
    symptom TEXT NOT NULL,
    other_symptom TEXT,
    onset_date TEXT NOT NULL,
    cure_date TEXT,
    clinical_impression_status TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_symptoms_consultation ON encounter_symptoms(consultation_id);

CREATE TABLE IF NOT EXISTS prescriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    consultation_id INTEGER NOT NULL REFERENCES consultations(id),
    medicine TEXT NOT NULL,
    prescription_type TEXT NOT NULL,             -- REGULAR | DISCHARGE
    dosage_type TEXT NOT NULL,                   -- REGULAR | PRN | TITRATED
    base_dosage TEXT,
    target_dosage TEXT,
    route TEXT,
    frequency TEXT,
    days INTEGER,
    indicator TEXT,
    max_dosage TEXT,
    min_hours_between_doses REAL,
    notes TEXT,
    discontinued INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_consultation ON prescriptions(consultation_id, prescription_type);

CREATE TABLE IF NOT EXISTS investigation_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    consultation_id INTEGER NOT NULL REFERENCES consultations(id),
    investigation TEXT NOT NULL,
    investigation_group TEXT,
    value REAL,
    notes TEXT,
    unit TEXT,
    ideal_value TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_investigations_consultation ON investigation_values(consultation_id);

CREATE TABLE IF NOT EXISTS medical_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    disease TEXT NOT NULL,
    details TEXT
);

-- ============================================================================
-- Beds
-- ============================================================================

CREATE TABLE IF NOT EXISTS beds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    facility_id INTEGER REFERENCES facilities(id),
    name TEXT NOT NULL,
    bed_type INTEGER NOT NULL                    -- 1..7, see BedType
);

CREATE TABLE IF NOT EXISTS consultation_beds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    consultation_id INTEGER NOT NULL REFERENCES consultations(id),
    bed_id INTEGER NOT NULL REFERENCES beds(id),
    start_date TEXT NOT NULL,
    end_date TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consultation_beds ON consultation_beds(consultation_id, created_at);

-- ============================================================================
-- Insurance & Samples
-- ============================================================================

CREATE TABLE IF NOT EXISTS policies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    subscriber_id TEXT NOT NULL,
    policy_id TEXT NOT NULL,
    insurer_id TEXT,
    insurer_name TEXT,
    status TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patient_samples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    consultation_id INTEGER NOT NULL REFERENCES consultations(id),
    sample_type TEXT,
    status INTEGER NOT NULL DEFAULT 1,           -- 1..7, see SampleFlowStatus
    result INTEGER NOT NULL DEFAULT 3,           -- 1..4, see SampleResult
    date_of_sample TEXT,
    date_of_result TEXT,
    created_at TEXT NOT NULL
);

-- ============================================================================
-- File uploads
-- ============================================================================

CREATE TABLE IF NOT EXISTS file_uploads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    internal_name TEXT NOT NULL UNIQUE,
    file_type TEXT NOT NULL,
    associating_id TEXT NOT NULL,                -- external id of the owner
    upload_completed INTEGER NOT NULL DEFAULT 0,
    is_archived INTEGER NOT NULL DEFAULT 0,
    archive_reason TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_file_uploads_owner ON file_uploads(associating_id, file_type);
"#;
