//! Facility database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Facility;

const FACILITY_COLUMNS: &str = "id, external_id, name, district, facility_type, address, \
     latitude, longitude, oxygen_capacity, phone_number, created_at";

fn facility_from_row(row: &Row<'_>) -> rusqlite::Result<Facility> {
    Ok(Facility {
        id: row.get(0)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        district: row.get(3)?,
        facility_type: row.get(4)?,
        address: row.get(5)?,
        latitude: row.get(6)?,
        longitude: row.get(7)?,
        oxygen_capacity: row.get(8)?,
        phone_number: row.get(9)?,
        created_at: row.get(10)?,
    })
}

impl Database {
    /// Insert a facility, returning its row ID.
    pub fn insert_facility(&self, facility: &Facility) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO facilities (
                external_id, name, district, facility_type, address,
                latitude, longitude, oxygen_capacity, phone_number, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                facility.external_id,
                facility.name,
                facility.district,
                facility.facility_type,
                facility.address,
                facility.latitude,
                facility.longitude,
                facility.oxygen_capacity,
                facility.phone_number,
                facility.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a facility by row ID.
    pub fn get_facility(&self, id: i64) -> DbResult<Option<Facility>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM facilities WHERE id = ?", FACILITY_COLUMNS),
                [id],
                facility_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List facilities in a district, by name.
    pub fn list_facilities_in_district(&self, district: &str) -> DbResult<Vec<Facility>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM facilities WHERE district = ? ORDER BY name",
            FACILITY_COLUMNS
        ))?;
        let rows = stmt.query_map([district], facility_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get_facility() {
        let db = Database::open_in_memory().unwrap();
        let mut facility = Facility::new("Taluk Hospital".into(), "Kollam".into(), "Government Hospital".into());
        facility.latitude = Some(8.89);
        facility.longitude = Some(76.61);
        facility.oxygen_capacity = 400;

        let id = db.insert_facility(&facility).unwrap();
        let loaded = db.get_facility(id).unwrap().unwrap();

        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "Taluk Hospital");
        assert_eq!(loaded.location(), Some((8.89, 76.61)));
        assert_eq!(loaded.oxygen_capacity, 400);
        assert!(db.get_facility(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_list_by_district() {
        let db = Database::open_in_memory().unwrap();
        db.insert_facility(&Facility::new("B".into(), "Kollam".into(), "CHC".into())).unwrap();
        db.insert_facility(&Facility::new("A".into(), "Kollam".into(), "PHC".into())).unwrap();
        db.insert_facility(&Facility::new("C".into(), "Idukki".into(), "PHC".into())).unwrap();

        let names: Vec<String> = db
            .list_facilities_in_district("Kollam")
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
