//! Vitals database operations.

use rusqlite::{params, OptionalExtension};

use super::{map_write_err, Database, DbError, DbResult};
use crate::derivation;
use crate::models::{Vitals, VitalsInput};
use crate::rules;

impl Database {
    /// Record a vitals reading for an appointment. BMI is derived from the
    /// submitted weight and height; invalid sources reject the whole write
    /// before any derivation runs.
    pub fn record_vitals(&self, input: &VitalsInput) -> DbResult<Vitals> {
        validate_vitals(input)?;
        let bmi = derivation::bmi(input.weight_kg, input.height_cm);
        let recorded_at = self.now().to_rfc3339();

        self.conn
            .execute(
                r#"
                INSERT INTO vitals (
                    appointment_id, weight_kg, height_cm, bmi,
                    temperature_c, heart_rate, systolic, diastolic, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    input.appointment_id,
                    input.weight_kg,
                    input.height_cm,
                    bmi,
                    input.temperature_c,
                    input.heart_rate,
                    input.systolic,
                    input.diastolic,
                    recorded_at,
                ],
            )
            .map_err(|e| map_write_err(e, "vitals"))?;

        let id = self.conn.last_insert_rowid();
        self.get_vitals(id)?
            .ok_or_else(|| DbError::NotFound(format!("vitals {}", id)))
    }

    /// Replace the source fields of an existing reading. BMI is re-derived in
    /// the same statement; it can never drift from weight and height.
    pub fn update_vitals(&self, vitals_id: i64, input: &VitalsInput) -> DbResult<Vitals> {
        validate_vitals(input)?;
        let bmi = derivation::bmi(input.weight_kg, input.height_cm);

        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE vitals SET
                    weight_kg = ?2,
                    height_cm = ?3,
                    bmi = ?4,
                    temperature_c = ?5,
                    heart_rate = ?6,
                    systolic = ?7,
                    diastolic = ?8
                WHERE id = ?1
                "#,
                params![
                    vitals_id,
                    input.weight_kg,
                    input.height_cm,
                    bmi,
                    input.temperature_c,
                    input.heart_rate,
                    input.systolic,
                    input.diastolic,
                ],
            )
            .map_err(|e| map_write_err(e, "vitals"))?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("vitals {}", vitals_id)));
        }

        self.get_vitals(vitals_id)?
            .ok_or_else(|| DbError::NotFound(format!("vitals {}", vitals_id)))
    }

    /// Get a vitals reading by id.
    pub fn get_vitals(&self, id: i64) -> DbResult<Option<Vitals>> {
        self.conn
            .query_row(
                r#"
                SELECT id, appointment_id, weight_kg, height_cm, bmi,
                       temperature_c, heart_rate, systolic, diastolic, recorded_at
                FROM vitals
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(Vitals {
                        id: row.get(0)?,
                        appointment_id: row.get(1)?,
                        weight_kg: row.get(2)?,
                        height_cm: row.get(3)?,
                        bmi: row.get(4)?,
                        temperature_c: row.get(5)?,
                        heart_rate: row.get(6)?,
                        systolic: row.get(7)?,
                        diastolic: row.get(8)?,
                        recorded_at: row.get(9)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

fn validate_vitals(input: &VitalsInput) -> Result<(), rules::ValidationError> {
    rules::check_vitals_sources(input.weight_kg, input.height_cm)?;
    if let Some(t) = input.temperature_c {
        rules::check_temperature(t)?;
    }
    if let Some(hr) = input.heart_rate {
        rules::check_non_negative("vitals.heart_rate", hr)?;
    }
    if let Some(sys) = input.systolic {
        rules::check_non_negative("vitals.systolic", sys)?;
    }
    if let Some(dia) = input.diastolic {
        rules::check_non_negative("vitals.diastolic", dia)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Gender, NewAppointment, NewDoctor, NewPatient, NewUser, Role};

    fn setup_db() -> Database {
        let mut db = Database::open_in_memory_with_clock(Box::new(FixedClock::at(
            "2024-03-10T09:00:00Z",
        )))
        .unwrap();

        let user = db
            .create_user(&NewUser {
                username: "drkhan".into(),
                password_hash: "x".into(),
                first_name: "Nadia".into(),
                last_name: "Khan".into(),
                email: "nadia@clinic.example".into(),
                phone: None,
                role: Role::Doctor,
            })
            .unwrap();
        db.create_doctor(&NewDoctor {
            user_id: user.id,
            specialization: "General Practice".into(),
            license_number: "MD-001".into(),
            years_of_experience: 8,
        })
        .unwrap();
        db.create_patient(&NewPatient {
            first_name: "Sara".into(),
            last_name: "Khan".into(),
            date_of_birth: "1990-04-12".into(),
            gender: Gender::Female,
            blood_group: None,
            phone: None,
            email: None,
            address: None,
        })
        .unwrap();
        db.create_appointment(&NewAppointment {
            patient_id: 1,
            doctor_id: 1,
            date: "2024-03-12".into(),
            time: "10:30".into(),
            notes: None,
            created_at: None,
        })
        .unwrap();
        db
    }

    fn make_input() -> VitalsInput {
        VitalsInput {
            appointment_id: 1,
            weight_kg: 70.0,
            height_cm: 175.0,
            temperature_c: Some(36.8),
            heart_rate: Some(72),
            systolic: Some(120),
            diastolic: Some(80),
        }
    }

    #[test]
    fn test_record_derives_bmi() {
        let db = setup_db();
        let vitals = db.record_vitals(&make_input()).unwrap();
        assert_eq!(vitals.bmi, 22.86);
    }

    #[test]
    fn test_update_rederives_bmi() {
        let db = setup_db();
        let vitals = db.record_vitals(&make_input()).unwrap();

        let mut input = make_input();
        input.weight_kg = 80.0;
        let updated = db.update_vitals(vitals.id, &input).unwrap();
        assert_eq!(updated.bmi, derivation::bmi(80.0, 175.0));
        assert_eq!(updated.bmi, 26.12);
    }

    #[test]
    fn test_invalid_height_rejected_before_derivation() {
        let db = setup_db();
        let mut input = make_input();
        input.height_cm = 0.0;
        let err = db.record_vitals(&input).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let db = setup_db();
        let mut input = make_input();
        input.temperature_c = Some(50.0);
        let err = db.record_vitals(&input).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_update_missing_reading_is_not_found() {
        let db = setup_db();
        let err = db.update_vitals(99, &make_input()).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
