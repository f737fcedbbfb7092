//! Room and admission database operations.
//!
//! Every admission write runs the occupancy propagator for each touched room
//! inside the same transaction, so occupancy can never be observed stale and
//! an over-capacity admission rolls back as a whole.

use rusqlite::{params, OptionalExtension};
use serde_json::json;

use super::{audit, map_write_err, parse_timestamp, Database, DbError, DbResult};
use crate::derivation;
use crate::models::{Admission, AdmissionStatus, AdmissionUpdate, NewAdmission, NewRoom, Room};
use crate::propagate;
use crate::rules;

impl Database {
    /// Create a ward room.
    pub fn create_room(&self, new: &NewRoom) -> DbResult<Room> {
        rules::check_positive("room.capacity", new.capacity)?;

        self.conn
            .execute(
                "INSERT INTO rooms (room_number, room_type, capacity) VALUES (?1, ?2, ?3)",
                params![new.room_number, new.room_type, new.capacity],
            )
            .map_err(|e| map_write_err(e, "room"))?;

        let id = self.conn.last_insert_rowid();
        self.get_room(id)?
            .ok_or_else(|| DbError::NotFound(format!("room {}", id)))
    }

    /// Get a room by id.
    pub fn get_room(&self, id: i64) -> DbResult<Option<Room>> {
        self.conn
            .query_row(
                r#"
                SELECT id, room_number, room_type, capacity,
                       current_occupancy, is_occupied, is_active
                FROM rooms
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(Room {
                        id: row.get(0)?,
                        room_number: row.get(1)?,
                        room_type: row.get(2)?,
                        capacity: row.get(3)?,
                        current_occupancy: row.get(4)?,
                        is_occupied: row.get(5)?,
                        is_active: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Admit a patient. The admission starts Active; the room's occupancy is
    /// recounted in the same transaction and a full room rejects the write.
    pub fn admit_patient(&mut self, new: &NewAdmission) -> DbResult<Admission> {
        let now = self.now();
        let admitted_at = match &new.admitted_at {
            Some(ts) => parse_timestamp(ts, "admission.admitted_at")?,
            None => now,
        };
        let total_days = derivation::total_days(admitted_at, None, now);

        let tx = self.transaction()?;
        tx.execute(
            r#"
            INSERT INTO admissions (
                patient_id, room_id, attending_doctor_id, admitted_at,
                total_days, status, reason, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
            params![
                new.patient_id,
                new.room_id,
                new.attending_doctor_id,
                admitted_at.to_rfc3339(),
                total_days,
                AdmissionStatus::Active.as_str(),
                new.reason,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| map_write_err(e, "admission"))?;
        let id = tx.last_insert_rowid();

        propagate::refresh_room_occupancy(&tx, new.room_id)?;
        audit::append_entry(
            &tx,
            now,
            new.recorded_by,
            "admission.created",
            json!({ "admission_id": id, "patient_id": new.patient_id, "room_id": new.room_id }),
        )?;
        tx.commit()?;

        self.get_admission(id)?
            .ok_or_else(|| DbError::NotFound(format!("admission {}", id)))
    }

    /// Update an admission: status transition, discharge, or room transfer.
    /// Duration is re-derived and every touched room is recounted.
    pub fn update_admission(&mut self, id: i64, update: &AdmissionUpdate) -> DbResult<Admission> {
        let existing = self
            .get_admission(id)?
            .ok_or_else(|| DbError::NotFound(format!("admission {}", id)))?;

        let now = self.now();
        let room_id = update.room_id.unwrap_or(existing.room_id);
        let status = update.status.unwrap_or(existing.status);
        let discharged_raw = update
            .discharged_at
            .clone()
            .or_else(|| existing.discharged_at.clone());

        let admitted_at = parse_timestamp(&existing.admitted_at, "admission.admitted_at")?;
        let discharged_at = discharged_raw
            .as_deref()
            .map(|ts| parse_timestamp(ts, "admission.discharged_at"))
            .transpose()?;
        rules::check_admission_window(admitted_at, discharged_at)?;
        let total_days = derivation::total_days(admitted_at, discharged_at, now);

        let tx = self.transaction()?;
        tx.execute(
            r#"
            UPDATE admissions SET
                room_id = ?2,
                status = ?3,
                discharged_at = ?4,
                total_days = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                id,
                room_id,
                status.as_str(),
                discharged_at.map(|dt| dt.to_rfc3339()),
                total_days,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| map_write_err(e, "admission"))?;

        // Recount the room the admission was in, and the new one on transfer.
        propagate::refresh_room_occupancy(&tx, existing.room_id)?;
        if room_id != existing.room_id {
            propagate::refresh_room_occupancy(&tx, room_id)?;
        }
        audit::append_entry(
            &tx,
            now,
            update.recorded_by,
            "admission.updated",
            json!({ "admission_id": id, "status": status.as_str(), "room_id": room_id }),
        )?;
        tx.commit()?;

        self.get_admission(id)?
            .ok_or_else(|| DbError::NotFound(format!("admission {}", id)))
    }

    /// Get an admission by id.
    pub fn get_admission(&self, id: i64) -> DbResult<Option<Admission>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, room_id, attending_doctor_id, admitted_at,
                       discharged_at, total_days, status, reason, created_at, updated_at
                FROM admissions
                WHERE id = ?
                "#,
                [id],
                admission_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List a patient's admissions, most recent first.
    pub fn list_admissions_for_patient(&self, patient_id: i64) -> DbResult<Vec<Admission>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, room_id, attending_doctor_id, admitted_at,
                   discharged_at, total_days, status, reason, created_at, updated_at
            FROM admissions
            WHERE patient_id = ?
            ORDER BY admitted_at DESC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], admission_row)?;
        let mut admissions = Vec::new();
        for row in rows {
            admissions.push(Admission::try_from(row?)?);
        }
        Ok(admissions)
    }
}

/// Intermediate row struct for database mapping.
struct AdmissionRow {
    id: i64,
    patient_id: i64,
    room_id: i64,
    attending_doctor_id: Option<i64>,
    admitted_at: String,
    discharged_at: Option<String>,
    total_days: i64,
    status: String,
    reason: Option<String>,
    created_at: String,
    updated_at: String,
}

fn admission_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AdmissionRow> {
    Ok(AdmissionRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        room_id: row.get(2)?,
        attending_doctor_id: row.get(3)?,
        admitted_at: row.get(4)?,
        discharged_at: row.get(5)?,
        total_days: row.get(6)?,
        status: row.get(7)?,
        reason: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl TryFrom<AdmissionRow> for Admission {
    type Error = DbError;

    fn try_from(row: AdmissionRow) -> Result<Self, Self::Error> {
        let status = AdmissionStatus::parse(&row.status).map_err(DbError::Constraint)?;
        Ok(Admission {
            id: row.id,
            patient_id: row.patient_id,
            room_id: row.room_id,
            attending_doctor_id: row.attending_doctor_id,
            admitted_at: row.admitted_at,
            discharged_at: row.discharged_at,
            total_days: row.total_days,
            status,
            reason: row.reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Gender, NewPatient};

    fn setup_db() -> Database {
        let mut db = Database::open_in_memory_with_clock(Box::new(FixedClock::at(
            "2024-03-10T09:00:00Z",
        )))
        .unwrap();
        db.create_room(&NewRoom {
            room_number: "101".into(),
            room_type: Some("General".into()),
            capacity: 2,
        })
        .unwrap();
        for (first, last) in [("Sara", "Khan"), ("Omar", "Ali"), ("Zain", "Raza")] {
            db.create_patient(&NewPatient {
                first_name: first.into(),
                last_name: last.into(),
                date_of_birth: "1990-04-12".into(),
                gender: Gender::Other,
                blood_group: None,
                phone: None,
                email: None,
                address: None,
            })
            .unwrap();
        }
        db
    }

    fn admit(db: &mut Database, patient_id: i64) -> DbResult<Admission> {
        db.admit_patient(&NewAdmission {
            patient_id,
            room_id: 1,
            attending_doctor_id: None,
            admitted_at: None,
            reason: None,
            recorded_by: None,
        })
    }

    #[test]
    fn test_admit_recounts_room() {
        let mut db = setup_db();
        let admission = admit(&mut db, 1).unwrap();
        assert_eq!(admission.status, AdmissionStatus::Active);
        assert_eq!(admission.total_days, 0);

        let room = db.get_room(1).unwrap().unwrap();
        assert_eq!(room.current_occupancy, 1);
        assert!(!room.is_occupied);
    }

    #[test]
    fn test_room_fills_at_capacity() {
        let mut db = setup_db();
        admit(&mut db, 1).unwrap();
        admit(&mut db, 2).unwrap();

        let room = db.get_room(1).unwrap().unwrap();
        assert_eq!(room.current_occupancy, 2);
        assert!(room.is_occupied);
    }

    #[test]
    fn test_over_capacity_rolls_back_admission() {
        let mut db = setup_db();
        admit(&mut db, 1).unwrap();
        admit(&mut db, 2).unwrap();

        let err = admit(&mut db, 3).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        // Neither the admission nor the occupancy write survived
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM admissions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
        let room = db.get_room(1).unwrap().unwrap();
        assert_eq!(room.current_occupancy, 2);
    }

    #[test]
    fn test_discharge_decrements_via_recount() {
        let mut db = setup_db();
        let admission = admit(&mut db, 1).unwrap();
        admit(&mut db, 2).unwrap();

        db.update_admission(
            admission.id,
            &AdmissionUpdate {
                status: Some(AdmissionStatus::Discharged),
                discharged_at: Some("2024-03-12T10:00:00Z".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let room = db.get_room(1).unwrap().unwrap();
        assert_eq!(room.current_occupancy, 1);
        assert!(!room.is_occupied);

        let updated = db.get_admission(admission.id).unwrap().unwrap();
        assert_eq!(updated.total_days, 2);
        assert_eq!(updated.status, AdmissionStatus::Discharged);
    }

    #[test]
    fn test_discharge_before_admission_rejected() {
        let mut db = setup_db();
        let admission = admit(&mut db, 1).unwrap();

        let err = db
            .update_admission(
                admission.id,
                &AdmissionUpdate {
                    status: Some(AdmissionStatus::Discharged),
                    discharged_at: Some("2024-03-01T10:00:00Z".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_room_transfer_recounts_both_rooms() {
        let mut db = setup_db();
        db.create_room(&NewRoom {
            room_number: "102".into(),
            room_type: None,
            capacity: 1,
        })
        .unwrap();
        let admission = admit(&mut db, 1).unwrap();

        db.update_admission(
            admission.id,
            &AdmissionUpdate {
                room_id: Some(2),
                ..Default::default()
            },
        )
        .unwrap();

        let old_room = db.get_room(1).unwrap().unwrap();
        let new_room = db.get_room(2).unwrap().unwrap();
        assert_eq!(old_room.current_occupancy, 0);
        assert_eq!(new_room.current_occupancy, 1);
        assert!(new_room.is_occupied);
    }

    #[test]
    fn test_still_admitted_duration_tracks_now() {
        let mut db = setup_db();
        let admission = db
            .admit_patient(&NewAdmission {
                patient_id: 1,
                room_id: 1,
                attending_doctor_id: None,
                admitted_at: Some("2024-03-07T09:00:00Z".into()),
                reason: None,
                recorded_by: None,
            })
            .unwrap();
        // Clock is pinned at 2024-03-10: three whole days since admission.
        assert_eq!(admission.total_days, 3);
    }

    #[test]
    fn test_admission_writes_audit_entries() {
        let mut db = setup_db();
        let admission = admit(&mut db, 1).unwrap();
        db.update_admission(
            admission.id,
            &AdmissionUpdate {
                status: Some(AdmissionStatus::Discharged),
                discharged_at: Some("2024-03-11T10:00:00Z".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let entries = db.list_activity(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "admission.updated");
        assert_eq!(entries[1].action, "admission.created");
    }
}
