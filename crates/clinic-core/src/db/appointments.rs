//! Appointment database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{map_write_err, parse_timestamp, Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentStatus, NewAppointment};
use crate::rules;

impl Database {
    /// Schedule an appointment. The (doctor, date, time) slot is unique; a
    /// collision is a conflict, not a silent overwrite. The past-date rule
    /// runs against the injected clock and is skipped for replayed rows whose
    /// creation timestamp already lies in the past.
    pub fn create_appointment(&self, new: &NewAppointment) -> DbResult<Appointment> {
        let date = NaiveDate::parse_from_str(&new.date, "%Y-%m-%d").map_err(|_| {
            rules::ValidationError::new(
                "appointment.date",
                format!("'{}' is not a YYYY-MM-DD date", new.date),
            )
        })?;

        let now = self.now();
        let created_at = match &new.created_at {
            Some(ts) => parse_timestamp(ts, "appointment.created_at")?,
            None => now,
        };
        rules::check_appointment_date(date, created_at, now)?;

        self.conn
            .execute(
                r#"
                INSERT INTO appointments (
                    patient_id, doctor_id, date, time, status, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    new.patient_id,
                    new.doctor_id,
                    new.date,
                    new.time,
                    AppointmentStatus::Scheduled.as_str(),
                    new.notes,
                    created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| map_write_err(e, "appointment slot"))?;

        let id = self.conn.last_insert_rowid();
        self.get_appointment(id)?
            .ok_or_else(|| DbError::NotFound(format!("appointment {}", id)))
    }

    /// Get an appointment by id.
    pub fn get_appointment(&self, id: i64) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, doctor_id, date, time, status, notes, created_at
                FROM appointments
                WHERE id = ?
                "#,
                [id],
                appointment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Move an appointment through its lifecycle.
    pub fn set_appointment_status(&self, id: i64, status: AppointmentStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// List a doctor's appointments on a given date, ordered by time.
    pub fn list_appointments_for_doctor(
        &self,
        doctor_id: i64,
        date: &str,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, doctor_id, date, time, status, notes, created_at
            FROM appointments
            WHERE doctor_id = ?1 AND date = ?2
            ORDER BY time
            "#,
        )?;

        let rows = stmt.query_map(params![doctor_id, date], appointment_row)?;
        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(Appointment::try_from(row?)?);
        }
        Ok(appointments)
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    date: String,
    time: String,
    status: String,
    notes: Option<String>,
    created_at: String,
}

fn appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = AppointmentStatus::parse(&row.status).map_err(DbError::Constraint)?;
        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            date: row.date,
            time: row.time,
            status,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}
