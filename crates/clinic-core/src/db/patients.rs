//! Patient database operations.

use rusqlite::{params, OptionalExtension};
use strsim::jaro_winkler;

use super::{map_write_err, Database, DbError, DbResult};
use crate::derivation;
use crate::models::{BloodGroup, Gender, NewPatient, Patient};
use crate::rules;

impl Database {
    /// Create a patient. The patient code is derived from the assigned row id
    /// and written in the same transaction, so it is never observable unset
    /// and never recomputed afterward.
    pub fn create_patient(&mut self, new: &NewPatient) -> DbResult<Patient> {
        if let Some(email) = &new.email {
            rules::check_email(email)?;
        }
        let created_at = self.now().to_rfc3339();

        let tx = self.transaction()?;
        tx.execute(
            r#"
            INSERT INTO patients (
                first_name, last_name, date_of_birth, gender, blood_group,
                phone, email, address, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                new.first_name,
                new.last_name,
                new.date_of_birth,
                new.gender.as_str(),
                new.blood_group.map(|bg| bg.as_str()),
                new.phone,
                new.email,
                new.address,
                created_at,
            ],
        )
        .map_err(|e| map_write_err(e, "patient"))?;

        let id = tx.last_insert_rowid();
        let code = derivation::patient_code(id);
        tx.execute(
            "UPDATE patients SET code = ?1 WHERE id = ?2",
            params![code, id],
        )
        .map_err(|e| map_write_err(e, "patient code"))?;
        tx.commit()?;

        self.get_patient(id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", id)))
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_PATIENT),
                [id],
                patient_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a patient by generated code.
    pub fn get_patient_by_code(&self, code: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("{} WHERE code = ?", SELECT_PATIENT),
                [code],
                patient_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Update a patient's mutable fields. The code is never touched, whatever
    /// else changes.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        if let Some(email) = &patient.email {
            rules::check_email(email)?;
        }
        let modified_at = self.now().to_rfc3339();

        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE patients SET
                    first_name = ?2,
                    last_name = ?3,
                    date_of_birth = ?4,
                    gender = ?5,
                    blood_group = ?6,
                    phone = ?7,
                    email = ?8,
                    address = ?9,
                    is_active = ?10,
                    modified_at = ?11
                WHERE id = ?1
                "#,
                params![
                    patient.id,
                    patient.first_name,
                    patient.last_name,
                    patient.date_of_birth,
                    patient.gender.as_str(),
                    patient.blood_group.map(|bg| bg.as_str()),
                    patient.phone,
                    patient.email,
                    patient.address,
                    patient.is_active,
                    modified_at,
                ],
            )
            .map_err(|e| map_write_err(e, "patient"))?;
        Ok(rows_affected > 0)
    }

    /// Search patients by name. Substring match against first/last name,
    /// ranked by similarity to the query.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("%{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE first_name LIKE ?1 OR last_name LIKE ?1",
            SELECT_PATIENT
        ))?;

        let rows = stmt.query_map([&pattern], patient_row)?;
        let mut patients = Vec::new();
        for row in rows {
            patients.push(Patient::try_from(row?)?);
        }

        let needle = query.to_lowercase();
        patients.sort_by(|a, b| {
            let score = |p: &Patient| {
                let full = format!("{} {}", p.first_name, p.last_name).to_lowercase();
                jaro_winkler(&needle, &full)
            };
            score(b)
                .partial_cmp(&score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        patients.truncate(limit);
        Ok(patients)
    }
}

const SELECT_PATIENT: &str = r#"
    SELECT id, code, first_name, last_name, date_of_birth, gender, blood_group,
           phone, email, address, is_active, created_at, modified_at
    FROM patients
"#;

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: i64,
    code: Option<String>,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    gender: String,
    blood_group: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    is_active: bool,
    created_at: String,
    modified_at: Option<String>,
}

fn patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        code: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        date_of_birth: row.get(4)?,
        gender: row.get(5)?,
        blood_group: row.get(6)?,
        phone: row.get(7)?,
        email: row.get(8)?,
        address: row.get(9)?,
        is_active: row.get(10)?,
        created_at: row.get(11)?,
        modified_at: row.get(12)?,
    })
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let gender = Gender::parse(&row.gender).map_err(DbError::Constraint)?;
        let blood_group = row
            .blood_group
            .as_deref()
            .map(BloodGroup::parse)
            .transpose()
            .map_err(DbError::Constraint)?;
        let code = row
            .code
            .ok_or_else(|| DbError::Constraint(format!("patient {} has no code", row.id)))?;

        Ok(Patient {
            id: row.id,
            code,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            gender,
            blood_group,
            phone: row.phone,
            email: row.email,
            address: row.address,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}
