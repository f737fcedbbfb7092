//! User and doctor database operations.

use rusqlite::{params, OptionalExtension};

use super::{map_write_err, Database, DbError, DbResult};
use crate::models::{Doctor, NewDoctor, NewUser, Role, User};
use crate::rules;

impl Database {
    /// Create a user account. Username and email are unique.
    pub fn create_user(&self, new: &NewUser) -> DbResult<User> {
        rules::check_email(&new.email)?;
        let created_at = self.now().to_rfc3339();

        self.conn
            .execute(
                r#"
                INSERT INTO users (
                    username, password_hash, first_name, last_name,
                    email, phone, role, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    new.username,
                    new.password_hash,
                    new.first_name,
                    new.last_name,
                    new.email,
                    new.phone,
                    new.role.as_str(),
                    created_at,
                ],
            )
            .map_err(|e| map_write_err(e, "user"))?;

        let id = self.conn.last_insert_rowid();
        self.get_user(id)?
            .ok_or_else(|| DbError::NotFound(format!("user {}", id)))
    }

    /// Get a user by id.
    pub fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                r#"
                SELECT id, username, password_hash, first_name, last_name,
                       email, phone, role, is_active, created_at
                FROM users
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        email: row.get(5)?,
                        phone: row.get(6)?,
                        role: row.get(7)?,
                        is_active: row.get(8)?,
                        created_at: row.get(9)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Register a doctor for an existing user. License numbers are unique.
    pub fn create_doctor(&self, new: &NewDoctor) -> DbResult<Doctor> {
        rules::check_non_negative("doctor.years_of_experience", new.years_of_experience)?;

        self.conn
            .execute(
                r#"
                INSERT INTO doctors (user_id, specialization, license_number, years_of_experience)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    new.user_id,
                    new.specialization,
                    new.license_number,
                    new.years_of_experience,
                ],
            )
            .map_err(|e| map_write_err(e, "doctor"))?;

        let id = self.conn.last_insert_rowid();
        self.get_doctor(id)?
            .ok_or_else(|| DbError::NotFound(format!("doctor {}", id)))
    }

    /// Get a doctor by id.
    pub fn get_doctor(&self, id: i64) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                r#"
                SELECT id, user_id, specialization, license_number, years_of_experience, is_active
                FROM doctors
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(Doctor {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        specialization: row.get(2)?,
                        license_number: row.get(3)?,
                        years_of_experience: row.get(4)?,
                        is_active: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

/// Intermediate row struct for database mapping.
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    role: String,
    is_active: bool,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).map_err(DbError::Constraint)?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}
