//! Clinic Core Library
//!
//! Consistency-maintenance core for clinic records: derived fields,
//! cross-table propagation, and atomic payment recording over SQLite.
//!
//! # Architecture
//!
//! ```text
//!                      mutation request (create / update)
//!                                     │
//!                         ┌───────────▼───────────┐
//!                         │   Consistency Rules   │  reject before write
//!                         └───────────┬───────────┘
//!                                     │
//!                         ┌───────────▼───────────┐
//!                         │   Derivation Engine   │  BMI, due amount,
//!                         │  (pure functions)     │  line amounts, codes
//!                         └───────────┬───────────┘
//!                                     │
//!                      ┌──────────────┼──────────────┐
//!                      │              │              │
//!                      ▼              ▼              ▼
//!                 Occupancy       Stock Alert    Activity Log
//!                 Propagator      Propagator     (hash chain)
//!                 (full recount)  (append-only)
//!                      │              │              │
//!                      └──────────────┴──────────────┘
//!                                     │
//!                           one SQLite transaction
//! ```
//!
//! # Core Principle
//!
//! **A derived field is never written independently of its sources.** Every
//! mutation recomputes its dependents synchronously before commit, and the
//! payment transaction either lands the bill update and its audit entry
//! together or not at all.
//!
//! # Modules
//!
//! - [`db`]: SQLite storage layer and per-entity operations
//! - [`models`]: Domain types (Patient, Bill, Admission, etc.)
//! - [`derivation`]: Pure derived-field functions
//! - [`rules`]: Consistency rules (validation predicates)
//! - [`propagate`]: Occupancy and low-stock propagators
//! - [`payment`]: Atomic payment recording
//! - [`clock`]: Injected clock so tests control "now"

pub mod clock;
pub mod db;
pub mod derivation;
pub mod models;
pub mod payment;
pub mod propagate;
pub mod rules;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::Database;
pub use models::{
    Admission, AdmissionStatus, Appointment, AppointmentStatus, Bill, BillItem, Gender,
    LowStockAlert, Medicine, Patient, PaymentMethod, PaymentStatus, Room, TransactionType, Vitals,
};
pub use payment::{record_payment, PaymentError, PaymentReceipt, PaymentRequest};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use crate::db::DbError;
use crate::models::*;
use crate::payment as payment_mod;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Overpayment: {0}")]
    Overpayment(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<DbError> for ClinicError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ClinicError::NotFound(msg),
            DbError::Conflict(msg) => ClinicError::Conflict(msg),
            DbError::Validation(err) => ClinicError::ValidationError(err.to_string()),
            DbError::Json(err) => ClinicError::SerializationError(err.to_string()),
            other => ClinicError::DatabaseError(other.to_string()),
        }
    }
}

impl From<PaymentError> for ClinicError {
    fn from(e: PaymentError) -> Self {
        let msg = e.to_string();
        match e {
            PaymentError::BillNotFound(_) => ClinicError::NotFound(msg),
            PaymentError::NonPositiveAmount(_) => ClinicError::ValidationError(msg),
            PaymentError::Overpayment { .. } => ClinicError::Overpayment(msg),
            PaymentError::Storage(inner) => inner.into(),
        }
    }
}

impl From<rules::ValidationError> for ClinicError {
    fn from(e: rules::ValidationError) -> Self {
        ClinicError::ValidationError(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_enum<T>(result: Result<T, String>) -> Result<T, ClinicError> {
    result.map_err(ClinicError::ValidationError)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_clinic(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(ClinicCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_clinic_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ClinicCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Staff Operations
    // =========================================================================

    /// Create a user account.
    pub fn create_user(
        &self,
        username: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        email: String,
        phone: Option<String>,
        role: String,
    ) -> Result<FfiUser, ClinicError> {
        let role = parse_enum(Role::parse(&role))?;
        let db = self.db.lock()?;
        let user = db.create_user(&NewUser {
            username,
            password_hash,
            first_name,
            last_name,
            email,
            phone,
            role,
        })?;
        Ok(user.into())
    }

    /// Register a doctor for an existing user.
    pub fn create_doctor(
        &self,
        user_id: i64,
        specialization: String,
        license_number: String,
        years_of_experience: i64,
    ) -> Result<FfiDoctor, ClinicError> {
        let db = self.db.lock()?;
        let doctor = db.create_doctor(&NewDoctor {
            user_id,
            specialization,
            license_number,
            years_of_experience,
        })?;
        Ok(doctor.into())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a patient; the patient code is assigned by the store.
    pub fn create_patient(&self, new: FfiNewPatient) -> Result<FfiPatient, ClinicError> {
        let new: NewPatient = new.try_into()?;
        let mut db = self.db.lock()?;
        let patient = db.create_patient(&new)?;
        Ok(patient.into())
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Search patients by name.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Appointment and Vitals Operations
    // =========================================================================

    /// Schedule an appointment.
    pub fn create_appointment(
        &self,
        new: FfiNewAppointment,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let appointment = db.create_appointment(&NewAppointment {
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            date: new.date,
            time: new.time,
            notes: new.notes,
            created_at: new.created_at,
        })?;
        Ok(appointment.into())
    }

    /// Record vitals for an appointment; BMI is derived.
    pub fn record_vitals(&self, input: FfiVitalsInput) -> Result<FfiVitals, ClinicError> {
        let db = self.db.lock()?;
        let vitals = db.record_vitals(&input.into())?;
        Ok(vitals.into())
    }

    /// Update a vitals reading; BMI is re-derived.
    pub fn update_vitals(
        &self,
        vitals_id: i64,
        input: FfiVitalsInput,
    ) -> Result<FfiVitals, ClinicError> {
        let db = self.db.lock()?;
        let vitals = db.update_vitals(vitals_id, &input.into())?;
        Ok(vitals.into())
    }

    // =========================================================================
    // Room and Admission Operations
    // =========================================================================

    /// Create a ward room.
    pub fn create_room(
        &self,
        room_number: String,
        room_type: Option<String>,
        capacity: i64,
    ) -> Result<FfiRoom, ClinicError> {
        let db = self.db.lock()?;
        let room = db.create_room(&NewRoom {
            room_number,
            room_type,
            capacity,
        })?;
        Ok(room.into())
    }

    /// Get a room with its derived occupancy.
    pub fn get_room(&self, id: i64) -> Result<Option<FfiRoom>, ClinicError> {
        let db = self.db.lock()?;
        let room = db.get_room(id)?;
        Ok(room.map(|r| r.into()))
    }

    /// Admit a patient; the room's occupancy is recounted.
    pub fn admit_patient(&self, new: FfiNewAdmission) -> Result<FfiAdmission, ClinicError> {
        let mut db = self.db.lock()?;
        let admission = db.admit_patient(&NewAdmission {
            patient_id: new.patient_id,
            room_id: new.room_id,
            attending_doctor_id: new.attending_doctor_id,
            admitted_at: new.admitted_at,
            reason: new.reason,
            recorded_by: new.recorded_by,
        })?;
        Ok(admission.into())
    }

    /// Update an admission (status, discharge, room transfer).
    pub fn update_admission(
        &self,
        admission_id: i64,
        update: FfiAdmissionUpdate,
    ) -> Result<FfiAdmission, ClinicError> {
        let status = update
            .status
            .as_deref()
            .map(AdmissionStatus::parse)
            .transpose();
        let status = parse_enum(status)?;
        let mut db = self.db.lock()?;
        let admission = db.update_admission(
            admission_id,
            &AdmissionUpdate {
                room_id: update.room_id,
                status,
                discharged_at: update.discharged_at,
                recorded_by: update.recorded_by,
            },
        )?;
        Ok(admission.into())
    }

    // =========================================================================
    // Inventory Operations
    // =========================================================================

    /// Add a medicine to the formulary.
    pub fn add_medicine(&self, new: FfiNewMedicine) -> Result<FfiMedicine, ClinicError> {
        let mut db = self.db.lock()?;
        let medicine = db.add_medicine(&NewMedicine {
            code: new.code,
            name: new.name,
            category: new.category,
            unit_price_cents: new.unit_price_cents,
            current_stock: new.current_stock,
            minimum_stock: new.minimum_stock,
            maximum_stock: new.maximum_stock,
        })?;
        Ok(medicine.into())
    }

    /// Get a medicine by id.
    pub fn get_medicine(&self, id: i64) -> Result<Option<FfiMedicine>, ClinicError> {
        let db = self.db.lock()?;
        let medicine = db.get_medicine(id)?;
        Ok(medicine.map(|m| m.into()))
    }

    /// Search medicines by name or code.
    pub fn search_medicines(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiMedicine>, ClinicError> {
        let db = self.db.lock()?;
        let medicines = db.search_medicines(&query, limit as usize)?;
        Ok(medicines.into_iter().map(|m| m.into()).collect())
    }

    /// Apply a signed stock delta; fires the low-stock propagator.
    pub fn adjust_stock(
        &self,
        medicine_id: i64,
        delta: i64,
        recorded_by: Option<i64>,
    ) -> Result<FfiStockLevel, ClinicError> {
        let mut db = self.db.lock()?;
        let level = db.adjust_stock(medicine_id, delta, recorded_by)?;
        Ok(level.into())
    }

    /// Record an inventory movement; total cost is derived.
    pub fn record_inventory_transaction(
        &self,
        new: FfiNewInventoryTransaction,
    ) -> Result<FfiInventoryTransaction, ClinicError> {
        let transaction_type = parse_enum(TransactionType::parse(&new.transaction_type))?;
        let db = self.db.lock()?;
        let tx = db.record_inventory_transaction(&NewInventoryTransaction {
            medicine_id: new.medicine_id,
            transaction_type,
            quantity: new.quantity,
            unit_cost_cents: new.unit_cost_cents,
            reference: new.reference,
            performed_by: new.performed_by,
        })?;
        Ok(tx.into())
    }

    /// List low-stock alert snapshots, newest first.
    pub fn list_low_stock_alerts(
        &self,
        medicine_id: Option<i64>,
    ) -> Result<Vec<FfiLowStockAlert>, ClinicError> {
        let db = self.db.lock()?;
        let alerts = db.list_low_stock_alerts(medicine_id)?;
        Ok(alerts.into_iter().map(|a| a.into()).collect())
    }

    // =========================================================================
    // Billing Operations
    // =========================================================================

    /// Open a bill against an appointment or an admission.
    pub fn create_bill(&self, new: FfiNewBill) -> Result<FfiBill, ClinicError> {
        let db = self.db.lock()?;
        let bill = db.create_bill(&NewBill {
            appointment_id: new.appointment_id,
            admission_id: new.admission_id,
            total_cents: new.total_cents,
            paid_cents: new.paid_cents,
            created_by: new.created_by,
        })?;
        Ok(bill.into())
    }

    /// Get a bill with its derived due amount and status.
    pub fn get_bill(&self, id: i64) -> Result<Option<FfiBill>, ClinicError> {
        let db = self.db.lock()?;
        let bill = db.get_bill(id)?;
        Ok(bill.map(|b| b.into()))
    }

    /// Add a line item to a bill; the extended amount is derived.
    pub fn add_bill_item(&self, new: FfiNewBillItem) -> Result<FfiBillItem, ClinicError> {
        let service_type = parse_enum(ServiceType::parse(&new.service_type))?;
        let db = self.db.lock()?;
        let item = db.add_bill_item(&NewBillItem {
            bill_id: new.bill_id,
            service_type,
            description: new.description,
            quantity: new.quantity,
            unit_price_cents: new.unit_price_cents,
            medicine_id: new.medicine_id,
        })?;
        Ok(item.into())
    }

    /// Record a payment atomically: validate, update the bill, audit.
    pub fn record_payment(
        &self,
        bill_id: i64,
        amount_cents: i64,
        method: String,
        recorded_by: i64,
    ) -> Result<FfiPaymentReceipt, ClinicError> {
        let method = parse_enum(PaymentMethod::parse(&method))?;
        let mut db = self.db.lock()?;
        let receipt = payment_mod::record_payment(
            &mut db,
            &PaymentRequest {
                bill_id,
                amount_cents,
                method,
                recorded_by,
            },
        )?;
        Ok(receipt.into())
    }

    // =========================================================================
    // Audit Operations
    // =========================================================================

    /// List the most recent activity entries, newest first.
    pub fn list_activity(&self, limit: u32) -> Result<Vec<FfiActivityEntry>, ClinicError> {
        let db = self.db.lock()?;
        let entries = db.list_activity(limit as usize)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Verify the audit hash chain. Returns the id of the first broken
    /// entry, or `None` when the chain is intact.
    pub fn verify_activity_chain(&self) -> Result<Option<i64>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.verify_activity_chain()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe user.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}

impl From<User> for FfiUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
        }
    }
}

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: i64,
    pub user_id: i64,
    pub specialization: String,
    pub license_number: String,
    pub years_of_experience: i64,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            user_id: doctor.user_id,
            specialization: doctor.specialization,
            license_number: doctor.license_number,
            years_of_experience: doctor.years_of_experience,
        }
    }
}

/// FFI-safe patient input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub blood_group: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl TryFrom<FfiNewPatient> for NewPatient {
    type Error = ClinicError;

    fn try_from(new: FfiNewPatient) -> Result<Self, Self::Error> {
        let gender = parse_enum(Gender::parse(&new.gender))?;
        let blood_group = new
            .blood_group
            .as_deref()
            .map(BloodGroup::parse)
            .transpose();
        let blood_group = parse_enum(blood_group)?;
        Ok(NewPatient {
            first_name: new.first_name,
            last_name: new.last_name,
            date_of_birth: new.date_of_birth,
            gender,
            blood_group,
            phone: new.phone,
            email: new.email,
            address: new.address,
        })
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub blood_group: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            code: patient.code,
            first_name: patient.first_name,
            last_name: patient.last_name,
            date_of_birth: patient.date_of_birth,
            gender: patient.gender.as_str().to_string(),
            blood_group: patient.blood_group.map(|bg| bg.as_str().to_string()),
            phone: patient.phone,
            email: patient.email,
            address: patient.address,
            is_active: patient.is_active,
        }
    }
}

/// FFI-safe appointment input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: String,
    pub time: String,
    pub status: String,
    pub notes: Option<String>,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date,
            time: appointment.time,
            status: appointment.status.as_str().to_string(),
            notes: appointment.notes,
        }
    }
}

/// FFI-safe vitals input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitalsInput {
    pub appointment_id: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub temperature_c: Option<f64>,
    pub heart_rate: Option<i64>,
    pub systolic: Option<i64>,
    pub diastolic: Option<i64>,
}

impl From<FfiVitalsInput> for VitalsInput {
    fn from(input: FfiVitalsInput) -> Self {
        VitalsInput {
            appointment_id: input.appointment_id,
            weight_kg: input.weight_kg,
            height_cm: input.height_cm,
            temperature_c: input.temperature_c,
            heart_rate: input.heart_rate,
            systolic: input.systolic,
            diastolic: input.diastolic,
        }
    }
}

/// FFI-safe vitals reading.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitals {
    pub id: i64,
    pub appointment_id: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: f64,
    pub temperature_c: Option<f64>,
    pub heart_rate: Option<i64>,
    pub systolic: Option<i64>,
    pub diastolic: Option<i64>,
}

impl From<Vitals> for FfiVitals {
    fn from(vitals: Vitals) -> Self {
        Self {
            id: vitals.id,
            appointment_id: vitals.appointment_id,
            weight_kg: vitals.weight_kg,
            height_cm: vitals.height_cm,
            bmi: vitals.bmi,
            temperature_c: vitals.temperature_c,
            heart_rate: vitals.heart_rate,
            systolic: vitals.systolic,
            diastolic: vitals.diastolic,
        }
    }
}

/// FFI-safe room.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRoom {
    pub id: i64,
    pub room_number: String,
    pub room_type: Option<String>,
    pub capacity: i64,
    pub current_occupancy: i64,
    pub is_occupied: bool,
}

impl From<Room> for FfiRoom {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            room_number: room.room_number,
            room_type: room.room_type,
            capacity: room.capacity,
            current_occupancy: room.current_occupancy,
            is_occupied: room.is_occupied,
        }
    }
}

/// FFI-safe admission input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAdmission {
    pub patient_id: i64,
    pub room_id: i64,
    pub attending_doctor_id: Option<i64>,
    pub admitted_at: Option<String>,
    pub reason: Option<String>,
    pub recorded_by: Option<i64>,
}

/// FFI-safe admission update.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdmissionUpdate {
    pub room_id: Option<i64>,
    pub status: Option<String>,
    pub discharged_at: Option<String>,
    pub recorded_by: Option<i64>,
}

/// FFI-safe admission.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdmission {
    pub id: i64,
    pub patient_id: i64,
    pub room_id: i64,
    pub admitted_at: String,
    pub discharged_at: Option<String>,
    pub total_days: i64,
    pub status: String,
}

impl From<Admission> for FfiAdmission {
    fn from(admission: Admission) -> Self {
        Self {
            id: admission.id,
            patient_id: admission.patient_id,
            room_id: admission.room_id,
            admitted_at: admission.admitted_at,
            discharged_at: admission.discharged_at,
            total_days: admission.total_days,
            status: admission.status.as_str().to_string(),
        }
    }
}

/// FFI-safe medicine input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewMedicine {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price_cents: i64,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
}

/// FFI-safe medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price_cents: i64,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
    pub is_active: bool,
}

impl From<Medicine> for FfiMedicine {
    fn from(medicine: Medicine) -> Self {
        Self {
            id: medicine.id,
            code: medicine.code,
            name: medicine.name,
            category: medicine.category,
            unit_price_cents: medicine.unit_price_cents,
            current_stock: medicine.current_stock,
            minimum_stock: medicine.minimum_stock,
            maximum_stock: medicine.maximum_stock,
            is_active: medicine.is_active,
        }
    }
}

/// FFI-safe stock adjustment result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockLevel {
    pub medicine_id: i64,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub alert: Option<FfiLowStockAlert>,
}

impl From<StockLevel> for FfiStockLevel {
    fn from(level: StockLevel) -> Self {
        Self {
            medicine_id: level.medicine_id,
            current_stock: level.current_stock,
            minimum_stock: level.minimum_stock,
            alert: level.alert.map(|a| a.into()),
        }
    }
}

/// FFI-safe inventory transaction input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewInventoryTransaction {
    pub medicine_id: i64,
    pub transaction_type: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub reference: Option<String>,
    pub performed_by: Option<i64>,
}

/// FFI-safe inventory transaction.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInventoryTransaction {
    pub id: i64,
    pub medicine_id: i64,
    pub transaction_type: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub total_cost_cents: i64,
    pub reference: Option<String>,
}

impl From<InventoryTransaction> for FfiInventoryTransaction {
    fn from(tx: InventoryTransaction) -> Self {
        Self {
            id: tx.id,
            medicine_id: tx.medicine_id,
            transaction_type: tx.transaction_type.as_str().to_string(),
            quantity: tx.quantity,
            unit_cost_cents: tx.unit_cost_cents,
            total_cost_cents: tx.total_cost_cents,
            reference: tx.reference,
        }
    }
}

/// FFI-safe low-stock alert snapshot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLowStockAlert {
    pub id: i64,
    pub medicine_id: i64,
    pub medicine_code: String,
    pub medicine_name: String,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub created_at: String,
}

impl From<LowStockAlert> for FfiLowStockAlert {
    fn from(alert: LowStockAlert) -> Self {
        Self {
            id: alert.id,
            medicine_id: alert.medicine_id,
            medicine_code: alert.medicine_code,
            medicine_name: alert.medicine_name,
            current_stock: alert.current_stock,
            minimum_stock: alert.minimum_stock,
            created_at: alert.created_at,
        }
    }
}

/// FFI-safe bill input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewBill {
    pub appointment_id: Option<i64>,
    pub admission_id: Option<i64>,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub created_by: Option<i64>,
}

/// FFI-safe bill.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBill {
    pub id: i64,
    pub appointment_id: Option<i64>,
    pub admission_id: Option<i64>,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub due_cents: i64,
    pub payment_status: String,
    pub payment_method: Option<String>,
}

impl From<Bill> for FfiBill {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id,
            appointment_id: bill.appointment_id,
            admission_id: bill.admission_id,
            total_cents: bill.total_cents,
            paid_cents: bill.paid_cents,
            due_cents: bill.due_cents,
            payment_status: bill.payment_status.as_str().to_string(),
            payment_method: bill.payment_method.map(|m| m.as_str().to_string()),
        }
    }
}

/// FFI-safe bill item input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewBillItem {
    pub bill_id: i64,
    pub service_type: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub medicine_id: Option<i64>,
}

/// FFI-safe bill item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBillItem {
    pub id: i64,
    pub bill_id: i64,
    pub service_type: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub amount_cents: i64,
}

impl From<BillItem> for FfiBillItem {
    fn from(item: BillItem) -> Self {
        Self {
            id: item.id,
            bill_id: item.bill_id,
            service_type: item.service_type.as_str().to_string(),
            description: item.description,
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            amount_cents: item.amount_cents,
        }
    }
}

/// FFI-safe payment receipt.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPaymentReceipt {
    pub reference: String,
    pub bill_id: i64,
    pub amount_cents: i64,
    pub paid_cents: i64,
    pub due_cents: i64,
    pub status: String,
}

impl From<PaymentReceipt> for FfiPaymentReceipt {
    fn from(receipt: PaymentReceipt) -> Self {
        Self {
            reference: receipt.reference,
            bill_id: receipt.bill_id,
            amount_cents: receipt.amount_cents,
            paid_cents: receipt.paid_cents,
            due_cents: receipt.due_cents,
            status: receipt.status.as_str().to_string(),
        }
    }
}

/// FFI-safe activity entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiActivityEntry {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub detail: String,
    pub entry_hash: String,
    pub created_at: String,
}

impl From<ActivityEntry> for FfiActivityEntry {
    fn from(entry: ActivityEntry) -> Self {
        Self {
            id: entry.id,
            actor_id: entry.actor_id,
            action: entry.action,
            detail: entry.detail,
            entry_hash: entry.entry_hash,
            created_at: entry.created_at,
        }
    }
}
