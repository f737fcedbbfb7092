//! SQLite schema definition.
//!
//! The original system derived fields through triggers and generated
//! columns; here every derived column is an ordinary column written by the
//! derivation engine inside the mutating path, and the schema only keeps the
//! declarative constraints (uniqueness, foreign keys, range checks).

/// Complete database schema for clinic-core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Staff
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    role TEXT NOT NULL CHECK (role IN ('Admin', 'Doctor', 'Nurse', 'Receptionist')),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS doctors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
    specialization TEXT NOT NULL,
    license_number TEXT NOT NULL UNIQUE,
    years_of_experience INTEGER NOT NULL DEFAULT 0 CHECK (years_of_experience >= 0),
    is_active INTEGER NOT NULL DEFAULT 1
);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT UNIQUE,                             -- assigned once at creation
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,
    gender TEXT NOT NULL CHECK (gender IN ('Male', 'Female', 'Other')),
    blood_group TEXT CHECK (blood_group IN ('A+','A-','B+','B-','AB+','AB-','O+','O-') OR blood_group IS NULL),
    phone TEXT,
    email TEXT,
    address TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    modified_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(last_name, first_name);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    doctor_id INTEGER NOT NULL REFERENCES doctors(id),
    date TEXT NOT NULL,                           -- YYYY-MM-DD
    time TEXT NOT NULL,                           -- HH:MM
    status TEXT NOT NULL CHECK (status IN ('Scheduled', 'Completed', 'Cancelled', 'NoShow')),
    notes TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (doctor_id, date, time)
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_doctor_date ON appointments(doctor_id, date);

CREATE TABLE IF NOT EXISTS vitals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    appointment_id INTEGER NOT NULL REFERENCES appointments(id),
    weight_kg REAL NOT NULL CHECK (weight_kg > 0),
    height_cm REAL NOT NULL CHECK (height_cm > 0),
    bmi REAL NOT NULL,                            -- derived: weight / (height/100)^2
    temperature_c REAL CHECK (temperature_c IS NULL OR (temperature_c >= 30.0 AND temperature_c <= 45.0)),
    heart_rate INTEGER CHECK (heart_rate IS NULL OR heart_rate >= 0),
    systolic INTEGER CHECK (systolic IS NULL OR systolic >= 0),
    diastolic INTEGER CHECK (diastolic IS NULL OR diastolic >= 0),
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vitals_appointment ON vitals(appointment_id);

-- ============================================================================
-- Inventory
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category TEXT,
    unit_price_cents INTEGER NOT NULL CHECK (unit_price_cents >= 0),
    current_stock INTEGER NOT NULL DEFAULT 0 CHECK (current_stock >= 0),
    minimum_stock INTEGER NOT NULL DEFAULT 0 CHECK (minimum_stock >= 0),
    maximum_stock INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    CHECK (minimum_stock < maximum_stock)
);

CREATE TABLE IF NOT EXISTS inventory_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    medicine_id INTEGER NOT NULL REFERENCES medicines(id),
    transaction_type TEXT NOT NULL CHECK (transaction_type IN ('Purchase', 'Sale', 'Return', 'Wastage', 'Adjustment')),
    quantity INTEGER NOT NULL,
    unit_cost_cents INTEGER NOT NULL CHECK (unit_cost_cents >= 0),
    total_cost_cents INTEGER NOT NULL,            -- derived: |quantity| * unit_cost
    reference TEXT,
    performed_by INTEGER REFERENCES users(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_inventory_tx_medicine ON inventory_transactions(medicine_id);

-- Append-only history: one row per qualifying stock write, no dedup
CREATE TABLE IF NOT EXISTS low_stock_alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    medicine_id INTEGER NOT NULL REFERENCES medicines(id),
    medicine_code TEXT NOT NULL,
    medicine_name TEXT NOT NULL,
    current_stock INTEGER NOT NULL,
    minimum_stock INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerts_medicine ON low_stock_alerts(medicine_id, id);

-- ============================================================================
-- Rooms and Admissions
-- ============================================================================

CREATE TABLE IF NOT EXISTS rooms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_number TEXT NOT NULL UNIQUE,
    room_type TEXT,
    capacity INTEGER NOT NULL CHECK (capacity >= 1),
    current_occupancy INTEGER NOT NULL DEFAULT 0 CHECK (current_occupancy >= 0 AND current_occupancy <= capacity),
    is_occupied INTEGER NOT NULL DEFAULT 0,       -- derived: occupancy >= capacity
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS admissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    room_id INTEGER NOT NULL REFERENCES rooms(id),
    attending_doctor_id INTEGER REFERENCES doctors(id),
    admitted_at TEXT NOT NULL,
    discharged_at TEXT,
    total_days INTEGER NOT NULL DEFAULT 0,        -- derived: whole days admitted
    status TEXT NOT NULL CHECK (status IN ('Active', 'Discharged', 'Transferred', 'Deceased')),
    reason TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_admissions_room_status ON admissions(room_id, status);
CREATE INDEX IF NOT EXISTS idx_admissions_patient ON admissions(patient_id);

-- ============================================================================
-- Billing
-- ============================================================================

CREATE TABLE IF NOT EXISTS bills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    appointment_id INTEGER REFERENCES appointments(id),
    admission_id INTEGER REFERENCES admissions(id),
    bill_date TEXT NOT NULL,
    total_cents INTEGER NOT NULL CHECK (total_cents >= 0),
    paid_cents INTEGER NOT NULL DEFAULT 0 CHECK (paid_cents >= 0),
    due_cents INTEGER NOT NULL,                   -- derived: total - paid
    payment_status TEXT NOT NULL CHECK (payment_status IN ('Unpaid', 'PartiallyPaid', 'Paid')),
    payment_method TEXT CHECK (payment_method IN ('Cash', 'CreditCard', 'BankTransfer') OR payment_method IS NULL),
    created_by INTEGER REFERENCES users(id),
    CHECK ((appointment_id IS NULL) + (admission_id IS NULL) = 1),
    CHECK (paid_cents <= total_cents)
);

CREATE INDEX IF NOT EXISTS idx_bills_status ON bills(payment_status);

CREATE TABLE IF NOT EXISTS bill_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    bill_id INTEGER NOT NULL REFERENCES bills(id),
    service_type TEXT NOT NULL CHECK (service_type IN ('Consultation', 'Test', 'Medicine')),
    description TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price_cents INTEGER NOT NULL CHECK (unit_price_cents >= 0),
    amount_cents INTEGER NOT NULL,                -- derived: quantity * unit_price
    medicine_id INTEGER REFERENCES medicines(id)
);

CREATE INDEX IF NOT EXISTS idx_bill_items_bill ON bill_items(bill_id);

-- ============================================================================
-- Activity Log (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    actor_id INTEGER REFERENCES users(id),
    action TEXT NOT NULL,
    detail TEXT NOT NULL DEFAULT '{}',            -- JSON payload
    prev_hash TEXT,                               -- NULL only for the first entry
    entry_hash TEXT NOT NULL UNIQUE,              -- SHA-256 over prev_hash + content
    created_at TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_bill_reference_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // Neither reference set should fail
        let result = conn.execute(
            "INSERT INTO bills (bill_date, total_cents, paid_cents, due_cents, payment_status)
             VALUES ('2024-01-01', 100, 0, 100, 'Unpaid')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_room_occupancy_bounded_by_capacity() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO rooms (room_number, capacity) VALUES ('101', 2)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "UPDATE rooms SET current_occupancy = 3 WHERE room_number = '101'",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_medicine_stock_bounds() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // minimum >= maximum should fail
        let result = conn.execute(
            "INSERT INTO medicines (code, name, unit_price_cents, current_stock, minimum_stock, maximum_stock)
             VALUES ('AMX', 'Amoxicillin', 100, 50, 200, 200)",
            [],
        );
        assert!(result.is_err());
    }
}
