//! Cross-table consistency integration tests: propagators, derived fields,
//! and the injected clock.

use clinic_core::db::{Database, DbError};
use clinic_core::models::{
    AdmissionStatus, AdmissionUpdate, Gender, NewAdmission, NewAppointment, NewDoctor,
    NewMedicine, NewPatient, NewRoom, NewUser, Role, VitalsInput,
};
use clinic_core::FixedClock;

fn seed_db() -> Database {
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
    db.create_room(&NewRoom {
        room_number: "101".into(),
        room_type: Some("General".into()),
        capacity: 2,
    })
    .unwrap();
    db
}

fn admit(db: &mut Database, patient_id: i64) -> Result<clinic_core::Admission, DbError> {
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
fn test_third_admission_into_capacity_two_room_rejected() {
    let mut db = seed_db();
    admit(&mut db, 1).unwrap();
    admit(&mut db, 2).unwrap();
    let err = admit(&mut db, 3).unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    let room = db.get_room(1).unwrap().unwrap();
    assert_eq!(room.current_occupancy, 2);
    assert!(room.is_occupied);
}

#[test]
fn test_status_transitions_keep_occupancy_correct() {
    let mut db = seed_db();
    let a1 = admit(&mut db, 1).unwrap();
    admit(&mut db, 2).unwrap();

    // Discharge frees a slot, and the room accepts a new admission again.
    db.update_admission(
        a1.id,
        &AdmissionUpdate {
            status: Some(AdmissionStatus::Discharged),
            discharged_at: Some("2024-03-10T12:00:00Z".into()),
            ..Default::default()
        },
    )
    .unwrap();
    let room = db.get_room(1).unwrap().unwrap();
    assert_eq!(room.current_occupancy, 1);
    assert!(!room.is_occupied);

    admit(&mut db, 3).unwrap();
    let room = db.get_room(1).unwrap().unwrap();
    assert_eq!(room.current_occupancy, 2);
}

#[test]
fn test_stock_alert_history_is_append_only() {
    let mut db = seed_db();
    let med = db
        .add_medicine(&NewMedicine {
            code: "AMX-500".into(),
            name: "Amoxicillin 500mg".into(),
            category: None,
            unit_price_cents: 120,
            current_stock: 20,
            minimum_stock: 10,
            maximum_stock: 500,
        })
        .unwrap();

    // Drop to 5 (below minimum 10): one alert
    let level = db.adjust_stock(med.id, -15, None).unwrap();
    assert_eq!(level.current_stock, 5);
    assert!(level.alert.is_some());
    assert_eq!(db.list_low_stock_alerts(Some(med.id)).unwrap().len(), 1);

    // The same qualifying write again: a second alert, no dedup
    let level = db.adjust_stock(med.id, 0, None).unwrap();
    assert!(level.alert.is_some());
    assert_eq!(db.list_low_stock_alerts(Some(med.id)).unwrap().len(), 2);

    // Restock above the minimum: no further alerts
    let level = db.adjust_stock(med.id, 30, None).unwrap();
    assert!(level.alert.is_none());
    assert_eq!(db.list_low_stock_alerts(Some(med.id)).unwrap().len(), 2);
}

#[test]
fn test_patient_code_stable_across_updates() {
    let mut db = seed_db();
    let mut patient = db.get_patient(1).unwrap().unwrap();
    assert_eq!(patient.code, "PAT-0001");

    patient.phone = Some("555-0100".into());
    patient.address = Some("12 Canal Road".into());
    db.update_patient(&patient).unwrap();
    patient.last_name = "Ahmed".into();
    db.update_patient(&patient).unwrap();

    let stored = db.get_patient(1).unwrap().unwrap();
    assert_eq!(stored.code, "PAT-0001");
    assert_eq!(stored.last_name, "Ahmed");
}

#[test]
fn test_bmi_follows_sources_on_every_write() {
    let mut db = seed_db();
    db.create_appointment(&NewAppointment {
        patient_id: 1,
        doctor_id: 1,
        date: "2024-03-12".into(),
        time: "10:30".into(),
        notes: None,
        created_at: None,
    })
    .unwrap();

    let input = VitalsInput {
        appointment_id: 1,
        weight_kg: 70.0,
        height_cm: 175.0,
        temperature_c: None,
        heart_rate: None,
        systolic: None,
        diastolic: None,
    };
    let vitals = db.record_vitals(&input).unwrap();
    assert_eq!(vitals.bmi, clinic_core::derivation::bmi(70.0, 175.0));

    // Update weight: BMI moves with it
    let heavier = VitalsInput {
        weight_kg: 82.5,
        ..input.clone()
    };
    let updated = db.update_vitals(vitals.id, &heavier).unwrap();
    assert_eq!(updated.bmi, clinic_core::derivation::bmi(82.5, 175.0));

    // Update height: BMI moves again
    let taller = VitalsInput {
        height_cm: 180.0,
        ..heavier
    };
    let updated = db.update_vitals(vitals.id, &taller).unwrap();
    assert_eq!(updated.bmi, clinic_core::derivation::bmi(82.5, 180.0));
}

#[test]
fn test_appointment_date_rule_against_injected_clock() {
    let db = seed_db();

    // "Today" per the fixed clock is 2024-03-10
    let err = db
        .create_appointment(&NewAppointment {
            patient_id: 1,
            doctor_id: 1,
            date: "2024-03-09".into(),
            time: "10:30".into(),
            notes: None,
            created_at: None,
        })
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    db.create_appointment(&NewAppointment {
        patient_id: 1,
        doctor_id: 1,
        date: "2024-03-10".into(),
        time: "10:30".into(),
        notes: None,
        created_at: None,
    })
    .unwrap();
}

#[test]
fn test_admission_duration_against_injected_clock() {
    let mut db = seed_db();
    let admission = db
        .admit_patient(&NewAdmission {
            patient_id: 1,
            room_id: 1,
            attending_doctor_id: None,
            admitted_at: Some("2024-03-03T20:00:00Z".into()),
            reason: None,
            recorded_by: None,
        })
        .unwrap();
    // Fixed clock at 2024-03-10: seven whole days in care.
    assert_eq!(admission.total_days, 7);

    // Discharge pins the duration to the discharge date instead of "now".
    let updated = db
        .update_admission(
            admission.id,
            &AdmissionUpdate {
                status: Some(AdmissionStatus::Discharged),
                discharged_at: Some("2024-03-05T08:00:00Z".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.total_days, 2);
}
