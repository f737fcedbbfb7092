//! Room occupancy propagator.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{DbError, DbResult};
use crate::derivation;
use crate::rules;

/// Occupancy state of a room after a recount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomOccupancy {
    pub room_id: i64,
    pub current_occupancy: i64,
    pub capacity: i64,
    pub is_occupied: bool,
}

/// Recompute a room's occupancy as a full recount of its Active admissions.
///
/// Always a full recount, never an increment, so status transitions and
/// out-of-order updates stay correct. Exceeding capacity is a validation
/// failure surfaced to the admission write that caused it; this runs inside
/// that write's transaction, so the whole mutation rolls back.
pub fn refresh_room_occupancy(conn: &Connection, room_id: i64) -> DbResult<RoomOccupancy> {
    let room: Option<(String, i64)> = conn
        .query_row(
            "SELECT room_number, capacity FROM rooms WHERE id = ?",
            [room_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (room_number, capacity) =
        room.ok_or_else(|| DbError::NotFound(format!("room {}", room_id)))?;

    let current_occupancy: i64 = conn.query_row(
        "SELECT COUNT(*) FROM admissions WHERE room_id = ?1 AND status = 'Active'",
        [room_id],
        |row| row.get(0),
    )?;

    rules::check_room_capacity(&room_number, current_occupancy, capacity)?;
    let is_occupied = derivation::is_occupied(current_occupancy, capacity);

    conn.execute(
        "UPDATE rooms SET current_occupancy = ?2, is_occupied = ?3 WHERE id = ?1",
        params![room_id, current_occupancy, is_occupied],
    )?;

    Ok(RoomOccupancy {
        room_id,
        current_occupancy,
        capacity,
        is_occupied,
    })
}
