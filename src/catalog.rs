// Room inventory: a concurrent set of rooms unique by room number, the
// bulk ingestion path, and the line-oriented loader behind it.

use std::path::Path;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{Room, RoomCategory, ValidationError};

#[derive(Error, Debug)]
pub enum RoomsCsvError {
    #[error("failed to read rooms file: {0}")]
    Io(#[from] std::io::Error),
}

// Why a single record was rejected by the loader. A bad line is skipped
// and reported; it never aborts the rest of the file.
#[derive(Error, Debug)]
pub enum CsvLineError {
    #[error("each line must have 3 comma-separated values: roomNumber,price,roomType")]
    WrongFieldCount,

    #[error("price must be a number, got {0:?}")]
    UnparseablePrice(String),

    #[error("unknown room category {0:?}, expected \"single\" or \"double\"")]
    UnknownCategory(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

// Outcome of a bulk add. A duplicate room number is an expected
// steady-state outcome, reported per item rather than raised.
#[derive(Debug, Default, Clone)]
pub struct RoomBatchReport {
    pub added: Vec<String>,
    pub conflicts: Vec<String>,
}

// One rejected loader record: 1-based line number and the reason.
#[derive(Debug)]
pub struct RejectedLine {
    pub line: usize,
    pub reason: CsvLineError,
}

// Loader output: whatever parsed, plus the lines that did not.
#[derive(Debug, Default)]
pub struct CsvRooms {
    pub rooms: Vec<Room>,
    pub rejected: Vec<RejectedLine>,
}

// The set of bookable rooms, keyed by room number.
#[derive(Debug, Default)]
pub struct RoomCatalog {
    rooms: DashMap<String, Arc<Room>>,
}

impl RoomCatalog {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    // Add-if-absent. Returns false when a room with the same number is
    // already in the catalog; the existing room stays untouched and the
    // caller decides how to report the conflict.
    pub fn add_room(&self, room: Room) -> bool {
        match self.rooms.entry(room.number().to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(room));
                true
            }
        }
    }

    pub fn room(&self, number: &str) -> Option<Arc<Room>> {
        self.rooms.get(number).map(|entry| Arc::clone(entry.value()))
    }

    // Snapshot of the inventory. Iteration order is unspecified.
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    // Bulk ingestion. Each room stands alone: a conflicting number is
    // skipped and recorded while the rest of the batch proceeds.
    pub fn add_rooms(&self, batch: Vec<Room>) -> RoomBatchReport {
        let mut report = RoomBatchReport::default();
        for room in batch {
            let number = room.number().to_owned();
            if self.add_room(room) {
                info!(room = %number, "added room");
                report.added.push(number);
            } else {
                warn!(room = %number, "room number already exists, skipping");
                report.conflicts.push(number);
            }
        }
        report
    }
}

// Parses the bulk-load record format: one `roomNumber,price,roomType`
// record per line, roomType being a case-insensitive category token.
// Blank lines are ignored; malformed lines are collected, not fatal.
pub fn rooms_from_csv_str(content: &str) -> CsvRooms {
    let mut out = CsvRooms::default();
    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }
        match parse_room_line(raw) {
            Ok(room) => out.rooms.push(room),
            Err(reason) => {
                warn!(line, %reason, "rejected room record");
                out.rejected.push(RejectedLine { line, reason });
            }
        }
    }
    out
}

pub fn rooms_from_csv_path(path: impl AsRef<Path>) -> Result<CsvRooms, RoomsCsvError> {
    let content = std::fs::read_to_string(path)?;
    Ok(rooms_from_csv_str(&content))
}

fn parse_room_line(line: &str) -> Result<Room, CsvLineError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(CsvLineError::WrongFieldCount);
    }
    let price: f64 = fields[1]
        .parse()
        .map_err(|_| CsvLineError::UnparseablePrice(fields[1].to_string()))?;
    let category = RoomCategory::from_token(fields[2])
        .ok_or_else(|| CsvLineError::UnknownCategory(fields[2].to_string()))?;
    Ok(Room::new(fields[0], price, category)?)
}
