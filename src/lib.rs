// Hotel reservation engine: room inventory, customer records, and
// time-bounded reservations with overlap-safe booking and search.

pub mod catalog;
pub mod directory;
pub mod engine;
pub mod model;
pub mod resource;

// Re-export key types for convenience
pub use catalog::{
    CsvLineError, CsvRooms, RejectedLine, RoomBatchReport, RoomCatalog, RoomsCsvError,
};
pub use directory::{CustomerDirectory, CustomerLookup, DirectoryError};
pub use engine::{
    BookingError, ReservationEngine, RoomSearch, RoomSearchType, RECOMMENDATION_SHIFT_DAYS,
};
pub use model::{Customer, Reservation, Room, RoomCategory, StayRange, ValidationError};
pub use resource::{AdminDesk, GuestApi, HotelDesk, RoomsLoadReport};
