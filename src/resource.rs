// Front-desk facades over the engine. The guest-facing surface is an
// async trait so a network front-end can sit directly on top of it; the
// admin surface covers inventory ingestion and oversight.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::{rooms_from_csv_path, RejectedLine, RoomBatchReport, RoomsCsvError};
use crate::directory::{CustomerDirectory, DirectoryError};
use crate::engine::{BookingError, ReservationEngine, RoomSearch, RoomSearchType};
use crate::model::{parse_date, Customer, Reservation, Room, StayRange};

// Guest-facing operations: accounts, lookups, search and booking.
// Dates arrive as YYYY-MM-DD strings the way front-ends collect them.
#[async_trait]
pub trait GuestApi: Send + Sync + 'static {
    async fn create_account(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Arc<Customer>, DirectoryError>;

    async fn customer(&self, email: &str) -> Option<Arc<Customer>>;

    async fn room(&self, room_number: &str) -> Option<Arc<Room>>;

    async fn book_room(
        &self,
        customer_email: &str,
        room_number: &str,
        check_in: &str,
        check_out: &str,
    ) -> Result<Arc<Reservation>, BookingError>;

    async fn reservations_for(
        &self,
        customer_email: &str,
    ) -> Result<Vec<Arc<Reservation>>, BookingError>;

    async fn search_rooms(
        &self,
        check_in: &str,
        check_out: &str,
        search_type: RoomSearchType,
    ) -> Result<RoomSearch, BookingError>;
}

pub struct HotelDesk {
    directory: Arc<CustomerDirectory>,
    engine: Arc<ReservationEngine>,
}

impl HotelDesk {
    pub fn new(directory: Arc<CustomerDirectory>, engine: Arc<ReservationEngine>) -> Self {
        Self { directory, engine }
    }
}

#[async_trait]
impl GuestApi for HotelDesk {
    async fn create_account(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Arc<Customer>, DirectoryError> {
        self.directory.add_customer(email, first_name, last_name)
    }

    async fn customer(&self, email: &str) -> Option<Arc<Customer>> {
        self.directory.find_customer(email)
    }

    async fn room(&self, room_number: &str) -> Option<Arc<Room>> {
        self.engine.catalog().room(room_number)
    }

    async fn book_room(
        &self,
        customer_email: &str,
        room_number: &str,
        check_in: &str,
        check_out: &str,
    ) -> Result<Arc<Reservation>, BookingError> {
        let check_in = parse_date(check_in)?;
        let check_out = parse_date(check_out)?;
        let room = self
            .engine
            .catalog()
            .room(room_number)
            .ok_or_else(|| BookingError::UnknownRoom(room_number.to_owned()))?;
        self.engine.book(customer_email, room, check_in, check_out)
    }

    async fn reservations_for(
        &self,
        customer_email: &str,
    ) -> Result<Vec<Arc<Reservation>>, BookingError> {
        let customer = self
            .directory
            .find_customer(customer_email)
            .ok_or_else(|| BookingError::CustomerNotFound(customer_email.to_owned()))?;
        Ok(self.engine.customer_reservations(&customer))
    }

    async fn search_rooms(
        &self,
        check_in: &str,
        check_out: &str,
        search_type: RoomSearchType,
    ) -> Result<RoomSearch, BookingError> {
        let stay = StayRange::parse(check_in, check_out)?;
        Ok(self.engine.search_with_recommendation(stay, search_type))
    }
}

// Combined outcome of a file load: what the loader rejected line by
// line, and what the catalog skipped as duplicates.
#[derive(Debug)]
pub struct RoomsLoadReport {
    pub batch: RoomBatchReport,
    pub rejected: Vec<RejectedLine>,
}

// Administration: inventory ingestion and full-system oversight.
pub struct AdminDesk {
    directory: Arc<CustomerDirectory>,
    engine: Arc<ReservationEngine>,
}

impl AdminDesk {
    pub fn new(directory: Arc<CustomerDirectory>, engine: Arc<ReservationEngine>) -> Self {
        Self { directory, engine }
    }

    pub fn add_rooms(&self, batch: Vec<Room>) -> RoomBatchReport {
        self.engine.catalog().add_rooms(batch)
    }

    // Reads and parses the file, then ingests whatever parsed. Rejected
    // lines and duplicate numbers come back in the same report; only a
    // failure to read the file itself is an error.
    pub fn load_rooms_csv(&self, path: impl AsRef<Path>) -> Result<RoomsLoadReport, RoomsCsvError> {
        let parsed = rooms_from_csv_path(path)?;
        let batch = self.add_rooms(parsed.rooms);
        Ok(RoomsLoadReport {
            batch,
            rejected: parsed.rejected,
        })
    }

    pub fn all_rooms(&self) -> Vec<Arc<Room>> {
        self.engine.catalog().rooms()
    }

    pub fn all_customers(&self) -> Vec<Arc<Customer>> {
        self.directory.customers()
    }

    pub fn all_reservations(&self) -> Vec<Arc<Reservation>> {
        self.engine.reservations()
    }
}
