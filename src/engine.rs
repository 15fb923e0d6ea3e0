// The reservation engine: the ledger of committed reservations, the
// availability predicate over it, atomic booking, and availability
// search with the shifted-window recommendation fallback.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::RoomCatalog;
use crate::directory::CustomerLookup;
use crate::model::{Customer, Reservation, Room, StayRange, ValidationError};

// How far forward the fallback search moves a window that came up empty.
pub const RECOMMENDATION_SHIFT_DAYS: i64 = 7;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("customer with email {0:?} is not in the system; create an account first")]
    CustomerNotFound(String),

    #[error("room {room} is not available between {check_in} and {check_out}")]
    RoomUnavailable {
        room: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("no room with number {0:?}")]
    UnknownRoom(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// Which rooms an availability search should return. The set of modes is
// closed, so there is no unrecognized-filter failure path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomSearchType {
    FreeRooms,
    PaidRooms,
    Both,
}

impl RoomSearchType {
    fn matches(self, room: &Room) -> bool {
        match self {
            RoomSearchType::FreeRooms => room.is_free(),
            RoomSearchType::PaidRooms => !room.is_free(),
            RoomSearchType::Both => true,
        }
    }
}

// Outcome of a search that may fall back to a shifted window.
#[derive(Debug, Clone)]
pub enum RoomSearch {
    // Rooms free in the requested window.
    Available(Vec<Arc<Room>>),
    // Nothing in the requested window, but these are free in the
    // attached shifted one.
    Recommended {
        rooms: Vec<Arc<Room>>,
        stay: StayRange,
    },
    // Nothing in the requested window or the shifted one.
    NoneFound,
}

pub struct ReservationEngine {
    catalog: Arc<RoomCatalog>,
    directory: Arc<dyn CustomerLookup>,
    // Append-only ledger of every committed reservation. The write
    // guard doubles as the booking critical section.
    ledger: RwLock<Vec<Arc<Reservation>>>,
}

impl ReservationEngine {
    pub fn new(catalog: Arc<RoomCatalog>, directory: Arc<dyn CustomerLookup>) -> Self {
        Self {
            catalog,
            directory,
            ledger: RwLock::new(Vec::new()),
        }
    }

    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    // True when no committed reservation for the same room overlaps the
    // candidate window.
    pub fn is_available(&self, room: &Room, stay: StayRange) -> bool {
        let ledger = self.ledger.read();
        Self::available_in(&ledger, room, stay)
    }

    fn available_in(ledger: &[Arc<Reservation>], room: &Room, stay: StayRange) -> bool {
        !ledger.iter().any(|reservation| {
            reservation.room().as_ref() == room && reservation.stay().overlaps(&stay)
        })
    }

    // Books the room for the window, or reports why it cannot. The
    // availability re-check and the append run under a single write
    // guard: of any set of racing bookings for overlapping windows on
    // one room, at most one can commit.
    pub fn book(
        &self,
        customer_email: &str,
        room: Arc<Room>,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Arc<Reservation>, BookingError> {
        let stay = StayRange::new(check_in, check_out)?;
        let customer = self
            .directory
            .find_customer(customer_email)
            .ok_or_else(|| BookingError::CustomerNotFound(customer_email.to_owned()))?;

        let mut ledger = self.ledger.write();
        if !Self::available_in(&ledger, &room, stay) {
            return Err(BookingError::RoomUnavailable {
                room: room.number().to_owned(),
                check_in,
                check_out,
            });
        }
        let reservation = Arc::new(Reservation::new(customer, room, stay));
        ledger.push(Arc::clone(&reservation));
        info!(
            room = %reservation.room().number(),
            customer = %reservation.customer().email(),
            check_in = %stay.check_in(),
            check_out = %stay.check_out(),
            "booked room"
        );
        Ok(reservation)
    }

    // Every catalog room that is free for the window and matches the
    // filter. The ledger is read once for the whole scan, so the result
    // is a consistent snapshot.
    pub fn find_rooms(&self, stay: StayRange, search_type: RoomSearchType) -> Vec<Arc<Room>> {
        let ledger = self.ledger.read();
        let rooms: Vec<Arc<Room>> = self
            .catalog
            .rooms()
            .into_iter()
            .filter(|room| search_type.matches(room) && Self::available_in(&ledger, room, stay))
            .collect();
        debug!(
            check_in = %stay.check_in(),
            check_out = %stay.check_out(),
            found = rooms.len(),
            "searched available rooms"
        );
        rooms
    }

    // Primary search, then a single retry with both dates moved forward
    // by RECOMMENDATION_SHIFT_DAYS, same length and filter. No further
    // retries, never backward.
    pub fn search_with_recommendation(
        &self,
        stay: StayRange,
        search_type: RoomSearchType,
    ) -> RoomSearch {
        let rooms = self.find_rooms(stay, search_type);
        if !rooms.is_empty() {
            return RoomSearch::Available(rooms);
        }

        let shifted = stay.shifted(RECOMMENDATION_SHIFT_DAYS);
        let rooms = self.find_rooms(shifted, search_type);
        if rooms.is_empty() {
            RoomSearch::NoneFound
        } else {
            debug!(
                check_in = %shifted.check_in(),
                check_out = %shifted.check_out(),
                "recommending shifted window"
            );
            RoomSearch::Recommended {
                rooms,
                stay: shifted,
            }
        }
    }

    // All reservations held by the customer, in booking order. A
    // customer with no bookings gets an empty vec, not an error.
    pub fn customer_reservations(&self, customer: &Customer) -> Vec<Arc<Reservation>> {
        self.ledger
            .read()
            .iter()
            .filter(|reservation| reservation.customer().as_ref() == customer)
            .map(Arc::clone)
            .collect()
    }

    // Snapshot of the full ledger, in booking order.
    pub fn reservations(&self) -> Vec<Arc<Reservation>> {
        self.ledger.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CustomerDirectory;
    use crate::model::RoomCategory;
    use std::thread;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(from: (i32, u32, u32), to: (i32, u32, u32)) -> StayRange {
        StayRange::new(date(from.0, from.1, from.2), date(to.0, to.1, to.2)).unwrap()
    }

    struct Fixture {
        directory: Arc<CustomerDirectory>,
        engine: ReservationEngine,
    }

    fn fixture(rooms: Vec<Room>) -> Fixture {
        let catalog = Arc::new(RoomCatalog::new());
        for room in rooms {
            assert!(catalog.add_room(room));
        }
        let directory = Arc::new(CustomerDirectory::new());
        directory
            .add_customer("guest@example.com", "Grace", "Hopper")
            .unwrap();
        let engine = ReservationEngine::new(catalog, Arc::clone(&directory) as _);
        Fixture { directory, engine }
    }

    fn paid(number: &str) -> Room {
        Room::new(number, 150.0, RoomCategory::Double).unwrap()
    }

    fn free(number: &str) -> Room {
        Room::free(number, RoomCategory::Single).unwrap()
    }

    #[test]
    fn test_booking_appends_to_the_ledger() {
        let fx = fixture(vec![paid("101")]);
        let room = fx.engine.catalog().room("101").unwrap();

        let reservation = fx
            .engine
            .book("guest@example.com", room, date(2024, 1, 10), date(2024, 1, 15))
            .unwrap();

        assert_eq!(reservation.room().number(), "101");
        assert_eq!(reservation.customer().email(), "guest@example.com");
        assert_eq!(fx.engine.reservations().len(), 1);
    }

    #[test]
    fn test_unknown_customer_cannot_book() {
        let fx = fixture(vec![paid("101")]);
        let room = fx.engine.catalog().room("101").unwrap();

        let result = fx
            .engine
            .book("stranger@example.com", room, date(2024, 1, 10), date(2024, 1, 15));
        assert!(matches!(result, Err(BookingError::CustomerNotFound(_))));
        assert!(fx.engine.reservations().is_empty());
    }

    #[test]
    fn test_bad_dates_never_reach_the_ledger() {
        let fx = fixture(vec![paid("101")]);
        let room = fx.engine.catalog().room("101").unwrap();

        let result = fx
            .engine
            .book("guest@example.com", room, date(2024, 1, 15), date(2024, 1, 15));
        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert!(fx.engine.reservations().is_empty());
    }

    // Back-to-back stays conflict: a window starting on the committed
    // checkout day is rejected, one starting a day later books fine.
    // That is documented engine policy, not an accident; see the
    // overlap cases on StayRange as well.
    #[test]
    fn test_touching_windows_conflict_but_clear_windows_book() {
        let fx = fixture(vec![paid("101")]);
        let room = fx.engine.catalog().room("101").unwrap();
        fx.engine
            .book(
                "guest@example.com",
                Arc::clone(&room),
                date(2024, 1, 10),
                date(2024, 1, 15),
            )
            .unwrap();

        let touching = fx.engine.book(
            "guest@example.com",
            Arc::clone(&room),
            date(2024, 1, 15),
            date(2024, 1, 20),
        );
        assert!(matches!(
            touching,
            Err(BookingError::RoomUnavailable { .. })
        ));

        let clear = fx.engine.book(
            "guest@example.com",
            Arc::clone(&room),
            date(2024, 1, 16),
            date(2024, 1, 20),
        );
        assert!(clear.is_ok());
        assert_eq!(fx.engine.reservations().len(), 2);
    }

    #[test]
    fn test_availability_is_scoped_to_the_room() {
        let fx = fixture(vec![paid("101"), paid("102")]);
        let booked = fx.engine.catalog().room("101").unwrap();
        let other = fx.engine.catalog().room("102").unwrap();
        let window = stay((2024, 1, 10), (2024, 1, 15));

        fx.engine
            .book(
                "guest@example.com",
                booked,
                window.check_in(),
                window.check_out(),
            )
            .unwrap();

        assert!(!fx.engine.is_available(fx.engine.catalog().room("101").unwrap().as_ref(), window));
        assert!(fx.engine.is_available(other.as_ref(), window));
    }

    #[test_case(RoomSearchType::FreeRooms, 2)]
    #[test_case(RoomSearchType::PaidRooms, 3)]
    #[test_case(RoomSearchType::Both, 5)]
    fn test_search_type_filtering(search_type: RoomSearchType, expected: usize) {
        let fx = fixture(vec![
            free("1"),
            free("2"),
            paid("3"),
            paid("4"),
            paid("5"),
        ]);
        let found = fx
            .engine
            .find_rooms(stay((2024, 3, 1), (2024, 3, 5)), search_type);
        assert_eq!(found.len(), expected);
    }

    #[test]
    fn test_search_excludes_rooms_with_overlapping_reservations() {
        let fx = fixture(vec![paid("101"), paid("102")]);
        let room = fx.engine.catalog().room("101").unwrap();
        fx.engine
            .book("guest@example.com", room, date(2024, 1, 10), date(2024, 1, 15))
            .unwrap();

        let found = fx
            .engine
            .find_rooms(stay((2024, 1, 12), (2024, 1, 14)), RoomSearchType::Both);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number(), "102");
    }

    #[test]
    fn test_recommendation_shifts_the_window_once() {
        let fx = fixture(vec![paid("101")]);
        let room = fx.engine.catalog().room("101").unwrap();
        // Occupy the requested window but leave the +7 one clear.
        fx.engine
            .book("guest@example.com", room, date(2024, 2, 1), date(2024, 2, 3))
            .unwrap();

        let requested = stay((2024, 2, 1), (2024, 2, 3));
        assert!(fx.engine.find_rooms(requested, RoomSearchType::Both).is_empty());

        match fx
            .engine
            .search_with_recommendation(requested, RoomSearchType::Both)
        {
            RoomSearch::Recommended { rooms, stay } => {
                assert_eq!(rooms.len(), 1);
                assert_eq!(rooms[0].number(), "101");
                assert_eq!(stay.check_in(), date(2024, 2, 8));
                assert_eq!(stay.check_out(), date(2024, 2, 10));
            }
            other => panic!("expected a recommendation, got {other:?}"),
        }
    }

    #[test]
    fn test_no_second_fallback_when_shifted_window_is_also_taken() {
        let fx = fixture(vec![paid("101")]);
        let room = fx.engine.catalog().room("101").unwrap();
        // One long reservation swallowing both the requested window and
        // the +7 retry; two weeks later the room is clear, but the
        // engine must not look that far.
        fx.engine
            .book(
                "guest@example.com",
                room,
                date(2024, 2, 1),
                date(2024, 2, 12),
            )
            .unwrap();

        let outcome = fx
            .engine
            .search_with_recommendation(stay((2024, 2, 1), (2024, 2, 3)), RoomSearchType::Both);
        assert!(matches!(outcome, RoomSearch::NoneFound));
    }

    #[test]
    fn test_recommendation_preserves_the_category_filter() {
        let fx = fixture(vec![free("1"), paid("2")]);
        let paid_room = fx.engine.catalog().room("2").unwrap();
        let free_room = fx.engine.catalog().room("1").unwrap();
        fx.engine
            .book(
                "guest@example.com",
                paid_room,
                date(2024, 2, 1),
                date(2024, 2, 3),
            )
            .unwrap();
        fx.engine
            .book(
                "guest@example.com",
                free_room,
                date(2024, 2, 1),
                date(2024, 2, 12),
            )
            .unwrap();

        // Paid rooms: requested window taken, shifted window open.
        match fx.engine.search_with_recommendation(
            stay((2024, 2, 1), (2024, 2, 3)),
            RoomSearchType::PaidRooms,
        ) {
            RoomSearch::Recommended { rooms, .. } => {
                assert_eq!(rooms.len(), 1);
                assert_eq!(rooms[0].number(), "2");
            }
            other => panic!("expected a recommendation, got {other:?}"),
        }

        // Free rooms: both windows taken by the long reservation.
        let outcome = fx.engine.search_with_recommendation(
            stay((2024, 2, 1), (2024, 2, 3)),
            RoomSearchType::FreeRooms,
        );
        assert!(matches!(outcome, RoomSearch::NoneFound));
    }

    #[test]
    fn test_customer_with_no_bookings_gets_an_empty_list() {
        let fx = fixture(vec![paid("101")]);
        let idle = fx
            .directory
            .add_customer("idle@example.com", "Alan", "Turing")
            .unwrap();
        let room = fx.engine.catalog().room("101").unwrap();
        fx.engine
            .book("guest@example.com", room, date(2024, 1, 10), date(2024, 1, 15))
            .unwrap();

        assert!(fx.engine.customer_reservations(&idle).is_empty());

        let guest = fx.directory.find_customer("guest@example.com").unwrap();
        assert_eq!(fx.engine.customer_reservations(&guest).len(), 1);
    }

    #[test]
    fn test_concurrent_overlapping_bookings_commit_exactly_once() {
        let fx = fixture(vec![paid("101")]);
        let engine = Arc::new(fx.engine);
        let attempts = 16;

        let mut handles = Vec::new();
        for _ in 0..attempts {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                let room = engine.catalog().room("101").unwrap();
                engine.book(
                    "guest@example.com",
                    room,
                    date(2024, 5, 1),
                    date(2024, 5, 5),
                )
            }));
        }

        let mut successes = 0;
        let mut unavailable = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => successes += 1,
                Err(BookingError::RoomUnavailable { .. }) => unavailable += 1,
                Err(other) => panic!("unexpected booking failure: {other}"),
            }
        }

        assert_eq!(successes, 1, "exactly one racing booking may commit");
        assert_eq!(unavailable, attempts - 1);
        assert_eq!(engine.reservations().len(), 1);
    }

    #[test]
    fn test_concurrent_disjoint_windows_all_commit() {
        let fx = fixture(vec![paid("101")]);
        let engine = Arc::new(fx.engine);

        // Windows spaced two days apart so none of them touch.
        let mut handles = Vec::new();
        for i in 0..5u32 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                let room = engine.catalog().room("101").unwrap();
                engine.book(
                    "guest@example.com",
                    room,
                    date(2024, 6, 1 + i * 4),
                    date(2024, 6, 3 + i * 4),
                )
            }));
        }

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(engine.reservations().len(), 5);
    }
}
