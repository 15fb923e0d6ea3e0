// Domain model: rooms, customers, stay windows and reservations.
// Entities validate at construction and are immutable afterwards.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Errors raised when constructing domain entities. Nothing is ever
// partially constructed: a failed constructor leaves no entity behind.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("room number must be a positive integer, got {0:?}")]
    RoomNumberNotPositive(String),

    #[error("room price must be 0 or a positive value, got {0}")]
    NegativePrice(f64),

    #[error("first name cannot be empty")]
    EmptyFirstName,

    #[error("last name cannot be empty")]
    EmptyLastName,

    #[error("invalid email format {0:?}, expected something like example@domain.com")]
    InvalidEmail(String),

    #[error("check-in date {check_in} must be before the check-out date {check_out}")]
    StayNotInOrder {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    BadDate(String),
}

// The two fixed room categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomCategory {
    Single,
    Double,
}

impl RoomCategory {
    // Case-insensitive token used by the bulk-load record format.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "single" => Some(RoomCategory::Single),
            "double" => Some(RoomCategory::Double),
            _ => None,
        }
    }
}

impl fmt::Display for RoomCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomCategory::Single => write!(f, "Single Bed Room"),
            RoomCategory::Double => write!(f, "Double Bed Room"),
        }
    }
}

// A bookable room. Identity is the room number alone: two rooms with the
// same number are the same room no matter what else differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    number: String,
    price: f64,
    category: RoomCategory,
}

impl Room {
    pub fn new(
        number: impl Into<String>,
        price: f64,
        category: RoomCategory,
    ) -> Result<Self, ValidationError> {
        let number = number.into();
        let is_positive = number.parse::<i32>().map(|n| n > 0).unwrap_or(false);
        if !is_positive {
            return Err(ValidationError::RoomNumberNotPositive(number));
        }
        if price < 0.0 {
            return Err(ValidationError::NegativePrice(price));
        }
        Ok(Self {
            number,
            price,
            category,
        })
    }

    // A room offered at no charge. "Free" is a price, not a kind of room.
    pub fn free(number: impl Into<String>, category: RoomCategory) -> Result<Self, ValidationError> {
        Self::new(number, 0.0, category)
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn category(&self) -> RoomCategory {
        self.category
    }

    pub fn is_free(&self) -> bool {
        self.price == 0.0
    }
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for Room {}

impl Hash for Room {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            write!(
                f,
                "Room number: {}, Room type: {}, Price: (Free)",
                self.number, self.category
            )
        } else {
            write!(
                f,
                "Room number: {}, Room type: {}, Price: ${:.2}",
                self.number, self.category, self.price
            )
        }
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

// A known customer. Identity is the email address alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    first_name: String,
    last_name: String,
    email: String,
}

impl Customer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let first_name = first_name.into();
        if first_name.trim().is_empty() {
            return Err(ValidationError::EmptyFirstName);
        }
        let last_name = last_name.into();
        if last_name.trim().is_empty() {
            return Err(ValidationError::EmptyLastName);
        }
        let email = email.into();
        if !email_regex().is_match(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }
        Ok(Self {
            first_name,
            last_name,
            email,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email
    }
}

impl Eq for Customer {}

impl Hash for Customer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.email.hash(state);
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Customer: {} {}, Email: {}",
            self.first_name, self.last_name, self.email
        )
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::BadDate(value.to_string()))
}

// The availability window [check_in, check_out) a booking or search
// request is evaluated against. Check-in must be strictly before
// check-out; equal or inverted pairs never construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ValidationError> {
        if check_in >= check_out {
            return Err(ValidationError::StayNotInOrder {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    // Window from a pair of YYYY-MM-DD strings, as front-ends collect them.
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self, ValidationError> {
        Self::new(parse_date(check_in)?, parse_date(check_out)?)
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    // Two windows conflict when neither lies strictly outside the other.
    // The comparisons are inclusive at both ends, so windows that merely
    // touch (one checkout equals the other check-in) also conflict.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in <= other.check_out && self.check_out >= other.check_in
    }

    // Same window length, both dates moved forward by `days`.
    pub fn shifted(&self, days: i64) -> StayRange {
        StayRange {
            check_in: self.check_in + Duration::days(days),
            check_out: self.check_out + Duration::days(days),
        }
    }
}

impl fmt::Display for StayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.check_in, self.check_out)
    }
}

// An immutable record binding one customer to one room for one window.
// There is no identity beyond the fields; the ledger owns the record
// while customer and room stay shared with their registries.
#[derive(Debug, Clone)]
pub struct Reservation {
    customer: Arc<Customer>,
    room: Arc<Room>,
    stay: StayRange,
}

impl Reservation {
    pub fn new(customer: Arc<Customer>, room: Arc<Room>, stay: StayRange) -> Self {
        Self {
            customer,
            room,
            stay,
        }
    }

    pub fn customer(&self) -> &Arc<Customer> {
        &self.customer
    }

    pub fn room(&self) -> &Arc<Room> {
        &self.room
    }

    pub fn stay(&self) -> StayRange {
        self.stay
    }
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reservation for {} {}: {}, check-in {}, check-out {}",
            self.customer.first_name(),
            self.customer.last_name(),
            self.room,
            self.stay.check_in().format("%A %B %d %Y"),
            self.stay.check_out().format("%A %B %d %Y"),
        )
    }
}
