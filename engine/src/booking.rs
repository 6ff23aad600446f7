//! Booking requests.
//!
//! Bookings are one-shot writes to the server; nothing here is persisted
//! locally. The rental total is the number of days times the car's daily rate.

use crate::{error::Result, Car, Error, RemoteId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An inclusive range of rental days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl RentalPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidPeriod(format!(
                "end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of rented days, counting both ends.
    pub fn days(&self) -> u64 {
        (self.end - self.start).num_days().unsigned_abs() + 1
    }
}

/// Everything the server needs to create a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub user_id: RemoteId,
    pub car_id: RemoteId,
    pub period: RentalPeriod,
    pub total: u64,
}

impl BookingRequest {
    /// Price a booking of `car` for `period`.
    pub fn for_car(user_id: impl Into<RemoteId>, car: &Car, period: RentalPeriod) -> Self {
        Self {
            user_id: user_id.into(),
            car_id: car.remote_id.clone(),
            period,
            total: period.days().saturating_mul(car.daily_rate),
        }
    }
}
