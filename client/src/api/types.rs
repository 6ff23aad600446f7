//! Wire types of the RentX HTTP API.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rentx_engine::{
    Accessory, BookingRequest, Car, ChangeBatch, NewUser, Photo, TableChanges, User, Version,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer credential attached to authenticated requests.
///
/// The value never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

// ── Auth ──

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: RemoteUser,
}

/// The profile the server returns at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub driver_license: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl LoginResponse {
    /// Fields for the local user record this sign-in creates.
    pub fn into_new_user(self) -> NewUser {
        NewUser::new(
            self.user.id,
            self.user.email,
            self.user.name,
            self.user.driver_license,
            self.user.avatar.unwrap_or_default(),
            self.token,
        )
    }
}

// ── Cars ──

/// A car as the server sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarRecord {
    pub id: String,
    pub brand: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Daily rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    /// Nested rate used by direct reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent: Option<RentRecord>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<PhotoRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessories: Option<Vec<AccessoryRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentRecord {
    pub period: String,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    #[serde(default)]
    pub id: String,
    pub photo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

impl TryFrom<CarRecord> for Car {
    type Error = Error;

    fn try_from(record: CarRecord) -> Result<Car> {
        let (period, daily_rate) = match (record.rent, record.period, record.price) {
            (Some(rent), _, _) => (rent.period, rent.price),
            (None, Some(period), Some(price)) => (period, price),
            (None, None, Some(_)) => {
                return Err(Error::Protocol(format!(
                    "car {} has no rental period",
                    record.id
                )));
            }
            (None, _, None) => {
                return Err(Error::Protocol(format!("car {} has no price", record.id)));
            }
        };

        Ok(Car {
            remote_id: record.id,
            brand: record.brand,
            name: record.name,
            about: record.about,
            fuel_type: record.fuel_type,
            daily_rate,
            period,
            thumbnail_uri: record.thumbnail,
            photos: record.photos.map(|photos| {
                photos
                    .into_iter()
                    .map(|p| Photo::new(p.id, p.photo))
                    .collect()
            }),
            accessories: record.accessories.map(|accessories| {
                accessories
                    .into_iter()
                    .map(|a| Accessory::new(a.kind, a.name))
                    .collect()
            }),
        })
    }
}

impl From<&Car> for CarRecord {
    fn from(car: &Car) -> Self {
        Self {
            id: car.remote_id.clone(),
            brand: car.brand.clone(),
            name: car.name.clone(),
            about: car.about.clone(),
            fuel_type: car.fuel_type.clone(),
            period: Some(car.period.clone()),
            price: Some(car.daily_rate),
            rent: None,
            thumbnail: car.thumbnail_uri.clone(),
            photos: car.photos.as_ref().map(|photos| {
                photos
                    .iter()
                    .map(|p| PhotoRecord {
                        id: p.id.clone(),
                        photo: p.uri.clone(),
                    })
                    .collect()
            }),
            accessories: car.accessories.as_ref().map(|accessories| {
                accessories
                    .iter()
                    .map(|a| AccessoryRecord {
                        id: None,
                        kind: a.kind.clone(),
                        name: a.name.clone(),
                    })
                    .collect()
            }),
        }
    }
}

fn convert_all(records: Vec<CarRecord>) -> Result<Vec<Car>> {
    records.into_iter().map(Car::try_from).collect()
}

// ── Sync ──

/// Response of `GET /cars/sync/pull`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub changes: PullChanges,
    pub latest_version: Version,
}

/// Per-collection changes of a pull.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullChanges {
    #[serde(default)]
    pub cars: TableChanges<CarRecord>,
    /// Never applied locally; the session row is not server-originated
    #[serde(default)]
    pub users: TableChanges<serde_json::Value>,
}

impl PullResponse {
    /// Decode the car changes into an engine batch.
    pub fn into_batch(self) -> Result<ChangeBatch> {
        let cars = self.changes.cars;
        let changes = TableChanges::created(convert_all(cars.created)?)
            .with_updated(convert_all(cars.updated)?)
            .with_deleted(cars.deleted);
        Ok(ChangeBatch::new(changes, self.latest_version))
    }
}

/// Profile fields sent by `POST /users/sync`. The token travels in the
/// authorization header only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub driver_license: String,
    pub avatar: String,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.local_id.clone(),
            user_id: user.remote_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            driver_license: user.driver_license.clone(),
            avatar: user.avatar_uri.clone(),
        }
    }
}

// ── Rentals ──

/// Body of `POST /rentals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingBody {
    pub user_id: String,
    pub car_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total: u64,
}

impl From<&BookingRequest> for BookingBody {
    fn from(request: &BookingRequest) -> Self {
        Self {
            user_id: request.user_id.clone(),
            car_id: request.car_id.clone(),
            start_date: midnight_utc(request.period.start()),
            end_date: midnight_utc(request.period.end()),
            total: request.total,
        }
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// A booking the server created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub car_id: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// An entry of `GET /rentals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalRecord {
    pub id: String,
    pub car: CarRecord,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// A past or upcoming rental of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rental {
    pub id: String,
    pub car: Car,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl TryFrom<RentalRecord> for Rental {
    type Error = Error;

    fn try_from(record: RentalRecord) -> Result<Rental> {
        Ok(Rental {
            id: record.id,
            car: Car::try_from(record.car)?,
            start_date: record.start_date,
            end_date: record.end_date,
        })
    }
}
