//! Database operations for the cars table.

use rentx_engine::{Accessory, Car, Photo, TableChanges};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::BTreeSet;

/// A stored car row from the database.
#[derive(Debug)]
pub struct StoredCar {
    pub remote_id: String,
    pub brand: String,
    pub name: String,
    pub about: Option<String>,
    pub fuel_type: Option<String>,
    pub daily_rate: i64,
    pub period: String,
    pub thumbnail_uri: String,
    pub photos: Option<Json<Vec<Photo>>>,
    pub accessories: Option<Json<BTreeSet<Accessory>>>,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for StoredCar {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(StoredCar {
            remote_id: row.try_get("remote_id")?,
            brand: row.try_get("brand")?,
            name: row.try_get("name")?,
            about: row.try_get("about")?,
            fuel_type: row.try_get("fuel_type")?,
            daily_rate: row.try_get("daily_rate")?,
            period: row.try_get("period")?,
            thumbnail_uri: row.try_get("thumbnail_uri")?,
            photos: row.try_get("photos")?,
            accessories: row.try_get("accessories")?,
        })
    }
}

impl StoredCar {
    /// Convert database row to an engine Car.
    pub fn into_car(self) -> Car {
        Car {
            remote_id: self.remote_id,
            brand: self.brand,
            name: self.name,
            about: self.about,
            fuel_type: self.fuel_type,
            daily_rate: self.daily_rate as u64,
            period: self.period,
            thumbnail_uri: self.thumbnail_uri,
            photos: self.photos.map(|Json(photos)| photos),
            accessories: self.accessories.map(|Json(accessories)| accessories),
        }
    }
}

/// Get every mirrored car.
pub async fn list_cars(pool: &SqlitePool) -> Result<Vec<StoredCar>, sqlx::Error> {
    sqlx::query_as::<_, StoredCar>(
        r#"
        SELECT remote_id, brand, name, about, fuel_type, daily_rate, period,
               thumbnail_uri, photos, accessories
        FROM cars
        ORDER BY remote_id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Upsert a car, replacing every column of an existing row.
pub async fn upsert_car(conn: &mut SqliteConnection, car: &Car) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO cars (
            remote_id, brand, name, about, fuel_type, daily_rate, period,
            thumbnail_uri, photos, accessories
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (remote_id) DO UPDATE SET
            brand = excluded.brand,
            name = excluded.name,
            about = excluded.about,
            fuel_type = excluded.fuel_type,
            daily_rate = excluded.daily_rate,
            period = excluded.period,
            thumbnail_uri = excluded.thumbnail_uri,
            photos = excluded.photos,
            accessories = excluded.accessories
        "#,
    )
    .bind(&car.remote_id)
    .bind(&car.brand)
    .bind(&car.name)
    .bind(&car.about)
    .bind(&car.fuel_type)
    .bind(car.daily_rate as i64)
    .bind(&car.period)
    .bind(&car.thumbnail_uri)
    .bind(car.photos.as_ref().map(Json))
    .bind(car.accessories.as_ref().map(Json))
    .execute(conn)
    .await?;

    Ok(())
}

/// Delete a car. Deleting an unknown id is not an error.
pub async fn delete_car(conn: &mut SqliteConnection, remote_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM cars WHERE remote_id = $1"#)
        .bind(remote_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Write one pulled set of car changes: upserts first, then deletions.
pub async fn apply_car_changes(
    conn: &mut SqliteConnection,
    changes: &TableChanges<Car>,
) -> Result<(), sqlx::Error> {
    for car in changes.upserts() {
        upsert_car(&mut *conn, car).await?;
    }
    for id in &changes.deleted {
        delete_car(&mut *conn, id).await?;
    }
    Ok(())
}
