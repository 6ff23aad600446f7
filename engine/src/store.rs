//! Store - the in-memory state container.
//!
//! The Store holds the session slot, the mirrored car catalog and the sync
//! cursor. Every mutating method either applies completely or returns an
//! error and leaves the state exactly as it was.

use crate::{
    error::Result, BatchSummary, Car, ChangeBatch, LocalId, NewUser, RemoteId, Revision,
    SessionSlot, SyncCursor, User,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The main store holding all local state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    session: SessionSlot,
    /// Cars keyed by remote id; BTreeMap keeps listing order deterministic
    cars: BTreeMap<RemoteId, Car>,
    cursor: SyncCursor,
}

impl Store {
    /// Create an empty store: no user, no cars, cursor at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted parts, checking their invariants.
    pub fn from_parts(
        session: SessionSlot,
        cars: impl IntoIterator<Item = Car>,
        cursor: SyncCursor,
    ) -> Result<Self> {
        if let Some(user) = session.user() {
            user.validate()?;
        }

        let mut by_id = BTreeMap::new();
        for car in cars {
            car.validate()?;
            by_id.insert(car.remote_id.clone(), car);
        }

        Ok(Self {
            session,
            cars: by_id,
            cursor,
        })
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Get the session slot.
    pub fn session(&self) -> &SessionSlot {
        &self.session
    }

    /// Replace the session slot wholesale.
    pub fn set_session(&mut self, session: SessionSlot) {
        self.session = session;
    }

    /// Create the one resident user.
    pub fn create_user(&mut self, local_id: impl Into<LocalId>, fields: NewUser) -> Result<User> {
        self.session.create(local_id, fields)
    }

    /// Get the resident user, if any.
    pub fn find_user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Mutate the resident user identified by `id`.
    pub fn update_user<F>(&mut self, id: &str, mutator: F) -> Result<User>
    where
        F: FnOnce(&mut User),
    {
        self.session.update(id, mutator)
    }

    /// Acknowledge a pushed revision of the resident user.
    pub fn mark_user_pushed(&mut self, id: &str, revision: Revision) -> Result<User> {
        self.session.mark_pushed(id, revision)
    }

    /// Remove the resident user permanently.
    pub fn delete_user(&mut self, id: &str) -> Result<User> {
        self.session.delete(id)
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// Get a car by remote id.
    pub fn get_car(&self, id: &str) -> Option<&Car> {
        self.cars.get(id)
    }

    /// All cars ordered by remote id.
    pub fn list_cars(&self) -> impl Iterator<Item = &Car> {
        self.cars.values()
    }

    /// Count of mirrored cars.
    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    /// The current sync cursor.
    pub fn cursor(&self) -> SyncCursor {
        self.cursor
    }

    /// Apply a pulled change batch and advance the cursor together.
    ///
    /// Created and updated cars are upserted, deleted ids are removed
    /// (missing ids are ignored), so applying the same batch twice yields the
    /// same catalog. The whole batch is checked first; on error nothing
    /// changes.
    pub fn apply_car_batch(&mut self, batch: &ChangeBatch) -> Result<BatchSummary> {
        batch.validate()?;
        let next_cursor = self.cursor.advanced_to(batch.latest_version)?;

        let mut summary = BatchSummary {
            from_version: self.cursor.last_pulled_version(),
            to_version: next_cursor.last_pulled_version(),
            ..BatchSummary::default()
        };

        for car in batch.cars.upserts() {
            match self.cars.insert(car.remote_id.clone(), car.clone()) {
                Some(_) => summary.updated += 1,
                None => summary.created += 1,
            }
        }

        for id in &batch.cars.deleted {
            if self.cars.remove(id).is_some() {
                summary.deleted += 1;
            }
        }

        self.cursor = next_cursor;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, TableChanges};

    fn fiat() -> Car {
        Car::new("c1", "Fiat", "Uno", 90, "Ao dia", "uno.png")
    }

    fn audi() -> Car {
        Car::new("c2", "Audi", "RS 5 Coupé", 120, "Ao dia", "rs5.png")
    }

    fn ana() -> NewUser {
        NewUser::new("u1", "a@b.com", "Ana", "DL1", "", "T1")
    }

    #[test]
    fn fresh_store_is_empty() {
        let store = Store::new();
        assert!(store.find_user().is_none());
        assert_eq!(store.list_cars().count(), 0);
        assert_eq!(store.cursor().last_pulled_version(), 0);
    }

    #[test]
    fn user_lifecycle() {
        let mut store = Store::new();
        let user = store.create_user("local-1", ana()).unwrap();
        assert_eq!(user.session_token, "T1");

        let user = store
            .update_user("local-1", |u| u.driver_license = "DL2".into())
            .unwrap();
        assert_eq!(user.driver_license, "DL2");
        assert_eq!(store.find_user().unwrap().revision, 1);

        store.delete_user("local-1").unwrap();
        assert!(store.find_user().is_none());
    }

    #[test]
    fn create_user_twice_conflicts() {
        let mut store = Store::new();
        store.create_user("local-1", ana()).unwrap();
        assert!(matches!(
            store.create_user("local-2", ana()),
            Err(Error::UserAlreadyExists(_))
        ));
    }

    #[test]
    fn apply_batch_upserts_and_advances_cursor() {
        let mut store = Store::new();
        let batch = ChangeBatch::new(TableChanges::created(vec![fiat(), audi()]), 5);

        let summary = store.apply_car_batch(&batch).unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.from_version, 0);
        assert_eq!(summary.to_version, 5);
        assert_eq!(store.get_car("c1").unwrap().brand, "Fiat");
        assert_eq!(store.cursor().last_pulled_version(), 5);
    }

    #[test]
    fn server_version_replaces_whole_record() {
        let mut store = Store::new();
        let original = fiat().with_about("Compacto");
        store
            .apply_car_batch(&ChangeBatch::new(TableChanges::created(vec![original]), 1))
            .unwrap();

        let replacement = Car::new("c1", "Fiat", "Uno Mille", 80, "Ao dia", "mille.png");
        let summary = store
            .apply_car_batch(&ChangeBatch::new(
                TableChanges::default().with_updated(vec![replacement.clone()]),
                2,
            ))
            .unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(store.get_car("c1"), Some(&replacement));
        assert!(store.get_car("c1").unwrap().about.is_none());
    }

    #[test]
    fn delete_of_unknown_car_is_ignored() {
        let mut store = Store::new();
        let batch = ChangeBatch::new(
            TableChanges::created(vec![fiat()]).with_deleted(vec!["c9".into()]),
            3,
        );
        let summary = store.apply_car_batch(&batch).unwrap();
        assert_eq!(summary.deleted, 0);
        assert_eq!(store.car_count(), 1);
    }

    #[test]
    fn applying_same_batch_twice_is_idempotent() {
        let batch = ChangeBatch::new(
            TableChanges::created(vec![fiat(), audi()]).with_deleted(vec!["c2".into()]),
            4,
        );

        let mut once = Store::new();
        once.apply_car_batch(&batch).unwrap();

        let mut twice = Store::new();
        twice.apply_car_batch(&batch).unwrap();
        twice.apply_car_batch(&batch).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn invalid_batch_changes_nothing() {
        let mut store = Store::new();
        store
            .apply_car_batch(&ChangeBatch::new(TableChanges::created(vec![fiat()]), 2))
            .unwrap();
        let before = store.clone();

        let broken = Car::new("", "Audi", "A3", 300, "Ao dia", "a3.png");
        let batch = ChangeBatch::new(
            TableChanges::created(vec![audi()]).with_updated(vec![broken]),
            3,
        );

        assert!(store.apply_car_batch(&batch).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn regressing_batch_changes_nothing() {
        let mut store = Store::new();
        store.apply_car_batch(&ChangeBatch::empty(8)).unwrap();
        let before = store.clone();

        let result = store.apply_car_batch(&ChangeBatch::new(TableChanges::created(vec![fiat()]), 3));
        assert_eq!(
            result,
            Err(Error::CursorRegression {
                current: 8,
                received: 3
            })
        );
        assert_eq!(store, before);
    }

    #[test]
    fn from_parts_rejects_invalid_car() {
        let result = Store::from_parts(
            SessionSlot::Absent,
            vec![Car::new("", "Fiat", "Uno", 90, "Ao dia", "uno.png")],
            SyncCursor::default(),
        );
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn catalog_reads_ignore_session() {
        let mut store = Store::new();
        store.create_user("local-1", ana()).unwrap();
        store
            .apply_car_batch(&ChangeBatch::new(TableChanges::created(vec![audi(), fiat()]), 1))
            .unwrap();
        store.delete_user("local-1").unwrap();

        let ids: Vec<_> = store.list_cars().map(|c| c.remote_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }
}
