//! The Local Store: durable SQLite tables fronted by an in-memory cache.
//!
//! Reads never touch the database or the network; they copy out of the
//! cache, which always equals the last committed database state. Writes are
//! serialized, run inside one SQLite transaction, and only replace the cache
//! after the commit succeeded.

use crate::db::{self, Pool, StoredCar};
use crate::error::{Error, Result};
use rentx_engine::{
    BatchSummary, Car, ChangeBatch, NewUser, Revision, SessionSlot, Store, SyncCursor, User,
    SCHEMA_VERSION,
};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Transactional store of the session user, the car mirror and the cursor.
pub struct LocalStore {
    pool: Pool,
    cache: RwLock<Store>,
    /// Held for the whole of every write transaction
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Create the pool, run migrations and load the store.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = db::create_pool(database_url).await?;
        db::run_migrations(&pool).await?;
        Self::open(pool).await
    }

    /// Load the committed state from an already migrated database.
    ///
    /// A user row that fails validation is treated as no session at all and
    /// removed, so restore fails closed.
    pub async fn open(pool: Pool) -> Result<Self> {
        let sync_state = db::ensure_sync_state(&pool, SCHEMA_VERSION).await?;
        let schema_version = u32::try_from(sync_state.schema_version).map_err(|_| {
            Error::InvalidData(format!(
                "stored schema version {} is out of range",
                sync_state.schema_version
            ))
        })?;
        if schema_version != SCHEMA_VERSION {
            return Err(rentx_engine::Error::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                actual: schema_version,
            }
            .into());
        }
        let last_pulled_version = u64::try_from(sync_state.last_pulled_version).map_err(|_| {
            Error::InvalidData(format!(
                "stored pull version {} is negative",
                sync_state.last_pulled_version
            ))
        })?;

        let session = match db::find_user(&pool).await? {
            Some(row) => {
                let user = row.to_user();
                match user.validate() {
                    Ok(()) => SessionSlot::Present(user),
                    Err(e) => {
                        warn!(local_id = %user.local_id, "discarding unusable session: {e}");
                        let mut conn = pool.acquire().await?;
                        db::delete_user(&mut conn, &user.local_id).await?;
                        SessionSlot::Absent
                    }
                }
            }
            None => SessionSlot::Absent,
        };

        let cars = db::list_cars(&pool)
            .await?
            .into_iter()
            .map(StoredCar::into_car)
            .collect::<Vec<_>>();

        let cursor = SyncCursor::new(last_pulled_version);
        let store = Store::from_parts(session, cars, cursor)?;

        info!(
            has_user = store.find_user().is_some(),
            cars = store.car_count(),
            last_pulled_version = cursor.last_pulled_version(),
            "local store opened"
        );

        Ok(Self {
            pool,
            cache: RwLock::new(store),
            write_lock: Mutex::new(()),
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// A copy of the whole committed state.
    pub fn snapshot(&self) -> Store {
        self.read().clone()
    }

    /// The resident user, if any.
    pub fn find_user(&self) -> Option<User> {
        self.read().find_user().cloned()
    }

    /// All mirrored cars, ordered by remote id.
    pub fn list_cars(&self) -> Vec<Car> {
        self.read().list_cars().cloned().collect()
    }

    pub fn get_car(&self, id: &str) -> Option<Car> {
        self.read().get_car(id).cloned()
    }

    pub fn cursor(&self) -> SyncCursor {
        self.read().cursor()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Create the resident user with a fresh local id.
    ///
    /// Fails with [`Error::Conflict`] if a user already exists.
    pub async fn create_user(&self, fields: NewUser) -> Result<User> {
        let _guard = self.write_lock.lock().await;

        let mut session = self.read().session().clone();
        let user = session.create(Uuid::new_v4().to_string(), fields)?;

        let mut tx = self.pool.begin().await?;
        db::insert_user(&mut tx, &user).await?;
        tx.commit().await?;

        self.write().set_session(session);
        debug!(local_id = %user.local_id, "user created");
        Ok(user)
    }

    /// Mutate the resident user identified by `id`.
    pub async fn update_user<F>(&self, id: &str, mutator: F) -> Result<User>
    where
        F: FnOnce(&mut User),
    {
        let _guard = self.write_lock.lock().await;

        let mut session = self.read().session().clone();
        let user = session.update(id, mutator)?;
        self.persist_user(&user).await?;

        self.write().set_session(session);
        debug!(local_id = %user.local_id, revision = user.revision, "user updated");
        Ok(user)
    }

    /// Record that `revision` of the user reached the server.
    pub async fn mark_user_pushed(&self, id: &str, revision: Revision) -> Result<User> {
        let _guard = self.write_lock.lock().await;

        let mut session = self.read().session().clone();
        let user = session.mark_pushed(id, revision)?;
        self.persist_user(&user).await?;

        self.write().set_session(session);
        Ok(user)
    }

    /// Remove the resident user permanently.
    pub async fn delete_user(&self, id: &str) -> Result<User> {
        let _guard = self.write_lock.lock().await;

        let mut session = self.read().session().clone();
        let user = session.delete(id)?;

        let mut tx = self.pool.begin().await?;
        db::delete_user(&mut tx, id).await?;
        tx.commit().await?;

        self.write().set_session(session);
        debug!(local_id = %id, "user deleted");
        Ok(user)
    }

    /// Apply a pulled batch and its watermark in one transaction.
    ///
    /// Either every car change and the new cursor are committed, or nothing
    /// is: readers never observe a partially applied batch.
    pub async fn apply_car_batch(&self, batch: &ChangeBatch) -> Result<BatchSummary> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.snapshot();
        let summary = next.apply_car_batch(batch)?;

        let mut tx = self.pool.begin().await?;
        db::apply_car_changes(&mut tx, &batch.cars).await?;
        db::set_last_pulled_version(&mut tx, batch.latest_version).await?;
        tx.commit().await?;

        *self.write() = next;
        debug!(
            from = summary.from_version,
            to = summary.to_version,
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            "car batch applied"
        );
        Ok(summary)
    }

    async fn persist_user(&self, user: &User) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let changed = db::update_user(&mut tx, user).await?;
        if changed == 0 {
            return Err(Error::NotFound(format!("user row {}", user.local_id)));
        }
        tx.commit().await?;
        Ok(())
    }
}
