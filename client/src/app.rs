//! The facade a host application embeds.

use crate::api::{BookingRecord, RemoteClient, Rental};
use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};
use crate::session::SessionManager;
use crate::store::LocalStore;
use crate::sync::SyncEngine;
use rentx_engine::{BookingRequest, Car, RentalPeriod};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Where catalog reads come from.
///
/// Only [`CatalogMode::Mirrored`] works offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogMode {
    /// The local mirror kept up to date by sync rounds
    #[default]
    Mirrored,
    /// A direct request to the server
    Remote,
}

/// Wires the local store, remote client, session and sync engine together.
pub struct App {
    config: Config,
    store: Arc<LocalStore>,
    remote: Arc<RemoteClient>,
    session: Arc<SessionManager>,
    sync: Arc<SyncEngine>,
}

impl App {
    /// Open the local store and restore the session.
    ///
    /// The session has left `Restoring` by the time this returns.
    pub async fn open(config: Config) -> Result<Self> {
        let store = Arc::new(LocalStore::connect(&config.database_url).await?);
        let remote = Arc::new(RemoteClient::new(&config)?);
        let session = Arc::new(SessionManager::new(store.clone(), remote.clone()));
        session.restore();

        let sync = Arc::new(SyncEngine::new(
            store.clone(),
            remote.clone(),
            session.clone(),
            config.sync_min_interval,
        ));

        info!(api_url = %config.api_url, "rentx client ready");
        Ok(Self {
            config,
            store,
            remote,
            session,
            sync,
        })
    }

    pub async fn from_env() -> Result<Self> {
        Self::open(Config::from_env()?).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn remote(&self) -> &Arc<RemoteClient> {
        &self.remote
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn sync(&self) -> &Arc<SyncEngine> {
        &self.sync
    }

    /// Start the sync driver for `monitor` on the current runtime.
    pub fn spawn_sync(&self, monitor: &ConnectivityMonitor) -> JoinHandle<()> {
        tokio::spawn(self.sync.clone().run(monitor.subscribe()))
    }

    pub async fn list_cars(&self, mode: CatalogMode) -> Result<Vec<Car>> {
        match mode {
            CatalogMode::Mirrored => Ok(self.store.list_cars()),
            CatalogMode::Remote => self.remote.list_cars(self.session.token().as_ref()).await,
        }
    }

    pub async fn get_car(&self, id: &str, mode: CatalogMode) -> Result<Option<Car>> {
        match mode {
            CatalogMode::Mirrored => Ok(self.store.get_car(id)),
            CatalogMode::Remote => {
                match self.remote.get_car(self.session.token().as_ref(), id).await {
                    Ok(car) => Ok(Some(car)),
                    Err(Error::NotFound(_)) => Ok(None),
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Book `car` for the signed-in user.
    pub async fn create_booking(&self, car: &Car, period: RentalPeriod) -> Result<BookingRecord> {
        let user = self.signed_in()?;
        let request = BookingRequest::for_car(user.remote_id.clone(), car, period);
        let token = self.session.token().ok_or_else(not_signed_in)?;
        self.remote.create_booking(&token, &request).await
    }

    pub async fn list_bookings(&self) -> Result<Vec<Rental>> {
        self.signed_in()?;
        let token = self.session.token().ok_or_else(not_signed_in)?;
        self.remote.list_bookings(&token).await
    }

    fn signed_in(&self) -> Result<rentx_engine::User> {
        if self.session.view().is_restoring {
            return Err(Error::SessionRestoring);
        }
        self.session.current_user().ok_or_else(not_signed_in)
    }
}

fn not_signed_in() -> Error {
    Error::Authentication("not signed in".into())
}
