//! # RentX Client
//!
//! The async, local-first runtime around [`rentx_engine`].
//!
//! Reads go to a SQLite-backed [`LocalStore`] and never wait on the network.
//! A [`SyncEngine`] keeps the car catalog mirrored with a pull-then-push
//! round on every offline-to-online edge reported by the
//! [`ConnectivityMonitor`], and the [`SessionManager`] owns sign-in,
//! sign-out, restore and the bearer token.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rentx_client::{App, CatalogMode, Config, ConnectivityMonitor};
//!
//! # async fn demo() -> rentx_client::Result<()> {
//! rentx_client::telemetry::init_tracing();
//!
//! let app = App::open(Config::new("https://api.rentx.test", "sqlite://rentx.db")).await?;
//! let monitor = ConnectivityMonitor::new(true);
//! app.spawn_sync(&monitor);
//!
//! if app.session().view().user.is_none() {
//!     app.session().sign_in("a@b.com", "secret").await?;
//! }
//! let cars = app.list_cars(CatalogMode::Mirrored).await?;
//! # let _ = cars;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod session;
pub mod store;
pub mod sync;
pub mod telemetry;

pub use api::{BearerToken, RemoteClient};
pub use app::{App, CatalogMode};
pub use config::{Config, ConfigError};
pub use connectivity::{ConnectivityMonitor, ConnectivityStatus};
pub use error::{Error, Result, SyncPhase};
pub use session::{SessionManager, SessionState, SessionView};
pub use store::LocalStore;
pub use sync::{PushOutcome, RoundOutcome, SkipReason, SyncEngine, SyncReport};
