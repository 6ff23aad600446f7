//! # RentX Engine
//!
//! The deterministic core of the RentX local-first data layer.
//!
//! This crate holds the domain records and the in-memory store state that the
//! application reads synchronously. It knows nothing about files, SQL or HTTP:
//! the `rentx-client` crate persists this state and feeds it from the network.
//!
//! ## Design Principles
//!
//! - **No IO**: every operation is a pure state transition
//! - **All-or-nothing**: a failing operation leaves the state untouched
//! - **Server-authoritative catalog**: cars are only ever replaced by pulls
//! - **Single session**: at most one user record is resident at a time
//!
//! ## Core Concepts
//!
//! ### Session slot
//!
//! The [`SessionSlot`] is a single-value store: it is either
//! [`SessionSlot::Absent`] or holds exactly one [`User`]. Creating a user while
//! one is present fails with [`Error::UserAlreadyExists`].
//!
//! ### Change batches
//!
//! A [`ChangeBatch`] is what one pull returns: created, updated and deleted
//! cars plus the server watermark. [`Store::apply_car_batch`] applies the
//! records and advances the [`SyncCursor`] together, or does nothing.
//!
//! ## Quick Start
//!
//! ```rust
//! use rentx_engine::{Car, ChangeBatch, NewUser, Store, TableChanges};
//!
//! let mut store = Store::new();
//!
//! // Sign-in persists exactly one user
//! let user = store
//!     .create_user(
//!         "local-1",
//!         NewUser::new("u1", "a@b.com", "Ana", "DL1", "", "T1"),
//!     )
//!     .unwrap();
//! assert_eq!(user.session_token, "T1");
//!
//! // A pull lands cars and the new watermark in one step
//! let batch = ChangeBatch::new(
//!     TableChanges::created(vec![Car::new("c1", "Fiat", "Uno", 90, "Ao dia", "uno.png")]),
//!     5,
//! );
//! store.apply_car_batch(&batch).unwrap();
//!
//! assert_eq!(store.get_car("c1").unwrap().brand, "Fiat");
//! assert_eq!(store.cursor().last_pulled_version(), 5);
//! ```

pub mod batch;
pub mod booking;
pub mod error;
pub mod record;
pub mod session;
pub mod store;

// Re-export main types at crate root
pub use batch::{BatchSummary, ChangeBatch, SyncCursor, TableChanges};
pub use booking::{BookingRequest, RentalPeriod};
pub use error::Error;
pub use record::{Accessory, Car, NewUser, Photo, ProfileUpdate, User};
pub use session::SessionSlot;
pub use store::Store;

/// Type aliases for clarity
pub type LocalId = String;
pub type RemoteId = String;
pub type Version = u64;
pub type Revision = u64;
pub type SchemaVersion = u32;

/// Version of the persisted record shapes.
///
/// Bump this together with a new migration whenever [`User`] or [`Car`]
/// change shape.
pub const SCHEMA_VERSION: SchemaVersion = 1;
