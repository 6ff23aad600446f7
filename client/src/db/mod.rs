//! SQLite persistence for the local store.

mod cars;
mod pool;
mod sync_state;
mod users;

pub use cars::*;
pub use pool::*;
pub use sync_state::*;
pub use users::*;
