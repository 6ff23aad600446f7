//! Pull phase: download catalog changes and commit them with the cursor.

use crate::api::{BearerToken, RemoteClient};
use crate::error::Result;
use crate::store::LocalStore;
use rentx_engine::BatchSummary;
use tracing::debug;

/// Fetch everything after the committed cursor and apply it atomically.
///
/// Any failure leaves the store exactly as it was.
pub(crate) async fn pull_phase(
    store: &LocalStore,
    remote: &RemoteClient,
    token: Option<&BearerToken>,
) -> Result<BatchSummary> {
    let since = store.cursor().last_pulled_version();
    let response = remote.pull_changes(token, since).await?;

    let ignored = response.changes.users.len();
    if ignored > 0 {
        debug!(ignored, "skipping user changes in pull response");
    }

    let batch = response.into_batch()?;
    store.apply_car_batch(&batch).await
}
