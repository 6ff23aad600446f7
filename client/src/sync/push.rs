//! Push phase: upload the signed-in user's pending profile edits.

use super::PushOutcome;
use crate::api::{BearerToken, RemoteClient, UserPayload};
use crate::error::Result;
use crate::session::SessionManager;
use rentx_engine::TableChanges;
use tracing::debug;

/// Send the current profile if it has unpushed revisions.
///
/// A user who signs out while the request is in flight turns the phase into
/// [`PushOutcome::Abandoned`] whatever the server answered.
pub(crate) async fn push_phase(
    session: &SessionManager,
    remote: &RemoteClient,
) -> Result<PushOutcome> {
    let Some(user) = session.current_user() else {
        return Ok(PushOutcome::NothingToPush);
    };
    if !user.has_pending_changes() {
        return Ok(PushOutcome::NothingToPush);
    }

    let revision = user.revision;
    let token = BearerToken::new(user.session_token.clone());
    let changes = TableChanges::default().with_updated(vec![UserPayload::from(&user)]);

    match remote.push_user_changes(&token, &changes).await {
        Ok(()) => match session.acknowledge_push(&user.local_id, revision).await? {
            Some(_) => Ok(PushOutcome::Pushed { revision }),
            None => {
                debug!(local_id = %user.local_id, "user left during push");
                Ok(PushOutcome::Abandoned)
            }
        },
        Err(e) if !session.holds(&user.local_id) => {
            debug!(local_id = %user.local_id, error = %e, "user left during push");
            Ok(PushOutcome::Abandoned)
        }
        Err(e) => Err(e),
    }
}
