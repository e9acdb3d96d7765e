//! Cancellable sleep shared by every suspension point of a monitor task.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::Cancelled;

/// Sleeps for `delay` unless `token` fires first.
///
/// Returns `Err(Cancelled)` immediately if the token is already cancelled.
pub(crate) async fn pause(delay: Duration, token: &CancellationToken) -> Result<(), Cancelled> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        _ = time::sleep(delay) => Ok(()),
    }
}
