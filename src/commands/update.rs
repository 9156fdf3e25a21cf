//! Implementation of the `starli update` command.

use crate::{error::Result, sync::Synchronizer};

/// Execute the update command.
pub async fn run(sync: &Synchronizer) -> Result<()> {
    sync.refresh(true).await
}
