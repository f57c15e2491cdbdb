use crate::types::{DebuggerState, StateIn, StateOut};
use crate::{DelveClient, Result};

/// Blocking state query: what is the engine doing right now.
pub async fn get_state(client: &mut DelveClient) -> Result<DebuggerState> {
    let out: StateOut = client
        .call("State", &StateIn { non_blocking: false })
        .await?;
    Ok(out.state)
}
