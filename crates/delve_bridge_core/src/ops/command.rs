use crate::types::{CommandName, CommandOut, DebuggerCommand, DebuggerState};
use crate::{DelveClient, Result};

/// Result of an execution command. Tracee exit is an outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Stopped(DebuggerState),
    Exited(String),
}

/// Runs `continue`, `next`, `step` or `stepOut` and waits for the engine to
/// report the next stop. `continue` may block indefinitely; there is no
/// client-side cancellation.
pub async fn run_command(client: &mut DelveClient, name: CommandName) -> Result<StepOutcome> {
    let cmd = DebuggerCommand {
        name,
        return_info_load_config: None,
    };
    match client.call::<_, CommandOut>("Command", &cmd).await {
        Ok(out) => Ok(classify_state(out.state)),
        Err(e) if e.is_process_exited() => Ok(StepOutcome::Exited(e.to_string())),
        Err(e) => Err(e),
    }
}

fn classify_state(state: DebuggerState) -> StepOutcome {
    if state.exited {
        return StepOutcome::Exited(format!(
            "Process {} has exited with status {}",
            state.pid, state.exit_status
        ));
    }
    StepOutcome::Stopped(state)
}
