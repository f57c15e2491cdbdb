//! Session commands: one connection per invocation, plain-text output.

use std::fmt::Write as _;

use anyhow::Result;
use delve_bridge_core::ops::command::{run_command, StepOutcome};
use delve_bridge_core::ops::{breakpoints, eval, stack, state};
use delve_bridge_core::types::{
    Breakpoint, CommandName, DebuggerState, EvalScope, Goroutine, Stackframe, Variable,
};
use delve_bridge_core::{DelveClient, DelveConfig, HandleStore};

use crate::cli::SessionCommand;

pub async fn dispatch(config: &DelveConfig, command: SessionCommand) -> Result<()> {
    let handle = HandleStore::from_config(config).load()?;
    let mut client = DelveClient::connect_handle(&handle, config).await?;

    let result = execute(&mut client, command).await;
    client.disconnect().await;

    print!("{}", result?);
    Ok(())
}

/// Every command starts from the current state: its selected goroutine is the
/// evaluation scope, and an already exited tracee ends the command cleanly.
async fn execute(client: &mut DelveClient, command: SessionCommand) -> Result<String> {
    let current = match state::get_state(client).await {
        Ok(current) => current,
        Err(e) if e.is_process_exited() => return Ok(format!("{e}\n")),
        Err(e) => return Err(e.into()),
    };
    let scope = EvalScope::from_state(&current);

    let output: String = match command {
        SessionCommand::State => render_state(&current),
        SessionCommand::Break { spec } => {
            let created = breakpoints::set_breakpoint(client, scope, &spec.join(" ")).await?;
            created.iter().map(render_created).collect()
        }
        SessionCommand::Breakpoints => {
            render_breakpoints(&breakpoints::list_breakpoints(client, false).await?)
        }
        SessionCommand::Clear { id } => {
            breakpoints::clear_breakpoint(client, id).await?;
            format!("cleared breakpoint {id}\n")
        }
        SessionCommand::Continue => render_outcome(run_command(client, CommandName::Continue).await?),
        SessionCommand::Next => render_outcome(run_command(client, CommandName::Next).await?),
        SessionCommand::Step => render_outcome(run_command(client, CommandName::Step).await?),
        SessionCommand::Stepout => render_outcome(run_command(client, CommandName::StepOut).await?),
        SessionCommand::Print { expr } => {
            let expr = expr.join(" ");
            let value = eval::eval(client, scope, &expr).await?;
            render_print(&expr, &value)
        }
        SessionCommand::Locals => render_variables(&eval::locals(client, scope).await?),
        SessionCommand::FunctionArgs => render_variables(&eval::args(client, scope).await?),
        SessionCommand::Stack => {
            let frames =
                stack::stacktrace(client, scope.goroutine_id, stack::DEFAULT_STACK_DEPTH).await?;
            render_stack(&frames)
        }
        SessionCommand::Goroutines => {
            let list = stack::goroutines(client, 0, stack::DEFAULT_GOROUTINE_COUNT).await?;
            render_goroutines(&list)
        }
    };
    Ok(output)
}

pub fn render_state(state: &DebuggerState) -> String {
    if state.exited {
        return format!("Process exited with status {}\n", state.exit_status);
    }
    if state.running {
        return "Process is running.\n".to_string();
    }

    let mut out = String::new();
    for (thread, bp) in state.breakpoint_threads() {
        let _ = writeln!(
            out,
            "  thread {} at breakpoint {}: {}:{} ({})",
            thread.id,
            bp.id,
            thread.file,
            thread.line,
            thread.function_name()
        );
    }
    if !out.is_empty() {
        return out;
    }

    match &state.selected_goroutine {
        Some(g) => {
            let loc = g.location();
            format!(
                "goroutine {} at {}:{} ({})\n",
                g.id,
                loc.file,
                loc.line,
                loc.function_name()
            )
        }
        None => "stopped\n".to_string(),
    }
}

pub fn render_outcome(outcome: StepOutcome) -> String {
    match outcome {
        StepOutcome::Exited(message) => format!("{message}\n"),
        StepOutcome::Stopped(state) => render_state(&state),
    }
}

pub fn render_created(bp: &Breakpoint) -> String {
    let mut line = format!(
        "breakpoint {} at {}:{} (addr {:#x})",
        bp.id, bp.file, bp.line, bp.addr
    );
    if !bp.cond.is_empty() {
        let _ = write!(line, " if {}", bp.cond);
    }
    line.push('\n');
    line
}

/// Internal breakpoints (panic traps and the like) carry ids <= 0.
pub fn render_breakpoints(list: &[Breakpoint]) -> String {
    let mut out = String::new();
    for bp in list.iter().filter(|bp| bp.id > 0) {
        let _ = write!(out, "{}: {}:{}", bp.id, bp.file, bp.line);
        if bp.disabled {
            out.push_str(" (disabled)");
        }
        if !bp.cond.is_empty() {
            let _ = write!(out, " if {}", bp.cond);
        }
        out.push('\n');
    }
    out
}

pub fn render_print(expr: &str, value: &Variable) -> String {
    let name = if value.name.is_empty() {
        expr
    } else {
        value.name.as_str()
    };
    format!("{name} = {}\n", value.display_value())
}

pub fn render_variables(vars: &[Variable]) -> String {
    vars.iter()
        .map(|v| format!("{} = {}\n", v.name, v.display_value()))
        .collect()
}

pub fn render_stack(frames: &[Stackframe]) -> String {
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let loc = &frame.location;
            format!("#{i} {} {}:{}\n", loc.function_name(), loc.file, loc.line)
        })
        .collect()
}

pub fn render_goroutines(list: &[Goroutine]) -> String {
    list.iter()
        .map(|g| {
            let loc = g.location();
            format!(
                "goroutine {} [{}:{} {}]\n",
                g.id,
                loc.file,
                loc.line,
                loc.function_name()
            )
        })
        .collect()
}
