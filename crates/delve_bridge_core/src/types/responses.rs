use serde::Deserialize;

use super::{nullable, Breakpoint, DebuggerState, Goroutine, Location, Stackframe, Variable};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateOut {
    #[serde(rename = "State")]
    pub state: DebuggerState,
}

/// Reply to `RPCServer.Command`; same shape as [`StateOut`].
pub type CommandOut = StateOut;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FindLocationOut {
    #[serde(rename = "Locations", deserialize_with = "nullable")]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BreakpointOut {
    #[serde(rename = "Breakpoint")]
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListBreakpointsOut {
    #[serde(rename = "Breakpoints", deserialize_with = "nullable")]
    pub breakpoints: Vec<Breakpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EvalOut {
    #[serde(rename = "Variable")]
    pub variable: Option<Variable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListLocalVarsOut {
    #[serde(rename = "Variables", deserialize_with = "nullable")]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListFunctionArgsOut {
    #[serde(rename = "Args", deserialize_with = "nullable")]
    pub args: Vec<Variable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StacktraceOut {
    #[serde(rename = "Locations", deserialize_with = "nullable")]
    pub locations: Vec<Stackframe>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListGoroutinesOut {
    #[serde(rename = "Goroutines", deserialize_with = "nullable")]
    pub goroutines: Vec<Goroutine>,
    #[serde(rename = "Nextg")]
    pub nextg: i64,
}
