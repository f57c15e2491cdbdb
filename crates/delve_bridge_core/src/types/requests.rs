use serde::Serialize;

use super::{Breakpoint, EvalScope, LoadConfig};

/// Engine API version negotiated on connect.
pub const API_VERSION: i64 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct SetApiVersionIn {
    #[serde(rename = "APIVersion")]
    pub api_version: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateIn {
    pub non_blocking: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindLocationIn {
    pub scope: EvalScope,
    pub loc: String,
    pub include_non_executable_lines: bool,
    pub substitute_path_rules: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateBreakpointIn {
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBreakpointsIn {
    pub all: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClearBreakpointIn {
    pub id: i64,
    pub name: String,
}

/// Execution commands accepted by `RPCServer.Command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandName {
    #[serde(rename = "continue")]
    Continue,
    #[serde(rename = "next")]
    Next,
    #[serde(rename = "step")]
    Step,
    #[serde(rename = "stepOut")]
    StepOut,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Next => "next",
            Self::Step => "step",
            Self::StepOut => "stepOut",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DebuggerCommand {
    pub name: CommandName,
    #[serde(rename = "ReturnInfoLoadConfig")]
    pub return_info_load_config: Option<LoadConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalIn {
    pub scope: EvalScope,
    pub expr: String,
    pub cfg: Option<LoadConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListVarsIn {
    pub scope: EvalScope,
    pub cfg: LoadConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StacktraceIn {
    pub id: i64,
    pub depth: i64,
    pub full: bool,
    pub defers: bool,
    pub opts: i64,
    pub cfg: Option<LoadConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListGoroutinesIn {
    pub start: i64,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_shape() {
        let cmd = DebuggerCommand {
            name: CommandName::StepOut,
            return_info_load_config: None,
        };
        assert_eq!(
            serde_json::to_value(cmd).unwrap(),
            json!({"name": "stepOut", "ReturnInfoLoadConfig": null})
        );
    }

    #[test]
    fn test_find_location_wire_shape() {
        let args = FindLocationIn {
            scope: EvalScope {
                goroutine_id: -1,
                frame: 0,
                deferred_call: 0,
            },
            loc: "pipeline.go:28".into(),
            include_non_executable_lines: false,
            substitute_path_rules: Vec::new(),
        };
        let value = serde_json::to_value(args).unwrap();
        assert_eq!(value["Loc"], "pipeline.go:28");
        assert_eq!(value["Scope"]["GoroutineID"], -1);
        assert_eq!(value["SubstitutePathRules"], json!([]));
    }
}
