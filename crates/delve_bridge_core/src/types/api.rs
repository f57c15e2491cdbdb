use serde::{Deserialize, Serialize};

use super::nullable;

// reflect.Kind values the engine reports in `Variable::kind`.
const KIND_ARRAY: u32 = 17;
const KIND_INTERFACE: u32 = 20;
const KIND_MAP: u32 = 21;
const KIND_PTR: u32 = 22;
const KIND_SLICE: u32 = 23;
const KIND_STRUCT: u32 = 25;

const UNKNOWN_FUNCTION: &str = "???";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Function {
    pub name: String,
    pub value: u64,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(rename = "goType")]
    pub go_type: u64,
    pub optimized: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub pc: u64,
    pub file: String,
    pub line: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<Function>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub pcs: Vec<u64>,
}

impl Location {
    pub fn function_name(&self) -> &str {
        function_name(self.function.as_ref())
    }

    /// First usable address: `pc`, else the first of `pcs`.
    pub fn address(&self) -> Option<u64> {
        if self.pc != 0 {
            return Some(self.pc);
        }
        self.pcs.first().copied().filter(|pc| *pc != 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoint {
    pub id: i64,
    pub name: String,
    pub addr: u64,
    #[serde(deserialize_with = "nullable")]
    pub addrs: Vec<u64>,
    pub file: String,
    pub line: i64,
    #[serde(rename = "functionName", skip_serializing_if = "String::is_empty")]
    pub function_name: String,
    #[serde(rename = "Cond")]
    pub cond: String,
    #[serde(rename = "HitCond", skip_serializing_if = "String::is_empty")]
    pub hit_cond: String,
    #[serde(rename = "continue")]
    pub tracepoint: bool,
    #[serde(rename = "totalHitCount")]
    pub total_hit_count: u64,
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thread {
    pub id: i64,
    pub pc: u64,
    pub file: String,
    pub line: i64,
    pub function: Option<Function>,
    #[serde(rename = "goroutineID")]
    pub goroutine_id: i64,
    #[serde(rename = "breakPoint")]
    pub breakpoint: Option<Breakpoint>,
}

impl Thread {
    pub fn function_name(&self) -> &str {
        function_name(self.function.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goroutine {
    pub id: i64,
    #[serde(rename = "currentLoc")]
    pub current_loc: Location,
    #[serde(rename = "userCurrentLoc")]
    pub user_current_loc: Location,
    #[serde(rename = "goStatementLoc")]
    pub go_statement_loc: Location,
    #[serde(rename = "startLoc")]
    pub start_loc: Location,
    #[serde(rename = "threadID")]
    pub thread_id: i64,
    #[serde(rename = "Unreadable")]
    pub unreadable: String,
}

impl Goroutine {
    /// The user-code location, falling back to the raw current location
    /// when the goroutine is parked inside the runtime.
    pub fn location(&self) -> &Location {
        if self.user_current_loc.file.is_empty() {
            &self.current_loc
        } else {
            &self.user_current_loc
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerState {
    #[serde(rename = "Pid")]
    pub pid: i64,
    #[serde(rename = "Running")]
    pub running: bool,
    #[serde(rename = "currentThread")]
    pub current_thread: Option<Thread>,
    #[serde(rename = "currentGoroutine")]
    pub selected_goroutine: Option<Goroutine>,
    #[serde(rename = "Threads", deserialize_with = "nullable")]
    pub threads: Vec<Thread>,
    #[serde(rename = "NextInProgress")]
    pub next_in_progress: bool,
    pub exited: bool,
    #[serde(rename = "exitStatus")]
    pub exit_status: i64,
}

impl DebuggerState {
    /// Threads currently parked at a user breakpoint.
    pub fn breakpoint_threads(&self) -> impl Iterator<Item = (&Thread, &Breakpoint)> {
        self.threads
            .iter()
            .filter_map(|t| t.breakpoint.as_ref().map(|bp| (t, bp)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    pub name: String,
    pub addr: u64,
    #[serde(rename = "onlyAddr")]
    pub only_addr: bool,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(rename = "realType")]
    pub real_type: String,
    pub kind: u32,
    pub value: String,
    pub len: i64,
    pub cap: i64,
    #[serde(deserialize_with = "nullable")]
    pub children: Vec<Variable>,
    pub unreadable: String,
}

impl Variable {
    /// One-line rendering. Basic types carry their value already; composite
    /// values arrive with an empty `value` and are rebuilt from children.
    pub fn display_value(&self) -> String {
        if !self.unreadable.is_empty() {
            return format!("(unreadable {})", self.unreadable);
        }
        if !self.value.is_empty() {
            return self.value.clone();
        }
        match self.kind {
            KIND_SLICE | KIND_ARRAY => {
                let mut items: Vec<String> =
                    self.children.iter().map(Variable::display_value).collect();
                let missing = self.len - self.children.len() as i64;
                if missing > 0 {
                    items.push(format!("...+{missing} more"));
                }
                format!("[{}]", items.join(", "))
            }
            KIND_STRUCT => {
                let fields: Vec<String> = self
                    .children
                    .iter()
                    .map(|c| format!("{}: {}", c.name, c.display_value()))
                    .collect();
                format!("{} {{{}}}", self.type_name, fields.join(", "))
            }
            KIND_MAP => {
                let pairs: Vec<String> = self
                    .children
                    .chunks(2)
                    .map(|pair| match pair {
                        [k, v] => format!("{}: {}", k.display_value(), v.display_value()),
                        [k] => k.display_value(),
                        _ => String::new(),
                    })
                    .collect();
                format!("[{}]", pairs.join(", "))
            }
            KIND_PTR => match self.children.first() {
                Some(target) if self.addr != 0 || !target.value.is_empty() => {
                    format!("*{}", target.display_value())
                }
                _ => "nil".to_string(),
            },
            KIND_INTERFACE => match self.children.first() {
                Some(inner) => inner.display_value(),
                None => "nil".to_string(),
            },
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stackframe {
    #[serde(flatten)]
    pub location: Location,
    #[serde(rename = "Err")]
    pub err: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalScope {
    #[serde(rename = "GoroutineID")]
    pub goroutine_id: i64,
    #[serde(rename = "Frame")]
    pub frame: i64,
    #[serde(rename = "DeferredCall")]
    pub deferred_call: i64,
}

impl EvalScope {
    /// Frame 0 of the selected goroutine, or the current thread (-1).
    pub fn from_state(state: &DebuggerState) -> Self {
        let goroutine_id = state
            .selected_goroutine
            .as_ref()
            .map(|g| g.id)
            .unwrap_or(-1);
        Self {
            goroutine_id,
            frame: 0,
            deferred_call: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadConfig {
    pub follow_pointers: bool,
    pub max_variable_recurse: i64,
    pub max_string_len: i64,
    pub max_array_values: i64,
    pub max_struct_fields: i64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            follow_pointers: true,
            max_variable_recurse: 1,
            max_string_len: 200,
            max_array_values: 64,
            max_struct_fields: -1,
        }
    }
}

fn function_name(function: Option<&Function>) -> &str {
    match function {
        Some(f) if !f.name.is_empty() => &f.name,
        _ => UNKNOWN_FUNCTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn int(name: &str, value: &str) -> Variable {
        Variable {
            name: name.into(),
            kind: 2,
            value: value.into(),
            ..Variable::default()
        }
    }

    #[test]
    fn test_state_tolerates_null_lists() {
        let state: DebuggerState = serde_json::from_value(json!({
            "Pid": 77,
            "Running": false,
            "Threads": null,
            "currentGoroutine": {
                "id": 1,
                "currentLoc": {"pc": 1, "file": "/usr/lib/go/src/runtime/proc.go", "line": 10},
                "userCurrentLoc": {"pc": 2, "file": "/src/pipeline.go", "line": 28,
                                   "function": {"name": "main.Window"}}
            },
            "exited": false,
            "exitStatus": 0
        }))
        .unwrap();

        assert!(state.threads.is_empty());
        let g = state.selected_goroutine.unwrap();
        assert_eq!(g.location().file, "/src/pipeline.go");
        assert_eq!(g.location().function_name(), "main.Window");
    }

    #[test]
    fn test_goroutine_location_falls_back_to_current() {
        let g = Goroutine {
            current_loc: Location {
                file: "runtime/proc.go".into(),
                line: 3,
                ..Location::default()
            },
            ..Goroutine::default()
        };
        assert_eq!(g.location().file, "runtime/proc.go");
        assert_eq!(g.location().function_name(), "???");
    }

    #[test]
    fn test_location_address_prefers_pc() {
        let with_pc = Location {
            pc: 0x10,
            pcs: vec![0x20],
            ..Location::default()
        };
        let only_pcs = Location {
            pcs: vec![0x20, 0x30],
            ..Location::default()
        };
        assert_eq!(with_pc.address(), Some(0x10));
        assert_eq!(only_pcs.address(), Some(0x20));
        assert_eq!(Location::default().address(), None);
    }

    #[test]
    fn test_breakpoint_wire_names() {
        let bp = Breakpoint {
            addr: 0x4a1b2c,
            file: "/src/pipeline.go".into(),
            line: 28,
            cond: "start == 12".into(),
            ..Breakpoint::default()
        };
        let value = serde_json::to_value(&bp).unwrap();
        assert_eq!(value["Cond"], "start == 12");
        assert_eq!(value["addr"], 0x4a1b2c);
        assert!(value.get("functionName").is_none());
    }

    #[test]
    fn test_scope_from_state() {
        let mut state = DebuggerState::default();
        assert_eq!(EvalScope::from_state(&state).goroutine_id, -1);

        state.selected_goroutine = Some(Goroutine {
            id: 9,
            ..Goroutine::default()
        });
        let scope = EvalScope::from_state(&state);
        assert_eq!(scope.goroutine_id, 9);
        assert_eq!(scope.frame, 0);
        assert_eq!(
            serde_json::to_value(scope).unwrap(),
            json!({"GoroutineID": 9, "Frame": 0, "DeferredCall": 0})
        );
    }

    #[test]
    fn test_display_value_slice_struct_and_pointer() {
        let slice = Variable {
            name: "w".into(),
            kind: KIND_SLICE,
            len: 5,
            children: vec![int("", "1"), int("", "2"), int("", "3")],
            ..Variable::default()
        };
        assert_eq!(slice.display_value(), "[1, 2, 3, ...+2 more]");

        let stats = Variable {
            name: "s".into(),
            type_name: "main.Stats".into(),
            kind: KIND_STRUCT,
            children: vec![int("Count", "4"), int("Sum", "10")],
            ..Variable::default()
        };
        assert_eq!(stats.display_value(), "main.Stats {Count: 4, Sum: 10}");

        let nil_ptr = Variable {
            kind: KIND_PTR,
            ..Variable::default()
        };
        assert_eq!(nil_ptr.display_value(), "nil");

        let ptr = Variable {
            kind: KIND_PTR,
            addr: 0xc000010000,
            children: vec![int("", "16")],
            ..Variable::default()
        };
        assert_eq!(ptr.display_value(), "*16");
    }

    #[test]
    fn test_display_value_map_and_unreadable() {
        let map = Variable {
            kind: KIND_MAP,
            children: vec![int("", "1"), int("", "2"), int("", "3"), int("", "4")],
            ..Variable::default()
        };
        assert_eq!(map.display_value(), "[1: 2, 3: 4]");

        let broken = Variable {
            unreadable: "could not read memory".into(),
            ..Variable::default()
        };
        assert_eq!(broken.display_value(), "(unreadable could not read memory)");
    }
}
