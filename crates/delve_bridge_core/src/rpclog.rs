//! Optional request/response log.
//!
//! One JSON object per line, appended to a session-scoped file. Payloads are
//! summarised (goroutine, file:line, counts, ids) rather than dumped, so a log
//! of a long session stays readable.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::IgnoredAny;
use serde_json::{json, Value};
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

use crate::types::*;
use crate::Result;

/// Compact view of a request or response for the log.
pub trait Summary {
    fn summary(&self) -> Value;
}

struct Sink {
    path: PathBuf,
    file: Mutex<File>,
}

#[derive(Default)]
pub struct RpcLog {
    sink: Option<Sink>,
}

impl RpcLog {
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        let log = Self {
            sink: Some(Sink {
                path: path.to_path_buf(),
                file: Mutex::new(file),
            }),
        };
        log.write("internal", "logging enabled", json!({ "path": path.display().to_string() }))
            .await;
        Ok(log)
    }

    pub async fn from_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::open(path).await,
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }

    pub async fn request(&self, method: &str, detail: Value) {
        self.write("request", method, detail).await;
    }

    pub async fn response(&self, method: &str, detail: Value) {
        self.write("response", method, detail).await;
    }

    pub async fn close(&self) {
        self.write("internal", "logging closed", Value::Null).await;
    }

    async fn write(&self, direction: &str, method: &str, detail: Value) {
        let Some(sink) = &self.sink else {
            return;
        };
        let envelope = json!({
            "ts_ms": timestamp_millis(),
            "direction": direction,
            "method": method,
            "detail": detail,
        });
        let mut line = match serde_json::to_vec(&envelope) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize rpc log line: {e}");
                return;
            }
        };
        line.push(b'\n');

        let mut file = sink.file.lock().await;
        if let Err(e) = file.write_all(&line).await {
            tracing::warn!("Failed to write rpc log {}: {e}", sink.path.display());
            return;
        }
        let _ = file.flush().await;
    }
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// `exited status=N`, `running`, `goroutine=G file:line fn` or `stopped`.
pub fn summarize_state(state: &DebuggerState) -> String {
    if state.exited {
        return format!("exited status={}", state.exit_status);
    }
    if state.running {
        return "running".to_string();
    }
    if let Some(g) = &state.selected_goroutine {
        let loc = g.location();
        return format!(
            "goroutine={} {}:{} {}",
            g.id,
            loc.file,
            loc.line,
            loc.function_name()
        );
    }
    "stopped".to_string()
}

impl Summary for IgnoredAny {
    fn summary(&self) -> Value {
        Value::Null
    }
}

impl Summary for SetApiVersionIn {
    fn summary(&self) -> Value {
        json!({ "version": self.api_version })
    }
}

impl Summary for StateIn {
    fn summary(&self) -> Value {
        json!({ "nonBlocking": self.non_blocking })
    }
}

impl Summary for StateOut {
    fn summary(&self) -> Value {
        json!({ "state": summarize_state(&self.state) })
    }
}

impl Summary for FindLocationIn {
    fn summary(&self) -> Value {
        json!({ "loc": self.loc, "goroutine": self.scope.goroutine_id })
    }
}

impl Summary for FindLocationOut {
    fn summary(&self) -> Value {
        json!({ "locs": self.locations.len() })
    }
}

impl Summary for CreateBreakpointIn {
    fn summary(&self) -> Value {
        let bp = &self.breakpoint;
        json!({ "file": bp.file, "line": bp.line, "addr": bp.addr, "cond": bp.cond })
    }
}

impl Summary for BreakpointOut {
    fn summary(&self) -> Value {
        let bp = &self.breakpoint;
        json!({ "id": bp.id, "file": bp.file, "line": bp.line, "addr": bp.addr })
    }
}

impl Summary for ListBreakpointsIn {
    fn summary(&self) -> Value {
        json!({ "all": self.all })
    }
}

impl Summary for ListBreakpointsOut {
    fn summary(&self) -> Value {
        json!({ "count": self.breakpoints.len() })
    }
}

impl Summary for ClearBreakpointIn {
    fn summary(&self) -> Value {
        json!({ "id": self.id })
    }
}

impl Summary for DebuggerCommand {
    fn summary(&self) -> Value {
        json!({ "name": self.name.as_str() })
    }
}

impl Summary for EvalIn {
    fn summary(&self) -> Value {
        json!({ "expr": self.expr })
    }
}

impl Summary for EvalOut {
    fn summary(&self) -> Value {
        match &self.variable {
            Some(v) => json!({ "name": v.name, "value": v.value }),
            None => Value::Null,
        }
    }
}

impl Summary for ListVarsIn {
    fn summary(&self) -> Value {
        json!({ "goroutine": self.scope.goroutine_id, "frame": self.scope.frame })
    }
}

impl Summary for ListLocalVarsOut {
    fn summary(&self) -> Value {
        json!({ "count": self.variables.len() })
    }
}

impl Summary for ListFunctionArgsOut {
    fn summary(&self) -> Value {
        json!({ "count": self.args.len() })
    }
}

impl Summary for StacktraceIn {
    fn summary(&self) -> Value {
        json!({ "goroutineID": self.id, "depth": self.depth })
    }
}

impl Summary for StacktraceOut {
    fn summary(&self) -> Value {
        json!({ "count": self.locations.len() })
    }
}

impl Summary for ListGoroutinesIn {
    fn summary(&self) -> Value {
        json!({ "start": self.start, "count": self.count })
    }
}

impl Summary for ListGoroutinesOut {
    fn summary(&self) -> Value {
        json!({ "count": self.goroutines.len(), "next": self.nextg })
    }
}
