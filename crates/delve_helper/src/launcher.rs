//! Engine lifecycle: spawn a detached headless `dlv`, wait for its listen
//! address, record the session handle; and the matching `stop`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use delve_bridge_core::{DelveConfig, DelveError, HandleStore};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::time::sleep;

use crate::cli::StartArgs;

pub const LISTEN_PREFIX: &str = "API server listening at: ";
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(15);
pub const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(50);

const HEADLESS_FLAGS: [&str; 3] = ["--headless", "--accept-multiclient", "--api-version=2"];
const INSTALL_HINT: &str = "run 'go install github.com/go-delve/delve/cmd/dlv@latest'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    Debug,
    Test,
    Exec,
}

impl LaunchMode {
    pub fn from_flags(test: bool, exec: bool) -> Result<Self> {
        match (test, exec) {
            (true, true) => Err(anyhow!("cannot use --test and --exec together")),
            (true, false) => Ok(Self::Test),
            (false, true) => Ok(Self::Exec),
            (false, false) => Ok(Self::Debug),
        }
    }
}

/// `dlv` on `PATH`, else `$(go env GOPATH)/bin/dlv`.
pub fn find_dlv() -> Result<PathBuf, DelveError> {
    if let Ok(path) = which::which("dlv") {
        return Ok(path);
    }

    let output = std::process::Command::new("go")
        .args(["env", "GOPATH"])
        .output()
        .map_err(|e| {
            DelveError::EngineNotFound(format!("dlv not in PATH and go env GOPATH failed: {e}"))
        })?;
    let gopath = String::from_utf8_lossy(&output.stdout);
    let first = gopath.trim().split([':', ';']).next().unwrap_or_default();
    if first.is_empty() {
        return Err(DelveError::EngineNotFound(format!(
            "dlv not in PATH and GOPATH is empty: {INSTALL_HINT}"
        )));
    }

    let candidate = Path::new(first).join("bin").join("dlv");
    if candidate.is_file() {
        return Ok(candidate);
    }
    Err(DelveError::EngineNotFound(format!(
        "dlv not in PATH and not found at {}: {INSTALL_HINT}",
        candidate.display()
    )))
}

/// Where `dlv debug`/`dlv test` put the compiled binary.
pub fn debug_binary_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("dlv-{nanos}"))
}

pub fn build_engine_args(
    mode: LaunchMode,
    target: &str,
    extra: &[String],
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = HEADLESS_FLAGS.iter().map(|s| s.to_string()).collect();
    match mode {
        LaunchMode::Debug | LaunchMode::Test => {
            let verb = if mode == LaunchMode::Test { "test" } else { "debug" };
            args.extend([
                verb.to_string(),
                "--output".to_string(),
                output.display().to_string(),
                target.to_string(),
            ]);
            args.extend(extra.iter().cloned());
        }
        LaunchMode::Exec => {
            args.extend(["exec".to_string(), target.to_string()]);
            if !extra.is_empty() {
                args.push("--".to_string());
                args.extend(extra.iter().cloned());
            }
        }
    }
    args
}

/// Spawns `program` in its own session so it outlives this process and never
/// receives the terminal's signals. stdout goes to `stdout` (a file, never a
/// pipe, since nobody will drain it once we exit).
pub fn spawn_detached(program: &Path, args: &[String], stdout: std::fs::File) -> Result<Child> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::inherit());
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid()?;
            Ok(())
        });
    }
    cmd.spawn()
        .with_context(|| format!("spawn {}", program.display()))
}

fn first_line(content: &str) -> Option<&str> {
    content
        .split_once('\n')
        .map(|(line, _)| line.trim_end_matches('\r'))
}

/// Polls `stdout_path` until the engine announces its address. Only complete
/// lines are judged; a first line that is not the announcement is a startup
/// failure, as is the engine exiting before it announces anything.
pub async fn wait_for_listen_address(
    child: &mut Child,
    stdout_path: &Path,
    wait_timeout: Duration,
    poll_interval: Duration,
) -> Result<String, DelveError> {
    let started_at = Instant::now();
    loop {
        let content = tokio::fs::read_to_string(stdout_path).await?;
        if let Some(line) = first_line(&content) {
            if let Some(addr) = line.strip_prefix(LISTEN_PREFIX) {
                return Ok(addr.trim().to_string());
            }
            if !line.trim().is_empty() {
                return Err(DelveError::Startup(line.to_string()));
            }
        }

        if let Some(status) = child.try_wait()? {
            let content = tokio::fs::read_to_string(stdout_path).await?;
            let output = content.trim();
            return Err(DelveError::Startup(if output.is_empty() {
                format!("dlv exited with {status} before listening")
            } else {
                output.to_string()
            }));
        }

        if started_at.elapsed() >= wait_timeout {
            return Err(DelveError::StartupTimeout);
        }

        sleep(poll_interval).await;
    }
}

/// Handle stores to write for a launch. `primary` is already absolute; when
/// the launcher moved into a module directory the handle is mirrored there so
/// commands run from either place find the session.
pub fn handle_targets(primary: HandleStore, module_dir: Option<&Path>) -> Vec<HandleStore> {
    let mut targets = vec![primary];
    if let Some(module_dir) = module_dir {
        let relative = targets[0]
            .dir()
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        let mirror = targets[0].relocated(module_dir.join(relative));
        if mirror.dir() != targets[0].dir() {
            targets.push(mirror);
        }
    }
    targets
}

pub async fn start(config: &DelveConfig, args: StartArgs) -> Result<()> {
    let mode = LaunchMode::from_flags(args.test, args.exec)?;
    let mut target = args.target.unwrap_or_else(|| ".".to_string());

    let orig_cwd = std::env::current_dir().context("resolve current directory")?;
    let store = HandleStore::from_config(config);
    let primary = store.relocated(orig_cwd.join(store.dir()));

    let mut module_dir = None;
    if mode != LaunchMode::Exec && target != "." && Path::new(&target).join("go.mod").is_file() {
        std::env::set_current_dir(&target).with_context(|| format!("chdir {target}"))?;
        module_dir = Some(std::env::current_dir().context("resolve module directory")?);
        tracing::debug!("building from module root {target}");
        target = ".".to_string();
    }
    // An explicit artifact dir is the one place every command looks.
    let mirror_dir = module_dir.filter(|_| config.artifact_dir.is_none());

    let dlv = find_dlv()?;
    let engine_args = build_engine_args(mode, &target, &args.extra, &debug_binary_path());
    tracing::info!("launching {} {}", dlv.display(), engine_args.join(" "));

    let stdout_file = tempfile::Builder::new()
        .prefix("dlv-stdout-")
        .tempfile()
        .context("create dlv stdout file")?;
    let mut child = spawn_detached(&dlv, &engine_args, stdout_file.as_file().try_clone()?)?;
    let pid = child
        .id()
        .ok_or_else(|| anyhow!("dlv exited before reporting a pid"))?;

    let addr = wait_for_listen_address(
        &mut child,
        stdout_file.path(),
        STARTUP_TIMEOUT,
        STARTUP_POLL_INTERVAL,
    )
    .await?;
    drop(stdout_file);

    let targets = handle_targets(primary, mirror_dir.as_deref());
    for store in &targets {
        store.put(&addr, pid)?;
    }

    println!(
        "headless dlv started, address written to {}",
        targets[0].addr_path().display()
    );
    println!("{addr}");
    Ok(())
}

pub fn stop(config: &DelveConfig) -> Result<()> {
    let store = HandleStore::from_config(config);
    let Some(pid) = store.pid()? else {
        println!("no active delve session (pid file not found)");
        return Ok(());
    };

    let raw = i32::try_from(pid).map_err(|_| DelveError::InvalidPid {
        path: store.pid_path(),
        value: pid.to_string(),
    })?;
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => println!("sent SIGTERM to delve (pid {pid})"),
        Err(e) => println!("signal: {e} (process may have already exited)"),
    }

    store.clear()?;
    println!("session cleaned up");
    Ok(())
}
