//! Session handle store.
//!
//! `start` writes the engine's listen address and pid as two one-line text
//! files; every later invocation reads them back to find the session. There is
//! no locking: a second `start` in the same scope simply overwrites the pair.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{DelveConfig, DelveError, Result};

const ADDR_FILE: &str = "addr";
const PID_FILE: &str = "pid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub addr: String,
    pub pid: Option<u32>,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct HandleStore {
    dir: PathBuf,
    addr_override: Option<String>,
    log_path: Option<PathBuf>,
}

impl HandleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            addr_override: None,
            log_path: None,
        }
    }

    pub fn from_config(config: &DelveConfig) -> Self {
        Self {
            dir: config.handle_dir(),
            addr_override: config.addr_override.clone(),
            log_path: config.rpc_log_path(),
        }
    }

    /// Same store rooted somewhere else, keeping override and log settings.
    pub fn relocated(&self, dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..self.clone()
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn addr_path(&self) -> PathBuf {
        self.dir.join(ADDR_FILE)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dir.join(PID_FILE)
    }

    /// Current session address; an explicit override wins over the file.
    pub fn get(&self) -> Result<String> {
        if let Some(addr) = &self.addr_override {
            return Ok(addr.clone());
        }
        let path = self.addr_path();
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let addr = raw.trim();
                if addr.is_empty() {
                    return Err(DelveError::NoSession { path });
                }
                Ok(addr.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DelveError::NoSession { path }),
            Err(e) => Err(e.into()),
        }
    }

    /// Pid of the engine, `None` when no pid file exists.
    pub fn pid(&self) -> Result<Option<u32>> {
        let path = self.pid_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = raw.trim();
        value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| DelveError::InvalidPid {
                path,
                value: value.to_string(),
            })
    }

    pub fn load(&self) -> Result<SessionHandle> {
        let addr = self.get()?;
        let pid = self.pid().unwrap_or(None);
        Ok(SessionHandle {
            addr,
            pid,
            log_path: self.log_path.clone(),
        })
    }

    pub fn put(&self, addr: &str, pid: u32) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.addr_path(), format!("{addr}\n"))?;
        std::fs::write(self.pid_path(), format!("{pid}\n"))?;
        tracing::debug!("session handle written to {}", self.dir.display());
        Ok(())
    }

    /// Removes both files. Already-absent files are not an error.
    pub fn clear(&self) -> Result<()> {
        for path in [self.addr_path(), self.pid_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_without_session_names_path() {
        let tmp = TempDir::new().unwrap();
        let store = HandleStore::new(tmp.path().join(".dlv"));

        let err = store.get().unwrap_err();
        match err {
            DelveError::NoSession { path } => assert_eq!(path, store.addr_path()),
            other => panic!("Expected NoSession, got {other:?}"),
        }
    }

    #[test]
    fn test_put_get_and_pid() {
        let tmp = TempDir::new().unwrap();
        let store = HandleStore::new(tmp.path().join("nested/.dlv"));

        store.put("127.0.0.1:38697", 4242).unwrap();

        assert_eq!(store.get().unwrap(), "127.0.0.1:38697");
        assert_eq!(store.pid().unwrap(), Some(4242));
        assert_eq!(
            std::fs::read_to_string(store.addr_path()).unwrap(),
            "127.0.0.1:38697\n"
        );
    }

    #[test]
    fn test_put_overwrites_previous_session() {
        let tmp = TempDir::new().unwrap();
        let store = HandleStore::new(tmp.path().join(".dlv"));

        store.put("127.0.0.1:1", 1).unwrap();
        store.put("127.0.0.1:2", 2).unwrap();

        assert_eq!(store.get().unwrap(), "127.0.0.1:2");
        assert_eq!(store.pid().unwrap(), Some(2));
    }

    #[test]
    fn test_override_wins_over_file() {
        let tmp = TempDir::new().unwrap();
        let config = DelveConfig {
            addr_override: Some("10.0.0.1:9000".into()),
            artifact_dir: Some(tmp.path().to_path_buf()),
            ..DelveConfig::default()
        };
        let store = HandleStore::from_config(&config);
        store.put("127.0.0.1:1", 1).unwrap();

        assert_eq!(store.get().unwrap(), "10.0.0.1:9000");
        assert_eq!(store.dir(), tmp.path().join(".dlv"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = HandleStore::new(tmp.path().join(".dlv"));
        store.put("127.0.0.1:1", 7).unwrap();

        store.clear().unwrap();
        assert!(!store.addr_path().exists());
        assert!(!store.pid_path().exists());
        assert_eq!(store.pid().unwrap(), None);

        store.clear().unwrap();
    }

    #[test]
    fn test_invalid_pid_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = HandleStore::new(tmp.path());
        std::fs::write(store.pid_path(), "not-a-pid\n").unwrap();

        assert!(matches!(
            store.pid().unwrap_err(),
            DelveError::InvalidPid { .. }
        ));
    }
}
