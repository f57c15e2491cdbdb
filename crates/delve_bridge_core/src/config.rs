use std::path::PathBuf;
use std::time::Duration;

pub const ADDR_ENV: &str = "DLV_ADDR";
pub const ARTIFACT_DIR_ENV: &str = "DBG_DIR";
pub const RPC_LOG_ENV: &str = "DLV_RPC_LOG";
pub const CONNECT_TIMEOUT_ENV: &str = "DLV_CONNECT_TIMEOUT_MS";

/// Name of the hidden directory holding `addr` and `pid`.
pub const HANDLE_DIR_NAME: &str = ".dlv";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where (if anywhere) request/response pairs are logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcLogSetting {
    Disabled,
    /// `rpc.log` inside the handle directory.
    HandleDir,
    Path(PathBuf),
}

impl RpcLogSetting {
    pub fn parse(raw: Option<&str>) -> Self {
        let value = raw.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            Self::Disabled
        } else if value == "1" || value.eq_ignore_ascii_case("true") {
            Self::HandleDir
        } else {
            Self::Path(PathBuf::from(value))
        }
    }
}

#[derive(Debug, Clone)]
pub struct DelveConfig {
    pub addr_override: Option<String>,
    pub artifact_dir: Option<PathBuf>,
    pub rpc_log: RpcLogSetting,
    pub connect_timeout: Duration,
}

impl Default for DelveConfig {
    fn default() -> Self {
        Self {
            addr_override: None,
            artifact_dir: None,
            rpc_log: RpcLogSetting::Disabled,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl DelveConfig {
    pub fn from_env() -> Self {
        let addr_override = std::env::var(ADDR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().to_string());

        let artifact_dir = std::env::var(ARTIFACT_DIR_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let rpc_log = RpcLogSetting::parse(std::env::var(RPC_LOG_ENV).ok().as_deref());

        let connect_timeout = std::env::var(CONNECT_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        Self {
            addr_override,
            artifact_dir,
            rpc_log,
            connect_timeout,
        }
    }

    /// `$DBG_DIR/.dlv` when an artifact directory is set, `.dlv` otherwise.
    /// Relative paths resolve against the current directory.
    pub fn handle_dir(&self) -> PathBuf {
        match &self.artifact_dir {
            Some(dir) => dir.join(HANDLE_DIR_NAME),
            None => PathBuf::from(HANDLE_DIR_NAME),
        }
    }

    pub fn rpc_log_path(&self) -> Option<PathBuf> {
        match &self.rpc_log {
            RpcLogSetting::Disabled => None,
            RpcLogSetting::HandleDir => Some(self.handle_dir().join("rpc.log")),
            RpcLogSetting::Path(path) => Some(path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [ADDR_ENV, ARTIFACT_DIR_ENV, RPC_LOG_ENV, CONNECT_TIMEOUT_ENV] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = DelveConfig::default();
        assert!(config.addr_override.is_none());
        assert_eq!(config.handle_dir(), PathBuf::from(".dlv"));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.rpc_log_path().is_none());
    }

    #[test]
    fn test_rpc_log_setting_parse() {
        assert_eq!(RpcLogSetting::parse(None), RpcLogSetting::Disabled);
        assert_eq!(RpcLogSetting::parse(Some("  ")), RpcLogSetting::Disabled);
        assert_eq!(RpcLogSetting::parse(Some("1")), RpcLogSetting::HandleDir);
        assert_eq!(RpcLogSetting::parse(Some("TRUE")), RpcLogSetting::HandleDir);
        assert_eq!(
            RpcLogSetting::parse(Some("/tmp/x.log")),
            RpcLogSetting::Path(PathBuf::from("/tmp/x.log"))
        );
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();

        let config = DelveConfig::from_env();
        assert!(config.addr_override.is_none());
        assert!(config.artifact_dir.is_none());
        assert_eq!(config.rpc_log, RpcLogSetting::Disabled);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_from_env_custom() {
        clear_env();
        std::env::set_var(ADDR_ENV, " 127.0.0.1:4040 ");
        std::env::set_var(ARTIFACT_DIR_ENV, ".debug_2026-01-02T03-04-05");
        std::env::set_var(RPC_LOG_ENV, "1");
        std::env::set_var(CONNECT_TIMEOUT_ENV, "250");

        let config = DelveConfig::from_env();
        assert_eq!(config.addr_override.as_deref(), Some("127.0.0.1:4040"));
        assert_eq!(
            config.handle_dir(),
            PathBuf::from(".debug_2026-01-02T03-04-05/.dlv")
        );
        assert_eq!(
            config.rpc_log_path(),
            Some(PathBuf::from(".debug_2026-01-02T03-04-05/.dlv/rpc.log"))
        );
        assert_eq!(config.connect_timeout, Duration::from_millis(250));

        clear_env();
    }
}
