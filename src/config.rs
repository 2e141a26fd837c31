use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::infrastructure::AuthMode;

/// 默认配置文件名（位于工作目录）
pub const CONFIG_FILE_NAME: &str = "cache_warmer.toml";

/// 程序配置文件
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 建立引擎连接的超时时间（秒），0 表示不限制
    pub connect_timeout_secs: u64,
    /// 单个引擎请求的超时时间（秒），0 表示不限制
    pub request_timeout_secs: u64,
    /// 单个配置预热批次的超时时间（秒），0 表示不限制
    pub layout_timeout_secs: u64,
    /// 引擎认证方式
    pub auth: AuthMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose_logging: false,
            connect_timeout_secs: 30,
            request_timeout_secs: 300,
            layout_timeout_secs: 300,
            auth: AuthMode::Anonymous,
        }
    }
}

impl Config {
    /// 读取配置文件，文件不存在时使用默认配置
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: display.clone(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: display,
            source,
        })
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        limit(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        limit(self.request_timeout_secs)
    }

    pub fn layout_timeout(&self) -> Option<Duration> {
        limit(self.layout_timeout_secs)
    }
}

fn limit(secs: u64) -> Option<Duration> {
    match secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.layout_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn zero_disables_every_timeout() {
        let config: Config = toml::from_str(
            "connect_timeout_secs = 0\nrequest_timeout_secs = 0\nlayout_timeout_secs = 0\n",
        )
        .unwrap();

        assert_eq!(config.connect_timeout(), None);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.layout_timeout(), None);
    }

    #[test]
    fn reads_header_auth_and_timeouts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
verbose_logging = true
layout_timeout_secs = 0

[auth]
mode = "header"
name = "X-Qlik-User"
value = "UserDirectory=CORP; UserId=warmer"
"#
        )
        .unwrap();

        let config = Config::load_or_default(file.path()).unwrap();
        assert!(config.verbose_logging);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.layout_timeout(), None);
        assert_eq!(
            config.auth,
            AuthMode::Header {
                name: "X-Qlik-User".into(),
                value: "UserDirectory=CORP; UserId=warmer".into(),
            }
        );
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "layout_timeout_secs = \"soon\"").unwrap();

        let result = Config::load_or_default(file.path());
        assert!(matches!(result, Err(ConfigError::TomlParseFailed { .. })));
    }
}
