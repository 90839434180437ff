//! 服务器配置和持久化
//!
//! 默认值 ← `settings.toml` ← 环境变量 / 命令行。
//! 后两层由二进制处理，这里负责默认值和配置文件。

use crate::logging::LogLevel;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8080;

/// 默认上传上限: 5 GiB
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 5 << 30;

/// 配置文件错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// 服务器设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// 监听端口（`PORT` 环境变量可覆盖）
    pub port: u16,
    /// 监听地址
    pub bind: IpAddr,
    /// 共享目录
    pub root_dir: PathBuf,
    /// 单次上传请求体上限（字节）
    pub max_upload_size: u64,
    /// 首页 / 删除 / 静态资源请求超时（秒），0 表示不限制
    pub request_timeout_secs: u64,
    /// 收到退出信号后等待在途请求的最长时间（秒）
    pub shutdown_timeout_secs: u64,
    /// 日志级别
    pub log_level: LogLevel,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            root_dir: PathBuf::from("."),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            request_timeout_secs: 15,
            shutdown_timeout_secs: 5,
            log_level: LogLevel::Info,
        }
    }
}

impl ServerSettings {
    /// 获取默认配置文件路径
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lanshare");
        config_dir.join("settings.toml")
    }

    /// 读取配置文件，文件不存在时返回 `None`
    pub fn try_load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Read(e)),
        };
        let settings = toml::from_str(&content)?;
        debug!("Loaded settings from {path:?}");
        Ok(Some(settings))
    }

    /// 保存设置
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)?;
        debug!("Saved settings to {path:?}");
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ServerSettings::default();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.max_upload_size, 5 * 1024 * 1024 * 1024);
        assert_eq!(settings.addr().to_string(), "0.0.0.0:8080");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(settings.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_timeout_disables() {
        let settings = ServerSettings {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(settings.request_timeout(), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let settings = ServerSettings {
            port: 9000,
            root_dir: PathBuf::from("/srv/share"),
            log_level: LogLevel::Debug,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("port = 9000"), "{content}");
        assert!(content.contains("log_level = \"debug\""), "{content}");

        assert_eq!(ServerSettings::try_load_from(&path).unwrap(), Some(settings));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "port = 3000\n").unwrap();

        let settings = ServerSettings::try_load_from(&path).unwrap().unwrap();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.max_upload_size, DEFAULT_MAX_UPLOAD_SIZE);
    }

    #[test]
    fn test_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        assert!(ServerSettings::try_load_from(&path).unwrap().is_none());

        fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(matches!(
            ServerSettings::try_load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
