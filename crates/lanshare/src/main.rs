//! LanShare
//!
//! 局域网文件共享服务器：在浏览器中列出、下载、上传和删除当前目录的文件。
//!
//! # 日志
//!
//! 默认级别由 `--log-level` 或配置文件决定，设置 `RUST_LOG` 可覆盖：
//!
//! ```bash
//! RUST_LOG=debug,tower_http=trace lanshare --dir ~/Public
//! ```

mod banner;

use anyhow::{Context, Result};
use clap::Parser;
use lanshare_core::{FileServer, LogLevel, ServerSettings, SharedDir, local_ip, shutdown_signal};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lanshare", version, about = "局域网文件共享服务器")]
struct Cli {
    /// 监听端口 (默认: 8080)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
    /// 监听地址 (默认: 0.0.0.0)
    #[arg(short, long, env = "LANSHARE_BIND")]
    bind: Option<IpAddr>,
    /// 共享目录 (默认: 当前目录)
    #[arg(short, long, env = "LANSHARE_DIR")]
    dir: Option<PathBuf>,
    /// 上传大小上限，单位字节 (默认: 5 GiB)
    #[arg(long)]
    max_upload_size: Option<u64>,
    /// 日志级别 (error, warn, info, debug, trace)
    #[arg(short, long)]
    log_level: Option<LogLevel>,
    /// 配置文件路径 (默认: ~/.config/lanshare/settings.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// 将生效的设置写回配置文件
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// 命令行与环境变量覆盖配置文件中的值
    fn apply(&self, settings: &mut ServerSettings) {
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(bind) = self.bind {
            settings.bind = bind;
        }
        if let Some(dir) = &self.dir {
            settings.root_dir.clone_from(dir);
        }
        if let Some(size) = self.max_upload_size {
            settings.max_upload_size = size;
        }
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(ServerSettings::config_path);
    let loaded = ServerSettings::try_load_from(&config_path);
    let mut settings = match &loaded {
        Ok(Some(settings)) => settings.clone(),
        _ => ServerSettings::default(),
    };
    cli.apply(&mut settings);

    init_logging(settings.log_level);

    match loaded {
        Ok(Some(_)) => tracing::debug!("Using settings from {}", config_path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("{e}, using defaults"),
    }

    if cli.save_config {
        settings
            .save_to(&config_path)
            .with_context(|| format!("failed to save settings to {}", config_path.display()))?;
        tracing::info!("Saved settings to {}", config_path.display());
    }

    anyhow::ensure!(
        settings.root_dir.is_dir(),
        "shared directory {} does not exist",
        settings.root_dir.display()
    );

    let server = FileServer::bind(&settings)
        .await
        .with_context(|| format!("failed to listen on {}", settings.addr()))?;
    let port = server.local_addr()?.port();

    let network_ip = local_ip();
    let serving_dir = SharedDir::new(settings.root_dir.clone()).display_root();
    banner::print_started(&banner::StartupInfo {
        port,
        network_ip: &network_ip,
        serving_dir: &serving_dir,
        max_upload_size: settings.max_upload_size,
    });

    tracing::info!("Server starting on port {port}");
    server
        .run_until(async {
            shutdown_signal().await;
            banner::print_stopping();
        })
        .await
        .context("server error")?;

    banner::print_stopped();
    Ok(())
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先，否则使用配置的级别
fn init_logging(level: LogLevel) {
    // 桥接 log crate（lanshare-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    let level = level.directive();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{level},lanshare_core={level},tower_http={level}"))
        }))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::try_parse_from([
            "lanshare",
            "--port",
            "9090",
            "--dir",
            "/tmp",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let mut settings = ServerSettings {
            max_upload_size: 1024,
            ..Default::default()
        };
        cli.apply(&mut settings);

        assert_eq!(settings.port, 9090);
        assert_eq!(settings.root_dir, PathBuf::from("/tmp"));
        assert_eq!(settings.log_level, LogLevel::Debug);
        // 未指定的保持原值
        assert_eq!(settings.max_upload_size, 1024);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["lanshare", "--log-level", "loud"]).is_err());
        assert!(Cli::try_parse_from(["lanshare", "--bind", "not-an-ip"]).is_err());
    }
}
