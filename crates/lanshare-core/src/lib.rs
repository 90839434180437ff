//! LanShare Core Library
//!
//! 局域网文件共享服务器的核心实现：列出工作目录中的文件，
//! 并通过简单的 HTTP 接口提供下载、上传和删除。
//!
//! # 模块
//!
//! - **config**: 服务器设置的默认值与 TOML 持久化
//! - **files**: 共享目录操作、文件名校验、大小格式化
//! - **net**: 局域网地址探测（启动信息展示用）
//! - **server**: axum 路由、处理器与优雅退出
//!
//! # 使用示例
//!
//! ```ignore
//! use lanshare_core::{FileServer, ServerSettings, shutdown_signal};
//!
//! let settings = ServerSettings::default();
//! let server = FileServer::bind(&settings).await?;
//! server.run_until(shutdown_signal()).await?;
//! ```

pub mod config;
pub mod error;
pub mod files;
pub mod logging;
pub mod net;
pub mod server;

pub use config::{ConfigError, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_PORT, ServerSettings};
pub use error::ShareError;
pub use files::{FileInfo, SharedDir, format_size};
pub use logging::LogLevel;
pub use net::local_ip;
pub use server::{FileServer, router, shutdown_signal};
