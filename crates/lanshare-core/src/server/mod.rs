//! HTTP 文件共享服务器
//!
//! # 路由
//!
//! - `GET  /`                 文件列表页面
//! - `GET  /download/{name}`  下载文件
//! - `POST /upload`           上传文件 (multipart 字段 `file`)
//! - `POST /delete`           删除文件 (表单字段 `filename`)
//! - `GET  /static/*`         内嵌静态资源
//!
//! 每个连接由 axum 在独立任务中处理，服务器本身不做额外的并发协调。

mod assets;
pub mod handlers;
pub mod page;

use crate::config::ServerSettings;
use crate::files::SharedDir;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use log::{error, info, warn};
use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// 处理器共享状态
pub struct AppState {
    pub dir: SharedDir,
    pub max_upload_size: u64,
}

/// 构建路由
pub fn router(settings: &ServerSettings) -> Router {
    let state = Arc::new(AppState {
        dir: SharedDir::new(settings.root_dir.clone()),
        max_upload_size: settings.max_upload_size,
    });
    let body_limit = usize::try_from(settings.max_upload_size).unwrap_or(usize::MAX);

    let mut pages = Router::new()
        .route("/", get(handlers::index))
        .route("/delete", post(handlers::delete))
        .route("/static/*path", get(assets::serve_static))
        .fallback(handlers::not_found);
    if let Some(timeout) = settings.request_timeout() {
        pages = pages.layer(TimeoutLayer::new(timeout));
    }

    // 上传 / 下载体积不定，不设请求超时
    let transfers = Router::new()
        .route("/download/", get(handlers::download_without_name))
        .route("/download/*name", get(handlers::download))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(body_limit)),
        );

    pages
        .merge(transfers)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 文件共享服务器
pub struct FileServer {
    listener: TcpListener,
    router: Router,
    shutdown_timeout: Duration,
}

impl FileServer {
    /// 绑定监听地址
    pub async fn bind(settings: &ServerSettings) -> io::Result<Self> {
        let listener = TcpListener::bind(settings.addr()).await?;
        info!("File server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router: router(settings),
            shutdown_timeout: settings.shutdown_timeout(),
        })
    }

    /// 实际监听地址（端口为 0 时可获取分配的端口）
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// 运行直到 `shutdown` 完成
    ///
    /// 之后停止接受新连接，并最多等待 `shutdown_timeout` 让在途请求结束。
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let stopping = CancellationToken::new();
        let trigger = stopping.clone();
        let drain_timeout = self.shutdown_timeout;

        let serve = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                trigger.cancel();
            })
            .into_future();

        let deadline = async {
            stopping.cancelled().await;
            tokio::time::sleep(drain_timeout).await;
        };

        tokio::select! {
            res = serve => res?,
            () = deadline => {
                warn!("Connections still open after {drain_timeout:?}, forcing shutdown");
            }
        }

        info!("File server stopped");
        Ok(())
    }
}

/// 等待 Ctrl+C 或 SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Received termination signal, shutting down");
}
