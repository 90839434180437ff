//! 共享目录
//!
//! 每个操作都是对共享目录的一次直接文件系统调用，目录本身是唯一的数据源。
//!
//! 包含:
//! - 文件列表与大小格式化
//! - 文件名校验（防止目录穿越）
//! - 下载打开、删除、上传写入

pub mod names;
pub mod upload;

pub use names::{sanitize_upload_name, validate_file_name};
pub use upload::PendingUpload;

use crate::error::{Result, ShareError};
use log::{error, warn};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// 文件读写缓冲区大小
pub const BUFFER_SIZE: usize = 32 * 1024;

/// 共享目录中的一个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

impl FileInfo {
    pub fn display_size(&self) -> String {
        format_size(self.size)
    }
}

/// 将字节数转换为可读格式 (B, KB, MB, GB ...)
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.2} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}

/// 被共享的目录
#[derive(Debug, Clone)]
pub struct SharedDir {
    root: PathBuf,
}

impl SharedDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 用于展示的绝对路径，无法解析时返回 `.`
    pub fn display_root(&self) -> String {
        std::fs::canonicalize(&self.root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| ".".to_string())
    }

    /// 列出目录中的普通文件（按名称排序）
    ///
    /// 跳过子目录和进行中的上传临时文件。
    pub async fn list(&self) -> Result<Vec<FileInfo>> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            error!("Error listing files in {:?}: {e}", self.root);
            ShareError::ListFailed(e)
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            error!("Error listing files in {:?}: {e}", self.root);
            ShareError::ListFailed(e)
        })? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!("Skipping non UTF-8 file name {raw:?}");
                    continue;
                }
            };
            if names::is_reserved(&name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Failed to get info for {name}: {e}");
                    continue;
                }
            };
            if metadata.is_dir() {
                continue;
            }

            files.push(FileInfo {
                name,
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// 校验文件名并确认是普通文件，返回路径和大小
    ///
    /// `op` 用于目录错误信息 ("download" / "delete")。
    pub async fn stat_file(&self, name: &str, op: &'static str) -> Result<(PathBuf, u64)> {
        let name = validate_file_name(name)?;
        let path = self.root.join(name);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ShareError::NotFound),
            Err(e) => {
                error!("Error stating file {name}: {e}");
                return Err(ShareError::Access(e));
            }
        };
        if metadata.is_dir() {
            return Err(ShareError::IsDirectory(op));
        }

        Ok((path, metadata.len()))
    }

    /// 打开文件用于下载
    pub async fn open_file(&self, name: &str) -> Result<(File, u64)> {
        let (path, size) = self.stat_file(name, "download").await?;
        let file = File::open(&path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                return ShareError::NotFound;
            }
            error!("Error opening file {name}: {e}");
            ShareError::Access(e)
        })?;
        Ok((file, size))
    }

    pub async fn remove_file(&self, name: &str) -> Result<()> {
        let (path, _) = self.stat_file(name, "delete").await?;
        tokio::fs::remove_file(&path).await.map_err(|e| {
            error!("Error deleting file {name}: {e}");
            ShareError::Delete(e)
        })
    }

    /// 为 `name` 开始一次上传，`name` 须已经过 [`sanitize_upload_name`]
    pub async fn begin_upload(&self, name: &str) -> Result<PendingUpload> {
        let temp_name = format!("{}{}.part", names::UPLOAD_TEMP_PREFIX, uuid::Uuid::new_v4());
        PendingUpload::create(
            name.to_string(),
            self.root.join(temp_name),
            self.root.join(name),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(5 << 30), "5.00 GB");
        assert_eq!(format_size(u64::MAX), "16.00 EB");
    }

    #[tokio::test]
    async fn test_list_skips_directories_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("a.bin"), vec![0u8; 2048]).unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        std::fs::write(dir.path().join(".lanshare-upload-x.part"), b"partial").unwrap();

        let shared = SharedDir::new(dir.path());
        let files = shared.list().await.unwrap();

        assert_eq!(
            files,
            vec![
                FileInfo { name: "a.bin".into(), size: 2048 },
                FileInfo { name: "b.txt".into(), size: 5 },
            ]
        );
        assert_eq!(files[0].display_size(), "2.00 KB");
    }

    #[tokio::test]
    async fn test_list_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let shared = SharedDir::new(dir.path().join("gone"));
        assert!(matches!(shared.list().await, Err(ShareError::ListFailed(_))));
    }

    #[tokio::test]
    async fn test_stat_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        let shared = SharedDir::new(dir.path());

        assert!(matches!(
            shared.stat_file("missing.txt", "download").await,
            Err(ShareError::NotFound)
        ));
        assert!(matches!(
            shared.stat_file("subdir", "download").await,
            Err(ShareError::IsDirectory("download"))
        ));
        assert!(matches!(
            shared.stat_file("../secret", "download").await,
            Err(ShareError::InvalidName)
        ));
    }

    #[tokio::test]
    async fn test_remove_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.log"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("keep")).unwrap();
        let shared = SharedDir::new(dir.path());

        shared.remove_file("old.log").await.unwrap();
        assert!(!dir.path().join("old.log").exists());

        assert!(matches!(
            shared.remove_file("keep").await,
            Err(ShareError::IsDirectory("delete"))
        ));
        assert!(dir.path().join("keep").is_dir());
    }

    #[tokio::test]
    async fn test_upload_commit_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), b"old contents").unwrap();
        let shared = SharedDir::new(dir.path());

        let mut upload = shared.begin_upload("data.csv").await.unwrap();
        upload.write_chunk(b"a,b\n").await.unwrap();
        upload.write_chunk(b"1,2\n").await.unwrap();
        assert_eq!(upload.written(), 8);

        // 完成前目标文件保持旧内容
        assert_eq!(std::fs::read(dir.path().join("data.csv")).unwrap(), b"old contents");

        assert_eq!(upload.commit().await.unwrap(), 8);
        assert_eq!(std::fs::read(dir.path().join("data.csv")).unwrap(), b"a,b\n1,2\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_upload_abort_and_drop_leave_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let shared = SharedDir::new(dir.path());

        let mut upload = shared.begin_upload("a.txt").await.unwrap();
        upload.write_chunk(b"partial").await.unwrap();
        upload.abort().await;

        let mut upload = shared.begin_upload("b.txt").await.unwrap();
        upload.write_chunk(b"partial").await.unwrap();
        drop(upload);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
