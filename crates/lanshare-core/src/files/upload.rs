//! 上传写入
//!
//! 数据先写入共享目录内的隐藏临时文件，完成后重命名为目标文件名。
//! 失败或请求中断时临时文件会被删除，目标文件不会出现半截内容。

use crate::error::{Result, ShareError};
use log::{debug, warn};
use std::io;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use super::BUFFER_SIZE;

/// 进行中的上传
pub struct PendingUpload {
    name: String,
    temp_path: PathBuf,
    final_path: PathBuf,
    writer: Option<BufWriter<File>>,
    written: u64,
    finished: bool,
}

impl PendingUpload {
    pub(super) async fn create(name: String, temp_path: PathBuf, final_path: PathBuf) -> Result<Self> {
        let file = File::create(&temp_path).await.map_err(|e| {
            warn!("Error creating file {name}: {e}");
            ShareError::Save(e)
        })?;
        debug!("Receiving {name} into {temp_path:?}");

        Ok(Self {
            name,
            temp_path,
            final_path,
            writer: Some(BufWriter::with_capacity(BUFFER_SIZE, file)),
            written: 0,
            finished: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 已写入字节数
    pub fn written(&self) -> u64 {
        self.written
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(ShareError::Save(io::Error::other("upload already closed")));
        };
        writer.write_all(chunk).await.map_err(|e| {
            warn!("Error saving file {}: {e}", self.name);
            ShareError::Save(e)
        })?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// 刷新并重命名为目标文件（已存在则覆盖），返回写入的字节数
    pub async fn commit(mut self) -> Result<u64> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush().await {
                warn!("Error saving file {}: {e}", self.name);
                self.abort().await;
                return Err(ShareError::Save(e));
            }
            // 重命名前关闭句柄
            drop(writer);
        }

        if let Err(e) = tokio::fs::rename(&self.temp_path, &self.final_path).await {
            warn!("Error saving file {}: {e}", self.name);
            self.abort().await;
            return Err(ShareError::Save(e));
        }

        self.finished = true;
        Ok(self.written)
    }

    /// 放弃上传并删除临时文件
    pub async fn abort(mut self) {
        self.finished = true;
        self.writer = None;
        if let Err(e) = tokio::fs::remove_file(&self.temp_path).await {
            warn!("Failed to remove partial upload {:?}: {e}", self.temp_path);
        }
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        // 请求被取消（客户端断开）时 future 直接被丢弃
        if !self.finished {
            debug!("Upload of {} interrupted, removing {:?}", self.name, self.temp_path);
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                warn!("Failed to remove partial upload {:?}: {e}", self.temp_path);
            }
        }
    }
}
