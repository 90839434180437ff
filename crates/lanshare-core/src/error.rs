//! 错误类型
//!
//! 每个请求只执行一次文件系统调用，失败直接映射为 HTTP 状态码，
//! 不做重试。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;

/// 文件共享错误
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("Invalid file name")]
    InvalidName,

    #[error("File not found")]
    NotFound,

    /// 目标是目录，参数为被拒绝的操作 ("download" / "delete")
    #[error("Cannot {0} directory")]
    IsDirectory(&'static str),

    #[error("File too large or invalid form data")]
    InvalidForm,

    #[error("Failed to read file")]
    MissingFile,

    #[error("Failed to list files")]
    ListFailed(#[source] io::Error),

    #[error("Error accessing file")]
    Access(#[source] io::Error),

    #[error("Failed to save file")]
    Save(#[source] io::Error),

    #[error("Failed to delete file")]
    Delete(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, ShareError>;

impl ShareError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShareError::InvalidName
            | ShareError::IsDirectory(_)
            | ShareError::InvalidForm
            | ShareError::MissingFile => StatusCode::BAD_REQUEST,
            ShareError::NotFound => StatusCode::NOT_FOUND,
            ShareError::ListFailed(_)
            | ShareError::Access(_)
            | ShareError::Save(_)
            | ShareError::Delete(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ShareError::InvalidName.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ShareError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ShareError::Save(io::Error::other("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_directory_message() {
        assert_eq!(
            ShareError::IsDirectory("download").to_string(),
            "Cannot download directory"
        );
        assert_eq!(
            ShareError::IsDirectory("delete").to_string(),
            "Cannot delete directory"
        );
    }
}
