//! 路由处理器
//!
//! 每个处理器只做一次文件系统操作，错误通过 [`ShareError`] 映射为状态码。

use super::AppState;
use super::page;
use crate::error::{Result, ShareError};
use crate::files::{BUFFER_SIZE, format_size, sanitize_upload_name};
use axum::{
    Form,
    body::Body,
    extract::{FromRequest, Multipart, Path, Query, Request, State, multipart::MultipartRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

#[derive(Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub filename: String,
}

/// `GET /` 文件列表
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let files = state.dir.list().await?;
    Ok(Html(page::render_index(&files, state.max_upload_size)))
}

/// 未匹配的路径
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

/// `GET /download/` 缺少文件名
pub async fn download_without_name() -> ShareError {
    ShareError::InvalidName
}

/// `GET /download/*name` 流式下载
pub async fn download(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response> {
    let (file, size) = state.dir.open_file(&name).await?;
    info!("Downloading file: {name} ({})", format_size(size));

    let mime = mime_guess::from_path(&name).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.essence_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_LENGTH, HeaderValue::from(size)),
        (header::CONTENT_DISPOSITION, content_disposition(&name)),
    ];
    let stream = ReaderStream::with_capacity(file, BUFFER_SIZE);
    Ok((headers, Body::from_stream(stream)).into_response())
}

/// `attachment; filename="..."`，名称中的引号和反斜杠被转义
fn content_disposition(name: &str) -> HeaderValue {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    // from_bytes 接受 UTF-8 字节 (obs-text)，控制字符已在文件名校验时拒绝
    HeaderValue::from_bytes(format!("attachment; filename=\"{escaped}\"").as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// `POST /upload` 接收 multipart 表单中的 `file` 字段
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Redirect> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Error parsing multipart form: {e}");
        ShareError::InvalidForm
    })?;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            warn!("Error parsing multipart form: {e}");
            ShareError::InvalidForm
        })?;
        let Some(mut field) = field else {
            warn!("Error reading file: no 'file' field in upload form");
            return Err(ShareError::MissingFile);
        };
        if field.name() != Some("file") {
            continue;
        }

        let Some(raw_name) = field.file_name() else {
            warn!("Error reading file: 'file' field has no file name");
            return Err(ShareError::MissingFile);
        };
        let name = sanitize_upload_name(raw_name)?;
        let mut pending = state.dir.begin_upload(&name).await?;

        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = pending.write_chunk(&chunk).await {
                        pending.abort().await;
                        return Err(e);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Error receiving file {name}: {e}");
                    pending.abort().await;
                    return Err(ShareError::InvalidForm);
                }
            }
        }

        let written = pending.commit().await?;
        info!("File uploaded: {name} ({})", format_size(written));
        return Ok(Redirect::to("/"));
    }
}

/// `POST /delete` 删除表单字段 `filename` 指定的文件
///
/// 接受 urlencoded 或 multipart 请求体，请求体中没有该字段时读取查询参数。
pub async fn delete(State(state): State<Arc<AppState>>, request: Request) -> Result<Redirect> {
    let name = delete_target(request).await.unwrap_or_default();

    state.dir.remove_file(&name).await?;
    info!("File deleted: {name}");
    Ok(Redirect::to("/"))
}

async fn delete_target(request: Request) -> Option<String> {
    let query = Query::<DeleteForm>::try_from_uri(request.uri())
        .ok()
        .map(|Query(form)| form.filename)
        .filter(|name| !name.is_empty());

    let body = if is_multipart(request.headers()) {
        multipart_filename(request).await
    } else {
        match Form::<DeleteForm>::from_request(request, &()).await {
            Ok(Form(form)) => Some(form.filename),
            Err(e) => {
                warn!("Error parsing delete form: {e}");
                None
            }
        }
    };

    body.filter(|name| !name.is_empty()).or(query)
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

async fn multipart_filename(request: Request) -> Option<String> {
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(e) => {
            warn!("Error parsing delete form: {e}");
            return None;
        }
    };

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("filename") => {
                return field
                    .text()
                    .await
                    .map_err(|e| warn!("Error parsing delete form: {e}"))
                    .ok();
            }
            Ok(Some(_)) => {}
            Ok(None) => return None,
            Err(e) => {
                warn!("Error parsing delete form: {e}");
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_escapes() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename=\"say \\\"hi\\\".txt\""
        );
        assert_eq!(
            content_disposition("照片.jpg").as_bytes(),
            "attachment; filename=\"照片.jpg\"".as_bytes()
        );
    }
}
