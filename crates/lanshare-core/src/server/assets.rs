//! 内嵌静态资源 (`/static/*`)

use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

pub async fn serve_static(Path(path): Path<String>) -> Response {
    let Some(asset) = StaticAssets::get(&path) else {
        return (StatusCode::NOT_FOUND, "404 page not found").into_response();
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.essence_str()),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        asset.data,
    )
        .into_response()
}
