// handlers/public/assets.rs - /styles/* and /scripts/* file services
//
// The content type is forced by mount point, never guessed from the file
// extension. Missing files fall through to ServeDir's own 404.

use axum::http::{header::CONTENT_TYPE, HeaderValue};
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::{SetResponseHeader, SetResponseHeaderLayer};

pub const STYLES_CONTENT_TYPE: &str = "text/css";
pub const SCRIPTS_CONTENT_TYPE: &str = "application/javascript";

pub type AssetService = SetResponseHeader<ServeDir, HeaderValue>;

fn typed_dir(dir: impl AsRef<Path>, content_type: &'static str) -> AssetService {
    ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            CONTENT_TYPE,
            HeaderValue::from_static(content_type),
        ))
        .service(ServeDir::new(dir))
}

pub fn styles(public_dir: &Path) -> AssetService {
    typed_dir(public_dir.join("styles"), STYLES_CONTENT_TYPE)
}

pub fn scripts(public_dir: &Path) -> AssetService {
    typed_dir(public_dir.join("scripts"), SCRIPTS_CONTENT_TYPE)
}
