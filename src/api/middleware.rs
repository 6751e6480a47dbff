//! Outer layers wrapped around every game-finder route.
//!
//! Access log lines go through the `actix_web::middleware::Logger` target so the
//! api_server filter (`info,sqlx=warn` unless `RUST_LOG` says otherwise) picks them up.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{Compress, Logger};

/// Access logging (peer, request line, status, bytes, latency) and response compression.
pub fn setup_middleware() -> (Logger, Compress) {
    let logger = Logger::new("%a \"%r\" %s %b %Dms");
    let compress = Compress::default();
    (logger, compress)
}

/// CORS for the browser client. `allowed_origins` is the comma-separated
/// `ALLOWED_ORIGINS` value; blank entries are skipped.
pub fn setup_cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .max_age(3600);

    for origin in allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
    {
        cors = cors.allowed_origin(origin);
    }

    cors
}
