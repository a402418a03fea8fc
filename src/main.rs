//! Application entry point for the `greenheart-agronomy` backend service.
//!
//! Startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the generation client and, when configured, the detection client
//! - Mounting all API routes via the `routes` gateway
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `GOOGLE_API_KEY` (**required**) – generation service key
//! - `PORT` (optional) – listen port (default: 8000)
//! - `GREENHEART_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `GREENHEART_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See [`greenheart_agronomy::config`] for the full list.
use std::{env, io::IsTerminal, net::SocketAddr, sync::Arc};

use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use greenheart_agronomy::{config, routes, Advisor, GeminiClient, HttpDetector};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let mut advisor = Advisor::new(Arc::new(GeminiClient::new(&cfg)), cfg.default_region.clone());
    if let Some(url) = &cfg.detection_url {
        advisor = advisor.with_detector(Arc::new(HttpDetector::new(url)));
    }

    let app = routes::router(advisor, &cfg);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// - Color output follows `FORCE_COLOR` (`1|true|yes` on, `0|false|no` off),
///   otherwise TTY detection.
/// - `GREENHEART_SPAN_EVENTS`: `"full"` emits ENTER, EXIT and CLOSE events,
///   `"enter_exit"` ENTER and EXIT only, anything else CLOSE only.
/// - `RUST_LOG` wins when set; otherwise `GREENHEART_LOG_LEVEL` picks the
///   crate level and HTTP client internals stay at `info`.
///
/// Must be called once, before any tracing macro fires.
fn init_tracing() {
    // ---
    let span_events = match env::var("GREENHEART_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("GREENHEART_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
