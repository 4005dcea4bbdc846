//! Herald daemon: serves the notification API over HTTP.

use std::sync::Arc;

use clap::Parser;
use herald_core::{NotificationHub, SessionStore};
use herald_http::SharedState;

#[derive(Parser, Debug)]
#[command(name = "herald-daemon", about = "Real-time user notification service")]
struct Args {
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Directory of static assets to serve for non-API paths
    #[arg(long)]
    static_dir: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let state = SharedState::new(NotificationHub::new(), Arc::new(SessionStore::new()));
    let app = herald_http::router(state, args.static_dir);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            log::error!("failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    log::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("shutting down");
        })
        .await
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_defaults() {
        let args = Args::parse_from(["herald-daemon"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert!(args.static_dir.is_none());
    }

    #[test]
    fn args_override() {
        let args = Args::parse_from([
            "herald-daemon",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--static-dir",
            "ui/dist",
        ]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 9000);
        assert_eq!(args.static_dir.as_deref(), Some("ui/dist"));
    }
}
