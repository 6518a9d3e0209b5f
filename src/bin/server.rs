use std::{
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    AppState, LogMailer, Mailer, SmtpConfig, SmtpMailer, build_router, graceful_shutdown,
    logging_middleware,
};

/// The REST API server for Finance Tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The address to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// The secret used to sign bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// How many hours a bearer token is valid for.
    #[arg(long, env = "TOKEN_DURATION_HOURS", default_value_t = 168)]
    token_duration_hours: i64,

    /// The timezone used for users that have not set one, e.g. "Pacific/Auckland".
    #[arg(long, env = "LOCAL_TIMEZONE", default_value = "Etc/UTC")]
    local_timezone: String,

    /// The SMTP relay for outgoing email.
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    smtp_host: String,

    /// The port of the SMTP relay. The connection uses implicit TLS.
    #[arg(long, env = "SMTP_PORT", default_value_t = 465)]
    smtp_port: u16,

    /// The account emails are sent from. Emails are only logged if not set.
    #[arg(long, env = "EMAIL_USER")]
    email_user: Option<String>,

    /// The password of the email account.
    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    email_password: Option<String>,

    /// The base URL of the web client, used for links in emails.
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:5173")]
    frontend_url: String,

    /// Directory containing an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// Plain HTTP is served if not set.
    #[arg(long, env = "CERT_PATH")]
    cert_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::new(args.host, args.port);

    let mailer = build_mailer(&args).await;

    let connection = Connection::open(&args.db_path).expect("Could not open database.");
    let state = AppState::new(
        connection,
        &args.jwt_secret,
        &args.local_timezone,
        mailer,
        &args.frontend_url,
    )
    .expect("Could not initialize database.")
    .with_token_duration(Duration::hours(args.token_duration_hours));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    match args.cert_path {
        Some(cert_path) => {
            let tls_config = RustlsConfig::from_pem_file(
                cert_path.join("cert.pem"),
                cert_path.join("key.pem"),
            )
            .await
            .expect("Could not open TLS certificates.");

            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .expect("Server stopped unexpectedly.");
        }
        None => {
            tracing::info!("HTTP server listening on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .expect("Server stopped unexpectedly.");
        }
    }
}

/// Use SMTP if an email account is configured, otherwise log emails.
async fn build_mailer(args: &Args) -> Arc<dyn Mailer> {
    let (Some(username), Some(password)) = (&args.email_user, &args.email_password) else {
        tracing::warn!("EMAIL_USER or EMAIL_PASSWORD not set, emails will only be logged.");
        return Arc::new(LogMailer);
    };

    let config = SmtpConfig {
        host: args.smtp_host.clone(),
        port: args.smtp_port,
        username: username.clone(),
        password: password.clone(),
    };

    match SmtpMailer::new(config) {
        Ok(mailer) => {
            if mailer.verify().await {
                tracing::info!("Email server is ready to send messages.");
            } else {
                tracing::error!("Could not connect to the email server, sending email may fail.");
            }

            Arc::new(mailer)
        }
        Err(error) => {
            tracing::error!("Invalid email configuration: {error}, emails will only be logged.");
            Arc::new(LogMailer)
        }
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_log.with_filter(filter::LevelFilter::INFO))
        .with(debug_log.with_filter(filter::LevelFilter::DEBUG))
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but errors are
        // logged where they happen.
        .on_failure(());

    router.layer(tracing_layer)
}
