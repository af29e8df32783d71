use clap::Parser;
use educonnect::{
    db::Db, email::ResendEmailSender, realtime::ChangeFeed, router,
    services::auth::EmailSender, AppState,
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Postgres connection string.
    #[clap(env)]
    database_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// Public URL used in confirmation links.
    #[arg(long, env, default_value = "http://127.0.0.1:1414")]
    base_url: String,

    /// Resend API key. Without it sign-ups skip email confirmation.
    #[arg(long, env)]
    resend_api_key: Option<String>,

    /// Mark cookies `Secure`. Enable behind HTTPS.
    #[arg(long, env, default_value_t = false)]
    secure_cookies: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,educonnect=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(&args.database_url, ChangeFeed::new()).await?;
    let email = ResendEmailSender::new(args.resend_api_key);
    if !email.is_enabled() {
        tracing::warn!("RESEND_API_KEY not set, sign-ups are confirmed immediately");
    }

    let state = AppState::new(db, email, args.base_url, args.secure_cookies);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
