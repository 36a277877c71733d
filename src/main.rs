use cinebrowse::{app, AppState};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cinebrowse=debug,axum=info,tower_http=info".into());
    let json_logs = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    let output = if json_logs {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer().boxed()
    };

    tracing_subscriber::registry().with(filter).with(output).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    let bind_address = state.config.bind_address.clone();
    app::serve(app::build_app(state), &bind_address).await
}
