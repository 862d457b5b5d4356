mod api_error;
mod chat_relay;
mod config;
mod routes;
mod state;

use std::process;

use clap::Parser;
use tokio::net::TcpListener;

use emosense_core::pipeline::predictor_factory::create_predictor;

use crate::chat_relay::ChatRelay;
use crate::config::Config;
use crate::state::AppState;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // Models load before the runtime starts; nothing is reloaded per request.
    let predictor = create_predictor(&config.predictor_settings()?, None)?;
    let chat = ChatRelay::new(
        config.chat_api_url.clone(),
        config.chat_model.clone(),
        config.openrouter_api_key.clone(),
    );
    let state = AppState::new(predictor, chat);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(serve(&config, state.clone()));

    // The analyzer's blocking HTTP client must be dropped outside the runtime.
    drop(runtime);
    drop(state);
    served
}

async fn serve(config: &Config, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let app = routes::router(state, config.max_body_bytes);
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
