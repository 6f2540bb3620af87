// ecochat - Carbon-aware chat front-end with a persistent response cache
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use ecochat::chat::{ChatRequest, ChatService};
use ecochat::cli::{Args, Command};
use ecochat::config::AppConfig;
use ecochat::emissions::EmissionsAnalyzer;
use ecochat::server::{create_router, AppState};
use ecochat::utils::logging;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load(args.config.as_deref())?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting ecochat v{}", env!("CARGO_PKG_VERSION"));

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Chat {
            message,
            system,
            max_tokens,
            temperature,
            top_p,
        } => {
            let mut request = ChatRequest::new(message, &config.chat);
            if let Some(system) = system {
                request.system_message = system;
            }
            request.max_tokens = max_tokens.unwrap_or(request.max_tokens);
            request.temperature = temperature.unwrap_or(request.temperature);
            request.top_p = top_p.unwrap_or(request.top_p);
            request.validate()?;

            let mut service = ChatService::from_config(&config)?;
            let reply = service.respond(&request).await?;

            println!("{}\n", reply.text);
            println!("[{}]", reply.annotation());
            Ok(())
        }
        Command::Report { json } => {
            let analyzer = EmissionsAnalyzer::new(&config.emissions.output_dir)?;
            if json {
                let report = serde_json::json!({
                    "summary": analyzer.summary(),
                    "time_series": analyzer.time_series(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", analyzer.summary().render_markdown());
            }
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    // Phase 3: Open the response cache (a corrupt cache document stops startup here)
    let service = ChatService::from_config(&config)?;
    info!(
        "Response cache ready: {} entries in {}",
        service.store().len(),
        service.store().response_path().display()
    );

    // Phase 4: Emissions log
    let analyzer = EmissionsAnalyzer::new(&config.emissions.output_dir)?;
    info!(
        "Emissions log at {}: {} records",
        analyzer.dir().display(),
        analyzer.table().len()
    );

    // Phase 5: Build and start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(AppState::new(config, service, analyzer));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
