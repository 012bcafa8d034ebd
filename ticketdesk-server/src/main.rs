use anyhow::{Context, Result};
use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use serenity::all::{ApplicationId, Client, GatewayIntents, GuildId, Http};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ticketdesk_server::discord::DiscordPlatform;
use ticketdesk_server::handler::Handler;
use ticketdesk_server::status::{status_handler, StatusState};
use ticketdesk_server::{Config, TicketDesk};

async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "ticketdesk"
    })))
}

async fn help_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "ticketdesk",
        "version": ticketdesk_server::get_bot_version(),
        "description": "Discord bot for private support-ticket channels",
        "endpoints": [
            {
                "path": "/health",
                "method": "GET",
                "description": "Health check endpoint"
            },
            {
                "path": "/help",
                "method": "GET",
                "description": "This document"
            },
            {
                "path": "/status",
                "method": "GET",
                "description": "Indexed open tickets and pending channel deletions (requires Bearer token)"
            }
        ],
        "commands": [
            "/ticket create [kategori] [emne]",
            "/ticket close",
            "/ticket add <bruger>",
            "/ticket panel [kanal]"
        ]
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(
        "Starting ticketdesk {}",
        ticketdesk_server::get_bot_version()
    );

    let config =
        Config::from_env().context("Failed to load configuration from environment variables")?;
    info!("Loaded configuration: {:?}", config);

    let guild = GuildId::new(config.guild_id);
    let http = Arc::new(Http::new(&config.discord_token));
    http.set_application_id(ApplicationId::new(config.client_id));

    let platform = Arc::new(DiscordPlatform::new(http.clone(), guild));
    let desk = Arc::new(TicketDesk::from_config(platform, &config));

    if config.status_auth_token.is_none() {
        info!("STATUS_AUTH_TOKEN not set; /status is disabled");
    }
    let status_state = StatusState {
        desk: desk.clone(),
        auth_token: config.status_auth_token.clone(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/help", get(help_handler))
        .route("/status", get(status_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(status_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server listening on port {}", config.port);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server stopped: {}", e);
        }
    });

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS;
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(Handler::new(desk, guild, http))
        .await
        .context("Failed to create Discord client")?;

    client.start().await.context("Discord client stopped")?;

    Ok(())
}
