use std::env;

use anyhow::Context;
use serde_json::json;

use now_playing::{
    app_state::AppState, config::Config, http, logging::init_logger, player::PlayerError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = init_logger("now-playing-rs");

    let config = Config::load().context("failed to load configuration")?;

    if matches!(env::args().nth(1).as_deref(), Some("check-config")) {
        logger.info(
            "config.check_passed",
            serde_json::to_value(&config).unwrap_or_else(|_| json!({ "status": "ok" })),
        );
        return Ok(());
    }

    let state = AppState::initialize(config.clone())
        .await
        .context("failed to initialize application state")?;

    if matches!(env::args().nth(1).as_deref(), Some("probe")) {
        let station_id = env::args()
            .nth(2)
            .context("usage: now-playing-rs probe <station-id>")?;
        let track = match state.player.probe(&station_id).await {
            Ok(track) => track,
            Err(PlayerError::UnknownStation(id)) => anyhow::bail!("unknown station {id}"),
            Err(error) => return Err(error).context("metadata probe failed"),
        };
        logger.info(
            "probe.completed",
            json!({ "stationId": station_id, "track": track }),
        );
        println!("{}", serde_json::to_string_pretty(&track)?);
        return Ok(());
    }

    logger.info(
        "server.initialized",
        json!({
            "port": config.port,
            "stations": state.catalog.len(),
            "proxied": !config.metadata.proxy_base.is_empty(),
            "coverLookup": config.cover_lookup.enabled,
        }),
    );

    http::serve(state).await.context("http server failed")
}
