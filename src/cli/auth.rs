use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{config::Config, error, info, spotify, types::PkceToken};

pub async fn auth(shared_state: Arc<Mutex<Option<PkceToken>>>) {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };

    info!("Waiting for Spotify authorization on {}", config.server_addr);
    if let Err(e) = spotify::auth::auth(&config, shared_state).await {
        error!("{}", e);
    }
}
