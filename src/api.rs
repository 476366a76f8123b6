//! The three server operations used by the bridge, built on [`Client::call`].

use serde_json::Value;
use tracing::{info, instrument};

use crate::client::Client;
use crate::configuration::Configuration;
use crate::error::{ApiError, BridgeError, ProtocolError};
use crate::response::{MoveResponse, StartResponse, Status};
use crate::transport::Transport;

/// Endpoint paths of the game server.
pub mod paths {
    pub fn start(token: &str, mode: i32, delay: i32) -> String {
        format!("/api/start/{token}/{mode}/{delay}")
    }

    pub fn play(token: &str, game_id: i64, dir0: &str, dir5: &str) -> String {
        format!("/api/move/{token}/{game_id}/{dir0}/{dir5}")
    }
}

#[derive(Debug)]
pub struct ServerApi<T: Transport> {
    client: Client<T>,
    token: String,
    game_id: Option<i64>,
    practice_mode: i32,
    practice_delay: i32,
}

impl<T: Transport> ServerApi<T> {
    pub fn new(config: &Configuration, client: Client<T>) -> Self {
        ServerApi {
            client,
            token: config.token.clone(),
            game_id: config.game_id,
            practice_mode: config.practice_mode,
            practice_delay: config.practice_delay,
        }
    }

    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    /// Ask for a new practice match. Returns the raw reply.
    pub fn start(&self, mode: i32, delay: i32) -> Result<Value, ApiError> {
        self.client.call(&paths::start(&self.token, mode, delay))
    }

    /// Submit the two directions for the current turn.
    pub fn play(&self, game_id: i64, dir0: &str, dir5: &str) -> Result<MoveResponse, BridgeError> {
        let raw = self
            .client
            .call(&paths::play(&self.token, game_id, dir0, dir5))?;
        Ok(MoveResponse::from_json(raw)?)
    }

    /// Game to play: the configured one, or a freshly started practice match.
    ///
    /// # Errors
    /// [`ApiError::StartRejected`] when the start reply is neither `ok` nor `started`.
    #[instrument(skip(self))]
    pub fn resolve_game_id(&self) -> Result<i64, BridgeError> {
        if let Some(game_id) = self.game_id {
            info!(game_id, "using configured game");
            return Ok(game_id);
        }

        let raw = self.start(self.practice_mode, self.practice_delay)?;
        let start = StartResponse::from_json(raw.clone())?;
        match start.status {
            Status::Ok | Status::Started => {
                let game_id = start
                    .game_id
                    .ok_or_else(|| ProtocolError::Decode(format!("no 'game_id' in {raw}")))?;
                info!(game_id, start = start.start, "practice match started");
                Ok(game_id)
            }
            status => Err(ApiError::StartRejected {
                status: status.to_string(),
                raw: raw.to_string(),
            }
            .into()),
        }
    }
}
