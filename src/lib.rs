//! # Agent Bridge
//!
//! Relays a turn-based HTTP game to a local agent process.
//!
//! The bridge polls the game server, turns each JSON board state into a fixed line-based text
//! block written to the agent's stdin, reads the agent's next move from its stdout and submits
//! it back to the server, until the game ends or the agent exits.
//!
//! It provides:
//! - A retrying HTTP client ([`client::Client`]) driven by a pure [`retry::RetryPolicy`]
//! - The server operations (`start`, `move`, game id resolution) in [`api::ServerApi`]
//! - Validated decoding of server replies ([`response`])
//! - The agent line protocol ([`channel::AgentChannel`])
//! - The control loop ([`bridge::Bridge`])
//!
//! Everything is single-threaded and blocking: the bridge waits for the agent, then for the
//! server, then for the agent again.
//!
//! # Usage Example
//!
//! ```no_run
//! use agent_bridge::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::from_env()?;
//!
//!     let mut agent = AgentProcess::launch("./my_agent", &[])?;
//!     let channel = agent.channel()?;
//!
//!     let client = Client::from_config(&config)?;
//!     let mut bridge = Bridge::new(ServerApi::new(&config, client), channel);
//!     let summary = bridge.run()?;
//!     println!("{summary:?}");
//!
//!     drop(bridge);
//!     agent.wait()?;
//!     Ok(())
//! }
//! ```
//!
//! # Agent Protocol
//!
//! - Bridge -> Agent, once per `ok` turn (see [`channel::encode_turn`]):
//!   * `now turn`
//!   * 6 last moves
//!   * 3 scores
//!   * 150 lines `owner value`, one per cell, face by face, row by row
//!   * 6 lines of 4 values, one per agent
//!   * 6 special counts
//! - Agent -> Bridge: `dir0 dir5` on one line
//!
//! The agent speaks first. Closing its stdout ends the session cleanly.

pub mod agent;
pub mod api;
pub mod bridge;
pub mod channel;
pub mod client;
pub mod configuration;
pub mod error;
pub mod logger;
pub mod response;
pub mod retry;
pub mod transport;

/// Commonly used types for quick access.
///
/// ```rust
/// use agent_bridge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::AgentProcess;
    pub use crate::api::ServerApi;
    pub use crate::bridge::{Bridge, BridgeSummary, Termination};
    pub use crate::channel::{AgentChannel, Decision};
    pub use crate::client::Client;
    pub use crate::configuration::Configuration;
    pub use crate::error::{ApiError, BridgeError, ProtocolError};
    pub use crate::response::{MoveResponse, Status};
    pub use crate::retry::RetryPolicy;
    pub use crate::transport::{HttpReply, HttpTransport, Transport, TransportFailure};
}
