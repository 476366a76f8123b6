//! Control loop relaying turns between the game server and the agent.
//!
//! ```text
//! Resolving -> AwaitingDecision -> Submitting -> AwaitingDecision | Terminated
//! ```
//!
//! - `Resolving`: get the game id ([`ServerApi::resolve_game_id`]). Failure is fatal.
//! - `AwaitingDecision`: read one line from the agent. End of stream terminates cleanly.
//! - `Submitting`: send the decision. `already_moved` goes back to waiting without writing
//!   anything, `ok` frames the turn to the agent, any other status ends the game.

use std::io::{BufRead, Write};

use tracing::{info, instrument};

use crate::api::ServerApi;
use crate::channel::{AgentChannel, Decision};
use crate::error::BridgeError;
use crate::response::Status;
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Resolving,
    AwaitingDecision { game_id: i64 },
    Submitting { game_id: i64, decision: Decision },
    Terminated { game_id: i64, reason: Termination },
}

/// Why the loop stopped. None of these is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The agent closed its output.
    AgentClosed,
    /// The server answered a move with a status other than `ok` / `already_moved`.
    GameOver(Status),
}

/// What happened during one run of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSummary {
    pub game_id: i64,
    /// Decisions sent to the server.
    pub moves_submitted: usize,
    /// Turn blocks written to the agent.
    pub turns_written: usize,
    pub reason: Termination,
}

pub struct Bridge<T: Transport, W: Write, R: BufRead> {
    api: ServerApi<T>,
    channel: AgentChannel<W, R>,
}

impl<T: Transport, W: Write, R: BufRead> Bridge<T, W, R> {
    pub fn new(api: ServerApi<T>, channel: AgentChannel<W, R>) -> Self {
        Bridge { api, channel }
    }

    /// Run until the agent closes its output or the game stops answering `ok`.
    ///
    /// # Errors
    /// Any [`BridgeError`]: unrecoverable API failure, protocol violation from either side,
    /// or broken pipe to the agent.
    #[instrument(skip_all)]
    pub fn run(&mut self) -> Result<BridgeSummary, BridgeError> {
        let mut moves_submitted = 0;
        let mut turns_written = 0;
        let mut state = State::Resolving;

        loop {
            state = match state {
                State::Resolving => State::AwaitingDecision {
                    game_id: self.api.resolve_game_id()?,
                },

                State::AwaitingDecision { game_id } => match self.channel.read_decision()? {
                    Some(decision) => State::Submitting { game_id, decision },
                    None => State::Terminated {
                        game_id,
                        reason: Termination::AgentClosed,
                    },
                },

                State::Submitting { game_id, decision } => {
                    let response = self.api.play(game_id, &decision.dir0, &decision.dir5)?;
                    moves_submitted += 1;
                    info!("status = {}", response.status);

                    match response.status {
                        Status::AlreadyMoved => State::AwaitingDecision { game_id },
                        Status::Ok => {
                            info!(turn = response.turn, score = ?response.score);
                            self.channel.write_turn(&response)?;
                            turns_written += 1;
                            State::AwaitingDecision { game_id }
                        }
                        status => State::Terminated {
                            game_id,
                            reason: Termination::GameOver(status),
                        },
                    }
                }

                State::Terminated { game_id, reason } => {
                    info!(game_id, moves_submitted, turns_written, ?reason, "bridge finished");
                    return Ok(BridgeSummary {
                        game_id,
                        moves_submitted,
                        turns_written,
                        reason,
                    });
                }
            };
        }
    }

    /// Give back the server facade and the agent channel.
    pub fn into_parts(self) -> (ServerApi<T>, AgentChannel<W, R>) {
        (self.api, self.channel)
    }
}

#[cfg(test)]
mod bridge_tests {
    use std::io::Cursor;

    use super::*;
    use crate::client::Client;
    use crate::configuration::Configuration;
    use crate::error::{ApiError, ProtocolError};
    use crate::response::fixtures::ok_move_json;
    use crate::retry::RetryPolicy;
    use crate::transport::scripted::ScriptedTransport;

    type TestBridge = Bridge<ScriptedTransport, Vec<u8>, Cursor<Vec<u8>>>;

    fn bridge(config: Configuration, transport: ScriptedTransport, agent_output: &str) -> TestBridge {
        let config = config.with_game_server("http://game.test").with_token("tok");
        let client = Client::new(&config, transport).with_policy(RetryPolicy::immediate());
        let channel = AgentChannel::new(Vec::new(), Cursor::new(agent_output.as_bytes().to_vec()));
        Bridge::new(ServerApi::new(&config, client), channel)
    }

    fn parts(bridge: TestBridge) -> (Vec<String>, String) {
        let (api, channel) = bridge.into_parts();
        let requested = api.client().transport().requested.borrow().clone();
        let written = String::from_utf8(channel.into_inner().0).unwrap();
        (requested, written)
    }

    #[test]
    fn one_turn_then_game_over() {
        let transport = ScriptedTransport::new()
            .reply(200, r#"{"status":"started","game_id":42,"start":0}"#)
            .reply(200, &ok_move_json().to_string())
            .reply(200, r#"{"status":"game_finished"}"#);
        let mut bridge = bridge(Configuration::new(), transport, "0 1\n2 3\n1 1\n");

        let summary = bridge.run().unwrap();
        assert_eq!(
            summary,
            BridgeSummary {
                game_id: 42,
                moves_submitted: 2,
                turns_written: 1,
                reason: Termination::GameOver(Status::GameFinished),
            }
        );

        let (requested, written) = parts(bridge);
        assert_eq!(
            requested,
            [
                "http://game.test/api/start/tok/0/0",
                "http://game.test/api/move/tok/42/0/1",
                "http://game.test/api/move/tok/42/2/3",
            ]
        );
        assert_eq!(written.lines().count(), 160);
    }

    #[test]
    fn agent_closing_immediately_submits_nothing() {
        let transport =
            ScriptedTransport::new().reply(200, r#"{"status":"ok","game_id":9,"start":0}"#);
        let mut bridge = bridge(Configuration::new(), transport, "");

        let summary = bridge.run().unwrap();
        assert_eq!(summary.game_id, 9);
        assert_eq!(summary.moves_submitted, 0);
        assert_eq!(summary.reason, Termination::AgentClosed);

        let (requested, written) = parts(bridge);
        assert_eq!(requested.len(), 1);
        assert!(written.is_empty());
    }

    #[test]
    fn already_moved_writes_nothing_and_waits() {
        let transport = ScriptedTransport::new()
            .reply(200, r#"{"status":"already_moved"}"#)
            .reply(200, r#"{"status":"already_moved"}"#)
            .reply(200, &ok_move_json().to_string());
        let mut bridge = bridge(
            Configuration::new().with_game_id(Some(5)),
            transport,
            "0 0\n1 1\n2 2\n",
        );

        let summary = bridge.run().unwrap();
        assert_eq!(summary.moves_submitted, 3);
        assert_eq!(summary.turns_written, 1);
        assert_eq!(summary.reason, Termination::AgentClosed);

        let (requested, written) = parts(bridge);
        assert_eq!(requested[0], "http://game.test/api/move/tok/5/0/0");
        assert_eq!(written.lines().count(), 160);
    }

    #[test]
    fn start_rejection_aborts_before_reading_the_agent() {
        let transport = ScriptedTransport::new().reply(200, r#"{"status":"error_token"}"#);
        let mut bridge = bridge(Configuration::new(), transport, "0 0\n");
        assert!(matches!(
            bridge.run(),
            Err(BridgeError::Api(ApiError::StartRejected { .. }))
        ));
    }

    #[test]
    fn malformed_decision_is_fatal() {
        let mut bridge = bridge(
            Configuration::new().with_game_id(Some(5)),
            ScriptedTransport::new(),
            "up\n",
        );
        assert!(matches!(
            bridge.run(),
            Err(BridgeError::Protocol(ProtocolError::MalformedDecision(_)))
        ));
        let (requested, _) = parts(bridge);
        assert!(requested.is_empty());
    }

    #[test]
    fn invalid_board_is_fatal_and_not_framed() {
        let mut value = ok_move_json();
        value["agent"] = serde_json::json!([[0, 0, 0, 0]]);
        let transport = ScriptedTransport::new().reply(200, &value.to_string());
        let mut bridge = bridge(Configuration::new().with_game_id(Some(5)), transport, "0 0\n");

        assert!(matches!(
            bridge.run(),
            Err(BridgeError::Protocol(ProtocolError::FieldLength { .. }))
        ));
        let (_, written) = parts(bridge);
        assert!(written.is_empty());
    }

    #[test]
    fn exhausted_move_call_is_fatal() {
        let mut transport = ScriptedTransport::new();
        for _ in 0..5 {
            transport = transport.reply(502, "");
        }
        let mut bridge = bridge(Configuration::new().with_game_id(Some(5)), transport, "0 0\n");
        assert!(matches!(
            bridge.run(),
            Err(BridgeError::Api(ApiError::RetriesExhausted { attempts: 5 }))
        ));
    }
}
