//! Line protocol between the bridge and the agent.
//!
//! * Agent -> Bridge: one line per decision, `"<dir0> <dir5>\n"`
//! * Bridge -> Agent: one block per turn, see [`encode_turn`]

use std::fmt::Write as _;
use std::io::{BufRead, Write};

use tracing::{debug, instrument, trace};

use crate::error::{BridgeError, ProtocolError};
use crate::response::{MoveResponse, Turn};

/// Directions chosen by the agent for its two entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub dir0: String,
    pub dir5: String,
}

impl std::str::FromStr for Decision {
    type Err = ProtocolError;

    /// Trailing `\r`/`\n` are ignored; the rest must be exactly two non-empty tokens
    /// separated by a single space.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let malformed = || ProtocolError::MalformedDecision(trimmed.to_string());

        let mut tokens = trimmed.split(' ');
        let (Some(dir0), Some(dir5), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(malformed());
        };
        if dir0.is_empty() || dir5.is_empty() {
            return Err(malformed());
        }
        Ok(Decision {
            dir0: dir0.to_string(),
            dir5: dir5.to_string(),
        })
    }
}

/// Exclusive owner of the agent's two streams.
#[derive(Debug)]
pub struct AgentChannel<W: Write, R: BufRead> {
    input: W,
    output: R,
}

impl<W: Write, R: BufRead> AgentChannel<W, R> {
    /// `input` is what the agent reads, `output` is what the agent writes.
    pub fn new(input: W, output: R) -> Self {
        AgentChannel { input, output }
    }

    /// Read the agent's next decision.
    ///
    /// Returns `Ok(None)` once the agent closed its output.
    pub fn read_decision(&mut self) -> Result<Option<Decision>, BridgeError> {
        let mut line = String::new();
        let n = self.output.read_line(&mut line)?;
        if n == 0 {
            debug!("agent output closed");
            return Ok(None);
        }
        trace!(line = line.trim_end());
        Ok(Some(line.parse()?))
    }

    /// Frame a full turn to the agent and flush it.
    ///
    /// Nothing is written if `response` violates a fixed length.
    #[instrument(skip_all, fields(turn = response.turn))]
    pub fn write_turn(&mut self, response: &MoveResponse) -> Result<(), BridgeError> {
        let turn = response.to_turn()?;
        let block = encode_turn(&turn);
        self.input.write_all(block.as_bytes())?;
        self.input.flush()?;
        Ok(())
    }

    /// Give back both streams.
    pub fn into_inner(self) -> (W, R) {
        (self.input, self.output)
    }
}

/// Text block sent to the agent for one turn.
///
/// Lines, in order:
/// 1. `now turn`
/// 2. the 6 last moves
/// 3. the 3 scores
/// 4. 150 lines, one per cell (face, then row, then column), each `owner value`
/// 5. 6 lines, one per agent, each with its 4 values
/// 6. the 6 remaining special counts
pub fn encode_turn(turn: &Turn) -> String {
    fn join(values: &[i64]) -> String {
        values
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    let mut out = String::new();
    // writing to a String cannot fail
    let _ = writeln!(out, "{} {}", turn.now, turn.turn);
    let _ = writeln!(out, "{}", join(&turn.moves));
    let _ = writeln!(out, "{}", join(&turn.score));
    for face in &turn.field {
        for row in face {
            for cell in row {
                let _ = writeln!(out, "{}", join(cell));
            }
        }
    }
    for agent in &turn.agent {
        let _ = writeln!(out, "{}", join(agent));
    }
    let _ = writeln!(out, "{}", join(&turn.special));
    out
}

#[cfg(test)]
mod channel_tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;
    use crate::response::fixtures::ok_move_json;

    fn channel(agent_output: &str) -> AgentChannel<Vec<u8>, Cursor<Vec<u8>>> {
        AgentChannel::new(Vec::new(), Cursor::new(agent_output.as_bytes().to_vec()))
    }

    #[test]
    fn decisions_are_read_line_by_line() {
        let mut channel = channel("0 3\r\n2s 1-2-3\n1 1");
        assert_eq!(
            channel.read_decision().unwrap(),
            Some(Decision {
                dir0: "0".into(),
                dir5: "3".into()
            })
        );
        assert_eq!(
            channel.read_decision().unwrap(),
            Some(Decision {
                dir0: "2s".into(),
                dir5: "1-2-3".into()
            })
        );
        assert_eq!(
            channel.read_decision().unwrap(),
            Some(Decision {
                dir0: "1".into(),
                dir5: "1".into()
            })
        );
        assert_eq!(channel.read_decision().unwrap(), None);
    }

    #[test]
    fn end_of_stream_is_not_an_error() {
        assert_eq!(channel("").read_decision().unwrap(), None);
    }

    #[test]
    fn malformed_decisions_are_rejected() {
        for line in ["0\n", "0 1 2\n", "0  1\n", " 1\n", "\n", "0\t1\n"] {
            let err = channel(line).read_decision().unwrap_err();
            assert!(
                matches!(err, BridgeError::Protocol(ProtocolError::MalformedDecision(_))),
                "{line:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn turn_block_layout() {
        let response = MoveResponse::from_json(ok_move_json()).unwrap();
        let mut channel = channel("");
        channel.write_turn(&response).unwrap();
        let (written, _) = channel.into_inner();
        let text = String::from_utf8(written).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3 + 150 + 6 + 1);
        assert!(text.ends_with('\n'));
        assert_eq!(lines[0], "1700000000123 7");
        assert_eq!(lines[1], "0 -1 -1 -1 -1 3");
        assert_eq!(lines[2], "10 20 30");
        // face 0, row 0, cell 0 then face 0, row 0, cell 1
        assert_eq!(lines[3], "-1 0");
        assert_eq!(lines[4], "-1 1");
        // last cell of face 5
        assert_eq!(lines[152], "4 0");
        assert_eq!(lines[153], "0 0 0 0");
        assert_eq!(lines[158], "5 4 4 1");
        assert_eq!(lines[159], "2 2 2 2 2 1");
    }

    #[test]
    fn invalid_turn_writes_nothing() {
        let mut value = ok_move_json();
        value["special"] = json!([1, 1, 1, 1, 1, 1, 1]);
        let response = MoveResponse::from_json(value).unwrap();

        let mut channel = channel("");
        let err = channel.write_turn(&response).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Protocol(ProtocolError::FieldLength { expected: 6, actual: 7, .. })
        ));
        let (written, _) = channel.into_inner();
        assert!(written.is_empty());
    }

    #[test]
    fn short_move_writes_nothing() {
        let mut value = ok_move_json();
        value["move"] = json!([0, 0, 0]);
        let response = MoveResponse::from_json(value).unwrap();

        let mut channel = channel("");
        assert!(channel.write_turn(&response).is_err());
        assert!(channel.into_inner().0.is_empty());
    }
}
