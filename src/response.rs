//! Server responses, decoded and validated.
//!
//! A [`MoveResponse`] is decoded loosely (variable-length sequences) and only becomes a
//! [`Turn`] once every sequence has its fixed length. Only a [`Turn`] can be framed to the agent.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Number of entities on the board (two per team, three teams).
pub const AGENTS: usize = 6;
/// Values describing one agent: face, row, column, direction.
pub const AGENT_STATE: usize = 4;
/// Number of teams.
pub const TEAMS: usize = 3;
/// Faces of the cube-map board.
pub const FACES: usize = 6;
/// Rows and columns of one face.
pub const SIDE: usize = 5;
/// Values per cell: owner, paint level.
pub const CELL: usize = 2;

/// A single cell: `[owner, value]`.
pub type Cell = [i64; CELL];
/// One face of the board.
pub type Face = [[Cell; SIDE]; SIDE];

/// `status` field shared by the start and move endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Ok,
    AlreadyMoved,
    Started,
    GameFinished,
    /// Any status this bridge has no special handling for.
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Ok => "ok",
            Status::AlreadyMoved => "already_moved",
            Status::Started => "started",
            Status::GameFinished => "game_finished",
            Status::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ok" => Status::Ok,
            "already_moved" => Status::AlreadyMoved,
            "started" => Status::Started,
            "game_finished" => Status::GameFinished,
            _ => Status::Other(s),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Other(String::new())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply of `/api/start/...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub status: Status,
    #[serde(default)]
    pub game_id: Option<i64>,
    /// Server time at which the match starts.
    #[serde(default)]
    pub start: Option<i64>,
}

impl StartResponse {
    pub fn from_json(value: Value) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Reply of `/api/move/...` as sent by the server.
///
/// Only `status` is guaranteed; the board is decoded when the status is `ok`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveResponse {
    pub status: Status,
    #[serde(default)]
    pub now: i64,
    #[serde(default)]
    pub turn: i64,
    #[serde(rename = "move", default)]
    pub moves: Vec<i64>,
    #[serde(default)]
    pub score: Vec<i64>,
    #[serde(default)]
    pub field: Vec<Vec<Vec<Vec<i64>>>>,
    #[serde(default)]
    pub agent: Vec<Vec<i64>>,
    #[serde(default)]
    pub special: Vec<i64>,
}

impl MoveResponse {
    /// Decode a move reply. Non-`ok` replies keep their status only.
    pub fn from_json(value: Value) -> Result<Self, ProtocolError> {
        let status = value
            .get("status")
            .cloned()
            .ok_or_else(|| ProtocolError::Decode("missing 'status'".to_string()))?;
        let status: Status = serde_json::from_value(status)?;
        if status != Status::Ok {
            return Ok(MoveResponse {
                status,
                ..Default::default()
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Check every sequence length and build the fixed-size [`Turn`].
    pub fn to_turn(&self) -> Result<Turn, ProtocolError> {
        let mut field = [[[[0; CELL]; SIDE]; SIDE]; FACES];
        fixed_len("field", &self.field, FACES)?;
        for (i, face) in self.field.iter().enumerate() {
            fixed_len(&format!("field[{i}]"), face, SIDE)?;
            for (j, row) in face.iter().enumerate() {
                fixed_len(&format!("field[{i}][{j}]"), row, SIDE)?;
                for (k, cell) in row.iter().enumerate() {
                    field[i][j][k] = fixed(&format!("field[{i}][{j}][{k}]"), cell)?;
                }
            }
        }

        let mut agent = [[0; AGENT_STATE]; AGENTS];
        fixed_len("agent", &self.agent, AGENTS)?;
        for (i, state) in self.agent.iter().enumerate() {
            agent[i] = fixed(&format!("agent[{i}]"), state)?;
        }

        Ok(Turn {
            now: self.now,
            turn: self.turn,
            moves: fixed("move", &self.moves)?,
            score: fixed("score", &self.score)?,
            field,
            agent,
            special: fixed("special", &self.special)?,
        })
    }
}

fn fixed_len<T>(field: &str, values: &[T], expected: usize) -> Result<(), ProtocolError> {
    if values.len() != expected {
        return Err(ProtocolError::FieldLength {
            field: field.to_string(),
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

fn fixed<const N: usize>(field: &str, values: &[i64]) -> Result<[i64; N], ProtocolError> {
    <[i64; N]>::try_from(values).map_err(|_| ProtocolError::FieldLength {
        field: field.to_string(),
        expected: N,
        actual: values.len(),
    })
}

/// One validated turn, ready to be framed for the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub now: i64,
    pub turn: i64,
    pub moves: [i64; AGENTS],
    pub score: [i64; TEAMS],
    pub field: [Face; FACES],
    pub agent: [[i64; AGENT_STATE]; AGENTS],
    pub special: [i64; AGENTS],
}
