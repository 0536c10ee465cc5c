//! Client-server communication protocol definitions.
//!
//! A request is a bare difficulty label. Over the socket transport it travels
//! as one JSON string (`"easy"`); over HTTP it is the `difficulty` query
//! parameter. Both transports reply with the same JSON [`Response`].

use serde::{Deserialize, Serialize};

/// Two numbers drawn for one problem.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberPair {
    /// The left operand.
    pub number1: u32,
    /// The right operand.
    pub number2: u32,
}

/// Server response message.
///
/// Serialized untagged, so a success is `{"number1":3,"number2":7}` and a
/// failure is `{"error":"..."}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Response {
    /// Generated numbers.
    Numbers(NumberPair),
    /// The request was rejected.
    Err {
        /// Human readable reason.
        error: String,
    },
}
