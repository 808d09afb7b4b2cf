//! Cursor token codec
//!
//! Owns the opaque wire format for pagination cursors: BSON bytes wrapped in
//! URL-safe base64. Pure serialization; no ordering semantics live here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bson::oid::ObjectId;
use bson::Bson;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{Result, TurnstileError};

/// Decode bound for untrusted cursor token input
const MAX_TOKEN_LEN: usize = 8 * 1024;

/// Position in an ordered-store scan.
///
/// The ordering key is always present and acts as the tiebreaker; the sort
/// field and its value at the anchor document ride along only when a
/// secondary sort is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanCursor {
    /// Ordering key of the anchor document
    pub id: ObjectId,
    /// Active sort field when the cursor was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Value of the sort field at the anchor document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Bson>,
}

/// Position in a ranked search result list, valid for one query string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCursor {
    /// Zero-based offset of the anchor hit
    pub offset: u64,
    /// Query string the cursor was issued for
    pub query: String,
}

/// Encode a cursor into an opaque URL-safe token
pub fn encode<C: Serialize>(cursor: &C) -> Result<String> {
    let bytes = bson::to_vec(cursor)
        .map_err(|err| TurnstileError::InvalidCursor(format!("encode failed: {err}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decode a token back into a cursor.
///
/// Oversized, non-base64 and non-BSON tokens are all rejected with
/// [`TurnstileError::InvalidCursor`].
pub fn decode<C: DeserializeOwned>(token: &str) -> Result<C> {
    let token = token.trim();

    if token.is_empty() {
        return Err(TurnstileError::InvalidCursor("empty token".to_string()));
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(TurnstileError::InvalidCursor(format!(
            "token exceeds {MAX_TOKEN_LEN} characters"
        )));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|err| TurnstileError::InvalidCursor(format!("bad base64: {err}")))?;

    bson::from_slice(&bytes)
        .map_err(|err| TurnstileError::InvalidCursor(format!("bad cursor payload: {err}")))
}
