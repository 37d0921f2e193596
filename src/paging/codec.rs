//! Opaque wire form for resumable page tokens.
//!
//! `offset` and `lastKey` tokens round-trip through a URL-safe string so a
//! caller can hand them to a client and get them back on the next request.
//! Cursor tokens wrap a live cursor and have no wire form.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::storage::StoreCursor;
use crate::types::{Result, StoreError};

use super::token::PageToken;

/// Longest encoded token accepted by [`decode_token`].
pub const MAX_TOKEN_LEN: usize = 8 * 1024;

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireToken<K> {
    Offset {
        offset: usize,
    },
    LastKey {
        last_key: K,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_primary_key: Option<K>,
    },
}

/// Encodes a resumable token; cursor tokens are rejected.
pub fn encode_token<C>(token: &PageToken<C>) -> Result<String>
where
    C: StoreCursor,
    C::Key: Serialize,
{
    let wire = match token {
        PageToken::Cursor(_) => {
            return Err(StoreError::Invalid("live cursor tokens cannot be serialized"))
        }
        PageToken::Offset(offset) => WireToken::Offset { offset: *offset },
        PageToken::LastKey {
            last_key,
            last_primary_key,
        } => WireToken::LastKey {
            last_key,
            last_primary_key: last_primary_key.as_ref(),
        },
    };
    let body = serde_json::to_vec(&wire)?;
    Ok(URL_SAFE_NO_PAD.encode(body))
}

/// Decodes a token produced by [`encode_token`].
pub fn decode_token<C>(encoded: &str) -> Result<PageToken<C>>
where
    C: StoreCursor,
    C::Key: DeserializeOwned,
{
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(StoreError::Serialization("page token is empty".into()));
    }
    if encoded.len() > MAX_TOKEN_LEN {
        return Err(StoreError::Serialization(format!(
            "page token exceeds {MAX_TOKEN_LEN} bytes (got {})",
            encoded.len()
        )));
    }
    let body = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|err| StoreError::Serialization(format!("page token is not base64: {err}")))?;
    let wire: WireToken<C::Key> = serde_json::from_slice(&body)?;
    Ok(match wire {
        WireToken::Offset { offset } => PageToken::Offset(offset),
        WireToken::LastKey {
            last_key,
            last_primary_key,
        } => PageToken::LastKey {
            last_key,
            last_primary_key,
        },
    })
}
