//! Page tokens for plan listings
//!
//! A token is 20 raw bytes: a 4-byte big-endian magic followed by the 16 bytes
//! of the last plan id returned, encoded with the base64url alphabet (padded).
//! Tokens carry no filter state, so clients resend their filters on every page.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use tracing::debug;
use uuid::Uuid;

use crate::error::CatalogError;

/// "PLAN" in ASCII
pub const PAGE_TOKEN_MAGIC: u32 = 0x504c_414e;

/// Decoded token length: magic + uuid
pub const PAGE_TOKEN_LEN: usize = 4 + 16;

/// Encode the last-seen plan id as an opaque page token
pub fn encode_page_token(last_key: Uuid) -> String {
    let mut buf = [0u8; PAGE_TOKEN_LEN];
    buf[..4].copy_from_slice(&PAGE_TOKEN_MAGIC.to_be_bytes());
    buf[4..].copy_from_slice(last_key.as_bytes());
    URL_SAFE.encode(buf)
}

/// Decode a page token back into the last-seen plan id
pub fn decode_page_token(token: &str) -> Result<Uuid, CatalogError> {
    let buf = URL_SAFE.decode(token).map_err(|e| {
        debug!(error = %e, "Page token is not base64url");
        CatalogError::InvalidToken
    })?;

    let buf: [u8; PAGE_TOKEN_LEN] = buf.as_slice().try_into().map_err(|_| {
        debug!(len = buf.len(), "Page token has wrong length");
        CatalogError::InvalidToken
    })?;

    let magic = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if magic != PAGE_TOKEN_MAGIC {
        debug!(magic = %format!("{:#010x}", magic), "Page token has wrong magic");
        return Err(CatalogError::InvalidToken);
    }

    let mut id = [0u8; 16];
    id.copy_from_slice(&buf[4..]);
    Ok(Uuid::from_bytes(id))
}
