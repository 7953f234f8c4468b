//! OneDrive sharing URL encoding
//!
//! The Graph `/shares/{id}` API does not take a raw sharing URL. It expects
//! the URL as unpadded URL-safe base64 with a `u!` prefix.

use base64::Engine;

/// Encode a sharing URL into the share id accepted by `/shares/{id}`.
///
/// Example output: `u!aHR0cHM6Ly8xZHJ2Lm1zL2YvcyFBYmM`
pub fn encode_sharing_url(url: &str) -> String {
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(url.as_bytes());
    format!("u!{}", encoded)
}
