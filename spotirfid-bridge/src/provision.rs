//! Reader provisioning helpers used by the CLI subcommands

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Random bytes behind a generated reader id
const READER_ID_BYTES: usize = 32;

/// Generate a high-entropy, URL-safe reader id
pub fn generate_reader_id() -> String {
    let mut bytes = [0u8; READER_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
