//! Device identity derivation.
//!
//! The device id distinguishes concurrent sessions of one account: it is an
//! MD5 fingerprint of a hardware network address (or, failing that, a random
//! key) combined with the username.

use md5::{Digest, Md5};
use rand::{rngs::OsRng, Rng};
use tracing::{trace, warn};

const KEY_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";
const RANDOM_KEY_LEN: usize = 16;

/// Derive the device identity for `username` on this host.
pub fn device_identity(username: &str) -> String {
    let raw = hardware_address().unwrap_or_else(|| {
        warn!("no usable hardware address, using random device key");
        random_key(RANDOM_KEY_LEN)
    });
    let id = fingerprint(&raw, username);
    trace!("device id: {id}");
    id
}

/// 32 lowercase hex digits.
pub fn fingerprint(raw: &str, username: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(raw.as_bytes());
    hasher.update(username.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The first globally administered MAC address on this host, as 16 uppercase
/// hex digits.
pub fn hardware_address() -> Option<String> {
    match mac_address::MacAddressIterator::new() {
        Ok(addresses) => select_address(addresses.map(|mac| mac.bytes())),
        Err(e) => {
            warn!("could not list network interfaces: {e}");
            None
        }
    }
}

fn select_address<I>(addresses: I) -> Option<String>
where
    I: IntoIterator<Item = [u8; 6]>,
{
    addresses
        .into_iter()
        // locally administered bit
        .find(|bytes| bytes[0] & 0x02 == 0 && bytes.iter().any(|b| *b != 0))
        .map(|bytes| {
            let value = bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
            format!("{value:016X}")
        })
}

/// A key of `len` characters drawn from the OS random source.
pub fn random_key(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| char::from(KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())]))
        .collect()
}

/// Host display name, or the platform family when it cannot be read.
pub fn device_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| match std::env::consts::OS {
            "macos" => "mac".to_string(),
            os => os.to_string(),
        })
}
