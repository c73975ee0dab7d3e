//! Identifier and timestamp helpers shared by the repositories

use chrono::{DateTime, SecondsFormat, Utc};
use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use rand::Rng;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const REFERENCE_SUFFIX_LEN: usize = 6;

/// Opaque identifier exposed to API clients in place of row ids.
pub fn new_public_id() -> String {
    CUID.create_id()
}

/// Current time as a fixed-width RFC 3339 string so lexical order matches time order.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Human readable order reference, e.g. `ORD-20240901-7KQ2MX`.
pub fn order_number(at: DateTime<Utc>) -> String {
    reference("ORD", at)
}

/// Human readable ticket reference, e.g. `TKT-20240901-H3ZP9A`.
pub fn ticket_number(at: DateTime<Utc>) -> String {
    reference("TKT", at)
}

fn reference(prefix: &str, at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REFERENCE_SUFFIX_LEN)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{}-{suffix}", at.format("%Y%m%d"))
}
