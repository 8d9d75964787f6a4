// SPDX-License-Identifier: MIT

//! Volume identity: 128-bit volume ids and fixed-width labels.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::core::utils::time_utils;
use crate::fs::constant::CELLFS_LABEL_LEN;

static COUNTER: AtomicU32 = AtomicU32::new(0);

#[inline]
fn xorshift32(mut x: u32) -> u32 {
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    x
}

/// Generates a 16-byte volume identifier shaped like a v4 UUID.
///
/// Seeded from the clock and a process-wide counter, so two calls in the
/// same nanosecond still differ. Not cryptographically random.
pub fn generate_volume_id_128() -> [u8; 16] {
    let now = time_utils::now_utc();
    let secs = now.unix_timestamp() as u32;
    let nanos = now.nanosecond();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut x = secs ^ nanos.rotate_left(16) ^ counter.wrapping_mul(0x9E37_79B9);
    if x == 0 {
        x = 0xA5A5_5A5A;
    }

    let mut out = [0u8; 16];
    for chunk in out.chunks_exact_mut(4) {
        x = xorshift32(x);
        chunk.copy_from_slice(&x.to_le_bytes());
    }
    out[6] = (out[6] & 0x0F) | 0x40;
    out[8] = (out[8] & 0x3F) | 0x80;
    out
}

/// Canonical `8-4-4-4-12` hex rendering.
pub fn format_volume_id(id: &[u8; 16]) -> String {
    let hex: String = id.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// NUL-padded label; longer input is cut at the last char boundary that fits.
pub fn encode_label(label: &str) -> [u8; CELLFS_LABEL_LEN] {
    let mut end = label.len().min(CELLFS_LABEL_LEN);
    while !label.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = [0u8; CELLFS_LABEL_LEN];
    out[..end].copy_from_slice(&label.as_bytes()[..end]);
    out
}

pub fn decode_label(raw: &[u8; CELLFS_LABEL_LEN]) -> String {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..len]).into_owned()
}
