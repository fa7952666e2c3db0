//! Identifier generation for items, comments and attachments.
//!
//! Item ids are push-style: eight characters of millisecond time followed by
//! twelve random characters, drawn from an alphabet whose ASCII order matches
//! its digit order, so ids sort lexicographically by creation time.
//! Comment and attachment ids use a process-monotonic millisecond counter so
//! two ids minted in the same millisecond never collide.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const SUFFIX_CHARS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static LAST_ISSUED_MS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Return a millisecond stamp that is `>= now` and strictly greater than any
/// stamp previously returned in this process.
fn monotonic_millis(now: DateTime<Utc>) -> i64 {
    let wanted = now.timestamp_millis();
    let mut last = LAST_ISSUED_MS.load(Ordering::Relaxed);
    loop {
        let next = if wanted > last { wanted } else { last + 1 };
        match LAST_ISSUED_MS.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}

fn random_suffix(len: usize, alphabet: &[u8]) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}

/// Mint a time-ordered item id.
#[must_use]
pub fn push_id(now: DateTime<Utc>) -> String {
    let mut millis = u64::try_from(monotonic_millis(now)).unwrap_or(0);
    let mut time_part = [0_u8; 8];
    for slot in time_part.iter_mut().rev() {
        // Index is always < 64.
        *slot = PUSH_CHARS[usize::try_from(millis % 64).unwrap_or(0)];
        millis /= 64;
    }
    let mut id = String::from_utf8_lossy(&time_part).into_owned();
    id.push_str(&random_suffix(12, PUSH_CHARS));
    id
}

/// Mint a comment id.
#[must_use]
pub fn comment_id(now: DateTime<Utc>) -> String {
    format!("c{}-{}", monotonic_millis(now), random_suffix(4, SUFFIX_CHARS))
}

/// Mint an attachment id.
#[must_use]
pub fn attachment_id(now: DateTime<Utc>) -> String {
    format!("a{}-{}", monotonic_millis(now), random_suffix(4, SUFFIX_CHARS))
}
