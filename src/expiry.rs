// src/expiry.rs
//! Expiration policy: is a certificate inside its service's risk window?

use crate::cert_reader::ReadError;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Per-certificate decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryVerdict {
    Ok,
    Expiring { days_remaining: i64 },
    Unreadable(String),
    Unparseable(String),
}

impl ExpiryVerdict {
    pub fn is_expiring(&self) -> bool {
        matches!(self, ExpiryVerdict::Expiring { .. })
    }
}

impl From<&ReadError> for ExpiryVerdict {
    fn from(err: &ReadError) -> Self {
        match err {
            ReadError::NotFound { .. } | ReadError::Open { .. } => {
                ExpiryVerdict::Unreadable(err.to_string())
            }
            ReadError::Decode { .. } | ReadError::Parse { .. } => {
                ExpiryVerdict::Unparseable(err.to_string())
            }
        }
    }
}

/// Alert when `now + min_lifetime` is strictly after `not_after`.
///
/// A window too large to represent always covers the certificate.
pub fn evaluate(now: DateTime<Utc>, not_after: DateTime<Utc>, min_lifetime: Duration) -> ExpiryVerdict {
    let window_end = chrono::Duration::from_std(min_lifetime)
        .ok()
        .and_then(|window| now.checked_add_signed(window));

    let expiring = match window_end {
        Some(end) => end > not_after,
        None => true,
    };

    if expiring {
        ExpiryVerdict::Expiring {
            days_remaining: days_remaining(now, not_after),
        }
    } else {
        ExpiryVerdict::Ok
    }
}

/// Whole days left, floored, so an expired certificate reports a negative count
pub fn days_remaining(now: DateTime<Utc>, not_after: DateTime<Utc>) -> i64 {
    let hours = (not_after - now).num_milliseconds() as f64 / 3_600_000.0;
    (hours / 24.0).floor() as i64
}
