//! Expiring one-time token store
//!
//! Holds transient handshake state (an OAuth `state` value and the PKCE
//! verifier that goes with it, for example) between the redirect out and the
//! callback in. Tokens are single use: [`HandshakeStore::take`] removes the
//! entry whether or not it has expired.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Random bytes per token, before encoding
const TOKEN_BYTES: usize = 32;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct HandshakeStore<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V> HandshakeStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` and return the token that retrieves it
    pub fn issue(&self, value: V) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.lock().insert(token.clone(), entry);
        token
    }

    /// Remove and return the value for `token` if it has not expired
    pub fn take(&self, token: &str) -> Option<V> {
        let entry = self.lock().remove(token)?;
        if entry.expires_at <= Instant::now() {
            tracing::debug!("handshake token expired");
            return None;
        }
        Some(entry.value)
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
