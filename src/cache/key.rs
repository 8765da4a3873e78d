//! The Key Builder (`spec.md` §4.3).
//!
//! Produces a raw, human-readable key for logging, and a fixed-width
//! `stable_key` derived from it for actual cache lookups.
//!
//! The raw-key digest uses `ahash` rather than a cryptographic hash. This
//! choice is grounded on this same codebase's own exploration of the
//! problem (`spike-iter-1-2/credential-proto`, a throwaway prototype for a
//! credential cache-key redesign): ahash is "ecosystem-dominant,
//! DoS-resistant with per-process random seed" — exactly the property
//! wanted here, since cache keys are tenant/user influenced and a
//! deployment should not let an attacker force hash collisions via chosen
//! tenant/user strings.

use std::hash::{BuildHasher, Hasher};

use ahash::RandomState;
use base64::Engine as _;
use serde_json::Value;

use crate::auth::AuthContext;

const RAW_KEY_LOG_TRUNCATION: usize = 50;

/// Builds cache keys from an [`AuthContext`] plus a factory's options.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    prefix: String,
    // Two independently-seeded hashers combine into a 128-bit digest —
    // `ahash` itself only produces 64 bits per instance.
    seed_a: RandomState,
    seed_b: RandomState,
}

impl KeyBuilder {
    /// Create a builder with the configured raw-key prefix (`spec.md` §6,
    /// `cache.keyPrefix`).
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            seed_a: RandomState::with_seeds(0x5be1_6c31, 0x243f_6a88, 0xb7e1_5162, 0x9e37_79b9),
            seed_b: RandomState::with_seeds(0x428a_2f98, 0x7137_4491, 0xb5c0_fbcf, 0xe9b5_dba5),
        }
    }

    /// Build the raw (`::`-separated, human-readable) key and its stable,
    /// fixed-width derivative, per `spec.md` §4.3.
    ///
    /// `fingerprint` is the factory's `fingerprint(options)` result, if it
    /// returned a non-empty string. `options` is the raw options value,
    /// used for canonical hashing when no fingerprint is available.
    #[must_use]
    pub fn build(
        &self,
        ctx: &AuthContext,
        fingerprint: Option<&str>,
        options: Option<&Value>,
    ) -> (String, String) {
        let mut parts = vec![self.prefix.clone(), ctx.mode().to_string()];

        if let (Some(tenant), Some(user)) = (ctx.tenant_id(), ctx.user_object_id()) {
            parts.push(format!("tenant:{tenant}"));
            parts.push(format!("user:{user}"));
        }

        match fingerprint {
            Some(fp) if !fp.is_empty() => parts.push(format!("fingerprint:{fp}")),
            _ => {
                if let Some(opts) = options {
                    parts.push(format!("options:{}", canonical_hash(opts)));
                }
            }
        }

        let raw_key = parts.join("::");
        let stable_key = self.stable_key(&raw_key);
        (raw_key, stable_key)
    }

    /// Hash a raw key into the fixed-width, URL-safe stored key.
    fn stable_key(&self, raw_key: &str) -> String {
        let mut ha = self.seed_a.build_hasher();
        ha.write(raw_key.as_bytes());
        let high = ha.finish();

        let mut hb = self.seed_b.build_hasher();
        hb.write(raw_key.as_bytes());
        let low = hb.finish();

        let digest = ((u128::from(high)) << 64) | u128::from(low);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.to_be_bytes())
    }

    /// Truncate a raw key for log messages (`spec.md` §4.3: "past 50 chars").
    #[must_use]
    pub fn truncate_for_log(raw_key: &str) -> &str {
        match raw_key.char_indices().nth(RAW_KEY_LOG_TRUNCATION) {
            Some((idx, _)) => &raw_key[..idx],
            None => raw_key,
        }
    }
}

/// Serialize `value` with object keys in deterministic (lexicographic)
/// order — recursively for nested objects/arrays — then hash the
/// serialization. Two deeply-equal values modulo key order therefore
/// produce identical hashes, satisfying the key-determinism invariant in
/// `spec.md` §8.
#[must_use]
pub fn canonical_hash(value: &Value) -> String {
    let canonical = canonicalize(value);
    let serialized = serde_json::to_string(&canonical).unwrap_or_default();
    let state = RandomState::with_seeds(0xdead_beef, 0xfeed_face, 0x1234_5678, 0x9abc_def0);
    let mut hasher = state.build_hasher();
    hasher.write(serialized.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finish().to_be_bytes())
}

/// Recursively rebuild `value` with map keys in sorted order. `serde_json`
/// preserves insertion order for objects by default (`preserve_order`
/// feature off here), so this walk is what actually canonicalizes it.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
