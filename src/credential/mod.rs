//! The Credential Manager (`spec.md` §4.4) and the external strategy
//! contracts it delegates to (`spec.md` §6).

mod manager;
mod strategy;

pub use manager::{CredentialKind, CredentialManager};
pub use strategy::{ApplicationStrategy, DelegatedStrategy};

#[cfg(any(test, feature = "test-util"))]
pub use strategy::test_util;
