//! ID prefix constants and the context-scoped id factory.
//!
//! Ids have the form `{prefix}-{16 hex chars}`, e.g. `wrk-9f3ab2c14ed07a58`.
//! The random part is 8 bytes of OS entropy, so uniqueness is intrinsic to
//! every factory instance: two factories for the same kind never need a
//! shared ledger to avoid collisions. Ids carry no ordering or numeric
//! meaning, and there is no uniqueness guarantee across kinds.

use crate::enums::EntityKind;
use crate::errors::CoreError;

pub const PREFIX_WORK: &str = "wrk";
pub const PREFIX_PERSON: &str = "prs";
pub const PREFIX_RELATION: &str = "rel";
pub const PREFIX_ARTICLE: &str = "art";
pub const PREFIX_NOTE: &str = "nte";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_WORK,
    PREFIX_PERSON,
    PREFIX_RELATION,
    PREFIX_ARTICLE,
    PREFIX_NOTE,
];

/// Number of random bytes in the id suffix (rendered as hex, twice as many chars).
const ID_ENTROPY_BYTES: usize = 8;

/// Generates fresh ids for one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct IdFactory {
    prefix: &'static str,
}

impl IdFactory {
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    /// The prefix this factory stamps onto every id.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Generate a fresh id, e.g. `"wrk-9f3ab2c14ed07a58"`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Other` if the OS entropy source is unavailable.
    pub fn next_id(&self) -> Result<String, CoreError> {
        use std::fmt::Write;

        let mut bytes = [0u8; ID_ENTROPY_BYTES];
        getrandom::fill(&mut bytes)
            .map_err(|e| CoreError::Other(anyhow::anyhow!("entropy source failed: {e}")))?;

        let mut id = String::with_capacity(self.prefix.len() + 1 + ID_ENTROPY_BYTES * 2);
        id.push_str(self.prefix);
        id.push('-');
        for byte in bytes {
            // write! to a String cannot fail
            let _ = write!(id, "{byte:02x}");
        }
        Ok(id)
    }
}

/// Hands out [`IdFactory`] instances scoped to an entity kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdFactoryProvider;

impl IdFactoryProvider {
    #[must_use]
    pub const fn factory(kind: EntityKind) -> IdFactory {
        IdFactory::new(kind.prefix())
    }
}
