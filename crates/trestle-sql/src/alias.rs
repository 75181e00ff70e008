//! Deterministic alias allocation.
//!
//! An [`AliasId`] is an opaque token minted at tree-construction time; two
//! occurrences of the same token always render as the same name. Names are
//! assigned by the [`AliasAllocator`] owned by one render call, so the first
//! identity seen becomes `A0`, the next `A1`, and so on.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

static NEXT_ALIAS_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque identity for an anonymous table or subquery alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AliasId(u64);

impl AliasId {
    /// Mint a fresh identity, distinct from every other identity in the
    /// process.
    pub fn new() -> Self {
        Self(NEXT_ALIAS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for AliasId {
    fn default() -> Self {
        Self::new()
    }
}

/// A reference to an alias: either a caller-chosen name or an anonymous
/// identity resolved at render time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AliasRef {
    Named(String),
    Anon(AliasId),
}

impl From<&str> for AliasRef {
    fn from(name: &str) -> Self {
        AliasRef::Named(name.to_string())
    }
}

impl From<String> for AliasRef {
    fn from(name: String) -> Self {
        AliasRef::Named(name)
    }
}

impl From<AliasId> for AliasRef {
    fn from(id: AliasId) -> Self {
        AliasRef::Anon(id)
    }
}

/// Per-render name allocator for anonymous aliases.
#[derive(Debug, Default)]
pub struct AliasAllocator {
    names: IndexMap<AliasId, String>,
}

impl AliasAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rendered name for `id`, allocating the next `A{n}` on first use.
    pub fn name(&mut self, id: AliasId) -> &str {
        let next = self.names.len();
        self.names.entry(id).or_insert_with(|| format!("A{next}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_allocation() {
        let a = AliasId::new();
        let b = AliasId::new();
        let c = AliasId::new();

        let mut alloc = AliasAllocator::new();
        assert_eq!(alloc.name(a), "A0");
        assert_eq!(alloc.name(b), "A1");
        assert_eq!(alloc.name(c), "A2");
    }

    #[test]
    fn test_idempotent_per_identity() {
        let a = AliasId::new();
        let b = AliasId::new();

        let mut alloc = AliasAllocator::new();
        assert_eq!(alloc.name(a), "A0");
        assert_eq!(alloc.name(b), "A1");
        // Repeat lookups return the stored name, not a new one.
        assert_eq!(alloc.name(a), "A0");
        assert_eq!(alloc.name(b), "A1");
    }

    #[test]
    fn test_fresh_allocator_restarts_numbering() {
        let a = AliasId::new();

        let mut first = AliasAllocator::new();
        let mut second = AliasAllocator::new();
        assert_eq!(first.name(a), "A0");
        assert_eq!(second.name(a), "A0");
    }
}
