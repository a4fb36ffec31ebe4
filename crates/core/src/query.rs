//! Search query classification.

use serde::Serialize;

/// Prefix of a host public key.
pub const HOST_KEY_PREFIX: &str = "ed25519:";

/// Length of a block or transaction id in hex characters.
const HASH_HEX_LEN: usize = 64;

/// Minimum length of a hex string read as an address.
const ADDRESS_MIN_HEX_LEN: usize = 40;

/// What a free-text search query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    BlockHeight,
    /// A block id or a transaction id; the two are indistinguishable.
    Hash,
    Address,
    HostKey,
    Unknown,
}

/// An entity lookup a query can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupTarget {
    Block,
    Transaction,
    Host,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::BlockHeight => "block_height",
            QueryKind::Hash => "hash",
            QueryKind::Address => "address",
            QueryKind::HostKey => "host_key",
            QueryKind::Unknown => "unknown",
        }
    }

    /// Lookups to attempt, in order, until one succeeds.
    ///
    /// A hash is tried as a block first and then as a transaction. The API
    /// has no address endpoint, so addresses route nowhere.
    pub fn lookup_order(&self) -> &'static [LookupTarget] {
        match self {
            QueryKind::BlockHeight => &[LookupTarget::Block],
            QueryKind::Hash => &[LookupTarget::Block, LookupTarget::Transaction],
            QueryKind::HostKey => &[LookupTarget::Host],
            QueryKind::Address | QueryKind::Unknown => &[],
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Classify a search query.
///
/// The input is trimmed first. Checks run from the strictest pattern to the
/// loosest, first match wins:
/// 1. empty → `Unknown`
/// 2. all ASCII digits → `BlockHeight`
/// 3. exactly 64 hex characters → `Hash`
/// 4. 40 or more hex characters → `Address`
/// 5. `ed25519:` prefix → `HostKey`
/// 6. anything else → `Unknown`
pub fn classify(query: &str) -> QueryKind {
    let q = query.trim();

    if q.is_empty() {
        return QueryKind::Unknown;
    }
    if q.bytes().all(|b| b.is_ascii_digit()) {
        return QueryKind::BlockHeight;
    }
    if is_hex(q) {
        if q.len() == HASH_HEX_LEN {
            return QueryKind::Hash;
        }
        if q.len() >= ADDRESS_MIN_HEX_LEN {
            return QueryKind::Address;
        }
    }
    if q.starts_with(HOST_KEY_PREFIX) {
        return QueryKind::HostKey;
    }

    QueryKind::Unknown
}
