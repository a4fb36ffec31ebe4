//! Routing of search queries to entity lookups.

use dartsia_core::host::HostNormalizer;
use dartsia_core::{classify, BlockSummary, Host, LookupTarget, QueryKind, TransactionSummary};
use serde::Serialize;
use tracing::debug;

use crate::error::ClientResult;
use crate::source::ExplorerSource;

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchResult {
    Block(BlockSummary),
    Transaction(TransactionSummary),
    Host(Host),
    NotFound { query: String, kind: QueryKind },
}

/// Resolves free-text queries against an explorer source.
pub struct SearchResolver<'a> {
    source: &'a dyn ExplorerSource,
    normalizer: HostNormalizer,
}

impl<'a> SearchResolver<'a> {
    pub fn new(source: &'a dyn ExplorerSource, normalizer: HostNormalizer) -> Self {
        Self { source, normalizer }
    }

    /// Classify `query` and try its lookups in order.
    ///
    /// A lookup that reports "not found" falls through to the next one; any
    /// other transport error is returned to the caller.
    pub async fn resolve(&self, query: &str) -> ClientResult<SearchResult> {
        let query = query.trim();
        let kind = classify(query);
        debug!("Classified {:?} as {}", query, kind);

        for target in kind.lookup_order() {
            let found = match target {
                LookupTarget::Block => self.find_block(query).await?,
                LookupTarget::Transaction => self.find_transaction(query).await?,
                LookupTarget::Host => self.find_host(query).await?,
            };
            if let Some(result) = found {
                return Ok(result);
            }
            debug!("No {:?} matches {}", target, query);
        }

        Ok(SearchResult::NotFound {
            query: query.to_string(),
            kind,
        })
    }

    async fn find_block(&self, id: &str) -> ClientResult<Option<SearchResult>> {
        match self.source.block(id).await {
            Ok(block) => Ok(Some(SearchResult::Block(BlockSummary::from_raw(&block)))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_transaction(&self, id: &str) -> ClientResult<Option<SearchResult>> {
        match self.source.transaction(id).await {
            Ok(tx) => Ok(Some(SearchResult::Transaction(TransactionSummary::from_raw(&tx)))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_host(&self, key: &str) -> ClientResult<Option<SearchResult>> {
        let hosts = self.source.hosts().await?;
        Ok(hosts
            .iter()
            .find(|h| h.public_key.as_deref() == Some(key))
            .map(|raw| SearchResult::Host(self.normalizer.normalize(raw))))
    }
}
