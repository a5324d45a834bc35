//! Block-scoped execution context
//!
//! Every state transition in the duality modules runs against a [`Context`]:
//! the current block's store, its header information, and an event sink.
//! Work that spans both ledgers is staged with [`Context::cached`] so that a
//! failure anywhere discards every write made on the way.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Event, Storage, Timestamp};

use crate::store::{flush, CacheStore};

/// Header information for the block being executed
#[cw_serde]
pub struct BlockInfo {
    pub chain_id: String,
    pub height: u64,
    pub time: Timestamp,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self {
            chain_id: "duality_9000-1".to_string(),
            height: 1,
            time: Timestamp::from_seconds(1_700_000_000),
        }
    }
}

pub struct Context<'a> {
    pub store: &'a mut dyn Storage,
    pub block: BlockInfo,
    events: Vec<Event>,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut dyn Storage, block: BlockInfo) -> Self {
        Self {
            store,
            block,
            events: vec![],
        }
    }

    /// Run `f` over a throwaway context built on a read-only store. Anything
    /// `f` writes is dropped.
    pub fn read_only<T>(
        store: &dyn Storage,
        block: &BlockInfo,
        f: impl FnOnce(&mut Context<'_>) -> T,
    ) -> T {
        let mut cache = CacheStore::new(store);
        let mut ctx = Context::new(&mut cache, block.clone());
        f(&mut ctx)
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Stage the writes and events of `f` in an overlay. They are committed to
    /// this context only if `f` returns `Ok`.
    pub fn cached<T, E>(
        &mut self,
        f: impl FnOnce(&mut Context<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut cache = CacheStore::new(&*self.store);
        let (result, events) = {
            let mut child = Context::new(&mut cache, self.block.clone());
            let result = f(&mut child);
            (result, child.events)
        };
        let batch = cache.into_batch();

        let value = result?;
        flush(self.store, batch);
        self.events.extend(events);
        Ok(value)
    }

    /// Run `f` in an overlay that is always discarded.
    pub fn simulate<T>(&mut self, f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let mut cache = CacheStore::new(&*self.store);
        let mut child = Context::new(&mut cache, self.block.clone());
        f(&mut child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;
    use cosmwasm_std::StdError;

    #[test]
    fn test_cached_commits_on_ok() {
        let mut store = MockStorage::new();
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        let res: Result<u8, StdError> = ctx.cached(|ctx| {
            ctx.store.set(b"k", b"v");
            ctx.emit(Event::new("written"));
            Ok(7)
        });

        assert_eq!(res.unwrap(), 7);
        assert_eq!(ctx.events().len(), 1);
        assert_eq!(ctx.store.get(b"k"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_cached_discards_on_err() {
        let mut store = MockStorage::new();
        store.set(b"k", b"old");
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        let res: Result<(), StdError> = ctx.cached(|ctx| {
            ctx.store.set(b"k", b"new");
            ctx.store.set(b"other", b"x");
            ctx.emit(Event::new("lost"));
            Err(StdError::generic_err("boom"))
        });

        assert!(res.is_err());
        assert!(ctx.events().is_empty());
        assert_eq!(ctx.store.get(b"k"), Some(b"old".to_vec()));
        assert_eq!(ctx.store.get(b"other"), None);
    }

    #[test]
    fn test_nested_inner_failure_keeps_outer_writes() {
        let mut store = MockStorage::new();
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        let res: Result<(), StdError> = ctx.cached(|ctx| {
            ctx.store.set(b"outer", b"1");
            let inner: Result<(), StdError> = ctx.cached(|ctx| {
                ctx.store.set(b"inner", b"1");
                Err(StdError::generic_err("inner"))
            });
            assert!(inner.is_err());
            Ok(())
        });

        assert!(res.is_ok());
        assert_eq!(ctx.store.get(b"outer"), Some(b"1".to_vec()));
        assert_eq!(ctx.store.get(b"inner"), None);
    }

    #[test]
    fn test_simulate_never_writes() {
        let mut store = MockStorage::new();
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        let seen = ctx.simulate(|ctx| {
            ctx.store.set(b"k", b"v");
            ctx.store.get(b"k")
        });

        assert_eq!(seen, Some(b"v".to_vec()));
        assert_eq!(ctx.store.get(b"k"), None);
    }
}
