//! Copy-on-write store overlay
//!
//! Writes made through a [`CacheStore`] are held in a pending [`Batch`] and
//! never touch the underlying store. The caller decides whether to flush the
//! batch (commit) or drop it (discard).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::{self, Peekable};
use std::ops::Bound;

use cosmwasm_std::{Order, Record, Storage};

/// A pending write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Insert(Vec<u8>),
    Delete,
}

/// Pending writes, ordered by key
pub type Batch = BTreeMap<Vec<u8>, Op>;

/// Apply a batch of pending writes to a store.
pub fn flush(store: &mut dyn Storage, batch: Batch) {
    for (key, op) in batch {
        match op {
            Op::Insert(value) => store.set(&key, &value),
            Op::Delete => store.remove(&key),
        }
    }
}

/// A read-through overlay over a borrowed store.
pub struct CacheStore<'a> {
    base: &'a dyn Storage,
    pending: Batch,
}

impl<'a> CacheStore<'a> {
    pub fn new(base: &'a dyn Storage) -> Self {
        Self {
            base,
            pending: Batch::new(),
        }
    }

    /// Consume the overlay, returning the writes it collected.
    pub fn into_batch(self) -> Batch {
        self.pending
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Storage for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(Op::Insert(value)) => Some(value.clone()),
            Some(Op::Delete) => None,
            None => self.base.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Box::new(iter::empty());
            }
        }

        let base = self.base.range(start, end, order);

        let min = start.map_or(Bound::Unbounded, |bytes| Bound::Included(bytes.to_vec()));
        let max = end.map_or(Bound::Unbounded, |bytes| Bound::Excluded(bytes.to_vec()));
        let pending_raw = self.pending.range((min, max));

        let pending: Box<dyn Iterator<Item = (&'b Vec<u8>, &'b Op)> + 'b> = match order {
            Order::Ascending => Box::new(pending_raw),
            Order::Descending => Box::new(pending_raw.rev()),
        };

        Box::new(Merged::new(base, pending, order))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.pending
            .insert(key.to_vec(), Op::Insert(value.to_vec()));
    }

    fn remove(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), Op::Delete);
    }
}

struct Merged<'a, B, P>
where
    B: Iterator<Item = Record>,
    P: Iterator<Item = (&'a Vec<u8>, &'a Op)>,
{
    base: Peekable<B>,
    pending: Peekable<P>,
    order: Order,
}

impl<'a, B, P> Merged<'a, B, P>
where
    B: Iterator<Item = Record>,
    P: Iterator<Item = (&'a Vec<u8>, &'a Op)>,
{
    fn new(base: B, pending: P, order: Order) -> Self {
        Self {
            base: base.peekable(),
            pending: pending.peekable(),
            order,
        }
    }

    fn take_pending(&mut self) -> Option<Record> {
        let (key, op) = self.pending.next()?;

        match op {
            Op::Insert(value) => Some((key.clone(), value.clone())),
            Op::Delete => self.next(),
        }
    }
}

impl<'a, B, P> Iterator for Merged<'a, B, P>
where
    B: Iterator<Item = Record>,
    P: Iterator<Item = (&'a Vec<u8>, &'a Op)>,
{
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        match (self.base.peek(), self.pending.peek()) {
            (Some((base_key, _)), Some((pending_key, _))) => {
                let ordering = match self.order {
                    Order::Ascending => base_key.cmp(pending_key),
                    Order::Descending => base_key.cmp(pending_key).reverse(),
                };

                match ordering {
                    Ordering::Less => self.base.next(),
                    Ordering::Equal => {
                        self.base.next();
                        self.take_pending()
                    }
                    Ordering::Greater => self.take_pending(),
                }
            }
            (None, Some(_)) => self.take_pending(),
            (Some(_), None) => self.base.next(),
            (None, None) => None,
        }
    }
}
