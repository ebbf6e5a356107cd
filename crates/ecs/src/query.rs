//! Multi-component queries.
//!
//! A query over `(A, B, ..)` walks one anchor store and probes the others with
//! `try_get`, yielding only entities present in every store. The anchor is the
//! smallest participating store, so cost scales with the least populated type
//! rather than with whichever type happens to be listed first.
//!
//! The iterator borrows the stores immutably: the world cannot be mutated until
//! iteration ends. Queue structural changes in a
//! [`CommandBuffer`](crate::CommandBuffer) and apply them afterwards.

use crate::entity::Entity;
use crate::registry::StoreRegistry;
use crate::storage::{Component, ComponentStore};
use std::marker::PhantomData;

/// A tuple of component types that can be queried together.
///
/// Implemented for tuples of one to four component types.
pub trait Query<'w>: Sized {
    /// `(Entity, &A, &B, ..)`
    type Item;
    /// Borrowed stores for every component in the tuple.
    type Fetch: Copy;

    /// Borrow every participating store. `None` if any type has no store yet,
    /// in which case the intersection is empty.
    fn fetch(stores: &'w StoreRegistry) -> Option<Self::Fetch>;

    /// Entities of the smallest participating store.
    fn anchor(fetch: Self::Fetch) -> &'w [Entity];

    /// Read every component of `entity`, or `None` if one is missing.
    fn probe(fetch: Self::Fetch, entity: Entity) -> Option<Self::Item>;
}

/// Lazy, single-pass iterator over the entities matching `Q`.
pub struct QueryIter<'w, Q: Query<'w>> {
    fetch: Option<Q::Fetch>,
    candidates: std::slice::Iter<'w, Entity>,
    _query: PhantomData<Q>,
}

impl<'w, Q: Query<'w>> QueryIter<'w, Q> {
    pub(crate) fn new(stores: &'w StoreRegistry) -> Self {
        let fetch = Q::fetch(stores);
        let empty: &'w [Entity] = &[];
        let candidates = fetch.map_or(empty, Q::anchor).iter();
        Self {
            fetch,
            candidates,
            _query: PhantomData,
        }
    }
}

impl<'w, Q: Query<'w>> Iterator for QueryIter<'w, Q> {
    type Item = Q::Item;

    fn next(&mut self) -> Option<Q::Item> {
        let fetch = self.fetch?;
        self.candidates
            .by_ref()
            .find_map(|&entity| Q::probe(fetch, entity))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len()))
    }
}

macro_rules! impl_query {
    ($($name:ident : $idx:tt),+) => {
        impl<'w, $($name: Component),+> Query<'w> for ($($name,)+) {
            type Item = (Entity, $(&'w $name,)+);
            type Fetch = ($(&'w ComponentStore<$name>,)+);

            fn fetch(stores: &'w StoreRegistry) -> Option<Self::Fetch> {
                Some(($(stores.get::<$name>()?,)+))
            }

            fn anchor(fetch: Self::Fetch) -> &'w [Entity] {
                let mut anchor: Option<&'w [Entity]> = None;
                $(
                    let candidate = ComponentStore::entities(fetch.$idx);
                    anchor = match anchor {
                        Some(current) if current.len() <= candidate.len() => Some(current),
                        _ => Some(candidate),
                    };
                )+
                anchor.unwrap_or(&[])
            }

            fn probe(fetch: Self::Fetch, entity: Entity) -> Option<Self::Item> {
                Some((entity, $(ComponentStore::try_get(fetch.$idx, entity)?,)+))
            }
        }
    };
}

impl_query!(A: 0);
impl_query!(A: 0, B: 1);
impl_query!(A: 0, B: 1, C: 2);
impl_query!(A: 0, B: 1, C: 2, D: 3);
