use std::collections::btree_map::{self, BTreeMap};

use super::Storage;
use crate::entity::EntityId;

/// A storage based on [`BTreeMap`].
///
/// Suitable for components that only few entities have.
pub struct Tree<C> {
    data: BTreeMap<EntityId, C>,
}

impl<C> Default for Tree<C> {
    fn default() -> Self { Self { data: BTreeMap::new() } }
}

impl<C: 'static> Storage for Tree<C> {
    type Comp = C;

    fn get(&self, id: EntityId) -> Option<&C> { self.data.get(&id) }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut C> { self.data.get_mut(&id) }

    fn set(&mut self, id: EntityId, new: Option<C>) -> Option<C> {
        match new {
            Some(new) => self.data.insert(id, new),
            None => self.data.remove(&id),
        }
    }

    fn cardinality(&self) -> usize { self.data.len() }

    type Iter<'t> = Iter<'t, C> where Self: 't;
    fn iter(&self) -> Self::Iter<'_> { Iter(self.data.iter()) }

    type IterMut<'t> = IterMut<'t, C> where Self: 't;
    fn iter_mut(&mut self) -> Self::IterMut<'_> { IterMut(self.data.iter_mut()) }
}

/// Return value of [`Tree::iter`](Storage::iter).
pub struct Iter<'t, C>(btree_map::Iter<'t, EntityId, C>);

impl<'t, C> Iterator for Iter<'t, C> {
    type Item = (EntityId, &'t C);

    fn next(&mut self) -> Option<Self::Item> { self.0.next().map(|(&id, comp)| (id, comp)) }

    fn size_hint(&self) -> (usize, Option<usize>) { self.0.size_hint() }
}

/// Return value of [`Tree::iter_mut`](Storage::iter_mut).
pub struct IterMut<'t, C>(btree_map::IterMut<'t, EntityId, C>);

impl<'t, C> Iterator for IterMut<'t, C> {
    type Item = (EntityId, &'t mut C);

    fn next(&mut self) -> Option<Self::Item> { self.0.next().map(|(&id, comp)| (id, comp)) }

    fn size_hint(&self) -> (usize, Option<usize>) { self.0.size_hint() }
}

#[cfg(test)]
super::tests::test_storage!(Tree<i64>);
