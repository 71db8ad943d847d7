use std::mem::MaybeUninit;

use bitvec::prelude::BitVec;
use bitvec::slice::IterOnes;

use super::Storage;
use crate::entity::EntityId;

/// The basic storage indexed by entity IDs directly.
///
/// Suitable for components that most entities have.
pub struct VecStorage<T> {
    cardinality: usize,
    bits:        BitVec,
    data:        Vec<MaybeUninit<T>>,
}

impl<T> VecStorage<T> {
    fn bit(&self, index: usize) -> bool {
        match self.bits.get(index) {
            Some(bit) => *bit,
            None => false,
        }
    }

    fn set_bit(&mut self, index: usize, bit: bool) {
        if self.bits.len() <= index {
            self.bits.resize(index + 1, false);
        }

        let old = self.bits.replace(index, bit);

        // split into two separate statements to avoid integer underflow
        self.cardinality -= usize::from(old);
        self.cardinality += usize::from(bit);
    }
}

impl<T> Default for VecStorage<T> {
    fn default() -> Self { Self { cardinality: 0, bits: BitVec::new(), data: Vec::new() } }
}

impl<T> Drop for VecStorage<T> {
    fn drop(&mut self) {
        for index in self.bits.iter_ones() {
            if let Some(value) = self.data.get_mut(index) {
                // Safety: the bit is set, so the value is initialized and dropped only once here.
                unsafe { value.assume_init_drop() }
            }
        }
    }
}

impl<C: 'static> Storage for VecStorage<C> {
    type Comp = C;

    fn get(&self, id: EntityId) -> Option<&C> {
        let index = id.index();

        if self.bit(index) {
            let value = self.data.get(index)?;
            // Safety: the bit is set only when the value is initialized.
            Some(unsafe { value.assume_init_ref() })
        } else {
            None
        }
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut C> {
        let index = id.index();

        if self.bit(index) {
            let value = self.data.get_mut(index)?;
            // Safety: the bit is set only when the value is initialized.
            Some(unsafe { value.assume_init_mut() })
        } else {
            None
        }
    }

    fn set(&mut self, id: EntityId, new: Option<C>) -> Option<C> {
        let index = id.index();

        let old = if self.bit(index) {
            self.data.get(index).map(|value| {
                // Safety: the bit is set, and it is updated below before the slot is read again.
                unsafe { value.assume_init_read() }
            })
        } else {
            None
        };

        // the original value was already moved out, now we can overwrite the data or unmark it

        match new {
            Some(new) => {
                if self.data.len() <= index {
                    self.data.resize_with(index + 1, MaybeUninit::uninit);
                }
                if let Some(slot) = self.data.get_mut(index) {
                    *slot = MaybeUninit::new(new);
                }
                self.set_bit(index, true);
            }
            None => self.set_bit(index, false),
        }

        old
    }

    fn cardinality(&self) -> usize { self.cardinality }

    type Iter<'t> = Iter<'t, C> where Self: 't;
    fn iter(&self) -> Self::Iter<'_> { Iter { indices: self.bits.iter_ones(), data: &self.data } }

    type IterMut<'t> = IterMut<'t, C> where Self: 't;
    fn iter_mut(&mut self) -> Self::IterMut<'_> {
        IterMut { indices: self.bits.iter_ones(), data: &mut self.data, offset: 0 }
    }
}

/// Return value of [`VecStorage::iter`](Storage::iter).
pub struct Iter<'t, C> {
    indices: IterOnes<'t, usize, bitvec::order::Lsb0>,
    data:    &'t [MaybeUninit<C>],
}

impl<'t, C> Iterator for Iter<'t, C> {
    type Item = (EntityId, &'t C);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        let value = self.data.get(index)?;
        // Safety: `indices` only yields the indices of initialized values.
        Some((EntityId::from_index(index), unsafe { value.assume_init_ref() }))
    }
}

/// Return value of [`VecStorage::iter_mut`](Storage::iter_mut).
pub struct IterMut<'t, C> {
    indices: IterOnes<'t, usize, bitvec::order::Lsb0>,
    /// The slots from `offset` onwards that have not been yielded yet.
    data:    &'t mut [MaybeUninit<C>],
    offset:  usize,
}

impl<'t, C> Iterator for IterMut<'t, C> {
    type Item = (EntityId, &'t mut C);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;

        // indices are strictly increasing, so the yielded slot is split off the remaining slice
        let data = std::mem::take(&mut self.data);
        let (_, rest) = data.split_at_mut(index - self.offset);
        let (value, rest) = rest.split_first_mut()?;
        self.data = rest;
        self.offset = index + 1;

        // Safety: `indices` only yields the indices of initialized values.
        Some((EntityId::from_index(index), unsafe { value.assume_init_mut() }))
    }
}

#[cfg(test)]
super::tests::test_storage!(VecStorage<i64>);
