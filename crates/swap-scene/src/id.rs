//! Generation-checked handles
//!
//! Provides [`NodeId`] and [`ComponentId`] plus the slot arena that hands
//! them out. A handle stays valid for as long as its slot holds the value it
//! was issued for; once the slot is released its generation moves on and the
//! old handle never resolves again, even after the slot is reused.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::Hash;
use std::marker::PhantomData;

/// Key types stored in an [`Arena`]
pub(crate) trait ArenaKey: Copy + Eq + Hash + Debug {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> u32;
}

macro_rules! arena_key {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl $name {
            /// Slot index
            #[inline]
            #[must_use]
            pub fn index(self) -> u32 {
                self.index
            }

            /// Generation of the slot when this handle was issued
            #[inline]
            #[must_use]
            pub fn generation(self) -> u32 {
                self.generation
            }
        }

        impl ArenaKey for $name {
            #[inline]
            fn from_parts(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            #[inline]
            fn index(self) -> u32 {
                self.index
            }

            #[inline]
            fn generation(self) -> u32 {
                self.generation
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}v{}"), self.index, self.generation)
            }
        }
    };
}

arena_key!(
    /// Stable handle of a node in a [`Scene`](crate::Scene)
    NodeId,
    "n"
);

arena_key!(
    /// Stable handle of a component in a [`Scene`](crate::Scene)
    ComponentId,
    "c"
);

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage addressed by generation-checked keys
///
/// Vacating a slot ([`Arena::take`]) and releasing it ([`Arena::release`])
/// are separate steps: a vacated slot keeps its generation until released,
/// so the value can be put back under the same key.
#[derive(Debug, Clone)]
pub(crate) struct Arena<K, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    _key: PhantomData<K>,
}

impl<K: ArenaKey, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            _key: PhantomData,
        }
    }
}

impl<K: ArenaKey, T> Arena<K, T> {
    pub(crate) fn insert(&mut self, value: T) -> K {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return K::from_parts(index, slot.generation);
        }

        let index = u32::try_from(self.slots.len()).expect("arena exceeded u32::MAX slots");
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        K::from_parts(index, 0)
    }

    fn slot(&self, key: K) -> Option<&Slot<T>> {
        self.slots
            .get(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
    }

    pub(crate) fn get(&self, key: K) -> Option<&T> {
        self.slot(key).and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.slots
            .get_mut(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Vacate the slot, keeping it reserved for `key`
    pub(crate) fn take(&mut self, key: K) -> Option<T> {
        self.slots
            .get_mut(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
            .and_then(|slot| slot.value.take())
    }

    /// Whether `key` names a vacated slot that has not been released yet
    pub(crate) fn is_reserved(&self, key: K) -> bool {
        self.slot(key).is_some_and(|slot| slot.value.is_none())
    }

    /// Put a value back into its reserved slot
    ///
    /// Returns the value if the slot is occupied or already released.
    pub(crate) fn restore(&mut self, key: K, value: T) -> Result<(), T> {
        match self.slots.get_mut(key.index() as usize) {
            Some(slot) if slot.generation == key.generation() && slot.value.is_none() => {
                slot.value = Some(value);
                Ok(())
            }
            _ => Err(value),
        }
    }

    /// Release a vacated slot for reuse; `key` and every older handle die
    pub(crate) fn release(&mut self, key: K) {
        if let Some(slot) = self.slots.get_mut(key.index() as usize) {
            if slot.generation == key.generation() && slot.value.is_none() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(key.index());
            }
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                // slots.len() never exceeds u32::MAX, see insert
                #[allow(clippy::cast_possible_truncation)]
                let key = K::from_parts(index as u32, slot.generation);
                (key, value)
            })
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value.is_some()).count()
    }
}
