//! Fixed-capacity slot arena
//!
//! Slots are addressed by [`Handle`]. Freed slots go on a free-list and are
//! reused before the arena grows; live slots are also listed in a dense
//! active array so iteration never walks holes.

use std::fmt;

/// Stable index into an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    active: Vec<usize>,
    capacity: usize,
}

impl<T> Arena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            active: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Store a value, `None` when the arena is full
    pub fn insert(&mut self, value: T) -> Option<Handle> {
        let index = if let Some(index) = self.free.pop() {
            self.slots[index] = Some(value);
            index
        } else if self.slots.len() < self.capacity {
            self.slots.push(Some(value));
            self.slots.len() - 1
        } else {
            return None;
        };
        self.active.push(index);
        Some(Handle(index))
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let value = self.slots.get_mut(handle.0)?.take()?;
        self.active.retain(|&i| i != handle.0);
        // Reuse the lowest indices first
        self.free.push(handle.0);
        self.free.sort_unstable_by(|a, b| b.cmp(a));
        Some(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.0)?.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)?.as_mut()
    }

    /// Live entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.active
            .iter()
            .filter_map(move |&i| self.slots[i].as_ref().map(|v| (Handle(i), v)))
    }

    /// Live entries in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (Handle(i), v)))
    }

    pub fn handles(&self) -> Vec<Handle> {
        self.active.iter().map(|&i| Handle(i)).collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }
}
