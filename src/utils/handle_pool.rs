use std::cmp::Reverse;
use std::collections::binary_heap::BinaryHeap;

use super::handle::{Generations, Handle, HandleIndex, MAX_HANDLE_INDEX};

/// `HandlePool` manages the manipulations of a `Handle` collection, which are
/// created with a continuous `index` field. It also have the ability to find
/// out the current status of a specified `Handle`.
///
/// Freed indices are recycled lowest first. Every handle the pool issues draws
/// its generation from the pool's own `Generations`, so a recycled index never
/// compares equal to the handle that previously owned it.
pub struct HandlePool<T> {
    handles: Vec<Handle<T>>,
    frees: BinaryHeap<Reverse<HandleIndex>>,
    generations: Generations<T>,
}

impl<T> Default for HandlePool<T> {
    fn default() -> Self {
        HandlePool::new()
    }
}

impl<T> HandlePool<T> {
    /// Constructs a new, empty `HandlePool`.
    pub fn new() -> Self {
        HandlePool {
            handles: Vec::new(),
            frees: BinaryHeap::new(),
            generations: Generations::new(),
        }
    }

    /// Creates a unused `Handle`. Returns `None` if every index is in use.
    pub fn create(&mut self) -> Option<Handle<T>> {
        if let Some(Reverse(index)) = self.frees.pop() {
            let index = index as usize;
            self.handles[index].initialize(index, &mut self.generations);
            Some(self.handles[index])
        } else {
            let index = self.handles.len();
            if index > MAX_HANDLE_INDEX {
                return None;
            }

            let mut handle = Handle::null();
            handle.initialize(index, &mut self.generations);
            self.handles.push(handle);
            Some(handle)
        }
    }

    /// Returns true if this `Handle` was created by `HandlePool`, and has not been
    /// freed yet.
    #[inline]
    pub fn is_alive(&self, handle: Handle<T>) -> bool {
        !handle.is_null()
            && self
                .handles
                .get(handle.index())
                .map(|v| *v == handle)
                .unwrap_or(false)
    }

    /// Recycles the `Handle` index, and mark it as dead.
    pub fn free(&mut self, handle: Handle<T>) -> bool {
        if !self.is_alive(handle) {
            return false;
        }

        let index = handle.index();
        self.handles[index].invalidate();
        self.frees.push(Reverse(index as HandleIndex));
        true
    }

    /// Returns the total number of alive handle in this `HandlePool`.
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len() - self.frees.len()
    }

    /// Checks if the pool contains no alive handle.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the alive handles, in index order.
    #[inline]
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = Handle<T>> + 'a {
        self.handles.iter().filter(|v| !v.is_null()).cloned()
    }

    /// Gets the generation source of this pool.
    #[inline]
    pub fn generations(&self) -> &Generations<T> {
        &self.generations
    }

    /// Gets the mutable generation source of this pool, mostly used to `restore`
    /// persisted handles.
    #[inline]
    pub fn generations_mut(&mut self) -> &mut Generations<T> {
        &mut self.generations
    }
}
