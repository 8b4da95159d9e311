use std::sync::Arc;
use std::thread::ThreadId;

use crate::errors::*;
use crate::utils::prelude::{FastHashMap, HandlePool};

use super::super::desc::ResourceDesc;
use super::super::handle::{ResourceHandle, ResourceId, ResourceTag};
use super::super::promise::Promise;

pub enum EntryState {
    /// The resource is being loaded by thread `owner`.
    Loading {
        promise: Arc<Promise>,
        owner: ThreadId,
    },
    Ready(Arc<ResourceHandle>),
}

pub struct Entry {
    pub desc: ResourceDesc,
    pub state: EntryState,
    /// Budgeted bytes held by this entry, including reservations of a load in flight.
    pub size: usize,
    prev: Option<ResourceId>,
    next: Option<ResourceId>,
}

/// The arena of cache entries. Ready entries are linked into a LRU list (head is the
/// most recently used), and every entry is reachable through its name. Both views
/// are only updated here, so they always agree.
#[derive(Default)]
pub struct Entries {
    handles: HandlePool<ResourceTag>,
    slots: Vec<Option<Entry>>,
    names: FastHashMap<String, ResourceId>,
    head: Option<ResourceId>,
    tail: Option<ResourceId>,
    linked: usize,
}

impl Entries {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn find(&self, name: &str) -> Option<ResourceId> {
        self.names.get(name).cloned()
    }

    #[inline]
    pub fn get(&self, id: ResourceId) -> Option<&Entry> {
        if self.handles.is_alive(id) {
            self.slots[id.index()].as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut Entry> {
        if self.handles.is_alive(id) {
            self.slots[id.index()].as_mut()
        } else {
            None
        }
    }

    /// Inserts an entry in `Loading` state. It stays out of the LRU list until it
    /// becomes ready.
    pub fn insert_loading(
        &mut self,
        desc: ResourceDesc,
        promise: Arc<Promise>,
        owner: ThreadId,
    ) -> Result<ResourceId> {
        let id = self.handles.create().ok_or(Error::Exhausted)?;
        let index = id.index();

        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }

        self.names.insert(desc.name().to_owned(), id);
        self.slots[index] = Some(Entry {
            desc,
            state: EntryState::Loading { promise, owner },
            size: 0,
            prev: None,
            next: None,
        });

        Ok(id)
    }

    /// Turns a loading entry into a ready one, at the front of the LRU list.
    pub fn mark_ready(&mut self, id: ResourceId, handle: Arc<ResourceHandle>) -> bool {
        match self.get_mut(id) {
            Some(entry) => {
                if let EntryState::Ready(_) = entry.state {
                    return false;
                }

                entry.state = EntryState::Ready(handle);
            }
            None => return false,
        }

        self.link_front(id);
        true
    }

    /// Removes the entry from both the LRU list and the name lookup, and recycles
    /// its id.
    pub fn remove(&mut self, id: ResourceId) -> Option<Entry> {
        if !self.handles.is_alive(id) {
            return None;
        }

        if self.is_linked(id) {
            self.unlink(id);
        }

        let entry = self.slots[id.index()].take()?;
        self.names.remove(entry.desc.name());
        self.handles.free(id);
        Some(entry)
    }

    /// Moves a ready entry to the front of the LRU list.
    pub fn touch(&mut self, id: ResourceId) {
        if self.is_linked(id) && self.head != Some(id) {
            self.unlink(id);
            self.link_front(id);
        }
    }

    /// The least recently used ready entry.
    #[inline]
    pub fn tail(&self) -> Option<ResourceId> {
        self.tail
    }

    /// Number of ready entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.linked
    }

    /// Iterates the ready entries from the most recently used one.
    pub fn iter_lru(&self) -> LruIter {
        LruIter {
            entries: self,
            cursor: self.head,
        }
    }

    fn is_linked(&self, id: ResourceId) -> bool {
        match self.get(id) {
            Some(entry) => match entry.state {
                EntryState::Ready(_) => true,
                EntryState::Loading { .. } => false,
            },
            None => false,
        }
    }

    fn slot_mut(&mut self, id: ResourceId) -> &mut Entry {
        self.slots[id.index()]
            .as_mut()
            .expect("linked entries always occupy their slot.")
    }

    fn link_front(&mut self, id: ResourceId) {
        let head = self.head;
        {
            let entry = self.slot_mut(id);
            entry.prev = None;
            entry.next = head;
        }

        match head {
            Some(v) => self.slot_mut(v).prev = Some(id),
            None => self.tail = Some(id),
        }

        self.head = Some(id);
        self.linked += 1;
    }

    fn unlink(&mut self, id: ResourceId) {
        let (prev, next) = {
            let entry = self.slot_mut(id);
            let links = (entry.prev, entry.next);
            entry.prev = None;
            entry.next = None;
            links
        };

        match prev {
            Some(v) => self.slot_mut(v).next = next,
            None => self.head = next,
        }

        match next {
            Some(v) => self.slot_mut(v).prev = prev,
            None => self.tail = prev,
        }

        self.linked -= 1;
    }
}

pub struct LruIter<'a> {
    entries: &'a Entries,
    cursor: Option<ResourceId>,
}

impl<'a> Iterator for LruIter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let entry = self.entries.slots[id.index()].as_ref()?;
        self.cursor = entry.next;
        Some(entry)
    }
}
