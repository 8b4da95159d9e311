//! The budgeted, LRU-evicting resource cache.

mod entries;

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread::{self, ThreadId};

use crate::errors::*;
use crate::utils::prelude::FastHashMap;

use self::entries::{Entries, EntryState};
use super::desc::ResourceDesc;
use super::event::{EventSink, NullSink, ResourceEvent};
use super::file::{ResourceFile, ResourceFiles};
use super::handle::{ResourceHandle, ResourceId};
use super::loader::{DefaultLoader, LoaderRegistry, ResourceLoader};
use super::params::ResourceCacheParams;
use super::promise::Promise;
use super::task::{LoadTask, LoadTaskHandle};

/// A snapshot of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub capacity: usize,
    pub allocated: usize,
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
}

struct CacheState {
    entries: Entries,
    capacity: usize,
    allocated: usize,
    hits: usize,
    misses: usize,
    evictions: usize,
    /// The loading entry each blocked thread waits for.
    waits: FastHashMap<ThreadId, ResourceId>,
}

impl CacheState {
    fn new(capacity: usize) -> Self {
        CacheState {
            entries: Entries::new(),
            capacity,
            allocated: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            waits: FastHashMap::default(),
        }
    }

    /// Follows the chain of waits starting from the thread `owner`, and returns true
    /// if it leads back to current thread.
    fn waits_on_current(&self, mut owner: ThreadId) -> bool {
        let current = thread::current().id();

        for _ in 0..=self.waits.len() {
            if owner == current {
                return true;
            }

            let next = self
                .waits
                .get(&owner)
                .and_then(|&id| self.entries.get(id))
                .and_then(|v| match v.state {
                    EntryState::Loading { owner: holder, .. } => Some(holder),
                    EntryState::Ready(_) => None,
                });

            match next {
                Some(v) => owner = v,
                None => return false,
            }
        }

        false
    }

    /// Evicts the least recently used entries until `size` more bytes fit in.
    fn make_room(&mut self, size: usize) -> Result<()> {
        if size > self.capacity {
            return Err(Error::TooLarge {
                size,
                capacity: self.capacity,
            });
        }

        while self.allocated + size > self.capacity {
            if self.evict_one().is_none() {
                return Err(Error::OutOfBudget {
                    size,
                    allocated: self.allocated,
                    capacity: self.capacity,
                });
            }
        }

        Ok(())
    }

    /// Charges `size` bytes to the loading entry `id`.
    fn reserve(&mut self, id: ResourceId, size: usize) -> Result<()> {
        self.make_room(size)?;

        match self.entries.get_mut(id) {
            Some(entry) => entry.size += size,
            None => return Err(Error::LoadFailed(format!("{}", id))),
        }

        self.allocated += size;
        Ok(())
    }

    /// Removes entry `id` and returns its bytes to the budget.
    fn remove(&mut self, id: ResourceId) -> Option<EntryState> {
        let entry = self.entries.remove(id)?;
        self.allocated -= entry.size;
        Some(entry.state)
    }

    fn evict_one(&mut self) -> Option<Arc<ResourceHandle>> {
        let id = self.entries.tail()?;
        match self.remove(id)? {
            EntryState::Ready(handle) => {
                debug!(
                    "[ResourceCache] Evicts {} ({} bytes).",
                    handle.name(),
                    handle.size()
                );

                handle.detach();
                self.evictions += 1;
                Some(handle)
            }
            EntryState::Loading { .. } => None,
        }
    }

    /// Bytes reserved by loads in flight, which could not be evicted.
    fn pinned(&self) -> usize {
        let ready: usize = self.entries.iter_lru().map(|v| v.size).sum();
        self.allocated - ready
    }
}

#[doc(hidden)]
pub struct CacheShared {
    params: ResourceCacheParams,
    state: Mutex<CacheState>,
    loaders: RwLock<LoaderRegistry>,
    files: RwLock<ResourceFiles>,
    events: Arc<dyn EventSink>,
}

impl Drop for CacheShared {
    fn drop(&mut self) {
        match self.files.get_mut() {
            Ok(files) => files.close_all(),
            Err(err) => err.into_inner().close_all(),
        }
    }
}

/// The budgeted cache of resources. It is a cheap handle over shared state, so
/// clones could be moved into other threads freely.
///
/// Every resource is loaded at most once at a time: requests for a resource that is
/// being loaded by another thread block until that load finishes, and share its
/// result.
#[derive(Clone)]
pub struct ResourceCache {
    shared: Arc<CacheShared>,
}

impl ResourceCache {
    /// Creates a new `ResourceCache`, publishing completion events of asynchronous
    /// loads into `events`. The catch-all `DefaultLoader` is registered already.
    pub fn new(params: ResourceCacheParams, events: Arc<dyn EventSink>) -> Self {
        info!(
            "[ResourceCache] Creates cache with {} bytes capacity.",
            params.capacity
        );

        let mut loaders = LoaderRegistry::new();
        if let Err(err) = loaders.register(Arc::new(DefaultLoader)) {
            error!("[ResourceCache] {}", err);
        }

        let shared = Arc::new(CacheShared {
            state: Mutex::new(CacheState::new(params.capacity)),
            params,
            loaders: RwLock::new(loaders),
            files: RwLock::new(ResourceFiles::new()),
            events,
        });

        ResourceCache { shared }
    }

    /// Creates a new `ResourceCache` that drops completion events.
    pub fn with_params(params: ResourceCacheParams) -> Self {
        ResourceCache::new(params, Arc::new(NullSink))
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ResourceCache::with_params(ResourceCacheParams::with_capacity(capacity))
    }

    pub(crate) fn from_shared(shared: Arc<CacheShared>) -> Self {
        ResourceCache { shared }
    }

    #[inline]
    pub fn params(&self) -> &ResourceCacheParams {
        &self.shared.params
    }

    /// Registers a loader in front of the ones registered before, so it wins over
    /// them for every name its pattern matches.
    pub fn register_loader<T: ResourceLoader>(&self, loader: T) -> Result<()> {
        let pattern = loader.pattern().to_owned();
        match self.shared.loaders.write().unwrap().register(Arc::new(loader)) {
            Ok(_) => {
                info!("[ResourceCache] Registers loader with pattern '{}'.", pattern);
                Ok(())
            }
            Err(err) => {
                error!("[ResourceCache] {}", err);
                Err(err)
            }
        }
    }

    /// Opens and registers a resource file. Files are searched in registration order.
    pub fn register_file<T: ResourceFile>(&self, file: T) -> Result<()> {
        self.shared.files.write().unwrap().register(Box::new(file))
    }

    /// Names of the registered files, in registration order.
    pub fn file_names(&self) -> Vec<String> {
        self.shared.files.read().unwrap().names()
    }

    /// Gets the resource, loading it on current thread if it is not cached yet.
    ///
    /// If another thread is loading it already, this waits for that load instead. A
    /// request that would wait on itself, directly or through other loading threads,
    /// fails with `Error::CircularReference`.
    pub fn get<T: Into<ResourceDesc>>(&self, desc: T) -> Result<Arc<ResourceHandle>> {
        let desc = desc.into();

        let (id, promise) = {
            let mut state = self.state();

            let found = state
                .entries
                .find(desc.name())
                .and_then(|id| state.entries.get(id).map(|v| (id, &v.state)));

            if let Some((id, entry)) = found {
                let waiting = match entry {
                    EntryState::Ready(handle) => Ok(handle.clone()),
                    EntryState::Loading { promise, owner } => Err((promise.clone(), *owner)),
                };

                match waiting {
                    Ok(handle) => {
                        state.entries.touch(id);
                        state.hits += 1;
                        return Ok(handle);
                    }
                    Err((promise, owner)) => {
                        if state.waits_on_current(owner) {
                            warn!(
                                "[ResourceCache] Circular reference of {} found!",
                                desc.name()
                            );
                            return Err(Error::CircularReference(desc.name().into()));
                        }

                        state.waits.insert(thread::current().id(), id);
                        drop(state);
                        return self.wait(&desc, &promise);
                    }
                }
            }

            state.misses += 1;

            let promise = Arc::new(Promise::new());
            let id = state.entries.insert_loading(
                desc.clone(),
                promise.clone(),
                thread::current().id(),
            )?;

            (id, promise)
        };

        let pending = PendingLoad {
            shared: &self.shared,
            id,
            promise,
            committed: false,
        };

        match self.load(&desc, id) {
            Ok(handle) => {
                pending.commit(handle.clone());
                Ok(handle)
            }
            Err(err) => {
                warn!("[ResourceCache] Failed to load {}: {}", desc.name(), err);
                Err(err)
            }
        }
    }

    /// Loads the resource on a background thread. A `ResourceEvent` is published
    /// once it is ready; failures are only logged.
    pub fn request_async<T: Into<ResourceDesc>>(&self, desc: T) -> LoadTaskHandle {
        LoadTask::new(self.clone(), desc.into()).spawn()
    }

    /// Gets every resource in `names`, returning the number of them that are cached
    /// afterwards.
    pub fn preload<I, T>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceDesc>,
    {
        names
            .into_iter()
            .map(|v| self.get(v))
            .filter(|v| v.is_ok())
            .count()
    }

    /// Evicts the least recently used resource. The returned handle is still usable,
    /// but it is detached from this cache.
    pub fn evict_one(&self) -> Option<Arc<ResourceHandle>> {
        self.state().evict_one()
    }

    /// Evicts every cached resource. Reservations of loads in flight are kept.
    pub fn flush(&self) {
        let mut state = self.state();

        let mut count = 0;
        while state.evict_one().is_some() {
            count += 1;
        }

        info!("[ResourceCache] Flushes {} resources.", count);
    }

    /// Changes the byte budget, evicting resources until it is met. The budget never
    /// drops below the bytes reserved by loads in flight.
    pub fn set_capacity(&self, capacity: usize) {
        let mut state = self.state();

        let pinned = state.pinned();
        if capacity < pinned {
            warn!(
                "[ResourceCache] Capacity {} is clamped to {} bytes reserved by pending loads.",
                capacity, pinned
            );
        }

        state.capacity = capacity.max(pinned);
        while state.allocated > state.capacity && state.evict_one().is_some() {}
    }

    /// Returns true if resource `name` is cached and ready.
    pub fn contains<T: AsRef<str>>(&self, name: T) -> bool {
        let state = self.state();
        match state.entries.find(name.as_ref()) {
            Some(id) => match state.entries.get(id).map(|v| &v.state) {
                Some(EntryState::Ready(_)) => true,
                _ => false,
            },
            None => false,
        }
    }

    /// Gets the cached resource with `id`. Ids of evicted resources are stale, and
    /// never resolve again even if their slots have been recycled.
    pub fn resolve(&self, id: ResourceId) -> Option<Arc<ResourceHandle>> {
        match self.state().entries.get(id).map(|v| &v.state) {
            Some(EntryState::Ready(handle)) => Some(handle.clone()),
            _ => None,
        }
    }

    #[inline]
    pub fn is_alive(&self, id: ResourceId) -> bool {
        self.resolve(id).is_some()
    }

    /// Number of cached resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.state().capacity
    }

    #[inline]
    pub fn allocated(&self) -> usize {
        self.state().allocated
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state();
        CacheStats {
            capacity: state.capacity,
            allocated: state.allocated,
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    /// Names of cached resources, from the most recently used to the least.
    pub fn lru_order(&self) -> Vec<String> {
        self.state()
            .entries
            .iter_lru()
            .map(|v| v.desc.name().to_owned())
            .collect()
    }

    pub(crate) fn publish(&self, event: ResourceEvent) {
        self.shared.events.publish(event);
    }

    #[inline]
    fn state(&self) -> MutexGuard<CacheState> {
        self.shared.state.lock().unwrap()
    }

    fn wait(&self, desc: &ResourceDesc, promise: &Promise) -> Result<Arc<ResourceHandle>> {
        trace!("[ResourceCache] Waits for pending load of {}.", desc.name());

        let result = promise.wait();

        let mut state = self.state();
        state.waits.remove(&thread::current().id());

        match result {
            Some(handle) => {
                state.entries.touch(handle.id());
                state.hits += 1;
                Ok(handle)
            }
            None => Err(Error::LoadFailed(desc.name().into())),
        }
    }

    fn load(&self, desc: &ResourceDesc, id: ResourceId) -> Result<Arc<ResourceHandle>> {
        let name = desc.name();

        let loader = self
            .shared
            .loaders
            .read()
            .unwrap()
            .select(name)
            .ok_or_else(|| {
                error!("[ResourceCache] No loader matches {}.", name);
                Error::NoLoader(name.into())
            })?;

        let passthrough = loader.uses_raw_passthrough();

        let raw = {
            let files = self.shared.files.read().unwrap();
            let (file, size) = files
                .locate(name)
                .ok_or_else(|| Error::NotFound(name.into()))?;

            if passthrough {
                self.state().reserve(id, size)?;
            }

            let mut raw = vec![0; size];
            let copied = file.copy_raw(name, &mut raw)?;
            if copied != size {
                return Err(Error::ShortRead {
                    name: name.into(),
                    copied,
                    expected: size,
                });
            }

            raw
        };

        let handle = if passthrough {
            ResourceHandle::new(
                desc.clone(),
                id,
                loader.category(),
                raw,
                Arc::downgrade(&self.shared),
            )
        } else {
            let size = loader.decoded_size(&raw);
            self.state().reserve(id, size)?;

            let mut handle = ResourceHandle::new(
                desc.clone(),
                id,
                loader.category(),
                vec![0; size],
                Arc::downgrade(&self.shared),
            );

            loader
                .decode(&raw, &mut handle)
                .map_err(|reason| Error::Decode {
                    name: name.into(),
                    reason,
                })?;

            handle
        };

        Ok(handle.into_shared())
    }
}

/// Releases everything a load has claimed unless it is committed. Runs on early
/// returns and panics alike.
struct PendingLoad<'a> {
    shared: &'a Arc<CacheShared>,
    id: ResourceId,
    promise: Arc<Promise>,
    committed: bool,
}

impl<'a> PendingLoad<'a> {
    fn commit(mut self, handle: Arc<ResourceHandle>) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.entries.mark_ready(self.id, handle.clone());
        }

        self.committed = true;
        self.promise.set(Some(handle));
    }
}

impl<'a> Drop for PendingLoad<'a> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        {
            let mut state = match self.shared.state.lock() {
                Ok(guard) => guard,
                Err(err) => err.into_inner(),
            };

            state.remove(self.id);
        }

        self.promise.set(None);
    }
}
