use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use super::cache::{CacheShared, ResourceCache};
use super::desc::ResourceDesc;
use super::loader::ResourceCategory;

impl_handle!(ResourceId, ResourceTag);

/// The record of a loaded resource. It is filled once by the decode step, then
/// shared read-only between the cache and its consumers. Eviction only detaches it
/// from the cache, so consumers could keep using an evicted resource for as long as
/// they hold it.
pub struct ResourceHandle {
    desc: ResourceDesc,
    id: ResourceId,
    category: ResourceCategory,
    buffer: Vec<u8>,
    extra: Option<Box<dyn Any + Send + Sync>>,
    cache: RwLock<Weak<CacheShared>>,
}

impl ResourceHandle {
    pub(crate) fn new(
        desc: ResourceDesc,
        id: ResourceId,
        category: ResourceCategory,
        buffer: Vec<u8>,
        cache: Weak<CacheShared>,
    ) -> Self {
        ResourceHandle {
            desc,
            id,
            category,
            buffer,
            extra: None,
            cache: RwLock::new(cache),
        }
    }

    #[inline]
    pub fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.desc.name()
    }

    /// The generation-checked id of the cache entry this resource was loaded into.
    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn category(&self) -> ResourceCategory {
        self.category
    }

    /// The number of budgeted bytes this resource occupies.
    #[inline]
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Views the buffer as UTF-8 text.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        ::std::str::from_utf8(&self.buffer).ok()
    }

    /// Downcasts the payload attached by the loader.
    #[inline]
    pub fn extra<T: Any>(&self) -> Option<&T> {
        self.extra.as_ref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Returns the cache that still holds this resource, `None` once it has been
    /// evicted or the cache is gone.
    pub fn cache(&self) -> Option<ResourceCache> {
        self.cache
            .read()
            .unwrap()
            .upgrade()
            .map(ResourceCache::from_shared)
    }

    #[inline]
    pub fn is_cached(&self) -> bool {
        self.cache.read().unwrap().upgrade().is_some()
    }

    /// Mutable access to the buffer, only reachable while a loader decodes into it.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Attaches a typed payload, replacing the previous one.
    #[inline]
    pub fn set_extra<T: Any + Send + Sync>(&mut self, extra: T) {
        self.extra = Some(Box::new(extra));
    }

    pub(crate) fn detach(&self) {
        *self.cache.write().unwrap() = Weak::new();
    }

    pub(crate) fn into_shared(self) -> Arc<ResourceHandle> {
        Arc::new(self)
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("name", &self.desc.name())
            .field("id", &self.id)
            .field("category", &self.category)
            .field("size", &self.buffer.len())
            .field("cached", &self.is_cached())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn handle(bytes: &[u8]) -> ResourceHandle {
        ResourceHandle::new(
            "a.txt".into(),
            ResourceId::from_raw(0x0001_0000),
            ResourceCategory::Raw,
            bytes.to_vec(),
            Weak::new(),
        )
    }

    #[test]
    fn accessors() {
        let mut v = handle(b"hello");
        assert_eq!(v.name(), "a.txt");
        assert_eq!(v.size(), 5);
        assert_eq!(v.as_str(), Some("hello"));
        assert_eq!(v.category(), ResourceCategory::Raw);
        assert!(!v.is_cached());
        assert!(v.cache().is_none());

        v.buffer_mut()[0] = b'j';
        assert_eq!(v.buffer(), b"jello");
    }

    #[test]
    fn extra() {
        let mut v = handle(&[0xFF, 0xFE]);
        assert!(v.as_str().is_none());
        assert!(v.extra::<u32>().is_none());

        v.set_extra(42u32);
        assert_eq!(v.extra::<u32>(), Some(&42));
        assert!(v.extra::<String>().is_none());
    }
}
