//! The `ResourceCache` keeps named resources in memory within a fixed byte budget.
//!
//! # Loading
//!
//! A resource is identified by its name, which is a `/`-separated relative path such
//! like `textures/crate.png`. When a resource that is not cached yet is requested, the
//! cache:
//!
//! 1. Selects the first `ResourceLoader` whose pattern matches the name. Loaders
//! registered later are tried first, and the catch-all `DefaultLoader` registered at
//! construction comes last.
//! 2. Selects the first `ResourceFile`, in registration order, that contains the name.
//! 3. Copies the raw bytes out of the file. Passthrough loaders keep them as the
//! resource buffer directly, others decode them into a buffer of `decoded_size` bytes.
//!
//! # Budget
//!
//! The bytes of every cached resource are charged to the budget of the cache. Least
//! recently used resources are evicted to make room for new ones, and a resource that
//! could not fit in is an error. Evicted resources stay valid for as long as someone
//! holds their `ResourceHandle`, but they are detached from the cache.
//!
//! ## Handle
//!
//! Every cached resource has a `ResourceId`, a generation-checked index of its entry.
//! The id of an evicted resource never resolves again, even after its slot has been
//! recycled for another resource.
//!
//! # Asynchronous Loading
//!
//! `ResourceCache::request_async` loads a resource on a background thread, and publishes
//! a `ResourceEvent` into the `EventSink` of the cache once it is ready. Requests of the
//! same resource are coalesced, only one thread loads it while the others wait.

pub mod cache;
pub mod desc;
pub mod event;
pub mod file;
pub mod handle;
pub mod loader;
pub mod params;
pub mod promise;
pub mod task;

pub mod prelude {
    pub use super::cache::{CacheStats, ResourceCache};
    pub use super::desc::ResourceDesc;
    pub use super::event::{EventQueue, EventSink, NullSink, ResourceEvent, ResourceEventKind};
    pub use super::file::{
        DirectoryFile, MemoryFile, PackBuilder, PackFile, ResourceFile, ZipFile,
    };
    pub use super::handle::{ResourceHandle, ResourceId};
    pub use super::loader::{DefaultLoader, ResourceCategory, ResourceLoader};
    pub use super::params::ResourceCacheParams;
    pub use super::task::LoadTaskHandle;
}
