//! A budgeted, LRU-evicting resource cache.
//!
//! Resources (textures, shaders, models, sounds, scene descriptors and plain bytes) are
//! identified by name, located in one of the registered `ResourceFile`s, decoded by the
//! first `ResourceLoader` whose pattern matches the name, and kept in memory until the
//! byte budget of the cache forces them out in least-recently-used order.
//!
//! ```rust,ignore
//! use rescache::prelude::*;
//!
//! let cache = ResourceCache::with_capacity(16 * 1024 * 1024);
//! cache.register_file(DirectoryFile::new("res", "assets"))?;
//! cache.register_loader(WavLoader::new())?;
//!
//! let handle = cache.get("sfx/explosion.wav")?;
//! cache.request_async("textures/crate.png");
//! ```
//!
//! See the `res` module for the details of the loading pipeline.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub extern crate inlinable_string;

pub mod errors;
#[macro_use]
pub mod utils;
pub mod res;

pub mod prelude {
    pub use crate::errors::Error;
    pub use crate::res::prelude::*;
    pub use crate::utils::prelude::{Generations, Handle, HandlePool};
}
