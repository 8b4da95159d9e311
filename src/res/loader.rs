//! Pluggable decoders, selected by matching their pattern against resource names.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use smallvec::SmallVec;

use crate::errors::*;

use super::handle::ResourceHandle;

/// The pattern that matches every resource name.
pub const ANY_PATTERN: &str = "*";

/// The kind of payload a loader produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    Texture,
    Shader,
    Model,
    Sound,
    Scene,
    Raw,
}

impl Default for ResourceCategory {
    fn default() -> Self {
        ResourceCategory::Raw
    }
}

/// A strategy that turns the raw bytes of a resource into its decoded form.
///
/// Loaders are stateless and shared between threads. The cache picks the most
/// recently registered loader whose `pattern` matches the requested name.
pub trait ResourceLoader: Send + Sync + 'static {
    /// Either `*` or a regular expression searched in resource names.
    fn pattern(&self) -> &str;

    /// Returns true if the raw bytes should become the resource buffer as they are,
    /// in which case `decoded_size` and `decode` are never called.
    fn uses_raw_passthrough(&self) -> bool;

    /// Returns the number of bytes the decoded resource takes.
    fn decoded_size(&self, raw: &[u8]) -> usize;

    /// Populates the zeroed buffer of `handle`, which is `decoded_size(raw)` bytes
    /// long. Typed payloads could be attached with `ResourceHandle::set_extra`.
    fn decode(&self, raw: &[u8], handle: &mut ResourceHandle)
        -> ::std::result::Result<(), failure::Error>;

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Raw
    }
}

/// A compiled loader pattern.
#[derive(Clone)]
pub enum Pattern {
    Any,
    Regex(Regex),
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern == ANY_PATTERN {
            return Ok(Pattern::Any);
        }

        Regex::new(pattern)
            .map(Pattern::Regex)
            .map_err(|err| Error::InvalidPattern(pattern.into(), err.to_string()))
    }

    #[inline]
    pub fn matches(&self, name: &str) -> bool {
        match *self {
            Pattern::Any => true,
            Pattern::Regex(ref re) => re.is_match(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match *self {
            Pattern::Any => ANY_PATTERN,
            Pattern::Regex(ref re) => re.as_str(),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pattern({})", self.as_str())
    }
}

/// The ordered chain of loaders. Lookups walk it front to back, and registrations
/// are inserted at the front.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: SmallVec<[(Pattern, Arc<dyn ResourceLoader>); 8]>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        LoaderRegistry {
            loaders: SmallVec::new(),
        }
    }

    /// Compiles the pattern of `loader` and puts it in front of every loader
    /// registered before. The registry is left untouched if the pattern is invalid.
    pub fn register(&mut self, loader: Arc<dyn ResourceLoader>) -> Result<()> {
        let pattern = Pattern::new(loader.pattern())?;
        self.loaders.insert(0, (pattern, loader));
        Ok(())
    }

    /// Returns the first loader whose pattern matches `name`.
    pub fn select(&self, name: &str) -> Option<Arc<dyn ResourceLoader>> {
        self.loaders
            .iter()
            .find(|(pattern, _)| pattern.matches(name))
            .map(|(_, loader)| loader.clone())
    }

    /// Iterates the patterns in lookup order.
    pub fn patterns<'a>(&'a self) -> impl Iterator<Item = &'a str> + 'a {
        self.loaders.iter().map(|(pattern, _)| pattern.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

/// The catch-all loader. It matches every name and keeps the raw bytes as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLoader;

impl ResourceLoader for DefaultLoader {
    fn pattern(&self) -> &str {
        ANY_PATTERN
    }

    fn uses_raw_passthrough(&self) -> bool {
        true
    }

    fn decoded_size(&self, raw: &[u8]) -> usize {
        raw.len()
    }

    fn decode(
        &self,
        raw: &[u8],
        handle: &mut ResourceHandle,
    ) -> ::std::result::Result<(), failure::Error> {
        handle.buffer_mut().copy_from_slice(raw);
        Ok(())
    }
}
