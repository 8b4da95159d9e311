use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `HandleIndex` is kept 16-bits, so that `index` and `generation` are packed
/// into a single 32-bits word per `Handle`.
pub type HandleIndex = u16;

/// The generation half of a `Handle`.
pub type HandleGeneration = u16;

/// The largest slot index a `Handle` could address.
pub const MAX_HANDLE_INDEX: usize = HandleIndex::max_value() as usize;

/// `Handle` is made up of two field, `index` and `generation`. `index` is usually
/// used to indicate the address into some kind of pool. This value is recycled when
/// a slot is freed, which means that you could end up with two different `Handle`s
/// with identical indices. We solve this by introducing `generation`.
///
/// The phantom `T` names the domain a handle belongs to. Handles of different
/// domains share the same bit layout but are never interchangeable.
pub struct Handle<T> {
    raw: u32,
    _tag: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Constructs a nil/uninitialized `Handle`.
    #[inline]
    pub fn null() -> Self {
        Handle::from_raw(0)
    }

    /// Constructs a `Handle` from its packed representation.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Handle {
            raw,
            _tag: PhantomData,
        }
    }

    #[inline]
    fn pack(index: HandleIndex, generation: HandleGeneration) -> Self {
        Handle::from_raw((u32::from(generation) << 16) | u32::from(index))
    }

    /// Returns the packed representation.
    #[inline]
    pub fn raw(self) -> u32 {
        self.raw
    }

    /// Returns index value.
    #[inline]
    pub fn index(self) -> usize {
        (self.raw & 0xFFFF) as usize
    }

    /// Returns generation value.
    #[inline]
    pub fn generation(self) -> HandleGeneration {
        (self.raw >> 16) as HandleGeneration
    }

    /// Returns true if this `Handle` has not been initialized.
    #[inline]
    pub fn is_null(self) -> bool {
        self.raw == 0
    }

    /// Invalidate this `Handle` to null.
    #[inline]
    pub fn invalidate(&mut self) {
        self.raw = 0;
    }

    /// Initializes a null `Handle` with slot `index`, and a fresh generation drawn
    /// from `generations`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not null, or if `index` is out of range.
    pub fn initialize(&mut self, index: usize, generations: &mut Generations<T>) {
        assert!(self.is_null(), "{} has been initialized already.", self);
        assert!(
            index <= MAX_HANDLE_INDEX,
            "Handle index {} is out of range.",
            index
        );

        let generation = generations.advance();
        *self = Handle::pack(index as HandleIndex, generation);
    }

    /// Rehydrates a `Handle` from persisted state. If the restored generation is
    /// ahead of `generations`, the counter catches up with it, so the domain never
    /// re-issues a generation that a serialized handle already claims.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn restore(
        &mut self,
        index: usize,
        generation: HandleGeneration,
        generations: &mut Generations<T>,
    ) {
        assert!(
            index <= MAX_HANDLE_INDEX,
            "Handle index {} is out of range.",
            index
        );

        generations.observe(generation);
        *self = Handle::pack(index as HandleIndex, generation);
    }
}

impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Default for Handle<T> {
    #[inline]
    fn default() -> Self {
        Handle::null()
    }
}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Handle<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle({}, {})", self.index(), self.generation())
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle ({}, {})", self.index(), self.generation())
    }
}

// Handles serialize as their packed word. Use `Handle::restore` when the owning
// pool should learn about the generation.
impl<T> Serialize for Handle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Handle<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Handle::from_raw)
    }
}

/// The generation source of one handle domain. It is owned by whatever pool issues
/// handles of that domain.
pub struct Generations<T> {
    current: HandleGeneration,
    _tag: PhantomData<fn() -> T>,
}

impl<T> Generations<T> {
    /// Constructs a counter that has not issued any generation yet.
    pub fn new() -> Self {
        Generations {
            current: 0,
            _tag: PhantomData,
        }
    }

    /// Returns the last issued generation, zero if none.
    #[inline]
    pub fn current(&self) -> HandleGeneration {
        self.current
    }

    /// Issues the next generation. Wraps from the max value back to 1, so zero is
    /// never issued.
    #[inline]
    pub fn advance(&mut self) -> HandleGeneration {
        self.current = if self.current == HandleGeneration::max_value() {
            1
        } else {
            self.current + 1
        };

        self.current
    }

    /// Moves the counter forward to `generation` if it is ahead.
    #[inline]
    pub fn observe(&mut self, generation: HandleGeneration) {
        if generation > self.current {
            self.current = generation;
        }
    }
}

impl<T> Default for Generations<T> {
    fn default() -> Self {
        Generations::new()
    }
}

impl<T> fmt::Debug for Generations<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Generations")
            .field("current", &self.current)
            .finish()
    }
}

/// Declares a handle domain: an uninhabited tag type and a `Handle` alias over it.
#[macro_export]
macro_rules! impl_handle {
    ($name:ident, $tag:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $tag {}

        pub type $name = $crate::utils::handle::Handle<$tag>;
    };
}
