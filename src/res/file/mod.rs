//! Containers that resources are read from.
//!
//! A `ResourceFile` is opened once when it is registered to the cache, and closed
//! when the cache is dropped. Names are `/`-separated relative paths on every
//! backend. A resource is present in a file iff `raw_size` reports a nonzero size.

pub mod archive;
pub mod dir;
pub mod memory;
pub mod pack;

pub use self::archive::ZipFile;
pub use self::dir::DirectoryFile;
pub use self::memory::MemoryFile;
pub use self::pack::{PackBuilder, PackFile};

use std::io::{Read, Seek};

use crate::errors::*;

/// A backing container of resources.
pub trait ResourceFile: Send + Sync + 'static {
    /// The unique name this file is registered with.
    fn name(&self) -> &str;

    /// Prepares the file for reading, usually indexing its contents.
    fn open(&mut self) -> Result<()>;

    fn close(&mut self) {}

    /// Returns the size of resource `name` in bytes, zero if it is absent.
    fn raw_size(&self, name: &str) -> usize;

    /// Copies the bytes of resource `name` into `out`, returning the number of bytes
    /// copied. Copies at most `out.len()` bytes.
    fn copy_raw(&self, name: &str, out: &mut [u8]) -> Result<usize>;

    fn resource_count(&self) -> usize;

    fn resource_name(&self, index: usize) -> Option<&str>;
}

/// A seekable byte stream that could be moved across threads.
pub trait ReadSeek: Read + Seek + Send {}

impl<T> ReadSeek for T where T: Read + Seek + Send {}

/// Reads from `src` until `out` is full or the stream ends.
pub(crate) fn read_into<R: Read + ?Sized>(src: &mut R, out: &mut [u8]) -> Result<usize> {
    let mut copied = 0;
    while copied < out.len() {
        match src.read(&mut out[copied..]) {
            Ok(0) => break,
            Ok(n) => copied += n,
            Err(ref err) if err.kind() == ::std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(copied)
}

/// The registered files, in registration order.
#[derive(Default)]
pub struct ResourceFiles {
    files: Vec<Box<dyn ResourceFile>>,
}

impl ResourceFiles {
    pub fn new() -> Self {
        ResourceFiles { files: Vec::new() }
    }

    /// Opens `file` and appends it. A file that fails to open, or whose name has
    /// been registered already, is dropped.
    pub fn register(&mut self, mut file: Box<dyn ResourceFile>) -> Result<()> {
        let name = file.name().to_owned();

        if let Err(err) = file.open() {
            warn!("[ResourceFiles] Failed to open {}: {}", name, err);
            return Err(Error::FileOpen(name, err.to_string()));
        }

        if self.files.iter().any(|v| v.name() == name) {
            warn!("[ResourceFiles] {} has been registered already.", name);
            file.close();
            return Err(Error::DuplicatedFile(name));
        }

        info!(
            "[ResourceFiles] Registers {} with {} resources.",
            name,
            file.resource_count()
        );

        self.files.push(file);
        Ok(())
    }

    /// Finds the first file that contains resource `name`, with its raw size.
    pub fn locate(&self, name: &str) -> Option<(&dyn ResourceFile, usize)> {
        self.files.iter().find_map(|v| {
            let size = v.raw_size(name);
            if size > 0 {
                Some((v.as_ref(), size))
            } else {
                None
            }
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.files.iter().map(|v| v.name().to_owned()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn close_all(&mut self) {
        for v in self.files.iter_mut() {
            v.close();
        }

        self.files.clear();
    }
}
