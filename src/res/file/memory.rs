use crate::errors::*;
use crate::utils::prelude::FastHashMap;

use super::ResourceFile;

/// A resource file that lives in memory, mostly used for embedded assets.
pub struct MemoryFile {
    name: String,
    entries: Vec<(String, Vec<u8>)>,
    index: FastHashMap<String, usize>,
}

impl MemoryFile {
    pub fn new<T: Into<String>>(name: T) -> Self {
        MemoryFile {
            name: name.into(),
            entries: Vec::new(),
            index: FastHashMap::default(),
        }
    }

    /// Adds or replaces resource `name`.
    pub fn insert<T: AsRef<str>>(&mut self, name: T, bytes: Vec<u8>) {
        let name = name.as_ref();

        if let Some(&i) = self.index.get(name) {
            self.entries[i].1 = bytes;
        } else {
            self.index.insert(name.to_owned(), self.entries.len());
            self.entries.push((name.to_owned(), bytes));
        }
    }

    pub fn with<T: AsRef<str>>(mut self, name: T, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }

    #[inline]
    fn get(&self, name: &str) -> Option<&[u8]> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].1.as_slice())
    }
}

impl ResourceFile for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn raw_size(&self, name: &str) -> usize {
        self.get(name).map(|v| v.len()).unwrap_or(0)
    }

    fn copy_raw(&self, name: &str, out: &mut [u8]) -> Result<usize> {
        let bytes = self
            .get(name)
            .ok_or_else(|| Error::NotFound(name.into()))?;

        let len = bytes.len().min(out.len());
        out[..len].copy_from_slice(&bytes[..len]);
        Ok(len)
    }

    fn resource_count(&self) -> usize {
        self.entries.len()
    }

    fn resource_name(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|v| v.0.as_str())
    }
}
