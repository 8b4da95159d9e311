//! A single-file container of resources.
//!
//! ```sh
//! MAGIC: [u8; 8]
//! MANIFEST_LEN: u32 (little endian)
//! MANIFEST: bincode encoded `PackManifest`
//! DATA: [u8]
//! ```
//!
//! Offsets in the manifest are relative to the start of the data section.

use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::*;
use crate::utils::prelude::FastHashMap;

use super::{read_into, ReadSeek, ResourceFile};

pub const MAGIC: [u8; 8] = [
    'R' as u8, 'P' as u8, 'A' as u8, 'K' as u8, ' ' as u8, 0, 0, 1,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEntry {
    pub name: String,
    pub offset: u64,
    pub len: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackManifest {
    pub entries: Vec<PackEntry>,
}

enum Source {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// A resource file backed by a pack written with `PackBuilder`.
pub struct PackFile {
    name: String,
    source: Source,
    stream: Option<Mutex<Box<dyn ReadSeek>>>,
    manifest: PackManifest,
    index: FastHashMap<String, usize>,
    data_offset: u64,
}

impl PackFile {
    pub fn new<T1, T2>(name: T1, path: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<PathBuf>,
    {
        PackFile::with_source(name.into(), Source::Path(path.into()))
    }

    pub fn from_bytes<T1, T2>(name: T1, bytes: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<Arc<[u8]>>,
    {
        PackFile::with_source(name.into(), Source::Bytes(bytes.into()))
    }

    fn with_source(name: String, source: Source) -> Self {
        PackFile {
            name,
            source,
            stream: None,
            manifest: PackManifest::default(),
            index: FastHashMap::default(),
            data_offset: 0,
        }
    }

    fn entry(&self, name: &str) -> Option<&PackEntry> {
        self.index
            .get(name)
            .map(|&i| &self.manifest.entries[i])
    }
}

impl ResourceFile for PackFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        let mut stream: Box<dyn ReadSeek> = match self.source {
            Source::Path(ref path) => Box::new(fs::File::open(path)?),
            Source::Bytes(ref bytes) => Box::new(Cursor::new(bytes.clone())),
        };

        let mut magic = [0; 8];
        stream.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::Malformed(format!(
                "[PackFile] MAGIC number of {} not match.",
                self.name
            )));
        }

        let len = u64::from(stream.read_u32::<LittleEndian>()?);
        let manifest: PackManifest = bincode::deserialize_from((&mut stream).take(len))?;

        let data_offset = (MAGIC.len() + 4) as u64 + len;
        let total = stream.seek(SeekFrom::End(0))?;

        let mut index = FastHashMap::default();
        for (i, v) in manifest.entries.iter().enumerate() {
            let end = data_offset
                .checked_add(v.offset)
                .and_then(|offset| offset.checked_add(v.len));

            match end {
                Some(end) if end <= total => {}
                _ => {
                    return Err(Error::Malformed(format!(
                        "[PackFile] {} of {} is out of bounds.",
                        v.name, self.name
                    )));
                }
            }

            index.insert(v.name.clone(), i);
        }

        info!(
            "[PackFile] Opens {} with {} resources.",
            self.name,
            manifest.entries.len()
        );

        self.stream = Some(Mutex::new(stream));
        self.manifest = manifest;
        self.index = index;
        self.data_offset = data_offset;
        Ok(())
    }

    fn close(&mut self) {
        self.stream = None;
        self.manifest.entries.clear();
        self.index.clear();
    }

    fn raw_size(&self, name: &str) -> usize {
        self.entry(name).map(|v| v.len as usize).unwrap_or(0)
    }

    fn copy_raw(&self, name: &str, out: &mut [u8]) -> Result<usize> {
        let entry = self
            .entry(name)
            .ok_or_else(|| Error::NotFound(name.into()))?;

        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| Error::Malformed(format!("{} is not opened.", self.name)))?;

        let mut stream = stream.lock().unwrap();
        stream.seek(SeekFrom::Start(self.data_offset + entry.offset))?;

        let len = (entry.len as usize).min(out.len());
        read_into(&mut *stream, &mut out[..len])
    }

    fn resource_count(&self) -> usize {
        self.manifest.entries.len()
    }

    fn resource_name(&self, index: usize) -> Option<&str> {
        self.manifest.entries.get(index).map(|v| v.name.as_str())
    }
}

/// Writes packs that `PackFile` reads.
#[derive(Default)]
pub struct PackBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl PackBuilder {
    pub fn new() -> Self {
        PackBuilder {
            entries: Vec::new(),
        }
    }

    /// Adds resource `name`, replacing the one added with the same name before.
    pub fn add<T: Into<String>>(&mut self, name: T, bytes: Vec<u8>) -> &mut Self {
        let name = name.into();
        if let Some(v) = self.entries.iter_mut().find(|v| v.0 == name) {
            v.1 = bytes;
            return self;
        }

        self.entries.push((name, bytes));
        self
    }

    /// Adds every file under `root`, named by its `/`-separated relative path.
    pub fn add_dir<T: AsRef<Path>>(&mut self, root: T) -> Result<&mut Self> {
        use super::dir::DirectoryFile;

        let mut dir = DirectoryFile::new("", root.as_ref());
        dir.open()?;

        for i in 0..dir.resource_count() {
            if let Some(name) = dir.resource_name(i) {
                let bytes = fs::read(root.as_ref().join(name))?;
                self.add(name, bytes);
            }
        }

        Ok(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write<W: Write>(&self, mut w: W) -> Result<()> {
        let mut manifest = PackManifest::default();
        let mut offset = 0;
        for (name, bytes) in &self.entries {
            manifest.entries.push(PackEntry {
                name: name.clone(),
                offset,
                len: bytes.len() as u64,
            });

            offset += bytes.len() as u64;
        }

        let encoded = bincode::serialize(&manifest)?;
        if encoded.len() > u32::max_value() as usize {
            return Err(Error::Malformed("[PackBuilder] Manifest is too large.".into()));
        }

        w.write_all(&MAGIC)?;
        w.write_u32::<LittleEndian>(encoded.len() as u32)?;
        w.write_all(&encoded)?;
        for (_, bytes) in &self.entries {
            w.write_all(bytes)?;
        }

        w.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_and_read() {
        let mut builder = PackBuilder::new();
        builder
            .add("a.txt", b"hello".to_vec())
            .add("dir/b.bin", vec![1, 2, 3])
            .add("a.txt", b"world!".to_vec());
        assert_eq!(builder.len(), 2);

        let mut file = PackFile::from_bytes("pack", builder.to_bytes().unwrap());
        file.open().unwrap();

        assert_eq!(file.resource_count(), 2);
        assert_eq!(file.resource_name(1), Some("dir/b.bin"));
        assert_eq!(file.raw_size("a.txt"), 6);
        assert_eq!(file.raw_size("missing"), 0);

        let mut out = vec![0; 6];
        assert_eq!(file.copy_raw("a.txt", &mut out).unwrap(), 6);
        assert_eq!(&out, b"world!");

        let mut out = vec![0; 3];
        assert_eq!(file.copy_raw("dir/b.bin", &mut out).unwrap(), 3);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn bad_magic() {
        let mut bytes = PackBuilder::new().to_bytes().unwrap();
        bytes[0] = b'X';

        let mut file = PackFile::from_bytes("pack", bytes);
        match file.open() {
            Err(Error::Malformed(_)) => {}
            _ => panic!("expected a malformed pack."),
        }
    }

    #[test]
    fn truncated() {
        let mut builder = PackBuilder::new();
        builder.add("a.txt", vec![7; 64]);

        let mut bytes = builder.to_bytes().unwrap();
        let len = bytes.len();
        bytes.truncate(len - 8);

        let mut file = PackFile::from_bytes("pack", bytes);
        assert!(file.open().is_err());
    }

    #[test]
    fn overflowing_offset() {
        let manifest = PackManifest {
            entries: vec![PackEntry {
                name: "a.txt".into(),
                offset: u64::max_value() - 4,
                len: 16,
            }],
        };

        let encoded = bincode::serialize(&manifest).unwrap();
        let mut bytes = MAGIC.to_vec();
        bytes.write_u32::<LittleEndian>(encoded.len() as u32).unwrap();
        bytes.extend_from_slice(&encoded);
        bytes.extend_from_slice(&[0; 16]);

        let mut file = PackFile::from_bytes("pack", bytes);
        match file.open() {
            Err(Error::Malformed(_)) => {}
            _ => panic!("expected a malformed pack."),
        }

        assert_eq!(file.resource_count(), 0);
        assert_eq!(file.raw_size("a.txt"), 0);
    }
}
