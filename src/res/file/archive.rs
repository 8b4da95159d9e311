use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use zip::ZipArchive;

use crate::errors::*;

use super::{read_into, ReadSeek, ResourceFile};

enum Source {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// A resource file backed by a zip archive, either on disk or in memory.
pub struct ZipFile {
    name: String,
    source: Source,
    archive: Option<Mutex<ZipArchive<Box<dyn ReadSeek>>>>,
    names: Vec<String>,
}

impl ZipFile {
    /// Creates a zip file that reads the archive at `path` when opened.
    pub fn new<T1, T2>(name: T1, path: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<PathBuf>,
    {
        ZipFile::with_source(name.into(), Source::Path(path.into()))
    }

    /// Creates a zip file over an archive held in memory.
    pub fn from_bytes<T1, T2>(name: T1, bytes: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<Arc<[u8]>>,
    {
        ZipFile::with_source(name.into(), Source::Bytes(bytes.into()))
    }

    fn with_source(name: String, source: Source) -> Self {
        ZipFile {
            name,
            source,
            archive: None,
            names: Vec::new(),
        }
    }

    fn reader(&self) -> Result<Box<dyn ReadSeek>> {
        match self.source {
            Source::Path(ref path) => Ok(Box::new(fs::File::open(path)?)),
            Source::Bytes(ref bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
        }
    }
}

impl ResourceFile for ZipFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        let mut archive = ZipArchive::new(self.reader()?)?;

        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            if !file.name().ends_with('/') {
                names.push(file.name().to_owned());
            }
        }

        info!(
            "[ZipFile] Opens {} with {} files.",
            self.name,
            names.len()
        );

        self.names = names;
        self.archive = Some(Mutex::new(archive));
        Ok(())
    }

    fn close(&mut self) {
        self.archive = None;
        self.names.clear();
    }

    fn raw_size(&self, name: &str) -> usize {
        match self.archive {
            Some(ref archive) => {
                let mut archive = archive.lock().unwrap();
                let v = archive.by_name(name).map(|v| v.size() as usize);
                v.unwrap_or(0)
            }
            None => 0,
        }
    }

    fn copy_raw(&self, name: &str, out: &mut [u8]) -> Result<usize> {
        let archive = self
            .archive
            .as_ref()
            .ok_or_else(|| Error::Malformed(format!("{} is not opened.", self.name)))?;

        let mut archive = archive.lock().unwrap();
        let mut file = archive.by_name(name)?;
        read_into(&mut file, out)
    }

    fn resource_count(&self) -> usize {
        self.names.len()
    }

    fn resource_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|v| v.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn malformed() {
        let mut file = ZipFile::from_bytes("zip", b"definitely not a zip".to_vec());
        assert!(file.open().is_err());
        assert_eq!(file.raw_size("a.txt"), 0);
        assert!(file.copy_raw("a.txt", &mut [0; 4]).is_err());
    }
}
