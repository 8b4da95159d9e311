use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::*;

use super::{read_into, ResourceFile};

/// A resource file backed by a directory of the host filesystem. Every regular file
/// under the root is a resource, named by its `/`-separated relative path.
pub struct DirectoryFile {
    name: String,
    root: PathBuf,
    names: Vec<String>,
}

impl DirectoryFile {
    pub fn new<T1, T2>(name: T1, root: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<PathBuf>,
    {
        DirectoryFile {
            name: name.into(),
            root: root.into(),
            names: Vec::new(),
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `name` under the root. Names escaping the root are rejected.
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        if name.is_empty() || relative.components().any(|v| match v {
            Component::Normal(_) => false,
            _ => true,
        }) {
            return None;
        }

        Some(self.root.join(relative))
    }

    fn scan(dir: &Path, prefix: &str, names: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let filename = entry.file_name();
            let filename = match filename.to_str() {
                Some(v) => v,
                None => {
                    warn!(
                        "[DirectoryFile] Skips non UTF-8 filename {:?}.",
                        entry.path()
                    );
                    continue;
                }
            };

            let name = if prefix.is_empty() {
                filename.to_owned()
            } else {
                format!("{}/{}", prefix, filename)
            };

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                Self::scan(&entry.path(), &name, names)?;
            } else if file_type.is_file() {
                names.push(name);
            }
        }

        Ok(())
    }
}

impl ResourceFile for DirectoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        let metadata = fs::metadata(&self.root)?;
        if !metadata.is_dir() {
            return Err(Error::Malformed(format!(
                "{:?} is not a directory.",
                self.root
            )));
        }

        let mut names = Vec::new();
        Self::scan(&self.root, "", &mut names)?;
        names.sort();

        info!(
            "[DirectoryFile] Opens {:?} with {} files.",
            self.root,
            names.len()
        );

        self.names = names;
        Ok(())
    }

    fn close(&mut self) {
        self.names.clear();
    }

    fn raw_size(&self, name: &str) -> usize {
        self.locate(name)
            .and_then(|path| fs::metadata(path).ok())
            .filter(|v| v.is_file())
            .map(|v| v.len() as usize)
            .unwrap_or(0)
    }

    fn copy_raw(&self, name: &str, out: &mut [u8]) -> Result<usize> {
        let path = self
            .locate(name)
            .ok_or_else(|| Error::NotFound(name.into()))?;

        let mut file = fs::File::open(path)?;
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
    fn rejects_escaping_names() {
        let file = DirectoryFile::new("res", "tests/resources");
        assert!(file.locate("").is_none());
        assert!(file.locate("../Cargo.toml").is_none());
        assert!(file.locate("/etc/passwd").is_none());
        assert!(file.locate("a/../../b").is_none());
        assert!(file.locate("a/b.txt").is_some());
        assert_eq!(file.raw_size("../Cargo.toml"), 0);
    }

    #[test]
    fn missing_root() {
        let mut file = DirectoryFile::new("res", "tests/resources/does-not-exist");
        assert!(file.open().is_err());
    }
}
