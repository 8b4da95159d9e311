use std::fmt;

use inlinable_string::InlinableString;

/// The identity of a requested resource. Equal names denote the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceDesc {
    name: InlinableString,
}

impl ResourceDesc {
    pub fn new<T: AsRef<str>>(name: T) -> Self {
        ResourceDesc {
            name: name.as_ref().into(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<'a> From<&'a str> for ResourceDesc {
    fn from(name: &'a str) -> Self {
        ResourceDesc::new(name)
    }
}

impl From<String> for ResourceDesc {
    fn from(name: String) -> Self {
        ResourceDesc { name: name.into() }
    }
}

impl<'a> From<&'a ResourceDesc> for ResourceDesc {
    fn from(desc: &'a ResourceDesc) -> Self {
        desc.clone()
    }
}

impl AsRef<str> for ResourceDesc {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResourceDesc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identity() {
        let a = ResourceDesc::from("textures/crate.png");
        let b = ResourceDesc::from(String::from("textures/crate.png"));
        assert_eq!(a, b);
        assert_eq!(a.name(), "textures/crate.png");
        assert_eq!(format!("{}", a), "textures/crate.png");
        assert!(a != ResourceDesc::new("textures/crate.jpg"));
    }

    #[test]
    fn serialization() {
        let desc = ResourceDesc::new("sfx/boom.wav");
        let json = serde_json::to_string(&desc).unwrap();
        let v: ResourceDesc = serde_json::from_str(&json).unwrap();
        assert_eq!(desc, v);
    }
}
