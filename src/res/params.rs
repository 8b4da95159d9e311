use std::io::Read;

use crate::errors::*;

/// The setup parameters of a `ResourceCache`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCacheParams {
    /// The byte budget of decoded resources.
    pub capacity: usize,
    /// The name of background threads spawned by `request_async`.
    pub worker_name: String,
    /// The stack size of background threads, platform default if `None`.
    pub worker_stack_size: Option<usize>,
}

impl Default for ResourceCacheParams {
    fn default() -> Self {
        ResourceCacheParams {
            capacity: 64 * 1024 * 1024,
            worker_name: "RESOURCE".into(),
            worker_stack_size: None,
        }
    }
}

impl ResourceCacheParams {
    /// Reads the params from a JSON document. Missing fields keep their defaults.
    pub fn from_json<R: Read>(reader: R) -> Result<Self> {
        let params = serde_json::from_reader(reader)?;
        Ok(params)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ResourceCacheParams {
            capacity,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let params = ResourceCacheParams::default();
        assert_eq!(params.capacity, 64 * 1024 * 1024);
        assert_eq!(params.worker_name, "RESOURCE");
        assert_eq!(params.worker_stack_size, None);
    }

    #[test]
    fn json() {
        let src = r#"{ "capacity": 1024, "worker_stack_size": 65536 }"#;
        let params = ResourceCacheParams::from_json(src.as_bytes()).unwrap();
        assert_eq!(params.capacity, 1024);
        assert_eq!(params.worker_name, "RESOURCE");
        assert_eq!(params.worker_stack_size, Some(65536));

        let params = ResourceCacheParams::from_json("{}".as_bytes()).unwrap();
        assert_eq!(params, ResourceCacheParams::default());

        assert!(ResourceCacheParams::from_json("{ capacity".as_bytes()).is_err());
    }
}
