use std::thread::{self, JoinHandle};

use super::cache::ResourceCache;
use super::desc::ResourceDesc;
use super::event::ResourceEvent;

/// A one-shot background load of a single resource.
pub struct LoadTask {
    cache: ResourceCache,
    desc: ResourceDesc,
}

impl LoadTask {
    pub fn new(cache: ResourceCache, desc: ResourceDesc) -> Self {
        LoadTask { cache, desc }
    }

    #[inline]
    pub fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    /// Loads the resource on current thread, and publishes a `ResourceEvent` if it
    /// succeeds. Returns true if the event has been published.
    pub fn run(self) -> bool {
        match self.cache.get(&self.desc) {
            Ok(handle) => {
                self.cache.publish(ResourceEvent::new(handle));
                true
            }
            Err(err) => {
                warn!(
                    "[LoadTask] Failed to load {} asynchronously: {}",
                    self.desc, err
                );
                false
            }
        }
    }

    /// Runs this task on a new thread, configured by the params of its cache.
    pub fn spawn(self) -> LoadTaskHandle {
        let desc = self.desc.clone();

        let params = self.cache.params();
        let mut builder = thread::Builder::new().name(params.worker_name.clone());
        if let Some(size) = params.worker_stack_size {
            builder = builder.stack_size(size);
        }

        match builder.spawn(move || self.run()) {
            Ok(join) => LoadTaskHandle {
                desc,
                join: Some(join),
            },
            Err(err) => {
                error!("[LoadTask] Failed to spawn worker for {}: {}", desc, err);
                LoadTaskHandle { desc, join: None }
            }
        }
    }
}

/// The handle of a spawned `LoadTask`. Dropping it detaches the task.
pub struct LoadTaskHandle {
    desc: ResourceDesc,
    join: Option<JoinHandle<bool>>,
}

impl LoadTaskHandle {
    #[inline]
    pub fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    /// Returns false if the worker thread could not be spawned.
    #[inline]
    pub fn is_spawned(&self) -> bool {
        self.join.is_some()
    }

    /// Blocks until the task finishes. Returns true if the resource has been loaded
    /// and its event published.
    pub fn join(self) -> bool {
        match self.join {
            Some(join) => join.join().unwrap_or(false),
            None => false,
        }
    }
}
