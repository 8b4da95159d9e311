//! Completion events published by asynchronous loads.

use std::fmt;
use std::sync::Arc;

use crossbeam_deque::{Injector, Steal};

use super::handle::ResourceHandle;
use super::loader::ResourceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceEventKind {
    TextureReady,
    ShaderReady,
    ModelReady,
    SoundReady,
    SceneReady,
    RawReady,
}

impl From<ResourceCategory> for ResourceEventKind {
    fn from(category: ResourceCategory) -> Self {
        match category {
            ResourceCategory::Texture => ResourceEventKind::TextureReady,
            ResourceCategory::Shader => ResourceEventKind::ShaderReady,
            ResourceCategory::Model => ResourceEventKind::ModelReady,
            ResourceCategory::Sound => ResourceEventKind::SoundReady,
            ResourceCategory::Scene => ResourceEventKind::SceneReady,
            ResourceCategory::Raw => ResourceEventKind::RawReady,
        }
    }
}

/// Announces that a resource requested asynchronously is ready to use.
#[derive(Clone)]
pub struct ResourceEvent {
    pub kind: ResourceEventKind,
    pub name: String,
    pub handle: Arc<ResourceHandle>,
}

impl ResourceEvent {
    pub fn new(handle: Arc<ResourceHandle>) -> Self {
        ResourceEvent {
            kind: handle.category().into(),
            name: handle.name().to_owned(),
            handle,
        }
    }
}

impl fmt::Debug for ResourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ResourceEvent")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

/// The receiving end of completion events. Implementations are called from the
/// loading threads.
pub trait EventSink: Send + Sync + 'static {
    fn publish(&self, event: ResourceEvent);
}

/// A sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _: ResourceEvent) {}
}

/// A multi-producer queue of events, usually drained once per frame by the main
/// thread.
pub struct EventQueue {
    events: Injector<ResourceEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue {
            events: Injector::new(),
        }
    }

    /// Pops the oldest event.
    pub fn poll(&self) -> Option<ResourceEvent> {
        loop {
            match self.events.steal() {
                Steal::Success(v) => return Some(v),
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    /// Pops every event queued so far.
    pub fn drain(&self) -> Vec<ResourceEvent> {
        let mut events = Vec::new();
        while let Some(v) = self.poll() {
            events.push(v);
        }

        events
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        EventQueue::new()
    }
}

impl EventSink for EventQueue {
    fn publish(&self, event: ResourceEvent) {
        trace!("[EventQueue] {:?} {}.", event.kind, event.name);
        self.events.push(event);
    }
}

impl<T: EventSink> EventSink for Arc<T> {
    fn publish(&self, event: ResourceEvent) {
        (**self).publish(event)
    }
}
