extern crate env_logger;
extern crate failure;
extern crate rescache;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rescache::prelude::*;

struct SoundLoader {
    decodes: Arc<AtomicUsize>,
    threads: Arc<Mutex<Vec<Option<String>>>>,
}

impl ResourceLoader for SoundLoader {
    fn pattern(&self) -> &str {
        r"\.wav$"
    }

    fn uses_raw_passthrough(&self) -> bool {
        false
    }

    fn decoded_size(&self, raw: &[u8]) -> usize {
        raw.len()
    }

    fn decode(&self, raw: &[u8], handle: &mut ResourceHandle) -> Result<(), failure::Error> {
        thread::sleep(Duration::from_millis(20));

        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.threads
            .lock()
            .unwrap()
            .push(thread::current().name().map(|v| v.to_owned()));

        handle.buffer_mut().copy_from_slice(raw);
        Ok(())
    }

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Sound
    }
}

struct Testbed {
    cache: ResourceCache,
    events: Arc<EventQueue>,
    decodes: Arc<AtomicUsize>,
    threads: Arc<Mutex<Vec<Option<String>>>>,
}

fn testbed(params: ResourceCacheParams) -> Testbed {
    let _ = env_logger::try_init();

    let events = Arc::new(EventQueue::new());
    let cache = ResourceCache::new(params, events.clone());
    cache
        .register_file(
            MemoryFile::new("mem")
                .with("sfx/boom.wav", vec![1; 64])
                .with("readme.txt", b"hello".to_vec()),
        )
        .unwrap();

    let decodes = Arc::new(AtomicUsize::new(0));
    let threads = Arc::new(Mutex::new(Vec::new()));
    cache
        .register_loader(SoundLoader {
            decodes: decodes.clone(),
            threads: threads.clone(),
        })
        .unwrap();

    Testbed {
        cache,
        events,
        decodes,
        threads,
    }
}

#[test]
fn publish_on_success() {
    let tb = testbed(ResourceCacheParams::with_capacity(1024));

    let task = tb.cache.request_async("sfx/boom.wav");
    assert!(task.is_spawned());
    assert_eq!(task.desc().name(), "sfx/boom.wav");
    assert!(task.join());

    let events = tb.events.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ResourceEventKind::SoundReady);
    assert_eq!(events[0].name, "sfx/boom.wav");
    assert_eq!(events[0].handle.size(), 64);
    assert!(Arc::ptr_eq(
        &events[0].handle,
        &tb.cache.get("sfx/boom.wav").unwrap()
    ));

    assert!(tb.cache.request_async("readme.txt").join());
    let events = tb.events.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ResourceEventKind::RawReady);
    assert_eq!(events[0].handle.as_str(), Some("hello"));
}

#[test]
fn silent_on_failure() {
    let tb = testbed(ResourceCacheParams::with_capacity(1024));

    assert!(!tb.cache.request_async("missing.wav").join());
    assert!(tb.events.is_empty());

    // Could never fit in.
    tb.cache.set_capacity(16);
    assert!(!tb.cache.request_async("sfx/boom.wav").join());
    assert!(tb.events.poll().is_none());
    assert_eq!(tb.cache.allocated(), 0);
}

#[test]
fn coalesced_requests() {
    let tb = testbed(ResourceCacheParams::with_capacity(1024));

    let tasks: Vec<_> = (0..8)
        .map(|_| tb.cache.request_async("sfx/boom.wav"))
        .collect();

    for v in tasks {
        assert!(v.join());
    }

    assert_eq!(tb.decodes.load(Ordering::SeqCst), 1);

    let events = tb.events.drain();
    assert_eq!(events.len(), 8);
    for v in &events {
        assert!(Arc::ptr_eq(&v.handle, &events[0].handle));
    }

    assert_eq!(tb.cache.allocated(), 64);
}

#[test]
fn worker_params() {
    let mut params = ResourceCacheParams::with_capacity(1024);
    params.worker_name = "LOADER".into();
    params.worker_stack_size = Some(256 * 1024);

    let tb = testbed(params);
    assert!(tb.cache.request_async("sfx/boom.wav").join());

    let threads = tb.threads.lock().unwrap();
    assert_eq!(*threads, vec![Some("LOADER".to_owned())]);
}

#[test]
fn detached_request() {
    let tb = testbed(ResourceCacheParams::with_capacity(1024));
    tb.cache.request_async("sfx/boom.wav");

    let mut event = None;
    for _ in 0..500 {
        event = tb.events.poll();
        if event.is_some() {
            break;
        }

        thread::sleep(Duration::from_millis(10));
    }

    let event = event.expect("event has not been published.");
    assert_eq!(event.name, "sfx/boom.wav");
    assert!(tb.events.is_empty());
}
