use std::sync::{Arc, Condvar, Mutex};

use super::handle::ResourceHandle;

enum PromiseState {
    NotReady,
    Done(Option<Arc<ResourceHandle>>),
}

/// A one-shot latch resolved by the thread that loads a resource. Other threads
/// asking for the same resource meanwhile wait on it instead of loading it again.
pub struct Promise {
    m: Mutex<PromiseState>,
    v: Condvar,
}

impl Promise {
    #[inline]
    pub fn new() -> Self {
        Promise {
            m: Mutex::new(PromiseState::NotReady),
            v: Condvar::new(),
        }
    }

    /// Resolves the promise, `None` if the load failed. Later calls are ignored.
    pub(crate) fn set(&self, v: Option<Arc<ResourceHandle>>) {
        {
            let mut guard = self.m.lock().unwrap();
            if let PromiseState::Done(_) = *guard {
                return;
            }

            *guard = PromiseState::Done(v);
        }

        self.v.notify_all();
    }

    pub fn is_set(&self) -> bool {
        let guard = self.m.lock().unwrap();
        if let PromiseState::NotReady = *guard {
            false
        } else {
            true
        }
    }

    /// Blocks current thread until the promise is resolved.
    pub fn wait(&self) -> Option<Arc<ResourceHandle>> {
        let mut guard = self.m.lock().unwrap();
        loop {
            match *guard {
                PromiseState::NotReady => guard = self.v.wait(guard).unwrap(),
                PromiseState::Done(ref v) => return v.clone(),
            }
        }
    }
}

impl Default for Promise {
    fn default() -> Self {
        Promise::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Weak;
    use std::thread;

    use crate::res::handle::ResourceId;
    use crate::res::loader::ResourceCategory;

    #[test]
    fn wait_across_threads() {
        let promise = Arc::new(Promise::new());
        assert!(!promise.is_set());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let promise = promise.clone();
                thread::spawn(move || promise.wait().map(|v| v.size()))
            })
            .collect();

        let handle = ResourceHandle::new(
            "a.txt".into(),
            ResourceId::null(),
            ResourceCategory::Raw,
            vec![0; 3],
            Weak::new(),
        );

        promise.set(Some(handle.into_shared()));
        assert!(promise.is_set());

        for v in waiters {
            assert_eq!(v.join().unwrap(), Some(3));
        }
    }

    #[test]
    fn first_set_wins() {
        let promise = Promise::new();
        promise.set(None);
        promise.set(Some(
            ResourceHandle::new(
                "b.txt".into(),
                ResourceId::null(),
                ResourceCategory::Raw,
                vec![],
                Weak::new(),
            )
            .into_shared(),
        ));

        assert!(promise.wait().is_none());
    }
}
