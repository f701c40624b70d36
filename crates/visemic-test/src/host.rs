//! Recording host
//!
//! An [`AnimationHost`] that keeps every call it receives. Clones share one
//! log, so a test can hand the host to a service and still inspect it.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use visemic_core::{Snippet, SnippetHandle};
use visemic_runtime::AnimationHost;

/// Everything the host has seen
#[derive(Debug, Default)]
pub struct HostLog {
    /// Every accepted snippet, in submission order
    pub scheduled: Vec<Snippet>,
    /// Every removal request, in order
    pub removed: Vec<SnippetHandle>,
    /// Snippets currently playing, by handle
    pub live: BTreeMap<String, Snippet>,
    /// Submissions refused while declining
    pub declined: usize,
}

impl HostLog {
    pub fn last_scheduled(&self) -> Option<&Snippet> {
        self.scheduled.last()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[derive(Debug, Default)]
struct Inner {
    log: HostLog,
    decline: bool,
    next_id: u64,
}

/// Host double that records calls
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    inner: Rc<RefCell<Inner>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that refuses every snippet until [`RecordingHost::set_declining`]
    /// turns it off
    pub fn declining() -> Self {
        let host = Self::new();
        host.set_declining(true);
        host
    }

    pub fn set_declining(&self, decline: bool) {
        self.inner.borrow_mut().decline = decline;
    }

    pub fn log(&self) -> Ref<'_, HostLog> {
        Ref::map(self.inner.borrow(), |inner| &inner.log)
    }
}

impl AnimationHost for RecordingHost {
    fn schedule_snippet(&mut self, snippet: &Snippet) -> Option<SnippetHandle> {
        let mut inner = self.inner.borrow_mut();
        if inner.decline {
            inner.log.declined += 1;
            return None;
        }

        inner.next_id += 1;
        let handle = SnippetHandle(format!("{}#{}", snippet.name, inner.next_id));
        inner.log.scheduled.push(snippet.clone());
        inner.log.live.insert(handle.0.clone(), snippet.clone());
        Some(handle)
    }

    fn remove_snippet(&mut self, handle: &SnippetHandle) {
        let mut inner = self.inner.borrow_mut();
        inner.log.live.remove(handle.as_str());
        inner.log.removed.push(handle.clone());
    }
}
