//! Animation host capability
//!
//! The host owns playback and the registry of live snippets. The runtime
//! only submits and removes.

use visemic_core::{Snippet, SnippetHandle};

/// What the runtime needs from an animation engine
pub trait AnimationHost {
    /// Start playing `snippet`. `None` means the host declined it.
    fn schedule_snippet(&mut self, snippet: &Snippet) -> Option<SnippetHandle>;

    /// Stop and forget a snippet. Unknown handles are ignored.
    fn remove_snippet(&mut self, handle: &SnippetHandle);
}

impl<H: AnimationHost + ?Sized> AnimationHost for Box<H> {
    fn schedule_snippet(&mut self, snippet: &Snippet) -> Option<SnippetHandle> {
        (**self).schedule_snippet(snippet)
    }

    fn remove_snippet(&mut self, handle: &SnippetHandle) {
        (**self).remove_snippet(handle)
    }
}
