//! Observer trait for controller events.
//!
//! Inject an [`Arc<dyn ControllerObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to hear about requests as
//! they start and finish, edits, and exports. The CLI uses it to drive its
//! spinner; a GUI would flip a busy indicator.
//!
//! # Example
//!
//! ```rust
//! use site_brochure::{ClientConfig, ControllerObserver, RequestKind};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Failures(AtomicUsize);
//!
//! impl ControllerObserver for Failures {
//!     fn on_request_error(&self, kind: RequestKind, error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{kind} failed: {error}");
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .observer(Arc::new(Failures(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::state::RequestKind;
use std::sync::Arc;

/// Called by the controller as requests and exports progress.
///
/// Brochure and summary requests can be in flight together, so methods may
/// be called concurrently. All methods default to no-ops.
pub trait ControllerObserver: Send + Sync {
    /// A request of `kind` was dispatched; its loading flag is now set.
    fn on_request_start(&self, kind: RequestKind) {
        let _ = kind;
    }

    /// A request of `kind` succeeded.
    ///
    /// # Arguments
    /// * `kind`     — which request finished
    /// * `text_len` — byte length of the returned markdown or summary
    fn on_request_complete(&self, kind: RequestKind, text_len: usize) {
        let _ = (kind, text_len);
    }

    /// A request of `kind` failed. The loading flag is already clear.
    fn on_request_error(&self, kind: RequestKind, error: &str) {
        let _ = (kind, error);
    }

    /// The markdown source was replaced by an edit.
    fn on_markdown_edited(&self, markdown_len: usize) {
        let _ = markdown_len;
    }

    /// A PDF of `byte_len` bytes was produced.
    fn on_export_complete(&self, byte_len: usize) {
        let _ = byte_len;
    }
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl ControllerObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type Observer = Arc<dyn ControllerObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        last_len: AtomicUsize,
    }

    impl ControllerObserver for Tracking {
        fn on_request_start(&self, _kind: RequestKind) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_request_complete(&self, _kind: RequestKind, text_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.last_len.store(text_len, Ordering::SeqCst);
        }

        fn on_request_error(&self, _kind: RequestKind, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_request_start(RequestKind::Brochure);
        o.on_request_complete(RequestKind::Brochure, 12);
        o.on_request_error(RequestKind::Summary, "boom");
        o.on_markdown_edited(3);
        o.on_export_complete(1024);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let t = Tracking::default();
        t.on_request_start(RequestKind::Brochure);
        t.on_request_start(RequestKind::Summary);
        t.on_request_complete(RequestKind::Brochure, 42);
        t.on_request_error(RequestKind::Summary, "timeout");
        // Default methods still available.
        t.on_export_complete(10);

        assert_eq!(t.starts.load(Ordering::SeqCst), 2);
        assert_eq!(t.completes.load(Ordering::SeqCst), 1);
        assert_eq!(t.errors.load(Ordering::SeqCst), 1);
        assert_eq!(t.last_len.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let o: Observer = Arc::new(NoopObserver);
        o.on_request_start(RequestKind::Summary);
    }
}
