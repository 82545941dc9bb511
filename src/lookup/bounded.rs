use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use crate::lookup::{ExternalTaskLookup, LookupError};
use crate::models::ThreadId;

/// Puts an upper bound on every call to the wrapped lookup
///
/// Each call runs on a short-lived worker thread. If the worker has not
/// answered within the timeout the call returns [`LookupError::Timeout`]; the
/// worker is left to finish on its own and its answer is discarded.
pub struct BoundedLookup<L: ?Sized> {
    inner: Arc<L>,
    timeout: Duration,
}

impl<L: ExternalTaskLookup + ?Sized + 'static> BoundedLookup<L> {
    pub fn new(inner: Arc<L>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn call<F>(&self, op: F) -> Result<Option<String>, LookupError>
    where
        F: FnOnce(&L) -> Result<Option<String>, LookupError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("threadlink-lookup".to_string())
            .spawn(move || {
                // Receiver may be gone after a timeout
                let _ = tx.send(op(&*inner));
            })
            .map_err(|e| LookupError::Unavailable(format!("failed to spawn lookup worker: {}", e)))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(LookupError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(LookupError::Unavailable("lookup worker panicked".to_string()))
            }
        }
    }
}

impl<L: ExternalTaskLookup + ?Sized + 'static> ExternalTaskLookup for BoundedLookup<L> {
    fn search_by_thread(&self, thread_id: ThreadId) -> Result<Option<String>, LookupError> {
        self.call(move |lookup| lookup.search_by_thread(thread_id))
    }

    fn extract_from_starter_message(&self, thread_id: ThreadId) -> Result<Option<String>, LookupError> {
        self.call(move |lookup| lookup.extract_from_starter_message(thread_id))
    }
}
