//! Rendered native queries (SQL text, operator documents) are reported through
//! [`query_trace!`](crate::query_trace). Besides going to the `log` facade they can be
//! captured per thread, so tests assert on translations without installing a logger.

use std::cell::RefCell;
use std::marker::PhantomData;

/// Log target used by [`query_trace!`](crate::query_trace).
pub const TRACE_TARGET: &str = "repokit::query";

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Active capture of this thread's query traces; capturing stops when it is dropped.
///
/// Tied to the thread that started it.
#[must_use = "capturing stops as soon as the capture is dropped"]
pub struct QueryCapture {
    _thread_bound: PhantomData<*const ()>,
}

impl QueryCapture {
    /// Starts (or restarts, discarding earlier lines) capturing on the current thread.
    pub fn start() -> Self {
        CAPTURED.with(|c| *c.borrow_mut() = Some(Vec::new()));
        Self { _thread_bound: PhantomData }
    }

    /// Lines captured so far; the buffer is emptied.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        CAPTURED.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
    }

    /// Lines captured so far, left in place.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        CAPTURED.with(|c| c.borrow().clone().unwrap_or_default())
    }
}

impl Drop for QueryCapture {
    fn drop(&mut self) {
        CAPTURED.with(|c| *c.borrow_mut() = None);
    }
}

#[doc(hidden)]
pub fn record(line: String) {
    CAPTURED.with(|c| {
        if let Some(buf) = c.borrow_mut().as_mut() {
            buf.push(line);
        }
    });
}

/// Reports a rendered native query at TRACE under [`TRACE_TARGET`] and to an active
/// [`QueryCapture`] on this thread.
#[macro_export]
macro_rules! query_trace {
    ($($arg:tt)*) => {{
        let __line = format!($($arg)*);
        log::log!(target: $crate::utils::devlog::TRACE_TARGET, log::Level::Trace, "{}", __line);
        $crate::utils::devlog::record(__line);
    }};
}
