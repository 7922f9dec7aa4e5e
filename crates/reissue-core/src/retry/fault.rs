//! Fault boundary around the attempt loop.
//!
//! A panic while the loop is polled is caught on the polling thread. The
//! backtrace is taken inside a chained panic hook, so it shows the frames of the
//! panic site rather than those of whoever recovers it.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

thread_local! {
    static ARMED: Cell<bool> = const { Cell::new(false) };
    static FAULT_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Chain a hook that records a backtrace for panics raised inside a `Guarded`
/// poll. Panics elsewhere go straight to the previous hook.
fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if ARMED.try_with(Cell::get).unwrap_or(false) {
                let trace = Backtrace::force_capture().to_string();
                let _ = FAULT_TRACE.try_with(|t| *t.borrow_mut() = Some(trace));
            }
            previous(info);
        }));
    });
}

/// A panic recovered by `Guarded`.
#[derive(Debug)]
pub(crate) struct Fault {
    pub message: String,
    /// Empty if the hook was replaced after installation.
    pub trace: String,
}

pub(crate) struct Guarded<F> {
    inner: Pin<Box<F>>,
}

pub(crate) fn guard<F: Future>(fut: F) -> Guarded<F> {
    install_hook();
    Guarded {
        inner: Box::pin(fut),
    }
}

impl<F: Future> Future for Guarded<F> {
    type Output = Result<F::Output, Fault>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let was_armed = ARMED.with(|a| a.replace(true));
        let polled = panic::catch_unwind(AssertUnwindSafe(|| self.inner.as_mut().poll(cx)));
        ARMED.with(|a| a.set(was_armed));

        match polled {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(out)) => Poll::Ready(Ok(out)),
            Err(payload) => {
                let trace = FAULT_TRACE
                    .with(|t| t.borrow_mut().take())
                    .unwrap_or_default();
                Poll::Ready(Err(Fault {
                    message: panic_message(payload),
                    trace,
                }))
            }
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast_ref::<&'static str>() {
            Some(s) => (*s).to_string(),
            None => "non-string panic payload".to_string(),
        },
    }
}
