// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async context preservation.

use std::future::Future;
use std::mem::ManuallyDrop;
use std::pin::Pin;
use std::task::Poll;

use super::context_impl::{Context, swap_current};
use super::fields::Fields;

/// A [`Future`] wrapper that carries a context across executor boundaries.
///
/// Executors poll futures on whatever thread is free, so the thread-local scope of
/// the code that created a future is generally not the scope it runs under.
/// `ApplyContext` makes its context current for the duration of each poll.
///
/// Scopes bound by the inner future are kept with the future between polls, so a
/// [`LoggerScope`](crate::LoggerScope) may be held across an `.await` inside it.
/// Dropping the wrapper before it completes releases those scopes under its own
/// context, leaving the dropping thread's scope untouched.
///
/// # Examples
///
/// ```rust
/// use contextlog::context::{ApplyContext, Context};
/// use contextlog::fields;
///
/// async fn handle() -> usize {
///     Context::lookup_enclosing().len()
/// }
///
/// # async fn example() {
/// let _scope = Context::bind(fields! { request = 9 });
/// // snapshot the caller's context into the future
/// let future = ApplyContext::capture(handle());
/// assert_eq!(future.await, 1);
/// # }
/// ```
pub struct ApplyContext<F> {
    context: Option<Context>,
    future: ManuallyDrop<F>,
}

impl<F> ApplyContext<F> {
    /// Wraps `f` so it runs under `fields`.
    pub fn new(fields: Fields, f: F) -> Self {
        Self {
            context: Some(Context::detached(fields)),
            future: ManuallyDrop::new(f),
        }
    }

    /// Wraps `f` so it runs under the caller's current context.
    pub fn capture(f: F) -> Self {
        Self::new(Context::lookup_enclosing(), f)
    }
}

/// Makes a stored context current, handing the thread's own scope back when dropped,
/// unwinding included.
struct Swapped<'a> {
    slot: &'a mut Option<Context>,
    prior: Option<Context>,
}

impl<'a> Swapped<'a> {
    fn enter(slot: &'a mut Option<Context>) -> Self {
        let prior = swap_current(slot.take());
        Swapped { slot, prior }
    }
}

impl Drop for Swapped<'_> {
    fn drop(&mut self) {
        *self.slot = swap_current(self.prior.take());
    }
}

impl<F> Future for ApplyContext<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        //safety: `future` is structurally pinned and never moved out; `context` is not pinned.
        let (context, fut) = unsafe {
            let d = self.get_unchecked_mut();
            (&mut d.context, Pin::new_unchecked(&mut *d.future))
        };
        let _swapped = Swapped::enter(context);
        fut.poll(cx)
    }
}

impl<F> Drop for ApplyContext<F> {
    fn drop(&mut self) {
        // scopes still held by the future expect their own context to be current
        let _swapped = Swapped::enter(&mut self.context);
        //safety: dropped in place exactly once; `future` is never used again.
        unsafe { ManuallyDrop::drop(&mut self.future) }
    }
}
