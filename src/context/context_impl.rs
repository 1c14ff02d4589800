// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core Context implementation.

use std::cell::RefCell;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::fields::Fields;
use super::merge::merge;

pub(crate) static CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a context scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextID(pub(crate) u64);

impl Display for ContextID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct ContextInner {
    pub(crate) parent: Option<Context>,
    pub(crate) context_id: u64,
    /// Already merged with every enclosing scope.
    pub(crate) fields: Fields,
}

/// One scope in a thread's chain of bound contexts.
///
/// A `Context` holds the fully resolved [`Fields`] for a scope plus a link to the
/// scope that enclosed it.  Each thread has its own current scope; code deeper in
/// the call stack discovers the fields bound by its callers through
/// [`Context::lookup_enclosing`] without anything being passed explicitly.
///
/// Contexts are cheap to clone (Arc-based).  Equality and hashing are by identity.
///
/// # Binding
///
/// ```
/// use contextlog::context::Context;
/// use contextlog::fields;
///
/// fn inner() {
///     let _scope = Context::bind(fields! { ctx_internal = "method" });
///     let seen = Context::lookup_enclosing();
///     assert_eq!(seen, fields! { ctx = "test", ctx_internal = "method" });
/// }
///
/// let _scope = Context::bind(fields! { ctx = "test" });
/// inner();
/// // the inner scope ended with `inner`
/// assert_eq!(Context::lookup_enclosing(), fields! { ctx = "test" });
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) inner: Arc<ContextInner>,
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl Hash for Context {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}#{} {}",
            "  ".repeat(self.nesting_level()),
            self.context_id(),
            self.inner.fields
        )
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// Replaces the thread's current scope, returning the previous one.
pub(crate) fn swap_current(next: Option<Context>) -> Option<Context> {
    CURRENT.with(|c| c.replace(next))
}

impl Context {
    /// Returns the innermost scope bound on this thread, if any.
    #[inline]
    pub fn current() -> Option<Context> {
        CURRENT.with(|c| c.borrow().clone())
    }

    /// Returns the fields of the innermost bound scope on this thread.
    ///
    /// The result is a snapshot: later bindings never change it.  A thread with no
    /// bound scope yields an empty [`Fields`].
    #[inline]
    pub fn lookup_enclosing() -> Fields {
        CURRENT
            .try_with(|c| {
                c.borrow()
                    .as_ref()
                    .map(|ctx| ctx.inner.fields.clone())
                    .unwrap_or_default()
            })
            //thread-local already destroyed, e.g. logging from another TLS destructor
            .unwrap_or_default()
    }

    /// Binds `fields` for the rest of the caller's scope.
    ///
    /// The new scope's fields are `merge(lookup_enclosing(), fields)`.  The scope stays
    /// current until the returned guard drops, which must happen before any scope
    /// bound earlier on this thread is released.
    ///
    /// ```
    /// use contextlog::context::Context;
    /// use contextlog::fields;
    ///
    /// let guard = Context::bind(fields! { request = 7 });
    /// assert_eq!(guard.fields(), &fields! { request = 7 });
    /// drop(guard);
    /// assert!(Context::lookup_enclosing().is_empty());
    /// ```
    #[must_use = "the scope ends as soon as the guard is dropped"]
    pub fn bind(fields: Fields) -> ContextGuard {
        let merged = merge(&Context::lookup_enclosing(), &fields);
        let context = Context::from_parent(Context::current(), merged);
        ContextGuard::enter(context)
    }

    /// Creates a scope that is not bound to any thread.
    ///
    /// `fields` must already be resolved.  Such a context can be made current later,
    /// for example by [`ApplyContext`](super::ApplyContext).
    pub fn detached(fields: Fields) -> Context {
        Context::from_parent(None, fields)
    }

    fn from_parent(parent: Option<Context>, fields: Fields) -> Context {
        Context {
            inner: Arc::new(ContextInner {
                parent,
                context_id: CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
                fields,
            }),
        }
    }

    /// The resolved fields of this scope.
    #[inline]
    pub fn fields(&self) -> &Fields {
        &self.inner.fields
    }

    #[inline]
    pub fn context_id(&self) -> ContextID {
        ContextID(self.inner.context_id)
    }

    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    /// Number of enclosing scopes.  A root scope has level 0.
    pub fn nesting_level(&self) -> usize {
        let mut level = 0;
        let mut current = self;
        while let Some(parent) = &current.inner.parent {
            level += 1;
            current = parent;
        }
        level
    }

    /// Makes `self` the thread's current scope as-is, without merging.
    ///
    /// Whatever scope was current is set aside and comes back when the guard drops.
    /// Used to start work from a snapshot taken elsewhere.
    #[must_use = "the scope ends as soon as the guard is dropped"]
    pub fn install(self) -> ContextGuard {
        let restore = swap_current(Some(self.clone()));
        ContextGuard::new(self, restore)
    }

    /// Ends the scope `id`, making `restore` the current scope.
    ///
    /// # Panics
    ///
    /// If `id` is not the innermost scope of this thread.  Releasing scopes out of
    /// order means a guard escaped the scope it was created for, which is a bug in
    /// the caller.  While the thread is already panicking the check is skipped.
    pub(crate) fn pop(id: ContextID, restore: Option<Context>) {
        CURRENT.with(|c| {
            let innermost = c.borrow().as_ref().map(Context::context_id);
            match innermost {
                Some(current) if current == id => {
                    c.replace(restore);
                }
                _ if std::thread::panicking() => {}
                innermost => panic!(
                    "context scope {id} released out of order (innermost scope is {innermost:?})"
                ),
            }
        });
    }
}

/// Keeps a bound [`Context`] current until dropped.
///
/// Returned by [`Context::bind`] and [`Context::install`].  The guard is tied to the thread that created it
/// and cannot be sent elsewhere.
#[derive(Debug)]
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ContextGuard {
    context: Context,
    /// Current again once this scope ends.
    restore: Option<Context>,
    _not_send: PhantomData<*const ()>,
}

impl ContextGuard {
    fn enter(context: Context) -> ContextGuard {
        swap_current(Some(context.clone()));
        let restore = context.parent().cloned();
        ContextGuard::new(context, restore)
    }

    fn new(context: Context, restore: Option<Context>) -> ContextGuard {
        ContextGuard {
            context,
            restore,
            _not_send: PhantomData,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn fields(&self) -> &Fields {
        self.context.fields()
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        Context::pop(self.context.context_id(), self.restore.take());
    }
}
