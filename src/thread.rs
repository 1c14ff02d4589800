// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Carrying context into new threads.

A thread starts with no context.  A [`Carrier`] moves a snapshot across:

1. [`Carrier::capture`] runs in the starting thread and snapshots its enclosing
   context.
2. [`Carrier::install`] runs first thing in the new thread and makes the snapshot
   that thread's root scope, as-is.
3. The thread's own code runs; loggers it creates inherit the snapshot.

[`spawn`] and [`Builder`] do this around every thread they start, provided the
process-wide start hook carries context.  It does not by default;
[`patch_threading`] turns it on.

```
use contextlog::context::Context;
use contextlog::{fields, thread};

thread::patch_threading();
let _scope = Context::bind(fields! { foo = "bar" });
let seen = thread::spawn(Context::lookup_enclosing).join().unwrap();
assert_eq!(seen, fields! { foo = "bar" });
```

Thread pools that start their workers elsewhere can capture a [`Carrier`] per job
and run it through [`Carrier::wrap`].
*/

use crate::binding::{Binding, Patch};
use crate::context::{Context, ContextGuard, Fields};
use std::thread::JoinHandle;

/// What [`spawn`] and [`Builder::spawn`] do at thread start.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StartHook {
    name: &'static str,
    carries: bool,
}

/// New threads start with an empty context.
pub static PLAIN_START: StartHook = StartHook {
    name: "plain",
    carries: false,
};

/// New threads start with the spawning scope's context.
pub static CARRIER_START: StartHook = StartHook {
    name: "carrier",
    carries: true,
};

static START_HOOK: Binding<StartHook> = Binding::new(&PLAIN_START);

impl StartHook {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn carries_context(&self) -> bool {
        self.carries
    }

    /// The carrier this hook hands to a thread started from the current scope.
    pub fn capture(&self) -> Carrier {
        if self.carries {
            Carrier::capture()
        } else {
            Carrier::empty()
        }
    }
}

/// The hook currently in effect.
pub fn start_hook() -> &'static StartHook {
    START_HOOK.get()
}

/// Sets the hook, returning the previous one.
pub fn set_start_hook(hook: &'static StartHook) -> &'static StartHook {
    START_HOOK.set(hook)
}

/// Makes [`spawn`] and [`Builder::spawn`] carry context into new threads.
///
/// Calling it again changes nothing and reports [`Patch::AlreadyApplied`].
pub fn patch_threading() -> Patch {
    let patch = START_HOOK.install(&CARRIER_START);
    log::debug!(target: "contextlog", "thread start hook patch: {patch:?}");
    patch
}

/// A context snapshot on its way to another thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Carrier {
    snapshot: Option<Fields>,
}

impl Carrier {
    /// Snapshots the enclosing context of the current thread.
    pub fn capture() -> Carrier {
        Carrier {
            snapshot: Some(Context::lookup_enclosing()),
        }
    }

    /// A carrier with nothing to install.
    pub fn empty() -> Carrier {
        Carrier { snapshot: None }
    }

    pub fn snapshot(&self) -> Option<&Fields> {
        self.snapshot.as_ref()
    }

    /// Makes the snapshot the root scope of the current thread.
    ///
    /// The snapshot is not merged with anything the thread already has bound; that
    /// scope is set aside until the guard drops.  Returns `None` when there is
    /// nothing to install.
    pub fn install(self) -> Option<ContextGuard> {
        self.snapshot
            .filter(|fields| !fields.is_empty())
            .map(|fields| Context::detached(fields).install())
    }

    /// Wraps `f` so that it runs with the snapshot installed.
    ///
    /// A pool worker running the job keeps its own scope, which the job never sees.
    ///
    /// ```
    /// use contextlog::context::Context;
    /// use contextlog::fields;
    /// use contextlog::thread::Carrier;
    ///
    /// let job = {
    ///     let _scope = Context::bind(fields! { job = 42 });
    ///     Carrier::capture().wrap(Context::lookup_enclosing)
    /// };
    /// let seen = std::thread::spawn(job).join().unwrap();
    /// assert_eq!(seen, fields! { job = 42 });
    /// ```
    pub fn wrap<F, T>(self, f: F) -> impl FnOnce() -> T + Send + 'static
    where
        F: FnOnce() -> T + Send + 'static,
        T: 'static,
    {
        move || {
            let _scope = self.install();
            f()
        }
    }
}

/// Like [`std::thread::spawn`], running `f` under the current [`start_hook`].
///
/// # Panics
///
/// If the OS fails to create the thread, as [`std::thread::spawn`] does.
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    std::thread::spawn(start_hook().capture().wrap(f))
}

/// Like [`std::thread::Builder`], running the thread under the current [`start_hook`].
#[derive(Debug)]
pub struct Builder {
    inner: std::thread::Builder,
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            inner: std::thread::Builder::new(),
        }
    }

    pub fn name(self, name: String) -> Self {
        Builder {
            inner: self.inner.name(name),
        }
    }

    pub fn stack_size(self, size: usize) -> Self {
        Builder {
            inner: self.inner.stack_size(size),
        }
    }

    /// Spawns the thread.  If spawning fails, no context is installed anywhere.
    pub fn spawn<F, T>(self, f: F) -> std::io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(start_hook().capture().wrap(f))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
