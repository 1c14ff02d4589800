// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Process-wide bindings to `'static` sentinel values.

The ambient logger class and the thread start hook are both "which of a few static
implementations is in effect".  A [`Binding`] stores a reference to one and swaps it
under a lock.  Installing compares by address, so applying the same patch twice is
a no-op rather than a double wrap.
*/

use std::sync::{PoisonError, RwLock};

/// Outcome of applying a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Patch {
    /// The binding changed.
    Applied,
    /// The binding already pointed at the requested value; nothing changed.
    AlreadyApplied,
}

pub(crate) struct Binding<T: 'static> {
    current: RwLock<&'static T>,
}

impl<T: Sync + 'static> Binding<T> {
    pub(crate) const fn new(initial: &'static T) -> Self {
        Binding {
            current: RwLock::new(initial),
        }
    }

    pub(crate) fn get(&self) -> &'static T {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the binding, returning the previous value.
    pub(crate) fn set(&self, value: &'static T) -> &'static T {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, value)
    }

    /// Binds `value` unless it is already bound.
    pub(crate) fn install(&self, value: &'static T) -> Patch {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if std::ptr::eq(*current, value) {
            Patch::AlreadyApplied
        } else {
            *current = value;
            Patch::Applied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sentinel(#[allow(dead_code)] u8);
    static A: Sentinel = Sentinel(1);
    static B: Sentinel = Sentinel(2);

    #[test]
    fn install_is_idempotent_by_identity() {
        let binding = Binding::new(&A);
        assert_eq!(binding.install(&B), Patch::Applied);
        assert!(std::ptr::eq(binding.get(), &B));
        assert_eq!(binding.install(&B), Patch::AlreadyApplied);
        assert!(std::ptr::eq(binding.get(), &B));
    }

    #[test]
    fn set_returns_previous() {
        let binding = Binding::new(&A);
        let previous = binding.set(&B);
        assert!(std::ptr::eq(previous, &A));
        assert!(std::ptr::eq(binding.set(previous), &B));
        assert!(std::ptr::eq(binding.get(), &A));
    }
}
