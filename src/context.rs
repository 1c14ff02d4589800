// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread-local context propagation.
//!
//! This module is the heart of contextlog: it lets a caller attach key/value
//! [`Fields`] to a scope and have every logger created deeper in the same call stack
//! inherit them, without passing anything through function signatures.
//!
//! # Overview
//!
//! - [`Fields`]: a flattened, immutable map of field name to [`Value`].
//! - [`merge`]: the merge policy; later (more local) fields override earlier ones.
//! - [`Context`]: one bound scope in a thread's chain of scopes.
//! - [`ContextGuard`]: keeps a scope current until it drops.
//! - [`ApplyContext`]: a [`Future`] wrapper carrying a context across executors.
//!
//! # Scopes
//!
//! Each thread keeps its own innermost scope.  [`Context::bind`] merges new fields
//! into whatever the caller already sees and makes the result current until the
//! returned guard drops.  Sibling calls each get their own scope, so nothing bound
//! inside one function is visible to the next:
//!
//! ```rust
//! use contextlog::context::Context;
//! use contextlog::fields;
//!
//! fn first() {
//!     let _scope = Context::bind(fields! { step = "first" });
//! }
//! fn second() -> usize {
//!     let _scope = Context::bind(fields! { other = 1 });
//!     Context::lookup_enclosing().len()
//! }
//!
//! first();
//! assert_eq!(second(), 1);
//! ```
//!
//! # Threads and tasks
//!
//! Scopes never cross threads on their own.  Use [`crate::thread`] to carry a
//! snapshot into a new thread, or [`ApplyContext`] for futures.
//!
//! [`Future`]: std::future::Future

mod apply_context;
mod context_impl;
pub(crate) mod fields;
pub(crate) mod merge;

#[cfg(test)]
mod tests;

pub use apply_context::ApplyContext;
pub use context_impl::{Context, ContextGuard, ContextID};
pub use fields::{Fields, Pretty, Value};
pub use merge::merge;

/// Builds a [`Fields`] from `key = value` pairs.
///
/// Keys are identifiers or string literals; values are anything convertible into
/// [`Value`].
///
/// ```
/// let f = contextlog::fields! { user = "ann", "http.status" = 200u16 };
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:tt = $value:expr),+ $(,)?) => {
        <$crate::Fields as ::std::iter::FromIterator<(::std::string::String, $crate::Value)>>::from_iter([
            $(($crate::__field_key!($key), $crate::Value::from($value))),+
        ])
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_key {
    ($key:ident) => {
        ::std::string::String::from(stringify!($key))
    };
    ($key:literal) => {
        ::std::string::String::from($key)
    };
}
