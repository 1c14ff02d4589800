// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the context module.

use super::apply_context::ApplyContext;
use std::future::Future;
use super::context_impl::Context;
use super::fields::Fields;
use crate::fields;

#[test]
fn test_empty_thread_has_no_context() {
    std::thread::spawn(|| {
        assert!(Context::current().is_none());
        assert!(Context::lookup_enclosing().is_empty());
    })
    .join()
    .unwrap();
}

#[test]
fn test_nested_inherits_and_overrides() {
    let _outer = Context::bind(fields! { ctx = "test", who = "outer" });

    fn method() -> Fields {
        let _inner = Context::bind(fields! { ctx_internal = "method", who = "inner" });
        Context::lookup_enclosing()
    }

    assert_eq!(
        method(),
        fields! { ctx = "test", ctx_internal = "method", who = "inner" }
    );
    assert_eq!(
        Context::lookup_enclosing(),
        fields! { ctx = "test", who = "outer" }
    );
}

#[test]
fn test_siblings_do_not_leak() {
    fn first() -> Fields {
        let _scope = Context::bind(fields! { a = 1 });
        Context::lookup_enclosing()
    }
    fn second() -> Fields {
        let _scope = Context::bind(fields! { b = 2 });
        Context::lookup_enclosing()
    }
    assert_eq!(first(), fields! { a = 1 });
    assert_eq!(second(), fields! { b = 2 });
}

#[test]
fn test_snapshot_is_not_affected_by_later_binds() {
    let _outer = Context::bind(fields! { a = 1 });
    let snapshot = Context::lookup_enclosing();
    {
        let _inner = Context::bind(fields! { a = 2, b = 3 });
        assert_eq!(snapshot, fields! { a = 1 });
    }
    assert_eq!(snapshot, fields! { a = 1 });
}

#[test]
fn test_guard_restores_parent() {
    let outer = Context::bind(fields! { a = 1 });
    let outer_ctx = outer.context().clone();
    {
        let inner = Context::bind(fields! { b = 2 });
        assert_eq!(inner.context().parent(), Some(&outer_ctx));
        assert_eq!(inner.context().nesting_level(), outer_ctx.nesting_level() + 1);
        assert_eq!(Context::current().as_ref(), Some(inner.context()));
    }
    assert_eq!(Context::current(), Some(outer_ctx));
}

#[test]
#[should_panic(expected = "released out of order")]
fn test_out_of_order_release_is_fatal() {
    let outer = Context::bind(fields! { a = 1 });
    let _inner = Context::bind(fields! { b = 2 });
    drop(outer);
}

#[test]
fn test_context_equality_is_identity() {
    let a = Context::detached(fields! { k = 1 });
    let b = Context::detached(fields! { k = 1 });
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
    assert_ne!(a.context_id(), b.context_id());
}

#[test]
#[allow(clippy::mutable_key_type)]
fn test_context_hash() {
    use std::collections::HashMap;

    let a = Context::detached(fields! { k = 1 });
    let b = Context::detached(fields! { k = 1 });
    let mut map = HashMap::new();
    map.insert(a.clone(), "a");
    map.insert(b.clone(), "b");
    map.insert(a.clone(), "a2");
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&a), Some(&"a2"));
}

#[test]
fn test_context_display() {
    let root = Context::bind(fields! { ctx = "test" });
    let display = root.context().to_string();
    assert!(display.ends_with(r#"ctx="test""#), "{display}");

    let child = Context::bind(fields! { n = 1 });
    let display = child.context().to_string();
    assert!(display.starts_with("  "), "{display}");
    assert!(display.ends_with(r#"ctx="test" n=1"#), "{display}");
}

#[test_executors::async_test]
async fn test_apply_context_in_future() {
    async fn observe() -> Fields {
        Context::lookup_enclosing()
    }
    let future = {
        let _scope = Context::bind(fields! { request = 9 });
        ApplyContext::capture(observe())
    };
    // the binding scope is gone, the future still carries it
    assert!(Context::lookup_enclosing().is_empty());
    assert_eq!(future.await, fields! { request = 9 });
    assert!(Context::lookup_enclosing().is_empty());
}

#[test_executors::async_test]
async fn test_apply_context_keeps_scopes_across_await() {
    async fn yield_once() {
        let mut yielded = false;
        std::future::poll_fn(|cx| {
            if yielded {
                std::task::Poll::Ready(())
            } else {
                yielded = true;
                cx.waker().wake_by_ref();
                std::task::Poll::Pending
            }
        })
        .await
    }

    let work = async {
        let _scope = Context::bind(fields! { stage = "inner" });
        yield_once().await;
        Context::lookup_enclosing()
    };
    let seen = ApplyContext::new(fields! { request = 1 }, work).await;
    assert_eq!(seen, fields! { request = 1, stage = "inner" });
    assert!(Context::current().is_none());
}

#[test]
fn test_apply_context_dropped_while_pending() {
    let _outer = Context::bind(fields! { caller = "select" });
    let mut future = Box::pin(ApplyContext::new(fields! { request = 1 }, async {
        let _scope = Context::bind(fields! { stage = "waiting" });
        std::future::pending::<()>().await
    }));
    let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
    assert!(future.as_mut().poll(&mut cx).is_pending());
    assert_eq!(Context::lookup_enclosing(), fields! { caller = "select" });

    // the scope held inside the future is released under the future's context
    drop(future);
    assert_eq!(Context::lookup_enclosing(), fields! { caller = "select" });
}

#[test]
fn test_apply_context_dropped_while_pending_on_empty_thread() {
    std::thread::spawn(|| {
        let mut future = Box::pin(ApplyContext::new(fields! { request = 1 }, async {
            let _scope = Context::bind(fields! { stage = "waiting" });
            std::future::pending::<()>().await
        }));
        let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
        assert!(future.as_mut().poll(&mut cx).is_pending());
        drop(future);
        assert!(Context::current().is_none());
    })
    .join()
    .unwrap();
}

#[test]
fn test_apply_context_restores_after_panic() {
    std::thread::spawn(|| {
        let mut future = Box::pin(ApplyContext::new(fields! { request = 1 }, async {
            let _scope = Context::bind(fields! { stage = "failing" });
            panic!("job failed");
        }));
        let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
        let polled = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = future.as_mut().poll(&mut cx);
        }));
        assert!(polled.is_err());
        assert!(Context::current().is_none());
        assert!(Context::lookup_enclosing().is_empty());
        drop(future);
        assert!(Context::current().is_none());
    })
    .join()
    .unwrap();
}
