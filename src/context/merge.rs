// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context merge policy.

use super::fields::Fields;

/// Combines an inherited context with newly supplied fields.
///
/// The result equals `base` with every key of `overrides` set to the override's value.
/// Neither input is modified.  Chaining left to right through nested scopes reproduces
/// "innermost wins".
///
/// ```
/// use contextlog::{fields, merge};
/// let outer = fields! { ctx = "test", who = "outer" };
/// let inner = fields! { who = "inner" };
/// let merged = merge(&outer, &inner);
/// assert_eq!(merged, fields! { ctx = "test", who = "inner" });
/// ```
pub fn merge(base: &Fields, overrides: &Fields) -> Fields {
    //either side empty: share storage instead of copying
    if overrides.is_empty() {
        return base.clone();
    }
    if base.is_empty() {
        return overrides.clone();
    }
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k, v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use crate::fields;

    #[test]
    fn override_wins_else_base() {
        let a = fields! { k1 = 1, k2 = 2 };
        let b = fields! { k2 = 20, k3 = 30 };
        let m = merge(&a, &b);
        for key in ["k1", "k2", "k3"] {
            let expected = b.get(key).or_else(|| a.get(key));
            assert_eq!(m.get(key), expected, "key {key}");
        }
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn inputs_untouched() {
        let a = fields! { k = "a" };
        let b = fields! { k = "b" };
        let _ = merge(&a, &b);
        assert_eq!(a.get("k"), Some(&Value::from("a")));
        assert_eq!(b.get("k"), Some(&Value::from("b")));
    }

    #[test]
    fn empty_sides_share() {
        let a = fields! { k = 1 };
        let empty = Fields::new();
        assert!(merge(&a, &empty).ptr_eq(&a));
        assert!(merge(&empty, &a).ptr_eq(&a));
    }

    #[test]
    fn nested_chain_innermost_wins() {
        let outer = fields! { ctx = "test", level = "outer" };
        let middle = fields! { level = "middle", step = 1 };
        let inner = fields! { step = 2 };
        let resolved = merge(&merge(&outer, &middle), &inner);
        assert_eq!(
            resolved,
            fields! { ctx = "test", level = "middle", step = 2 }
        );
    }
}
