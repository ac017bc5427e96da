//! Time ordering for report output.

/// Index permutation that visits `keys` in ascending order.
///
/// Equal keys keep their original relative order, so callers get a
/// deterministic result even when two events share a timestamp.
pub fn time_order<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]).then(a.cmp(&b)));
    order
}

/// Consume `(key, payload)` pairs and return the payloads in key order.
pub fn in_time_order<K: Ord, T>(mut items: Vec<(K, T)>) -> Vec<T> {
    // `sort_by` is stable: ties stay in insertion order.
    items.sort_by(|a, b| a.0.cmp(&b.0));
    items.into_iter().map(|(_, payload)| payload).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::testutil::at;

    #[test]
    fn test_time_order_ascending() {
        let keys = vec![at(30.0), at(10.0), at(20.0)];
        assert_eq!(time_order(&keys), vec![1, 2, 0]);
    }

    #[test]
    fn test_time_order_ties_keep_insertion_order() {
        let keys = vec![at(5.0), at(1.0), at(5.0), at(1.0)];
        assert_eq!(time_order(&keys), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_time_order_empty_and_single() {
        let empty: Vec<i64> = Vec::new();
        assert!(time_order(&empty).is_empty());
        assert_eq!(time_order(&[42]), vec![0]);
    }

    #[test]
    fn test_in_time_order_payloads() {
        let items = vec![(at(2.0), "b"), (at(1.0), "a"), (at(2.0), "c")];
        assert_eq!(in_time_order(items), vec!["a", "b", "c"]);
    }
}
