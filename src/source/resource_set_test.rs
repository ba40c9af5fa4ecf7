//! Tests for the set operations between snapshots.

#[cfg(test)]
mod tests {
    use crate::source::{ResourceKey, ResourceSet, Scope};
    use crate::value::{from_json, Value};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    const POD: &str = "/v1, Kind=Pod";
    const CONFIG_MAP: &str = "/v1, Kind=ConfigMap";

    fn ns(name: &str) -> Scope {
        Scope::Namespace(name.to_string())
    }

    fn keys(set: &ResourceSet) -> BTreeSet<ResourceKey> {
        set.keys().cloned().collect()
    }

    fn left() -> ResourceSet {
        let mut set = ResourceSet::new();
        set.add(Scope::Cluster, "/v1, Kind=Namespace", "default", from_json(r#"{"x":1}"#).unwrap())
            .add(ns("default"), CONFIG_MAP, "cm1", from_json(r#"{"data":{"a":"1"}}"#).unwrap())
            .add(ns("default"), POD, "web", from_json(r#"{"spec":{}}"#).unwrap())
            .add(ns("other"), POD, "worker", Value::Null);
        set
    }

    fn right() -> ResourceSet {
        let mut set = ResourceSet::new();
        set.add(ns("default"), CONFIG_MAP, "cm1", from_json(r#"{"data":{"a":"2"}}"#).unwrap())
            .add(ns("default"), POD, "web", from_json(r#"{"spec":{}}"#).unwrap())
            .add(ns("default"), POD, "api", from_json(r#"{"spec":{}}"#).unwrap());
        set
    }

    #[test]
    fn test_partitions_are_disjoint_and_cover_union() {
        let (a, b) = (left(), right());
        let left_only = keys(&a.except(&b));
        let right_only = keys(&b.except(&a));
        let both = keys(&a.intersect(&b));

        assert!(left_only.is_disjoint(&right_only));
        assert!(left_only.is_disjoint(&both));
        assert!(right_only.is_disjoint(&both));

        let union: BTreeSet<ResourceKey> = keys(&a).union(&keys(&b)).cloned().collect();
        let covered: BTreeSet<ResourceKey> = left_only
            .iter()
            .chain(right_only.iter())
            .chain(both.iter())
            .cloned()
            .collect();
        assert_eq!(covered, union);
    }

    #[test]
    fn test_intersect_keys_are_exact_intersection() {
        let (a, b) = (left(), right());
        let expected: BTreeSet<ResourceKey> = keys(&a).intersection(&keys(&b)).cloned().collect();
        assert_eq!(keys(&a.intersect(&b)), expected);
        assert_eq!(keys(&b.intersect(&a)), expected);
    }

    #[test]
    fn test_except_against_empty() {
        let mut a = ResourceSet::new();
        a.add(Scope::Cluster, POD, "a", from_json(r#"{"x":1}"#).unwrap());
        let b = ResourceSet::new();

        assert_eq!(a.except(&b), a);
        assert!(b.except(&a).is_empty());
        assert!(a.intersect(&b).is_empty());
        assert!(b.intersect(&a).is_empty());
    }

    #[test]
    fn test_except_is_asymmetric_and_carries_no_diff() {
        let (a, b) = (left(), right());
        let left_only = a.except(&b);
        let right_only = b.except(&a);

        assert_eq!(left_only.len(), 2);
        assert_eq!(right_only.len(), 1);
        assert!(right_only.get(&ns("default"), POD, "api").is_some());
        assert!(left_only.iter().all(|(_, entry)| entry.diff.is_none()));
        assert!(right_only.iter().all(|(_, entry)| entry.diff.is_none()));
    }

    #[test]
    fn test_intersect_attaches_diff_from_left() {
        let (a, b) = (left(), right());
        let both = a.intersect(&b);

        assert_eq!(both.len(), 2);

        let changed = both.get(&ns("default"), CONFIG_MAP, "cm1").unwrap();
        assert_eq!(changed.object, from_json(r#"{"data":{"a":"1"}}"#).unwrap());
        assert!(changed.is_modified());
        assert_eq!(changed.diff.as_ref().unwrap().to_string(), "~ .data.a");

        let same = both.get(&ns("default"), POD, "web").unwrap();
        assert!(same.diff.is_some());
        assert!(!same.is_modified());
    }

    #[test]
    fn test_intersect_keeps_left_payload_whichever_side_is_smaller() {
        let mut small = ResourceSet::new();
        small.add(Scope::Cluster, POD, "a", Value::Int(1));
        let mut large = ResourceSet::new();
        large
            .add(Scope::Cluster, POD, "a", Value::Int(2))
            .add(Scope::Cluster, POD, "b", Value::Int(3));

        let from_large = large.intersect(&small);
        let entry = from_large.get(&Scope::Cluster, POD, "a").unwrap();
        assert_eq!(entry.object, Value::Int(2));
        assert_eq!(
            entry.diff.as_ref().unwrap().deltas()[0].change,
            crate::delta::Change::Modified {
                old: Value::Int(2),
                new: Value::Int(1)
            }
        );
    }

    #[test]
    fn test_operations_do_not_mutate_inputs() {
        let (a, b) = (left(), right());
        let (a_before, b_before) = (a.clone(), b.clone());
        let _ = a.except(&b);
        let _ = a.intersect(&b);
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }
}
