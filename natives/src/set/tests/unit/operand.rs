use crate::set::{BoundSet, Operand, classify};
use crate::store::MemoryStore;
use std::collections::HashSet;

#[test]
fn test_classify_preserves_order() {
    let store = MemoryStore::new();
    let a: BoundSet<i32, _> = BoundSet::new(store.clone(), "a");
    let b: BoundSet<i32, _> = BoundSet::new(store, "b");
    let first = HashSet::from([1, 2]);

    let operands = [
        Operand::from(&first),
        Operand::from(&b),
        Operand::from(vec![3]),
        Operand::from(&a),
        Operand::from([4, 4]),
    ];
    let classified = classify(&operands);

    assert!(classified.has_remotes());
    assert_eq!(classified.remote_keys, vec!["b", "a"]);
    assert_eq!(classified.locals.len(), 3);
    assert_eq!(classified.locals[0], &first);
    assert_eq!(classified.locals[1], &HashSet::from([3]));
    assert_eq!(classified.locals[2], &HashSet::from([4]));
}

#[test]
fn test_classify_locals_only() {
    let operands: Vec<Operand<'_, String, MemoryStore>> = vec![Operand::local(["x".to_string()])];
    let classified = classify(&operands);
    assert!(!classified.has_remotes());
    assert_eq!(classified.locals.len(), 1);
}
