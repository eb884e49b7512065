use super::util::{RecordingStore, chunking, init_logger, seeded};
use crate::command::Command;
use crate::config::NativesConfig;
use crate::set::Operand;
use crate::error::Error;
use crate::set::BoundSet;
use crate::store::MemoryStore;
use futures::{StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_new_does_not_touch_the_store() {
    init_logger();
    let store = MemoryStore::new();
    let s: BoundSet<i32, _> = BoundSet::new(store.clone(), "lazy");
    assert!(store.keys().is_empty());
    assert!(s.is_empty().await.expect("is_empty"));
    assert_eq!(format!("{:?}", s), "BoundSet { key: \"lazy\" }");
}

#[tokio::test]
async fn test_add_contains_len() {
    let s = seeded::<i32>("s", vec![]).await;
    assert!(s.add(&1).await.expect("add"));
    assert!(s.add(&2).await.expect("add"));
    assert!(!s.add(&2).await.expect("add again"));
    assert_eq!(s.len().await.expect("len"), 2);
    assert!(s.contains(&1).await.expect("contains"));
    assert!(!s.contains(&3).await.expect("contains"));
}

#[tokio::test]
async fn test_remove_missing_element_fails() {
    let s = seeded("s", vec!["a".to_string()]).await;
    s.remove(&"a".to_string()).await.expect("remove");
    let err = s.remove(&"a".to_string()).await.unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { ref key, .. } if key == "s"));
}

#[tokio::test]
async fn test_discard_is_quiet() {
    let s = seeded("s", vec![1u8]).await;
    assert!(!s.discard(&9).await.expect("discard"));
    assert!(s.discard(&1).await.expect("discard"));
    assert!(s.store().keys().is_empty());
}

#[tokio::test]
async fn test_pop_peek_keeps_length() {
    let s = seeded("s", vec![1, 2, 3]).await;
    let peeked = s.pop(true).await.expect("peek");
    assert!([1, 2, 3].contains(&peeked));
    assert_eq!(s.len().await.expect("len"), 3);

    let popped = s.pop(false).await.expect("pop");
    assert_eq!(s.len().await.expect("len"), 2);
    assert!(!s.contains(&popped).await.expect("contains"));
}

#[tokio::test]
async fn test_pop_empty_fails() {
    let s = seeded::<i32>("s", vec![]).await;
    assert!(matches!(s.pop(true).await, Err(Error::ElementNotFound { .. })));
    assert!(matches!(s.pop(false).await, Err(Error::ElementNotFound { .. })));
    assert_eq!(s.grab().await.expect("grab"), None);
}

#[tokio::test]
async fn test_grab_returns_a_member() {
    let s = seeded("s", vec!['x']).await;
    assert_eq!(s.grab().await.expect("grab"), Some('x'));
    assert_eq!(s.len().await.expect("len"), 1);
}

#[tokio::test]
async fn test_clear_and_type_mismatch() {
    let s = seeded("s", vec![1, 2]).await;
    s.clear().await.expect("clear");
    assert!(s.store().keys().is_empty());
    s.clear().await.expect("clear missing key");

    s.store().set_string("s", b"plain");
    let err = s.clear().await.unwrap_err();
    assert!(err.is_type_mismatch());
    assert!(matches!(s.add(&3).await, Err(Error::TypeMismatch { .. })));
    assert!(s.members().await.unwrap_err().is_type_mismatch());
    assert!(s.len().await.unwrap_err().is_type_mismatch());
    assert_eq!(s.store().keys(), vec!["s".to_string()]);
}

#[tokio::test]
async fn test_copy_to_binds_new_key() {
    let s = seeded("s", vec![1, 2]).await;
    let copy = s.copy_to("copy").await.expect("copy");
    assert_eq!(copy.key(), "copy");
    assert_eq!(copy.members().await.expect("members"), HashSet::from([1, 2]));

    copy.add(&3).await.expect("add");
    assert_eq!(s.len().await.expect("len"), 2);
    assert!(copy.same_members(&copy.clone()).await.expect("same"));
    assert!(!copy.same_members(&s).await.expect("same"));
}

#[tokio::test]
async fn test_iter_refetches_on_each_call() {
    let s = seeded("s", vec![1, 2]).await;
    let stream = s.iter();
    s.add(&3).await.expect("add");
    let first: HashSet<i32> = stream.try_collect().await.expect("collect");
    assert_eq!(first, HashSet::from([1, 2, 3]));

    s.remove(&1).await.expect("remove");
    let second: Vec<i32> = s.iter().map(|r| r.expect("element")).collect().await;
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn test_iter_surfaces_decode_errors() {
    let s = seeded("s", vec!["7".to_string(), "x".to_string()]).await;
    let numbers: BoundSet<i32, _> = BoundSet::new(s.store().clone(), "s");
    let collected: Result<Vec<i32>, Error> = numbers.iter().try_collect().await;
    assert!(matches!(collected, Err(Error::Conversion(_))));
}

#[tokio::test]
async fn test_equals_and_repr() {
    let s = seeded("s", vec![3, 1, 2]).await;
    assert!(s.equals(&HashSet::from([1, 2, 3])).await.expect("equals"));
    assert!(!s.equals(&HashSet::from([1, 2])).await.expect("equals"));
    assert_eq!(s.repr().await.expect("repr"), "{1, 2, 3}");

    let words = seeded("w", vec!["b".to_string(), "a".to_string()]).await;
    assert_eq!(words.repr().await.expect("repr"), "{\"a\", \"b\"}");
}

#[tokio::test]
async fn test_with_members_adds_to_existing_content() {
    let s = seeded("s", vec![1]).await;
    let again = BoundSet::with_members(s.store().clone(), "s", vec![2, 3]).await.expect("seed");
    assert_eq!(again.members().await.expect("members"), HashSet::from([1, 2, 3]));
}

#[tokio::test]
async fn test_with_members_config_uses_the_given_config() {
    init_logger();
    let store = RecordingStore::default();
    let s = BoundSet::with_members_config(store.clone(), "s", chunking(2), vec![1, 2, 3, 4, 5])
        .await
        .expect("seed");
    let sadds: Vec<usize> = store
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::SAdd { members, .. } => Some(members.len()),
            _ => None,
        })
        .collect();
    assert_eq!(sadds, vec![2, 2, 1]);
    assert_eq!(s.len().await.expect("len"), 5);

    let config = Arc::new(NativesConfig {
        temp_key_prefix: "custom:".to_string(),
        ..NativesConfig::default()
    });
    let t = BoundSet::with_members_config(store.clone(), "t", config, vec![1, 2, 3])
        .await
        .expect("seed");
    t.intersection_update(&[Operand::from(vec![2, 3])]).await.expect("intersection_update");
    let staged: Vec<String> = store
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::SAdd { key, .. } if key != "s" && key != "t" => Some(key.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(staged.len(), 1);
    assert!(staged[0].starts_with("custom:"));
    assert_eq!(t.members().await.expect("members"), HashSet::from([2, 3]));
    assert_eq!(store.inner.keys().len(), 2);
}
