//! Unit tests for environment helpers.

use super::*;
use std::sync::{Arc, Barrier};
use std::thread;

fn env_value(key: &str) -> String {
    match std::env::var(key) {
        Ok(value) => value,
        Err(err) => panic!("expected environment variable {key}: {err}"),
    }
}

fn seed(key: &str, value: Option<&str>) {
    with_lock(|| match value {
        // SAFETY: `ENV_MUTEX` is held via `with_lock`.
        Some(text) => unsafe { env_set_var(key, OsStr::new(text)) },
        // SAFETY: `ENV_MUTEX` is held via `with_lock`.
        None => unsafe { env_remove_var(key) },
    });
}

#[test]
fn set_var_restores_original() {
    let key = "WEAVER_HELPERS_SET_VAR";
    seed(key, Some("orig"));
    {
        let _guard = set_var(key, "temp");
        assert_eq!(env_value(key), "temp");
    }
    assert_eq!(env_value(key), "orig");
    seed(key, None);
}

#[test]
fn remove_var_restores_value() {
    let key = "WEAVER_HELPERS_REMOVE_VAR";
    seed(key, Some("present"));
    {
        let _guard = remove_var(key);
        assert!(std::env::var(key).is_err());
    }
    assert_eq!(env_value(key), "present");
    seed(key, None);
}

#[test]
fn guards_restore_in_lifo_order() {
    let key = "WEAVER_HELPERS_STACKING";
    seed(key, None);
    let outer = set_var(key, "v1");
    let inner = set_var(key, "v2");
    assert_eq!(env_value(key), "v2");
    drop(inner);
    assert_eq!(env_value(key), "v1");
    drop(outer);
    assert!(std::env::var(key).is_err());
}

#[test]
fn lock_allows_nested_mutations() {
    let key = "WEAVER_HELPERS_LOCKED";
    seed(key, None);
    {
        let lock = lock();
        let _set = lock.set_var(key, "held");
        let _nested = set_var(key, "nested");
        assert_eq!(env_value(key), "nested");
    }
    assert!(std::env::var(key).is_err());
}

#[test]
fn concurrent_mutations_restore_values() {
    const THREADS: usize = 4;
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let key = format!("WEAVER_HELPERS_CONCURRENT_{i}");
            seed(&key, Some("original"));
            let wait = Arc::clone(&barrier);
            thread::spawn(move || {
                wait.wait();
                for iter in 0..8 {
                    let value = format!("value-{iter}");
                    let guard = set_var(key.as_str(), &value);
                    assert_eq!(env_value(&key), value);
                    drop(guard);
                    assert_eq!(env_value(&key), "original");
                }
                key
            })
        })
        .collect();
    for handle in handles {
        let key = handle.join().expect("worker thread panicked");
        seed(&key, None);
    }
}
