//! Tests for the transform registry

use std::sync::Arc;

use polish::rewrite::TransformRegistry;

fn upper(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    Ok(input.to_ascii_uppercase())
}

fn lower(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    Ok(input.to_ascii_lowercase())
}

#[test]
fn lookup_finds_registered_type() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", upper);

    let transform = registry.lookup("text/html").unwrap();
    assert_eq!(transform(b"abc").unwrap(), b"ABC");
}

#[test]
fn lookup_misses_unregistered_type() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", upper);

    assert!(registry.lookup("text/css").is_none());
    assert!(registry.lookup("").is_none());
}

#[test]
fn lookup_strips_parameters_and_whitespace() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", upper);

    assert!(registry.lookup("text/html; charset=utf-8").is_some());
    assert!(registry.lookup("  text/html  ").is_some());
}

#[test]
fn lookup_is_case_insensitive() {
    let mut registry = TransformRegistry::new();
    registry.register("Text/HTML", upper);

    assert!(registry.lookup("text/html").is_some());
    assert!(registry.lookup("TEXT/HTML; charset=utf-8").is_some());
}

#[test]
fn no_wildcard_matching() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", upper);

    assert!(registry.lookup("text/htm").is_none());
    assert!(registry.lookup("text/html2").is_none());
    assert!(registry.lookup("text").is_none());
}

#[test]
fn last_registration_wins() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", upper);
    registry.register("text/html", lower);

    assert_eq!(registry.len(), 1);
    let transform = registry.lookup("text/html").unwrap();
    assert_eq!(transform(b"AbC").unwrap(), b"abc");
}

#[test]
fn shared_registry_supports_concurrent_lookup() {
    let mut registry = TransformRegistry::new();
    registry.register("text/html", upper);
    registry.register("text/css", lower);
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    assert!(registry.lookup("text/html").is_some());
                    assert!(registry.lookup("text/css").is_some());
                    assert!(registry.lookup("image/png").is_none());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
