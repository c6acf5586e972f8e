use std::time::{Duration, Instant};
use tag_overlay::markers::{MarkerStore, TagMarker, MARKER_TTL};

fn marker(id: &str, placed_at: Instant) -> TagMarker {
    TagMarker { id: id.into(), x: 100.0, y: 200.0, placed_at, sketch_preview: None }
}

#[test]
fn expired_markers_are_gone_after_the_next_sweep_tick() {
    let mut store = MarkerStore::default();
    let start = Instant::now();
    store.push(marker("stale", start));
    store.push(marker("fresh", start + Duration::from_millis(2500)));

    // First tick establishes the sweep cadence.
    store.tick(start + Duration::from_millis(2600));
    assert_eq!(store.markers().len(), 2);

    // Next tick falls after "stale" passed its TTL but before "fresh" does.
    store.tick(start + MARKER_TTL + Duration::from_millis(700));
    let ids: Vec<&str> = store.markers().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["fresh"]);
}

#[test]
fn custom_ttl_from_settings_is_honored() {
    let mut store = MarkerStore::with_ttl(Duration::from_millis(500));
    let start = Instant::now();
    store.push(marker("short_lived", start));

    assert_eq!(store.sweep(start + Duration::from_millis(400)), 0);
    assert_eq!(store.sweep(start + Duration::from_millis(600)), 1);
    assert!(store.is_empty());
}
