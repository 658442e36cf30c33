use ov_cache::{registry, Cache};

fn noop(_: i32) {}

// Both scenarios share process-wide `registry()` state, so they run as a
// single test to avoid racing another test's `free_all` call.
#[test]
fn cache_stats_and_teardown() {
    static CACHE: Cache<i32> = Cache::new("integration-full", noop);
    registry().extend(&CACHE, 1).unwrap();

    assert_eq!(CACHE.put(1), None);
    let before = CACHE.in_use();
    assert_eq!(CACHE.put(2), Some(2));
    assert_eq!(CACHE.in_use(), before);

    use std::sync::atomic::{AtomicUsize, Ordering};
    static DISPOSED: AtomicUsize = AtomicUsize::new(0);
    fn counting_disposer(_: i32) {
        DISPOSED.fetch_add(1, Ordering::SeqCst);
    }

    static TEARDOWN: Cache<i32> = Cache::new("integration-free-all", counting_disposer);
    registry().extend(&TEARDOWN, 4).unwrap();
    TEARDOWN.put(1);
    TEARDOWN.put(2);
    TEARDOWN.put(3);

    registry().free_all();
    assert_eq!(DISPOSED.load(Ordering::SeqCst), 3);
    assert_eq!(TEARDOWN.in_use(), 0);
}
