use super::*;
use std::sync::Arc;

#[test]
fn set_then_get_returns_last_write() {
    let cell = SyncCell::new(0.7f32);
    cell.set(0.25);
    assert_eq!(cell.get(), 0.25);
    assert_eq!(cell.replace(1.0), 0.25);
    assert_eq!(cell.update(|v| v / 2.0), 0.5);
    assert_eq!(cell.get(), 0.5);
}

#[test]
fn concurrent_writers_never_tear_values() {
    let cell = Arc::new(SyncCell::new((0u64, 0u64)));
    let writers: Vec<_> = (0..4u64)
        .map(|w| {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || {
                for i in 0..1000u64 {
                    let v = w * 10_000 + i;
                    cell.set((v, v));
                }
            })
        })
        .collect();

    for _ in 0..1000 {
        let (a, b) = cell.get();
        assert_eq!(a, b);
    }
    for w in writers {
        w.join().unwrap();
    }
}
