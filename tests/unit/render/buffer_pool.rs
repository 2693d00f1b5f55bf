use super::*;

#[test]
fn pool_reuses_and_zeroes_buffers() {
    let mut p = PixelBufferPool::new(BufferPoolOpts::default());
    let mut a = p.acquire(2, 2, PixelFormat::Rgba8);
    assert_eq!(a.len(), 16);
    a.fill(7);
    p.release(2, 2, PixelFormat::Rgba8, a);

    let b = p.acquire(2, 2, PixelFormat::Rgba8);
    assert!(b.iter().all(|&v| v == 0));
    assert_eq!(p.stats().alloc_buffers, 1);
    assert_eq!(p.stats().retained_buffers, 0);
}

#[test]
fn pool_honors_bucket_cap() {
    let mut p = PixelBufferPool::new(BufferPoolOpts {
        max_pool_bytes: 1 << 30,
        max_buffers_per_bucket: 1,
    });
    let a = p.acquire(8, 8, PixelFormat::Rgba8);
    let b = p.acquire(8, 8, PixelFormat::Rgba8);
    p.release(8, 8, PixelFormat::Rgba8, a);
    p.release(8, 8, PixelFormat::Rgba8, b);

    let st = p.stats();
    assert_eq!(st.retained_buffers, 1);
    assert_eq!(st.dropped_on_release, 1);
}

#[test]
fn pool_honors_global_byte_cap() {
    let bytes_8x8 = PixelFormat::Rgba8.buffer_len(8, 8);
    let mut p = PixelBufferPool::new(BufferPoolOpts {
        max_pool_bytes: bytes_8x8,
        max_buffers_per_bucket: 8,
    });
    let a = p.acquire(8, 8, PixelFormat::Rgba8);
    let b = p.acquire(8, 8, PixelFormat::Rgba8);
    p.release(8, 8, PixelFormat::Rgba8, a);
    p.release(8, 8, PixelFormat::Rgba8, b);

    let st = p.stats();
    assert_eq!(st.retained_bytes, bytes_8x8);
    assert_eq!(st.retained_buffers, 1);
    assert!(st.dropped_on_release >= 1);
}

#[test]
fn pool_drops_foreign_sized_buffers() {
    let mut p = PixelBufferPool::new(BufferPoolOpts::default());
    p.release(4, 4, PixelFormat::Rgba8, vec![0; 3]);
    assert_eq!(p.stats().retained_buffers, 0);
    assert_eq!(p.stats().dropped_on_release, 1);
}
