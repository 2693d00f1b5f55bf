use super::*;

#[test]
fn buffer_len_accounts_for_odd_chroma() {
    assert_eq!(PixelFormat::Rgba8.buffer_len(3, 2), 24);
    assert_eq!(PixelFormat::Nv12.buffer_len(4, 4), 16 + 8);
    assert_eq!(PixelFormat::I420.buffer_len(3, 3), 9 + 2 * 4);
}

#[test]
fn new_rejects_wrong_length() {
    let err = VideoFrame::new(2, 2, PixelFormat::Rgba8, vec![0; 15]).unwrap_err();
    assert!(err.to_string().contains("render error:"));
}

#[test]
fn white_and_black_survive_yuv_roundtrip() {
    for rgba in [[255, 255, 255, 255], [0, 0, 0, 255]] {
        let frame = VideoFrame::solid_rgba(RenderSize::new(4, 2), rgba);
        for fmt in [PixelFormat::Nv12, PixelFormat::I420] {
            let yuv = frame.to_format(fmt).unwrap();
            assert_eq!(yuv.format, fmt);
            assert_eq!(yuv.to_rgba8(), frame.to_rgba8());
            assert_eq!(yuv.pixel_rgba(3, 1), Some(rgba));
        }
    }
}

#[test]
fn mid_grey_roundtrip_is_close() {
    let frame = VideoFrame::solid_rgba(RenderSize::new(2, 2), [30, 120, 200, 255]);
    let back = frame.to_format(PixelFormat::Nv12).unwrap().to_rgba8();
    for (a, b) in back.chunks_exact(4).zip(frame.to_rgba8().chunks_exact(4)) {
        for c in 0..3 {
            assert!((i32::from(a[c]) - i32::from(b[c])).abs() <= 2);
        }
    }
}

#[test]
fn bgra_swaps_channels() {
    let frame = VideoFrame::solid_rgba(RenderSize::new(1, 1), [1, 2, 3, 4]);
    let bgra = frame.to_format(PixelFormat::Bgra8).unwrap();
    assert_eq!(bgra.data.as_slice(), &[3, 2, 1, 4]);
    assert_eq!(bgra.pixel_rgba(0, 0), Some([1, 2, 3, 4]));
}

#[test]
fn same_format_conversion_shares_buffer() {
    let frame = VideoFrame::solid_rgba(RenderSize::new(2, 2), [9, 9, 9, 9]);
    let same = frame.to_format(PixelFormat::Rgba8).unwrap();
    assert!(Arc::ptr_eq(&frame.data, &same.data));
}

#[test]
fn negotiation_prefers_native_match_then_converts() {
    let accepted = [PixelFormat::Nv12, PixelFormat::Rgba8];
    let n = negotiate_format(&accepted, &[PixelFormat::Rgba8]).unwrap();
    assert_eq!(n.decode, PixelFormat::Rgba8);
    assert!(!n.needs_conversion());

    let n = negotiate_format(&accepted, &[PixelFormat::Bgra8]).unwrap();
    assert_eq!(n.decode, PixelFormat::Bgra8);
    assert_eq!(n.deliver, PixelFormat::Nv12);
    assert!(n.needs_conversion());

    assert!(negotiate_format(&accepted, &[]).is_none());
}

#[test]
fn zero_sized_yuv_converts_to_an_empty_frame() {
    for (w, h) in [(0, 4), (4, 0), (0, 0)] {
        let f = VideoFrame::new(w, h, PixelFormat::Nv12, vec![0; PixelFormat::Nv12.buffer_len(w, h)])
            .unwrap();
        assert!(f.to_rgba8().is_empty());
        assert!(f.to_format(PixelFormat::Rgba8).unwrap().data.is_empty());
    }
}
