use std::sync::Arc;

use crate::foundation::core::RenderSize;
use crate::foundation::error::{MixplayError, MixplayResult};

/// Pixel layouts exchanged between decode and render stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 8-bit full-range YUV 4:2:0, Y plane followed by one interleaved UV plane.
    Nv12,
    /// 8-bit full-range YUV 4:2:0, Y, U and V planes.
    I420,
    /// Packed 8-bit RGBA, straight alpha.
    Rgba8,
    /// Packed 8-bit BGRA, straight alpha.
    Bgra8,
}

impl PixelFormat {
    /// Return `true` for the planar YUV layouts.
    pub fn is_planar_yuv(self) -> bool {
        matches!(self, Self::Nv12 | Self::I420)
    }

    /// Tightly packed byte length of one `width x height` image.
    pub fn buffer_len(self, width: u32, height: u32) -> usize {
        let (w, h) = (width as usize, height as usize);
        match self {
            Self::Rgba8 | Self::Bgra8 => w.saturating_mul(h).saturating_mul(4),
            Self::Nv12 | Self::I420 => {
                let (cw, ch) = chroma_dims(width, height);
                w.saturating_mul(h) + 2 * cw * ch
            }
        }
    }

    /// Name as used by `ffmpeg -pix_fmt`.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            Self::Nv12 => "nv12",
            Self::I420 => "yuv420p",
            Self::Rgba8 => "rgba",
            Self::Bgra8 => "bgra",
        }
    }
}

fn chroma_dims(width: u32, height: u32) -> (usize, usize) {
    (width.div_ceil(2) as usize, height.div_ceil(2) as usize)
}

/// One decoded picture in a known pixel format.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Layout of `data`.
    pub format: PixelFormat,
    /// Tightly packed pixel bytes, row-major.
    pub data: Arc<Vec<u8>>,
}

impl VideoFrame {
    /// Wrap decoded bytes, checking the length against the format.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> MixplayResult<Self> {
        let expected = format.buffer_len(width, height);
        if data.len() != expected {
            return Err(MixplayError::render(format!(
                "{format:?} frame {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data: Arc::new(data),
        })
    }

    /// Frame of one straight-alpha RGBA colour.
    pub fn solid_rgba(size: RenderSize, rgba: [u8; 4]) -> Self {
        Self {
            width: size.width,
            height: size.height,
            format: PixelFormat::Rgba8,
            data: Arc::new(rgba.repeat(size.pixel_count())),
        }
    }

    /// Frame dimensions.
    pub fn size(&self) -> RenderSize {
        RenderSize::new(self.width, self.height)
    }

    /// Convert to packed straight-alpha RGBA8 bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba8 => self.data.as_ref().clone(),
            PixelFormat::Bgra8 => swap_red_blue(&self.data),
            PixelFormat::Nv12 | PixelFormat::I420 => yuv420_to_rgba8(self),
        }
    }

    /// Convert into `format`, sharing the buffer when no conversion is needed.
    pub fn to_format(&self, format: PixelFormat) -> MixplayResult<Self> {
        if format == self.format {
            return Ok(self.clone());
        }
        let rgba = self.to_rgba8();
        Self::new(
            self.width,
            self.height,
            format,
            rgba8_to_format(&rgba, self.width, self.height, format),
        )
    }

    /// RGBA value of the pixel at `(x, y)`, converting from YUV when needed.
    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let (w, h) = (self.width as usize, self.height as usize);
        let (xs, ys) = (x as usize, y as usize);
        let i = (ys * w + xs) * 4;
        let d = self.data.as_ref();
        Some(match self.format {
            PixelFormat::Rgba8 => [d[i], d[i + 1], d[i + 2], d[i + 3]],
            PixelFormat::Bgra8 => [d[i + 2], d[i + 1], d[i], d[i + 3]],
            PixelFormat::Nv12 | PixelFormat::I420 => {
                let (u, v) = chroma_at(self, xs / 2, ys / 2, w, h);
                let (r, g, b) = yuv_to_rgb(d[ys * w + xs], u, v);
                [r, g, b, 255]
            }
        })
    }
}

fn chroma_at(frame: &VideoFrame, cx: usize, cy: usize, w: usize, h: usize) -> (u8, u8) {
    let (cw, ch) = chroma_dims(frame.width, frame.height);
    let d = frame.data.as_ref();
    let y_len = w * h;
    match frame.format {
        PixelFormat::Nv12 => {
            let i = y_len + (cy * cw + cx) * 2;
            (d[i], d[i + 1])
        }
        _ => {
            let i = cy * cw + cx;
            (d[y_len + i], d[y_len + cw * ch + i])
        }
    }
}

fn swap_red_blue(src: &[u8]) -> Vec<u8> {
    let mut out = src.to_vec();
    for px in out.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    out
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Full-range BT.601 YUV to RGB, 16.16 fixed point.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = i32::from(y);
    let u = i32::from(u) - 128;
    let v = i32::from(v) - 128;
    let r = y + ((91_881 * v + 32_768) >> 16);
    let g = y - ((22_554 * u + 46_802 * v + 32_768) >> 16);
    let b = y + ((116_130 * u + 32_768) >> 16);
    (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

/// Full-range BT.601 RGB to YUV, 16.16 fixed point.
fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let y = (19_595 * r + 38_470 * g + 7_471 * b + 32_768) >> 16;
    let u = ((-11_059 * r - 21_709 * g + 32_768 * b + 32_768) >> 16) + 128;
    let v = ((32_768 * r - 27_439 * g - 5_329 * b + 32_768) >> 16) + 128;
    (clamp_u8(y), clamp_u8(u), clamp_u8(v))
}

fn yuv420_to_rgba8(frame: &VideoFrame) -> Vec<u8> {
    let (w, h) = (frame.width as usize, frame.height as usize);
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let d = frame.data.as_ref();
    let mut out = vec![0u8; w * h * 4];
    for (ys, row) in out.chunks_exact_mut(w * 4).enumerate() {
        for (xs, px) in row.chunks_exact_mut(4).enumerate() {
            let (u, v) = chroma_at(frame, xs / 2, ys / 2, w, h);
            let (r, g, b) = yuv_to_rgb(d[ys * w + xs], u, v);
            px.copy_from_slice(&[r, g, b, 255]);
        }
    }
    out
}

/// Convert packed RGBA8 bytes into `format`.
///
/// YUV targets drop alpha and average chroma over each 2x2 block.
pub fn rgba8_to_format(rgba: &[u8], width: u32, height: u32, format: PixelFormat) -> Vec<u8> {
    match format {
        PixelFormat::Rgba8 => rgba.to_vec(),
        PixelFormat::Bgra8 => swap_red_blue(rgba),
        PixelFormat::Nv12 | PixelFormat::I420 => rgba8_to_yuv420(rgba, width, height, format),
    }
}

fn rgba8_to_yuv420(rgba: &[u8], width: u32, height: u32, format: PixelFormat) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let (cw, ch) = chroma_dims(width, height);
    let mut out = vec![0u8; format.buffer_len(width, height)];
    let (y_plane, chroma) = out.split_at_mut(w * h);

    for ys in 0..h {
        for xs in 0..w {
            let i = (ys * w + xs) * 4;
            y_plane[ys * w + xs] = rgb_to_yuv(rgba[i], rgba[i + 1], rgba[i + 2]).0;
        }
    }

    for cy in 0..ch {
        for cx in 0..cw {
            let (mut su, mut sv, mut n) = (0u32, 0u32, 0u32);
            for ys in (cy * 2)..((cy * 2 + 2).min(h)) {
                for xs in (cx * 2)..((cx * 2 + 2).min(w)) {
                    let i = (ys * w + xs) * 4;
                    let (_, u, v) = rgb_to_yuv(rgba[i], rgba[i + 1], rgba[i + 2]);
                    su += u32::from(u);
                    sv += u32::from(v);
                    n += 1;
                }
            }
            let (u, v) = (((su + n / 2) / n) as u8, ((sv + n / 2) / n) as u8);
            match format {
                PixelFormat::Nv12 => {
                    chroma[(cy * cw + cx) * 2] = u;
                    chroma[(cy * cw + cx) * 2 + 1] = v;
                }
                _ => {
                    chroma[cy * cw + cx] = u;
                    chroma[cw * ch + cy * cw + cx] = v;
                }
            }
        }
    }
    out
}

/// Outcome of matching a source's decodable formats against a compositor's accepted ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NegotiatedFormat {
    /// Format the source decodes into.
    pub decode: PixelFormat,
    /// Format handed to the compositor.
    pub deliver: PixelFormat,
}

impl NegotiatedFormat {
    /// Return `true` when frames are converted between decode and delivery.
    pub fn needs_conversion(self) -> bool {
        self.decode != self.deliver
    }
}

/// Pick the first compositor-accepted format the source decodes natively.
///
/// Falls back to decoding in the source's preferred format and converting to the compositor's
/// preferred one. Returns `None` when either side declares nothing.
pub fn negotiate_format(accepted: &[PixelFormat], native: &[PixelFormat]) -> Option<NegotiatedFormat> {
    if let Some(&f) = accepted.iter().find(|f| native.contains(f)) {
        return Some(NegotiatedFormat {
            decode: f,
            deliver: f,
        });
    }
    Some(NegotiatedFormat {
        decode: *native.first()?,
        deliver: *accepted.first()?,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/format.rs"]
mod tests;
