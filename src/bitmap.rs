//! # 图片解码服务
//!
//! 主题里的背景图 / 高亮图通过注入的 [`ImageDecoder`] 解码，
//! 统一转换成预乘 alpha 的 RGBA 像素缓冲（`tiny_skia::Pixmap`）。
//! 不使用进程级单例，测试时可以换成内存解码器。

use std::path::Path;
use log::debug;
use tiny_skia::{ColorU8, Pixmap};
use crate::error::{CandError, Result};

/// 图片解码服务：文件路径 → 预乘 alpha 位图
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<Pixmap>;
}

/// 基于 `image` crate 的解码器（PNG / JPEG / BMP）
#[derive(Debug, Default, Clone, Copy)]
pub struct CodecDecoder;

impl ImageDecoder for CodecDecoder {
    fn decode(&self, path: &Path) -> Result<Pixmap> {
        let decoded = image::open(path).map_err(|e| CandError::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        let (w, h) = rgba.dimensions();
        debug!("[Bitmap] 解码 {:?} {}x{}", path, w, h);
        straight_to_premultiplied(w, h, rgba.as_raw()).ok_or_else(|| CandError::ImageDecode {
            path: path.to_path_buf(),
            reason: format!("无效的位图尺寸 {}x{}", w, h),
        })
    }
}

/// 非预乘 RGBA 字节 → 预乘 `Pixmap`。尺寸为零或字节数不匹配时返回 `None`。
pub fn straight_to_premultiplied(width: u32, height: u32, rgba: &[u8]) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    if rgba.len() != pixmap.pixels().len() * 4 {
        return None;
    }
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premultiply() {
        let px = straight_to_premultiplied(1, 1, &[255, 128, 0, 128]).unwrap();
        let c = px.pixels()[0];
        assert_eq!(c.alpha(), 128);
        assert_eq!(c.red(), 128);
        assert_eq!(c.blue(), 0);
        assert!(c.green() <= 128);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        assert!(straight_to_premultiplied(2, 2, &[0; 4]).is_none());
        assert!(straight_to_premultiplied(0, 2, &[]).is_none());
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let err = CodecDecoder.decode(Path::new("/nonexistent/bg.png")).unwrap_err();
        assert!(matches!(err, CandError::ImageDecode { .. }));
    }
}
