//! 测试用的假服务：等宽方块字体、内存图片解码器

use std::collections::HashMap;
use std::path::Path;
use tiny_skia::Pixmap;
use crate::bitmap::{straight_to_premultiplied, ImageDecoder};
use crate::error::{CandError, Result};
use crate::geometry::{Point, Size};
use crate::text::{GrayCanvas, TextRasterizer};
use crate::theme::FontSpec;

/// 每个字符画成一个 `advance x height` 的实心方块（左右各留 1px）
pub struct BoxRasterizer {
    pub advance: i32,
    pub height: i32,
    pub coverage: u8,
}

impl Default for BoxRasterizer {
    fn default() -> Self {
        Self { advance: 8, height: 16, coverage: 255 }
    }
}

impl TextRasterizer for BoxRasterizer {
    fn measure(&self, text: &str, _font: &FontSpec, _px: f32) -> Size {
        Size::new(text.chars().count() as i32 * self.advance, self.height)
    }

    fn rasterize(&self, text: &str, _font: &FontSpec, _px: f32, origin: Point, canvas: &mut GrayCanvas) {
        for (i, _) in text.chars().enumerate() {
            let left = origin.x + i as i32 * self.advance;
            for y in origin.y..origin.y + self.height {
                for x in left + 1..left + self.advance - 1 {
                    canvas.cover(x, y, self.coverage);
                }
            }
        }
    }
}

/// 按文件名返回纯色图片；未登记的文件视为缺失
#[derive(Default)]
pub struct MemoryDecoder {
    images: HashMap<String, (u32, u32)>,
}

impl MemoryDecoder {
    pub fn with(mut self, name: &str, width: u32, height: u32) -> Self {
        self.images.insert(name.to_string(), (width, height));
        self
    }
}

impl ImageDecoder for MemoryDecoder {
    fn decode(&self, path: &Path) -> Result<Pixmap> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let missing = || CandError::ImageDecode {
            path: path.to_path_buf(),
            reason: "not found".into(),
        };
        let &(w, h) = self.images.get(name).ok_or_else(missing)?;
        solid(w, h, [255, 255, 255, 255]).ok_or_else(missing)
    }
}

pub fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Option<Pixmap> {
    let bytes: Vec<u8> = rgba.iter().copied().cycle().take((w * h * 4) as usize).collect();
    straight_to_premultiplied(w, h, &bytes)
}

/// 写一张纯色 PNG 到磁盘
pub fn solid_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
    solid(w, h, rgba).unwrap().save_png(path).unwrap();
}
