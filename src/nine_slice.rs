//! # 九宫格绘制
//!
//! 源图和目标矩形在每个轴上都按边距切成三段：
//! `[0, near)`、`[near, dim - far)`、`[dim - far, dim)`。
//! 两端保持源像素尺寸（只随 DPI 缩放）并贴住目标的两边，
//! 中间一段拉伸填满剩余跨度。目标比两端之和还小时，中间跨度钳到 0。

use tiny_skia::{FilterQuality, IntRect, Pixmap, PixmapPaint, Transform};
use crate::geometry::{Dpi, Rect};
use crate::theme::{Margin, StretchedImage};

/// 单轴上的一段：源起点/长度、目标起点/长度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    src_start: i32,
    src_len: i32,
    dst_start: i32,
    dst_len: i32,
}

/// 把一个轴切成三段。`scale` 只作用于目标侧
fn split_axis(near: i32, far: i32, src_dim: i32, dst_dim: i32, scale: impl Fn(i32) -> i32) -> [Span; 3] {
    let near_src = near.min(src_dim);
    let far_src = far.min(src_dim);
    [
        Span {
            src_start: 0,
            src_len: near_src,
            dst_start: 0,
            dst_len: scale(near),
        },
        Span {
            src_start: near_src,
            src_len: (src_dim - near - far).max(0),
            dst_start: scale(near),
            dst_len: (dst_dim - scale(near + far)).max(0),
        },
        Span {
            src_start: (src_dim - far).max(0),
            src_len: far_src,
            dst_start: dst_dim - scale(far),
            dst_len: scale(far),
        },
    ]
}

/// 计算 9 组（源矩形, 目标矩形），目标矩形已平移到 `dest` 内
pub fn slices(margin: &Margin, src_width: i32, src_height: i32, dest: Rect, dpi: Dpi) -> [(Rect, Rect); 9] {
    let xs = split_axis(margin.left, margin.right, src_width, dest.width, |v| dpi.sx(v));
    let ys = split_axis(margin.top, margin.bottom, src_height, dest.height, |v| dpi.sy(v));
    let mut out = [(Rect::default(), Rect::default()); 9];
    for (i, x) in xs.iter().enumerate() {
        for (j, y) in ys.iter().enumerate() {
            out[i * 3 + j] = (
                Rect::new(x.src_start, y.src_start, x.src_len, y.src_len),
                Rect::new(dest.x + x.dst_start, dest.y + y.dst_start, x.dst_len, y.dst_len),
            );
        }
    }
    out
}

impl StretchedImage {
    /// 把图片按九宫格画进 `dest`；图片缺失时什么也不做
    pub fn paint(&self, target: &mut Pixmap, dest: Rect, dpi: Dpi) {
        let Some(image) = &self.image else { return };
        for (src, dst) in slices(&self.margin, image.width() as i32, image.height() as i32, dest, dpi) {
            blit_stretched(target, image, src, dst);
        }
    }
}

/// 源矩形拉伸到目标矩形，按预乘 alpha 做 source-over 混合。零面积为空操作
fn blit_stretched(target: &mut Pixmap, image: &Pixmap, src: Rect, dst: Rect) {
    if src.is_empty() || dst.is_empty() {
        return;
    }
    let Some(src_rect) = IntRect::from_xywh(src.x, src.y, src.width as u32, src.height as u32) else {
        return;
    };
    let Some(part) = image.clone_rect(src_rect) else { return };
    let sx = dst.width as f32 / src.width as f32;
    let sy = dst.height as f32 / src.height as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Nearest,
        ..PixmapPaint::default()
    };
    let transform = Transform::from_row(sx, 0.0, 0.0, sy, dst.x as f32, dst.y as f32);
    target.draw_pixmap(0, 0, part.as_ref(), &paint, transform, None);
}
