//! # 文字合成
//!
//! 字体引擎把文字以「白底黑字」画到一张全新的灰度画布上，
//! 抗锯齿后的灰度值恰好是覆盖率的反相：`alpha = 255 - gray`。
//! 再把画布转成指定颜色的预乘 alpha 位图，source-over 混合到目标表面。
//!
//! 灰度画布每次合成都重新创建并填满白色，从不复用。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use log::{debug, warn};
use tiny_skia::{Pixmap, PixmapPaint, PremultipliedColorU8, Transform};
use crate::error::{CandError, Result};
use crate::geometry::{Point, Rect, Size};
use crate::theme::{FontSpec, Rgb};

// ============================================================
// GrayCanvas — 白底灰度画布
// ============================================================

/// 单通道灰度画布，越界写入直接忽略
pub struct GrayCanvas {
    width: i32,
    height: i32,
    data: Vec<u8>,
}

impl GrayCanvas {
    /// 新建并填满白色
    pub fn white(width: i32, height: i32) -> Self {
        let (w, h) = (width.max(0), height.max(0));
        Self { width: w, height: h, data: vec![255; (w as usize) * (h as usize)] }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// 灰度值；越界返回白色
    pub fn gray(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map(|i| self.data[i]).unwrap_or(255)
    }

    /// 以黑色、覆盖率 `coverage` 绘制一个像素。重叠处取更深的值
    pub fn cover(&mut self, x: i32, y: i32, coverage: u8) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = self.data[i].min(255 - coverage);
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// 灰度 → 指定颜色的预乘 alpha 位图。零尺寸返回 `None`
    pub fn to_premultiplied(&self, color: Rgb) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(self.width as u32, self.height as u32)?;
        for (dst, &gray) in pixmap.pixels_mut().iter_mut().zip(&self.data) {
            let alpha = 255 - gray;
            let ch = |c: u8| (c as u32 * alpha as u32 / 255) as u8;
            *dst = PremultipliedColorU8::from_rgba(ch(color.r), ch(color.g), ch(color.b), alpha)
                .unwrap_or(PremultipliedColorU8::TRANSPARENT);
        }
        Some(pixmap)
    }
}

// ============================================================
// 字体引擎接口
// ============================================================

/// 字体引擎：测量文字，并以白底黑字光栅化到灰度画布
pub trait TextRasterizer {
    /// 文字范围（像素）。高度为字体行高，与内容无关
    fn measure(&self, text: &str, font: &FontSpec, px: f32) -> Size;

    /// 以 `origin` 为左上角绘制
    fn rasterize(&self, text: &str, font: &FontSpec, px: f32, origin: Point, canvas: &mut GrayCanvas);

    /// 以 (0, 0) 为左上角绘制时实际着墨的范围。
    /// 斜体右伸、负的左侧边距会超出 `measure` 的范围
    fn ink_bounds(&self, text: &str, font: &FontSpec, px: f32) -> Rect {
        Rect::from_point_size(Point::default(), self.measure(text, font, px))
    }
}

// ============================================================
// TextBlender — 把文字按颜色合成到目标表面
// ============================================================

/// 一种颜色 + 字体的文字合成器
pub struct TextBlender<'a> {
    rasterizer: &'a dyn TextRasterizer,
    font: &'a FontSpec,
    px: f32,
    color: Rgb,
}

impl<'a> TextBlender<'a> {
    pub fn new(rasterizer: &'a dyn TextRasterizer, font: &'a FontSpec, px: f32, color: Rgb) -> Self {
        Self { rasterizer, font, px, color }
    }

    /// 在 `origin` 绘制文字，返回测量到的尺寸（与颜色无关）。
    /// 画布覆盖测量范围和着墨范围的并集，超出测量框的笔画不会被裁掉
    pub fn blend(&self, target: &mut Pixmap, text: &str, origin: Point) -> Result<Size> {
        let size = self.rasterizer.measure(text, self.font, self.px);
        if size.is_empty() || text.is_empty() {
            return Ok(size);
        }

        let bounds = Rect::from_point_size(Point::default(), size)
            .union(self.rasterizer.ink_bounds(text, self.font, self.px));
        let mut scratch = GrayCanvas::white(bounds.width, bounds.height);
        self.rasterizer.rasterize(text, self.font, self.px, Point::new(-bounds.x, -bounds.y), &mut scratch);
        let glyphs = scratch.to_premultiplied(self.color).ok_or(CandError::SurfaceAlloc {
            width: bounds.width,
            height: bounds.height,
        })?;

        target.draw_pixmap(
            origin.x + bounds.x,
            origin.y + bounds.y,
            glyphs.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(size)
    }
}

// ============================================================
// FontdueRasterizer — 系统字体 + fontdue
// ============================================================

type FaceKey = (String, bool, bool);

/// 用 fontdb 查找系统字体、fontdue 光栅化。字体按 (字体族, 粗体, 斜体) 缓存
pub struct FontdueRasterizer {
    db: fontdb::Database,
    faces: RefCell<HashMap<FaceKey, Option<Rc<fontdue::Font>>>>,
}

impl FontdueRasterizer {
    /// 加载系统字体库（较慢，只在启动时做一次）
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!("[Text] 已加载 {} 个系统字体", db.len());
        Self::from_database(db)
    }

    /// 使用外部准备好的字体库（例如只含主题自带字体）
    pub fn from_database(db: fontdb::Database) -> Self {
        Self { db, faces: RefCell::new(HashMap::new()) }
    }

    fn face(&self, font: &FontSpec) -> Option<Rc<fontdue::Font>> {
        let key = (font.family.clone(), font.bold, font.italic);
        if let Some(cached) = self.faces.borrow().get(&key) {
            return cached.clone();
        }
        let loaded = self.load_face(font).map(Rc::new);
        if loaded.is_none() {
            warn!("[Text] ⚠ 找不到字体 {:?}, 文字将不绘制", font.family);
        }
        self.faces.borrow_mut().insert(key, loaded.clone());
        loaded
    }

    fn load_face(&self, font: &FontSpec) -> Option<fontdue::Font> {
        let requested = match font.family.to_ascii_lowercase().as_str() {
            "sans-serif" => fontdb::Family::SansSerif,
            "serif" => fontdb::Family::Serif,
            "monospace" => fontdb::Family::Monospace,
            _ => fontdb::Family::Name(&font.family),
        };
        let families = [requested, fontdb::Family::SansSerif];
        let query = fontdb::Query {
            families: &families,
            weight: if font.bold { fontdb::Weight::BOLD } else { fontdb::Weight::NORMAL },
            style: if font.italic { fontdb::Style::Italic } else { fontdb::Style::Normal },
            ..fontdb::Query::default()
        };
        if let Some(face) = self.db.query(&query).and_then(|id| self.parse_face(id)) {
            return Some(face);
        }
        // 通用字体族只映射到固定的几个名字（如 Arial），缺失时退回任意可用的已安装字体
        let (name, face) = self
            .db
            .faces()
            .find_map(|info| self.parse_face(info.id).map(|face| (&info.post_script_name, face)))?;
        warn!("[Text] ⚠ 字体 {:?} 不可用, 退回 {}", font.family, name);
        Some(face)
    }

    fn parse_face(&self, id: fontdb::ID) -> Option<fontdue::Font> {
        self.db
            .with_face_data(id, |data, index| {
                let settings = fontdue::FontSettings {
                    collection_index: index,
                    ..fontdue::FontSettings::default()
                };
                fontdue::Font::from_bytes(data, settings).ok()
            })
            .flatten()
    }
}

impl Default for FontdueRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRasterizer for FontdueRasterizer {
    fn measure(&self, text: &str, font: &FontSpec, px: f32) -> Size {
        let Some(face) = self.face(font) else { return Size::default() };
        let width: f32 = text.chars().map(|c| face.metrics(c, px).advance_width).sum();
        let height = face
            .horizontal_line_metrics(px)
            .map(|m| m.ascent - m.descent)
            .unwrap_or(px);
        Size::new(width.ceil() as i32, height.ceil() as i32)
    }

    fn rasterize(&self, text: &str, font: &FontSpec, px: f32, origin: Point, canvas: &mut GrayCanvas) {
        let Some(face) = self.face(font) else { return };
        for (ch, at) in glyph_origins(&face, text, px) {
            let (m, coverage) = face.rasterize(ch, px);
            let left = origin.x + at.x + m.xmin;
            let top = origin.y + at.y - m.height as i32 - m.ymin;
            for row in 0..m.height {
                for col in 0..m.width {
                    canvas.cover(left + col as i32, top + row as i32, coverage[row * m.width + col]);
                }
            }
        }
    }

    fn ink_bounds(&self, text: &str, font: &FontSpec, px: f32) -> Rect {
        let Some(face) = self.face(font) else { return Rect::default() };
        glyph_origins(&face, text, px)
            .map(|(ch, at)| {
                let m = face.metrics(ch, px);
                Rect::new(at.x + m.xmin, at.y - m.height as i32 - m.ymin, m.width as i32, m.height as i32)
            })
            .fold(Rect::default(), Rect::union)
    }
}

/// 每个字符的笔位：x 为取整后的累计步进，y 为基线
fn glyph_origins<'a>(face: &'a fontdue::Font, text: &'a str, px: f32) -> impl Iterator<Item = (char, Point)> + 'a {
    let ascent = face.horizontal_line_metrics(px).map(|m| m.ascent).unwrap_or(px);
    let baseline = ascent.round() as i32;
    text.chars().scan(0.0f32, move |pen_x, ch| {
        let at = Point::new(pen_x.round() as i32, baseline);
        *pen_x += face.metrics(ch, px).advance_width;
        Some((ch, at))
    })
}
