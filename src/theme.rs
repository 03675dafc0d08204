//! # 主题模型
//!
//! 从主题目录下的 `theme.toml` 读取颜色、字体、边距和两张可拉伸背景图。
//!
//! ## 容错
//! - 未知键忽略，缺失键使用默认值
//! - 单个字段格式错误只影响该字段（记一条 warn，换成默认值）
//! - 图片缺失 / 损坏 → 该 `StretchedImage` 视为「无图片」，绘制为空操作
//! - 文件不存在 → 完整的默认主题
//!
//! ```toml
//! Font = "Microsoft YaHei 14"
//! NormalColor = "#303030"
//! HighlightCandidateColor = "#FFFFFF"
//!
//! [Background]
//! Image = "background.png"
//! [Background.Margin]
//! Top = 6
//! Right = 6
//! Bottom = 6
//! Left = 6
//!
//! [TextMargin]
//! Left = 4
//! Right = 4
//! ```
//!
//! 所有键也可以整体放在 `[InputPanel]` 表下。

use std::fmt;
use std::path::{Path, PathBuf};
use log::{info, warn};
use tiny_skia::Pixmap;
use toml::{Table, Value};
use crate::bitmap::ImageDecoder;
use crate::error::{CandError, Result};

/// 主题配置文件名
pub const THEME_FILE: &str = "theme.toml";

/// 缺省字体族（交给字体引擎映射到系统无衬线字体）
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// 缺省字号（磅）
pub const DEFAULT_FONT_SIZE: u32 = 12;

/// 可接受的最大字号（磅），超出按缺省字号处理
pub const MAX_FONT_SIZE: u32 = 200;

// ============================================================
// 颜色
// ============================================================

/// 不透明 RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// 解析 `RRGGBB` / `#RRGGBB`，其他格式返回 `None`
pub fn parse_color(s: &str) -> Option<Rgb> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let v = u32::from_str_radix(hex, 16).ok()?;
    Some(Rgb::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
}

// ============================================================
// 边距
// ============================================================

/// 四边边距（未缩放的逻辑单位，非负）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Margin {
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self { top, right, bottom, left }
    }

    /// 水平占用 `left + right`
    pub fn x_space(&self) -> i32 {
        self.left + self.right
    }

    /// 垂直占用 `top + bottom`
    pub fn y_space(&self) -> i32 {
        self.top + self.bottom
    }
}

// ============================================================
// 字体
// ============================================================

/// 字体描述
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub family: String,
    /// 字号（磅）
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
        }
    }
}

/// 解析 `"Face Name 14"`：末尾的正整数是字号，否则整串都是字体名
pub fn parse_font(s: &str) -> (String, Option<u32>) {
    let s = s.trim();
    if let Some((name, suffix)) = s.rsplit_once(' ') {
        if let Ok(size) = suffix.parse::<u32>() {
            if size > 0 {
                return (name.trim_end().to_string(), Some(size));
            }
        }
    }
    (s.to_string(), None)
}

// ============================================================
// 可拉伸图片
// ============================================================

/// 九宫格图片：位图 + 不拉伸的边框宽度
#[derive(Clone, Default)]
pub struct StretchedImage {
    /// `None` 表示图片缺失或解码失败，绘制时什么也不做
    pub image: Option<Pixmap>,
    pub margin: Margin,
}

impl fmt::Debug for StretchedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StretchedImage")
            .field("image", &self.image.as_ref().map(|p| (p.width(), p.height())))
            .field("margin", &self.margin)
            .finish()
    }
}

impl StretchedImage {
    pub fn new(image: Option<Pixmap>, margin: Margin) -> Self {
        Self { image, margin }
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }
}

// ============================================================
// Theme
// ============================================================

/// 候选窗口主题，加载后只读，可在多个窗口间共享
#[derive(Debug, Clone)]
pub struct Theme {
    pub font: FontSpec,
    pub normal_color: Rgb,
    pub highlight_color: Rgb,
    pub background: StretchedImage,
    pub highlight: StretchedImage,
    pub text_margin: Margin,
    pub content_margin: Margin,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            normal_color: Rgb::BLACK,
            highlight_color: Rgb::BLACK,
            background: StretchedImage::default(),
            highlight: StretchedImage::default(),
            text_margin: Margin::default(),
            content_margin: Margin::default(),
        }
    }
}

impl Theme {
    /// 从主题目录加载；仅当目录本身不存在时返回错误
    pub fn load(dir: &Path, decoder: &dyn ImageDecoder) -> Result<Self> {
        if !dir.is_dir() {
            return Err(CandError::ThemeDir(dir.to_path_buf()));
        }
        let conf = dir.join(THEME_FILE);
        let table = match std::fs::read_to_string(&conf) {
            Ok(text) => match text.parse::<Table>() {
                Ok(t) => t,
                Err(e) => {
                    warn!("[Theme] ⚠ {:?} 解析失败: {}, 使用默认主题", conf, e);
                    Table::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[Theme] ℹ {:?} 不存在, 使用默认主题", conf);
                Table::new()
            }
            Err(e) => {
                warn!("[Theme] ⚠ 读取 {:?} 失败: {}, 使用默认主题", conf, e);
                Table::new()
            }
        };
        let theme = Self::from_table(&table, dir, decoder);
        info!(
            "[Theme] ✅ {:?}: font={:?} {}pt, background={}, highlight={}",
            dir,
            theme.font.family,
            theme.font.size,
            theme.background.is_loaded(),
            theme.highlight.is_loaded()
        );
        Ok(theme)
    }

    /// 从已解析的配置树构建；图片路径相对 `dir`
    pub fn from_table(table: &Table, dir: &Path, decoder: &dyn ImageDecoder) -> Self {
        let root = table.get("InputPanel").and_then(Value::as_table).unwrap_or(table);
        let defaults = Theme::default();

        Self {
            font: read_font(root),
            normal_color: read_color(root, "NormalColor", defaults.normal_color),
            highlight_color: read_color(root, "HighlightCandidateColor", defaults.highlight_color),
            background: read_stretched_image(root, "Background", dir, decoder),
            highlight: read_stretched_image(root, "Highlight", dir, decoder),
            text_margin: read_margin(root.get("TextMargin"), "TextMargin"),
            content_margin: read_margin(root.get("ContentMargin"), "ContentMargin"),
        }
    }
}

// ============================================================
// 逐字段读取
// ============================================================

fn read_color(table: &Table, key: &str, fallback: Rgb) -> Rgb {
    match table.get(key) {
        None => fallback,
        Some(Value::String(s)) => parse_color(s).unwrap_or_else(|| {
            warn!("[Theme] ⚠ {} = {:?} 不是 6 位十六进制颜色, 使用默认值", key, s);
            fallback
        }),
        Some(other) => {
            warn!("[Theme] ⚠ {} = {} 不是字符串, 使用默认值", key, other);
            fallback
        }
    }
}

fn read_font(table: &Table) -> FontSpec {
    let mut font = FontSpec::default();
    match table.get("Font") {
        None => {}
        Some(Value::String(s)) => {
            let (family, size) = parse_font(s);
            if !family.is_empty() {
                font.family = family;
            }
            match size {
                Some(size) if size <= MAX_FONT_SIZE => font.size = size,
                Some(size) => warn!(
                    "[Theme] ⚠ Font 字号 {} 超出 1..={}, 使用默认字号 {}",
                    size, MAX_FONT_SIZE, DEFAULT_FONT_SIZE
                ),
                None => {}
            }
        }
        Some(other) => warn!("[Theme] ⚠ Font = {} 不是字符串, 使用默认字体", other),
    }
    if let Some(style) = table.get("FontStyle").and_then(Value::as_str) {
        for word in style.split_whitespace() {
            match word.to_ascii_lowercase().as_str() {
                "bold" => font.bold = true,
                "italic" => font.italic = true,
                "normal" | "regular" => {}
                _ => warn!("[Theme] ⚠ 未知 FontStyle 关键字 {:?}", word),
            }
        }
    }
    font
}

fn read_margin(value: Option<&Value>, section: &str) -> Margin {
    let Some(table) = value.and_then(Value::as_table) else {
        return Margin::default();
    };
    let side = |key: &str| -> i32 {
        let v = match table.get(key) {
            None => return 0,
            Some(Value::Integer(i)) => Some(*i),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            Some(_) => None,
        };
        match v {
            Some(i) if i >= 0 => i.min(i32::MAX as i64) as i32,
            Some(i) => {
                warn!("[Theme] ⚠ {}.{} = {} 为负, 按 0 处理", section, key, i);
                0
            }
            None => {
                warn!("[Theme] ⚠ {}.{} 不是整数, 按 0 处理", section, key);
                0
            }
        }
    };
    Margin::new(side("Top"), side("Right"), side("Bottom"), side("Left"))
}

fn read_stretched_image(
    table: &Table,
    section: &str,
    dir: &Path,
    decoder: &dyn ImageDecoder,
) -> StretchedImage {
    let Some(sec) = table.get(section).and_then(Value::as_table) else {
        return StretchedImage::default();
    };
    let margin = read_margin(sec.get("Margin"), section);
    let image = match sec.get("Image").and_then(Value::as_str) {
        Some(file) if !file.trim().is_empty() => {
            let path: PathBuf = dir.join(file.trim());
            match decoder.decode(&path) {
                Ok(pixmap) => {
                    check_margin_fits(section, &margin, &pixmap);
                    Some(pixmap)
                }
                Err(e) => {
                    warn!("[Theme] ⚠ {}: {}, 该图片将不绘制", section, e);
                    None
                }
            }
        }
        _ => None,
    };
    StretchedImage::new(image, margin)
}

/// 边框超出图片尺寸时只警告；九宫格绘制会把负跨度钳到 0
fn check_margin_fits(section: &str, margin: &Margin, image: &Pixmap) {
    if margin.x_space() > image.width() as i32 || margin.y_space() > image.height() as i32 {
        warn!(
            "[Theme] ⚠ {} 边框 {:?} 超出图片尺寸 {}x{}",
            section,
            margin,
            image.width(),
            image.height()
        );
    }
}
