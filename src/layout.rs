//! # 布局
//!
//! 由主题、组合串和候选列表算出窗口的设备像素尺寸。
//! 纯函数，不缓存；只在候选集合或组合串变化时调用，选中项变化不触发。

use crate::geometry::{Dpi, Size};
use crate::selection::Candidate;
use crate::text::TextRasterizer;
use crate::theme::Theme;

/// 候选项的显示串：有选择键时为 `"键.文字"`
pub fn candidate_string(candidate: &Candidate) -> String {
    match candidate.key {
        Some(key) => format!("{}.{}", key, candidate.text),
        None => candidate.text.clone(),
    }
}

/// 计算窗口尺寸（设备像素）
pub fn compute_size(
    theme: &Theme,
    composition: &str,
    candidates: &[Candidate],
    rasterizer: &dyn TextRasterizer,
    dpi: Dpi,
) -> Size {
    let px = dpi.font_px(theme.font.size);
    let tm = &theme.text_margin;

    let mut total = Size::default();
    if !composition.is_empty() {
        let size = rasterizer.measure(composition, &theme.font, px);
        total = Size::new(size.width + dpi.sx(tm.x_space()), size.height + dpi.sy(tm.y_space()));
    }

    let mut row = Size::default();
    for candidate in candidates {
        let size = rasterizer.measure(&candidate_string(candidate), &theme.font, px);
        row.width += size.width + dpi.sx(tm.x_space());
        row.height = row.height.max(size.height + dpi.sy(tm.y_space()));
    }

    let content = total.max(row);
    let cm = &theme.content_margin;
    Size::new(content.width + dpi.sx(cm.x_space()), content.height + dpi.sy(cm.y_space()))
}
