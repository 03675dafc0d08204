//! # UI 模块 — 候选词窗口
//!
//! 无边框、置顶、逐像素半透明的候选词悬浮窗口。
//! 每次刷新都在一张全新的离屏位图上完整重绘（背景九宫格 → 组合串 → 候选 + 高亮），
//! 然后一次性交给呈现层替换整个窗口内容，没有局部更新，也就没有闪烁。

use std::rc::Rc;
use std::sync::Arc;
use log::{debug, info, warn};
use tiny_skia::Pixmap;
use crate::element::{CandidateListElement, UiElement, CANDIDATE_WINDOW_GUID, PAGE_SIZE};
use crate::error::{CandError, Result};
use crate::geometry::{Dpi, Point, Rect, Size};
use crate::layout::{candidate_string, compute_size};
use crate::selection::{Candidate, CandidateList, NavKey, SelectionState};
use crate::text::{TextBlender, TextRasterizer};
use crate::theme::Theme;

// ============================================================
// Presenter — 呈现原语
// ============================================================

/// 逐像素透明窗口的呈现层
pub trait Presenter {
    /// 当前显示器 DPI
    fn dpi(&self) -> Dpi;

    /// 布局变化后调整窗口尺寸
    fn resize(&mut self, size: Size);

    /// 用预乘 alpha 位图整体替换窗口内容
    fn present(&mut self, position: Point, frame: &Pixmap) -> Result<()>;

    fn set_visible(&mut self, visible: bool);
}

/// 不接屏幕的呈现层：保留最后一帧（预览工具 / 测试用）
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    pub dpi: Dpi,
    pub size: Size,
    pub position: Point,
    pub visible: bool,
    pub frame: Option<Pixmap>,
    pub resizes: usize,
    pub presents: usize,
}

impl HeadlessPresenter {
    pub fn new(dpi: Dpi) -> Self {
        Self { dpi, ..Self::default() }
    }
}

impl Presenter for HeadlessPresenter {
    fn dpi(&self) -> Dpi {
        self.dpi
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
        self.resizes += 1;
    }

    fn present(&mut self, position: Point, frame: &Pixmap) -> Result<()> {
        self.position = position;
        self.frame = Some(frame.clone());
        self.presents += 1;
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

// ============================================================
// CandidateWindow — 公开 API
// ============================================================

/// 候选词悬浮窗口
pub struct CandidateWindow<P: Presenter> {
    theme: Arc<Theme>,
    rasterizer: Rc<dyn TextRasterizer>,
    presenter: P,
    list: CandidateList,
    composition: String,
    size: Size,
    position: Point,
    layout_dirty: bool,
    shown: bool,
    use_cursor: bool,
}

impl<P: Presenter> CandidateWindow<P> {
    /// 创建候选词窗口（初始隐藏），立即完成第一次布局和绘制
    pub fn new(theme: Arc<Theme>, rasterizer: Rc<dyn TextRasterizer>, presenter: P) -> Self {
        let mut win = Self {
            theme,
            rasterizer,
            presenter,
            list: CandidateList::new(),
            composition: String::new(),
            size: Size::default(),
            position: Point::default(),
            layout_dirty: true,
            shown: false,
            use_cursor: true,
        };
        win.refresh();
        info!("[UI] 候选词窗口已创建");
        win
    }

    // ---------- 候选列表 ----------

    pub fn items(&self) -> &[Candidate] {
        self.list.items()
    }

    /// 替换候选和选择键，重新布局并重绘
    pub fn set_items<S: Into<String>>(&mut self, items: impl IntoIterator<Item = S>, sel_keys: &[char]) {
        self.list.set_items(items, sel_keys);
        self.layout_dirty = true;
        self.refresh();
    }

    /// 追加一项；批量追加后由调用方 `refresh()`
    pub fn add(&mut self, item: impl Into<String>, sel_key: Option<char>) {
        self.list.add(item, sel_key);
        self.layout_dirty = true;
    }

    pub fn clear(&mut self) {
        self.list.clear();
        self.layout_dirty = true;
    }

    pub fn composition(&self) -> &str {
        &self.composition
    }

    /// 设置组合串（显示在候选行上方），重新布局并重绘
    pub fn set_composition(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.composition {
            self.composition = text;
            self.layout_dirty = true;
            self.refresh();
        }
    }

    pub fn cand_per_row(&self) -> usize {
        self.list.cand_per_row()
    }

    pub fn set_cand_per_row(&mut self, n: usize) {
        if self.list.set_cand_per_row(n) {
            self.recalculate_size();
        }
    }

    // ---------- 选择 ----------

    pub fn state(&self) -> SelectionState {
        self.list.state()
    }

    pub fn current_sel(&self) -> usize {
        self.list.current_sel()
    }

    /// 越界索引归一化为 0；高亮变化时重绘
    pub fn set_current_sel(&mut self, sel: usize) {
        if self.list.set_current_sel(sel) {
            self.refresh();
        }
    }

    pub fn current_sel_key(&self) -> Option<char> {
        self.list.current_sel_key()
    }

    pub fn index_of_key(&self, key: char) -> Option<usize> {
        self.list.index_of_key(key)
    }

    pub fn has_result(&self) -> bool {
        self.list.has_result()
    }

    pub fn use_cursor(&self) -> bool {
        self.use_cursor
    }

    /// 只影响高亮装饰，不影响键盘导航；调用方负责 `refresh()`
    pub fn set_use_cursor(&mut self, use_cursor: bool) {
        self.use_cursor = use_cursor;
    }

    /// 方向键 / 回车。返回按键是否被消费
    pub fn filter_key_event(&mut self, vkey: u32) -> bool {
        match NavKey::from_vkey(vkey) {
            Some(key) => self.navigate(key),
            None => false,
        }
    }

    /// 已解码的导航键
    pub fn navigate(&mut self, key: NavKey) -> bool {
        let result = self.list.navigate(key);
        if result.need_refresh {
            self.refresh();
        }
        result.eaten
    }

    // ---------- 几何 ----------

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// 移动窗口到光标附近位置
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = Point::new(x, y);
        self.refresh();
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// 重新计算窗口尺寸
    pub fn recalculate_size(&mut self) {
        let dpi = self.presenter.dpi();
        let size = compute_size(
            &self.theme,
            &self.composition,
            self.list.items(),
            self.rasterizer.as_ref(),
            dpi,
        );
        self.layout_dirty = false;
        if size != self.size {
            debug!("[UI] 窗口尺寸 {}x{} → {}x{}", self.size.width, self.size.height, size.width, size.height);
            self.size = size;
            self.presenter.resize(size);
        }
    }

    // ---------- 绘制 ----------

    /// 重绘并呈现。失败时保留上一帧
    pub fn refresh(&mut self) {
        if self.layout_dirty {
            self.recalculate_size();
        }
        if self.size.is_empty() {
            debug!("[UI] 窗口尺寸为空, 跳过绘制");
            return;
        }
        let frame = match self.render() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("[UI] ⚠ 绘制失败: {}, 保留上一帧", e);
                return;
            }
        };
        if let Err(e) = self.presenter.present(self.position, &frame) {
            warn!("[UI] ⚠ 呈现失败: {}", e);
        }
    }

    /// 在一张全新的离屏位图上完整绘制一帧
    pub fn render(&self) -> Result<Pixmap> {
        let Size { width, height } = self.size;
        let mut frame = Pixmap::new(width.max(0) as u32, height.max(0) as u32)
            .ok_or(CandError::SurfaceAlloc { width, height })?;

        let dpi = self.presenter.dpi();
        let theme = self.theme.as_ref();
        let tm = &theme.text_margin;
        let px = dpi.font_px(theme.font.size);
        let raster = self.rasterizer.as_ref();

        theme.background.paint(&mut frame, Rect::new(0, 0, width, height), dpi);

        let mut pt = Point::new(dpi.sx(theme.content_margin.left), dpi.sy(theme.content_margin.top));
        let normal = TextBlender::new(raster, &theme.font, px, theme.normal_color);

        if !self.composition.is_empty() {
            let origin = Point::new(pt.x + dpi.sx(tm.left), pt.y + dpi.sy(tm.top));
            let size = normal.blend(&mut frame, &self.composition, origin)?;
            pt.y += size.height + dpi.sy(tm.y_space());
        }

        let highlight = TextBlender::new(raster, &theme.font, px, theme.highlight_color);
        for (i, candidate) in self.list.items().iter().enumerate() {
            let text = candidate_string(candidate);
            let origin = Point::new(pt.x + dpi.sx(tm.left), pt.y + dpi.sy(tm.top));
            let size = if self.use_cursor && i == self.list.current_sel() {
                let bounds = raster.measure(&text, &theme.font, px);
                theme.highlight.paint(&mut frame, Rect::from_point_size(origin, bounds), dpi);
                highlight.blend(&mut frame, &text, origin)?
            } else {
                normal.blend(&mut frame, &text, origin)?
            };
            pt.x += size.width + dpi.sx(tm.x_space());
        }

        Ok(frame)
    }
}

// ============================================================
// UI 元素接口
// ============================================================

impl<P: Presenter> UiElement for CandidateWindow<P> {
    fn description(&self) -> &str {
        "Candidate window"
    }

    fn guid(&self) -> u128 {
        CANDIDATE_WINDOW_GUID
    }

    fn show(&mut self, show: bool) {
        self.shown = show;
        if show {
            self.refresh();
        }
        self.presenter.set_visible(show);
    }

    fn is_shown(&self) -> bool {
        self.shown
    }
}

impl<P: Presenter> CandidateListElement for CandidateWindow<P> {
    fn count(&self) -> usize {
        self.list.len().min(PAGE_SIZE)
    }

    fn selection(&self) -> usize {
        self.list.current_sel()
    }

    fn string(&self, index: usize) -> Result<String> {
        self.list
            .items()
            .get(index)
            .map(|c| c.text.clone())
            .ok_or(CandError::InvalidArgument("候选索引越界"))
    }

    fn page_index(&self, indices: Option<&mut [usize]>) -> Result<usize> {
        let page_count = 1;
        if let Some(indices) = indices {
            let first = indices.first_mut().ok_or(CandError::InvalidArgument("页码缓冲过小"))?;
            *first = 0;
        }
        Ok(page_count)
    }

    fn set_page_index(&mut self, indices: Option<&[usize]>) -> Result<()> {
        match indices {
            Some(_) => Ok(()),
            None => Err(CandError::InvalidArgument("缺少页码")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{solid, BoxRasterizer};
    use crate::theme::{Margin, Rgb, StretchedImage};

    const BLUE: Rgb = Rgb::new(0, 0, 255);
    const RED: Rgb = Rgb::new(255, 0, 0);

    fn theme() -> Arc<Theme> {
        Arc::new(Theme {
            normal_color: BLUE,
            highlight_color: RED,
            highlight: StretchedImage::new(solid(4, 4, [0, 255, 0, 255]), Margin::new(1, 1, 1, 1)),
            content_margin: Margin::new(2, 2, 2, 2),
            ..Theme::default()
        })
    }

    fn window() -> CandidateWindow<HeadlessPresenter> {
        CandidateWindow::new(theme(), Rc::new(BoxRasterizer::default()), HeadlessPresenter::default())
    }

    fn rgba(win: &CandidateWindow<HeadlessPresenter>, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let p = win.presenter().frame.as_ref().unwrap().pixel(x, y).unwrap();
        (p.red(), p.green(), p.blue(), p.alpha())
    }

    #[test]
    fn test_construction_paints_margin_sized_frame() {
        let win = window();
        assert_eq!(win.size(), Size::new(4, 4));
        assert_eq!(win.presenter().presents, 1);
        assert!(!win.is_shown());
        assert_eq!(win.state(), SelectionState::Idle);
    }

    #[test]
    fn test_empty_theme_skips_zero_sized_frame() {
        let win = CandidateWindow::new(
            Arc::new(Theme::default()),
            Rc::new(BoxRasterizer::default()),
            HeadlessPresenter::default(),
        );
        assert_eq!(win.size(), Size::default());
        assert_eq!(win.presenter().presents, 0);
        assert!(matches!(win.render(), Err(CandError::SurfaceAlloc { .. })));
    }

    #[test]
    fn test_set_items_resizes_and_paints_highlight() {
        let mut win = window();
        win.set_items(["a", "b"], &['1', '2']);
        // "1.a" / "2.b" 各 24 宽
        assert_eq!(win.size(), Size::new(52, 20));
        let frame = win.presenter().frame.as_ref().unwrap();
        assert_eq!((frame.width(), frame.height()), (52, 20));

        // 第一项：高亮底图 + 红字
        assert_eq!(rgba(&win, 4, 5), (255, 0, 0, 255));
        assert_eq!(rgba(&win, 2, 5), (0, 255, 0, 255));
        // 第二项：蓝字，无底图
        assert_eq!(rgba(&win, 28, 5), (0, 0, 255, 255));
        assert_eq!(rgba(&win, 26, 5).3, 0);
    }

    #[test]
    fn test_selection_change_repaints_without_resize() {
        let mut win = window();
        win.set_items(["a", "b"], &['1', '2']);
        let resizes = win.presenter().resizes;
        let presents = win.presenter().presents;

        assert!(win.filter_key_event(0x27));
        assert_eq!(win.current_sel(), 1);
        assert_eq!(win.presenter().resizes, resizes);
        assert_eq!(win.presenter().presents, presents + 1);
        assert_eq!(rgba(&win, 4, 5), (0, 0, 255, 255));
        assert_eq!(rgba(&win, 28, 5), (255, 0, 0, 255));

        // 边界：不消费、不重绘
        assert!(!win.filter_key_event(0x27));
        assert_eq!(win.presenter().presents, presents + 1);
    }

    #[test]
    fn test_without_cursor_no_highlight() {
        let mut win = window();
        win.set_use_cursor(false);
        win.set_items(["a", "b"], &['1', '2']);
        assert_eq!(rgba(&win, 4, 5), (0, 0, 255, 255));
        assert_eq!(rgba(&win, 2, 5).3, 0);
        // 导航仍然有效
        assert!(win.filter_key_event(0x27));
        assert!(win.filter_key_event(0x0D));
        assert!(win.has_result());
        assert_eq!(win.current_sel_key(), Some('2'));
    }

    #[test]
    fn test_composition_row_above_candidates() {
        let mut win = window();
        win.set_composition("ni");
        assert_eq!(win.size(), Size::new(16 + 4, 16 + 4));
        assert_eq!(rgba(&win, 4, 5), (0, 0, 255, 255));
        win.set_items(["a"], &[]);
        assert_eq!(win.size(), Size::new(16 + 4, 20));
    }

    #[test]
    fn test_add_then_refresh_relayouts() {
        let mut win = window();
        win.add("a", Some('1'));
        win.add("b", None);
        assert_eq!(win.size(), Size::new(4, 4));
        win.refresh();
        assert_eq!(win.size(), Size::new(24 + 8 + 4, 20));
        win.clear();
        win.refresh();
        assert_eq!(win.size(), Size::new(4, 4));
    }

    #[test]
    fn test_show_hide_keeps_state() {
        let mut win = window();
        win.set_items(["a", "b", "c"], &[]);
        win.set_current_sel(2);
        let resizes = win.presenter().resizes;

        win.show(true);
        assert!(win.is_shown() && win.presenter().visible);
        win.show(false);
        assert!(!win.is_shown() && !win.presenter().visible);
        assert_eq!(win.current_sel(), 2);
        assert_eq!(win.presenter().resizes, resizes);
    }

    #[test]
    fn test_set_current_sel_out_of_range() {
        let mut win = window();
        win.set_items(["a", "b"], &[]);
        win.set_current_sel(1);
        win.set_current_sel(5);
        assert_eq!(win.current_sel(), 0);
    }

    #[test]
    fn test_cand_per_row_keeps_selection() {
        let mut win = window();
        win.set_items(["a", "b", "c", "d"], &[]);
        win.set_current_sel(3);
        win.set_cand_per_row(2);
        assert_eq!(win.cand_per_row(), 2);
        assert_eq!(win.current_sel(), 3);
        assert!(win.filter_key_event(0x26));
        assert_eq!(win.current_sel(), 1);
    }

    #[test]
    fn test_accessibility_snapshot() {
        let mut win = window();
        let items: Vec<String> = (0..12).map(|i| format!("w{}", i)).collect();
        win.set_items(items, &[]);
        assert_eq!(win.count(), PAGE_SIZE);
        assert_eq!(win.selection(), 0);
        assert_eq!(win.string(11).unwrap(), "w11");
        assert!(matches!(win.string(12), Err(CandError::InvalidArgument(_))));

        let mut buf = [9usize; 2];
        assert_eq!(win.page_index(Some(&mut buf[..])).unwrap(), 1);
        assert_eq!(buf[0], 0);
        assert_eq!(win.page_index(None).unwrap(), 1);
        assert!(win.page_index(Some(&mut [][..])).is_err());
        assert!(win.set_page_index(Some(&[3][..])).is_ok());
        assert!(win.set_page_index(None).is_err());
        assert_eq!(win.current_page(), 0);
        assert_eq!(win.updated_flags(), 0x3f);
        assert_eq!(win.guid(), CANDIDATE_WINDOW_GUID);
    }
}
