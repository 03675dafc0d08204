//! # 几何 & DPI
//!
//! 逻辑单位（96 DPI 下的像素）与设备像素之间的换算。

/// 屏幕 / 表面上的一点
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 宽高
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// 逐分量取最大
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// 左上角 + 宽高
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn from_point_size(p: Point, s: Size) -> Self {
        Self::new(p.x, p.y, s.width, s.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// 零面积（含负尺寸）的矩形绘制即为空操作
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// 同时包含两者的最小矩形；空矩形不参与
    pub fn union(self, other: Rect) -> Rect {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect::new(left, top, right - left, bottom - top)
    }
}

/// 逻辑 DPI 基准
pub const BASE_DPI: i32 = 96;

/// `a * b / c`，64 位中间值，四舍五入（远离零）
pub fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    if c == 0 {
        return -1;
    }
    let num = a as i64 * b as i64;
    let den = c as i64;
    let q = (num.abs() + den.abs() / 2) / den.abs();
    let q = if (num < 0) != (den < 0) { -q } else { q };
    q.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// 显示器像素密度，两轴独立
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dpi {
    pub x: i32,
    pub y: i32,
}

impl Default for Dpi {
    fn default() -> Self {
        Self { x: BASE_DPI, y: BASE_DPI }
    }
}

impl Dpi {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 水平方向逻辑单位 → 设备像素
    pub fn sx(&self, v: i32) -> i32 {
        mul_div(v, self.x, BASE_DPI)
    }

    /// 垂直方向逻辑单位 → 设备像素
    pub fn sy(&self, v: i32) -> i32 {
        mul_div(v, self.y, BASE_DPI)
    }

    /// 字号（磅）→ 像素高度
    pub fn font_px(&self, points: u32) -> f32 {
        points as f32 * self.y as f32 / 72.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounds_half_away_from_zero() {
        assert_eq!(mul_div(5, 144, 96), 8); // 7.5 → 8
        assert_eq!(mul_div(-5, 144, 96), -8);
        assert_eq!(mul_div(3, 96, 96), 3);
        assert_eq!(mul_div(1, 1, 0), -1);
    }

    #[test]
    fn test_dpi_scaling() {
        let dpi = Dpi::new(144, 192);
        assert_eq!(dpi.sx(10), 15);
        assert_eq!(dpi.sy(10), 20);
        assert_eq!(Dpi::default().sx(7), 7);
        assert_eq!(Dpi::new(96, 144).font_px(12), 24.0);
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.union(Rect::new(-2, 4, 5, 12)), Rect::new(-2, 0, 12, 16));
        assert_eq!(a.union(Rect::new(50, 50, 0, 3)), a);
        assert_eq!(Rect::default().union(a), a);
    }
}
