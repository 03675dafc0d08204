//! # CandWin — 输入法候选词窗口
//!
//! 逐像素半透明的候选词悬浮窗口：主题加载、九宫格背景、
//! 白底黑字 → 预乘 alpha 的文字合成、方向键选择状态机，
//! 以及给无障碍框架的只读快照。
//!
//! 呈现层是一个 trait：Windows 上用分层窗口（[`layered`]），
//! 其他平台和测试里用 [`ui::HeadlessPresenter`] 保留最后一帧。

pub mod bitmap;
pub mod config;
pub mod element;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod nine_slice;
pub mod selection;
pub mod text;
pub mod theme;
pub mod ui;

#[cfg(windows)]
pub mod layered;

#[cfg(test)]
mod testing;

pub use bitmap::{CodecDecoder, ImageDecoder};
pub use element::{CandidateListElement, UiElement};
pub use error::{CandError, Result};
pub use geometry::{Dpi, Point, Rect, Size};
pub use selection::{Candidate, CandidateList, KeyResult, NavKey, SelectionState};
pub use text::{FontdueRasterizer, TextRasterizer};
pub use theme::Theme;
pub use ui::{CandidateWindow, HeadlessPresenter, Presenter};
