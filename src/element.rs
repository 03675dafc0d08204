//! # UI 元素接口
//!
//! 宿主只需要两组很窄的能力：显示/隐藏控制，以及给无障碍框架的只读快照。
//! 候选窗口同时实现两者，调用方按需只依赖其中一个 trait。
//!
//! 多页候选不支持：永远只有一页，外部设置页码被接受但忽略。

use crate::error::Result;

/// 候选窗口 UI 元素 GUID `{BD7CCC94-57CD-41D3-A789-AF47890CEB29}`
pub const CANDIDATE_WINDOW_GUID: u128 = 0xbd7ccc94_57cd_41d3_a789_af47890ceb29;

/// 单页最多报告的候选数
pub const PAGE_SIZE: usize = 10;

// 快照中哪些字段有更新
pub const UPDATED_DOCUMENT_MGR: u32 = 0x01;
pub const UPDATED_COUNT: u32 = 0x02;
pub const UPDATED_SELECTION: u32 = 0x04;
pub const UPDATED_STRING: u32 = 0x08;
pub const UPDATED_PAGE_INDEX: u32 = 0x10;
pub const UPDATED_CURRENT_PAGE: u32 = 0x20;

/// 显示控制
pub trait UiElement {
    fn description(&self) -> &str;

    fn guid(&self) -> u128;

    /// 只切换可见性，不丢弃状态、不重新布局
    fn show(&mut self, show: bool);

    fn is_shown(&self) -> bool;
}

/// 无障碍只读快照
pub trait CandidateListElement {
    /// 总是报告全部字段已更新
    fn updated_flags(&self) -> u32 {
        UPDATED_DOCUMENT_MGR
            | UPDATED_COUNT
            | UPDATED_SELECTION
            | UPDATED_STRING
            | UPDATED_PAGE_INDEX
            | UPDATED_CURRENT_PAGE
    }

    /// 候选数，最多 [`PAGE_SIZE`]
    fn count(&self) -> usize;

    fn selection(&self) -> usize;

    /// 第 `index` 项文字；越界返回 `InvalidArgument`
    fn string(&self, index: usize) -> Result<String>;

    /// 返回页数（恒为 1）；给了 `indices` 时写入每页起始索引，
    /// 缓冲比页数短返回 `InvalidArgument`
    fn page_index(&self, indices: Option<&mut [usize]>) -> Result<usize>;

    /// 接受但忽略；未提供页码返回 `InvalidArgument`
    fn set_page_index(&mut self, indices: Option<&[usize]>) -> Result<()>;

    fn current_page(&self) -> usize {
        0
    }
}
