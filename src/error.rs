//! # 错误类型
//!
//! 核心的原则是「视觉降级，而不是操作失败」：
//! 配置错误和图片错误都在主题加载内部被吞掉并替换为默认值，
//! 真正会传到调用方的只有下面这几类。

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CandError {
    /// 主题目录本身不存在（theme.toml 缺失不算错误）
    #[error("主题目录不存在: {0}")]
    ThemeDir(PathBuf),

    /// 图片解码失败；主题加载会把它降级为「无图片」
    #[error("图片解码失败 {path}: {reason}")]
    ImageDecode { path: PathBuf, reason: String },

    /// 像素缓冲分配失败，本帧绘制中止
    #[error("无法分配 {width}x{height} 像素缓冲")]
    SurfaceAlloc { width: i32, height: i32 },

    /// 访问器收到无效参数（越界索引、过小的输出缓冲）
    #[error("无效参数: {0}")]
    InvalidArgument(&'static str),

    /// 呈现原语失败
    #[error("窗口呈现失败: {0}")]
    Present(String),

    #[cfg(windows)]
    #[error(transparent)]
    Win32(#[from] windows::core::Error),
}

pub type Result<T> = std::result::Result<T, CandError>;
