//! # 配置管理
//!
//! 从 exe 同目录的 `config.toml` 加载用户配置。
//! 文件不存在或解析失败时使用默认值。
//!
//! ```toml
//! [theme]
//! dir = "themes/default"
//!
//! [window]
//! cand_per_row = 1
//! use_cursor = true
//! dpi = 0        # 0 = 由呈现层报告
//! ```

use std::path::{Path, PathBuf};
use log::{info, warn};
use serde::Deserialize;
use crate::geometry::Dpi;

/// 顶层配置
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

/// 主题配置
#[derive(Debug, Deserialize, Clone)]
pub struct ThemeConfig {
    /// 主题目录，相对路径以配置文件所在目录为基准
    #[serde(default = "default_theme_dir")]
    pub dir: PathBuf,
}

fn default_theme_dir() -> PathBuf {
    PathBuf::from("themes/default")
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self { dir: default_theme_dir() }
    }
}

/// 窗口配置
#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_cand_per_row")]
    pub cand_per_row: usize,
    #[serde(default = "default_use_cursor")]
    pub use_cursor: bool,
    /// 强制 DPI；0 表示询问呈现层
    #[serde(default)]
    pub dpi: u32,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

fn default_cand_per_row() -> usize { 1 }
fn default_use_cursor() -> bool { true }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            cand_per_row: default_cand_per_row(),
            use_cursor: default_use_cursor(),
            dpi: 0,
            x: 0,
            y: 0,
        }
    }
}

impl WindowConfig {
    /// 配置里强制的 DPI
    pub fn dpi_override(&self) -> Option<Dpi> {
        (self.dpi > 0).then(|| Dpi::new(self.dpi as i32, self.dpi as i32))
    }
}

impl Config {
    /// 从 exe 同目录加载 config.toml，不存在则用默认值
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// 从指定文件加载；主题目录的相对路径按文件所在目录解析
    pub fn load_from(path: &Path) -> Self {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str::<Config>(&text) {
                Ok(cfg) => {
                    info!("[Config] ✅ 已加载 {:?}", path);
                    cfg
                }
                Err(e) => {
                    warn!("[Config] ⚠ 解析失败: {}, 使用默认配置", e);
                    Config::default()
                }
            },
            Err(_) => {
                info!("[Config] ℹ {:?} 不存在, 使用默认配置", path);
                Config::default()
            }
        };
        if cfg.theme.dir.is_relative() {
            if let Some(base) = path.parent() {
                cfg.theme.dir = base.join(&cfg.theme.dir);
            }
        }
        info!(
            "[Config]   theme={:?}, cand_per_row={}, use_cursor={}, dpi={}",
            cfg.theme.dir, cfg.window.cand_per_row, cfg.window.use_cursor, cfg.window.dpi
        );
        cfg
    }

    fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("config.toml")))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_defaults() {
        let cfg = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(cfg.window.cand_per_row, 1);
        assert!(cfg.window.use_cursor);
        assert_eq!(cfg.window.dpi_override(), None);
        assert_eq!(cfg.theme.dir, PathBuf::from("/nonexistent/themes/default"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let theme_dir = dir.path().join("my-theme");
        let text = format!("[window]\ncand_per_row = 3\ndpi = 144\n[theme]\ndir = '{}'\n", theme_dir.display());
        std::fs::write(&path, text).unwrap();
        let cfg = Config::load_from(&path);
        assert_eq!(cfg.window.cand_per_row, 3);
        assert!(cfg.window.use_cursor);
        assert_eq!(cfg.window.dpi_override(), Some(Dpi::new(144, 144)));
        assert_eq!(cfg.theme.dir, theme_dir);
    }

    #[test]
    fn test_broken_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[window\n").unwrap();
        let cfg = Config::load_from(&path);
        assert_eq!(cfg.window.cand_per_row, 1);
        assert_eq!(cfg.theme.dir, dir.path().join("themes/default"));
    }
}
