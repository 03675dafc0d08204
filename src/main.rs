//! # candwin-preview — 候选窗口离屏预览
//!
//! 加载配置和主题，填入候选，回放一串方向键，渲染一帧写成 PNG。
//! Windows 上加 `--live` 直接弹出真实的分层窗口（ESC 退出）。
//!
//! ```text
//! candwin-preview [--config FILE] [--theme DIR] [--out FILE] [--dpi N]
//!                 [--composition TEXT] [--keys left,right,up,down,enter]
//!                 [--per-row N] [--live] 候选1 候选2 ...
//! ```

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use candwin::config::Config;
use candwin::{CandidateWindow, CodecDecoder, Dpi, FontdueRasterizer, HeadlessPresenter, NavKey, Presenter, Theme, UiElement};

// ============================================================
// 命令行
// ============================================================

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    theme: Option<PathBuf>,
    out: Option<PathBuf>,
    dpi: Option<i32>,
    per_row: Option<usize>,
    composition: String,
    keys: Vec<NavKey>,
    live: bool,
    candidates: Vec<String>,
}

fn parse_key(name: &str) -> Result<NavKey> {
    Ok(match name.trim().to_ascii_lowercase().as_str() {
        "left" => NavKey::Left,
        "right" => NavKey::Right,
        "up" => NavKey::Up,
        "down" => NavKey::Down,
        "enter" | "return" => NavKey::Confirm,
        other => bail!("未知按键: {}", other),
    })
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().with_context(|| format!("{} 缺少参数", flag));
        match arg.as_str() {
            "--config" => args.config = Some(value("--config")?.into()),
            "--theme" => args.theme = Some(value("--theme")?.into()),
            "--out" => args.out = Some(value("--out")?.into()),
            "--composition" => args.composition = value("--composition")?,
            "--dpi" => {
                let v = value("--dpi")?;
                args.dpi = Some(v.parse().with_context(|| format!("无效 DPI: {}", v))?);
            }
            "--per-row" => {
                let v = value("--per-row")?;
                args.per_row = Some(v.parse().with_context(|| format!("无效每行数: {}", v))?);
            }
            "--keys" => {
                for name in value("--keys")?.split(',').filter(|s| !s.trim().is_empty()) {
                    args.keys.push(parse_key(name)?);
                }
            }
            "--live" => args.live = true,
            flag if flag.starts_with("--") => bail!("未知参数: {}", flag),
            _ => args.candidates.push(arg.clone()),
        }
    }
    Ok(args)
}

// ============================================================
// 主入口
// ============================================================

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn")
    ).init();

    let args = parse_args(std::env::args().skip(1))?;

    let cfg = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let theme_dir = args.theme.clone().unwrap_or_else(|| cfg.theme.dir.clone());
    let theme = Theme::load(&theme_dir, &CodecDecoder)
        .with_context(|| format!("加载主题失败: {:?}", theme_dir))?;
    let theme = Arc::new(theme);
    let rasterizer = Rc::new(FontdueRasterizer::new());

    if args.live {
        return run_live(&args, &cfg, theme, rasterizer);
    }

    let dpi = args
        .dpi
        .map(|d| Dpi::new(d, d))
        .or_else(|| cfg.window.dpi_override())
        .unwrap_or_default();
    let mut win = CandidateWindow::new(theme, rasterizer, HeadlessPresenter::new(dpi));
    populate(&mut win, &args, &cfg);

    let frame = win
        .presenter()
        .frame
        .as_ref()
        .context("候选窗口为空，没有可输出的帧")?;
    let out = args.out.clone().unwrap_or_else(|| PathBuf::from("candwin.png"));
    frame
        .save_png(&out)
        .with_context(|| format!("写入 {:?} 失败", out))?;

    let size = win.size();
    println!("  ✅ {}x{} @ {} dpi → {}", size.width, size.height, dpi.y, out.display());
    if win.has_result() {
        println!("  ✅ 已确认: {}", win.items()[win.current_sel()].text);
    }
    Ok(())
}

/// 填入候选、应用配置、回放按键
fn populate<P: Presenter>(win: &mut CandidateWindow<P>, args: &Args, cfg: &Config) {
    win.set_cand_per_row(args.per_row.unwrap_or(cfg.window.cand_per_row));
    win.set_use_cursor(cfg.window.use_cursor);
    win.set_composition(args.composition.clone());
    let keys: Vec<char> = ('1'..='9').take(args.candidates.len()).collect();
    win.set_items(args.candidates.iter().cloned(), &keys);
    win.set_position(cfg.window.x, cfg.window.y);
    for key in &args.keys {
        let eaten = win.navigate(*key);
        log::debug!("[Preview] {:?} → eaten={}", key, eaten);
    }
    win.show(true);
}

#[cfg(windows)]
fn run_live(args: &Args, cfg: &Config, theme: Arc<Theme>, rasterizer: Rc<FontdueRasterizer>) -> Result<()> {
    use candwin::layered::{run_message_loop, LayeredWindow};

    let presenter = LayeredWindow::new().context("创建分层窗口失败")?;
    let mut win = CandidateWindow::new(theme, rasterizer, presenter);
    populate(&mut win, args, cfg);
    println!("  ✅ 候选窗口已显示，在窗口上按 ESC 退出");
    run_message_loop();
    Ok(())
}

#[cfg(not(windows))]
fn run_live(_: &Args, _: &Config, _: Arc<Theme>, _: Rc<FontdueRasterizer>) -> Result<()> {
    bail!("--live 仅在 Windows 上可用")
}
