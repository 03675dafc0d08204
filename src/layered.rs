//! # 分层窗口呈现（Windows）
//!
//! `WS_EX_LAYERED` 弹出窗口，每帧通过 `UpdateLayeredWindow` + `ULW_ALPHA`
//! 用一张 32bpp 预乘 BGRA 位图整体替换窗口内容。
//! 每次呈现用到的 DC / 位图都由守卫对象持有，函数返回时无条件释放。

use std::ffi::c_void;
use std::sync::Once;
use log::info;
use tiny_skia::Pixmap;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;
use crate::error::{CandError, Result};
use crate::geometry::{Dpi, Point, Size};
use crate::ui::Presenter;

const WND_CLASS: PCWSTR = w!("CandWinLayered");
static REGISTER_ONCE: Once = Once::new();

// ============================================================
// GDI 资源守卫
// ============================================================

struct ScreenDc(HDC);

impl ScreenDc {
    unsafe fn get() -> Self {
        Self(GetDC(None))
    }
}

impl Drop for ScreenDc {
    fn drop(&mut self) {
        unsafe { ReleaseDC(None, self.0); }
    }
}

struct MemoryDc(HDC);

impl Drop for MemoryDc {
    fn drop(&mut self) {
        unsafe { let _ = DeleteDC(self.0); }
    }
}

struct GdiObject(HGDIOBJ);

impl Drop for GdiObject {
    fn drop(&mut self) {
        unsafe { let _ = DeleteObject(self.0); }
    }
}

struct Selected {
    dc: HDC,
    old: HGDIOBJ,
}

impl Selected {
    unsafe fn new(dc: HDC, obj: HGDIOBJ) -> Self {
        Self { dc, old: SelectObject(dc, obj) }
    }
}

impl Drop for Selected {
    fn drop(&mut self) {
        unsafe { SelectObject(self.dc, self.old); }
    }
}

// ============================================================
// LayeredWindow
// ============================================================

/// 置顶、不抢焦点的逐像素透明窗口
pub struct LayeredWindow {
    hwnd: HWND,
}

impl LayeredWindow {
    /// 创建窗口（初始隐藏）
    pub fn new() -> Result<Self> {
        register_class()?;

        let hwnd = unsafe {
            let hinstance = GetModuleHandleW(None)?;
            let ex_style = WS_EX_TOPMOST | WS_EX_LAYERED | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE;
            let hinstance_val: HINSTANCE = hinstance.into();
            CreateWindowExW(
                ex_style,
                WND_CLASS,
                w!("CandWin"),
                WS_POPUP,
                0, 0, 1, 1,
                None, None,
                hinstance_val,
                None,
            )?
        };

        info!("[Layered] 分层窗口已创建");
        Ok(Self { hwnd })
    }
}

impl Drop for LayeredWindow {
    fn drop(&mut self) {
        unsafe { let _ = DestroyWindow(self.hwnd); }
    }
}

impl Presenter for LayeredWindow {
    fn dpi(&self) -> Dpi {
        unsafe {
            let screen = ScreenDc::get();
            Dpi::new(GetDeviceCaps(screen.0, LOGPIXELSX), GetDeviceCaps(screen.0, LOGPIXELSY))
        }
    }

    fn resize(&mut self, size: Size) {
        unsafe {
            let _ = SetWindowPos(
                self.hwnd, None, 0, 0, size.width, size.height,
                SWP_NOMOVE | SWP_NOZORDER | SWP_NOACTIVATE,
            );
        }
    }

    fn present(&mut self, position: Point, frame: &Pixmap) -> Result<()> {
        let (w, h) = (frame.width() as i32, frame.height() as i32);
        unsafe {
            let screen = ScreenDc::get();
            let mem = MemoryDc(CreateCompatibleDC(screen.0));
            if mem.0.is_invalid() {
                return Err(CandError::Present("CreateCompatibleDC 失败".into()));
            }

            let bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: w,
                    biHeight: -h, // 自上而下
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let mut bits: *mut c_void = std::ptr::null_mut();
            let bmp = CreateDIBSection(mem.0, &bmi, DIB_RGB_COLORS, &mut bits, None, 0)?;
            let bmp = GdiObject(HGDIOBJ(bmp.0));
            if bits.is_null() {
                return Err(CandError::SurfaceAlloc { width: w, height: h });
            }

            // 预乘 RGBA → 预乘 BGRA
            let dst = std::slice::from_raw_parts_mut(bits as *mut u8, frame.pixels().len() * 4);
            for (d, p) in dst.chunks_exact_mut(4).zip(frame.pixels()) {
                d[0] = p.blue();
                d[1] = p.green();
                d[2] = p.red();
                d[3] = p.alpha();
            }

            let _selected = Selected::new(mem.0, bmp.0);
            let dst_pt = POINT { x: position.x, y: position.y };
            let size = SIZE { cx: w, cy: h };
            let src_pt = POINT::default();
            let blend = BLENDFUNCTION {
                BlendOp: AC_SRC_OVER as u8,
                BlendFlags: 0,
                SourceConstantAlpha: 255,
                AlphaFormat: AC_SRC_ALPHA as u8,
            };
            UpdateLayeredWindow(
                self.hwnd,
                screen.0,
                Some(&dst_pt as *const _),
                Some(&size as *const _),
                mem.0,
                Some(&src_pt as *const _),
                COLORREF(0),
                Some(&blend as *const _),
                ULW_ALPHA,
            )?;
        }
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        unsafe {
            if visible {
                let _ = SetWindowPos(
                    self.hwnd, HWND_TOPMOST, 0, 0, 0, 0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE | SWP_SHOWWINDOW,
                );
            } else {
                let _ = ShowWindow(self.hwnd, SW_HIDE);
            }
        }
    }
}

// ============================================================
// 消息循环
// ============================================================

/// 运行 Win32 消息循环（阻塞直到收到 WM_QUIT）
pub fn run_message_loop() {
    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

fn register_class() -> Result<()> {
    let mut result: Result<()> = Ok(());
    REGISTER_ONCE.call_once(|| {
        unsafe {
            let hinstance = match GetModuleHandleW(None) {
                Ok(h) => h,
                Err(e) => { result = Err(e.into()); return; }
            };
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(wnd_proc),
                hInstance: hinstance.into(),
                lpszClassName: WND_CLASS,
                hCursor: LoadCursorW(None, IDC_ARROW).ok().unwrap_or_default(),
                ..Default::default()
            };
            if RegisterClassExW(&wc) == 0 {
                result = Err(Error::from_win32().into());
            }
        }
    });
    result
}

/// 分层窗口的内容只由 `UpdateLayeredWindow` 提供，系统不会发送 `WM_PAINT`，
/// 所以这里没有绘制分支，窗口类也不需要 `CS_HREDRAW | CS_VREDRAW`
unsafe extern "system" fn wnd_proc(
    hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_ERASEBKGND => LRESULT(1),
        WM_MOUSEACTIVATE => LRESULT(MA_NOACTIVATE as isize),
        WM_KEYDOWN if wparam.0 == 0x1B => { // ESC
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
