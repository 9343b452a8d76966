// Window output.
// `Presenter` is what the loop talks to; `Drawer` is the minifb window behind it.
// What you see: the composited frame, scaled up 3x, replaced every iteration.

use minifb::{Key, ScaleMode, Window, WindowOptions};

use crate::error::Error;
use crate::types::{BYTES_PER_PIXEL, FrameBuffer};

pub const WINDOW_SCALE: usize = 3;

pub trait Presenter {
    /// True once the user has asked to quit (window closed or ESC).
    fn poll_quit(&mut self) -> bool;

    /// Upload `frame` and show it.
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), Error>;

    fn set_title(&mut self, _title: &str) {}
}

pub struct Drawer {
    window: Window,    // the on-screen window you see
    staging: Vec<u32>, // 0x00RRGGBB copy of the framebuffer for minifb
}

impl Drawer {
    /// Open a resizable window `scale` times the frame size.
    /// Resizing keeps the aspect ratio and stays pixel-sharp.
    pub fn new(title: &str, width: usize, height: usize, scale: usize) -> Result<Self, Error> {
        let opts = WindowOptions {
            resize: true,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        };
        let window = Window::new(title, width * scale, height * scale, opts)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window, staging: vec![0u32; width * height] })
    }
}

impl Presenter for Drawer {
    fn poll_quit(&mut self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Escape)
    }

    fn present(&mut self, frame: &FrameBuffer) -> Result<(), Error> {
        pack_bgra(&frame.pixels, &mut self.staging);
        self.window
            .update_with_buffer(&self.staging, frame.width, frame.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

/// Repack [B, G, R, A] bytes into 0x00RRGGBB words, reusing `out`.
pub fn pack_bgra(bgra: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        bgra.chunks_exact(BYTES_PER_PIXEL)
            .map(|p| u32::from_le_bytes([p[0], p[1], p[2], 0])),
    );
}
