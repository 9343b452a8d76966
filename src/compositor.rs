// Builds one finished frame per call: clear, base layer, optional blended
// layer, then the letterbox bands on top of everything.

use crate::layer::LayerSampler;
use crate::types::{BYTES_PER_PIXEL, Composition, FrameBuffer};

const LETTERBOX_PIXEL: [u8; BYTES_PER_PIXEL] = [0, 0, 0, 255]; // opaque black in BGRA

pub struct Compositor {
    frame: FrameBuffer,
    params: Composition,
}

impl Compositor {
    pub fn new(width: usize, height: usize, params: Composition) -> Self {
        Self { frame: FrameBuffer::new(width, height), params }
    }

    /// Render `tick` into the framebuffer and return it.
    /// `blend` is only drawn when present and valid.
    pub fn composite(
        &mut self,
        base: &dyn LayerSampler,
        blend: Option<&dyn LayerSampler>,
        tick: u32,
    ) -> &FrameBuffer {
        let (w, h) = (self.frame.width, self.frame.height);
        self.frame.clear();

        /* --- Base layer ---
           Visual: layer 1 fills the frame at alpha1 (erase, no blending). */
        base.overlay_frame(&mut self.frame.pixels, w, h, 0, tick, self.params.alpha1, true);

        /* --- Blended layer ---
           Visual: layer 2 added on top at alpha2, channels saturate. */
        if let Some(layer) = blend.filter(|l| l.is_valid()) {
            layer.overlay_frame(&mut self.frame.pixels, w, h, 0, tick, self.params.alpha2, false);
        }

        /* --- Letterbox ---
           Visual: black bands top and bottom, over both layers. */
        apply_letterbox(&mut self.frame, self.params.letterbox_rows);
        &self.frame
    }
}

/// Force the top and bottom `rows` rows to opaque black.
/// Margins taller than half the frame just black out the whole frame.
pub fn apply_letterbox(fb: &mut FrameBuffer, rows: usize) {
    if rows == 0 {
        return;
    }
    let rows = rows.min(fb.height);
    let pitch = fb.pitch();
    let total = fb.pixels.len();

    let top = &mut fb.pixels[..rows * pitch];
    fill_pixels(top);
    let bottom = &mut fb.pixels[total - rows * pitch..];
    fill_pixels(bottom);
}

#[inline]
fn fill_pixels(bytes: &mut [u8]) {
    for px in bytes.chunks_exact_mut(BYTES_PER_PIXEL) {
        px.copy_from_slice(&LETTERBOX_PIXEL);
    }
}
