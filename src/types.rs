// Core types shared by the compositor, dumper and presenter.

/// Native frame size of the background plane (SNES resolution).
pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 224;

/// Bytes per pixel in the framebuffer ([B, G, R, A]).
pub const BYTES_PER_PIXEL: usize = 4;

pub struct FrameBuffer {
    pub width: usize,    // pixels per row
    pub height: usize,   // rows
    pub pixels: Vec<u8>, // width * height * 4, each pixel stored as [B, G, R, A]
}

impl FrameBuffer {
    /// Allocate a zeroed (transparent black) buffer once; it is reused every frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u8; width * height * BYTES_PER_PIXEL] }
    }

    /// Bytes per row.
    #[inline]
    pub fn pitch(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }

    /// Read one pixel back as (r, g, b, a).
    #[inline]
    pub fn rgba_at(&self, x: usize, y: usize) -> (u8, u8, u8, u8) {
        let i = (y * self.width + x) * BYTES_PER_PIXEL;
        let p = &self.pixels[i..i + BYTES_PER_PIXEL];
        (p[2], p[1], p[0], p[3])
    }

    /// Zero every byte without reallocating.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }
}

/// Per-run composition settings, decided once before the loop starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composition {
    pub alpha1: f32,           // weight of the base layer
    pub alpha2: f32,           // weight of the blended layer (0.0 in single-layer mode)
    pub letterbox_rows: usize, // rows forced black at top and bottom
    pub frameskip: u32,        // tick increment per displayed frame
}

impl Composition {
    /// Pick the alpha pair from whether a second layer survived construction.
    /// Two layers share the frame equally; a lone layer gets full weight.
    pub fn resolve(two_layers: bool, letterbox_rows: usize, frameskip: u32) -> Self {
        let (alpha1, alpha2) = if two_layers { (0.5, 0.5) } else { (1.0, 0.0) };
        Self { alpha1, alpha2, letterbox_rows, frameskip }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn framebuffer_is_bgra_sized_and_zeroed() {
        let fb = FrameBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        assert_eq!(fb.pixels.len(), 256 * 224 * 4);
        assert_eq!(fb.pitch(), 1024);
        assert!(fb.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn rgba_at_reads_bgra_layout() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.pixels[4..8].copy_from_slice(&[10, 20, 30, 40]);
        assert_eq!(fb.rgba_at(1, 0), (30, 20, 10, 40));
    }

    #[test]
    fn single_layer_gets_full_weight() {
        let c = Composition::resolve(false, 0, 1);
        assert_relative_eq!(c.alpha1, 1.0);
        assert_relative_eq!(c.alpha2, 0.0);
    }

    #[test]
    fn two_layers_split_evenly_and_sum_to_one() {
        let c = Composition::resolve(true, 16, 2);
        assert_relative_eq!(c.alpha1, 0.5);
        assert_relative_eq!(c.alpha2, 0.5);
        assert_relative_eq!(c.alpha1 + c.alpha2, 1.0);
        assert_eq!(c.letterbox_rows, 16);
        assert_eq!(c.frameskip, 2);
    }
}
