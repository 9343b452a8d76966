// Background layer samplers.
// A sampler writes one animated layer into a [B, G, R, A] framebuffer for a
// given tick. The compositor only sees the `LayerSampler` trait; `RomLayer`
// is the bundled sampler that builds its plane straight out of ROM bytes.

use crate::error::Error;
use crate::rom::RomImage;
use crate::types::BYTES_PER_PIXEL;

pub const MAX_LAYER_ID: u16 = 326;

const PALETTE_COLORS: usize = 16;
const PALETTE_BYTES: usize = PALETTE_COLORS * 2; // BGR555 words
const PATTERN_SIZE: usize = 32; // tile plane is 32x32 pixels
const PATTERN_BYTES: usize = PATTERN_SIZE * PATTERN_SIZE / 2; // 4 bits per pixel
const PARAM_BYTES: usize = 8;
/// Bytes one layer record occupies in the ROM layer table.
pub const LAYER_RECORD_BYTES: usize = PALETTE_BYTES + PATTERN_BYTES + PARAM_BYTES;

pub trait LayerSampler {
    /// False when the layer's data couldn't be decoded; such a layer must not be drawn.
    fn is_valid(&self) -> bool;

    /// Write this layer into `buffer` at `tick`.
    /// `erase` = base layer: overwrite whatever is there with `alpha * color`.
    /// Otherwise add `alpha * color` on top of the existing pixel.
    #[allow(clippy::too_many_arguments)]
    fn overlay_frame(
        &self,
        buffer: &mut [u8],
        width: usize,
        height: usize,
        base_offset: usize,
        tick: u32,
        alpha: f32,
        erase: bool,
    );
}

/// Build the sampler for `id`. Ids past `MAX_LAYER_ID` fail outright; ids whose
/// record runs off the end of the ROM construct fine but report invalid.
pub fn open_layer(rom: &RomImage, id: u16) -> Result<Box<dyn LayerSampler + '_>, Error> {
    if id > MAX_LAYER_ID {
        return Err(Error::InvalidLayer {
            id,
            reason: format!("id must be in 0..={MAX_LAYER_ID}"),
        });
    }
    Ok(Box::new(RomLayer::new(rom, id)))
}

/// Sine wobble applied per row, plus a constant scroll per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Distortion {
    amplitude: f32, // max horizontal shift in pixels
    frequency: f32, // radians per row
    speed: f32,     // radians per tick
    scroll_x: i32,  // pixels per tick
    scroll_y: i32,
}

impl Distortion {
    fn from_params(p: &[u8]) -> Self {
        Self {
            amplitude: (p[0] % 16) as f32,
            frequency: p[1] as f32 / 255.0 * 0.2,
            speed: p[2] as f32 / 255.0 * 0.25,
            scroll_x: (p[3] as i8 % 3) as i32,
            scroll_y: (p[4] as i8 % 3) as i32,
        }
    }

    /// Horizontal shift of row `y` at time `t`.
    #[inline]
    fn row_shift(&self, y: usize, t: f32) -> i32 {
        (self.amplitude * (self.frequency * y as f32 + self.speed * t).sin()).round() as i32
    }
}

pub struct RomLayer<'rom> {
    palette: [[u8; 3]; PALETTE_COLORS], // (r, g, b)
    pattern: &'rom [u8],
    distortion: Distortion,
    valid: bool,
}

impl<'rom> RomLayer<'rom> {
    pub fn new(rom: &'rom RomImage, id: u16) -> Self {
        let offset = id as usize * LAYER_RECORD_BYTES;
        match rom.slice(offset, LAYER_RECORD_BYTES) {
            Some(record) => {
                let (pal, rest) = record.split_at(PALETTE_BYTES);
                let (pattern, params) = rest.split_at(PATTERN_BYTES);
                let mut palette = [[0u8; 3]; PALETTE_COLORS];
                for (dst, word) in palette.iter_mut().zip(pal.chunks_exact(2)) {
                    *dst = bgr555_to_rgb(u16::from_le_bytes([word[0], word[1]]));
                }
                Self { palette, pattern, distortion: Distortion::from_params(params), valid: true }
            }
            None => Self {
                palette: [[0; 3]; PALETTE_COLORS],
                pattern: &[],
                distortion: Distortion::from_params(&[0; PARAM_BYTES]),
                valid: false,
            },
        }
    }

    /// Palette color of the tile plane at (u, v), wrapping in both directions.
    #[inline]
    fn color_at(&self, u: i32, v: i32) -> [u8; 3] {
        let n = PATTERN_SIZE as i32;
        let (u, v) = (u.rem_euclid(n) as usize, v.rem_euclid(n) as usize);
        let byte = self.pattern[(v * PATTERN_SIZE + u) / 2];
        let nibble = if u % 2 == 0 { byte & 0x0F } else { byte >> 4 };
        self.palette[nibble as usize]
    }
}

impl LayerSampler for RomLayer<'_> {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn overlay_frame(
        &self,
        buffer: &mut [u8],
        width: usize,
        height: usize,
        base_offset: usize,
        tick: u32,
        alpha: f32,
        erase: bool,
    ) {
        if !self.valid {
            return;
        }
        let end = base_offset + width * height * BYTES_PER_PIXEL;
        let Some(frame) = buffer.get_mut(base_offset..end) else {
            return;
        };

        let t = tick as f32;
        let d = &self.distortion;
        let scroll_x = d.scroll_x.wrapping_mul(tick as i32);
        let scroll_y = d.scroll_y.wrapping_mul(tick as i32);

        for (y, row) in frame.chunks_exact_mut(width * BYTES_PER_PIXEL).enumerate() {
            let shift = d.row_shift(y, t);
            let v = y as i32 + scroll_y;
            for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                let [r, g, b] = self.color_at(x as i32 + shift + scroll_x, v);
                write_weighted(px, [b, g, r], alpha, erase);
            }
        }
    }
}

/// Store `alpha * bgr` into one [B, G, R, A] pixel, replacing or adding.
#[inline]
fn write_weighted(px: &mut [u8], bgr: [u8; 3], alpha: f32, erase: bool) {
    for (dst, &src) in px.iter_mut().zip(bgr.iter()) {
        let weighted = src as f32 * alpha;
        let base = if erase { 0.0 } else { *dst as f32 };
        *dst = (base + weighted).round().clamp(0.0, 255.0) as u8;
    }
    px[3] = 255;
}

/// SNES color word (0bbbbbgggggrrrrr) to 8-bit (r, g, b).
#[inline]
fn bgr555_to_rgb(c: u16) -> [u8; 3] {
    let expand = |v: u16| -> u8 {
        let v = (v & 0x1F) as u8;
        (v << 3) | (v >> 2)
    };
    [expand(c), expand(c >> 5), expand(c >> 10)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::BANK_SIZE;

    /// ROM large enough for every layer id, filled with a repeating byte ramp.
    fn ramp_rom() -> RomImage {
        let len = (MAX_LAYER_ID as usize + 1) * LAYER_RECORD_BYTES;
        let data = (0..len.max(BANK_SIZE)).map(|i| (i * 7 % 251) as u8).collect();
        RomImage::from_bytes(data).unwrap()
    }

    /// ROM where layer 0 is a flat palette color 0 with no motion.
    fn flat_rom(color: u16) -> RomImage {
        let mut data = vec![0u8; BANK_SIZE];
        data[0..2].copy_from_slice(&color.to_le_bytes());
        RomImage::from_bytes(data).unwrap()
    }

    #[test]
    fn bgr555_expands_to_full_range() {
        assert_eq!(bgr555_to_rgb(0x7FFF), [255, 255, 255]);
        assert_eq!(bgr555_to_rgb(0x001F), [255, 0, 0]);
        assert_eq!(bgr555_to_rgb(0x03E0), [0, 255, 0]);
        assert_eq!(bgr555_to_rgb(0x7C00), [0, 0, 255]);
    }

    #[test]
    fn ids_past_max_fail_construction() {
        let rom = ramp_rom();
        let err = open_layer(&rom, MAX_LAYER_ID + 1).err().unwrap();
        assert!(matches!(err, Error::InvalidLayer { id: 327, .. }));
        assert!(open_layer(&rom, MAX_LAYER_ID).unwrap().is_valid());
    }

    #[test]
    fn record_past_end_of_rom_is_invalid() {
        let rom = RomImage::from_bytes(vec![0u8; BANK_SIZE]).unwrap();
        let last_fitting = (BANK_SIZE / LAYER_RECORD_BYTES - 1) as u16;
        assert!(RomLayer::new(&rom, last_fitting).is_valid());
        assert!(!RomLayer::new(&rom, last_fitting + 1).is_valid());
        assert!(!open_layer(&rom, 270).unwrap().is_valid());
    }

    #[test]
    fn erase_writes_weighted_color_and_opaque_alpha() {
        let rom = flat_rom(0x001F); // pure red
        let layer = RomLayer::new(&rom, 0);
        let mut buf = vec![0x55u8; 4 * 2 * 4];
        layer.overlay_frame(&mut buf, 4, 2, 0, 0, 0.5, true);
        for px in buf.chunks_exact(4) {
            assert_eq!(px, &[0, 0, 128, 255]);
        }
    }

    #[test]
    fn blend_adds_on_top_of_existing_pixels() {
        let rom = flat_rom(0x7C00); // pure blue
        let layer = RomLayer::new(&rom, 0);
        let mut buf = vec![0u8; 4 * 4];
        for px in buf.chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 128, 255]);
        }
        layer.overlay_frame(&mut buf, 4, 1, 0, 3, 0.5, false);
        for px in buf.chunks_exact(4) {
            assert_eq!(px, &[128, 0, 128, 255]);
        }
    }

    #[test]
    fn base_offset_leaves_leading_bytes_alone() {
        let rom = flat_rom(0x7FFF);
        let layer = RomLayer::new(&rom, 0);
        let mut buf = vec![9u8; 8 + 2 * 4];
        layer.overlay_frame(&mut buf, 2, 1, 8, 0, 1.0, true);
        assert_eq!(&buf[..8], &[9u8; 8]);
        assert_eq!(&buf[8..], &[255, 255, 255, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn short_buffer_is_left_untouched() {
        let rom = flat_rom(0x7FFF);
        let layer = RomLayer::new(&rom, 0);
        let mut buf = vec![1u8; 7];
        layer.overlay_frame(&mut buf, 2, 1, 0, 0, 1.0, true);
        assert_eq!(buf, vec![1u8; 7]);
    }

    #[test]
    fn output_depends_on_tick_for_moving_layers() {
        let rom = ramp_rom();
        let layer = (0..=MAX_LAYER_ID)
            .map(|id| RomLayer::new(&rom, id))
            .find(|l| l.distortion.amplitude > 0.0 && l.distortion.speed > 0.0)
            .expect("ramp ROM should contain a moving layer");
        let (w, h) = (64, 32);
        let mut a = vec![0u8; w * h * 4];
        let mut b = a.clone();
        layer.overlay_frame(&mut a, w, h, 0, 0, 1.0, true);
        layer.overlay_frame(&mut b, w, h, 0, 20, 1.0, true);
        assert_ne!(a, b);
    }

    #[test]
    fn same_tick_renders_identically() {
        let rom = ramp_rom();
        let layer = RomLayer::new(&rom, 270);
        let mut a = vec![0u8; 32 * 16 * 4];
        let mut b = vec![0xFFu8; 32 * 16 * 4];
        layer.overlay_frame(&mut a, 32, 16, 0, 7, 1.0, true);
        layer.overlay_frame(&mut b, 32, 16, 0, 7, 1.0, true);
        assert_eq!(a, b);
    }
}
