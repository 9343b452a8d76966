// Frame capture for checking output outside the window.
// In dump mode frames 0, 15 and 29 are written as binary PPM (P6) files and
// the run ends after 30 frames.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use log::{debug, info, warn};

use crate::error::Error;
use crate::types::FrameBuffer;

pub const DUMP_FRAMES: [u32; 3] = [0, 15, 29];
/// Displayed frames after which a dump run stops on its own.
pub const DUMP_FRAME_LIMIT: u32 = 30;

pub struct FrameDumper {
    dir: PathBuf,
    enabled: bool,
}

impl FrameDumper {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self { dir: dir.into(), enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True once a dump run has shown all the frames it needs.
    pub fn is_finished(&self, frames_shown: u32) -> bool {
        self.enabled && frames_shown >= DUMP_FRAME_LIMIT
    }

    pub fn wants(&self, frame_index: u32) -> bool {
        self.enabled && DUMP_FRAMES.contains(&frame_index)
    }

    pub fn path_for(&self, frame_index: u32) -> PathBuf {
        self.dir.join(format!("frame_{frame_index:03}.ppm"))
    }

    /// Write `fb` if `frame_index` is one we capture. Returns the file written.
    /// A file that can't be created is skipped quietly; nothing here stops the loop.
    pub fn maybe_dump(&self, fb: &FrameBuffer, frame_index: u32, tick: u32) -> Option<PathBuf> {
        if !self.wants(frame_index) {
            return None;
        }
        let path = self.path_for(frame_index);
        let file = match File::create(&path) {
            Ok(f) => f,
            Err(e) => {
                debug!("skipping dump of frame {frame_index}: {}: {e}", path.display());
                return None;
            }
        };

        match write_ppm(fb, BufWriter::new(file), &path) {
            Ok(()) => {
                info!("Wrote {} at tick={tick}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}

/// Drop alpha and reorder [B, G, R, A] into an RGB image.
pub fn to_rgb_image(fb: &FrameBuffer) -> RgbImage {
    RgbImage::from_fn(fb.width as u32, fb.height as u32, |x, y| {
        let (r, g, b, _) = fb.rgba_at(x as usize, y as usize);
        Rgb([r, g, b])
    })
}

fn write_ppm<W: Write>(fb: &FrameBuffer, mut out: W, path: &Path) -> Result<(), Error> {
    let fail = |reason: String| Error::DumpWrite { path: path.to_path_buf(), reason };
    let rgb = to_rgb_image(fb);
    PnmEncoder::new(&mut out)
        .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| fail(e.to_string()))?;
    out.flush().map_err(|e| fail(e.to_string()))
}
