// Background layer viewer.
// What you SEE:
// • One or two animated background layers pulled from a ROM, mixed 50/50
//   when there are two, scaled up 3x at 30 fps.
// • Optional black letterbox bands at the top and bottom.
// • ESC or closing the window quits. With --dump, frames 0, 15 and 29 are
//   written as PPM files and the viewer closes itself after 30 frames.

mod app;
mod args;
mod compositor;
mod display;
mod dump;
mod error;
mod layer;
mod pacer;
mod rom;
mod types;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::error::ErrorKind;
use env_logger::Env;
use log::info;

use app::{Layers, LoopController, RunSummary, WINDOW_TITLE, open_base_layer, open_second_layer};
use compositor::Compositor;
use display::{Drawer, WINDOW_SCALE};
use dump::FrameDumper;
use error::Error;
use pacer::Pacer;
use rom::RomImage;
use types::{Composition, SCREEN_HEIGHT, SCREEN_WIDTH};

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    ExitCode::from(exit_status(run(), &mut io::stderr()))
}

/// Exit status for a finished run. Fatal errors go straight to `err_out`
/// (stderr in practice) so they show even with RUST_LOG=off.
fn exit_status(result: Result<RunSummary, Error>, err_out: &mut dyn Write) -> u8 {
    match result {
        Ok(summary) => {
            info!("Stopped after {} frames (tick={})", summary.frames, summary.tick);
            0
        }
        Err(Error::Usage(e)) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            }
        }
        Err(e) => {
            let _ = writeln!(err_out, "Error: {e}");
            1
        }
    }
}

/// Everything acquired here is scope-owned, so every exit path (errors
/// included) closes the window before the process ends.
fn run() -> Result<RunSummary, Error> {
    /* --- Arguments ---
       Bad numbers quietly become defaults; only a missing ROM path stops us. */
    let config = args::resolve(std::env::args_os())?;
    info!(
        "Loading with layer1={} layer2={} frameskip={} aspectRatio={}",
        config.layer1, config.layer2, config.frameskip, config.aspect_ratio
    );

    /* --- ROM + window ---
       Visual: an empty 768x672 window appears once the ROM has loaded. */
    let rom = RomImage::load(&config.rom_path)?;
    info!("ROM loaded: {} ({} bytes)", config.rom_path.display(), rom.size());

    let mut drawer = Drawer::new(WINDOW_TITLE, SCREEN_WIDTH, SCREEN_HEIGHT, WINDOW_SCALE)?;

    /* --- Layers ---
       Visual: layer 1 is the picture; layer 2 (if it loads) is mixed in 50/50.
       A broken layer 2 just leaves layer 1 on its own at full strength. */
    let base = open_base_layer(&rom, config.layer1)?;
    let blend = config.second_layer().and_then(|id| open_second_layer(&rom, id));

    let params =
        Composition::resolve(blend.is_some(), config.aspect_ratio as usize, config.frameskip);
    info!("alpha1={} alpha2={}", params.alpha1, params.alpha2);

    /* --- Reusable frame + loop helpers ---
       Visual: the framebuffer is the image you actually see each frame. */
    let mut compositor = Compositor::new(SCREEN_WIDTH, SCREEN_HEIGHT, params);
    let dumper = FrameDumper::new(".", config.dump_frames);
    if dumper.is_enabled() {
        info!("Dump mode: writing frames 0, 15 and 29, stopping after 30");
    }
    let layers = Layers { base: base.as_ref(), blend: blend.as_deref() };
    let mut pacer = Pacer::default();

    LoopController::new(params.frameskip).run(
        &mut drawer,
        &mut compositor,
        &layers,
        &dumper,
        &mut pacer,
    )
}
