// Startup helpers for the layers and the main display loop.
// Per iteration, in order: poll quit, composite, dump (maybe), present, pace.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::compositor::Compositor;
use crate::display::Presenter;
use crate::dump::FrameDumper;
use crate::error::Error;
use crate::layer::{LayerSampler, open_layer};
use crate::pacer::Pacer;
use crate::rom::RomImage;

pub const WINDOW_TITLE: &str = "Background Layer Viewer";

/// The base layer has to work; anything else ends startup.
pub fn open_base_layer(rom: &RomImage, id: u16) -> Result<Box<dyn LayerSampler + '_>, Error> {
    let layer = open_layer(rom, id)?;
    if !layer.is_valid() {
        return Err(Error::InvalidLayer { id, reason: "layer data could not be decoded".into() });
    }
    Ok(layer)
}

/// The second layer is optional: any failure drops it and we carry on with one.
pub fn open_second_layer(rom: &RomImage, id: u16) -> Option<Box<dyn LayerSampler + '_>> {
    match open_layer(rom, id) {
        Ok(layer) if layer.is_valid() => Some(layer),
        Ok(_) => {
            warn!("Failed to load layer2 ({id}); continuing with layer1 only");
            None
        }
        Err(e) => {
            warn!("{e}; continuing with layer1 only");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Counters at the moment the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u32,
    pub tick: u32,
}

/// Borrowed view of the layers for the loop's lifetime.
pub struct Layers<'a> {
    pub base: &'a dyn LayerSampler,
    pub blend: Option<&'a dyn LayerSampler>,
}

pub struct LoopController {
    state: LoopState,
    tick: u32,
    frame_count: u32,
    frameskip: u32,
    // FPS readout, refreshed once per second
    fps_window_start: Instant,
    frames_this_second: u32,
}

impl LoopController {
    pub fn new(frameskip: u32) -> Self {
        Self {
            state: LoopState::Running,
            tick: 0,
            frame_count: 0,
            frameskip,
            fps_window_start: Instant::now(),
            frames_this_second: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary { frames: self.frame_count, tick: self.tick }
    }

    /// Drive iterations until the loop stops.
    pub fn run<P: Presenter>(
        &mut self,
        presenter: &mut P,
        compositor: &mut Compositor,
        layers: &Layers<'_>,
        dumper: &FrameDumper,
        pacer: &mut Pacer,
    ) -> Result<RunSummary, Error> {
        while self.state() == LoopState::Running {
            self.step(presenter, compositor, layers, dumper, pacer)?;
        }
        Ok(self.summary())
    }

    /// One full iteration. A quit seen while polling still lets this frame finish.
    pub fn step<P: Presenter>(
        &mut self,
        presenter: &mut P,
        compositor: &mut Compositor,
        layers: &Layers<'_>,
        dumper: &FrameDumper,
        pacer: &mut Pacer,
    ) -> Result<(), Error> {
        pacer.begin();

        /* 1) Events. A quit is remembered; this frame still gets drawn. */
        let quit = presenter.poll_quit();

        /* 2) Build the frame: clear, layer 1, layer 2, letterbox.
           Visual: the finished image, bands already on top. */
        let frame = compositor.composite(layers.base, layers.blend, self.tick);

        /* 3) Dump (frames 0, 15, 29 only) exactly what is about to be shown. */
        dumper.maybe_dump(frame, self.frame_count, self.tick);

        /* 4) Present. Visual: the window updates here. */
        presenter.present(frame)?;

        self.tick = self.tick.saturating_add(self.frameskip);
        self.frame_count += 1;

        if quit || dumper.is_finished(self.frame_count) {
            self.state = LoopState::Stopped;
        }

        /* 5) FPS readout, then sleep out the rest of the 33 ms. */
        self.update_fps(presenter);
        pacer.finish();
        Ok(())
    }

    fn update_fps<P: Presenter>(&mut self, presenter: &mut P) {
        self.frames_this_second += 1;
        let elapsed = self.fps_window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames_this_second as f32 / elapsed.as_secs_f32();
            debug!("FPS: {fps:.1} (tick={})", self.tick);
            presenter.set_title(&format!("{WINDOW_TITLE} | FPS: {fps:.1}"));
            self.frames_this_second = 0;
            self.fps_window_start = Instant::now();
        }
    }
}
