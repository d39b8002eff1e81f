use rigidframe_core::PhysicsError;
use rigidframe_render::{FrameSink, PoseExtractor, RenderConfig, RenderError};
use rigidframe_world::World;

use crate::{FrameHooks, FrameInfo};

/// Extracts poses after every step and feeds them to a sink.
///
/// Sink failures are logged and counted; the simulation keeps going. A pose lookup
/// on a destroyed id is a lifecycle bug and stops the loop.
pub struct Presenter<S: FrameSink> {
    extractor: PoseExtractor,
    sink: S,
    config: RenderConfig,
    started: bool,
    failures: u64,
}

impl<S: FrameSink> Presenter<S> {
    /// `config.drawables` is replaced by the extractor's list.
    pub fn new(extractor: PoseExtractor, sink: S, config: RenderConfig) -> Self {
        let config = config.with_drawables(extractor.drawables().to_vec());
        Self { extractor, sink, config, started: false, failures: 0 }
    }

    pub fn extractor(&self) -> &PoseExtractor { &self.extractor }
    pub fn extractor_mut(&mut self) -> &mut PoseExtractor { &mut self.extractor }
    pub fn sink(&self) -> &S { &self.sink }
    pub fn failures(&self) -> u64 { self.failures }

    fn report(&mut self, what: &str, e: RenderError) {
        self.failures += 1;
        eprintln!("[render] {what}: {e}");
    }

    /// Flush the sink and hand it back.
    pub fn finish(mut self) -> S {
        if let Err(e) = self.sink.finish() { self.report("finish", e); }
        self.sink
    }
}

impl<S: FrameSink> FrameHooks for Presenter<S> {
    fn after_step(&mut self, world: &World, frame: &FrameInfo) -> Result<(), PhysicsError> {
        if !self.started {
            self.started = true;
            self.config.drawables = self.extractor.drawables().to_vec();
            if let Err(e) = self.sink.begin(&self.config) { self.report("begin", e); }
        }
        match self.extractor.extract(world, frame.frame, frame.time) {
            Ok(packet) => {
                if let Err(e) = self.sink.submit(&packet) { self.report("submit", e); }
                Ok(())
            }
            Err(RenderError::Physics(e)) => Err(e),
            Err(e) => {
                self.report("extract", e);
                Ok(())
            }
        }
    }
}
