use std::io::Write;

use serde::Serialize;

use crate::{FramePacket, RenderConfig, RenderError};

/// Consumer of extracted frames. `begin` runs once before the first packet.
pub trait FrameSink {
    fn begin(&mut self, _config: &RenderConfig) -> Result<(), RenderError> { Ok(()) }
    fn submit(&mut self, packet: &FramePacket) -> Result<(), RenderError>;
    fn finish(&mut self) -> Result<(), RenderError> { Ok(()) }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn begin(&mut self, config: &RenderConfig) -> Result<(), RenderError> { (**self).begin(config) }
    fn submit(&mut self, packet: &FramePacket) -> Result<(), RenderError> { (**self).submit(packet) }
    fn finish(&mut self) -> Result<(), RenderError> { (**self).finish() }
}

/// Discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn submit(&mut self, _packet: &FramePacket) -> Result<(), RenderError> { Ok(()) }
}

/// Keeps packets in memory.
#[derive(Clone, Debug, Default)]
pub struct CollectSink {
    pub config: Option<RenderConfig>,
    pub frames: Vec<FramePacket>,
    pub finished: bool,
}

impl FrameSink for CollectSink {
    fn begin(&mut self, config: &RenderConfig) -> Result<(), RenderError> {
        self.config = Some(config.clone());
        Ok(())
    }
    fn submit(&mut self, packet: &FramePacket) -> Result<(), RenderError> {
        self.frames.push(packet.clone());
        Ok(())
    }
    fn finish(&mut self) -> Result<(), RenderError> {
        self.finished = true;
        Ok(())
    }
}

/// Prints one line per drawable every `every` frames.
#[derive(Clone, Debug)]
pub struct ConsoleSink {
    every: u64,
}

impl ConsoleSink {
    pub fn new(every: u64) -> Self { Self { every: every.max(1) } }
}

impl FrameSink for ConsoleSink {
    fn begin(&mut self, config: &RenderConfig) -> Result<(), RenderError> {
        println!("[frames] {} drawables, aspect {:.3}", config.drawables.len(), config.aspect);
        Ok(())
    }

    fn submit(&mut self, packet: &FramePacket) -> Result<(), RenderError> {
        if packet.frame % self.every != 0 { return Ok(()); }
        println!("[frame {:>6}] t={:.3}s", packet.frame, packet.time);
        for i in &packet.instances {
            let [x, y, z] = i.pose.translation;
            println!("  {:<12} pos=({x:>8.3},{y:>8.3},{z:>8.3})", i.label);
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Line<'a> {
    Config(&'a RenderConfig),
    Frame(&'a FramePacket),
}

/// One JSON object per line: a `config` record, then a `frame` record per packet.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self { Self { out } }
    pub fn into_inner(self) -> W { self.out }

    fn line<T: Serialize>(&mut self, value: &T) -> Result<(), RenderError> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl JsonLinesSink<std::io::BufWriter<std::fs::File>> {
    pub fn create(path: impl AsRef<std::path::Path>) -> Result<Self, RenderError> {
        Ok(Self::new(std::io::BufWriter::new(std::fs::File::create(path)?)))
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn begin(&mut self, config: &RenderConfig) -> Result<(), RenderError> { self.line(&Line::Config(config)) }
    fn submit(&mut self, packet: &FramePacket) -> Result<(), RenderError> { self.line(&Line::Frame(packet)) }
    fn finish(&mut self) -> Result<(), RenderError> {
        self.out.flush()?;
        Ok(())
    }
}
