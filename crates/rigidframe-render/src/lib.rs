//! Renderer-facing frame data.
//! - [`BodyPose`]: translation + orthonormal 3x3 rotation per drawable
//! - [`PoseExtractor`]: reads poses from a stepped world, bodies and vehicle wheels alike
//! - [`FrameSink`]: where packets go (console, JSON lines, memory)
//! - [`RenderConfig`]: static uniforms sent once before the first frame

mod config;
mod error;
mod extract;
mod pose;
mod sink;

pub use config::RenderConfig;
pub use error::RenderError;
pub use extract::{DrawSource, Drawable, FramePacket, Instance, PoseExtractor, ShapeKind};
pub use pose::BodyPose;
pub use sink::{CollectSink, ConsoleSink, FrameSink, JsonLinesSink, NullSink};
