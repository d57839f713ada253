// ============================================================================
// BLURFX — GPU blur video filter core
// ============================================================================
//
// A multi-pass blur filter for a video compositing host: capture the source
// frame, optionally convert color space, run a separable two-pass blur
// (box / gaussian / bilateral), optionally restrict it to a feathered
// rectangular region, and composite the result back.
//
// Architecture:
//   logger.rs — session log file + log macros
//   config.rs — FilterData: typed configuration store with defaults
//   host.rs   — host-facing filter contract (traits + registration)
//   region.rs — rectangular region mask model
//   blur.rs   — blur module, per-source instances, render pipeline driver
//   gpu/      — wgpu context, effects, kernel texture, render targets
// ============================================================================

#![allow(clippy::too_many_arguments)]

pub mod logger;

pub mod blur;
pub mod config;
pub mod gpu;
pub mod host;
pub mod region;

pub use blur::{BlurInstance, BlurModule, BlurSettings, BlurType, ColorFormat};
pub use config::FilterData;
pub use host::{FilterHost, FilterInfo, FilterOutput, FrameContext, FrameSource, VideoFilter};
