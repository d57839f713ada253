// ============================================================================
// GPU MODULE — wgpu plumbing for the blur pipeline
// ============================================================================
//
// Architecture:
//   context.rs — wgpu Device, Queue, adapter init
//   shaders.rs — all WGSL shader source (inline strings)
//   effect.rs  — named programs: techniques + declared parameter tables
//   kernel.rs  — precomputed gaussian weights as an R32Float texture
//   target.rs  — offscreen render targets + texture readback
// ============================================================================

pub mod context;
pub mod effect;
pub mod kernel;
pub mod shaders;
pub mod target;

pub use context::GpuContext;

use std::fmt;

/// Error raised while building process-wide GPU state (effects, kernel
/// texture) or while locating pieces of it afterwards.
#[derive(Debug)]
pub enum GpuError {
    /// Program source failed to validate or compile.
    EffectLoad {
        name: &'static str,
        reason: String,
    },
    /// A named program is not present in the registry.
    EffectNotFound(String),
    /// A program does not expose the requested technique.
    TechniqueNotFound {
        effect: &'static str,
        technique: String,
    },
    /// Texture allocation failed or exceeds device limits.
    TextureCreate {
        label: &'static str,
        reason: String,
    },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::EffectLoad { name, reason } => {
                write!(f, "effect '{}' failed to load: {}", name, reason)
            }
            GpuError::EffectNotFound(name) => write!(f, "effect '{}' is not registered", name),
            GpuError::TechniqueNotFound { effect, technique } => {
                write!(f, "effect '{}' has no technique '{}'", effect, technique)
            }
            GpuError::TextureCreate { label, reason } => {
                write!(f, "texture '{}' could not be created: {}", label, reason)
            }
        }
    }
}

impl std::error::Error for GpuError {}
