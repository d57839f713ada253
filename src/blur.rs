// ============================================================================
// BLUR FILTER — module state, per-source instances, render pipeline
// ============================================================================
//
// The module owns what every instance shares: the compiled programs and the
// gaussian kernel texture. Each attached source gets a `BlurInstance` with
// its own render targets; per frame the instance captures the source,
// optionally converts color space, runs the two separable passes and
// composites the result. Every failure path skips the frame — the host then
// presents the unmodified source.

use std::fmt;
use std::sync::Arc;

use crate::config::FilterData;
use crate::gpu::GpuError;
use crate::gpu::context::GpuContext;
use crate::gpu::effect::{
    Effect, EffectDesc, EffectRegistry, ParamDesc, ParamKind, PassInput, TechniqueBlend,
    TechniqueDesc,
};
use crate::gpu::kernel::KernelTexture;
use crate::gpu::shaders;
use crate::gpu::target::RenderTarget;
use crate::host::{FilterInfo, FilterOutput, FrameContext, OUTPUT_VIDEO, VideoFilter};
use crate::log_err;
use crate::region::{
    K_REGION, K_REGION_BOTTOM, K_REGION_FEATHER, K_REGION_FEATHER_SHIFT, K_REGION_INVERT,
    K_REGION_LEFT, K_REGION_RIGHT, K_REGION_TOP, RegionConfig,
};

pub const FILTER_ID: &str = "blurfx-filter-blur";

// Registry names for the programs the filter loads at startup.
pub const EFFECT_BOX: &str = "Box Blur";
pub const EFFECT_GAUSSIAN: &str = "Gaussian Blur";
pub const EFFECT_BILATERAL: &str = "Bilateral Blur";
pub const EFFECT_COLOR_CONVERSION: &str = "Color Conversion";
/// Analog of the host's built-in default program; only used for the plain
/// composite draw.
pub const EFFECT_DEFAULT: &str = "Default";

// Configuration keys (persisted by the host).
pub const K_TYPE: &str = "Filter.Blur.Type";
pub const K_SIZE: &str = "Filter.Blur.Size";
pub const K_BILATERAL_SMOOTHING: &str = "Filter.Blur.Bilateral.Smoothing";
pub const K_BILATERAL_SHARPNESS: &str = "Filter.Blur.Bilateral.Sharpness";
pub const K_ADVANCED: &str = "Filter.Blur.Advanced";
pub const K_COLOR_FORMAT: &str = "Filter.Blur.ColorFormat";

// ----------------------------------------------------------------------------
// Program descriptors
// ----------------------------------------------------------------------------

// Uniform block layout shared by the blur programs (64 bytes). The gaussian
// and bilateral programs reuse the tail of the block for their own fields.
const BOX_PARAMS: &[ParamDesc] = &[
    ParamDesc { name: "u_imageSize", kind: ParamKind::Float2, offset: 0 },
    ParamDesc { name: "u_imageTexel", kind: ParamKind::Float2, offset: 8 },
    ParamDesc { name: "u_texelDelta", kind: ParamKind::Float2, offset: 16 },
    ParamDesc { name: "u_radius", kind: ParamKind::Int, offset: 24 },
    ParamDesc { name: "u_diameter", kind: ParamKind::Int, offset: 28 },
    ParamDesc { name: "regionLeft", kind: ParamKind::Float, offset: 32 },
    ParamDesc { name: "regionTop", kind: ParamKind::Float, offset: 36 },
    ParamDesc { name: "regionRight", kind: ParamKind::Float, offset: 40 },
    ParamDesc { name: "regionBottom", kind: ParamKind::Float, offset: 44 },
    ParamDesc { name: "regionFeather", kind: ParamKind::Float, offset: 48 },
    ParamDesc { name: "regionFeatherShift", kind: ParamKind::Float, offset: 52 },
];

const GAUSSIAN_PARAMS: &[ParamDesc] = &[
    ParamDesc { name: "u_imageSize", kind: ParamKind::Float2, offset: 0 },
    ParamDesc { name: "u_imageTexel", kind: ParamKind::Float2, offset: 8 },
    ParamDesc { name: "u_texelDelta", kind: ParamKind::Float2, offset: 16 },
    ParamDesc { name: "u_radius", kind: ParamKind::Int, offset: 24 },
    ParamDesc { name: "u_diameter", kind: ParamKind::Int, offset: 28 },
    ParamDesc { name: "regionLeft", kind: ParamKind::Float, offset: 32 },
    ParamDesc { name: "regionTop", kind: ParamKind::Float, offset: 36 },
    ParamDesc { name: "regionRight", kind: ParamKind::Float, offset: 40 },
    ParamDesc { name: "regionBottom", kind: ParamKind::Float, offset: 44 },
    ParamDesc { name: "regionFeather", kind: ParamKind::Float, offset: 48 },
    ParamDesc { name: "regionFeatherShift", kind: ParamKind::Float, offset: 52 },
    ParamDesc { name: "kernelTexel", kind: ParamKind::Float2, offset: 56 },
];

const BILATERAL_PARAMS: &[ParamDesc] = &[
    ParamDesc { name: "u_imageSize", kind: ParamKind::Float2, offset: 0 },
    ParamDesc { name: "u_imageTexel", kind: ParamKind::Float2, offset: 8 },
    ParamDesc { name: "u_texelDelta", kind: ParamKind::Float2, offset: 16 },
    ParamDesc { name: "u_radius", kind: ParamKind::Int, offset: 24 },
    ParamDesc { name: "u_diameter", kind: ParamKind::Int, offset: 28 },
    ParamDesc { name: "regionLeft", kind: ParamKind::Float, offset: 32 },
    ParamDesc { name: "regionTop", kind: ParamKind::Float, offset: 36 },
    ParamDesc { name: "regionRight", kind: ParamKind::Float, offset: 40 },
    ParamDesc { name: "regionBottom", kind: ParamKind::Float, offset: 44 },
    ParamDesc { name: "regionFeather", kind: ParamKind::Float, offset: 48 },
    ParamDesc { name: "regionFeatherShift", kind: ParamKind::Float, offset: 52 },
    ParamDesc { name: "bilateralSmoothing", kind: ParamKind::Float, offset: 56 },
    ParamDesc { name: "bilateralSharpness", kind: ParamKind::Float, offset: 60 },
];

const BLUR_TECHNIQUES: &[TechniqueDesc] = &[
    TechniqueDesc { name: "Draw", fragment_entry: "fs_draw", blend: TechniqueBlend::Overwrite },
    TechniqueDesc { name: "DrawRegion", fragment_entry: "fs_draw_region", blend: TechniqueBlend::Overwrite },
    TechniqueDesc { name: "DrawRegionFeather", fragment_entry: "fs_draw_region_feather", blend: TechniqueBlend::Overwrite },
    TechniqueDesc { name: "DrawRegionInvert", fragment_entry: "fs_draw_region_invert", blend: TechniqueBlend::Overwrite },
    TechniqueDesc { name: "DrawRegionFeatherInvert", fragment_entry: "fs_draw_region_feather_invert", blend: TechniqueBlend::Overwrite },
];

const CONVERSION_TECHNIQUES: &[TechniqueDesc] = &[
    TechniqueDesc { name: "RGBToYUV", fragment_entry: "fs_rgb_to_yuv", blend: TechniqueBlend::Overwrite },
    // The reverse direction doubles as the composite draw.
    TechniqueDesc { name: "YUVToRGB", fragment_entry: "fs_yuv_to_rgb", blend: TechniqueBlend::SourceOver },
];

const DEFAULT_TECHNIQUES: &[TechniqueDesc] = &[TechniqueDesc {
    name: "Draw",
    fragment_entry: "fs_draw",
    blend: TechniqueBlend::SourceOver,
}];

pub const BOX_BLUR_EFFECT: EffectDesc = EffectDesc {
    name: EFFECT_BOX,
    source: shaders::BOX_BLUR_SHADER,
    uniform_size: 64,
    params: BOX_PARAMS,
    image_param: "u_image",
    kernel_param: None,
    techniques: BLUR_TECHNIQUES,
};

pub const GAUSSIAN_BLUR_EFFECT: EffectDesc = EffectDesc {
    name: EFFECT_GAUSSIAN,
    source: shaders::GAUSSIAN_BLUR_SHADER,
    uniform_size: 64,
    params: GAUSSIAN_PARAMS,
    image_param: "u_image",
    kernel_param: Some("kernel"),
    techniques: BLUR_TECHNIQUES,
};

pub const BILATERAL_BLUR_EFFECT: EffectDesc = EffectDesc {
    name: EFFECT_BILATERAL,
    source: shaders::BILATERAL_BLUR_SHADER,
    uniform_size: 64,
    params: BILATERAL_PARAMS,
    image_param: "u_image",
    kernel_param: None,
    techniques: BLUR_TECHNIQUES,
};

pub const COLOR_CONVERSION_EFFECT: EffectDesc = EffectDesc {
    name: EFFECT_COLOR_CONVERSION,
    source: shaders::COLOR_CONVERSION_SHADER,
    uniform_size: 0,
    params: &[],
    image_param: "image",
    kernel_param: None,
    techniques: CONVERSION_TECHNIQUES,
};

pub const DEFAULT_EFFECT: EffectDesc = EffectDesc {
    name: EFFECT_DEFAULT,
    source: shaders::PASSTHROUGH_SHADER,
    uniform_size: 0,
    params: &[],
    image_param: "image",
    kernel_param: None,
    techniques: DEFAULT_TECHNIQUES,
};

// ----------------------------------------------------------------------------
// Configuration model
// ----------------------------------------------------------------------------

/// Blur kernel strategy. Values match the persisted configuration enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurType {
    Box,
    Gaussian,
    Bilateral,
}

impl BlurType {
    pub fn from_config(value: i64) -> Self {
        match value {
            1 => BlurType::Gaussian,
            2 => BlurType::Bilateral,
            _ => BlurType::Box,
        }
    }

    pub fn effect_name(self) -> &'static str {
        match self {
            BlurType::Box => EFFECT_BOX,
            BlurType::Gaussian => EFFECT_GAUSSIAN,
            BlurType::Bilateral => EFFECT_BILATERAL,
        }
    }
}

/// Working color space for the blur passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    Rgb,
    Yuv,
}

impl ColorFormat {
    pub fn from_config(value: i64) -> Self {
        if value == 1 { ColorFormat::Yuv } else { ColorFormat::Rgb }
    }
}

/// Resolved configuration for one instance. Pure data — resolution has no
/// GPU dependency, so it can be exercised directly in tests.
#[derive(Clone, Debug, PartialEq)]
pub struct BlurSettings {
    pub blur_type: BlurType,
    pub radius: u32,
    pub bilateral_smoothing: f64,
    pub bilateral_sharpness: f64,
    pub region: RegionConfig,
    pub color_format: ColorFormat,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            blur_type: BlurType::Box,
            radius: 5,
            bilateral_smoothing: 0.5,
            bilateral_sharpness: 0.9,
            region: RegionConfig::default(),
            color_format: ColorFormat::Rgb,
        }
    }
}

impl BlurSettings {
    /// Re-derive the resolved state from configuration.
    ///
    /// The radius range (1..=25) is the host UI's contract and is not
    /// re-validated here. Disabling advanced mode forces the color format
    /// back to its registered default even if another value is still stored.
    pub fn read_from(&mut self, data: &FilterData) {
        self.blur_type = BlurType::from_config(data.get_int(K_TYPE));
        self.radius = data.get_int(K_SIZE).max(0) as u32;
        self.bilateral_smoothing = data.get_double(K_BILATERAL_SMOOTHING) / 100.0;
        self.bilateral_sharpness = data.get_double(K_BILATERAL_SHARPNESS) / 100.0;
        self.region.read_from(data);
        self.color_format = if data.get_bool(K_ADVANCED) {
            ColorFormat::from_config(data.get_int(K_COLOR_FORMAT))
        } else {
            ColorFormat::from_config(data.get_default_int(K_COLOR_FORMAT))
        };
    }

    pub fn diameter(&self) -> u32 {
        self.radius * 2 + 1
    }
}

// ----------------------------------------------------------------------------
// Module state
// ----------------------------------------------------------------------------

/// Process-wide state shared by every blur instance: the compiled programs
/// and the gaussian kernel texture. Loaded once when the host initializes
/// the module, immutable afterwards; instances hold it behind `Arc`.
pub struct BlurModule {
    pub effects: EffectRegistry,
    pub kernel: Option<KernelTexture>,
}

impl BlurModule {
    /// Compile every program and generate the kernel texture.
    ///
    /// Program loading is all-or-nothing: the first failure is logged,
    /// aborts the load, and the host never registers the filter. A kernel
    /// generation failure only costs gaussian quality, so it is logged and
    /// tolerated.
    pub fn load(ctx: &GpuContext) -> Result<Arc<Self>, GpuError> {
        let mut effects = EffectRegistry::new(ctx);
        let descs = [
            &BOX_BLUR_EFFECT,
            &GAUSSIAN_BLUR_EFFECT,
            &BILATERAL_BLUR_EFFECT,
            &COLOR_CONVERSION_EFFECT,
            &DEFAULT_EFFECT,
        ];
        for desc in descs {
            if let Err(err) = effects.load(ctx, desc) {
                log_err!("<filter-blur> Loading effect '{}' failed: {}", desc.name, err);
                return Err(err);
            }
        }

        let kernel = match KernelTexture::generate(ctx) {
            Ok(kernel) => Some(kernel),
            Err(err) => {
                log_err!("<filter-blur> Failed to create gaussian kernel texture: {}", err);
                None
            }
        };

        Ok(Arc::new(Self { effects, kernel }))
    }

    /// Registration record for the host's source registry.
    pub fn filter_info(self: &Arc<Self>) -> FilterInfo {
        let module = self.clone();
        FilterInfo {
            id: FILTER_ID,
            name: "Blur",
            output_flags: OUTPUT_VIDEO,
            get_defaults: Self::defaults,
            create: Box::new(move |data, source_name| {
                Box::new(BlurInstance::new(&module, data, source_name)) as Box<dyn VideoFilter>
            }),
        }
    }

    /// Register the configuration schema defaults.
    pub fn defaults(data: &mut FilterData) {
        data.set_default_int(K_TYPE, 0);
        data.set_default_int(K_SIZE, 5);

        // Bilateral only
        data.set_default_double(K_BILATERAL_SMOOTHING, 50.0);
        data.set_default_double(K_BILATERAL_SHARPNESS, 90.0);

        // Region
        data.set_default_bool(K_REGION, false);
        data.set_default_double(K_REGION_LEFT, 0.0);
        data.set_default_double(K_REGION_TOP, 0.0);
        data.set_default_double(K_REGION_RIGHT, 0.0);
        data.set_default_double(K_REGION_BOTTOM, 0.0);
        data.set_default_double(K_REGION_FEATHER, 0.0);
        data.set_default_double(K_REGION_FEATHER_SHIFT, 0.0);
        data.set_default_bool(K_REGION_INVERT, false);

        // Advanced
        data.set_default_bool(K_ADVANCED, false);
        data.set_default_int(K_COLOR_FORMAT, 0);
    }
}

// ----------------------------------------------------------------------------
// Per-frame errors
// ----------------------------------------------------------------------------

/// Why a frame was skipped. Every variant resolves the same way — the host
/// presents the source unmodified — but the kind is what lands in the log.
#[derive(Debug)]
pub enum RenderError {
    /// Target or parent source is gone.
    SourceMissing,
    /// Upstream reports a zero-sized frame.
    InvalidSize { width: u32, height: u32 },
    /// No program is bound to the instance.
    EffectMissing,
    /// Render target allocation failed or the begin was refused.
    Target { stage: &'static str, source: GpuError },
    /// The upstream source failed to produce a frame.
    SourceDraw,
    /// A stage finished without leaving a readable texture.
    MissingTexture { stage: &'static str },
    /// A required program parameter is not declared by the bound effect.
    MissingParam { name: &'static str },
    /// Technique lookup or pass submission failed.
    Draw(GpuError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::SourceMissing => write!(f, "target or parent source unavailable"),
            RenderError::InvalidSize { width, height } => {
                write!(f, "source has invalid size {}x{}", width, height)
            }
            RenderError::EffectMissing => write!(f, "no blur effect bound"),
            RenderError::Target { stage, source } => {
                write!(f, "render target unavailable at {}: {}", stage, source)
            }
            RenderError::SourceDraw => write!(f, "unable to render source"),
            RenderError::MissingTexture { stage } => {
                write!(f, "no texture produced by {} stage", stage)
            }
            RenderError::MissingParam { name } => {
                write!(f, "effect does not declare required parameter '{}'", name)
            }
            RenderError::Draw(err) => write!(f, "draw failed: {}", err),
        }
    }
}

// ----------------------------------------------------------------------------
// Instance
// ----------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum BlurPass {
    Horizontal,
    Vertical,
}

impl BlurPass {
    fn stage(self) -> &'static str {
        match self {
            BlurPass::Horizontal => "horizontal",
            BlurPass::Vertical => "vertical",
        }
    }
}

/// Per-source filter state: render targets, the bound program and the
/// resolved configuration.
pub struct BlurInstance {
    module: Arc<BlurModule>,
    source_name: String,
    effect: Option<Arc<Effect>>,
    settings: BlurSettings,
    rt_capture: RenderTarget,
    rt_convert: RenderTarget,
    rt_horizontal: RenderTarget,
    rt_vertical: RenderTarget,
    /// One log per failure episode, not per frame.
    error_logged: bool,
}

impl BlurInstance {
    /// Create an instance attached to `source_name` and resolve the initial
    /// configuration.
    pub fn new(module: &Arc<BlurModule>, data: &FilterData, source_name: &str) -> Self {
        let effect = match module.effects.get(EFFECT_BOX) {
            Ok(effect) => Some(effect),
            Err(err) => {
                log_err!("<filter-blur> Instance '{}' has no blur program: {}", source_name, err);
                None
            }
        };
        let mut instance = Self {
            module: module.clone(),
            source_name: source_name.to_string(),
            effect,
            settings: BlurSettings::default(),
            rt_capture: RenderTarget::new("blur_capture"),
            rt_convert: RenderTarget::new("blur_convert"),
            rt_horizontal: RenderTarget::new("blur_horizontal"),
            rt_vertical: RenderTarget::new("blur_vertical"),
            error_logged: false,
        };
        instance.update(data);
        instance
    }

    /// Resolve the configuration and rebind the matching program.
    pub fn update(&mut self, data: &FilterData) {
        self.settings.read_from(data);
        match self.module.effects.get(self.settings.blur_type.effect_name()) {
            Ok(effect) => self.effect = Some(effect),
            Err(err) => {
                // The registry is complete after a successful module load;
                // keep the previous program bound and complain.
                log_err!(
                    "<filter-blur> Instance '{}' could not bind effect: {}",
                    self.source_name,
                    err
                );
            }
        }
    }

    pub fn settings(&self) -> &BlurSettings {
        &self.settings
    }

    /// One blur pass: bind shared then type-specific parameters, render the
    /// region-derived technique into the pass's own target, and hand back
    /// the resulting texture view.
    fn blur_pass(
        &mut self,
        gpu: &GpuContext,
        effect: &Effect,
        technique: &str,
        input: &wgpu::TextureView,
        delta: [f32; 2],
        pass: BlurPass,
        width: u32,
        height: u32,
    ) -> Result<wgpu::TextureView, RenderError> {
        let mut params = effect.params();

        // Shared parameters are part of every blur program's contract.
        let mut ok = true;
        ok &= params.set_float2("u_imageSize", [width as f32, height as f32]);
        ok &= params.set_float2("u_imageTexel", [1.0 / width as f32, 1.0 / height as f32]);
        ok &= params.set_float2("u_texelDelta", delta);
        ok &= params.set_int("u_radius", self.settings.radius as i32);
        ok &= params.set_int("u_diameter", self.settings.diameter() as i32);
        if !ok {
            return Err(RenderError::MissingParam { name: "shared blur parameters" });
        }
        if self.settings.region.enabled {
            self.settings.region.apply(effect, &mut params);
        }

        // Type-specific parameters.
        let mut kernel = None;
        match self.settings.blur_type {
            BlurType::Box => {}
            BlurType::Gaussian => {
                // Soft-absent: a program without a kernel slot (or a module
                // whose kernel generation failed) runs without the weights.
                if effect.has_parameter("kernel")
                    && let Some(k) = self.module.kernel.as_ref()
                {
                    kernel = Some(&k.view);
                    if effect.has_parameter("kernelTexel") {
                        params.set_float2("kernelTexel", k.texel());
                    }
                }
            }
            BlurType::Bilateral => {
                // Hard-required: bilateral correctness depends on both.
                if !effect.has_parameter("bilateralSmoothing") {
                    return Err(RenderError::MissingParam { name: "bilateralSmoothing" });
                }
                if !effect.has_parameter("bilateralSharpness") {
                    return Err(RenderError::MissingParam { name: "bilateralSharpness" });
                }
                let smoothing = self.settings.bilateral_smoothing * self.settings.diameter() as f64;
                params.set_float("bilateralSmoothing", smoothing as f32);
                params.set_float("bilateralSharpness", (1.0 - self.settings.bilateral_sharpness) as f32);
            }
        }

        let rt = match pass {
            BlurPass::Horizontal => &mut self.rt_horizontal,
            BlurPass::Vertical => &mut self.rt_vertical,
        };
        rt.begin(gpu, width, height).map_err(|source| RenderError::Target {
            stage: pass.stage(),
            source,
        })?;
        let Some(dest) = rt.view() else {
            return Err(RenderError::MissingTexture { stage: pass.stage() });
        };
        effect
            .draw(gpu, technique, &params, PassInput { image: input, kernel }, &dest, true)
            .map_err(RenderError::Draw)?;
        Ok(dest)
    }

    /// The per-frame pipeline, strictly sequential. Any error skips the
    /// frame; the caller handles logging and the passthrough.
    fn render_frame(&mut self, frame: &mut FrameContext<'_>) -> Result<(), RenderError> {
        let gpu = frame.gpu;

        // -- validate ------------------------------------------------------
        let (Some(target), Some(_parent)) = (frame.target, frame.parent) else {
            return Err(RenderError::SourceMissing);
        };
        let (width, height) = (target.base_width(), target.base_height());
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        let Some(effect) = self.effect.clone() else {
            return Err(RenderError::EffectMissing);
        };

        // -- capture: unfiltered source at native resolution ---------------
        self.rt_capture
            .begin(gpu, width, height)
            .map_err(|source| RenderError::Target { stage: "capture", source })?;
        self.rt_capture.clear(gpu);
        match self.rt_capture.texture() {
            Some(texture) => {
                if !target.draw_frame(gpu, texture) {
                    return Err(RenderError::SourceDraw);
                }
            }
            None => return Err(RenderError::MissingTexture { stage: "capture" }),
        }
        let Some(mut working) = self.rt_capture.view() else {
            return Err(RenderError::MissingTexture { stage: "capture" });
        };

        // -- forward color conversion (optional) ---------------------------
        // Missing conversion program is a silent degradation: YUV mode just
        // processes in RGB.
        let conversion = self.module.effects.find(EFFECT_COLOR_CONVERSION);
        let yuv = self.settings.color_format == ColorFormat::Yuv;
        if yuv && let Some(conversion) = conversion.as_ref() {
            self.rt_convert
                .begin(gpu, width, height)
                .map_err(|source| RenderError::Target { stage: "convert", source })?;
            let Some(dest) = self.rt_convert.view() else {
                return Err(RenderError::MissingTexture { stage: "convert" });
            };
            let params = conversion.params();
            conversion
                .draw(gpu, "RGBToYUV", &params, PassInput { image: &working, kernel: None }, &dest, true)
                .map_err(RenderError::Draw)?;
            working = dest;
        }

        // -- separable blur: horizontal then vertical ----------------------
        let technique = self.settings.region.technique();
        let horizontal = self.blur_pass(
            gpu,
            &effect,
            technique,
            &working,
            [1.0 / width as f32, 0.0],
            BlurPass::Horizontal,
            width,
            height,
        )?;
        let blurred = self.blur_pass(
            gpu,
            &effect,
            technique,
            &horizontal,
            [0.0, 1.0 / height as f32],
            BlurPass::Vertical,
            width,
            height,
        )?;

        // -- composite: convert back, or draw straight over the output -----
        if yuv && let Some(conversion) = conversion.as_ref() {
            let params = conversion.params();
            conversion
                .draw(gpu, "YUVToRGB", &params, PassInput { image: &blurred, kernel: None }, frame.output, false)
                .map_err(RenderError::Draw)?;
        } else {
            let Some(default_effect) = self.module.effects.find(EFFECT_DEFAULT) else {
                return Err(RenderError::EffectMissing);
            };
            let params = default_effect.params();
            default_effect
                .draw(gpu, "Draw", &params, PassInput { image: &blurred, kernel: None }, frame.output, false)
                .map_err(RenderError::Draw)?;
        }

        Ok(())
    }
}

impl VideoFilter for BlurInstance {
    fn update(&mut self, data: &FilterData) {
        BlurInstance::update(self, data);
    }

    fn video_render(&mut self, frame: &mut FrameContext<'_>) -> FilterOutput {
        match self.render_frame(frame) {
            Ok(()) => {
                self.error_logged = false;
                FilterOutput::Rendered
            }
            Err(err) => {
                if !self.error_logged {
                    log_err!(
                        "<filter-blur> Instance '{}' skipped rendering: {}",
                        self.source_name,
                        err
                    );
                    self.error_logged = true;
                }
                FilterOutput::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_with_defaults() -> FilterData {
        let mut data = FilterData::new();
        BlurModule::defaults(&mut data);
        data
    }

    #[test]
    fn defaults_resolve_to_box_radius_five() {
        let data = data_with_defaults();
        let mut settings = BlurSettings::default();
        settings.read_from(&data);
        assert_eq!(settings.blur_type, BlurType::Box);
        assert_eq!(settings.radius, 5);
        assert_eq!(settings.color_format, ColorFormat::Rgb);
        assert!(!settings.region.enabled);
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut data = data_with_defaults();
        data.set_int(K_TYPE, 2);
        data.set_int(K_SIZE, 17);
        data.set_double(K_BILATERAL_SMOOTHING, 25.0);
        data.set_bool(K_REGION, true);
        data.set_double(K_REGION_RIGHT, 30.0);

        let mut settings = BlurSettings::default();
        settings.read_from(&data);
        let first = settings.clone();
        settings.read_from(&data);
        assert_eq!(settings, first);
    }

    #[test]
    fn bilateral_scales_host_percentages() {
        let mut data = data_with_defaults();
        data.set_int(K_TYPE, 2);
        data.set_double(K_BILATERAL_SMOOTHING, 25.0);
        data.set_double(K_BILATERAL_SHARPNESS, 80.0);

        let mut settings = BlurSettings::default();
        settings.read_from(&data);
        assert_eq!(settings.blur_type, BlurType::Bilateral);
        assert_eq!(settings.bilateral_smoothing, 0.25);
        assert_eq!(settings.bilateral_sharpness, 0.80);
    }

    #[test]
    fn advanced_off_suppresses_color_format_override() {
        let mut data = data_with_defaults();
        data.set_bool(K_ADVANCED, true);
        data.set_int(K_COLOR_FORMAT, 1);

        let mut settings = BlurSettings::default();
        settings.read_from(&data);
        assert_eq!(settings.color_format, ColorFormat::Yuv);

        // Turning advanced off must fall back to the default even though the
        // stored value is still YUV.
        data.set_bool(K_ADVANCED, false);
        settings.read_from(&data);
        assert_eq!(settings.color_format, ColorFormat::Rgb);
    }

    #[test]
    fn region_bounds_resolve_through_settings() {
        let mut data = data_with_defaults();
        data.set_bool(K_REGION, true);
        data.set_double(K_REGION_RIGHT, 30.0);

        let mut settings = BlurSettings::default();
        settings.read_from(&data);
        assert_eq!(settings.region.right, 0.70);
        assert_eq!(settings.region.bottom, 1.0);
    }

    #[test]
    fn type_enum_maps_config_values() {
        assert_eq!(BlurType::from_config(0), BlurType::Box);
        assert_eq!(BlurType::from_config(1), BlurType::Gaussian);
        assert_eq!(BlurType::from_config(2), BlurType::Bilateral);
        // Out-of-range values fall back to the first entry, like the host UI.
        assert_eq!(BlurType::from_config(99), BlurType::Box);
    }

    #[test]
    fn diameter_is_derived_from_radius() {
        let settings = BlurSettings { radius: 5, ..Default::default() };
        assert_eq!(settings.diameter(), 11);
    }
}
