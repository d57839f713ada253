// ============================================================================
// PIPELINE TESTS — end-to-end scenarios against a real adapter
// ============================================================================
//
// These drive the public host API through capture → (convert) → horizontal →
// vertical → composite. They need a working wgpu adapter; `GpuContext::new`
// already falls back to a software rasterizer, so the tests only skip when
// not even that is available.

use std::sync::Arc;

use blurfx::blur::{
    self, BILATERAL_BLUR_EFFECT, BOX_BLUR_EFFECT, BlurInstance, BlurModule,
    COLOR_CONVERSION_EFFECT, DEFAULT_EFFECT, GAUSSIAN_BLUR_EFFECT,
};
use blurfx::config::FilterData;
use blurfx::gpu::GpuContext;
use blurfx::gpu::effect::{EffectDesc, EffectRegistry, ParamDesc, ParamKind};
use blurfx::gpu::target::read_texture;
use blurfx::host::{FilterOutput, FrameContext, FrameSource, VideoFilter};

/// Frame source producing a solid color at a fixed size.
struct SolidSource {
    width: u32,
    height: u32,
    color: [u8; 4],
}

impl FrameSource for SolidSource {
    fn name(&self) -> &str {
        "solid"
    }

    fn base_width(&self) -> u32 {
        self.width
    }

    fn base_height(&self) -> u32 {
        self.height
    }

    fn draw_frame(&self, gpu: &GpuContext, target: &wgpu::Texture) -> bool {
        let pixels: Vec<u8> = self
            .color
            .repeat((self.width * self.height) as usize);
        gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        true
    }
}

/// Frame source that must never be asked to draw.
struct UntouchableSource;

impl FrameSource for UntouchableSource {
    fn name(&self) -> &str {
        "untouchable"
    }

    fn base_width(&self) -> u32 {
        100
    }

    fn base_height(&self) -> u32 {
        100
    }

    fn draw_frame(&self, _gpu: &GpuContext, _target: &wgpu::Texture) -> bool {
        panic!("draw_frame must not be reached when validation fails");
    }
}

fn gpu_or_skip() -> Option<GpuContext> {
    let ctx = GpuContext::new();
    if ctx.is_none() {
        eprintln!("skipping: no wgpu adapter available (not even software)");
    }
    ctx
}

fn output_texture(gpu: &GpuContext, width: u32, height: u32) -> wgpu::Texture {
    gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test_output"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn default_data() -> FilterData {
    let mut data = FilterData::new();
    BlurModule::defaults(&mut data);
    data
}

#[test]
fn box_blur_completes_without_color_convert() {
    let Some(gpu) = gpu_or_skip() else { return };
    let module = BlurModule::load(&gpu).expect("module load");

    let mut data = default_data();
    data.set_int(blur::K_TYPE, 0);
    data.set_int(blur::K_SIZE, 5);

    let info = module.filter_info();
    let mut filter = (info.create)(&data, "test-source");

    let source = SolidSource {
        width: 100,
        height: 100,
        color: [255, 255, 255, 255],
    };
    let out = output_texture(&gpu, 100, 100);
    let out_view = out.create_view(&wgpu::TextureViewDescriptor::default());
    let mut frame = FrameContext {
        gpu: &gpu,
        target: Some(&source),
        parent: Some(&source),
        output: &out_view,
    };

    assert_eq!(filter.video_render(&mut frame), FilterOutput::Rendered);

    // Constant white blurs to constant white; the composite must cover the
    // full 100×100 output.
    let pixels = read_texture(&gpu, &out, 100, 100);
    assert_eq!(pixels.len(), 100 * 100 * 4);
    for (x, y) in [(0, 0), (50, 50), (99, 99), (0, 99)] {
        let i = (y * 100 + x) * 4;
        assert!(pixels[i] >= 250, "pixel ({x},{y}) red = {}", pixels[i]);
        assert!(pixels[i + 3] >= 250, "pixel ({x},{y}) alpha = {}", pixels[i + 3]);
    }
}

#[test]
fn gaussian_region_feather_invert_renders() {
    let Some(gpu) = gpu_or_skip() else { return };
    let module = BlurModule::load(&gpu).expect("module load");

    let mut data = default_data();
    data.set_int(blur::K_TYPE, 1);
    data.set_int(blur::K_SIZE, 10);
    data.set_bool(blurfx::region::K_REGION, true);
    data.set_double(blurfx::region::K_REGION_LEFT, 20.0);
    data.set_double(blurfx::region::K_REGION_TOP, 20.0);
    data.set_double(blurfx::region::K_REGION_RIGHT, 20.0);
    data.set_double(blurfx::region::K_REGION_BOTTOM, 20.0);
    data.set_double(blurfx::region::K_REGION_FEATHER, 10.0);
    data.set_bool(blurfx::region::K_REGION_INVERT, true);

    let mut filter = BlurInstance::new(&module, &data, "test-source");
    assert_eq!(filter.settings().region.technique(), "DrawRegionFeatherInvert");

    let source = SolidSource {
        width: 64,
        height: 64,
        color: [0, 128, 255, 255],
    };
    let out = output_texture(&gpu, 64, 64);
    let out_view = out.create_view(&wgpu::TextureViewDescriptor::default());
    let mut frame = FrameContext {
        gpu: &gpu,
        target: Some(&source),
        parent: Some(&source),
        output: &out_view,
    };

    assert_eq!(
        VideoFilter::video_render(&mut filter, &mut frame),
        FilterOutput::Rendered
    );
}

#[test]
fn yuv_mode_round_trips_constant_frames() {
    let Some(gpu) = gpu_or_skip() else { return };
    let module = BlurModule::load(&gpu).expect("module load");

    let mut data = default_data();
    data.set_int(blur::K_TYPE, 0);
    data.set_int(blur::K_SIZE, 3);
    data.set_bool(blur::K_ADVANCED, true);
    data.set_int(blur::K_COLOR_FORMAT, 1);

    let info = module.filter_info();
    let mut filter = (info.create)(&data, "test-source");

    let source = SolidSource {
        width: 32,
        height: 32,
        color: [128, 128, 128, 255],
    };
    let out = output_texture(&gpu, 32, 32);
    let out_view = out.create_view(&wgpu::TextureViewDescriptor::default());
    let mut frame = FrameContext {
        gpu: &gpu,
        target: Some(&source),
        parent: Some(&source),
        output: &out_view,
    };

    assert_eq!(filter.video_render(&mut frame), FilterOutput::Rendered);

    // A constant gray frame survives RGB → YUV → blur → YUV → RGB within
    // quantization error.
    let pixels = read_texture(&gpu, &out, 32, 32);
    let i = (16 * 32 + 16) * 4;
    for c in 0..3 {
        let v = pixels[i + c] as i32;
        assert!((v - 128).abs() <= 3, "channel {c} drifted to {v}");
    }
}

#[test]
fn missing_sources_skip_at_validation() {
    let Some(gpu) = gpu_or_skip() else { return };
    let module = BlurModule::load(&gpu).expect("module load");

    let data = default_data();
    let info = module.filter_info();
    let mut filter = (info.create)(&data, "test-source");

    let out = output_texture(&gpu, 100, 100);
    let out_view = out.create_view(&wgpu::TextureViewDescriptor::default());
    let untouchable = UntouchableSource;

    // No target: must skip before any render-target operation — the source
    // panics if the pipeline gets as far as capturing.
    let mut frame = FrameContext {
        gpu: &gpu,
        target: None,
        parent: Some(&untouchable),
        output: &out_view,
    };
    assert_eq!(filter.video_render(&mut frame), FilterOutput::Skipped);

    // No parent: same validation failure.
    let mut frame = FrameContext {
        gpu: &gpu,
        target: Some(&untouchable as &dyn FrameSource),
        parent: None,
        output: &out_view,
    };
    assert_eq!(filter.video_render(&mut frame), FilterOutput::Skipped);
}

#[test]
fn zero_sized_source_skips() {
    let Some(gpu) = gpu_or_skip() else { return };
    let module = BlurModule::load(&gpu).expect("module load");

    let data = default_data();
    let info = module.filter_info();
    let mut filter = (info.create)(&data, "test-source");

    let source = SolidSource {
        width: 0,
        height: 0,
        color: [0, 0, 0, 0],
    };
    let out = output_texture(&gpu, 4, 4);
    let out_view = out.create_view(&wgpu::TextureViewDescriptor::default());
    let mut frame = FrameContext {
        gpu: &gpu,
        target: Some(&source),
        parent: Some(&source),
        output: &out_view,
    };
    assert_eq!(filter.video_render(&mut frame), FilterOutput::Skipped);
}

// Bilateral program with `bilateralSharpness` stripped from its declared
// parameters, simulating a program that does not expose it.
const TRIMMED_BILATERAL_PARAMS: &[ParamDesc] = &[
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
];

#[test]
fn bilateral_without_sharpness_param_skips_frame() {
    let Some(gpu) = gpu_or_skip() else { return };

    let mut effects = EffectRegistry::new(&gpu);
    for desc in [
        &BOX_BLUR_EFFECT,
        &GAUSSIAN_BLUR_EFFECT,
        &COLOR_CONVERSION_EFFECT,
        &DEFAULT_EFFECT,
    ] {
        effects.load(&gpu, desc).expect("effect load");
    }
    effects
        .load(
            &gpu,
            &EffectDesc {
                params: TRIMMED_BILATERAL_PARAMS,
                ..BILATERAL_BLUR_EFFECT
            },
        )
        .expect("trimmed bilateral load");
    let module = Arc::new(BlurModule {
        effects,
        kernel: None,
    });

    let mut data = default_data();
    data.set_int(blur::K_TYPE, 2);

    let mut filter = BlurInstance::new(&module, &data, "test-source");

    let source = SolidSource {
        width: 16,
        height: 16,
        color: [10, 20, 30, 255],
    };
    let out = output_texture(&gpu, 16, 16);
    let out_view = out.create_view(&wgpu::TextureViewDescriptor::default());
    let mut frame = FrameContext {
        gpu: &gpu,
        target: Some(&source),
        parent: Some(&source),
        output: &out_view,
    };

    // Must abort the pass and skip — never crash or draw with stale state.
    assert_eq!(
        VideoFilter::video_render(&mut filter, &mut frame),
        FilterOutput::Skipped
    );
}
