// ============================================================================
// EFFECTS — named GPU programs with techniques and declared parameters
// ============================================================================
//
// An `Effect` is the unit the blur pipeline binds per pass: one WGSL module
// compiled into one render pipeline per named technique, plus a table of the
// parameters the program declares. Scalar parameters share a single uniform
// block whose layout the table describes; texture parameters are fixed
// bind-group slots. Callers probe `has_parameter` before setting anything
// optional — a program that doesn't declare a parameter simply never
// receives it.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::GpuError;
use super::context::GpuContext;

/// Scalar parameter types a program can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Float2,
    Int,
}

impl ParamKind {
    fn size(self) -> usize {
        match self {
            ParamKind::Float | ParamKind::Int => 4,
            ParamKind::Float2 => 8,
        }
    }
}

/// One declared scalar parameter: its name and slot in the uniform block.
pub struct ParamDesc {
    pub name: &'static str,
    pub kind: ParamKind,
    pub offset: usize,
}

/// Blend state baked into a technique's pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TechniqueBlend {
    /// Pure overwrite (hardware blending disabled) — used by capture,
    /// conversion and blur passes so successive passes never accumulate.
    Overwrite,
    /// Straight source-over alpha — used only by composite techniques.
    SourceOver,
}

/// One named render pass variant of a program.
pub struct TechniqueDesc {
    pub name: &'static str,
    pub fragment_entry: &'static str,
    pub blend: TechniqueBlend,
}

/// Everything needed to load one program into the registry.
pub struct EffectDesc {
    pub name: &'static str,
    pub source: &'static str,
    /// Size in bytes of the scalar uniform block (0 = program has none).
    pub uniform_size: usize,
    pub params: &'static [ParamDesc],
    /// Name of the input texture parameter.
    pub image_param: &'static str,
    /// Name of the kernel texture parameter, for programs that declare one.
    pub kernel_param: Option<&'static str>,
    pub techniques: &'static [TechniqueDesc],
}

#[derive(Clone, Copy)]
struct ParamSlot {
    kind: ParamKind,
    offset: usize,
}

/// Samplers and fallback resources shared by all loaded effects.
pub(crate) struct EffectCommon {
    sampler_image: wgpu::Sampler,
    sampler_kernel: wgpu::Sampler,
    fallback_kernel: wgpu::TextureView,
}

impl EffectCommon {
    fn new(ctx: &GpuContext) -> Self {
        let device = &ctx.device;

        let sampler_image = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("effect_sampler_linear"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Kernel rows are R32Float (non-filterable) — sampled with nearest.
        let sampler_kernel = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("effect_sampler_kernel"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // Neutral 1×1 weight texture, bound when no kernel texture has been
        // generated. Gaussian output is then visually wrong (all weights
        // zero) but the draw itself still succeeds.
        let fallback = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fallback_kernel"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &fallback,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::bytes_of(&0.0f32),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let fallback_kernel = fallback.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            sampler_image,
            sampler_kernel,
            fallback_kernel,
        }
    }
}

/// Texture inputs for one technique draw.
pub struct PassInput<'a> {
    pub image: &'a wgpu::TextureView,
    pub kernel: Option<&'a wgpu::TextureView>,
}

/// A compiled, immutable GPU program.
pub struct Effect {
    name: &'static str,
    uniform_size: usize,
    params: HashMap<&'static str, ParamSlot>,
    image_param: &'static str,
    kernel_param: Option<&'static str>,
    techniques: HashMap<&'static str, wgpu::RenderPipeline>,
    image_layout: wgpu::BindGroupLayout,
    uniform_layout: Option<wgpu::BindGroupLayout>,
    kernel_layout: Option<wgpu::BindGroupLayout>,
    common: Arc<EffectCommon>,
}

impl Effect {
    fn build(
        ctx: &GpuContext,
        common: Arc<EffectCommon>,
        desc: &EffectDesc,
    ) -> Result<Self, GpuError> {
        // Validate before handing the source to wgpu, so a broken program is
        // a recoverable load error instead of a device validation panic.
        let module = naga::front::wgsl::parse_str(desc.source).map_err(|e| {
            GpuError::EffectLoad {
                name: desc.name,
                reason: e.emit_to_string(desc.source),
            }
        })?;
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| GpuError::EffectLoad {
            name: desc.name,
            reason: format!("{e:?}"),
        })?;

        let device = &ctx.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.name),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });

        // Group 0: input frame texture + sampler.
        let image_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("effect_image_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Group 1: scalar uniform block, only for programs that declare one.
        let uniform_layout = (desc.uniform_size > 0).then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("effect_uniform_bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
        });

        // Group 2: kernel texture + non-filtering sampler.
        let kernel_layout = desc.kernel_param.map(|_| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("effect_kernel_bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                        count: None,
                    },
                ],
            })
        });

        let mut layouts: Vec<&wgpu::BindGroupLayout> = vec![&image_layout];
        if let Some(layout) = uniform_layout.as_ref() {
            layouts.push(layout);
        }
        if let Some(layout) = kernel_layout.as_ref() {
            layouts.push(layout);
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.name),
            bind_group_layouts: &layouts,
            push_constant_ranges: &[],
        });

        let mut techniques = HashMap::new();
        for tech in desc.techniques {
            let blend = match tech.blend {
                // None = replace; the fragment output overwrites the target.
                TechniqueBlend::Overwrite => None,
                TechniqueBlend::SourceOver => Some(wgpu::BlendState {
                    color: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::SrcAlpha,
                        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                        operation: wgpu::BlendOperation::Add,
                    },
                    alpha: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::One,
                        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                        operation: wgpu::BlendOperation::Add,
                    },
                }),
            };
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(tech.name),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_fullscreen",
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: tech.fragment_entry,
                    targets: &[Some(wgpu::ColorTargetState {
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview: None,
            });
            techniques.insert(tech.name, pipeline);
        }

        let mut params = HashMap::new();
        for p in desc.params {
            debug_assert!(p.offset + p.kind.size() <= desc.uniform_size);
            params.insert(
                p.name,
                ParamSlot {
                    kind: p.kind,
                    offset: p.offset,
                },
            );
        }

        Ok(Self {
            name: desc.name,
            uniform_size: desc.uniform_size,
            params,
            image_param: desc.image_param,
            kernel_param: desc.kernel_param,
            techniques,
            image_layout,
            uniform_layout,
            kernel_layout,
            common,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Capability probe: does this program declare `name`?
    pub fn has_parameter(&self, name: &str) -> bool {
        self.params.contains_key(name)
            || name == self.image_param
            || self.kernel_param.is_some_and(|k| k == name)
    }

    pub fn has_technique(&self, name: &str) -> bool {
        self.techniques.contains_key(name)
    }

    /// Fresh zeroed staging block for this program's uniform layout.
    pub fn params(&self) -> ParamBlock<'_> {
        ParamBlock {
            effect: self,
            bytes: vec![0u8; self.uniform_size],
        }
    }

    /// Run one technique as a fullscreen pass into `dest`.
    ///
    /// `clear` selects the load op: intermediate passes clear to transparent
    /// black, the composite draw loads and blends over existing content.
    pub fn draw(
        &self,
        ctx: &GpuContext,
        technique: &str,
        params: &ParamBlock<'_>,
        input: PassInput<'_>,
        dest: &wgpu::TextureView,
        clear: bool,
    ) -> Result<(), GpuError> {
        let Some(pipeline) = self.techniques.get(technique) else {
            return Err(GpuError::TechniqueNotFound {
                effect: self.name,
                technique: technique.to_string(),
            });
        };
        let device = &ctx.device;

        let image_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("effect_image_bg"),
            layout: &self.image_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input.image),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.common.sampler_image),
                },
            ],
        });

        let uniform_bg = self.uniform_layout.as_ref().map(|layout| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("effect_params"),
                contents: params.bytes(),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("effect_uniform_bg"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        });

        let kernel_bg = self.kernel_layout.as_ref().map(|layout| {
            let view = input.kernel.unwrap_or(&self.common.fallback_kernel);
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("effect_kernel_bg"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.common.sampler_kernel),
                    },
                ],
            })
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("effect_pass"),
        });
        {
            let load = if clear {
                wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
            } else {
                wgpu::LoadOp::Load
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(technique),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: dest,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            let mut group = 0;
            pass.set_bind_group(group, &image_bg, &[]);
            group += 1;
            if let Some(bg) = uniform_bg.as_ref() {
                pass.set_bind_group(group, bg, &[]);
                group += 1;
            }
            if let Some(bg) = kernel_bg.as_ref() {
                pass.set_bind_group(group, bg, &[]);
            }
            pass.draw(0..6, 0..1);
        }
        ctx.submit_one(encoder);
        Ok(())
    }
}

/// CPU-side staging for one pass's uniform block.
pub struct ParamBlock<'a> {
    effect: &'a Effect,
    bytes: Vec<u8>,
}

impl ParamBlock<'_> {
    fn write(&mut self, name: &str, kind: ParamKind, data: &[u8]) -> bool {
        match self.effect.params.get(name) {
            Some(slot) if slot.kind == kind => {
                self.bytes[slot.offset..slot.offset + data.len()].copy_from_slice(data);
                true
            }
            _ => false,
        }
    }

    /// Each setter returns whether the program declares the parameter.
    pub fn set_float(&mut self, name: &str, value: f32) -> bool {
        self.write(name, ParamKind::Float, bytemuck::bytes_of(&value))
    }

    pub fn set_float2(&mut self, name: &str, value: [f32; 2]) -> bool {
        self.write(name, ParamKind::Float2, bytemuck::bytes_of(&value))
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> bool {
        self.write(name, ParamKind::Int, bytemuck::bytes_of(&value))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Name → program registry, loaded once at module startup and shared
/// (reference-counted) with every instance afterwards.
pub struct EffectRegistry {
    common: Arc<EffectCommon>,
    effects: HashMap<&'static str, Arc<Effect>>,
}

impl EffectRegistry {
    pub fn new(ctx: &GpuContext) -> Self {
        Self {
            common: Arc::new(EffectCommon::new(ctx)),
            effects: HashMap::new(),
        }
    }

    /// Compile and register one program. The error carries the program name
    /// and the validator's reason; the caller decides whether to continue.
    pub fn load(&mut self, ctx: &GpuContext, desc: &EffectDesc) -> Result<(), GpuError> {
        let effect = Effect::build(ctx, self.common.clone(), desc)?;
        self.effects.insert(desc.name, Arc::new(effect));
        Ok(())
    }

    /// Lookup for programs the pipeline requires.
    pub fn get(&self, name: &str) -> Result<Arc<Effect>, GpuError> {
        self.effects
            .get(name)
            .cloned()
            .ok_or_else(|| GpuError::EffectNotFound(name.to_string()))
    }

    /// Lookup for optional programs (e.g. color conversion).
    pub fn find(&self, name: &str) -> Option<Arc<Effect>> {
        self.effects.get(name).cloned()
    }
}
