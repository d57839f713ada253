// ============================================================================
// RENDER TARGETS — offscreen color targets + texture readback
// ============================================================================

use super::GpuError;
use super::context::GpuContext;

/// An offscreen surface one pipeline stage renders into and the next stage
/// samples from.
///
/// The wrapper is created once per filter instance; the backing texture is
/// allocated on first use and only replaced when the frame size changes.
/// Contents are fully overwritten every frame.
pub struct RenderTarget {
    label: &'static str,
    texture: Option<wgpu::Texture>,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            texture: None,
            width: 0,
            height: 0,
        }
    }

    /// Ensure the backing texture matches `width × height`.
    pub fn begin(&mut self, ctx: &GpuContext, width: u32, height: u32) -> Result<(), GpuError> {
        if self.texture.is_some() && self.width == width && self.height == height {
            return Ok(());
        }
        if !ctx.supports_size(width, height) {
            return Err(GpuError::TextureCreate {
                label: self.label,
                reason: format!("{width}x{height} exceeds device limits"),
            });
        }
        self.texture = Some(ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(self.label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }));
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Clear the target to transparent black.
    pub fn clear(&self, ctx: &GpuContext) {
        let Some(view) = self.view() else { return };
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("target_clear"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("target_clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        ctx.submit_one(encoder);
    }

    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.texture.as_ref()
    }

    pub fn view(&self) -> Option<wgpu::TextureView> {
        self.texture
            .as_ref()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_allocated(&self) -> bool {
        self.texture.is_some()
    }
}

/// `bytes_per_row` rounded up to wgpu's copy alignment.
pub(crate) fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unaligned + align - 1) / align * align
}

/// Read a texture back as tightly packed RGBA bytes.
///
/// Blocking — used by hosts that need CPU frames and by the integration
/// tests. Returns an empty vector if the mapping fails.
pub fn read_texture(ctx: &GpuContext, texture: &wgpu::Texture, width: u32, height: u32) -> Vec<u8> {
    let device = &ctx.device;
    let queue = &ctx.queue;

    let bytes_per_row = aligned_bytes_per_row(width);
    let buffer_size = (bytes_per_row * height) as u64;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback_staging"),
        size: buffer_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("[gpu] read_texture map error: {:?}", e);
            return vec![];
        }
        Err(e) => {
            eprintln!("[gpu] read_texture channel error: {:?}", e);
            return vec![];
        }
    }

    let mapped = slice.get_mapped_range();
    let actual_row = (width * 4) as usize;

    let mut result = Vec::with_capacity(actual_row * height as usize);
    for y in 0..height as usize {
        let start = y * bytes_per_row as usize;
        result.extend_from_slice(&mapped[start..start + actual_row]);
    }

    drop(mapped);
    staging.unmap();

    result
}
