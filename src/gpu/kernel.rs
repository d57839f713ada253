// ============================================================================
// GAUSSIAN KERNEL TABLE — precomputed weights for every supported radius
// ============================================================================

use super::GpuError;
use super::context::GpuContext;

/// Largest blur radius the filter exposes.
pub const MAX_KERNEL_SIZE: u32 = 25;

/// Unnormalized 1D gaussian with sigma equal to the kernel width.
fn gaussian(x: f64, width: f64) -> f64 {
    (-(x * x) / (2.0 * width * width)).exp()
}

/// Build the kernel table rows.
///
/// Returns `(side, weights)` where `side` is the power-of-two texture edge
/// and row `w - 1` holds `w + 1` normalized samples for kernel width `w`:
/// the center weight once, positive offsets 1..=w normalized as if applied
/// to both sides. Rows only depend on their own width, so growing
/// `max_radius` pads the table without changing existing rows.
pub fn kernel_table(max_radius: u32) -> (u32, Vec<f32>) {
    let side = max_radius.next_power_of_two();
    let mut table = vec![0.0f32; (side * side) as usize];
    let mut row = vec![0.0f64; side as usize + 1];

    for width in 1..=max_radius {
        let base = ((width - 1) * side) as usize;

        let mut sum = 0.0f64;
        for p in 0..=width as usize {
            let v = gaussian(p as f64, width as f64);
            row[p] = v;
            sum += if p > 0 { v * 2.0 } else { v };
        }

        let inverse = 1.0 / sum;
        for p in 0..=width as usize {
            table[base + p] = (row[p] * inverse) as f32;
        }
    }

    (side, table)
}

/// The shared kernel texture: one R32Float row per kernel width.
/// Generated once when the module loads; read-only afterwards.
pub struct KernelTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub side: u32,
}

impl KernelTexture {
    pub fn generate(ctx: &GpuContext) -> Result<Self, GpuError> {
        let (side, weights) = kernel_table(MAX_KERNEL_SIZE);
        if !ctx.supports_size(side, side) {
            return Err(GpuError::TextureCreate {
                label: "gaussian_kernel",
                reason: format!("{side}x{side} exceeds device limits"),
            });
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gaussian_kernel"),
            size: wgpu::Extent3d {
                width: side,
                height: side,
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
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&weights),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * side),
                rows_per_image: Some(side),
            },
            wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: 1,
            },
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            side,
        })
    }

    /// Texel size of the kernel texture, bound as `kernelTexel`.
    pub fn texel(&self) -> [f32; 2] {
        [1.0 / self.side as f32, 1.0 / self.side as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn every_row_normalizes_to_one() {
        let (side, table) = kernel_table(MAX_KERNEL_SIZE);
        for width in 1..=MAX_KERNEL_SIZE {
            let base = ((width - 1) * side) as usize;
            // Reconstruct the symmetric kernel: center once, sides twice.
            let mut sum = table[base] as f64;
            for p in 1..=width as usize {
                sum += 2.0 * table[base + p] as f64;
            }
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn side_is_next_power_of_two() {
        assert_eq!(kernel_table(25).0, 32);
        assert_eq!(kernel_table(12).0, 16);
        assert_eq!(kernel_table(16).0, 16);
    }

    #[test]
    fn rows_do_not_depend_on_max_radius() {
        let (side_small, small) = kernel_table(12);
        let (side_big, big) = kernel_table(MAX_KERNEL_SIZE);
        for width in 1..=12u32 {
            for p in 0..=width as usize {
                let a = small[((width - 1) * side_small) as usize + p];
                let b = big[((width - 1) * side_big) as usize + p];
                assert_eq!(a, b, "row {width} sample {p} changed with table size");
            }
        }
    }

    #[test]
    fn weights_decrease_away_from_center() {
        let (side, table) = kernel_table(MAX_KERNEL_SIZE);
        for width in 1..=MAX_KERNEL_SIZE {
            let base = ((width - 1) * side) as usize;
            for p in 1..=width as usize {
                assert!(table[base + p] < table[base + p - 1]);
            }
        }
    }

    #[test]
    fn padding_cells_stay_zero() {
        let (side, table) = kernel_table(MAX_KERNEL_SIZE);
        // Entries past each row's w + 1 samples are never written.
        let base = 0usize; // row for width 1 holds 2 samples
        for p in 2..side as usize {
            assert_eq!(table[base + p], 0.0);
        }
    }
}
