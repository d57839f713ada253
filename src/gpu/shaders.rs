// ============================================================================
// GPU SHADERS — all WGSL code kept inline for containment
// ============================================================================
//
// Every blur program exposes the same five techniques (entry points):
//   fs_draw                       — blur the whole frame
//   fs_draw_region                — blur only inside the region rectangle
//   fs_draw_region_feather        — region with a feathered boundary band
//   fs_draw_region_invert         — blur only outside the rectangle
//   fs_draw_region_feather_invert — feathered, inverted
//
// Scalar parameters live in a single 64-byte uniform block at @group(1);
// the input frame is always @group(0). The gaussian program additionally
// binds the shared kernel texture at @group(2).
//
// Region bounds arrive in frame-normalized top-left-origin coordinates with
// right/bottom already converted to absolute bounds, so the shaders never
// see the host's inset percentages.

// ============================================================================
// BOX BLUR — uniform-weight separable pass
// ============================================================================

pub const BOX_BLUR_SHADER: &str = r#"
struct BlurUniforms {
    imageSize: vec2<f32>,
    imageTexel: vec2<f32>,
    texelDelta: vec2<f32>,
    radius: i32,
    diameter: i32,
    regionLeft: f32,
    regionTop: f32,
    regionRight: f32,
    regionBottom: f32,
    regionFeather: f32,
    regionFeatherShift: f32,
    pad0: vec2<f32>,
};

@group(0) @binding(0) var u_image: texture_2d<f32>;
@group(0) @binding(1) var u_sampler: sampler;
@group(1) @binding(0) var<uniform> u: BlurUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) vi: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let pos = positions[vi];
    var out: VertexOutput;
    out.position = vec4<f32>(pos.x * 2.0 - 1.0, 1.0 - pos.y * 2.0, 0.0, 1.0);
    out.uv = pos;
    return out;
}

fn blurred(uv: vec2<f32>) -> vec4<f32> {
    var accum = vec4<f32>(0.0);
    for (var k: i32 = -u.radius; k <= u.radius; k = k + 1) {
        accum = accum + textureSampleLevel(u_image, u_sampler, uv + u.texelDelta * f32(k), 0.0);
    }
    return accum / f32(u.diameter);
}

fn inside_region(uv: vec2<f32>) -> f32 {
    if (uv.x < u.regionLeft || uv.x > u.regionRight ||
        uv.y < u.regionTop || uv.y > u.regionBottom) {
        return 0.0;
    }
    return 1.0;
}

fn feathered_region(uv: vec2<f32>) -> f32 {
    let d = min(min(uv.x - u.regionLeft, u.regionRight - uv.x),
                min(uv.y - u.regionTop, u.regionBottom - uv.y));
    let f = max(u.regionFeather, 0.0001);
    return clamp((d + u.regionFeatherShift * f) / f, 0.0, 1.0);
}

@fragment
fn fs_draw(in: VertexOutput) -> @location(0) vec4<f32> {
    return blurred(in.uv);
}

@fragment
fn fs_draw_region(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), inside_region(in.uv));
}

@fragment
fn fs_draw_region_feather(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), feathered_region(in.uv));
}

@fragment
fn fs_draw_region_invert(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), 1.0 - inside_region(in.uv));
}

@fragment
fn fs_draw_region_feather_invert(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), 1.0 - feathered_region(in.uv));
}
"#;

// ============================================================================
// GAUSSIAN BLUR — weights read from the precomputed kernel texture
// ============================================================================
//
// Row `radius - 1` of the kernel texture holds the normalized weights for
// offsets 0..=radius; side samples are applied symmetrically.

pub const GAUSSIAN_BLUR_SHADER: &str = r#"
struct BlurUniforms {
    imageSize: vec2<f32>,
    imageTexel: vec2<f32>,
    texelDelta: vec2<f32>,
    radius: i32,
    diameter: i32,
    regionLeft: f32,
    regionTop: f32,
    regionRight: f32,
    regionBottom: f32,
    regionFeather: f32,
    regionFeatherShift: f32,
    kernelTexel: vec2<f32>,
};

@group(0) @binding(0) var u_image: texture_2d<f32>;
@group(0) @binding(1) var u_sampler: sampler;
@group(1) @binding(0) var<uniform> u: BlurUniforms;
@group(2) @binding(0) var u_kernel: texture_2d<f32>;
@group(2) @binding(1) var u_kernelSampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) vi: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let pos = positions[vi];
    var out: VertexOutput;
    out.position = vec4<f32>(pos.x * 2.0 - 1.0, 1.0 - pos.y * 2.0, 0.0, 1.0);
    out.uv = pos;
    return out;
}

fn kernel_weight(offset: i32) -> f32 {
    let coord = vec2<f32>((f32(offset) + 0.5) * u.kernelTexel.x,
                          (f32(u.radius - 1) + 0.5) * u.kernelTexel.y);
    return textureSampleLevel(u_kernel, u_kernelSampler, coord, 0.0).r;
}

fn blurred(uv: vec2<f32>) -> vec4<f32> {
    var accum = textureSampleLevel(u_image, u_sampler, uv, 0.0) * kernel_weight(0);
    for (var k: i32 = 1; k <= u.radius; k = k + 1) {
        let w = kernel_weight(k);
        let below = textureSampleLevel(u_image, u_sampler, uv - u.texelDelta * f32(k), 0.0);
        let above = textureSampleLevel(u_image, u_sampler, uv + u.texelDelta * f32(k), 0.0);
        accum = accum + (below + above) * w;
    }
    return accum;
}

fn inside_region(uv: vec2<f32>) -> f32 {
    if (uv.x < u.regionLeft || uv.x > u.regionRight ||
        uv.y < u.regionTop || uv.y > u.regionBottom) {
        return 0.0;
    }
    return 1.0;
}

fn feathered_region(uv: vec2<f32>) -> f32 {
    let d = min(min(uv.x - u.regionLeft, u.regionRight - uv.x),
                min(uv.y - u.regionTop, u.regionBottom - uv.y));
    let f = max(u.regionFeather, 0.0001);
    return clamp((d + u.regionFeatherShift * f) / f, 0.0, 1.0);
}

@fragment
fn fs_draw(in: VertexOutput) -> @location(0) vec4<f32> {
    return blurred(in.uv);
}

@fragment
fn fs_draw_region(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), inside_region(in.uv));
}

@fragment
fn fs_draw_region_feather(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), feathered_region(in.uv));
}

@fragment
fn fs_draw_region_invert(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), 1.0 - inside_region(in.uv));
}

@fragment
fn fs_draw_region_feather_invert(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), 1.0 - feathered_region(in.uv));
}
"#;

// ============================================================================
// BILATERAL BLUR — edge-aware: weight = spatial gaussian × value gaussian
// ============================================================================
//
// bilateralSmoothing arrives pre-scaled to pixels (normalized × diameter);
// bilateralSharpness arrives as 1 − normalized sharpness, used as the sigma
// of the value-distance term.

pub const BILATERAL_BLUR_SHADER: &str = r#"
struct BlurUniforms {
    imageSize: vec2<f32>,
    imageTexel: vec2<f32>,
    texelDelta: vec2<f32>,
    radius: i32,
    diameter: i32,
    regionLeft: f32,
    regionTop: f32,
    regionRight: f32,
    regionBottom: f32,
    regionFeather: f32,
    regionFeatherShift: f32,
    bilateralSmoothing: f32,
    bilateralSharpness: f32,
};

@group(0) @binding(0) var u_image: texture_2d<f32>;
@group(0) @binding(1) var u_sampler: sampler;
@group(1) @binding(0) var<uniform> u: BlurUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) vi: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let pos = positions[vi];
    var out: VertexOutput;
    out.position = vec4<f32>(pos.x * 2.0 - 1.0, 1.0 - pos.y * 2.0, 0.0, 1.0);
    out.uv = pos;
    return out;
}

fn bilateral(x: f32, sigma: f32) -> f32 {
    let s = max(sigma, 0.0001);
    return 0.39894 * exp(-0.5 * (x * x) / (s * s)) / s;
}

fn blurred(uv: vec2<f32>) -> vec4<f32> {
    let center = textureSampleLevel(u_image, u_sampler, uv, 0.0);
    var accum = vec4<f32>(0.0);
    var total = 0.0;
    for (var k: i32 = -u.radius; k <= u.radius; k = k + 1) {
        let s = textureSampleLevel(u_image, u_sampler, uv + u.texelDelta * f32(k), 0.0);
        let w = bilateral(f32(abs(k)), u.bilateralSmoothing)
              * bilateral(distance(s.rgb, center.rgb), u.bilateralSharpness);
        accum = accum + s * w;
        total = total + w;
    }
    return accum / max(total, 0.0001);
}

fn inside_region(uv: vec2<f32>) -> f32 {
    if (uv.x < u.regionLeft || uv.x > u.regionRight ||
        uv.y < u.regionTop || uv.y > u.regionBottom) {
        return 0.0;
    }
    return 1.0;
}

fn feathered_region(uv: vec2<f32>) -> f32 {
    let d = min(min(uv.x - u.regionLeft, u.regionRight - uv.x),
                min(uv.y - u.regionTop, u.regionBottom - uv.y));
    let f = max(u.regionFeather, 0.0001);
    return clamp((d + u.regionFeatherShift * f) / f, 0.0, 1.0);
}

@fragment
fn fs_draw(in: VertexOutput) -> @location(0) vec4<f32> {
    return blurred(in.uv);
}

@fragment
fn fs_draw_region(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), inside_region(in.uv));
}

@fragment
fn fs_draw_region_feather(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), feathered_region(in.uv));
}

@fragment
fn fs_draw_region_invert(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), 1.0 - inside_region(in.uv));
}

@fragment
fn fs_draw_region_feather_invert(in: VertexOutput) -> @location(0) vec4<f32> {
    let plain = textureSampleLevel(u_image, u_sampler, in.uv, 0.0);
    return mix(plain, blurred(in.uv), 1.0 - feathered_region(in.uv));
}
"#;

// ============================================================================
// COLOR CONVERSION — BT.709 RGB ↔ YUV, alpha carried through untouched
// ============================================================================

pub const COLOR_CONVERSION_SHADER: &str = r#"
@group(0) @binding(0) var image: texture_2d<f32>;
@group(0) @binding(1) var image_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) vi: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let pos = positions[vi];
    var out: VertexOutput;
    out.position = vec4<f32>(pos.x * 2.0 - 1.0, 1.0 - pos.y * 2.0, 0.0, 1.0);
    out.uv = pos;
    return out;
}

fn rgb_to_yuv(c: vec3<f32>) -> vec3<f32> {
    let y = dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
    let cb = (c.b - y) / 1.8556 + 0.5;
    let cr = (c.r - y) / 1.5748 + 0.5;
    return vec3<f32>(y, cb, cr);
}

fn yuv_to_rgb(c: vec3<f32>) -> vec3<f32> {
    let y = c.x;
    let cb = c.y - 0.5;
    let cr = c.z - 0.5;
    let r = y + 1.5748 * cr;
    let g = y - 0.18733 * cb - 0.46813 * cr;
    let b = y + 1.8556 * cb;
    return vec3<f32>(r, g, b);
}

@fragment
fn fs_rgb_to_yuv(in: VertexOutput) -> @location(0) vec4<f32> {
    let c = textureSampleLevel(image, image_sampler, in.uv, 0.0);
    return vec4<f32>(clamp(rgb_to_yuv(c.rgb), vec3<f32>(0.0), vec3<f32>(1.0)), c.a);
}

@fragment
fn fs_yuv_to_rgb(in: VertexOutput) -> @location(0) vec4<f32> {
    let c = textureSampleLevel(image, image_sampler, in.uv, 0.0);
    return vec4<f32>(clamp(yuv_to_rgb(c.rgb), vec3<f32>(0.0), vec3<f32>(1.0)), c.a);
}
"#;

// ============================================================================
// PASSTHROUGH — plain composite draw, used when no conversion is needed
// ============================================================================

pub const PASSTHROUGH_SHADER: &str = r#"
@group(0) @binding(0) var image: texture_2d<f32>;
@group(0) @binding(1) var image_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) vi: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let pos = positions[vi];
    var out: VertexOutput;
    out.position = vec4<f32>(pos.x * 2.0 - 1.0, 1.0 - pos.y * 2.0, 0.0, 1.0);
    out.uv = pos;
    return out;
}

@fragment
fn fs_draw(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSampleLevel(image, image_sampler, in.uv, 0.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("WGSL parse failed:\n{}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("WGSL validation failed: {e:?}"));
        module
    }

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn blur_shaders_expose_all_region_techniques() {
        for source in [BOX_BLUR_SHADER, GAUSSIAN_BLUR_SHADER, BILATERAL_BLUR_SHADER] {
            let module = validate(source);
            let entries = entry_points(&module);
            for entry in [
                "vs_fullscreen",
                "fs_draw",
                "fs_draw_region",
                "fs_draw_region_feather",
                "fs_draw_region_invert",
                "fs_draw_region_feather_invert",
            ] {
                assert!(entries.contains(&entry), "missing entry point {entry}");
            }
        }
    }

    #[test]
    fn conversion_shader_exposes_both_directions() {
        let module = validate(COLOR_CONVERSION_SHADER);
        let entries = entry_points(&module);
        assert!(entries.contains(&"fs_rgb_to_yuv"));
        assert!(entries.contains(&"fs_yuv_to_rgb"));
    }

    #[test]
    fn passthrough_shader_validates() {
        let module = validate(PASSTHROUGH_SHADER);
        assert!(entry_points(&module).contains(&"fs_draw"));
    }
}
