// Both shaders share this uniform block; keep it in sync with `gpu::Uniforms`.
const UNIFORMS: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    // xyz: eye position
    eye: vec4<f32>,
    // xyz: direction towards the sky colour, w: intensity
    sky: vec4<f32>,
    ground_color: vec4<f32>,
    clear_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
"#;

const MESH_BODY: &str = r#"
struct MeshVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct MeshInstance {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) base_color: vec4<f32>,
    // rgb: rim colour, w: strength (0 when not selected)
    @location(7) highlight: vec4<f32>,
};

struct Shaded {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) base_color: vec4<f32>,
    @location(3) highlight: vec4<f32>,
};

@vertex
fn vs_mesh(vertex: MeshVertex, instance: MeshInstance) -> Shaded {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world = model * vec4<f32>(vertex.position, 1.0);

    var out: Shaded;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.base_color = instance.base_color;
    out.highlight = instance.highlight;
    return out;
}

@fragment
fn fs_mesh(in: Shaded) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let hemi = 0.5 + 0.5 * dot(n, normalize(frame.sky.xyz));
    let ambient = mix(frame.ground_color.rgb, vec3<f32>(1.0), hemi) * frame.sky.w;

    let to_eye = normalize(frame.eye.xyz - in.world_pos);
    let rim = pow(1.0 - max(dot(n, to_eye), 0.0), 2.0);
    let glow = in.highlight.rgb * in.highlight.w * (0.25 + rim);

    return vec4<f32>(in.base_color.rgb * ambient + glow, in.base_color.a);
}
"#;

const GRID_BODY: &str = r#"
struct GridVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct GridOut {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

// Lines fade into the clear colour between these distances from the eye.
const FADE_START: f32 = 20.0;
const FADE_END: f32 = 60.0;

@vertex
fn vs_grid(vertex: GridVertex) -> GridOut {
    let distance = length(vertex.position - frame.eye.xyz);
    let fade = smoothstep(FADE_START, FADE_END, distance);

    var out: GridOut;
    out.clip_position = frame.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = mix(vertex.color, frame.clear_color, fade);
    return out;
}

@fragment
fn fs_grid(in: GridOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Lit mesh shader: hemispheric light plus a rim glow on the highlighted mesh.
pub fn mesh_shader() -> String {
    format!("{UNIFORMS}{MESH_BODY}")
}

/// Ground grid, faded with distance.
pub fn grid_shader() -> String {
    format!("{UNIFORMS}{GRID_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_share_the_uniform_block() {
        for source in [mesh_shader(), grid_shader()] {
            assert_eq!(source.matches("struct Frame").count(), 1);
            assert!(source.contains("var<uniform> frame: Frame;"));
        }
        assert!(mesh_shader().contains("fn vs_mesh"));
        assert!(grid_shader().contains("fn fs_grid"));
    }
}
