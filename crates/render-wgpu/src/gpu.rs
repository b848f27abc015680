use crate::shaders;
use crate::texture::RoomTexture;
use boxroom_assets::TextureImage;
use boxroom_render::{Mesh, MeshVariant, RenderView, room_colored, room_textured};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.2,
    a: 1.0,
};

const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
const TEXTURED_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    mvp: [[f32; 4]; 4],
}

/// What to do when the shader program fails to compile or link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderPolicy {
    /// Log the diagnostic and keep running with a program that draws nothing.
    #[default]
    Permissive,
    /// Fail renderer creation.
    Strict,
}

/// Outcome of building a shader program under a [`ShaderPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramStatus {
    Ready,
    Unusable,
}

impl ProgramStatus {
    /// Whether the room draw may be recorded. An unusable program only clears.
    pub fn can_draw(self) -> bool {
        self == ProgramStatus::Ready
    }
}

/// Errors from renderer creation.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader program `{label}` failed to build: {message}")]
    Shader { label: &'static str, message: String },
    #[error("texture is {width}x{height} but the device allows at most {max}x{max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },
}

/// Apply `policy` to the diagnostic captured while building a program.
pub fn check_program(
    label: &'static str,
    diagnostic: Option<String>,
    policy: ShaderPolicy,
) -> Result<ProgramStatus, RenderError> {
    let Some(message) = diagnostic else {
        return Ok(ProgramStatus::Ready);
    };
    match policy {
        ShaderPolicy::Strict => Err(RenderError::Shader { label, message }),
        ShaderPolicy::Permissive => {
            tracing::error!("shader program `{label}` failed to build: {message}");
            tracing::warn!("continuing with an unusable shader program");
            Ok(ProgramStatus::Unusable)
        }
    }
}

/// Surface content for the room.
#[derive(Debug, Clone, Copy)]
pub enum RoomMaterial<'a> {
    VertexColor,
    Texture(&'a TextureImage),
}

impl RoomMaterial<'_> {
    pub fn variant(&self) -> MeshVariant {
        match self {
            RoomMaterial::VertexColor => MeshVariant::Colored,
            RoomMaterial::Texture(_) => MeshVariant::Textured,
        }
    }
}

fn upload_mesh<V: Pod>(device: &wgpu::Device, mesh: &Mesh<V>) -> (wgpu::Buffer, wgpu::Buffer) {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("room_vertex_buffer"),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("room_index_buffer"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    (vertex_buffer, index_buffer)
}

/// wgpu-based room renderer.
///
/// Fields drop in declaration order: buffers first, then the program.
pub struct WgpuRenderer {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture: Option<RoomTexture>,
    depth_texture: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    status: ProgramStatus,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        material: RoomMaterial<'_>,
        policy: ShaderPolicy,
    ) -> Result<Self, RenderError> {
        let variant = material.variant();

        // Uniform buffer
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                mvp: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture = match material {
            RoomMaterial::VertexColor => None,
            RoomMaterial::Texture(image) => Some(RoomTexture::upload(device, queue, image)?),
        };

        let mut bind_group_layouts = vec![&uniform_layout];
        if let Some(texture) = &texture {
            bind_group_layouts.push(&texture.layout);
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let (label, source, stride, attributes): (_, _, usize, &[wgpu::VertexAttribute]) =
            match variant {
                MeshVariant::Colored => (
                    "room_color",
                    shaders::COLOR_SHADER,
                    std::mem::size_of::<boxroom_render::ColorVertex>(),
                    &COLOR_ATTRIBUTES[..],
                ),
                MeshVariant::Textured => (
                    "room_textured",
                    shaders::TEXTURE_SHADER,
                    std::mem::size_of::<boxroom_render::TexturedVertex>(),
                    &TEXTURED_ATTRIBUTES[..],
                ),
            };

        // Compile and link under an error scope so diagnostics reach the policy.
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: stride as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        let diagnostic = pollster::block_on(device.pop_error_scope()).map(|e| e.to_string());
        let status = check_program(label, diagnostic, policy)?;
        tracing::debug!(?status, ?variant, "room pipeline created");

        // Room mesh, uploaded once
        let (vertex_buffer, index_buffer, index_count) = match variant {
            MeshVariant::Colored => {
                let mesh = room_colored();
                let (vb, ib) = upload_mesh(device, &mesh);
                (vb, ib, mesh.index_count())
            }
            MeshVariant::Textured => {
                let mesh = room_textured();
                let (vb, ib) = upload_mesh(device, &mesh);
                (vb, ib, mesh.index_count())
            }
        };

        let depth_texture = Self::create_depth_texture(device, width, height);

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count,
            uniform_buffer,
            uniform_bind_group,
            texture,
            depth_texture,
            pipeline,
            status,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Render one frame: clear, then one indexed draw of the room. With an
    /// unusable program the frame is only cleared.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        view: &RenderView,
    ) {
        let mvp = view.mvp(Mat4::IDENTITY);
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                mvp: mvp.to_cols_array_2d(),
            }),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if self.status.can_draw() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                if let Some(texture) = &self.texture {
                    pass.set_bind_group(1, &texture.bind_group, &[]);
                }
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_build_is_ready_under_any_policy() {
        for policy in [ShaderPolicy::Permissive, ShaderPolicy::Strict] {
            assert_eq!(check_program("p", None, policy).unwrap(), ProgramStatus::Ready);
        }
    }

    // A failed build is deliberately survivable by default: the window stays up
    // and draws nothing useful. Strict mode exists for anyone who would rather
    // stop at startup; which of the two should be the default is still open.
    #[test]
    fn permissive_policy_keeps_running_on_failure() {
        let status =
            check_program("p", Some("undefined identifier".into()), ShaderPolicy::Permissive)
                .unwrap();
        assert_eq!(status, ProgramStatus::Unusable);
    }

    #[test]
    fn only_a_ready_program_draws() {
        assert!(ProgramStatus::Ready.can_draw());
        assert!(!ProgramStatus::Unusable.can_draw());
    }

    #[test]
    fn strict_policy_fails_on_failure() {
        let err = check_program("room_color", Some("bad".into()), ShaderPolicy::Strict)
            .unwrap_err();
        let RenderError::Shader { label, message } = &err else {
            panic!("expected a shader error, got {err:?}");
        };
        assert_eq!(*label, "room_color");
        assert_eq!(message, "bad");
        assert!(err.to_string().contains("room_color"));
    }

    #[test]
    fn default_policy_is_permissive() {
        assert_eq!(ShaderPolicy::default(), ShaderPolicy::Permissive);
    }

    #[test]
    fn material_selects_variant() {
        let image = TextureImage {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        };
        assert_eq!(RoomMaterial::VertexColor.variant(), MeshVariant::Colored);
        assert_eq!(RoomMaterial::Texture(&image).variant(), MeshVariant::Textured);
    }

    #[test]
    fn vertex_attributes_fill_the_stride() {
        let last = COLOR_ATTRIBUTES[1];
        assert_eq!(
            last.offset + last.format.size(),
            std::mem::size_of::<boxroom_render::ColorVertex>() as u64
        );
        let last = TEXTURED_ATTRIBUTES[2];
        assert_eq!(
            last.offset + last.format.size(),
            std::mem::size_of::<boxroom_render::TexturedVertex>() as u64
        );
    }
}
