use blade_graphics as gpu;
use std::{fs, mem, slice};

use crate::{
    camera::Camera,
    loader::{Loader, Submission},
    model::ModelInstance,
    text::GlyphInstance,
    texture::Texture,
    Error,
};

const MAX_GLYPHS: usize = 1024;
const LIGHT_DIR: [f32; 3] = [-0.3, -1.0, -0.5];

/// Mesh vertex as read from a storage buffer by `shaders/mesh.wgsl`.
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: u32,
    pub tex_coords: [f32; 2],
    pub pad: [f32; 2],
}

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct CameraParams {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct ObjectParams {
    transform: [[f32; 4]; 4],
    color: [f32; 4],
}

#[derive(blade_macros::ShaderData)]
struct MeshDrawData {
    g_camera: CameraParams,
    g_object: ObjectParams,
    g_vertices: gpu::BufferPiece,
}

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct BackgroundParams {
    color: [f32; 4],
}

#[derive(blade_macros::ShaderData)]
struct BackgroundData {
    g_background: BackgroundParams,
}

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct TextParams {
    screen_size: [f32; 2],
    pad: [f32; 2],
    color: [f32; 4],
}

#[derive(blade_macros::ShaderData)]
struct TextData {
    g_text: TextParams,
    g_glyphs: gpu::BufferPiece,
    g_font: gpu::TextureView,
    g_font_sampler: gpu::Sampler,
}

/// Screen-space text for one frame.
pub struct TextBatch<'a> {
    pub glyphs: &'a [GlyphInstance],
    pub color: [f32; 4],
}

struct Pipelines {
    background: gpu::RenderPipeline,
    mesh: gpu::RenderPipeline,
    text: gpu::RenderPipeline,
}

impl Pipelines {
    fn load_shader(context: &gpu::Context, path: &str) -> Result<gpu::Shader, Error> {
        let source = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.into(),
            source,
        })?;
        Ok(context.create_shader(gpu::ShaderDesc { source: &source }))
    }

    fn new(context: &gpu::Context, surface_info: gpu::SurfaceInfo) -> Result<Self, Error> {
        let depth_format = gpu::TextureFormat::Depth32Float;

        let background_shader = Self::load_shader(context, "shaders/background.wgsl")?;
        let background_layout = <BackgroundData as gpu::ShaderData>::layout();
        let background = context.create_render_pipeline(gpu::RenderPipelineDesc {
            name: "background",
            data_layouts: &[&background_layout],
            vertex: background_shader.at("vs_background"),
            vertex_fetches: &[],
            primitive: gpu::PrimitiveState::default(),
            depth_stencil: Some(gpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false,
                depth_compare: gpu::CompareFunction::Always,
                stencil: gpu::StencilState::default(),
                bias: gpu::DepthBiasState::default(),
            }),
            fragment: Some(background_shader.at("fs_background")),
            color_targets: &[surface_info.format.into()],
            multisample_state: gpu::MultisampleState::default(),
        });

        let mesh_shader = Self::load_shader(context, "shaders/mesh.wgsl")?;
        let mesh_layout = <MeshDrawData as gpu::ShaderData>::layout();
        let mesh = context.create_render_pipeline(gpu::RenderPipelineDesc {
            name: "mesh",
            data_layouts: &[&mesh_layout],
            vertex: mesh_shader.at("vs_mesh"),
            vertex_fetches: &[],
            primitive: gpu::PrimitiveState {
                front_face: gpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(gpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: gpu::CompareFunction::Less,
                stencil: gpu::StencilState::default(),
                bias: gpu::DepthBiasState::default(),
            }),
            fragment: Some(mesh_shader.at("fs_mesh")),
            color_targets: &[surface_info.format.into()],
            multisample_state: gpu::MultisampleState::default(),
        });

        let text_shader = Self::load_shader(context, "shaders/text.wgsl")?;
        let text_layout = <TextData as gpu::ShaderData>::layout();
        let text = context.create_render_pipeline(gpu::RenderPipelineDesc {
            name: "text",
            data_layouts: &[&text_layout],
            vertex: text_shader.at("vs_text"),
            vertex_fetches: &[],
            primitive: gpu::PrimitiveState::default(),
            depth_stencil: Some(gpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false,
                depth_compare: gpu::CompareFunction::Always,
                stencil: gpu::StencilState::default(),
                bias: gpu::DepthBiasState::default(),
            }),
            fragment: Some(text_shader.at("fs_text")),
            color_targets: &[gpu::ColorTargetState {
                format: surface_info.format,
                blend: Some(gpu::BlendState::ALPHA_BLENDING),
                write_mask: gpu::ColorWrites::default(),
            }],
            multisample_state: gpu::MultisampleState::default(),
        });

        Ok(Self {
            background,
            mesh,
            text,
        })
    }

    fn destroy(&mut self, context: &gpu::Context) {
        context.destroy_render_pipeline(&mut self.background);
        context.destroy_render_pipeline(&mut self.mesh);
        context.destroy_render_pipeline(&mut self.text);
    }
}

pub struct Render {
    context: gpu::Context,
    surface: gpu::Surface,
    command_encoder: gpu::CommandEncoder,
    last_sync_point: Option<gpu::SyncPoint>,
    extent: gpu::Extent,
    depth: Texture,
    depth_needs_init: bool,
    pipelines: Pipelines,
    font: Texture,
    font_sampler: gpu::Sampler,
    glyph_buffer: gpu::Buffer,
    background: [f32; 4],
}

impl Render {
    pub fn new(
        context: gpu::Context,
        mut surface: gpu::Surface,
        extent: gpu::Extent,
    ) -> Result<Self, Error> {
        context.reconfigure_surface(&mut surface, Self::surface_config(extent));
        let pipelines = Pipelines::new(&context, surface.info())?;
        let command_encoder = context.create_command_encoder(gpu::CommandEncoderDesc {
            name: "main",
            buffer_count: 2,
        });
        let depth = Texture::new_depth(&context, extent);
        let font_sampler = context.create_sampler(gpu::SamplerDesc {
            name: "font",
            mag_filter: gpu::FilterMode::Nearest,
            min_filter: gpu::FilterMode::Nearest,
            ..Default::default()
        });
        let glyph_buffer = context.create_buffer(gpu::BufferDesc {
            name: "glyphs",
            size: (MAX_GLYPHS * mem::size_of::<GlyphInstance>()) as u64,
            memory: gpu::Memory::Shared,
        });

        Ok(Self {
            context,
            surface,
            command_encoder,
            last_sync_point: None,
            extent,
            depth,
            depth_needs_init: true,
            pipelines,
            font: Texture::default(),
            font_sampler,
            glyph_buffer,
            background: [1.0; 4],
        })
    }

    fn surface_config(extent: gpu::Extent) -> gpu::SurfaceConfig {
        gpu::SurfaceConfig {
            size: extent,
            usage: gpu::TextureUsage::TARGET,
            display_sync: gpu::DisplaySync::Block,
            ..Default::default()
        }
    }

    pub fn context(&self) -> &gpu::Context {
        &self.context
    }

    pub fn start_loading(&mut self) -> Loader {
        Loader::new(&self.context, &mut self.command_encoder)
    }

    /// Blocks until the loader's uploads are done and frees its staging buffers.
    pub fn accept_submission(&mut self, submission: Submission) {
        self.context.wait_for(&submission.sync_point, !0);
        for buffer in submission.temp_buffers {
            self.context.destroy_buffer(buffer);
        }
    }

    pub fn set_font(&mut self, font: Texture) {
        self.font.deinit(&self.context);
        self.font = font;
    }

    pub fn set_background(&mut self, color: [f32; 4]) {
        self.background = color;
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.extent.width as f32 / self.extent.height.max(1) as f32
    }

    pub fn resize(&mut self, extent: gpu::Extent) {
        self.wait_for_gpu();
        self.extent = extent;
        self.context
            .reconfigure_surface(&mut self.surface, Self::surface_config(extent));
        self.depth.deinit(&self.context);
        self.depth = Texture::new_depth(&self.context, extent);
        self.depth_needs_init = true;
    }

    pub fn wait_for_gpu(&mut self) {
        if let Some(sync_point) = self.last_sync_point.take() {
            self.context.wait_for(&sync_point, !0);
        }
    }

    fn upload_glyphs(&mut self, glyphs: &[GlyphInstance]) -> u32 {
        let count = glyphs.len().min(MAX_GLYPHS);
        if count < glyphs.len() {
            log::warn!("Dropping {} glyphs over the limit", glyphs.len() - count);
        }
        let bytes: &[u8] = bytemuck::cast_slice(&glyphs[..count]);
        let mapped = unsafe { slice::from_raw_parts_mut(self.glyph_buffer.data(), bytes.len()) };
        mapped.copy_from_slice(bytes);
        self.context.sync_buffer(self.glyph_buffer);
        count as u32
    }

    pub fn draw(&mut self, camera: &Camera, instances: &[&ModelInstance], text: TextBatch) {
        profiling::scope!("Draw");
        // The glyph buffer is rewritten every frame, so the previous one
        // has to be done reading it.
        self.wait_for_gpu();
        let glyph_count = if self.font.is_initialized() {
            self.upload_glyphs(text.glyphs)
        } else {
            0
        };

        let camera_params = CameraParams {
            view_proj: camera.view_projection(self.aspect_ratio()).into(),
            light_dir: {
                let dir = nalgebra::Vector3::from(LIGHT_DIR).normalize();
                [dir.x, dir.y, dir.z, 0.0]
            },
        };

        let frame = self.surface.acquire_frame();
        self.command_encoder.start();
        if self.depth_needs_init {
            self.command_encoder.init_texture(self.depth.raw);
            self.depth_needs_init = false;
        }

        if let mut pass = self.command_encoder.render(
            "main",
            gpu::RenderTargetSet {
                colors: &[gpu::RenderTarget {
                    view: frame.texture_view(),
                    init_op: gpu::InitOp::Clear(gpu::TextureColor::White),
                    finish_op: gpu::FinishOp::Store,
                }],
                depth_stencil: Some(gpu::RenderTarget {
                    view: self.depth.view,
                    init_op: gpu::InitOp::Clear(gpu::TextureColor::White),
                    finish_op: gpu::FinishOp::Discard,
                }),
            },
        ) {
            if let mut pen = pass.with(&self.pipelines.background) {
                pen.bind(
                    0,
                    &BackgroundData {
                        g_background: BackgroundParams {
                            color: self.background,
                        },
                    },
                );
                pen.draw(0, 3, 0, 1);
            }

            if let mut pen = pass.with(&self.pipelines.mesh) {
                for instance in instances {
                    let base = instance.transform();
                    for geometry in instance.model.geometries.iter() {
                        pen.bind(
                            0,
                            &MeshDrawData {
                                g_camera: camera_params,
                                g_object: ObjectParams {
                                    transform: geometry.world_transform(&base),
                                    color: instance.color_of(geometry),
                                },
                                g_vertices: geometry.buffer.into(),
                            },
                        );
                        pen.draw_indexed(
                            geometry.buffer.at(geometry.index_offset),
                            gpu::IndexType::U32,
                            geometry.index_count,
                            0,
                            0,
                            1,
                        );
                    }
                }
            }

            if glyph_count != 0 {
                let mut pen = pass.with(&self.pipelines.text);
                pen.bind(
                    0,
                    &TextData {
                        g_text: TextParams {
                            screen_size: [self.extent.width as f32, self.extent.height as f32],
                            pad: [0.0; 2],
                            color: text.color,
                        },
                        g_glyphs: self.glyph_buffer.into(),
                        g_font: self.font.view,
                        g_font_sampler: self.font_sampler,
                    },
                );
                pen.draw(0, 6, 0, glyph_count);
            }
        }

        self.command_encoder.present(frame);
        let sync_point = self.context.submit(&mut self.command_encoder);
        self.last_sync_point = Some(sync_point);
    }

    pub fn deinit(&mut self) {
        self.wait_for_gpu();
        self.font.deinit(&self.context);
        self.depth.deinit(&self.context);
        self.context.destroy_sampler(self.font_sampler);
        self.context.destroy_buffer(self.glyph_buffer);
        self.pipelines.destroy(&self.context);
        self.context
            .destroy_command_encoder(&mut self.command_encoder);
        self.context.destroy_surface(&mut self.surface);
    }
}
