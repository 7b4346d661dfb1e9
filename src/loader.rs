use blade_graphics as gpu;

use crate::{
    model::{Geometry, Material, Model},
    render::Vertex,
    texture::Texture,
    Error,
};
use base64::engine::{general_purpose::STANDARD as ENCODING_ENGINE, Engine as _};
use std::{
    fs, mem,
    path::{Path, PathBuf},
    slice,
};

/// GPU work recorded by a [`Loader`], with staging buffers that must live
/// until `sync_point` is reached.
pub struct Submission {
    pub sync_point: gpu::SyncPoint,
    pub temp_buffers: Vec<gpu::Buffer>,
}

/// CPU-side primitive, ready for upload.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub transform: nalgebra::Matrix4<f32>,
    pub material_index: usize,
}

#[derive(Debug, Default)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<Material>,
}

fn pack4x8snorm(v: [f32; 4]) -> u32 {
    v.iter().rev().fold(0u32, |u, f| {
        (u << 8) | (f.clamp(-1.0, 1.0) * 127.0).round() as i8 as u8 as u32
    })
}

pub(crate) fn encode_normal(v: [f32; 3]) -> u32 {
    pack4x8snorm([v[0], v[1], v[2], 0.0])
}

fn mesh_error(path: &Path, reason: impl Into<String>) -> Error {
    Error::Mesh {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn read_buffer_uri(path: &Path, uri: &str) -> Result<Vec<u8>, Error> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let (_before, after) = rest
            .split_once(";base64,")
            .ok_or_else(|| mesh_error(path, "data URI is not base64"))?;
        return ENCODING_ENGINE
            .decode(after)
            .map_err(|source| Error::Base64 {
                path: path.to_path_buf(),
                source,
            });
    }
    let relative = uri
        .strip_prefix("file://")
        .or_else(|| uri.strip_prefix("file:"))
        .unwrap_or(uri);
    let full: PathBuf = path.parent().unwrap_or(Path::new("")).join(relative);
    fs::read(&full).map_err(|source| Error::Io { path: full, source })
}

fn read_gltf_node(
    path: &Path,
    data: &mut ModelData,
    g_node: gltf::Node,
    parent_transform: nalgebra::Matrix4<f32>,
    data_buffers: &[Vec<u8>],
) -> Result<(), Error> {
    let local_transform = nalgebra::Matrix4::from(g_node.transform().matrix());
    let transform = parent_transform * local_transform;

    if let Some(g_mesh) = g_node.mesh() {
        let name = g_node.name().or(g_mesh.name()).unwrap_or("");

        for (prim_index, g_primitive) in g_mesh.primitives().enumerate() {
            if g_primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive '{}'[{}] for having mesh mode {:?}",
                    name,
                    prim_index,
                    g_primitive.mode()
                );
                continue;
            }

            let reader = g_primitive.reader(|buffer| data_buffers.get(buffer.index()).map(Vec::as_slice));
            let positions = reader
                .read_positions()
                .ok_or_else(|| mesh_error(path, format!("primitive '{name}'[{prim_index}] has no positions")))?;

            let mut vertices = Vec::with_capacity(positions.len());
            for position in positions {
                if position.iter().any(|c| !c.is_finite()) {
                    return Err(mesh_error(path, format!("non-finite position in '{name}'")));
                }
                vertices.push(Vertex {
                    position,
                    ..Default::default()
                });
            }
            if let Some(iter) = reader.read_tex_coords(0) {
                for (v, tc) in vertices.iter_mut().zip(iter.into_f32()) {
                    v.tex_coords = tc;
                }
            } else {
                log::warn!("No tex coords in {name}");
            }
            if let Some(iter) = reader.read_normals() {
                if iter.len() != vertices.len() {
                    return Err(mesh_error(path, format!("geometry {name} doesn't have enough normals")));
                }
                for (v, normal) in vertices.iter_mut().zip(iter) {
                    v.normal = encode_normal(normal);
                }
            } else {
                log::warn!("No normals in {name}");
            }

            let indices: Vec<u32> = match reader.read_indices() {
                Some(read) => read.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(mesh_error(path, format!("index {bad} out of range in '{name}'")));
            }

            data.meshes.push(MeshData {
                name: name.to_string(),
                vertices,
                indices,
                transform,
                material_index: match g_primitive.material().index() {
                    Some(index) => index + 1,
                    None => 0,
                },
            });
        }
    }

    for child in g_node.children() {
        read_gltf_node(path, data, child, transform, data_buffers)?;
    }
    Ok(())
}

/// Reads every triangle primitive of a glTF file into memory.
pub fn read_gltf(path: &Path) -> Result<ModelData, Error> {
    profiling::scope!("Read glTF");
    let gltf::Gltf { document, mut blob } =
        gltf::Gltf::open(path).map_err(|source| Error::Gltf {
            path: path.to_path_buf(),
            source,
        })?;

    let mut data_buffers = Vec::new();
    for buffer in document.buffers() {
        let mut data = match buffer.source() {
            gltf::buffer::Source::Uri(uri) => read_buffer_uri(path, uri)?,
            gltf::buffer::Source::Bin => blob
                .take()
                .ok_or_else(|| mesh_error(path, "missing binary chunk"))?,
        };
        if data.len() < buffer.length() {
            return Err(mesh_error(
                path,
                format!("buffer {} is truncated", buffer.index()),
            ));
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }
        data_buffers.push(data);
    }

    let mut data = ModelData::default();
    data.materials.push(Material::default()); // default goes first
    for g_material in document.materials() {
        let pbr = g_material.pbr_metallic_roughness();
        data.materials.push(Material {
            base_color_factor: pbr.base_color_factor(),
        });
    }

    for g_scene in document.scenes() {
        for g_node in g_scene.nodes() {
            read_gltf_node(
                path,
                &mut data,
                g_node,
                nalgebra::Matrix4::identity(),
                &data_buffers,
            )?;
        }
    }
    if data.meshes.is_empty() {
        return Err(mesh_error(path, "no triangle meshes"));
    }
    Ok(data)
}

/// Flat quad in the XZ plane, centered at the origin, facing +Y.
pub fn plane_mesh(size: [f32; 2]) -> MeshData {
    let [hx, hz] = [0.5 * size[0], 0.5 * size[1]];
    let normal = encode_normal([0.0, 1.0, 0.0]);
    let corners = [
        ([-hx, 0.0, hz], [0.0, 1.0]),
        ([hx, 0.0, hz], [1.0, 1.0]),
        ([hx, 0.0, -hz], [1.0, 0.0]),
        ([-hx, 0.0, -hz], [0.0, 0.0]),
    ];
    MeshData {
        name: "plane".to_string(),
        vertices: corners
            .iter()
            .map(|&(position, tex_coords)| Vertex {
                position,
                normal,
                tex_coords,
                ..Default::default()
            })
            .collect(),
        indices: vec![0, 1, 2, 0, 2, 3],
        transform: nalgebra::Matrix4::identity(),
        material_index: 0,
    }
}

pub struct Loader<'a> {
    context: &'a gpu::Context,
    encoder: &'a mut gpu::CommandEncoder,
    temp_buffers: Vec<gpu::Buffer>,
}

impl<'a> Loader<'a> {
    pub fn new(context: &'a gpu::Context, encoder: &'a mut gpu::CommandEncoder) -> Self {
        encoder.start();
        Self {
            context,
            encoder,
            temp_buffers: Vec::new(),
        }
    }

    pub fn finish(self) -> Submission {
        Submission {
            sync_point: self.context.submit(self.encoder),
            temp_buffers: self.temp_buffers,
        }
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> Geometry {
        profiling::scope!("Upload mesh");
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.indices);
        let index_offset = vertex_bytes.len();
        let total_size = index_offset + index_bytes.len();

        let buffer = self.context.create_buffer(gpu::BufferDesc {
            name: &mesh.name,
            size: total_size as u64,
            memory: gpu::Memory::Device,
        });
        let stage_buffer = self.context.create_buffer(gpu::BufferDesc {
            name: &mesh.name,
            size: total_size as u64,
            memory: gpu::Memory::Upload,
        });

        let staging = unsafe { slice::from_raw_parts_mut(stage_buffer.data(), total_size) };
        staging[..index_offset].copy_from_slice(vertex_bytes);
        staging[index_offset..].copy_from_slice(index_bytes);

        if let mut transfer = self.encoder.transfer("load mesh") {
            transfer.copy_buffer_to_buffer(stage_buffer.into(), buffer.into(), total_size as u64);
        }
        self.temp_buffers.push(stage_buffer);

        Geometry {
            name: mesh.name.clone(),
            vertex_count: mesh.vertices.len() as u32,
            index_offset: index_offset as u64,
            index_count: mesh.indices.len() as u32,
            transform: mesh.transform,
            material_index: mesh.material_index,
            buffer,
        }
    }

    pub fn upload_model(&mut self, data: &ModelData) -> Model {
        Model {
            geometries: data.meshes.iter().map(|mesh| self.upload_mesh(mesh)).collect(),
            materials: data.materials.clone(),
        }
    }

    pub fn load_gltf(&mut self, path: &Path) -> Result<Model, Error> {
        let data = read_gltf(path)?;
        let vertex_count: usize = data.meshes.iter().map(|mesh| mesh.vertices.len()).sum();
        log::info!(
            "Loaded {:?}: {} primitives, {} vertices",
            path,
            data.meshes.len(),
            vertex_count
        );
        Ok(self.upload_model(&data))
    }

    pub fn load_plane(&mut self, size: [f32; 2]) -> Model {
        let data = ModelData {
            meshes: vec![plane_mesh(size)],
            materials: vec![Material::default()],
        };
        self.upload_model(&data)
    }

    /// Uploads tightly packed RGBA8 pixels into a sampled texture.
    pub fn load_rgba(&mut self, name: &str, extent: gpu::Extent, buf: &[u8]) -> Texture {
        let stage_buffer = self.context.create_buffer(gpu::BufferDesc {
            name: "stage rgba",
            size: buf.len() as u64,
            memory: gpu::Memory::Upload,
        });

        let staging = unsafe { slice::from_raw_parts_mut(stage_buffer.data(), buf.len()) };
        staging.copy_from_slice(buf);

        let mut texture = Texture::default();
        texture.init_2d(
            self.context,
            name,
            gpu::TextureFormat::Rgba8UnormSrgb,
            extent,
            gpu::TextureUsage::COPY | gpu::TextureUsage::RESOURCE,
        );

        self.encoder.init_texture(texture.raw);
        if let mut pass = self.encoder.transfer("texture init") {
            pass.copy_buffer_to_texture(
                stage_buffer.into(),
                extent.width * mem::size_of::<[u8; 4]>() as u32,
                texture.raw.into(),
                extent,
            );
        }

        self.temp_buffers.push(stage_buffer);
        texture
    }

    pub fn load_png(&mut self, path: &Path) -> Result<Texture, Error> {
        let (extent, pixels) = read_png(path)?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("png");
        Ok(self.load_rgba(name, extent, &pixels))
    }
}

/// Decodes an 8-bit RGBA PNG.
pub fn read_png(path: &Path) -> Result<(gpu::Extent, Vec<u8>), Error> {
    let png_error = |source| Error::Png {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoder = png::Decoder::new(file);
    let mut reader = decoder.read_info().map_err(png_error)?;
    let mut vec = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(vec.as_mut_slice()).map_err(png_error)?;
    if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
        return Err(Error::PngFormat {
            path: path.to_path_buf(),
            color_type: info.color_type,
            bit_depth: info.bit_depth,
        });
    }
    vec.truncate(info.buffer_size());

    let extent = gpu::Extent {
        width: info.width,
        height: info.height,
        depth: 1,
    };
    Ok((extent, vec))
}
