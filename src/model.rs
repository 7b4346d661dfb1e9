use blade_graphics as gpu;

/// One uploaded primitive: vertices first, then `u32` indices, in one buffer.
#[derive(Default)]
pub struct Geometry {
    pub name: String,
    pub vertex_count: u32,
    pub index_offset: u64,
    pub index_count: u32,
    pub transform: nalgebra::Matrix4<f32>,
    pub material_index: usize,
    pub buffer: gpu::Buffer,
}

impl Geometry {
    pub(super) fn world_transform(&self, base: &nalgebra::Matrix4<f32>) -> [[f32; 4]; 4] {
        (base * self.transform).into()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub base_color_factor: [f32; 4],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0; 4],
        }
    }
}

#[derive(Default)]
pub struct Model {
    pub geometries: Vec<Geometry>,
    pub materials: Vec<Material>,
}

impl Model {
    pub fn free(&mut self, context: &gpu::Context) {
        for geometry in self.geometries.drain(..) {
            context.destroy_buffer(geometry.buffer);
        }
        self.materials.clear();
    }
}

pub struct ModelInstance {
    pub model: Model,
    pub pos: nalgebra::Vector3<f32>,
    pub rot: nalgebra::UnitQuaternion<f32>,
    pub scale: f32,
    pub color: [f32; 4],
}

impl ModelInstance {
    pub fn new(model: Model, scale: f32, color: [f32; 4]) -> Self {
        Self {
            model,
            pos: nalgebra::Vector3::zeros(),
            rot: nalgebra::UnitQuaternion::identity(),
            scale,
            color,
        }
    }

    pub fn transform(&self) -> nalgebra::Matrix4<f32> {
        nalgebra::Similarity3::from_parts(
            nalgebra::Translation3::from(self.pos),
            self.rot,
            self.scale,
        )
        .to_homogeneous()
    }

    /// Instance tint multiplied by the geometry's material color.
    pub fn color_of(&self, geometry: &Geometry) -> [f32; 4] {
        let base = self
            .model
            .materials
            .get(geometry.material_index)
            .map_or([1.0; 4], |material| material.base_color_factor);
        [
            base[0] * self.color[0],
            base[1] * self.color[1],
            base[2] * self.color[2],
            base[3] * self.color[3],
        ]
    }
}
