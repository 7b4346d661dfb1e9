use blade_graphics as gpu;

#[derive(Default)]
pub struct Texture {
    pub raw: gpu::Texture,
    pub view: gpu::TextureView,
    pub extent: gpu::Extent,
}

impl Texture {
    pub fn init_2d(
        &mut self,
        context: &gpu::Context,
        name: &str,
        format: gpu::TextureFormat,
        size: gpu::Extent,
        usage: gpu::TextureUsage,
    ) {
        self.deinit(context);
        self.raw = context.create_texture(gpu::TextureDesc {
            name,
            format,
            size,
            sample_count: 1,
            array_layer_count: 1,
            mip_level_count: 1,
            dimension: gpu::TextureDimension::D2,
            usage,
            external: None,
        });
        self.view = context.create_texture_view(
            self.raw,
            gpu::TextureViewDesc {
                name,
                format,
                dimension: gpu::ViewDimension::D2,
                subresources: &Default::default(),
            },
        );
        self.extent = size;
    }

    pub fn new_depth(context: &gpu::Context, size: gpu::Extent) -> Self {
        let mut texture = Self::default();
        texture.init_2d(
            context,
            "depth",
            gpu::TextureFormat::Depth32Float,
            size,
            gpu::TextureUsage::TARGET,
        );
        texture
    }

    pub fn is_initialized(&self) -> bool {
        self.raw != Default::default()
    }

    pub fn deinit(&mut self, context: &gpu::Context) {
        if self.is_initialized() {
            context.destroy_texture_view(self.view);
            context.destroy_texture(self.raw);
            *self = Self::default();
        }
    }
}
