use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse config {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("unable to load glTF {path:?}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("unable to decode embedded buffer in {path:?}")]
    Base64 {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },
    #[error("unable to decode PNG {path:?}")]
    Png {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },
    #[error("PNG {path:?} is {color_type:?}/{bit_depth:?}, expected 8-bit RGBA")]
    PngFormat {
        path: PathBuf,
        color_type: png::ColorType,
        bit_depth: png::BitDepth,
    },
    #[error("mesh {path:?}: {reason}")]
    Mesh { path: PathBuf, reason: String },
    #[error("GPU initialization failed: {0}")]
    Gpu(String),
    #[error("window creation failed")]
    Window(#[from] winit::error::OsError),
    #[error("event loop failed")]
    EventLoop(#[from] winit::error::EventLoopError),
}
