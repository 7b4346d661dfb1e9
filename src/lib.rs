#![allow(irrefutable_let_patterns)]

pub mod camera;
pub mod config;
pub mod error;
pub mod euler;
pub mod input;
pub mod loader;
pub mod model;
pub mod physics;
pub mod render;
pub mod scene;
pub mod text;
pub mod texture;
pub mod timing;

pub use camera::Camera;
pub use error::Error;
pub use euler::EulerAngles;
pub use loader::Loader;
pub use model::{Model, ModelInstance};
pub use physics::Physics;
pub use render::Render;
pub use scene::{Scene, Snapshot};
