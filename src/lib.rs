#![allow(irrefutable_let_patterns)]

pub mod audio;
pub mod camera;
pub mod config;
pub mod input;
pub mod physics;
pub mod render;
pub mod route;
pub mod scene;
pub mod terrain;
pub mod world;

pub use camera::Camera;
pub use config::Config;
pub use physics::{Bus, Engine, Gear};
pub use render::Render;
pub use scene::{Canvas, Framebuffer};
pub use terrain::Heightmap;
pub use world::{Control, Report, World};
