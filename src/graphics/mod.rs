pub mod engine;
pub mod vertex;

pub use engine::GraphicsEngine;
pub use vertex::{Vertex, VertexBuffer};
