//! Scene-level state for the water demo: procedural meshes, the orbit camera
//! and the message reducer that drives them.

mod error;

pub mod camera;
pub mod mesh;
pub mod state;

pub use error::SceneError;
pub use camera::{Limits, OrbitCamera};
pub use mesh::{Mesh, MeshLibrary, MAX_GRID_SEGMENTS};
pub use state::{
    ApplicationState, Message, Mouse, PropertyValue, SharedState, StateSnapshot, Water,
    WaterUpdate,
};
