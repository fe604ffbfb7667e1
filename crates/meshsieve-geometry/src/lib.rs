//! Meshsieve geometry: model, loading, validation, conversion.
//!
//! The flow through this crate mirrors the pipeline: [`loader`] turns GLB
//! bytes into an immutable [`GeometryModel`], [`validator`] runs the fixed
//! check battery over it, and [`emitter`] remaps a passing model into
//! Wavefront OBJ. [`bvh`] carries the spatial index and triangle
//! intersection math that make the self-intersection check sub-quadratic.

pub mod bvh;
pub mod emitter;
pub mod loader;
pub mod math;
pub mod model;
pub mod validator;

pub use emitter::ConvertedMesh;
pub use loader::{load_glb, load_glb_file};
pub use model::{ChannelBindings, ChannelRef, GeometryModel, ImageResource, MaterialSlot};
pub use validator::validate;
