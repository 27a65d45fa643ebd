//! Scene model: descriptors, the runtime object graph, and the
//! instantiation engine that turns one into the other

pub mod armature;
pub mod descriptor;
pub mod object;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod services;
pub mod transform;

pub use armature::Armature;
pub use descriptor::{
    AnimationBindings, NodeDescriptor, NodeType, ParticleBindings, SceneDescriptor,
};
pub use object::{MeshBinding, MeshPayload, ObjectGraph, ObjectPayload, RuntimeObject, Uid};
pub use scene::{Scene, SceneManager};
pub use services::{
    AnimationBinder, NoopAnimationBinder, NoopParticleBinder, NoopRenderPath, ParticleBinder,
    RenderPath, SceneServices,
};
pub use transform::TransformState;
