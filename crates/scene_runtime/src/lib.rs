//! # Scene Runtime
//!
//! A scene instantiation engine for real-time 3D applications.
//!
//! ## Features
//!
//! - **Descriptor-Driven Scenes**: Externally authored scene trees
//!   materialized into a live object graph
//! - **Asset Resolution**: Cross-file data references resolved through a
//!   pluggable resolver boundary
//! - **Skeletal Binding**: Lazy, deduplicated armature creation for skinned
//!   meshes
//! - **Capability Gating**: Audio, skinning, particles, and voxel handling
//!   toggled at runtime, not compile time
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_runtime::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = AssetStore::new();
//!     store.add_scene_ron(r#"(name: "Main", objects: [(name: "E", type: object)])"#)?;
//!
//!     let mut animation = NoopAnimationBinder;
//!     let mut services = SceneServices::new(&store, &mut animation);
//!
//!     let mut manager = SceneManager::new();
//!     manager.set_active("Main", &mut services)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod assets;
pub mod config;
pub mod error;
pub mod foundation;
pub mod scene;

pub use error::SceneError;

/// Commonly used types, one import away
pub mod prelude {
    pub use crate::assets::{AssetStore, DataError, DataResolver};
    pub use crate::config::{Capabilities, Config};
    pub use crate::error::SceneError;
    pub use crate::foundation::math::{Mat4, Vec3};
    pub use crate::foundation::quat::Quat;
    pub use crate::scene::{
        NodeDescriptor, NodeType, NoopAnimationBinder, NoopParticleBinder, NoopRenderPath,
        ObjectGraph, RuntimeObject, Scene, SceneDescriptor, SceneManager, SceneServices, Uid,
    };
}
