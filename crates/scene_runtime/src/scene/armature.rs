//! Skeletal armature instances
//!
//! An armature is the shared rig bound to every bone-bearing mesh under one
//! owning object. Creation is lazy: the first skinned mesh that needs bone
//! sub-objects triggers it, and subsequent siblings reuse it by owner uid.
//! Armatures live exactly as long as their owner and are torn down with the
//! scene; they are never removed independently.

use crate::scene::descriptor::SceneDescriptor;
use crate::scene::object::Uid;

/// Shared skeletal rig owned by a single runtime object
#[derive(Debug, Clone)]
pub struct Armature {
    /// Uid of the owning runtime object; at most one armature per uid per
    /// scene
    pub uid: Uid,
    /// Display name; suffixed with the owner uid when it would collide with
    /// an existing armature's name
    pub name: String,
    /// Resolved bone-action descriptors, in descriptor order
    pub bone_actions: Vec<SceneDescriptor>,
}

impl Armature {
    /// Create an armature for the given owner
    pub fn new(uid: Uid, name: impl Into<String>, bone_actions: Vec<SceneDescriptor>) -> Self {
        Self {
            uid,
            name: name.into(),
            bone_actions,
        }
    }
}
