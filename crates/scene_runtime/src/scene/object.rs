//! Runtime object graph
//!
//! Live tree of typed objects materialized from descriptors. Objects are
//! stored in a uid-keyed arena; the parent link is an id, never a reference,
//! so a child cannot extend its parent's lifetime. Child lists are owned and
//! insertion-ordered.
//!
//! Uids are process-scoped and monotonic: the allocator is never reset
//! between scenes and a uid is never reused, so armatures and cross-scene
//! bookkeeping can key off them safely.

use crate::assets::{CameraData, LightData, MaterialData, MeshData, SpeakerData};
use crate::scene::descriptor::{NodeDescriptor, SceneDescriptor};
use crate::scene::transform::TransformState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Process-scoped object identifier
pub type Uid = u32;

static NEXT_UID: AtomicU32 = AtomicU32::new(0);

/// Allocate the next uid
///
/// Monotonic for the lifetime of the process; deliberately not reset between
/// scenes.
pub fn next_uid() -> Uid {
    NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

/// How a skinned mesh is bound to animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshBinding {
    /// Unskinned mesh, nothing to bind
    None,
    /// Skinned mesh without an armature owner; receives the default action
    DefaultAction,
    /// Skinned mesh driven by the armature owned by the given object uid
    Armature(Uid),
}

/// Mesh payload: resolved data, materials, and the animation binding
#[derive(Debug, Clone)]
pub struct MeshPayload {
    /// Resolved mesh data
    pub data: MeshData,
    /// Resolved materials, in descriptor order (empty when the descriptor
    /// listed none)
    pub materials: Vec<MaterialData>,
    /// Skeletal animation binding
    pub binding: MeshBinding,
}

/// Type-specific payload of a runtime object
#[derive(Debug, Clone)]
pub enum ObjectPayload {
    /// Plain empty, no resolved data
    Empty,
    /// Mesh object
    Mesh(MeshPayload),
    /// Light object
    Light(LightData),
    /// Camera object
    Camera(CameraData),
    /// Speaker object
    Speaker(SpeakerData),
}

/// A live object materialized from a node descriptor
#[derive(Debug, Clone)]
pub struct RuntimeObject {
    /// Process-scoped identifier, assigned at creation and never reused
    pub uid: Uid,
    /// Display name, copied from the descriptor (may be suffixed on armature
    /// name collisions)
    pub name: String,
    /// Type-specific payload
    pub payload: ObjectPayload,
    /// Owning parent; `None` only for the scene root
    pub parent: Option<Uid>,
    /// Owned children in insertion order
    pub children: Vec<Uid>,
    /// World matrix plus decomposed local transform
    pub transform: TransformState,
    /// Visibility flag
    pub visible: bool,
    /// Originating node descriptor; `None` for the root and grouping objects
    pub raw: Option<NodeDescriptor>,
    /// Resolved object actions, positionally aligned with the descriptor's
    /// action slots (`None` = empty slot)
    pub actions: Vec<Option<SceneDescriptor>>,
}

/// Uid-keyed arena holding a scene's runtime objects
#[derive(Debug, Default)]
pub struct ObjectGraph {
    objects: HashMap<Uid, RuntimeObject>,
}

impl ObjectGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects, including the root
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the graph holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Create a new object under `parent` (no parent = a root)
    pub fn create(&mut self, payload: ObjectPayload, parent: Option<Uid>) -> Uid {
        let uid = next_uid();
        let object = RuntimeObject {
            uid,
            name: String::new(),
            payload,
            parent,
            children: Vec::new(),
            transform: TransformState::default(),
            visible: true,
            raw: None,
            actions: Vec::new(),
        };
        self.objects.insert(uid, object);
        if let Some(p) = parent {
            if let Some(parent_obj) = self.objects.get_mut(&p) {
                parent_obj.children.push(uid);
            }
        }
        uid
    }

    /// Look up an object by uid
    pub fn get(&self, uid: Uid) -> Option<&RuntimeObject> {
        self.objects.get(&uid)
    }

    /// Mutable lookup by uid
    pub fn get_mut(&mut self, uid: Uid) -> Option<&mut RuntimeObject> {
        self.objects.get_mut(&uid)
    }

    /// Move `child` under a new parent (detaching it from the old one)
    pub fn set_parent(&mut self, child: Uid, new_parent: Option<Uid>) {
        let old_parent = match self.objects.get(&child) {
            Some(obj) => obj.parent,
            None => return,
        };
        if let Some(op) = old_parent {
            if let Some(parent_obj) = self.objects.get_mut(&op) {
                parent_obj.children.retain(|c| *c != child);
            }
        }
        if let Some(np) = new_parent {
            if let Some(parent_obj) = self.objects.get_mut(&np) {
                parent_obj.children.push(child);
            }
        }
        if let Some(obj) = self.objects.get_mut(&child) {
            obj.parent = new_parent;
        }
    }

    /// Remove an object, detaching it from its parent's child list
    ///
    /// Not recursive: callers remove children first. Any children left behind
    /// keep their (now dangling) parent id and are unreachable from the root.
    pub fn remove(&mut self, uid: Uid) -> Option<RuntimeObject> {
        let object = self.objects.remove(&uid)?;
        if let Some(p) = object.parent {
            if let Some(parent_obj) = self.objects.get_mut(&p) {
                parent_obj.children.retain(|c| *c != uid);
            }
        }
        Some(object)
    }

    /// Recompute the world matrix of `uid` from its parent, then propagate
    /// the update through all descendants
    pub fn update_world_transform(&mut self, uid: Uid) {
        let parent_world = self
            .objects
            .get(&uid)
            .and_then(|o| o.parent)
            .and_then(|p| self.objects.get(&p))
            .map(|p| p.transform.world);

        let children = match self.objects.get_mut(&uid) {
            Some(obj) => {
                let local = obj.transform.local_matrix();
                obj.transform.world = match parent_world {
                    Some(pw) => pw * local,
                    None => local,
                };
                obj.children.clone()
            }
            None => return,
        };

        for child in children {
            self.update_world_transform(child);
        }
    }

    /// Pre-order search for a named object in the descendant tree of `root`
    pub fn find_descendant(&self, root: Uid, name: &str) -> Option<&RuntimeObject> {
        let root_obj = self.objects.get(&root)?;
        for child in &root_obj.children {
            let Some(obj) = self.objects.get(child) else {
                continue;
            };
            if obj.name == name {
                return Some(obj);
            }
            if let Some(found) = self.find_descendant(*child, name) {
                return Some(found);
            }
        }
        None
    }

    /// Iterate all live objects in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &RuntimeObject> {
        self.objects.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_are_monotonic_and_unique() {
        let mut graph = ObjectGraph::new();
        let a = graph.create(ObjectPayload::Empty, None);
        let b = graph.create(ObjectPayload::Empty, Some(a));
        let c = graph.create(ObjectPayload::Empty, Some(a));
        assert!(b > a);
        assert!(c > b);
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut graph = ObjectGraph::new();
        let root = graph.create(ObjectPayload::Empty, None);
        let first = graph.create(ObjectPayload::Empty, Some(root));
        let second = graph.create(ObjectPayload::Empty, Some(root));
        assert_eq!(graph.get(root).unwrap().children, vec![first, second]);
    }

    #[test]
    fn reparent_moves_child_between_lists() {
        let mut graph = ObjectGraph::new();
        let root = graph.create(ObjectPayload::Empty, None);
        let a = graph.create(ObjectPayload::Empty, Some(root));
        let b = graph.create(ObjectPayload::Empty, Some(root));

        graph.set_parent(b, Some(a));
        assert_eq!(graph.get(root).unwrap().children, vec![a]);
        assert_eq!(graph.get(a).unwrap().children, vec![b]);
        assert_eq!(graph.get(b).unwrap().parent, Some(a));
    }

    #[test]
    fn remove_detaches_from_parent() {
        let mut graph = ObjectGraph::new();
        let root = graph.create(ObjectPayload::Empty, None);
        let a = graph.create(ObjectPayload::Empty, Some(root));

        assert!(graph.remove(a).is_some());
        assert!(graph.get(root).unwrap().children.is_empty());
        assert!(graph.get(a).is_none());
    }

    #[test]
    fn find_descendant_searches_whole_subtree() {
        let mut graph = ObjectGraph::new();
        let root = graph.create(ObjectPayload::Empty, None);
        let mid = graph.create(ObjectPayload::Empty, Some(root));
        let leaf = graph.create(ObjectPayload::Empty, Some(mid));
        graph.get_mut(leaf).unwrap().name = "Leaf".into();

        assert_eq!(graph.find_descendant(root, "Leaf").map(|o| o.uid), Some(leaf));
        assert!(graph.find_descendant(root, "Nope").is_none());
    }

    #[test]
    fn world_transform_propagates_to_descendants() {
        use crate::foundation::math::Vec3;

        let mut graph = ObjectGraph::new();
        let root = graph.create(ObjectPayload::Empty, None);
        let child = graph.create(ObjectPayload::Empty, Some(root));

        graph.get_mut(root).unwrap().transform.translation = Vec3::new(1.0, 0.0, 0.0);
        graph.get_mut(child).unwrap().transform.translation = Vec3::new(0.0, 2.0, 0.0);
        graph.update_world_transform(root);

        let world = graph.get(child).unwrap().transform.world;
        assert!((world.m14 - 1.0).abs() < 1e-6);
        assert!((world.m24 - 2.0).abs() < 1e-6);
    }
}
