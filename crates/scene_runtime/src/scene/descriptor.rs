//! Static scene descriptors
//!
//! Immutable, externally authored descriptions of a scene: a named tree of
//! typed nodes plus references into externally stored asset data. Descriptors
//! are loaded once per scene activation and are read-only afterwards; the
//! instantiation engine walks them to materialize the runtime object graph.
//!
//! The shape round-trips through any serde format without loss; RON is used
//! by the tests and the demo application.

use serde::{Deserialize, Serialize};

/// Top-level scene descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    /// Scene name; local data references resolve against it
    pub name: String,

    /// Root node descriptors
    #[serde(default)]
    pub objects: Vec<NodeDescriptor>,

    /// Reference to the scene's world (environment) data
    #[serde(default)]
    pub world_ref: Option<String>,

    /// Name of the node that should become the active camera
    #[serde(default)]
    pub camera_ref: Option<String>,

    /// Paths of embedded-data files to load before traversal
    #[serde(default)]
    pub embedded_datas: Vec<String>,
}

impl SceneDescriptor {
    /// Depth-first search for a node by name anywhere in the tree
    pub fn find_node(&self, name: &str) -> Option<&NodeDescriptor> {
        find_in(&self.objects, name)
    }
}

fn find_in<'a>(nodes: &'a [NodeDescriptor], name: &str) -> Option<&'a NodeDescriptor> {
    for node in nodes {
        if node.name == name {
            return Some(node);
        }
        if let Some(found) = find_in(&node.children, name) {
            return Some(found);
        }
    }
    None
}

/// Closed set of node type tags
///
/// Descriptors authored with a tag outside this set deserialize to
/// [`NodeType::Unknown`] so the engine can report the condition instead of
/// losing the node silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Plain empty object with no payload
    Object,
    /// Mesh-bearing object
    MeshObject,
    /// Light source
    LightObject,
    /// Camera
    CameraObject,
    /// Audio speaker (gated by the `audio` capability)
    SpeakerObject,
    /// Catch-all for unrecognized tags
    #[serde(other)]
    Unknown,
}

/// Tree node in the static scene descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Node name, copied onto the runtime object
    pub name: String,

    /// Type tag controlling dispatch during instantiation
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Asset data reference; `"file/local_ref"` denotes a cross-file lookup
    #[serde(default)]
    pub data_ref: String,

    /// Material references, each looked up independently
    #[serde(default)]
    pub material_refs: Vec<String>,

    /// Nested child nodes
    #[serde(default)]
    pub children: Vec<NodeDescriptor>,

    /// When `false`, the node and its entire subtree are excluded from both
    /// counting and instantiation. Absent means `true`.
    #[serde(default)]
    pub spawn: Option<bool>,

    /// Initial visibility flag. Absent means visible.
    #[serde(default)]
    pub visible: Option<bool>,

    /// World matrix as 16 column-major elements; absent means identity
    #[serde(default)]
    pub transform: Option<[f32; 16]>,

    /// Animation bindings for this node
    #[serde(default)]
    pub anim: Option<AnimationBindings>,

    /// Particle-system bindings for this node
    #[serde(default)]
    pub particles: Option<ParticleBindings>,
}

impl NodeDescriptor {
    /// Whether this node (and its subtree) should be instantiated at all
    pub fn is_spawned(&self) -> bool {
        self.spawn.unwrap_or(true)
    }

    /// Initial visibility of the runtime object
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    /// Bone-action references carried by this node, if any
    pub fn bone_actions(&self) -> Option<&[String]> {
        self.anim
            .as_ref()
            .and_then(|a| a.bone_actions.as_deref())
    }
}

/// Animation action references for a node
///
/// `object_actions` is positional: the literal token `"null"` means "no
/// action in this slot" and the slot stays empty after resolution.
/// `bone_actions` only appears on armature-owning nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationBindings {
    /// Ordered object-action references
    #[serde(default)]
    pub object_actions: Option<Vec<String>>,

    /// Bone-action references for the armature owned by this node
    #[serde(default)]
    pub bone_actions: Option<Vec<String>>,
}

/// Particle-system references for a mesh node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleBindings {
    /// Particle-system references, attached in order
    #[serde(default)]
    pub refs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scene() -> SceneDescriptor {
        SceneDescriptor {
            name: "Scene".into(),
            objects: vec![NodeDescriptor {
                name: "Rig".into(),
                node_type: NodeType::Object,
                data_ref: String::new(),
                material_refs: vec![],
                children: vec![NodeDescriptor {
                    name: "Body".into(),
                    node_type: NodeType::MeshObject,
                    data_ref: "library/BodyMesh".into(),
                    material_refs: vec!["Skin".into(), "Cloth".into()],
                    children: vec![],
                    spawn: Some(false),
                    visible: Some(false),
                    transform: Some([
                        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 2.0, 3.0,
                        4.0, 1.0,
                    ]),
                    anim: Some(AnimationBindings {
                        object_actions: Some(vec!["Walk".into(), "null".into()]),
                        bone_actions: None,
                    }),
                    particles: Some(ParticleBindings {
                        refs: vec!["Sparks".into()],
                    }),
                }],
                spawn: None,
                visible: None,
                transform: None,
                anim: Some(AnimationBindings {
                    object_actions: None,
                    bone_actions: Some(vec!["RigAction".into()]),
                }),
                particles: None,
            }],
            world_ref: Some("World".into()),
            camera_ref: Some("Cam".into()),
            embedded_datas: vec!["noise.raw".into()],
        }
    }

    #[test]
    fn ron_round_trip_preserves_all_fields() {
        let scene = sample_scene();
        let text = ron::to_string(&scene).expect("serialize");
        let back: SceneDescriptor = ron::from_str(&text).expect("deserialize");
        assert_eq!(scene, back);
    }

    #[test]
    fn unknown_type_tag_survives_deserialization() {
        let text = r#"(name: "S", objects: [(name: "X", type: voxel_object)])"#;
        let scene: SceneDescriptor = ron::from_str(text).expect("deserialize");
        assert_eq!(scene.objects[0].node_type, NodeType::Unknown);
    }

    #[test]
    fn spawn_and_visible_default_to_true() {
        let node = &sample_scene().objects[0];
        assert!(node.is_spawned());
        assert!(node.is_visible());
        assert!(!node.children[0].is_spawned());
        assert!(!node.children[0].is_visible());
    }

    #[test]
    fn find_node_searches_depth_first() {
        let scene = sample_scene();
        assert_eq!(scene.find_node("Body").map(|n| n.name.as_str()), Some("Body"));
        assert!(scene.find_node("Missing").is_none());
    }
}
