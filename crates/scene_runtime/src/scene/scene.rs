//! Scene instantiation engine
//!
//! Materializes a [`SceneDescriptor`] into a live [`ObjectGraph`]: recursive
//! pre-order traversal with spawn filtering, per-type dispatch, asset
//! resolution through the [`DataResolver`] collaborator, transform
//! decomposition, and armature/animation/particle binding.
//!
//! All state lives on the [`Scene`] context value owned by the caller; there
//! are no module-level globals. Construction is single-threaded and runs to
//! completion before the graph is exposed to per-frame collaborators.

use crate::assets::{DataError, EmbeddedImage, WorldData};
use crate::error::SceneError;
use crate::scene::armature::Armature;
use crate::scene::descriptor::{NodeDescriptor, NodeType, SceneDescriptor};
use crate::scene::object::{MeshBinding, MeshPayload, ObjectGraph, ObjectPayload, RuntimeObject, Uid};
use crate::scene::services::{RenderPath, SceneServices};
use crate::scene::transform::TransformState;
use std::collections::HashMap;

fn resolution(reference: &str, source: DataError) -> SceneError {
    SceneError::DataResolutionFailed {
        reference: reference.to_string(),
        source,
    }
}

/// Count the nodes a full-scene build will instantiate
///
/// Applies the same spawn filter as the traversal: a `spawn: false` node and
/// its entire subtree are excluded.
fn count_nodes(nodes: &[NodeDescriptor]) -> usize {
    nodes
        .iter()
        .filter(|n| n.is_spawned())
        .map(|n| 1 + count_nodes(&n.children))
        .sum()
}

/// Split a data reference into its file and local parts
///
/// A two-part `"file/local_ref"` reference denotes a cross-file lookup; a
/// single part resolves against the current scene's own name.
fn split_data_ref<'a>(data_ref: &'a str, scene_name: &'a str) -> (&'a str, &'a str) {
    match data_ref.split_once('/') {
        Some((file, local)) => (file, local),
        None => (scene_name, data_ref),
    }
}

/// A live scene: the object graph plus everything needed to keep it alive
///
/// Created by [`Scene::create`] (full build) and torn down by
/// [`Scene::remove`]. Non-fatal conditions raised during the build (failed
/// node resolutions, unsupported node types) are recorded in
/// [`Scene::build_conditions`] rather than aborting the traversal.
pub struct Scene {
    name: String,
    raw: SceneDescriptor,
    /// The runtime object graph
    pub graph: ObjectGraph,
    root: Uid,
    world: Option<WorldData>,
    camera: Option<Uid>,
    meshes: Vec<Uid>,
    lights: Vec<Uid>,
    cameras: Vec<Uid>,
    speakers: Vec<Uid>,
    empties: Vec<Uid>,
    armatures: Vec<Armature>,
    embedded: HashMap<String, EmbeddedImage>,
    objects_count: usize,
    objects_traversed: usize,
    build_conditions: Vec<SceneError>,
    ready: bool,
}

impl Scene {
    /// Build a scene from its descriptor
    ///
    /// Resolves world data, loads embedded data, and instantiates every
    /// spawnable node. A missing camera is non-fatal: it is logged and the
    /// scene renders through the default path until one is set.
    pub fn create(
        raw: SceneDescriptor,
        services: &mut SceneServices<'_>,
    ) -> Result<Self, SceneError> {
        let name = raw.name.clone();
        let world_ref = raw.world_ref.clone();
        let camera_ref = raw.camera_ref.clone();

        let mut graph = ObjectGraph::new();
        let root = graph.create(ObjectPayload::Empty, None);
        if let Some(obj) = graph.get_mut(root) {
            obj.name = "Root".into();
        }

        let mut scene = Self {
            name: name.clone(),
            raw,
            graph,
            root,
            world: None,
            camera: None,
            meshes: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            speakers: Vec::new(),
            empties: Vec::new(),
            armatures: Vec::new(),
            embedded: HashMap::new(),
            objects_count: 0,
            objects_traversed: 0,
            build_conditions: Vec::new(),
            ready: false,
        };

        if let Some(world_ref) = world_ref {
            let world = services
                .resolver
                .world(&name, &world_ref)
                .map_err(|e| resolution(&world_ref, e))?;
            scene.world = Some(world);
        }

        scene.add_scene(&name, None, services)?;

        if scene.cameras.is_empty() {
            log::warn!("No camera found for scene '{}'", scene.name);
        }
        scene.camera = camera_ref
            .as_deref()
            .and_then(|r| scene.camera_object(r))
            .map(|o| o.uid);

        scene.ready = true;
        Ok(scene)
    }

    /// Instantiate a named scene under `parent`
    ///
    /// When no parent is given, a grouping empty named after the scene is
    /// created under the root. The startup scene uses this path too; nested
    /// and action scenes resolve their descriptors through the resolver.
    pub fn add_scene(
        &mut self,
        scene_name: &str,
        parent: Option<Uid>,
        services: &mut SceneServices<'_>,
    ) -> Result<Uid, SceneError> {
        let parent = match parent {
            Some(p) => p,
            None => {
                let uid = self.graph.create(ObjectPayload::Empty, Some(self.root));
                if let Some(obj) = self.graph.get_mut(uid) {
                    obj.name = scene_name.to_string();
                }
                self.empties.push(uid);
                uid
            }
        };

        let format = if scene_name == self.name {
            self.raw.clone()
        } else {
            services
                .resolver
                .scene_raw(scene_name)
                .map_err(|e| resolution(scene_name, e))?
        };

        // Additional scene assets
        self.load_embedded(&format.embedded_datas, services);

        self.objects_traversed = 0;
        self.objects_count = count_nodes(&format.objects);

        self.traverse_nodes(&format.name, parent, &format.objects, None, services);
        Ok(parent)
    }

    /// Instantiate a single named node (and optionally its subtree) from the
    /// loaded descriptor, under a caller-chosen parent
    ///
    /// Bypasses the spawn flag and the count bookkeeping of the full build,
    /// so nodes authored with `spawn: false` can be brought in on demand.
    pub fn spawn_object(
        &mut self,
        name: &str,
        parent: Option<Uid>,
        spawn_children: bool,
        services: &mut SceneServices<'_>,
    ) -> Result<Uid, SceneError> {
        let node = self
            .raw
            .find_node(name)
            .cloned()
            .ok_or_else(|| SceneError::NodeNotFound {
                name: name.to_string(),
            })?;
        let scene_name = self.name.clone();
        let parent = parent.unwrap_or(self.root);
        self.spawn_tree(&node, &scene_name, parent, None, spawn_children, services)
    }

    fn spawn_tree(
        &mut self,
        node: &NodeDescriptor,
        scene_name: &str,
        parent: Uid,
        parent_node: Option<&NodeDescriptor>,
        spawn_children: bool,
        services: &mut SceneServices<'_>,
    ) -> Result<Uid, SceneError> {
        let uid = self.create_node(node, scene_name, parent, parent_node, services)?;
        if spawn_children {
            for child in &node.children {
                self.spawn_tree(child, scene_name, uid, Some(node), spawn_children, services)?;
            }
        }
        Ok(uid)
    }

    /// Pre-order traversal: parent before children, spawn filter pruning
    /// whole subtrees
    fn traverse_nodes(
        &mut self,
        scene_name: &str,
        parent: Uid,
        nodes: &[NodeDescriptor],
        parent_node: Option<&NodeDescriptor>,
        services: &mut SceneServices<'_>,
    ) {
        for node in nodes {
            if !node.is_spawned() {
                continue;
            }
            match self.create_node(node, scene_name, parent, parent_node, services) {
                Ok(uid) => {
                    self.objects_traversed += 1;
                    log::debug!(
                        "Instantiated {}/{} objects for '{}'",
                        self.objects_traversed,
                        self.objects_count,
                        scene_name
                    );
                    self.traverse_nodes(scene_name, uid, &node.children, Some(node), services);
                }
                Err(SceneError::CapabilityDisabled { name, capability }) => {
                    log::debug!("Skipping '{name}': {capability} capability disabled");
                }
                Err(condition) => {
                    log::warn!("Skipping node and its subtree: {condition}");
                    self.build_conditions.push(condition);
                }
            }
        }
    }

    /// Dispatch on the node's type tag and create the runtime object
    fn create_node(
        &mut self,
        node: &NodeDescriptor,
        scene_name: &str,
        parent: Uid,
        parent_node: Option<&NodeDescriptor>,
        services: &mut SceneServices<'_>,
    ) -> Result<Uid, SceneError> {
        match node.node_type {
            NodeType::CameraObject => {
                let data = services
                    .resolver
                    .camera(scene_name, &node.data_ref)
                    .map_err(|e| resolution(&node.data_ref, e))?;
                let uid = self.graph.create(ObjectPayload::Camera(data), Some(parent));
                self.cameras.push(uid);
                self.finalize(uid, node, services);
                Ok(uid)
            }
            NodeType::LightObject => {
                let data = services
                    .resolver
                    .light(scene_name, &node.data_ref)
                    .map_err(|e| resolution(&node.data_ref, e))?;
                let uid = self.graph.create(ObjectPayload::Light(data), Some(parent));
                self.lights.push(uid);
                self.finalize(uid, node, services);
                Ok(uid)
            }
            NodeType::SpeakerObject => {
                if !services.capabilities.audio {
                    return Err(SceneError::CapabilityDisabled {
                        name: node.name.clone(),
                        capability: "audio",
                    });
                }
                let data = services
                    .resolver
                    .speaker(scene_name, &node.data_ref)
                    .map_err(|e| resolution(&node.data_ref, e))?;
                let uid = self.graph.create(ObjectPayload::Speaker(data), Some(parent));
                self.speakers.push(uid);
                self.finalize(uid, node, services);
                Ok(uid)
            }
            NodeType::MeshObject => self.create_mesh_node(node, scene_name, parent, parent_node, services),
            NodeType::Object => {
                let uid = self.graph.create(ObjectPayload::Empty, Some(parent));
                self.empties.push(uid);
                self.finalize(uid, node, services);
                Ok(uid)
            }
            NodeType::Unknown => Err(SceneError::UnsupportedNodeType {
                name: node.name.clone(),
            }),
        }
    }

    /// Create a mesh object: materials, cross-file mesh resolution, skinning
    fn create_mesh_node(
        &mut self,
        node: &NodeDescriptor,
        scene_name: &str,
        parent: Uid,
        parent_node: Option<&NodeDescriptor>,
        services: &mut SceneServices<'_>,
    ) -> Result<Uid, SceneError> {
        let mut materials = Vec::with_capacity(node.material_refs.len());
        for reference in &node.material_refs {
            let material = services
                .resolver
                .material(scene_name, reference)
                .map_err(|e| resolution(reference, e))?;
            materials.push(material);
        }

        let (file, local) = split_data_ref(&node.data_ref, scene_name);
        let mesh = services
            .resolver
            .mesh(file, local)
            .map_err(|e| resolution(&node.data_ref, e))?;

        // Bone objects are stored on the armature owned by the parent node
        let binding = match (
            mesh.skin.is_some(),
            parent_node.and_then(NodeDescriptor::bone_actions),
        ) {
            (true, Some(refs)) if services.capabilities.skin => {
                MeshBinding::Armature(self.bind_armature(parent, refs, services)?)
            }
            (true, _) => MeshBinding::DefaultAction,
            (false, _) => MeshBinding::None,
        };

        let uid = self.graph.create(
            ObjectPayload::Mesh(MeshPayload {
                data: mesh,
                materials,
                binding,
            }),
            Some(parent),
        );
        self.meshes.push(uid);

        // Attach particle systems
        if services.capabilities.particles {
            if let Some(particles) = &node.particles {
                if let Some(binder) = services.particles.as_deref_mut() {
                    for reference in &particles.refs {
                        binder.attach(uid, scene_name, reference);
                    }
                }
            }
        }

        self.finalize(uid, node, services);
        Ok(uid)
    }

    /// Find or lazily create the armature owned by `owner`
    ///
    /// If another armature already uses the owner's display name, the owner
    /// is renamed to `name.<uid>` before the new armature is registered, so
    /// armature names stay unique while uids remain the real key.
    fn bind_armature(
        &mut self,
        owner: Uid,
        action_refs: &[String],
        services: &mut SceneServices<'_>,
    ) -> Result<Uid, SceneError> {
        let mut bone_actions = Vec::with_capacity(action_refs.len());
        for reference in action_refs {
            let action = services
                .resolver
                .scene_raw(reference)
                .map_err(|e| resolution(reference, e))?;
            bone_actions.push(action);
        }

        if self.armatures.iter().any(|a| a.uid == owner) {
            return Ok(owner);
        }

        let mut owner_name = match self.graph.get(owner) {
            Some(obj) => obj.name.clone(),
            None => String::new(),
        };
        if self.armatures.iter().any(|a| a.name == owner_name) {
            owner_name = format!("{owner_name}.{owner}");
            if let Some(obj) = self.graph.get_mut(owner) {
                obj.name = owner_name.clone();
            }
        }

        let armature = Armature::new(owner, owner_name, bone_actions);
        services.animation.bind_armature(&armature);
        self.armatures.push(armature);
        Ok(owner)
    }

    /// Post-step applied to every successfully created object: name,
    /// visibility, transform decomposition, and action binding
    fn finalize(&mut self, uid: Uid, node: &NodeDescriptor, services: &mut SceneServices<'_>) {
        let mut actions: Vec<Option<SceneDescriptor>> = Vec::new();
        if let Some(refs) = node.anim.as_ref().and_then(|a| a.object_actions.as_ref()) {
            actions.resize(refs.len(), None);
            for (slot, reference) in refs.iter().enumerate() {
                if reference == "null" {
                    // No startup action set for this slot
                    continue;
                }
                match services.resolver.scene_raw(reference) {
                    Ok(action) => actions[slot] = Some(action),
                    Err(e) => {
                        let condition = resolution(reference, e);
                        log::warn!("Leaving action slot {slot} empty: {condition}");
                        self.build_conditions.push(condition);
                    }
                }
            }
        }

        if let Some(obj) = self.graph.get_mut(uid) {
            obj.name = node.name.clone();
            obj.visible = node.is_visible();
            obj.transform = TransformState::from_descriptor_matrix(node.transform.as_ref());
            obj.raw = Some(node.clone());
            obj.actions = actions.clone();
        }
        // Descendants must observe a consistent world matrix as soon as they
        // are attached
        self.graph.update_world_transform(uid);

        services.animation.bind_object(uid, &actions);
    }

    fn load_embedded(&mut self, files: &[String], services: &mut SceneServices<'_>) {
        for file in files {
            if let Err(condition) = self.embed_data(file, services) {
                log::warn!("Failed to load embedded data '{file}': {condition}");
                self.build_conditions.push(condition);
            }
        }
    }

    fn embed_data(&mut self, file: &str, services: &mut SceneServices<'_>) -> Result<(), SceneError> {
        let image = if file.ends_with(".raw") {
            let bytes = services.resolver.blob(file).map_err(|e| resolution(file, e))?;
            // Raw 3D texture bytes: infer a near-cubic edge from the length
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let dim = (bytes.len() as f64).powf(1.0 / 3.0).floor() as u32 + 1;
            EmbeddedImage::Volume { data: bytes, dim }
        } else {
            let data = services.resolver.image(file).map_err(|e| resolution(file, e))?;
            EmbeddedImage::Flat(data)
        };
        self.embedded.insert(file.to_string(), image);
        Ok(())
    }

    /// Tear down every registered object and the root
    ///
    /// Must complete before another scene is built; [`SceneManager`]
    /// enforces the ordering.
    pub fn remove(&mut self) {
        for uid in self.meshes.drain(..) {
            self.graph.remove(uid);
        }
        for uid in self.lights.drain(..) {
            self.graph.remove(uid);
        }
        for uid in self.cameras.drain(..) {
            self.graph.remove(uid);
        }
        for uid in self.speakers.drain(..) {
            self.graph.remove(uid);
        }
        for uid in self.empties.drain(..) {
            self.graph.remove(uid);
        }
        self.graph.remove(self.root);
        self.armatures.clear();
        self.embedded.clear();
        self.camera = None;
        self.ready = false;
    }

    /// Per-frame update: re-propagate world transforms of parented empties
    ///
    /// Strictly sequential, once per frame. Animation curve evaluation
    /// belongs to the animation collaborator and happens before this.
    pub fn update_frame(&mut self) {
        if !self.ready {
            return;
        }
        let empties = self.empties.clone();
        for uid in empties {
            let has_parent = self.graph.get(uid).and_then(|o| o.parent).is_some();
            if has_parent {
                self.graph.update_world_transform(uid);
            }
        }
    }

    /// Per-frame render dispatch
    ///
    /// Camera-driven when an active camera exists; otherwise the default
    /// render path. Never an error.
    pub fn render_frame(&self, path: &mut dyn RenderPath) {
        if !self.ready {
            return;
        }
        match self.camera {
            Some(camera) => path.render_camera(self, camera),
            None => path.render_default(self),
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The loaded descriptor this scene was built from
    pub fn raw(&self) -> &SceneDescriptor {
        &self.raw
    }

    /// Root object uid
    pub fn root(&self) -> Uid {
        self.root
    }

    /// Resolved world data, when the descriptor referenced any
    pub fn world(&self) -> Option<&WorldData> {
        self.world.as_ref()
    }

    /// The active camera object, when one resolved at activation
    pub fn camera(&self) -> Option<Uid> {
        self.camera
    }

    /// Registered mesh objects in creation order
    pub fn meshes(&self) -> &[Uid] {
        &self.meshes
    }

    /// Registered light objects in creation order
    pub fn lights(&self) -> &[Uid] {
        &self.lights
    }

    /// Registered camera objects in creation order
    pub fn cameras(&self) -> &[Uid] {
        &self.cameras
    }

    /// Registered speaker objects in creation order
    pub fn speakers(&self) -> &[Uid] {
        &self.speakers
    }

    /// Registered empty objects in creation order
    pub fn empties(&self) -> &[Uid] {
        &self.empties
    }

    /// Armatures created for this scene
    pub fn armatures(&self) -> &[Armature] {
        &self.armatures
    }

    /// Embedded image registered under a file path
    pub fn embedded(&self, file: &str) -> Option<&EmbeddedImage> {
        self.embedded.get(file)
    }

    /// Non-fatal conditions recorded during the build
    pub fn build_conditions(&self) -> &[SceneError] {
        &self.build_conditions
    }

    /// Total number of nodes the full build will instantiate
    pub fn objects_count(&self) -> usize {
        self.objects_count
    }

    /// Number of nodes instantiated so far (progress reporting)
    pub fn objects_traversed(&self) -> usize {
        self.objects_traversed
    }

    fn lookup<'a>(&'a self, collection: &[Uid], name: &str) -> Option<&'a RuntimeObject> {
        collection
            .iter()
            .filter_map(|uid| self.graph.get(*uid))
            .find(|obj| obj.name == name)
    }

    /// Look up a mesh object by name
    pub fn mesh(&self, name: &str) -> Option<&RuntimeObject> {
        self.lookup(&self.meshes, name)
    }

    /// Look up a light object by name
    pub fn light(&self, name: &str) -> Option<&RuntimeObject> {
        self.lookup(&self.lights, name)
    }

    /// Look up a camera object by name
    pub fn camera_object(&self, name: &str) -> Option<&RuntimeObject> {
        self.lookup(&self.cameras, name)
    }

    /// Look up a speaker object by name
    pub fn speaker(&self, name: &str) -> Option<&RuntimeObject> {
        self.lookup(&self.speakers, name)
    }

    /// Look up an empty object by name
    pub fn empty(&self, name: &str) -> Option<&RuntimeObject> {
        self.lookup(&self.empties, name)
    }

    /// Look up a named object anywhere in the descendant tree of the root
    pub fn child(&self, name: &str) -> Option<&RuntimeObject> {
        self.graph.find_descendant(self.root, name)
    }
}

/// Owns the active scene and enforces teardown-before-build on switches
#[derive(Default)]
pub struct SceneManager {
    active: Option<Scene>,
    voxels_invalidated: bool,
}

impl SceneManager {
    /// Create a manager with no active scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a scene by name, tearing down any existing one first
    pub fn set_active(
        &mut self,
        scene_name: &str,
        services: &mut SceneServices<'_>,
    ) -> Result<(), SceneError> {
        if let Some(mut scene) = self.active.take() {
            scene.remove();
        }
        if services.capabilities.voxels {
            // Voxel data is stale once the scene changes; the render
            // collaborator picks this up and revoxelizes
            self.voxels_invalidated = true;
        }

        let raw = services
            .resolver
            .scene_raw(scene_name)
            .map_err(|e| resolution(scene_name, e))?;
        let scene = Scene::create(raw, services)?;
        self.active = Some(scene);
        Ok(())
    }

    /// The active scene, if any
    pub fn active(&self) -> Option<&Scene> {
        self.active.as_ref()
    }

    /// Mutable access to the active scene
    pub fn active_mut(&mut self) -> Option<&mut Scene> {
        self.active.as_mut()
    }

    /// Tear down the active scene
    pub fn remove_active(&mut self) {
        if let Some(mut scene) = self.active.take() {
            scene.remove();
        }
    }

    /// Consume the voxel invalidation flag raised by a scene switch
    pub fn take_voxels_invalidated(&mut self) -> bool {
        std::mem::take(&mut self.voxels_invalidated)
    }

    /// Per-frame update of the active scene
    pub fn update_frame(&mut self) {
        if let Some(scene) = self.active.as_mut() {
            scene.update_frame();
        }
    }

    /// Per-frame render dispatch of the active scene
    pub fn render_frame(&self, path: &mut dyn RenderPath) {
        if let Some(scene) = self.active.as_ref() {
            scene.render_frame(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{
        AssetStore, CameraData, ImageData, MaterialData, MeshData, SkinData, SpeakerData,
    };
    use crate::config::Capabilities;
    use crate::scene::descriptor::{AnimationBindings, ParticleBindings};
    use crate::scene::services::{AnimationBinder, NoopRenderPath, ParticleBinder};

    #[derive(Default)]
    struct RecordingBinder {
        objects: Vec<(Uid, usize, usize)>,
        armatures: Vec<String>,
    }

    impl AnimationBinder for RecordingBinder {
        fn bind_object(&mut self, object: Uid, actions: &[Option<SceneDescriptor>]) {
            let filled = actions.iter().filter(|a| a.is_some()).count();
            self.objects.push((object, actions.len(), filled));
        }

        fn bind_armature(&mut self, armature: &Armature) {
            self.armatures.push(armature.name.clone());
        }
    }

    #[derive(Default)]
    struct RecordingParticles {
        attached: Vec<(Uid, String, String)>,
    }

    impl ParticleBinder for RecordingParticles {
        fn attach(&mut self, object: Uid, scene: &str, reference: &str) {
            self.attached
                .push((object, scene.to_string(), reference.to_string()));
        }
    }

    fn node(name: &str, node_type: NodeType) -> NodeDescriptor {
        NodeDescriptor {
            name: name.into(),
            node_type,
            data_ref: String::new(),
            material_refs: vec![],
            children: vec![],
            spawn: None,
            visible: None,
            transform: None,
            anim: None,
            particles: None,
        }
    }

    fn descriptor(name: &str, objects: Vec<NodeDescriptor>) -> SceneDescriptor {
        SceneDescriptor {
            name: name.into(),
            objects,
            world_ref: None,
            camera_ref: None,
            embedded_datas: vec![],
        }
    }

    fn mesh_data(name: &str, skinned: bool) -> MeshData {
        MeshData {
            name: name.into(),
            positions: vec![[0.0, 0.0, 0.0]],
            indices: vec![],
            skin: skinned.then(|| SkinData {
                joints: vec!["root".into()],
            }),
        }
    }

    fn camera_data(name: &str) -> CameraData {
        CameraData {
            name: name.into(),
            fov_y: 0.85,
            near: 0.1,
            far: 100.0,
        }
    }

    fn mesh_binding(scene: &Scene, name: &str) -> MeshBinding {
        match &scene.mesh(name).expect("mesh object").payload {
            ObjectPayload::Mesh(m) => m.binding,
            other => panic!("expected mesh payload, got {other:?}"),
        }
    }

    #[test]
    fn camera_scene_resolves_world_and_activates_camera() {
        let mut cam = node("Cam", NodeType::CameraObject);
        cam.data_ref = "CamData".into();
        let mut raw = descriptor("Main", vec![cam]);
        raw.world_ref = Some("World".into());
        raw.camera_ref = Some("Cam".into());

        let mut store = AssetStore::new();
        store.add_camera("Main", camera_data("CamData")).add_world(
            "Main",
            WorldData {
                name: "World".into(),
                background_color: [0.1, 0.1, 0.1, 1.0],
                strength: 1.0,
            },
        );
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert!(scene.world().is_some());
        assert_eq!(scene.cameras().len(), 1);
        assert_eq!(
            scene.camera(),
            scene.camera_object("Cam").map(|o| o.uid)
        );
        assert!(scene.build_conditions().is_empty());
        assert_eq!(scene.objects_count(), 1);
        assert_eq!(scene.objects_traversed(), 1);

        let mut path = NoopRenderPath::default();
        scene.render_frame(&mut path);
        assert_eq!(path.camera_frames, 1);
    }

    #[test]
    fn missing_camera_falls_back_to_default_render_path() {
        let mut raw = descriptor("Main", vec![node("E", NodeType::Object)]);
        raw.camera_ref = Some("Gone".into());
        let store = AssetStore::new();
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert!(scene.camera().is_none());

        let mut path = NoopRenderPath::default();
        scene.render_frame(&mut path);
        assert_eq!(path.default_frames, 1);
    }

    #[test]
    fn spawn_false_excludes_node_and_subtree() {
        let mut hidden = node("A", NodeType::Object);
        hidden.spawn = Some(false);
        hidden.children = vec![node("B", NodeType::Object)];
        let raw = descriptor("Main", vec![hidden, node("C", NodeType::Object)]);

        let store = AssetStore::new();
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert_eq!(scene.objects_count(), 1);
        assert!(scene.child("A").is_none());
        assert!(scene.child("B").is_none());
        assert!(scene.child("C").is_some());
        // root + grouping empty + C
        assert_eq!(scene.graph.len(), 3);
    }

    #[test]
    fn mesh_node_resolves_cross_file_and_local_references() {
        let mut body = node("Body", NodeType::MeshObject);
        body.data_ref = "library/Cube".into();
        body.material_refs = vec!["Red".into()];
        let mut prop = node("Prop", NodeType::MeshObject);
        prop.data_ref = "Local".into();
        let raw = descriptor("Main", vec![body, prop]);

        let mut store = AssetStore::new();
        store
            .add_mesh("library", mesh_data("Cube", false))
            .add_mesh("Main", mesh_data("Local", false))
            .add_material(
                "Main",
                MaterialData {
                    name: "Red".into(),
                    base_color: [1.0, 0.0, 0.0, 1.0],
                    metallic: 0.0,
                    roughness: 0.5,
                },
            );
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert_eq!(scene.meshes().len(), 2);
        match &scene.mesh("Body").expect("body").payload {
            ObjectPayload::Mesh(m) => {
                assert_eq!(m.data.name, "Cube");
                assert_eq!(m.materials.len(), 1);
                assert_eq!(m.binding, MeshBinding::None);
            }
            other => panic!("expected mesh payload, got {other:?}"),
        }
        assert!(scene.mesh("Prop").is_some());
    }

    #[test]
    fn failed_resolution_skips_only_that_subtree() {
        let mut broken = node("Broken", NodeType::MeshObject);
        broken.data_ref = "missing".into();
        broken.children = vec![node("Inside", NodeType::Object)];
        let raw = descriptor("Main", vec![broken, node("Ok", NodeType::Object)]);

        let store = AssetStore::new();
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert!(scene.mesh("Broken").is_none());
        assert!(scene.child("Inside").is_none());
        assert!(scene.empty("Ok").is_some());
        assert!(matches!(
            scene.build_conditions(),
            [SceneError::DataResolutionFailed { reference, .. }] if reference == "missing"
        ));
    }

    #[test]
    fn unsupported_node_type_is_recorded() {
        let raw = descriptor("Main", vec![node("Weird", NodeType::Unknown)]);
        let store = AssetStore::new();
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert!(matches!(
            scene.build_conditions(),
            [SceneError::UnsupportedNodeType { name }] if name == "Weird"
        ));
    }

    #[test]
    fn skinned_siblings_share_one_armature() {
        let mut rig = node("Rig", NodeType::Object);
        rig.anim = Some(AnimationBindings {
            object_actions: None,
            bone_actions: Some(vec!["RigAction".into()]),
        });
        let mut left = node("L", NodeType::MeshObject);
        left.data_ref = "LMesh".into();
        let mut right = node("R", NodeType::MeshObject);
        right.data_ref = "RMesh".into();
        rig.children = vec![left, right];
        let mut solo = node("Solo", NodeType::MeshObject);
        solo.data_ref = "SoloMesh".into();
        let raw = descriptor("Main", vec![rig, solo]);

        let mut store = AssetStore::new();
        store
            .add_scene(descriptor("RigAction", vec![]))
            .add_mesh("Main", mesh_data("LMesh", true))
            .add_mesh("Main", mesh_data("RMesh", true))
            .add_mesh("Main", mesh_data("SoloMesh", true));
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert_eq!(scene.armatures().len(), 1);
        assert_eq!(binder.armatures, vec!["Rig".to_string()]);

        let rig_uid = scene.empty("Rig").expect("rig").uid;
        assert_eq!(scene.armatures()[0].uid, rig_uid);
        assert_eq!(scene.armatures()[0].bone_actions.len(), 1);
        assert_eq!(mesh_binding(&scene, "L"), MeshBinding::Armature(rig_uid));
        assert_eq!(mesh_binding(&scene, "R"), MeshBinding::Armature(rig_uid));
        // Skinned but no armature-owning parent
        assert_eq!(mesh_binding(&scene, "Solo"), MeshBinding::DefaultAction);
    }

    #[test]
    fn armature_name_collision_renames_owner() {
        let make_rig = |mesh_ref: &str| {
            let mut rig = node("Rig", NodeType::Object);
            rig.anim = Some(AnimationBindings {
                object_actions: None,
                bone_actions: Some(vec!["RigAction".into()]),
            });
            let mut mesh = node(mesh_ref, NodeType::MeshObject);
            mesh.data_ref = mesh_ref.to_string();
            rig.children = vec![mesh];
            rig
        };
        let raw = descriptor("Main", vec![make_rig("M1"), make_rig("M2")]);

        let mut store = AssetStore::new();
        store
            .add_scene(descriptor("RigAction", vec![]))
            .add_mesh("Main", mesh_data("M1", true))
            .add_mesh("Main", mesh_data("M2", true));
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert_eq!(scene.armatures().len(), 2);
        assert_eq!(scene.armatures()[0].name, "Rig");

        let second = &scene.armatures()[1];
        assert_eq!(second.name, format!("Rig.{}", second.uid));
        assert_eq!(
            scene.graph.get(second.uid).map(|o| o.name.as_str()),
            Some(second.name.as_str())
        );
    }

    #[test]
    fn skin_capability_disabled_falls_back_to_default_action() {
        let mut rig = node("Rig", NodeType::Object);
        rig.anim = Some(AnimationBindings {
            object_actions: None,
            bone_actions: Some(vec!["RigAction".into()]),
        });
        let mut mesh = node("M", NodeType::MeshObject);
        mesh.data_ref = "M".into();
        rig.children = vec![mesh];
        let raw = descriptor("Main", vec![rig]);

        let mut store = AssetStore::new();
        store
            .add_scene(descriptor("RigAction", vec![]))
            .add_mesh("Main", mesh_data("M", true));
        let mut binder = RecordingBinder::default();
        let mut services =
            SceneServices::new(&store, &mut binder).with_capabilities(Capabilities {
                skin: false,
                ..Capabilities::default()
            });

        let scene = Scene::create(raw, &mut services).expect("build");
        assert!(scene.armatures().is_empty());
        assert_eq!(mesh_binding(&scene, "M"), MeshBinding::DefaultAction);
    }

    #[test]
    fn null_action_slots_stay_empty() {
        let mut e = node("E", NodeType::Object);
        e.anim = Some(AnimationBindings {
            object_actions: Some(vec!["Walk".into(), "null".into()]),
            bone_actions: None,
        });
        let raw = descriptor("Main", vec![e]);

        let mut store = AssetStore::new();
        store.add_scene(descriptor("Walk", vec![]));
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        let obj = scene.empty("E").expect("empty");
        assert_eq!(obj.actions.len(), 2);
        assert_eq!(obj.actions[0].as_ref().map(|a| a.name.as_str()), Some("Walk"));
        assert!(obj.actions[1].is_none());
        assert!(binder.objects.contains(&(obj.uid, 2, 1)));
    }

    #[test]
    fn action_resolution_failure_leaves_slot_empty() {
        let mut e = node("E", NodeType::Object);
        e.anim = Some(AnimationBindings {
            object_actions: Some(vec!["Missing".into()]),
            bone_actions: None,
        });
        let raw = descriptor("Main", vec![e]);

        let store = AssetStore::new();
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        let obj = scene.empty("E").expect("empty");
        assert_eq!(obj.actions, vec![None]);
        assert_eq!(scene.build_conditions().len(), 1);
    }

    #[test]
    fn particles_attach_to_mesh_objects() {
        let mut mesh = node("M", NodeType::MeshObject);
        mesh.data_ref = "M".into();
        mesh.particles = Some(ParticleBindings {
            refs: vec!["Sparks".into()],
        });
        let raw = descriptor("Main", vec![mesh]);

        let mut store = AssetStore::new();
        store.add_mesh("Main", mesh_data("M", false));
        let mut binder = RecordingBinder::default();
        let mut particles = RecordingParticles::default();
        let mut services =
            SceneServices::new(&store, &mut binder).with_particles(&mut particles);

        let scene = Scene::create(raw.clone(), &mut services).expect("build");
        let uid = scene.mesh("M").expect("mesh").uid;
        assert_eq!(
            particles.attached,
            vec![(uid, "Main".to_string(), "Sparks".to_string())]
        );

        // Disabled capability skips attachment entirely
        let mut binder = RecordingBinder::default();
        let mut particles = RecordingParticles::default();
        let mut services = SceneServices::new(&store, &mut binder)
            .with_particles(&mut particles)
            .with_capabilities(Capabilities {
                particles: false,
                ..Capabilities::default()
            });
        Scene::create(raw, &mut services).expect("build");
        assert!(particles.attached.is_empty());
    }

    #[test]
    fn speaker_nodes_are_gated_by_the_audio_capability() {
        let mut speaker = node("S", NodeType::SpeakerObject);
        speaker.data_ref = "Chime".into();
        let raw = descriptor("Main", vec![speaker]);

        let mut store = AssetStore::new();
        store.add_speaker(
            "Main",
            SpeakerData {
                name: "Chime".into(),
                sound_ref: "chime.ogg".into(),
                volume: 1.0,
            },
        );

        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);
        let scene = Scene::create(raw.clone(), &mut services).expect("build");
        assert_eq!(scene.speakers().len(), 1);

        let mut binder = RecordingBinder::default();
        let mut services =
            SceneServices::new(&store, &mut binder).with_capabilities(Capabilities {
                audio: false,
                ..Capabilities::default()
            });
        let scene = Scene::create(raw, &mut services).expect("build");
        assert!(scene.speakers().is_empty());
        // A disabled capability is an expected configuration, not a condition
        assert!(scene.build_conditions().is_empty());
    }

    #[test]
    fn embedded_raw_data_infers_cube_dimension() {
        let mut raw = descriptor("Main", vec![]);
        raw.embedded_datas = vec!["noise.raw".into(), "tex.png".into(), "gone.raw".into()];

        let mut store = AssetStore::new();
        store
            .add_blob("noise.raw", vec![0u8; 100])
            .add_image("tex.png", ImageData::solid_color(2, 2, [255, 0, 0, 255]));
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        assert!(matches!(
            scene.embedded("noise.raw"),
            Some(EmbeddedImage::Volume { dim: 5, .. })
        ));
        assert!(matches!(
            scene.embedded("tex.png"),
            Some(EmbeddedImage::Flat(_))
        ));
        assert!(scene.embedded("gone.raw").is_none());
        assert_eq!(scene.build_conditions().len(), 1);
    }

    #[test]
    fn spawn_object_instantiates_on_demand() {
        let mut hidden = node("Hidden", NodeType::Object);
        hidden.spawn = Some(false);
        hidden.children = vec![node("HiddenChild", NodeType::Object)];
        let raw = descriptor("Main", vec![hidden]);

        let store = AssetStore::new();
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let mut scene = Scene::create(raw, &mut services).expect("build");
        assert!(scene.child("Hidden").is_none());

        let uid = scene
            .spawn_object("Hidden", None, true, &mut services)
            .expect("spawn");
        assert_eq!(scene.graph.get(uid).map(|o| o.name.as_str()), Some("Hidden"));
        assert!(scene.graph.find_descendant(uid, "HiddenChild").is_some());

        // Children only come along when asked for
        let solo = scene
            .spawn_object("Hidden", None, false, &mut services)
            .expect("spawn");
        assert!(scene.graph.find_descendant(solo, "HiddenChild").is_none());

        assert!(matches!(
            scene.spawn_object("Nope", None, true, &mut services),
            Err(SceneError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn transforms_decompose_and_compose_through_the_hierarchy() {
        let mut parent = node("P", NodeType::Object);
        parent.transform = Some([
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0,
        ]);
        let mut child = node("C", NodeType::Object);
        child.transform = Some([
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 1.0,
        ]);
        child.visible = Some(false);
        parent.children = vec![child];
        let raw = descriptor("Main", vec![parent]);

        let store = AssetStore::new();
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let scene = Scene::create(raw, &mut services).expect("build");
        let child = scene.child("C").expect("child");
        assert!(!child.visible);
        assert!((child.transform.world.m14 - 1.0).abs() < 1e-6);
        assert!((child.transform.world.m24 - 2.0).abs() < 1e-6);
    }

    #[test]
    fn update_frame_repropagates_moved_empties() {
        let mut parent = node("P", NodeType::Object);
        parent.children = vec![node("C", NodeType::Object)];
        let raw = descriptor("Main", vec![parent]);

        let store = AssetStore::new();
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let mut scene = Scene::create(raw, &mut services).expect("build");
        let p_uid = scene.empty("P").expect("parent").uid;
        if let Some(obj) = scene.graph.get_mut(p_uid) {
            obj.transform.translation = crate::foundation::math::Vec3::new(5.0, 0.0, 0.0);
        }
        scene.update_frame();

        let child = scene.child("C").expect("child");
        assert!((child.transform.world.m14 - 5.0).abs() < 1e-6);
    }

    #[test]
    fn remove_tears_down_every_object() {
        let mut rig = node("Rig", NodeType::Object);
        rig.anim = Some(AnimationBindings {
            object_actions: None,
            bone_actions: Some(vec!["RigAction".into()]),
        });
        let mut mesh = node("M", NodeType::MeshObject);
        mesh.data_ref = "M".into();
        rig.children = vec![mesh];
        let raw = descriptor("Main", vec![rig]);

        let mut store = AssetStore::new();
        store
            .add_scene(descriptor("RigAction", vec![]))
            .add_mesh("Main", mesh_data("M", true));
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let mut scene = Scene::create(raw, &mut services).expect("build");
        assert!(!scene.graph.is_empty());

        scene.remove();
        assert!(scene.graph.is_empty());
        assert!(scene.armatures().is_empty());
        assert!(scene.camera().is_none());

        // A torn-down scene no longer renders
        let mut path = NoopRenderPath::default();
        scene.render_frame(&mut path);
        assert_eq!(path.camera_frames + path.default_frames, 0);
    }

    #[test]
    fn manager_switches_scenes_with_teardown() {
        let mut store = AssetStore::new();
        store
            .add_scene(descriptor("A", vec![node("OnlyInA", NodeType::Object)]))
            .add_scene(descriptor("B", vec![node("OnlyInB", NodeType::Object)]));
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let mut manager = SceneManager::new();
        assert!(manager.active().is_none());

        manager.set_active("A", &mut services).expect("activate A");
        assert_eq!(manager.active().map(Scene::name), Some("A"));

        manager.set_active("B", &mut services).expect("activate B");
        let scene = manager.active().expect("active");
        assert_eq!(scene.name(), "B");
        assert!(scene.child("OnlyInA").is_none());
        assert!(scene.child("OnlyInB").is_some());

        assert!(matches!(
            manager.set_active("C", &mut services),
            Err(SceneError::DataResolutionFailed { .. })
        ));
    }

    #[test]
    fn voxel_capability_flags_invalidation_on_switch() {
        let mut store = AssetStore::new();
        store.add_scene(descriptor("A", vec![]));
        let mut binder = RecordingBinder::default();
        let mut services =
            SceneServices::new(&store, &mut binder).with_capabilities(Capabilities {
                voxels: true,
                ..Capabilities::default()
            });

        let mut manager = SceneManager::new();
        manager.set_active("A", &mut services).expect("activate");
        assert!(manager.take_voxels_invalidated());
        assert!(!manager.take_voxels_invalidated());
    }

    #[test]
    fn uids_stay_monotonic_across_scene_switches() {
        let mut store = AssetStore::new();
        store
            .add_scene(descriptor("A", vec![node("X", NodeType::Object)]))
            .add_scene(descriptor("B", vec![node("Y", NodeType::Object)]));
        let mut binder = RecordingBinder::default();
        let mut services = SceneServices::new(&store, &mut binder);

        let mut manager = SceneManager::new();
        manager.set_active("A", &mut services).expect("activate A");
        let first = manager
            .active()
            .and_then(|s| s.child("X"))
            .map(|o| o.uid)
            .expect("X");

        manager.set_active("B", &mut services).expect("activate B");
        let second = manager
            .active()
            .and_then(|s| s.child("Y"))
            .map(|o| o.uid)
            .expect("Y");
        assert!(second > first);
    }
}
