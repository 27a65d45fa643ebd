//! In-memory asset store
//!
//! A [`DataResolver`] backed by registration maps. The demo application and
//! the engine tests use it in place of a packed asset file; anything that can
//! resolve references may stand in for it in a real title.

use crate::assets::{
    CameraData, DataError, DataResolver, ImageData, LightData, MaterialData, MeshData,
    SpeakerData, WorldData,
};
use crate::scene::descriptor::SceneDescriptor;
use std::collections::HashMap;

/// In-memory [`DataResolver`] implementation
///
/// Cross-file data is keyed `"{file}/{reference}"`; scene-local data uses the
/// scene name as its file part, matching how the engine splits references.
#[derive(Debug, Default)]
pub struct AssetStore {
    scenes: HashMap<String, SceneDescriptor>,
    worlds: HashMap<String, WorldData>,
    meshes: HashMap<String, MeshData>,
    materials: HashMap<String, MaterialData>,
    cameras: HashMap<String, CameraData>,
    lights: HashMap<String, LightData>,
    speakers: HashMap<String, SpeakerData>,
    blobs: HashMap<String, Vec<u8>>,
    images: HashMap<String, ImageData>,
}

fn key(file: &str, reference: &str) -> String {
    format!("{file}/{reference}")
}

impl AssetStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene descriptor under its own name
    pub fn add_scene(&mut self, scene: SceneDescriptor) -> &mut Self {
        self.scenes.insert(scene.name.clone(), scene);
        self
    }

    /// Register a scene descriptor parsed from RON text
    pub fn add_scene_ron(&mut self, text: &str) -> Result<&mut Self, DataError> {
        let scene: SceneDescriptor =
            ron::from_str(text).map_err(|e| DataError::Parse(e.to_string()))?;
        Ok(self.add_scene(scene))
    }

    /// Register world data for a scene
    pub fn add_world(&mut self, scene: &str, world: WorldData) -> &mut Self {
        let k = key(scene, &world.name);
        self.worlds.insert(k, world);
        self
    }

    /// Register mesh data under a file (or scene) namespace
    pub fn add_mesh(&mut self, file: &str, mesh: MeshData) -> &mut Self {
        let k = key(file, &mesh.name);
        self.meshes.insert(k, mesh);
        self
    }

    /// Register material data for a scene
    pub fn add_material(&mut self, scene: &str, material: MaterialData) -> &mut Self {
        let k = key(scene, &material.name);
        self.materials.insert(k, material);
        self
    }

    /// Register camera data for a scene
    pub fn add_camera(&mut self, scene: &str, camera: CameraData) -> &mut Self {
        let k = key(scene, &camera.name);
        self.cameras.insert(k, camera);
        self
    }

    /// Register light data for a scene
    pub fn add_light(&mut self, scene: &str, light: LightData) -> &mut Self {
        let k = key(scene, &light.name);
        self.lights.insert(k, light);
        self
    }

    /// Register speaker data for a scene
    pub fn add_speaker(&mut self, scene: &str, speaker: SpeakerData) -> &mut Self {
        let k = key(scene, &speaker.name);
        self.speakers.insert(k, speaker);
        self
    }

    /// Register a raw byte blob under a file path
    pub fn add_blob(&mut self, file: &str, bytes: Vec<u8>) -> &mut Self {
        self.blobs.insert(file.to_string(), bytes);
        self
    }

    /// Register a decoded 2D image under a file path
    pub fn add_image(&mut self, file: &str, image: ImageData) -> &mut Self {
        self.images.insert(file.to_string(), image);
        self
    }

    /// Load and register an image file from disk
    pub fn add_image_file(&mut self, file: &str) -> Result<&mut Self, DataError> {
        let image = ImageData::from_file(file)?;
        Ok(self.add_image(file, image))
    }
}

impl DataResolver for AssetStore {
    fn world(&self, scene: &str, reference: &str) -> Result<WorldData, DataError> {
        self.worlds
            .get(&key(scene, reference))
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "world",
                reference: key(scene, reference),
            })
    }

    fn scene_raw(&self, name: &str) -> Result<SceneDescriptor, DataError> {
        self.scenes
            .get(name)
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "scene",
                reference: name.to_string(),
            })
    }

    fn mesh(&self, file: &str, reference: &str) -> Result<MeshData, DataError> {
        self.meshes
            .get(&key(file, reference))
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "mesh",
                reference: key(file, reference),
            })
    }

    fn material(&self, scene: &str, reference: &str) -> Result<MaterialData, DataError> {
        self.materials
            .get(&key(scene, reference))
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "material",
                reference: key(scene, reference),
            })
    }

    fn camera(&self, scene: &str, reference: &str) -> Result<CameraData, DataError> {
        self.cameras
            .get(&key(scene, reference))
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "camera",
                reference: key(scene, reference),
            })
    }

    fn light(&self, scene: &str, reference: &str) -> Result<LightData, DataError> {
        self.lights
            .get(&key(scene, reference))
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "light",
                reference: key(scene, reference),
            })
    }

    fn speaker(&self, scene: &str, reference: &str) -> Result<SpeakerData, DataError> {
        self.speakers
            .get(&key(scene, reference))
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "speaker",
                reference: key(scene, reference),
            })
    }

    fn blob(&self, file: &str) -> Result<Vec<u8>, DataError> {
        self.blobs
            .get(file)
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "blob",
                reference: file.to_string(),
            })
    }

    fn image(&self, file: &str) -> Result<ImageData, DataError> {
        self.images
            .get(file)
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                kind: "image",
                reference: file.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_assets_resolve() {
        let mut store = AssetStore::new();
        store.add_mesh(
            "library",
            MeshData {
                name: "Cube".into(),
                positions: vec![],
                indices: vec![],
                skin: None,
            },
        );

        assert!(store.mesh("library", "Cube").is_ok());
        assert!(matches!(
            store.mesh("library", "Sphere"),
            Err(DataError::NotFound { kind: "mesh", .. })
        ));
    }

    #[test]
    fn scene_ron_registration() {
        let mut store = AssetStore::new();
        store
            .add_scene_ron(r#"(name: "S", objects: [])"#)
            .expect("parse");
        assert_eq!(store.scene_raw("S").expect("resolve").name, "S");
    }
}
