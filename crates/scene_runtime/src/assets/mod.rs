//! Asset data model and the Data Resolver boundary
//!
//! The instantiation engine never loads bytes itself; it asks a
//! [`DataResolver`] for resolved asset data by reference. The wire format of
//! that data is out of scope here; the types below carry just enough to
//! drive instantiation (skin presence, material lists, camera parameters).

pub mod store;

pub use store::AssetStore;

use crate::scene::descriptor::SceneDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Data resolution errors
#[derive(Debug, Error)]
pub enum DataError {
    /// No asset registered under the requested reference
    #[error("{kind} not found: {reference}")]
    NotFound {
        /// Asset kind ("mesh", "material", ...)
        kind: &'static str,
        /// The reference that failed to resolve
        reference: String,
    },

    /// Underlying IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed asset data
    #[error("parse error: {0}")]
    Parse(String),

    /// Image decoding failure
    #[error("image decode error: {0}")]
    Decode(String),
}

/// Resolved world (environment) data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldData {
    /// World name
    pub name: String,
    /// Background color, linear RGBA
    pub background_color: [f32; 4],
    /// Environment light strength
    pub strength: f32,
}

/// Skin (skeletal binding) attached to a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinData {
    /// Names of the joints this mesh is bound to
    pub joints: Vec<String>,
}

/// Resolved mesh data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Mesh name
    pub name: String,
    /// Vertex positions
    #[serde(default)]
    pub positions: Vec<[f32; 3]>,
    /// Triangle indices
    #[serde(default)]
    pub indices: Vec<u32>,
    /// Skeletal binding, present on skinned meshes
    #[serde(default)]
    pub skin: Option<SkinData>,
}

/// Resolved material data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialData {
    /// Material name
    pub name: String,
    /// Base color, linear RGBA
    pub base_color: [f32; 4],
    /// Metallic factor
    #[serde(default)]
    pub metallic: f32,
    /// Roughness factor
    #[serde(default)]
    pub roughness: f32,
}

/// Resolved camera data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    /// Camera name
    pub name: String,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

/// Resolved light data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightData {
    /// Light name
    pub name: String,
    /// Light color, linear RGB
    pub color: [f32; 3],
    /// Emission strength
    pub strength: f32,
}

/// Resolved speaker data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerData {
    /// Speaker name
    pub name: String,
    /// Reference to the sound asset played by this speaker
    pub sound_ref: String,
    /// Playback volume
    pub volume: f32,
}

/// Decoded 2D image data
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (typically 4 for RGBA)
    pub channels: u8,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path_ref = path.as_ref();
        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref).map_err(|e| DataError::Decode(e.to_string()))?;
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Decode an image from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DataError> {
        let img = image::load_from_memory(bytes).map_err(|e| DataError::Decode(e.to_string()))?;
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Create a solid color image (useful for testing and defaults)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }
        Self {
            data,
            width,
            height,
            channels: 4,
        }
    }
}

/// An embedded-data entry registered on a scene
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddedImage {
    /// Standard 2D image
    Flat(ImageData),
    /// Raw 3D volumetric texture with a near-cubic inferred dimension
    Volume {
        /// Single-channel voxel bytes
        data: Vec<u8>,
        /// Edge length of the inferred cube
        dim: u32,
    },
}

/// External asset resolution
///
/// Implementations must be idempotent for repeated identical lookups within
/// one scene build. Scene descriptors double as action descriptors: both
/// object actions and bone actions resolve through [`DataResolver::scene_raw`].
pub trait DataResolver {
    /// Resolve world data for a scene
    fn world(&self, scene: &str, reference: &str) -> Result<WorldData, DataError>;

    /// Resolve a full scene descriptor by name (scenes and actions)
    fn scene_raw(&self, name: &str) -> Result<SceneDescriptor, DataError>;

    /// Resolve mesh data from a file (or scene-local namespace)
    fn mesh(&self, file: &str, reference: &str) -> Result<MeshData, DataError>;

    /// Resolve material data
    fn material(&self, scene: &str, reference: &str) -> Result<MaterialData, DataError>;

    /// Resolve camera data
    fn camera(&self, scene: &str, reference: &str) -> Result<CameraData, DataError>;

    /// Resolve light data
    fn light(&self, scene: &str, reference: &str) -> Result<LightData, DataError>;

    /// Resolve speaker data
    fn speaker(&self, scene: &str, reference: &str) -> Result<SpeakerData, DataError>;

    /// Resolve a raw byte blob by file path
    fn blob(&self, file: &str) -> Result<Vec<u8>, DataError>;

    /// Resolve a decoded 2D image by file path
    fn image(&self, file: &str) -> Result<ImageData, DataError>;
}
