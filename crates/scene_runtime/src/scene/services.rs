//! Collaborator seams of the instantiation engine
//!
//! The engine builds the object graph and hands the results to external
//! collaborators through these traits: animation playback, particle
//! simulation, and rendering all live behind them. No-op implementations are
//! provided for tests and headless tools.

use crate::assets::DataResolver;
use crate::config::Capabilities;
use crate::scene::armature::Armature;
use crate::scene::descriptor::SceneDescriptor;
use crate::scene::object::Uid;
use crate::scene::Scene;

/// Attaches animation playback state to objects and armatures
pub trait AnimationBinder {
    /// Bind a runtime object to its resolved object actions
    ///
    /// `actions` is positionally aligned with the descriptor's action slots;
    /// `None` entries are slots the descriptor left empty with the literal
    /// `"null"` token. An empty slice means the node carried no bindings.
    fn bind_object(&mut self, object: Uid, actions: &[Option<SceneDescriptor>]);

    /// Accept an armature's bone-action list for later per-bone binding
    fn bind_armature(&mut self, armature: &Armature);
}

/// Attaches particle systems to mesh objects
pub trait ParticleBinder {
    /// Attach the particle system `reference` (resolved against `scene`) to
    /// a mesh object
    fn attach(&mut self, object: Uid, scene: &str, reference: &str);
}

/// Per-frame rendering entry points
pub trait RenderPath {
    /// Render the scene through its active camera
    fn render_camera(&mut self, scene: &Scene, camera: Uid);

    /// Default render path used when the scene has no active camera
    fn render_default(&mut self, scene: &Scene);
}

/// The collaborator bundle handed to every engine operation
pub struct SceneServices<'a> {
    /// Asset data resolution
    pub resolver: &'a dyn DataResolver,
    /// Animation binding collaborator
    pub animation: &'a mut dyn AnimationBinder,
    /// Particle binding collaborator, when the title has one
    pub particles: Option<&'a mut dyn ParticleBinder>,
    /// Capability toggles gating the optional code paths
    pub capabilities: Capabilities,
}

impl<'a> SceneServices<'a> {
    /// Bundle a resolver with an animation binder and default capabilities
    pub fn new(resolver: &'a dyn DataResolver, animation: &'a mut dyn AnimationBinder) -> Self {
        Self {
            resolver,
            animation,
            particles: None,
            capabilities: Capabilities::default(),
        }
    }

    /// Attach a particle binder
    pub fn with_particles(mut self, particles: &'a mut dyn ParticleBinder) -> Self {
        self.particles = Some(particles);
        self
    }

    /// Override the capability configuration
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Animation binder that discards every binding
#[derive(Debug, Default)]
pub struct NoopAnimationBinder;

impl AnimationBinder for NoopAnimationBinder {
    fn bind_object(&mut self, _object: Uid, _actions: &[Option<SceneDescriptor>]) {}

    fn bind_armature(&mut self, _armature: &Armature) {}
}

/// Particle binder that discards every attachment
#[derive(Debug, Default)]
pub struct NoopParticleBinder;

impl ParticleBinder for NoopParticleBinder {
    fn attach(&mut self, _object: Uid, _scene: &str, _reference: &str) {}
}

/// Render path that does nothing; records which entry point was taken
#[derive(Debug, Default)]
pub struct NoopRenderPath {
    /// Number of camera-driven frames requested
    pub camera_frames: usize,
    /// Number of default-path frames requested
    pub default_frames: usize,
}

impl RenderPath for NoopRenderPath {
    fn render_camera(&mut self, _scene: &Scene, _camera: Uid) {
        self.camera_frames += 1;
    }

    fn render_default(&mut self, _scene: &Scene) {
        self.default_frames += 1;
    }
}
