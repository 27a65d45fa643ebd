//! Scene runtime demo application
//!
//! Builds an in-memory asset store, activates a small authored scene, and
//! walks the resulting object graph, printing what got instantiated.

use scene_runtime::assets::{AssetStore, CameraData, LightData, MaterialData, MeshData, WorldData};
use scene_runtime::foundation::logging;
use scene_runtime::scene::{
    NoopAnimationBinder, NoopRenderPath, ObjectPayload, Scene, SceneManager, SceneServices, Uid,
};

const MAIN_SCENE: &str = r#"(
    name: "Main",
    world_ref: Some("Sky"),
    camera_ref: Some("Cam"),
    objects: [
        (name: "Cam", type: camera_object, data_ref: "CamData"),
        (name: "Sun", type: light_object, data_ref: "SunData"),
        (
            name: "Props",
            type: object,
            children: [
                (
                    name: "Crate",
                    type: mesh_object,
                    data_ref: "library/CrateMesh",
                    material_refs: ["Wood"],
                    transform: Some((
                        1.0, 0.0, 0.0, 0.0,
                        0.0, 1.0, 0.0, 0.0,
                        0.0, 0.0, 1.0, 0.0,
                        2.0, 0.0, -3.0, 1.0,
                    )),
                ),
            ],
        ),
        (name: "Debris", type: mesh_object, data_ref: "library/CrateMesh", spawn: Some(false)),
    ],
)"#;

fn build_store() -> Result<AssetStore, Box<dyn std::error::Error>> {
    let mut store = AssetStore::new();
    store.add_scene_ron(MAIN_SCENE)?;
    store
        .add_world(
            "Main",
            WorldData {
                name: "Sky".into(),
                background_color: [0.05, 0.07, 0.12, 1.0],
                strength: 1.0,
            },
        )
        .add_camera(
            "Main",
            CameraData {
                name: "CamData".into(),
                fov_y: 0.85,
                near: 0.1,
                far: 100.0,
            },
        )
        .add_light(
            "Main",
            LightData {
                name: "SunData".into(),
                color: [1.0, 0.95, 0.9],
                strength: 3.0,
            },
        )
        .add_material(
            "Main",
            MaterialData {
                name: "Wood".into(),
                base_color: [0.6, 0.4, 0.2, 1.0],
                metallic: 0.0,
                roughness: 0.8,
            },
        )
        .add_mesh(
            "library",
            MeshData {
                name: "CrateMesh".into(),
                positions: vec![
                    [-0.5, -0.5, -0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, 0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                ],
                indices: vec![0, 1, 2, 0, 2, 3],
                skin: None,
            },
        );
    Ok(store)
}

fn print_tree(scene: &Scene, uid: Uid, depth: usize) {
    let Some(obj) = scene.graph.get(uid) else {
        return;
    };
    let kind = match &obj.payload {
        ObjectPayload::Empty => "empty",
        ObjectPayload::Mesh(_) => "mesh",
        ObjectPayload::Light(_) => "light",
        ObjectPayload::Camera(_) => "camera",
        ObjectPayload::Speaker(_) => "speaker",
    };
    println!("{:indent$}{} [{kind}] uid={}", "", obj.name, obj.uid, indent = depth * 2);
    for child in &obj.children {
        print_tree(scene, *child, depth + 1);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default("info");
    log::info!("Starting scene runtime demo...");

    let store = build_store()?;
    let mut animation = NoopAnimationBinder;
    let mut services = SceneServices::new(&store, &mut animation);

    let mut manager = SceneManager::new();
    manager.set_active("Main", &mut services)?;

    let Some(scene) = manager.active_mut() else {
        return Ok(());
    };
    log::info!(
        "Scene '{}' ready: {}/{} objects instantiated",
        scene.name(),
        scene.objects_traversed(),
        scene.objects_count()
    );
    for condition in scene.build_conditions() {
        log::warn!("Build condition: {condition}");
    }

    println!("Object graph:");
    print_tree(scene, scene.root(), 0);

    // Spawn the on-demand node the descriptor left dormant
    let debris = scene.spawn_object("Debris", None, true, &mut services)?;
    log::info!("Spawned 'Debris' on demand as uid {debris}");

    // One simulated frame
    scene.update_frame();
    let mut path = NoopRenderPath::default();
    scene.render_frame(&mut path);
    log::info!(
        "Rendered {} camera frame(s), {} default frame(s)",
        path.camera_frames,
        path.default_frames
    );

    Ok(())
}
