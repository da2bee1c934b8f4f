//! Scene viewer demo
//!
//! Imports a small scene (a ground slab, a pivot with orbiting children, a
//! handful of lights and a camera), then spins the pivot for a bounded
//! number of frames against the headless backends and logs what each frame
//! drew. An optional TOML or RON engine configuration can be passed as the
//! first argument.

use std::process::ExitCode;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_engine::prelude::*;
use scene_engine::foundation::logging;
use scene_engine::render::device::MeshHandle;
use scene_engine::render::{MeshData, RenderError};
use scene_engine::scene::ImportedHandles;
use thiserror::Error;

const FRAME_LIMIT: u64 = 120;
const ORBITER_COUNT: usize = 6;

#[derive(Error, Debug)]
enum ViewerError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] scene_engine::config::ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

struct ViewerApp {
    rng: StdRng,
    handles: Option<ImportedHandles>,
    pivot: Option<EntityId>,
    spin_speed: f32,
}

impl ViewerApp {
    fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let spin_speed = rng.gen_range(0.5..1.5);
        Self {
            rng,
            handles: None,
            pivot: None,
            spin_speed,
        }
    }

    fn build_scene(&mut self, cube: MeshHandle, sphere: MeshHandle) -> ImportedScene {
        let mut imported = ImportedScene {
            meshes: vec![
                Arc::new(Mesh::new("cube", cube, AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5)))),
                Arc::new(Mesh::new("sphere", sphere, AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0)))),
            ],
            materials: vec![
                Arc::new(Material {
                    name: "ground".to_string(),
                    diffuse_color: Vec4::new(0.35, 0.4, 0.3, 0.0),
                    ..Material::default()
                }),
                Arc::new(Material {
                    name: "orbiter".to_string(),
                    diffuse_color: Vec4::new(0.8, 0.5, 0.2, 0.0),
                    specular_color: Vec4::new(0.6, 0.6, 0.6, 32.0),
                    ..Material::default()
                }),
            ],
            lights: vec![
                Arc::new(Light::ambient(Vec4::new(0.15, 0.15, 0.2, 1.0))),
                Arc::new(Light::directional(Vec4::new(0.8, 0.75, 0.7, 1.0))),
                Arc::new(Light::point(Vec4::new(1.0, 0.6, 0.3, 4.0), Vec4::new(1.0, 0.2, 0.05, 0.0))),
                Arc::new(Light::spot(Vec4::new(0.4, 0.6, 1.0, 6.0), Vec4::new(1.0, 0.1, 0.02, 0.0), 0.8)),
            ],
            cameras: vec![Arc::new(Camera::default())],
            root: 0,
            ..ImportedScene::default()
        };

        let mut world = ImportedEntity::new("world");

        let mut ground = ImportedEntity::new("ground");
        ground.local_transform = Sqt::new(Vec3::new(40.0, 0.5, 40.0), Quat::identity(), Vec3::new(0.0, -1.0, 0.0));
        ground.mesh = Some(0);
        ground.material = Some(0);

        let mut pivot = ImportedEntity::new("pivot");
        pivot.local_transform = Sqt::from_translation(Vec3::new(0.0, 1.0, 0.0));

        let mut ambient = ImportedEntity::new("ambient");
        ambient.light = Some(0);

        let mut sun = ImportedEntity::new("sun");
        sun.local_transform = Sqt::from_yaw_pitch_roll(0.4, -0.9, 0.0);
        sun.light = Some(1);

        let mut camera = ImportedEntity::new("camera");
        camera.local_transform = Sqt::from_translation(Vec3::new(0.0, 4.0, 14.0));
        camera.local_transform.rotation = Quat::from_euler_angles(-0.25, 0.0, 0.0);
        camera.camera = Some(0);

        imported.entities = vec![ImportedEntity::default(); 5];
        world.children = vec![1, 2, 3, 4];
        imported.entities[1] = ground;
        imported.entities[3] = ambient;
        imported.entities[4] = sun;

        for index in 0..ORBITER_COUNT {
            #[allow(clippy::cast_precision_loss)]
            let angle = index as f32 * std::f32::consts::TAU / ORBITER_COUNT as f32;
            let radius = self.rng.gen_range(3.0..6.0);
            let mut orbiter = ImportedEntity::new(format!("orbiter{index}"));
            orbiter.local_transform = Sqt::new(
                Vec3::repeat(self.rng.gen_range(0.4..0.9)),
                Quat::from_euler_angles(0.0, angle, 0.0),
                Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin()),
            );
            orbiter.mesh = Some(index % 2);
            orbiter.material = Some(1);
            match index {
                0 => orbiter.light = Some(2),
                3 => orbiter.light = Some(3),
                _ => {}
            }
            pivot.children.push(imported.entities.len());
            imported.entities.push(orbiter);
        }

        imported.entities[2] = pivot;
        world.children.push(imported.entities.len());
        imported.entities.push(camera);
        imported.entities[0] = world;
        imported
    }
}

impl Application for ViewerApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let device = engine.renderer.device_mut();
        let cube = device.create_mesh(&MeshData::unit_cube()).map_err(RenderError::from)?;
        let sphere = device.create_mesh(&MeshData::unit_sphere(12, 12)).map_err(RenderError::from)?;

        let imported = self.build_scene(cube, sphere);
        let handles = engine.scene.import(&imported)?;
        self.pivot = engine.scene.find_by_name("pivot");
        engine.renderer.set_camera_entity(engine.scene.find_by_name("camera"));
        log::info!(
            "Viewer: imported {} entities, camera at {:?}",
            engine.scene.len(),
            engine.renderer.camera_position(&engine.scene)
        );

        engine.renderer.events_mut().register_handler(EventType::AboutToClose, |event: &Event| {
            log::info!("Viewer: closing at t={:.3}s", event.timestamp);
            false
        });
        self.handles = Some(handles);
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        let Some(pivot) = self.pivot else {
            return Err(AppError::Custom("pivot entity missing".to_string()));
        };
        let step = Quat::from_euler_angles(0.0, self.spin_speed * delta_time.max(1.0 / 60.0), 0.0);
        engine.scene.post_multiply_rotation(pivot, step)?;

        if let Some(handles) = &self.handles {
            engine.renderer.queue().submit_recursive(&engine.scene, handles.root);
        }

        let frame = engine.renderer.clock().frame_count();
        let stats = engine.renderer.stats();
        if frame % 30 == 0 {
            log::info!(
                "Viewer: frame {} drew {} entities, shaded {} lights ({} stencil volumes, {} draw calls)",
                frame,
                stats.entities_drawn,
                stats.lights_shaded,
                stats.stencil_volumes,
                stats.draw_calls
            );
        }
        if frame + 1 >= FRAME_LIMIT {
            engine.renderer.close();
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        let visible = engine
            .scene
            .query(&AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(8.0)));
        log::info!("Viewer: {} indexed entities near the origin at shutdown", visible.len());
    }
}

fn run() -> Result<(), ViewerError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default().with_window(WindowConfig::new("Scene Viewer", 1280, 720)),
    };
    let window = HeadlessWindow::from_config(&config.window);
    let mut engine = Engine::new(config, Box::new(HeadlessDevice::new()), Box::new(window))?;
    engine.run(&mut ViewerApp::new(0x5eed))?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            logging::init("info");
            log::error!("Scene viewer failed: {error}");
            let mut source = std::error::Error::source(&error);
            while let Some(cause) = source {
                log::error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
