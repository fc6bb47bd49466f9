//! Light pre-pass demo
//!
//! Renders a small outdoor scene for a fixed number of frames on the
//! recording backend while the camera orbits, then resizes the surface
//! and keeps going. Pass a `.toml` or `.ron` renderer config as the first
//! argument to override the defaults.

use lpp_renderer::foundation::logging;
use lpp_renderer::prelude::*;
use lpp_renderer::render::api::{MaterialHandle, MeshHandle};

const FRAMES: u32 = 120;
const RESIZE_AT: u32 = 60;
const ORBIT_RADIUS: f32 = 45.0;
const TILE_SIZE: f32 = 32.0;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("render: {0}")]
    Render(#[from] RenderError),
}

struct DemoScene {
    drawables: Vec<Drawable>,
    instanced: Vec<Drawable>,
    lights: Vec<Light>,
}

impl DemoScene {
    fn build() -> Self {
        let mut drawables = Vec::new();
        for x in -2..2 {
            for z in -2..2 {
                drawables.push(Drawable::TerrainTile(TerrainTile {
                    mesh: MeshHandle(1),
                    material: MaterialHandle(1),
                    origin: Vec2::new(x as f32 * TILE_SIZE, z as f32 * TILE_SIZE),
                    size: TILE_SIZE,
                }));
            }
        }
        for (i, position) in [Vec3::new(-8.0, 0.0, 4.0), Vec3::new(10.0, 0.0, -6.0)].into_iter().enumerate() {
            drawables.push(Drawable::StaticMesh(StaticMesh {
                mesh: MeshHandle(10 + i as u64),
                material: MaterialHandle(2),
                transform: Transform::from_position(position),
            }));
        }
        drawables.push(Drawable::Water(Water {
            mesh: MeshHandle(20),
            material: MaterialHandle(3),
            center: Vec2::new(30.0, 30.0),
            extent: 40.0,
            height: -0.5,
        }));
        drawables.push(Drawable::Sky(Sky {
            mesh: MeshHandle(30),
            material: MaterialHandle(4),
        }));

        let grass = (0..64)
            .map(|i| {
                let angle = i as f32 * 0.61;
                let radius = 5.0 + (i % 8) as f32 * 3.0;
                Vec3::new(radius * angle.cos(), 0.5, radius * angle.sin())
            })
            .collect();
        let instanced = vec![Drawable::BillboardCluster(BillboardCluster {
            mesh: MeshHandle(40),
            material: MaterialHandle(5),
            positions: grass,
            size: Vec2::new(1.0, 1.0),
        })];

        let warm = Vec3::new(1.0, 0.85, 0.6);
        let cool = Vec3::new(0.6, 0.75, 1.0);
        let lights = vec![
            Light::directional(Vec3::new(-0.4, -1.0, -0.3), Vec3::new(1.0, 0.97, 0.9), 0.9).with_shadows(0.0015),
            Light::point(Vec3::new(-8.0, 3.0, 4.0), 10.0, warm, 1.5),
            Light::point(Vec3::new(10.0, 2.0, -6.0), 8.0, cool, 1.2),
            Light::point(Vec3::new(0.0, 1.0, 0.0), 6.0, warm, 0.8),
            Light::spot(Vec3::new(0.0, 12.0, 0.0), -Vec3::y(), 20.0, 0.5, 8.0, warm, 2.0).with_shadows(0.002),
            Light::spot(Vec3::new(15.0, 8.0, 15.0), Vec3::new(-1.0, -1.0, -1.0), 25.0, 0.35, 16.0, cool, 1.5)
                .with_shadows(0.002),
        ];

        Self { drawables, instanced, lights }
    }
}

fn orbit_position(frame: u32) -> Vec3 {
    let angle = frame as f32 / FRAMES as f32 * std::f32::consts::TAU;
    Vec3::new(ORBIT_RADIUS * angle.cos(), 12.0, ORBIT_RADIUS * angle.sin())
}

fn run() -> Result<(), DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading renderer config from {}", path);
            RendererConfig::load_from_file(&path)?
        }
        None => RendererConfig::new(1280, 720)
            .with_shadow_resolution(2048, 1024)
            .with_clear_color([0.45, 0.6, 0.85, 1.0]),
    };

    let backend = Box::new(RecordingBackend::new());
    let mut renderer = LightPrePassRenderer::new(backend, config)?;
    let mut pool = renderer.create_shadow_pool()?;
    let mut generator = MatrixShadowGenerator::new(renderer.config().cascade_split_lambda);
    let scene = DemoScene::build();
    let (width, height) = renderer.gbuffer().size();
    let mut camera = Camera::perspective(orbit_position(0), 60.0, width as f32 / height as f32, 0.5, 500.0);

    let mut denied = 0;
    for frame in 0..FRAMES {
        if frame == RESIZE_AT {
            renderer.resize(1920, 1080)?;
            camera.set_aspect_ratio(1920.0 / 1080.0);
            log::info!("Resized to 1920x1080");
        }

        camera.set_position(orbit_position(frame));
        camera.look_at(Vec3::zeros(), Vec3::y());
        let context = FrameContext::new(&camera, &scene.lights, &scene.drawables, &scene.instanced);
        let stats = renderer.render_frame(&context, &mut pool, &mut generator)?;
        denied += stats.shadows_denied;

        if let Some(backend) = renderer.backend_mut().as_any_mut().downcast_mut::<RecordingBackend>() {
            let commands = backend.take_commands();
            log::trace!("Frame {} recorded {} commands", stats.frame_index, commands.len());
        }
        if stats.frame_index % 30 == 0 {
            log::info!(
                "Frame {}: {} lights, {} spot + {} cascade shadows, states {:?}",
                stats.frame_index,
                stats.lights_drawn,
                stats.spot_shadows,
                stats.cascade_shadows,
                stats.light_states
            );
        }
    }

    log::info!(
        "Rendered {} frames; {} spot maps and {} cascade sets generated, {} shadow requests denied",
        renderer.frame_count(),
        generator.spot_maps_generated(),
        generator.cascades_generated(),
        denied
    );
    pool.release(renderer.backend_mut());
    Ok(())
}

fn main() {
    logging::init();
    if let Err(e) = run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
