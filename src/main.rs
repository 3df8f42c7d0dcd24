use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec2, Vec3};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::{Keycode, Scancode};

use harness3d::abs::*;
use harness3d::config::{HarnessConfig, TextureConfig};
use harness3d::{logging, Camera, FrameStats, GameObject, Renderer, Result, Surface};

const SKY: &str = "sky";
const CUBE: &str = "cube";
const SKY_SCALE: f32 = 50.0;

const MIN_FOV: f32 = 10.0;
const MAX_FOV: f32 = 100.0;
/// Degrees per second while a zoom key is held.
const FOV_SPEED: f32 = 30.0;
/// Tint strength per second while a strength key is held.
const TINT_SPEED: f32 = 0.5;

/// Settings the user can change while the demo runs.
#[derive(Debug, Clone, PartialEq)]
struct ViewSettings {
    /// Vertical field of view in degrees.
    fov: f32,
    /// RGB plus strength, written to `u_Tint`.
    tint: [f32; 4],
}

impl ViewSettings {
    fn new(fov: f32, tint: [f32; 4]) -> Self {
        Self {
            fov: fov.clamp(MIN_FOV, MAX_FOV),
            tint,
        }
    }

    /// Widens (positive `direction`) or narrows the field of view.
    fn zoom(&mut self, direction: f32, delta_time: f32) {
        self.fov = (self.fov + direction * FOV_SPEED * delta_time).clamp(MIN_FOV, MAX_FOV);
    }

    /// Switches one color channel of the tint fully on or off.
    fn toggle_channel(&mut self, channel: usize) {
        self.tint[channel] = if self.tint[channel] > 0.5 { 0.0 } else { 1.0 };
    }

    fn fade_tint(&mut self, direction: f32, delta_time: f32) {
        self.tint[3] = (self.tint[3] + direction * TINT_SPEED * delta_time).clamp(0.0, 1.0);
    }
}

/// Cube faces as (normal, u axis, v axis) with `u × v = normal`.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
];

/// A cube of half-extent `half` with its own texture coordinates on every face.
///
/// Vertices are `[x, y, z, u, v]`. Faces wind clockwise when seen from outside.
fn cube_mesh(half: f32) -> (Vec<[f32; 5]>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0_f32, -1.0_f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (normal + u * su + v * sv) * half;
            vertices.push([p.x, p.y, p.z, (su + 1.0) / 2.0, (sv + 1.0) / 2.0]);
        }
        indices.extend([0, 2, 1, 0, 3, 2].map(|i| base + i));
    }
    (vertices, indices)
}

/// Loads a texture with nearest filtering and mipmaps, or a checkerboard if the file is unusable.
fn load_texture(gpu: &Arc<dyn Gpu>, entry: &TextureConfig, fallback: [u8; 4]) -> Result<Texture> {
    let desc = TextureDesc {
        flip_vertically: entry.flip_vertically,
        ..TextureDesc::default()
    };
    let mut texture = match Texture::from_file(gpu, &entry.path, desc) {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("{e} // Using a checkerboard instead");
            Texture::from_image(gpu, &checkerboard(64, 8, fallback, [255; 4]), desc)?
        }
    };
    if entry.nearest {
        texture.set_render_hints(&NEAREST_HINTS);
    }
    texture.gen_mipmaps();
    Ok(texture)
}

fn main() {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match HarnessConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(
        logging::parse_level(&config.log_level),
        config.log_file.as_deref(),
    ) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    if let Err(e) = run(&config) {
        log::error!("{e}");
        log::error!("Stopping!");
        std::process::exit(1);
    }
}

fn run(config: &HarnessConfig) -> Result<()> {
    let (mut app, window) = App::new(&config.window)?;
    log::info!("Successfully initialized OpenGL version {}", app.gpu.version());

    let gpu = Arc::clone(&app.gpu);
    let mut renderer = Renderer::new(Arc::clone(&gpu), window, Box::new(FrameStats::default()));

    let (vertices, indices) = cube_mesh(0.5);
    let mut layout = VertexLayout::new();
    layout
        .add_attribute(3, ComponentType::Float, false) // position
        .add_attribute(2, ComponentType::Float, false); // texture coords
    let cube = Rc::new(Model::new(&gpu, &vertices, &layout, &indices)?);

    let shader = Rc::new(ShaderProgram::from_manifest(&gpu, &config.shader_dir)?);
    shader.bind();
    shader.set_uniform_4f("u_Mult", 1.0, 1.0, 1.0, 1.0);
    shader.set_uniform_1i("u_Texture", 0);

    let sky_texture = Rc::new(load_texture(&gpu, &config.sky_texture, [40, 40, 120, 255])?);
    let cube_texture = Rc::new(load_texture(&gpu, &config.cube_texture, [200, 60, 60, 255])?);

    renderer.add_game_object(
        SKY,
        GameObject::new(Rc::clone(&cube), Rc::clone(&shader), sky_texture, glow::TRIANGLES)
            .double_sided(),
    );
    renderer.add_game_object(
        CUBE,
        GameObject::new(cube, Rc::clone(&shader), cube_texture, glow::TRIANGLES),
    );

    let settings = &config.camera;
    let mut camera = Camera::new(Vec3::from_array(settings.start_position), Vec2::ZERO);
    let [r, g, b, a] = config.clear_color;
    let mut view_settings = ViewSettings::new(settings.fov, config.tint);

    let mut last_frame = Instant::now();
    'running: loop {
        let now = Instant::now();
        let delta_time = (now - last_frame).as_secs_f32();
        last_frame = now;

        let events: Vec<Event> = app.event_pump.poll_iter().collect();
        let mut mouse = Vec2::ZERO;
        for event in events {
            match event {
                Event::Quit { .. } => break 'running,
                Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    repeat: false,
                    ..
                } => app.set_mouse_grab(!app.mouse_grabbed()),
                Event::KeyDown {
                    keycode: Some(key @ (Keycode::Num1 | Keycode::Num2 | Keycode::Num3)),
                    repeat: false,
                    ..
                } => {
                    let channel = match key {
                        Keycode::Num1 => 0,
                        Keycode::Num2 => 1,
                        _ => 2,
                    };
                    view_settings.toggle_channel(channel);
                    log::info!("Tint is now {:?}", view_settings.tint);
                }
                Event::MouseMotion { xrel, yrel, .. } if app.mouse_grabbed() => {
                    mouse -= Vec2::new(xrel as f32, yrel as f32);
                }
                Event::Window {
                    win_event: WindowEvent::SizeChanged(..),
                    ..
                } => {
                    let (width, height) = renderer.surface().size();
                    renderer.resize(width, height);
                }
                _ => {}
            }
        }

        let keys = app.event_pump.keyboard_state();
        let held = |code: Scancode| keys.is_scancode_pressed(code);
        let axis = |pos: Scancode, neg: Scancode| held(pos) as i32 as f32 - held(neg) as i32 as f32;

        camera.move_by(
            axis(Scancode::W, Scancode::S) * settings.speed,
            axis(Scancode::D, Scancode::A) * settings.speed,
            delta_time,
        );
        camera.ascend(
            axis(Scancode::Space, Scancode::LShift) * settings.speed,
            delta_time,
        );
        camera.look(
            Vec2::new(
                axis(Scancode::Left, Scancode::Right),
                axis(Scancode::Up, Scancode::Down),
            ) * settings.sensitivity,
            delta_time,
        );
        view_settings.zoom(axis(Scancode::Equals, Scancode::Minus), delta_time);
        view_settings.fade_tint(axis(Scancode::Num5, Scancode::Num4), delta_time);
        if mouse != Vec2::ZERO {
            camera.look(mouse * settings.mouse_sensitivity, 1.0);
        }

        if let Some(sky) = renderer.game_object_mut(SKY) {
            sky.transform = Mat4::from_translation(camera.position) * Mat4::from_scale(Vec3::splat(SKY_SCALE));
        }

        renderer.clear(r, g, b, a);

        let projection = camera.projection(renderer.surface(), view_settings.fov);
        let view = camera.view();

        shader.bind();
        let [tr, tg, tb, ta] = view_settings.tint;
        shader.set_uniform_4f("u_Tint", tr, tg, tb, ta);

        renderer.draw_object(SKY, &projection, &view);
        renderer.draw_object(CUBE, &projection, &view);

        renderer.present();
    }

    // The renderer's objects must be the last owners so everything is released before the context.
    drop(shader);
    renderer.quit();
    log::info!("App stopped without errors.");
    Ok(())
}
