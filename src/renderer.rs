//! The scene registry.
//!
//! A [`Renderer`] keeps named [`GameObject`]s, each pairing a [`Model`] with the
//! shader and texture it is drawn with, and issues one indexed draw per object
//! with the model-view-projection matrix written to `u_MVP`.
//!
//! The renderer also owns the presentation surface and the debug overlay, and
//! tears everything down in a fixed order on [`Renderer::quit`].

use std::rc::Rc;
use std::sync::Arc;

use glam::Mat4;
use indexmap::IndexMap;

use crate::abs::{flush_errors, Gpu, Model, ShaderProgram, Texture};
use crate::overlay::Overlay;

/// Name of the matrix uniform every object shader is expected to declare.
pub const MVP_UNIFORM: &str = "u_MVP";

/// Something the renderer can present to.
pub trait Surface {
    /// Drawable size in pixels.
    fn size(&self) -> (u32, u32);
    fn swap_buffers(&self);
}

/// A drawable: geometry, the program and texture it uses, and where it sits.
///
/// Resources are shared, so the same model or texture can back several objects.
/// Fields drop in declaration order: texture, shader, then model.
pub struct GameObject {
    pub texture: Rc<Texture>,
    pub shader: Rc<ShaderProgram>,
    pub model: Rc<Model>,
    /// Primitive mode used for the draw, e.g. `glow::TRIANGLES`.
    pub mode: u32,
    pub transform: Mat4,
    /// Drawn with back-face culling disabled when `false`.
    pub cull_faces: bool,
}

impl GameObject {
    pub fn new(model: Rc<Model>, shader: Rc<ShaderProgram>, texture: Rc<Texture>, mode: u32) -> Self {
        Self {
            texture,
            shader,
            model,
            mode,
            transform: Mat4::IDENTITY,
            cull_faces: true,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Draws both sides of every face, e.g. for a box seen from the inside.
    pub fn double_sided(mut self) -> Self {
        self.cull_faces = false;
        self
    }
}

pub struct Renderer<S: Surface> {
    gpu: Arc<dyn Gpu>,
    surface: S,
    overlay: Box<dyn Overlay>,
    objects: IndexMap<String, GameObject>,
}

impl<S: Surface> Renderer<S> {
    /// Takes over `surface` and sets up blending, depth testing and back-face culling
    /// (clockwise front faces).
    pub fn new(gpu: Arc<dyn Gpu>, surface: S, overlay: Box<dyn Overlay>) -> Self {
        gpu.enable(glow::BLEND);
        gpu.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        gpu.enable(glow::DEPTH_TEST);
        gpu.depth_func(glow::LESS);
        gpu.front_face(glow::CW);
        gpu.cull_face(glow::BACK);
        gpu.enable(glow::CULL_FACE);

        let (width, height) = surface.size();
        gpu.viewport(0, 0, width as i32, height as i32);

        Self {
            gpu,
            surface,
            overlay,
            objects: IndexMap::new(),
        }
    }

    /// Registers `object` under `name`.
    ///
    /// An object already registered under that name is replaced and handed back.
    pub fn add_game_object(&mut self, name: impl Into<String>, object: GameObject) -> Option<GameObject> {
        let name = name.into();
        let previous = self.objects.insert(name.clone(), object);
        if previous.is_some() {
            log::debug!("Replaced game object {name}");
        }
        previous
    }

    pub fn remove_game_object(&mut self, name: &str) -> Option<GameObject> {
        self.objects.shift_remove(name)
    }

    pub fn game_object(&self, name: &str) -> Option<&GameObject> {
        self.objects.get(name)
    }

    pub fn game_object_mut(&mut self, name: &str) -> Option<&mut GameObject> {
        self.objects.get_mut(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Draws the object registered under `name`. Returns `false` if there is none.
    ///
    /// Binds, in order, the texture to unit 0, the shader, the vertex array and the index
    /// buffer, then writes `projection * view * transform` to `u_MVP` and draws every index.
    pub fn draw_object(&self, name: &str, projection: &Mat4, view: &Mat4) -> bool {
        let Some(object) = self.objects.get(name) else {
            log::warn!("No game object named {name} // Skipping draw");
            return false;
        };

        object.texture.bind(0);
        object.shader.bind();
        object.model.vertex_array().bind();
        object.model.index_buffer().bind();

        let mvp = *projection * *view * object.transform;
        object.shader.set_uniform_mat4f(MVP_UNIFORM, &mvp, false);

        if !object.cull_faces {
            self.gpu.disable(glow::CULL_FACE);
        }
        object.model.index_buffer().draw(object.mode);
        if !object.cull_faces {
            self.gpu.enable(glow::CULL_FACE);
        }
        true
    }

    /// Starts a frame: logs pending GPU errors, clears color and depth, and begins a new
    /// overlay frame.
    pub fn clear(&mut self, r: f32, g: f32, b: f32, a: f32) {
        flush_errors(self.gpu.as_ref());
        self.gpu.clear_color(r, g, b, a);
        self.gpu.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        self.overlay.new_frame();
    }

    /// Renders the overlay on top of the scene and swaps buffers.
    pub fn present(&mut self) {
        self.overlay.render();
        self.surface.swap_buffers();
    }

    /// Matches the viewport to a new drawable size.
    pub fn resize(&self, width: u32, height: u32) {
        self.gpu.viewport(0, 0, width as i32, height as i32);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn gpu(&self) -> &Arc<dyn Gpu> {
        &self.gpu
    }

    /// Releases every object in registration order (texture, shader, index buffer, vertex
    /// buffer, vertex array), then shuts down the overlay and the surface.
    pub fn quit(self) {
        let Renderer {
            gpu,
            surface,
            mut overlay,
            objects,
        } = self;

        for (name, object) in objects {
            log::debug!("Destroying game object {name}");
            drop(object);
        }
        overlay.shutdown();
        flush_errors(gpu.as_ref());
        drop(surface);
        log::info!("Renderer stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use glam::Vec3;

    use super::*;
    use crate::abs::mock::{Call, RecordingGpu};
    use crate::abs::{checkerboard, ComponentType, ShaderStage, TextureDesc, VertexLayout};

    struct FakeSurface {
        size: (u32, u32),
        swaps: Rc<Cell<u32>>,
        dropped: Rc<Cell<bool>>,
    }

    impl Surface for FakeSurface {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn swap_buffers(&self) {
            self.swaps.set(self.swaps.get() + 1);
        }
    }

    impl Drop for FakeSurface {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    #[derive(Default, Clone)]
    struct Events(Rc<RefCell<Vec<&'static str>>>);

    impl Overlay for Events {
        fn new_frame(&mut self) {
            self.0.borrow_mut().push("new_frame");
        }

        fn render(&mut self) {
            self.0.borrow_mut().push("render");
        }

        fn shutdown(&mut self) {
            self.0.borrow_mut().push("shutdown");
        }
    }

    struct Harness {
        rec: Arc<RecordingGpu>,
        gpu: Arc<dyn Gpu>,
        events: Events,
        swaps: Rc<Cell<u32>>,
        dropped: Rc<Cell<bool>>,
        renderer: Renderer<FakeSurface>,
    }

    fn harness() -> Harness {
        let rec = Arc::new(RecordingGpu::with_uniforms(&[MVP_UNIFORM]));
        let gpu: Arc<dyn Gpu> = rec.clone();
        let events = Events::default();
        let swaps = Rc::new(Cell::new(0));
        let dropped = Rc::new(Cell::new(false));
        let surface = FakeSurface {
            size: (800, 600),
            swaps: swaps.clone(),
            dropped: dropped.clone(),
        };
        let renderer = Renderer::new(gpu.clone(), surface, Box::new(events.clone()));
        Harness {
            rec,
            gpu,
            events,
            swaps,
            dropped,
            renderer,
        }
    }

    fn object(gpu: &Arc<dyn Gpu>, index_count: usize) -> GameObject {
        let mut layout = VertexLayout::new();
        layout
            .add_attribute(3, ComponentType::Float, false)
            .add_attribute(2, ComponentType::Float, false);
        let indices: Vec<u32> = (0..index_count as u32).collect();
        let model = Model::new(gpu, &[0.0f32; 20], &layout, &indices).unwrap();
        let shader = ShaderProgram::from_sources(gpu, &[(ShaderStage::Vertex, "void main() {}")]).unwrap();
        let texture = Texture::from_image(
            gpu,
            &checkerboard(2, 2, [0, 0, 0, 255], [255; 4]),
            TextureDesc::default(),
        )
        .unwrap();
        GameObject::new(Rc::new(model), Rc::new(shader), Rc::new(texture), glow::TRIANGLES)
    }

    #[test]
    fn new_sets_up_fixed_pipeline_state() {
        let h = harness();
        let calls = h.rec.calls();
        assert!(calls.contains(&Call::Enable(glow::BLEND)));
        assert!(calls.contains(&Call::Enable(glow::DEPTH_TEST)));
        assert!(calls.contains(&Call::Enable(glow::CULL_FACE)));
        assert!(calls.contains(&Call::Viewport(0, 0, 800, 600)));
    }

    #[test]
    fn draw_binds_everything_then_writes_mvp_and_draws() {
        let mut h = harness();
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let cube = object(&h.gpu, 6).with_transform(transform);
        let tex = cube.texture.name().get();
        let program = cube.shader.name().get();
        let vao = cube.model.vertex_array().name().get();
        let ibo = cube.model.index_buffer().name().get();
        h.renderer.add_game_object("cube", cube);
        h.rec.clear_calls();

        let projection = Mat4::perspective_rh_gl(1.2, 4.0 / 3.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, Vec3::Y);
        assert!(h.renderer.draw_object("cube", &projection, &view));

        let mvp = projection * view * transform;
        assert_eq!(
            h.rec.calls(),
            vec![
                Call::ActiveTexture(glow::TEXTURE0),
                Call::BindTexture(glow::TEXTURE_2D, Some(tex)),
                Call::UseProgram(Some(program)),
                Call::BindVertexArray(Some(vao)),
                Call::BindBuffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo)),
                Call::UniformLocation(MVP_UNIFORM.to_string()),
                Call::UniformMatrix(0, mvp.to_cols_array()),
                Call::BindBuffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo)),
                Call::DrawElements {
                    mode: glow::TRIANGLES,
                    count: 6,
                    element_type: glow::UNSIGNED_INT,
                },
            ]
        );
    }

    #[test]
    fn missing_object_is_skipped() {
        let h = harness();
        h.rec.clear_calls();
        assert!(!h.renderer.draw_object("ghost", &Mat4::IDENTITY, &Mat4::IDENTITY));
        assert!(h.rec.calls().is_empty());
    }

    #[test]
    fn re_registering_draws_the_new_object() {
        let mut h = harness();
        let old = object(&h.gpu, 3);
        let old_vao = old.model.vertex_array().name().get();
        let new = object(&h.gpu, 9);
        let new_vao = new.model.vertex_array().name().get();
        let new_tex = new.texture.name().get();

        assert!(h.renderer.add_game_object("thing", old).is_none());
        let displaced = h.renderer.add_game_object("thing", new).unwrap();
        assert_eq!(displaced.model.vertex_array().name().get(), old_vao);
        assert_eq!(h.renderer.len(), 1);
        h.rec.clear_calls();

        h.renderer.draw_object("thing", &Mat4::IDENTITY, &Mat4::IDENTITY);
        let calls = h.rec.calls();
        assert!(calls.contains(&Call::BindVertexArray(Some(new_vao))));
        assert!(calls.contains(&Call::BindTexture(glow::TEXTURE_2D, Some(new_tex))));
        assert!(!calls.contains(&Call::BindVertexArray(Some(old_vao))));
        assert!(calls.contains(&Call::DrawElements {
            mode: glow::TRIANGLES,
            count: 9,
            element_type: glow::UNSIGNED_INT,
        }));
    }

    #[test]
    fn double_sided_objects_draw_without_culling() {
        let mut h = harness();
        let sky = object(&h.gpu, 3).double_sided();
        h.renderer.add_game_object("sky", sky);
        h.rec.clear_calls();

        h.renderer.draw_object("sky", &Mat4::IDENTITY, &Mat4::IDENTITY);
        let calls = h.rec.calls();
        let disabled = calls.iter().position(|c| *c == Call::Disable(glow::CULL_FACE)).unwrap();
        let drawn = calls
            .iter()
            .position(|c| matches!(c, Call::DrawElements { .. }))
            .unwrap();
        let enabled = calls.iter().position(|c| *c == Call::Enable(glow::CULL_FACE)).unwrap();
        assert!(disabled < drawn && drawn < enabled);
    }

    #[test]
    fn clear_flushes_errors_then_clears_and_starts_overlay_frame() {
        let mut h = harness();
        h.rec.push_error(glow::INVALID_VALUE);
        h.rec.push_error(glow::OUT_OF_MEMORY);
        h.rec.clear_calls();

        h.renderer.clear(0.25, 0.25, 1.0, 1.0);
        assert_eq!(h.rec.get_error(), glow::NO_ERROR);
        assert_eq!(
            h.rec.calls(),
            vec![
                Call::ClearColor([0.25, 0.25, 1.0, 1.0]),
                Call::Clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT),
            ]
        );
        assert_eq!(*h.events.0.borrow(), vec!["new_frame"]);

        h.renderer.present();
        assert_eq!(h.swaps.get(), 1);
        assert_eq!(*h.events.0.borrow(), vec!["new_frame", "render"]);
    }

    #[test]
    fn quit_releases_objects_in_order_then_overlay_and_surface() {
        let mut h = harness();
        let first = object(&h.gpu, 3);
        let second = object(&h.gpu, 3);
        let ids = |o: &GameObject| {
            vec![
                Call::DeleteTexture(o.texture.name().get()),
                Call::DeleteProgram(o.shader.name().get()),
                Call::DeleteBuffer(o.model.index_buffer().name().get()),
                Call::DeleteBuffer(o.model.vertex_buffer().name().get()),
                Call::DeleteVertexArray(o.model.vertex_array().name().get()),
            ]
        };
        let mut expected = ids(&first);
        expected.extend(ids(&second));
        h.renderer.add_game_object("first", first);
        h.renderer.add_game_object("second", second);
        h.rec.clear_calls();

        h.renderer.quit();
        assert_eq!(h.rec.calls(), expected);
        assert_eq!(*h.events.0.borrow(), vec!["shutdown"]);
        assert!(h.dropped.get());
    }

    #[test]
    fn shared_resources_are_released_with_their_last_user() {
        let mut h = harness();
        let first = object(&h.gpu, 3);
        let texture = first.texture.clone();
        let tex = texture.name().get();
        let second = GameObject::new(first.model.clone(), first.shader.clone(), texture, glow::LINES);
        h.renderer.add_game_object("a", first);
        h.renderer.add_game_object("b", second);
        h.rec.clear_calls();

        h.renderer.quit();
        assert_eq!(h.rec.count(|c| *c == Call::DeleteTexture(tex)), 1);
        assert_eq!(h.rec.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
        assert_eq!(h.rec.count(|c| matches!(c, Call::DeleteVertexArray(_))), 1);
    }
}
