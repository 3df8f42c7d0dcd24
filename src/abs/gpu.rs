//! The OpenGL entry points used by the renderer.
//!
//! Every wrapper in [`crate::abs`] talks to the driver through the [`Gpu`] trait
//! instead of calling `glow` directly. The real implementation forwards to a
//! [`glow::Context`]; tests swap in a recording implementation so the binding
//! protocol can be checked without a window.
//!
//! GL object names are passed around as [`GlName`] and uniform locations as
//! plain `u32`, which is what the native backend uses underneath.

use std::num::NonZeroU32;

use glow::HasContext;

/// A GL object name (buffer, vertex array, shader, program or texture).
pub type GlName = NonZeroU32;

/// The subset of OpenGL the renderer relies on.
///
/// All binding calls mutate state that is global to the current context. The
/// trait does not track what is bound; callers bind before use.
pub trait Gpu {
    fn create_buffer(&self) -> Result<GlName, String>;
    fn bind_buffer(&self, target: u32, buffer: Option<GlName>);
    fn buffer_data(&self, target: u32, data: &[u8], usage: u32);
    fn delete_buffer(&self, buffer: GlName);

    fn create_vertex_array(&self) -> Result<GlName, String>;
    fn bind_vertex_array(&self, vertex_array: Option<GlName>);
    fn delete_vertex_array(&self, vertex_array: GlName);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);

    fn create_shader(&self, stage: u32) -> Result<GlName, String>;
    fn shader_source(&self, shader: GlName, source: &str);
    fn compile_shader(&self, shader: GlName);
    fn shader_compile_status(&self, shader: GlName) -> bool;
    fn shader_info_log(&self, shader: GlName) -> String;
    fn delete_shader(&self, shader: GlName);

    fn create_program(&self) -> Result<GlName, String>;
    fn attach_shader(&self, program: GlName, shader: GlName);
    fn link_program(&self, program: GlName);
    fn program_link_status(&self, program: GlName) -> bool;
    fn validate_program(&self, program: GlName);
    fn program_validate_status(&self, program: GlName) -> bool;
    fn program_info_log(&self, program: GlName) -> String;
    fn use_program(&self, program: Option<GlName>);
    fn delete_program(&self, program: GlName);

    fn uniform_location(&self, program: GlName, name: &str) -> Option<u32>;
    fn uniform_1_i32(&self, location: u32, x: i32);
    fn uniform_1_f32(&self, location: u32, x: f32);
    fn uniform_2_f32(&self, location: u32, x: f32, y: f32);
    fn uniform_3_f32(&self, location: u32, x: f32, y: f32, z: f32);
    fn uniform_4_f32(&self, location: u32, x: f32, y: f32, z: f32, w: f32);
    fn uniform_matrix_4_f32(&self, location: u32, transpose: bool, matrix: &[f32; 16]);

    fn create_texture(&self) -> Result<GlName, String>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: u32, texture: Option<GlName>);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    );
    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    fn generate_mipmap(&self, target: u32);
    fn delete_texture(&self, texture: GlName);

    fn enable(&self, capability: u32);
    fn disable(&self, capability: u32);
    fn blend_func(&self, src: u32, dst: u32);
    fn depth_func(&self, func: u32);
    fn front_face(&self, mode: u32);
    fn cull_face(&self, mode: u32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: u32);

    /// Pops one code off the driver's error queue. `glow::NO_ERROR` when empty.
    fn get_error(&self) -> u32;
    fn version(&self) -> String;
}

/// Drains the GPU error queue, logging every pending code.
///
/// Returns how many errors were pending.
pub fn flush_errors(gpu: &dyn Gpu) -> usize {
    let mut drained = 0;
    loop {
        let code = gpu.get_error();
        if code == glow::NO_ERROR {
            return drained;
        }
        log::error!("[OpenGL ERROR]: 0x{code:x}");
        drained += 1;
    }
}

impl Gpu for glow::Context {
    fn create_buffer(&self) -> Result<GlName, String> {
        unsafe { HasContext::create_buffer(self).map(|b| b.0) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<GlName>) {
        unsafe { HasContext::bind_buffer(self, target, buffer.map(glow::NativeBuffer)) }
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { self.buffer_data_u8_slice(target, data, usage) }
    }

    fn delete_buffer(&self, buffer: GlName) {
        unsafe { HasContext::delete_buffer(self, glow::NativeBuffer(buffer)) }
    }

    fn create_vertex_array(&self) -> Result<GlName, String> {
        unsafe { HasContext::create_vertex_array(self).map(|v| v.0) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<GlName>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array.map(glow::NativeVertexArray)) }
    }

    fn delete_vertex_array(&self, vertex_array: GlName) {
        unsafe { HasContext::delete_vertex_array(self, glow::NativeVertexArray(vertex_array)) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.vertex_attrib_pointer_f32(index, size, data_type, normalized, stride, offset)
        }
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        unsafe { HasContext::draw_elements(self, mode, count, element_type, offset) }
    }

    fn create_shader(&self, stage: u32) -> Result<GlName, String> {
        unsafe { HasContext::create_shader(self, stage).map(|s| s.0) }
    }

    fn shader_source(&self, shader: GlName, source: &str) {
        unsafe { HasContext::shader_source(self, glow::NativeShader(shader), source) }
    }

    fn compile_shader(&self, shader: GlName) {
        unsafe { HasContext::compile_shader(self, glow::NativeShader(shader)) }
    }

    fn shader_compile_status(&self, shader: GlName) -> bool {
        unsafe { self.get_shader_compile_status(glow::NativeShader(shader)) }
    }

    fn shader_info_log(&self, shader: GlName) -> String {
        unsafe { self.get_shader_info_log(glow::NativeShader(shader)) }
    }

    fn delete_shader(&self, shader: GlName) {
        unsafe { HasContext::delete_shader(self, glow::NativeShader(shader)) }
    }

    fn create_program(&self) -> Result<GlName, String> {
        unsafe { HasContext::create_program(self).map(|p| p.0) }
    }

    fn attach_shader(&self, program: GlName, shader: GlName) {
        unsafe {
            HasContext::attach_shader(self, glow::NativeProgram(program), glow::NativeShader(shader))
        }
    }

    fn link_program(&self, program: GlName) {
        unsafe { HasContext::link_program(self, glow::NativeProgram(program)) }
    }

    fn program_link_status(&self, program: GlName) -> bool {
        unsafe { self.get_program_link_status(glow::NativeProgram(program)) }
    }

    fn validate_program(&self, program: GlName) {
        unsafe { HasContext::validate_program(self, glow::NativeProgram(program)) }
    }

    fn program_validate_status(&self, program: GlName) -> bool {
        unsafe {
            self.get_program_parameter_i32(glow::NativeProgram(program), glow::VALIDATE_STATUS) != 0
        }
    }

    fn program_info_log(&self, program: GlName) -> String {
        unsafe { self.get_program_info_log(glow::NativeProgram(program)) }
    }

    fn use_program(&self, program: Option<GlName>) {
        unsafe { HasContext::use_program(self, program.map(glow::NativeProgram)) }
    }

    fn delete_program(&self, program: GlName) {
        unsafe { HasContext::delete_program(self, glow::NativeProgram(program)) }
    }

    fn uniform_location(&self, program: GlName, name: &str) -> Option<u32> {
        unsafe {
            self.get_uniform_location(glow::NativeProgram(program), name)
                .map(|loc| loc.0)
        }
    }

    fn uniform_1_i32(&self, location: u32, x: i32) {
        let loc = glow::NativeUniformLocation(location);
        unsafe { HasContext::uniform_1_i32(self, Some(&loc), x) }
    }

    fn uniform_1_f32(&self, location: u32, x: f32) {
        let loc = glow::NativeUniformLocation(location);
        unsafe { HasContext::uniform_1_f32(self, Some(&loc), x) }
    }

    fn uniform_2_f32(&self, location: u32, x: f32, y: f32) {
        let loc = glow::NativeUniformLocation(location);
        unsafe { HasContext::uniform_2_f32(self, Some(&loc), x, y) }
    }

    fn uniform_3_f32(&self, location: u32, x: f32, y: f32, z: f32) {
        let loc = glow::NativeUniformLocation(location);
        unsafe { HasContext::uniform_3_f32(self, Some(&loc), x, y, z) }
    }

    fn uniform_4_f32(&self, location: u32, x: f32, y: f32, z: f32, w: f32) {
        let loc = glow::NativeUniformLocation(location);
        unsafe { HasContext::uniform_4_f32(self, Some(&loc), x, y, z, w) }
    }

    fn uniform_matrix_4_f32(&self, location: u32, transpose: bool, matrix: &[f32; 16]) {
        let loc = glow::NativeUniformLocation(location);
        unsafe { self.uniform_matrix_4_f32_slice(Some(&loc), transpose, matrix) }
    }

    fn create_texture(&self) -> Result<GlName, String> {
        unsafe { HasContext::create_texture(self).map(|t| t.0) }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { HasContext::active_texture(self, unit) }
    }

    fn bind_texture(&self, target: u32, texture: Option<GlName>) {
        unsafe { HasContext::bind_texture(self, target, texture.map(glow::NativeTexture)) }
    }

    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    ) {
        unsafe {
            HasContext::tex_image_2d(
                self,
                target,
                level,
                internal_format,
                width,
                height,
                border,
                format,
                ty,
                glow::PixelUnpackData::Slice(pixels),
            )
        }
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { HasContext::tex_parameter_i32(self, target, parameter, value) }
    }

    fn generate_mipmap(&self, target: u32) {
        unsafe { HasContext::generate_mipmap(self, target) }
    }

    fn delete_texture(&self, texture: GlName) {
        unsafe { HasContext::delete_texture(self, glow::NativeTexture(texture)) }
    }

    fn enable(&self, capability: u32) {
        unsafe { HasContext::enable(self, capability) }
    }

    fn disable(&self, capability: u32) {
        unsafe { HasContext::disable(self, capability) }
    }

    fn blend_func(&self, src: u32, dst: u32) {
        unsafe { HasContext::blend_func(self, src, dst) }
    }

    fn depth_func(&self, func: u32) {
        unsafe { HasContext::depth_func(self, func) }
    }

    fn front_face(&self, mode: u32) {
        unsafe { HasContext::front_face(self, mode) }
    }

    fn cull_face(&self, mode: u32) {
        unsafe { HasContext::cull_face(self, mode) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { HasContext::clear_color(self, r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { HasContext::clear(self, mask) }
    }

    fn get_error(&self) -> u32 {
        unsafe { HasContext::get_error(self) }
    }

    fn version(&self) -> String {
        unsafe { self.get_parameter_string(glow::VERSION) }
    }
}
