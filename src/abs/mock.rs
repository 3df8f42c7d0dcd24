//! A [`Gpu`] that records calls instead of talking to a driver.
//!
//! Names are handed out sequentially starting at 1. A shader whose source
//! contains [`SYNTAX_ERROR`] fails to compile. A program with nothing attached,
//! or with a stage containing [`LINK_ERROR`], fails to link; one with a stage
//! containing [`VALIDATE_ERROR`] links but fails validation. Only the uniforms passed to [`RecordingGpu::with_uniforms`]
//! resolve to a location.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroU32;
use std::sync::Mutex;

use super::gpu::{GlName, Gpu};

pub const SYNTAX_ERROR: &str = "SYNTAX ERROR";
pub const LINK_ERROR: &str = "LINK ERROR";
pub const VALIDATE_ERROR: &str = "VALIDATE ERROR";

/// Info log reported for a program that failed to link.
pub const LINK_LOG: &str = "error: undefined reference to `main' in vertex stage";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(u32),
    BindBuffer(u32, Option<u32>),
    BufferData { target: u32, len: usize, usage: u32 },
    DeleteBuffer(u32),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    DrawElements { mode: u32, count: i32, element_type: u32 },
    CreateShader { shader: u32, stage: u32 },
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    ValidateProgram(u32),
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    UniformLocation(String),
    UniformWrite(u32),
    UniformMatrix(u32, [f32; 16]),
    CreateTexture(u32),
    ActiveTexture(u32),
    BindTexture(u32, Option<u32>),
    TexImage2d { target: u32, level: i32, width: i32, height: i32, len: usize },
    TexParameter(u32, u32, i32),
    GenerateMipmap(u32),
    DeleteTexture(u32),
    Enable(u32),
    Disable(u32),
    Clear(u32),
    ClearColor([f32; 4]),
    Viewport(i32, i32, i32, i32),
    Other(&'static str),
}

#[derive(Default)]
struct State {
    next_name: u32,
    calls: Vec<Call>,
    sources: HashMap<u32, String>,
    attached: HashMap<u32, Vec<u32>>,
    uniforms: Vec<String>,
    errors: VecDeque<u32>,
}

#[derive(Default)]
pub struct RecordingGpu {
    state: Mutex<State>,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// A GPU whose linked programs expose exactly these uniforms.
    pub fn with_uniforms(names: &[&str]) -> Self {
        let gpu = Self::new();
        gpu.state.lock().unwrap().uniforms = names.iter().map(|n| n.to_string()).collect();
        gpu
    }

    pub fn push_error(&self, code: u32) {
        self.state.lock().unwrap().errors.push_back(code);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    /// Shaders attached to `program`, in attachment order.
    pub fn attached(&self, program: GlName) -> Vec<u32> {
        self.state
            .lock()
            .unwrap()
            .attached
            .get(&program.get())
            .cloned()
            .unwrap_or_default()
    }

    /// Whether any stage attached to `program` has `marker` in its source.
    fn attached_source_contains(&self, program: GlName, marker: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.attached.get(&program.get()).is_some_and(|shaders| {
            shaders
                .iter()
                .any(|s| state.sources.get(s).is_some_and(|src| src.contains(marker)))
        })
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn allocate(&self) -> GlName {
        let mut state = self.state.lock().unwrap();
        state.next_name += 1;
        NonZeroU32::new(state.next_name).unwrap()
    }
}

impl Gpu for RecordingGpu {
    fn create_buffer(&self) -> Result<GlName, String> {
        let name = self.allocate();
        self.record(Call::CreateBuffer(name.get()));
        Ok(name)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<GlName>) {
        self.record(Call::BindBuffer(target, buffer.map(|b| b.get())));
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        self.record(Call::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    fn delete_buffer(&self, buffer: GlName) {
        self.record(Call::DeleteBuffer(buffer.get()));
    }

    fn create_vertex_array(&self) -> Result<GlName, String> {
        let name = self.allocate();
        self.record(Call::CreateVertexArray(name.get()));
        Ok(name)
    }

    fn bind_vertex_array(&self, vertex_array: Option<GlName>) {
        self.record(Call::BindVertexArray(vertex_array.map(|v| v.get())));
    }

    fn delete_vertex_array(&self, vertex_array: GlName) {
        self.record(Call::DeleteVertexArray(vertex_array.get()));
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(Call::EnableVertexAttribArray(index));
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
        self.record(Call::VertexAttribPointer {
            index,
            size,
            data_type,
            normalized,
            stride,
            offset,
        });
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, _offset: i32) {
        self.record(Call::DrawElements {
            mode,
            count,
            element_type,
        });
    }

    fn create_shader(&self, stage: u32) -> Result<GlName, String> {
        let name = self.allocate();
        self.record(Call::CreateShader {
            shader: name.get(),
            stage,
        });
        Ok(name)
    }

    fn shader_source(&self, shader: GlName, source: &str) {
        let mut state = self.state.lock().unwrap();
        state.sources.insert(shader.get(), source.to_string());
        state.calls.push(Call::Other("shader_source"));
    }

    fn compile_shader(&self, shader: GlName) {
        self.record(Call::CompileShader(shader.get()));
    }

    fn shader_compile_status(&self, shader: GlName) -> bool {
        let state = self.state.lock().unwrap();
        state
            .sources
            .get(&shader.get())
            .is_some_and(|src| !src.contains(SYNTAX_ERROR))
    }

    fn shader_info_log(&self, _shader: GlName) -> String {
        "0:1(1): error: syntax error, unexpected IDENTIFIER".to_string()
    }

    fn delete_shader(&self, shader: GlName) {
        self.record(Call::DeleteShader(shader.get()));
    }

    fn create_program(&self) -> Result<GlName, String> {
        let name = self.allocate();
        self.record(Call::CreateProgram(name.get()));
        Ok(name)
    }

    fn attach_shader(&self, program: GlName, shader: GlName) {
        let mut state = self.state.lock().unwrap();
        state
            .attached
            .entry(program.get())
            .or_default()
            .push(shader.get());
        state.calls.push(Call::AttachShader {
            program: program.get(),
            shader: shader.get(),
        });
    }

    fn link_program(&self, program: GlName) {
        self.record(Call::LinkProgram(program.get()));
    }

    fn program_link_status(&self, program: GlName) -> bool {
        let has_stages = self
            .state
            .lock()
            .unwrap()
            .attached
            .get(&program.get())
            .is_some_and(|shaders| !shaders.is_empty());
        has_stages && !self.attached_source_contains(program, LINK_ERROR)
    }

    fn validate_program(&self, program: GlName) {
        self.record(Call::ValidateProgram(program.get()));
    }

    fn program_validate_status(&self, program: GlName) -> bool {
        !self.attached_source_contains(program, VALIDATE_ERROR)
    }

    fn program_info_log(&self, program: GlName) -> String {
        if self.attached_source_contains(program, VALIDATE_ERROR) {
            "validation failed: sampler units conflict".to_string()
        } else {
            LINK_LOG.to_string()
        }
    }

    fn use_program(&self, program: Option<GlName>) {
        self.record(Call::UseProgram(program.map(|p| p.get())));
    }

    fn delete_program(&self, program: GlName) {
        self.record(Call::DeleteProgram(program.get()));
    }

    fn uniform_location(&self, _program: GlName, name: &str) -> Option<u32> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UniformLocation(name.to_string()));
        state
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| i as u32)
    }

    fn uniform_1_i32(&self, location: u32, _x: i32) {
        self.record(Call::UniformWrite(location));
    }

    fn uniform_1_f32(&self, location: u32, _x: f32) {
        self.record(Call::UniformWrite(location));
    }

    fn uniform_2_f32(&self, location: u32, _x: f32, _y: f32) {
        self.record(Call::UniformWrite(location));
    }

    fn uniform_3_f32(&self, location: u32, _x: f32, _y: f32, _z: f32) {
        self.record(Call::UniformWrite(location));
    }

    fn uniform_4_f32(&self, location: u32, _x: f32, _y: f32, _z: f32, _w: f32) {
        self.record(Call::UniformWrite(location));
    }

    fn uniform_matrix_4_f32(&self, location: u32, _transpose: bool, matrix: &[f32; 16]) {
        self.record(Call::UniformMatrix(location, *matrix));
    }

    fn create_texture(&self) -> Result<GlName, String> {
        let name = self.allocate();
        self.record(Call::CreateTexture(name.get()));
        Ok(name)
    }

    fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: u32, texture: Option<GlName>) {
        self.record(Call::BindTexture(target, texture.map(|t| t.get())));
    }

    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        _internal_format: i32,
        width: i32,
        height: i32,
        _border: i32,
        _format: u32,
        _ty: u32,
        pixels: Option<&[u8]>,
    ) {
        self.record(Call::TexImage2d {
            target,
            level,
            width,
            height,
            len: pixels.map_or(0, |p| p.len()),
        });
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        self.record(Call::TexParameter(target, parameter, value));
    }

    fn generate_mipmap(&self, target: u32) {
        self.record(Call::GenerateMipmap(target));
    }

    fn delete_texture(&self, texture: GlName) {
        self.record(Call::DeleteTexture(texture.get()));
    }

    fn enable(&self, capability: u32) {
        self.record(Call::Enable(capability));
    }

    fn disable(&self, capability: u32) {
        self.record(Call::Disable(capability));
    }

    fn blend_func(&self, _src: u32, _dst: u32) {
        self.record(Call::Other("blend_func"));
    }

    fn depth_func(&self, _func: u32) {
        self.record(Call::Other("depth_func"));
    }

    fn front_face(&self, _mode: u32) {
        self.record(Call::Other("front_face"));
    }

    fn cull_face(&self, _mode: u32) {
        self.record(Call::Other("cull_face"));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(Call::ClearColor([r, g, b, a]));
    }

    fn clear(&self, mask: u32) {
        self.record(Call::Clear(mask));
    }

    fn get_error(&self) -> u32 {
        self.state
            .lock()
            .unwrap()
            .errors
            .pop_front()
            .unwrap_or(glow::NO_ERROR)
    }

    fn version(&self) -> String {
        "3.3 (recording)".to_string()
    }
}
