//! The native library seam.
//!
//! Bindings never talk to a renderer or mixer directly. They go through a
//! [`Backend`] stored in the Lua state's app data, which lets the same
//! bindings run against a real window or against [`Headless`].

mod headless;

pub use headless::{Headless, HeadlessConfig, Stats};

use std::rc::Rc;

use image::RgbaImage;
use mlua::Lua;

use crate::error::Result;
use crate::types::{Camera2D, Camera3D, Color, Rectangle, Vector2};

pub type TextureId = u32;
pub type FontId = u32;
pub type SoundId = u32;
pub type MusicId = u32;

pub use crate::constants::PIXELFORMAT_UNCOMPRESSED_R8G8B8A8 as PIXELFORMAT_RGBA8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub id: TextureId,
    pub width: i32,
    pub height: i32,
    pub mipmaps: i32,
    pub format: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontInfo {
    pub id: FontId,
    pub base_size: i32,
    pub glyph_count: i32,
    pub glyph_padding: i32,
    pub texture: TextureInfo,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundInfo {
    pub id: SoundId,
    pub frame_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicInfo {
    pub id: MusicId,
    pub frame_count: u32,
    pub looping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioHandle {
    Sound(SoundId),
    Music(MusicId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Play,
    Stop,
    Pause,
    Resume,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    BeginMode2D(Camera2D),
    EndMode2D,
    BeginMode3D(Camera3D),
    EndMode3D,
    BeginBlendMode(i32),
    EndBlendMode,
    BeginScissor(Rectangle),
    EndScissor,
    Pixel {
        position: Vector2,
        color: Color,
    },
    Line {
        start: Vector2,
        end: Vector2,
        thick: f32,
        color: Color,
    },
    /// Quadratic with one control point, cubic with two, none for the
    /// default ease curve.
    Bezier {
        start: Vector2,
        end: Vector2,
        controls: Vec<Vector2>,
        thick: f32,
        color: Color,
    },
    LineStrip {
        points: Vec<Vector2>,
        color: Color,
    },
    Circle {
        center: Vector2,
        radius: f32,
        inner: Color,
        outer: Color,
        outline: bool,
    },
    CircleSector {
        center: Vector2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        segments: i32,
        color: Color,
        outline: bool,
    },
    Ellipse {
        center: Vector2,
        radius_h: f32,
        radius_v: f32,
        color: Color,
        outline: bool,
    },
    Ring {
        center: Vector2,
        inner_radius: f32,
        outer_radius: f32,
        start_angle: f32,
        end_angle: f32,
        segments: i32,
        color: Color,
        outline: bool,
    },
    /// Corner colors run top-left, bottom-left, bottom-right, top-right.
    Rectangle {
        rec: Rectangle,
        origin: Vector2,
        rotation: f32,
        colors: [Color; 4],
    },
    RectangleLines {
        rec: Rectangle,
        thick: f32,
        color: Color,
    },
    RectangleRounded {
        rec: Rectangle,
        roundness: f32,
        segments: i32,
        thick: Option<f32>,
        color: Color,
    },
    Triangle {
        points: [Vector2; 3],
        color: Color,
        outline: bool,
    },
    TriangleFan {
        points: Vec<Vector2>,
        color: Color,
    },
    TriangleStrip {
        points: Vec<Vector2>,
        color: Color,
    },
    Poly {
        center: Vector2,
        sides: i32,
        radius: f32,
        rotation: f32,
        thick: Option<f32>,
        color: Color,
    },
    Texture {
        id: TextureId,
        source: Rectangle,
        dest: Rectangle,
        origin: Vector2,
        rotation: f32,
        tint: Color,
    },
    Text {
        font: FontId,
        text: String,
        position: Vector2,
        origin: Vector2,
        rotation: f32,
        size: f32,
        spacing: f32,
        color: Color,
    },
}

/// What the bindings need from the native library. Methods take `&self`;
/// implementations keep their state behind interior mutability.
pub trait Backend {
    // window
    fn init_window(&self, width: i32, height: i32, title: &str);
    fn close_window(&self);
    fn is_window_ready(&self) -> bool;
    fn window_should_close(&self) -> bool;
    fn window_flags(&self) -> u32;
    fn set_window_flags(&self, flags: u32);
    fn clear_window_flags(&self, flags: u32);
    fn is_window_focused(&self) -> bool;
    fn is_window_resized(&self) -> bool;
    fn set_window_icon(&self, icon: &RgbaImage);
    fn set_window_title(&self, title: &str);
    fn set_window_position(&self, x: i32, y: i32);
    fn set_window_min_size(&self, width: i32, height: i32);
    fn set_window_size(&self, width: i32, height: i32);
    fn set_window_opacity(&self, opacity: f32);
    fn screen_size(&self) -> (i32, i32);
    fn render_size(&self) -> (i32, i32);
    fn set_clipboard_text(&self, text: &str);
    fn clipboard_text(&self) -> String;

    // frame
    fn begin_drawing(&self);
    fn end_drawing(&self);
    fn swap_screen_buffer(&self);
    fn poll_input_events(&self);
    fn wait_time(&self, seconds: f64);

    // cursor
    fn set_cursor_hidden(&self, hidden: bool);
    fn is_cursor_hidden(&self) -> bool;
    fn set_cursor_locked(&self, locked: bool);
    fn is_cursor_on_screen(&self) -> bool;
    fn set_mouse_cursor(&self, cursor: i32);

    // timing
    fn set_target_fps(&self, fps: i32);
    fn fps(&self) -> i32;
    fn frame_time(&self) -> f32;
    fn time(&self) -> f64;

    // keyboard
    fn is_key_pressed(&self, key: i32) -> bool;
    fn is_key_down(&self, key: i32) -> bool;
    fn is_key_released(&self, key: i32) -> bool;
    fn set_exit_key(&self, key: i32);
    fn key_pressed(&self) -> i32;
    fn char_pressed(&self) -> i32;

    // gamepad
    fn is_gamepad_available(&self, gamepad: i32) -> bool;
    fn gamepad_name(&self, gamepad: i32) -> Option<String>;
    fn is_gamepad_button_pressed(&self, gamepad: i32, button: i32) -> bool;
    fn is_gamepad_button_down(&self, gamepad: i32, button: i32) -> bool;
    fn is_gamepad_button_released(&self, gamepad: i32, button: i32) -> bool;
    fn gamepad_button_pressed(&self) -> i32;
    fn gamepad_axis_count(&self, gamepad: i32) -> i32;
    fn gamepad_axis_movement(&self, gamepad: i32, axis: i32) -> f32;

    // mouse
    fn is_mouse_button_pressed(&self, button: i32) -> bool;
    fn is_mouse_button_down(&self, button: i32) -> bool;
    fn is_mouse_button_released(&self, button: i32) -> bool;
    fn mouse_position(&self) -> Vector2;
    fn mouse_delta(&self) -> Vector2;
    fn set_mouse_position(&self, x: i32, y: i32);
    fn set_mouse_offset(&self, x: i32, y: i32);
    fn set_mouse_scale(&self, x: f32, y: f32);
    fn mouse_wheel_move(&self) -> Vector2;

    // dropped files
    fn is_file_dropped(&self) -> bool;
    fn take_dropped_files(&self) -> Vec<String>;

    // drawing
    fn draw(&self, cmd: DrawCommand);
    fn set_shapes_texture(&self, texture: TextureId, source: Rectangle);
    fn load_image_from_screen(&self) -> RgbaImage;

    // textures
    fn load_texture(&self, image: &RgbaImage) -> Result<TextureInfo>;
    fn update_texture(&self, id: TextureId, image: &RgbaImage) -> Result<()>;
    fn texture_image(&self, id: TextureId) -> Result<RgbaImage>;
    fn gen_texture_mipmaps(&self, id: TextureId) -> Result<i32>;
    fn set_texture_filter(&self, id: TextureId, filter: i32);
    fn set_texture_wrap(&self, id: TextureId, wrap: i32);
    fn unload_texture(&self, id: TextureId);

    // fonts
    fn default_font(&self) -> FontInfo;
    fn load_font(&self, file_type: &str, data: &[u8], size: i32) -> Result<FontInfo>;
    fn unload_font(&self, id: FontId);
    fn measure_text(&self, font: FontId, text: &str, size: f32, spacing: f32) -> Vector2;

    // audio
    fn init_audio_device(&self);
    fn close_audio_device(&self);
    fn is_audio_device_ready(&self) -> bool;
    fn set_master_volume(&self, volume: f32);
    fn load_sound(&self, file_type: &str, data: &[u8]) -> Result<SoundInfo>;
    fn load_music(&self, file_type: &str, data: &[u8]) -> Result<MusicInfo>;
    fn playback(&self, handle: AudioHandle, op: Playback);
    fn is_playing(&self, handle: AudioHandle) -> bool;
    fn set_volume(&self, handle: AudioHandle, volume: f32);
    fn set_pitch(&self, handle: AudioHandle, pitch: f32);
    fn update_music(&self, id: MusicId);
    fn set_music_looping(&self, id: MusicId, looping: bool);
    fn music_time_length(&self, id: MusicId) -> f32;
    fn music_time_played(&self, id: MusicId) -> f32;
    fn unload_audio(&self, handle: AudioHandle);
}

/// The backend installed in `lua`.
pub fn backend(lua: &Lua) -> mlua::Result<Rc<dyn Backend>> {
    lua.app_data_ref::<Rc<dyn Backend>>()
        .map(|b| Rc::clone(&*b))
        .ok_or_else(|| mlua::Error::runtime("no backend installed"))
}
