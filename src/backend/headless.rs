use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Cursor;

use image::RgbaImage;
use log::{debug, info, warn};
use rodio::{Decoder, Source};
use serde::Deserialize;

use super::{
    AudioHandle, Backend, DrawCommand, FontId, FontInfo, MusicId, MusicInfo, Playback,
    SoundInfo, TextureId, TextureInfo, PIXELFORMAT_RGBA8,
};
use crate::constants::{
    FLAG_WINDOW_HIDDEN, FLAG_WINDOW_MINIMIZED, FLAG_WINDOW_UNFOCUSED, KEY_ESCAPE,
};
use crate::error::{Error, Result};
use crate::types::{Color, Rectangle, Vector2};

const DEFAULT_FONT: FontId = 0;
const DEFAULT_FONT_TEXTURE: TextureId = 1;
const DEFAULT_FONT_SIZE: i32 = 10;
const SAMPLE_RATE: u32 = 44100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadlessConfig {
    pub width: i32,
    pub height: i32,
    /// `WindowShouldClose` turns true after this many frames.
    pub max_frames: Option<u64>,
    /// Seconds each frame advances the clock by.
    pub frame_time: f32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            max_frames: None,
            frame_time: 1.0 / 60.0,
        }
    }
}

/// Load and unload counters, per resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub textures_loaded: u32,
    pub textures_unloaded: u32,
    pub fonts_loaded: u32,
    pub fonts_unloaded: u32,
    pub sounds_loaded: u32,
    pub sounds_unloaded: u32,
    pub music_loaded: u32,
    pub music_unloaded: u32,
}

#[derive(Default)]
struct Buttons {
    down: HashSet<i32>,
    prev: HashSet<i32>,
}

impl Buttons {
    fn pressed(&self, b: i32) -> bool {
        self.down.contains(&b) && !self.prev.contains(&b)
    }

    fn released(&self, b: i32) -> bool {
        !self.down.contains(&b) && self.prev.contains(&b)
    }

    fn down(&self, b: i32) -> bool {
        self.down.contains(&b)
    }

    fn advance(&mut self) {
        self.prev.clone_from(&self.down);
    }
}

struct Gamepad {
    name: String,
    buttons: Buttons,
    axes: Vec<f32>,
}

struct Voice {
    playing: bool,
    paused: bool,
    volume: f32,
    pitch: f32,
    frame_count: u32,
    sample_rate: u32,
    played: f32,
    looping: bool,
}

impl Voice {
    fn new(frame_count: u32, sample_rate: u32, looping: bool) -> Self {
        Self {
            playing: false,
            paused: false,
            volume: 1.0,
            pitch: 1.0,
            frame_count,
            sample_rate,
            played: 0.0,
            looping,
        }
    }

    fn length(&self) -> f32 {
        self.frame_count as f32 / self.sample_rate.max(1) as f32
    }
}

struct Texture {
    image: RgbaImage,
    filter: i32,
    wrap: i32,
}

struct State {
    config: HeadlessConfig,
    ready: bool,
    close_requested: bool,
    title: String,
    flags: u32,
    position: (i32, i32),
    min_size: (i32, i32),
    size: (i32, i32),
    resized: bool,
    opacity: f32,
    clipboard: String,

    frames: u64,
    time: f64,
    frame_time: f32,
    target_fps: i32,
    drawing: bool,
    commands: Vec<DrawCommand>,
    last_frame: Vec<DrawCommand>,
    clear_color: Color,
    shapes_texture: Option<(TextureId, Rectangle)>,

    cursor_hidden: bool,
    cursor_locked: bool,
    mouse_cursor: i32,

    keys: Buttons,
    key_queue: VecDeque<i32>,
    char_queue: VecDeque<char>,
    exit_key: i32,
    mouse: Buttons,
    mouse_pos: Vector2,
    mouse_prev: Vector2,
    mouse_offset: Vector2,
    mouse_scale: Vector2,
    wheel: Vector2,
    gamepads: HashMap<i32, Gamepad>,
    last_gamepad_button: i32,
    dropped: Vec<String>,

    next_id: u32,
    textures: HashMap<TextureId, Texture>,
    fonts: HashMap<FontId, FontInfo>,
    audio_ready: bool,
    master_volume: f32,
    sounds: HashMap<u32, Voice>,
    music: HashMap<u32, Voice>,
    stats: Stats,
}

/// Backend that renders nothing. It records what would have been drawn,
/// tracks resource handles and takes its input from the host.
pub struct Headless {
    state: RefCell<State>,
}

impl Default for Headless {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl Headless {
    pub fn new(config: HeadlessConfig) -> Self {
        let mut textures = HashMap::new();
        textures.insert(
            DEFAULT_FONT_TEXTURE,
            Texture {
                image: RgbaImage::new(128, 128),
                filter: 0,
                wrap: 0,
            },
        );
        let state = State {
            size: (config.width, config.height),
            frame_time: config.frame_time,
            config,
            ready: false,
            close_requested: false,
            title: String::new(),
            flags: 0,
            position: (0, 0),
            min_size: (0, 0),
            resized: false,
            opacity: 1.0,
            clipboard: String::new(),
            frames: 0,
            time: 0.0,
            target_fps: 0,
            drawing: false,
            commands: Vec::new(),
            last_frame: Vec::new(),
            clear_color: Color::BLACK,
            shapes_texture: None,
            cursor_hidden: false,
            cursor_locked: false,
            mouse_cursor: 0,
            keys: Buttons::default(),
            key_queue: VecDeque::new(),
            char_queue: VecDeque::new(),
            exit_key: KEY_ESCAPE,
            mouse: Buttons::default(),
            mouse_pos: Vector2::ZERO,
            mouse_prev: Vector2::ZERO,
            mouse_offset: Vector2::ZERO,
            mouse_scale: Vector2::new(1.0, 1.0),
            wheel: Vector2::ZERO,
            gamepads: HashMap::new(),
            last_gamepad_button: 0,
            dropped: Vec::new(),
            next_id: DEFAULT_FONT_TEXTURE + 1,
            textures,
            fonts: HashMap::new(),
            audio_ready: false,
            master_volume: 1.0,
            sounds: HashMap::new(),
            music: HashMap::new(),
            stats: Stats::default(),
        };
        Self {
            state: RefCell::new(state),
        }
    }

    pub fn press_key(&self, key: i32) {
        let mut s = self.state.borrow_mut();
        s.keys.down.insert(key);
        s.key_queue.push_back(key);
    }

    pub fn release_key(&self, key: i32) {
        self.state.borrow_mut().keys.down.remove(&key);
    }

    pub fn push_char(&self, c: char) {
        self.state.borrow_mut().char_queue.push_back(c);
    }

    pub fn press_mouse_button(&self, button: i32) {
        self.state.borrow_mut().mouse.down.insert(button);
    }

    pub fn release_mouse_button(&self, button: i32) {
        self.state.borrow_mut().mouse.down.remove(&button);
    }

    pub fn move_mouse(&self, x: f32, y: f32) {
        self.state.borrow_mut().mouse_pos = Vector2::new(x, y);
    }

    pub fn scroll(&self, dx: f32, dy: f32) {
        let mut s = self.state.borrow_mut();
        s.wheel = Vector2::new(s.wheel.x + dx, s.wheel.y + dy);
    }

    pub fn connect_gamepad(&self, gamepad: i32, name: &str, axes: usize) {
        self.state.borrow_mut().gamepads.insert(
            gamepad,
            Gamepad {
                name: name.to_owned(),
                buttons: Buttons::default(),
                axes: vec![0.0; axes],
            },
        );
    }

    pub fn press_gamepad_button(&self, gamepad: i32, button: i32) {
        let s = &mut *self.state.borrow_mut();
        if let Some(pad) = s.gamepads.get_mut(&gamepad) {
            pad.buttons.down.insert(button);
            s.last_gamepad_button = button;
        }
    }

    pub fn release_gamepad_button(&self, gamepad: i32, button: i32) {
        if let Some(pad) = self.state.borrow_mut().gamepads.get_mut(&gamepad) {
            pad.buttons.down.remove(&button);
        }
    }

    pub fn move_gamepad_axis(&self, gamepad: i32, axis: usize, value: f32) {
        if let Some(slot) = self
            .state
            .borrow_mut()
            .gamepads
            .get_mut(&gamepad)
            .and_then(|pad| pad.axes.get_mut(axis))
        {
            *slot = value;
        }
    }

    pub fn drop_files<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .borrow_mut()
            .dropped
            .extend(paths.into_iter().map(Into::into));
    }

    pub fn request_close(&self) {
        self.state.borrow_mut().close_requested = true;
    }

    /// Commands recorded since the last `EndDrawing`.
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.state.borrow().commands.clone()
    }

    /// Commands of the last completed frame.
    pub fn last_frame(&self) -> Vec<DrawCommand> {
        self.state.borrow().last_frame.clone()
    }

    pub fn frames(&self) -> u64 {
        self.state.borrow().frames
    }

    pub fn title(&self) -> String {
        self.state.borrow().title.clone()
    }

    pub fn stats(&self) -> Stats {
        self.state.borrow().stats
    }

    pub fn live_textures(&self) -> usize {
        self.state
            .borrow()
            .textures
            .keys()
            .filter(|&&id| id != DEFAULT_FONT_TEXTURE)
            .count()
    }

    pub fn texture_filter(&self, id: TextureId) -> Option<(i32, i32)> {
        self.state
            .borrow()
            .textures
            .get(&id)
            .map(|t| (t.filter, t.wrap))
    }

    pub fn shapes_texture(&self) -> Option<(TextureId, Rectangle)> {
        self.state.borrow().shapes_texture
    }

    pub fn mouse_cursor(&self) -> i32 {
        self.state.borrow().mouse_cursor
    }

    pub fn master_volume(&self) -> f32 {
        self.state.borrow().master_volume
    }

    pub fn window_position(&self) -> (i32, i32) {
        self.state.borrow().position
    }

    pub fn window_opacity(&self) -> f32 {
        self.state.borrow().opacity
    }

    pub fn target_fps(&self) -> i32 {
        self.state.borrow().target_fps
    }

    pub fn is_drawing(&self) -> bool {
        self.state.borrow().drawing
    }

    /// Volume and pitch of a loaded sound or music stream.
    pub fn voice_params(&self, handle: AudioHandle) -> Option<(f32, f32)> {
        self.state
            .borrow_mut()
            .voice(handle)
            .map(|v| (v.volume, v.pitch))
    }
}

impl State {
    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn advance_input(&mut self) {
        self.keys.advance();
        self.mouse.advance();
        for pad in self.gamepads.values_mut() {
            pad.buttons.advance();
        }
        self.key_queue.clear();
        self.char_queue.clear();
        self.mouse_prev = self.mouse_pos;
        self.wheel = Vector2::ZERO;
        self.resized = false;
    }

    fn voice(&mut self, handle: AudioHandle) -> Option<&mut Voice> {
        match handle {
            AudioHandle::Sound(id) => self.sounds.get_mut(&id),
            AudioHandle::Music(id) => self.music.get_mut(&id),
        }
    }

    fn font_size(&self, font: FontId) -> i32 {
        self.fonts
            .get(&font)
            .map_or(DEFAULT_FONT_SIZE, |f| f.base_size)
    }

    fn add_texture(&mut self, image: RgbaImage) -> TextureInfo {
        let id = self.next_id();
        let info = TextureInfo {
            id,
            width: image.width() as i32,
            height: image.height() as i32,
            mipmaps: 1,
            format: PIXELFORMAT_RGBA8,
        };
        self.textures.insert(
            id,
            Texture {
                image,
                filter: 0,
                wrap: 0,
            },
        );
        self.stats.textures_loaded += 1;
        info
    }
}

/// Frame count and sample rate of an encoded audio blob.
fn pcm_info(file_type: &str, data: &[u8]) -> Result<(u32, u32)> {
    let decoder = Decoder::new(Cursor::new(data.to_vec())).map_err(|source| Error::Audio {
        file_type: file_type.to_owned(),
        source,
    })?;
    let channels: u16 = decoder.channels().into();
    let rate: u32 = decoder.sample_rate().into();
    let frames = decoder.count() / usize::from(channels.max(1));
    Ok((frames as u32, rate))
}

impl Backend for Headless {
    fn init_window(&self, width: i32, height: i32, title: &str) {
        let mut s = self.state.borrow_mut();
        if width > 0 && height > 0 {
            s.size = (width, height);
        }
        s.title = title.to_owned();
        s.ready = true;
        info!("window opened: {}x{} \"{}\"", s.size.0, s.size.1, title);
    }

    fn close_window(&self) {
        let mut s = self.state.borrow_mut();
        s.ready = false;
        info!("window closed after {} frames", s.frames);
    }

    fn is_window_ready(&self) -> bool {
        self.state.borrow().ready
    }

    fn window_should_close(&self) -> bool {
        let s = self.state.borrow();
        s.close_requested
            || (s.exit_key != 0 && s.keys.pressed(s.exit_key))
            || s.config.max_frames.is_some_and(|max| s.frames >= max)
    }

    fn window_flags(&self) -> u32 {
        self.state.borrow().flags
    }

    fn set_window_flags(&self, flags: u32) {
        self.state.borrow_mut().flags |= flags;
    }

    fn clear_window_flags(&self, flags: u32) {
        self.state.borrow_mut().flags &= !flags;
    }

    fn is_window_focused(&self) -> bool {
        let flags = self.state.borrow().flags;
        flags & (FLAG_WINDOW_UNFOCUSED | FLAG_WINDOW_HIDDEN | FLAG_WINDOW_MINIMIZED) == 0
    }

    fn is_window_resized(&self) -> bool {
        self.state.borrow().resized
    }

    fn set_window_icon(&self, icon: &RgbaImage) {
        debug!("window icon set ({}x{})", icon.width(), icon.height());
    }

    fn set_window_title(&self, title: &str) {
        self.state.borrow_mut().title = title.to_owned();
    }

    fn set_window_position(&self, x: i32, y: i32) {
        self.state.borrow_mut().position = (x, y);
    }

    fn set_window_min_size(&self, width: i32, height: i32) {
        self.state.borrow_mut().min_size = (width, height);
    }

    fn set_window_size(&self, width: i32, height: i32) {
        let mut s = self.state.borrow_mut();
        let size = (width.max(s.min_size.0), height.max(s.min_size.1));
        if size != s.size {
            s.size = size;
            s.resized = true;
        }
    }

    fn set_window_opacity(&self, opacity: f32) {
        self.state.borrow_mut().opacity = opacity.clamp(0.0, 1.0);
    }

    fn screen_size(&self) -> (i32, i32) {
        self.state.borrow().size
    }

    fn render_size(&self) -> (i32, i32) {
        self.state.borrow().size
    }

    fn set_clipboard_text(&self, text: &str) {
        self.state.borrow_mut().clipboard = text.to_owned();
    }

    fn clipboard_text(&self) -> String {
        self.state.borrow().clipboard.clone()
    }

    fn begin_drawing(&self) {
        let mut s = self.state.borrow_mut();
        s.drawing = true;
        s.commands.clear();
    }

    fn end_drawing(&self) {
        {
            let s = &mut *self.state.borrow_mut();
            s.drawing = false;
            s.last_frame = std::mem::take(&mut s.commands);
            s.frames += 1;
            s.time += s.frame_time as f64;
        }
        self.poll_input_events();
    }

    fn swap_screen_buffer(&self) {
        let s = &mut *self.state.borrow_mut();
        s.last_frame = std::mem::take(&mut s.commands);
    }

    fn poll_input_events(&self) {
        self.state.borrow_mut().advance_input();
    }

    fn wait_time(&self, seconds: f64) {
        if seconds > 0.0 {
            self.state.borrow_mut().time += seconds;
        }
    }

    fn set_cursor_hidden(&self, hidden: bool) {
        self.state.borrow_mut().cursor_hidden = hidden;
    }

    fn is_cursor_hidden(&self) -> bool {
        self.state.borrow().cursor_hidden
    }

    fn set_cursor_locked(&self, locked: bool) {
        let mut s = self.state.borrow_mut();
        s.cursor_locked = locked;
        s.cursor_hidden = locked;
    }

    fn is_cursor_on_screen(&self) -> bool {
        let s = self.state.borrow();
        let p = s.mouse_pos;
        !s.cursor_locked && p.x >= 0.0 && p.y >= 0.0 && p.x < s.size.0 as f32 && p.y < s.size.1 as f32
    }

    fn set_mouse_cursor(&self, cursor: i32) {
        self.state.borrow_mut().mouse_cursor = cursor;
    }

    fn set_target_fps(&self, fps: i32) {
        let mut s = self.state.borrow_mut();
        s.target_fps = fps;
        s.frame_time = if fps > 0 {
            1.0 / fps as f32
        } else {
            s.config.frame_time
        };
    }

    fn fps(&self) -> i32 {
        let ft = self.state.borrow().frame_time;
        if ft > 0.0 {
            (1.0 / ft).round() as i32
        } else {
            0
        }
    }

    fn frame_time(&self) -> f32 {
        self.state.borrow().frame_time
    }

    fn time(&self) -> f64 {
        self.state.borrow().time
    }

    fn is_key_pressed(&self, key: i32) -> bool {
        self.state.borrow().keys.pressed(key)
    }

    fn is_key_down(&self, key: i32) -> bool {
        self.state.borrow().keys.down(key)
    }

    fn is_key_released(&self, key: i32) -> bool {
        self.state.borrow().keys.released(key)
    }

    fn set_exit_key(&self, key: i32) {
        self.state.borrow_mut().exit_key = key;
    }

    fn key_pressed(&self) -> i32 {
        self.state.borrow_mut().key_queue.pop_front().unwrap_or(0)
    }

    fn char_pressed(&self) -> i32 {
        self.state
            .borrow_mut()
            .char_queue
            .pop_front()
            .map_or(0, |c| c as i32)
    }

    fn is_gamepad_available(&self, gamepad: i32) -> bool {
        self.state.borrow().gamepads.contains_key(&gamepad)
    }

    fn gamepad_name(&self, gamepad: i32) -> Option<String> {
        self.state
            .borrow()
            .gamepads
            .get(&gamepad)
            .map(|pad| pad.name.clone())
    }

    fn is_gamepad_button_pressed(&self, gamepad: i32, button: i32) -> bool {
        self.state
            .borrow()
            .gamepads
            .get(&gamepad)
            .is_some_and(|pad| pad.buttons.pressed(button))
    }

    fn is_gamepad_button_down(&self, gamepad: i32, button: i32) -> bool {
        self.state
            .borrow()
            .gamepads
            .get(&gamepad)
            .is_some_and(|pad| pad.buttons.down(button))
    }

    fn is_gamepad_button_released(&self, gamepad: i32, button: i32) -> bool {
        self.state
            .borrow()
            .gamepads
            .get(&gamepad)
            .is_some_and(|pad| pad.buttons.released(button))
    }

    fn gamepad_button_pressed(&self) -> i32 {
        self.state.borrow().last_gamepad_button
    }

    fn gamepad_axis_count(&self, gamepad: i32) -> i32 {
        self.state
            .borrow()
            .gamepads
            .get(&gamepad)
            .map_or(0, |pad| pad.axes.len() as i32)
    }

    fn gamepad_axis_movement(&self, gamepad: i32, axis: i32) -> f32 {
        let s = self.state.borrow();
        usize::try_from(axis)
            .ok()
            .and_then(|axis| s.gamepads.get(&gamepad)?.axes.get(axis).copied())
            .unwrap_or(0.0)
    }

    fn is_mouse_button_pressed(&self, button: i32) -> bool {
        self.state.borrow().mouse.pressed(button)
    }

    fn is_mouse_button_down(&self, button: i32) -> bool {
        self.state.borrow().mouse.down(button)
    }

    fn is_mouse_button_released(&self, button: i32) -> bool {
        self.state.borrow().mouse.released(button)
    }

    fn mouse_position(&self) -> Vector2 {
        let s = self.state.borrow();
        Vector2::new(
            (s.mouse_pos.x + s.mouse_offset.x) * s.mouse_scale.x,
            (s.mouse_pos.y + s.mouse_offset.y) * s.mouse_scale.y,
        )
    }

    fn mouse_delta(&self) -> Vector2 {
        let s = self.state.borrow();
        (s.mouse_pos.vec() - s.mouse_prev.vec()).into()
    }

    fn set_mouse_position(&self, x: i32, y: i32) {
        let mut s = self.state.borrow_mut();
        s.mouse_pos = Vector2::new(x as f32, y as f32);
        s.mouse_prev = s.mouse_pos;
    }

    fn set_mouse_offset(&self, x: i32, y: i32) {
        self.state.borrow_mut().mouse_offset = Vector2::new(x as f32, y as f32);
    }

    fn set_mouse_scale(&self, x: f32, y: f32) {
        self.state.borrow_mut().mouse_scale = Vector2::new(x, y);
    }

    fn mouse_wheel_move(&self) -> Vector2 {
        self.state.borrow().wheel
    }

    fn is_file_dropped(&self) -> bool {
        !self.state.borrow().dropped.is_empty()
    }

    fn take_dropped_files(&self) -> Vec<String> {
        std::mem::take(&mut self.state.borrow_mut().dropped)
    }

    fn draw(&self, cmd: DrawCommand) {
        let mut s = self.state.borrow_mut();
        if let DrawCommand::Clear(color) = cmd {
            s.clear_color = color;
        }
        s.commands.push(cmd);
    }

    fn set_shapes_texture(&self, texture: TextureId, source: Rectangle) {
        self.state.borrow_mut().shapes_texture = Some((texture, source));
    }

    fn load_image_from_screen(&self) -> RgbaImage {
        let s = self.state.borrow();
        let (w, h) = s.size;
        RgbaImage::from_pixel(w.max(0) as u32, h.max(0) as u32, s.clear_color.into())
    }

    fn load_texture(&self, image: &RgbaImage) -> Result<TextureInfo> {
        let info = self.state.borrow_mut().add_texture(image.clone());
        debug!("texture {} loaded ({}x{})", info.id, info.width, info.height);
        Ok(info)
    }

    fn update_texture(&self, id: TextureId, image: &RgbaImage) -> Result<()> {
        let mut s = self.state.borrow_mut();
        let tex = s
            .textures
            .get_mut(&id)
            .ok_or(Error::UnknownHandle { kind: "texture", id })?;
        if tex.image.dimensions() != image.dimensions() {
            warn!("texture {id}: update with mismatched size ignored");
            return Ok(());
        }
        tex.image = image.clone();
        Ok(())
    }

    fn texture_image(&self, id: TextureId) -> Result<RgbaImage> {
        self.state
            .borrow()
            .textures
            .get(&id)
            .map(|t| t.image.clone())
            .ok_or(Error::UnknownHandle { kind: "texture", id })
    }

    fn gen_texture_mipmaps(&self, id: TextureId) -> Result<i32> {
        let s = self.state.borrow();
        let tex = s
            .textures
            .get(&id)
            .ok_or(Error::UnknownHandle { kind: "texture", id })?;
        let (w, h) = tex.image.dimensions();
        Ok((32 - w.max(h).max(1).leading_zeros()) as i32)
    }

    fn set_texture_filter(&self, id: TextureId, filter: i32) {
        if let Some(tex) = self.state.borrow_mut().textures.get_mut(&id) {
            tex.filter = filter;
        }
    }

    fn set_texture_wrap(&self, id: TextureId, wrap: i32) {
        if let Some(tex) = self.state.borrow_mut().textures.get_mut(&id) {
            tex.wrap = wrap;
        }
    }

    fn unload_texture(&self, id: TextureId) {
        if id == DEFAULT_FONT_TEXTURE {
            return;
        }
        let mut s = self.state.borrow_mut();
        if s.textures.remove(&id).is_some() {
            s.stats.textures_unloaded += 1;
            debug!("texture {id} unloaded");
        } else {
            warn!("texture {id} unloaded twice or never loaded");
        }
    }

    fn default_font(&self) -> FontInfo {
        FontInfo {
            id: DEFAULT_FONT,
            base_size: DEFAULT_FONT_SIZE,
            glyph_count: 224,
            glyph_padding: 0,
            texture: TextureInfo {
                id: DEFAULT_FONT_TEXTURE,
                width: 128,
                height: 128,
                mipmaps: 1,
                format: PIXELFORMAT_RGBA8,
            },
        }
    }

    fn load_font(&self, file_type: &str, data: &[u8], size: i32) -> Result<FontInfo> {
        if data.is_empty() {
            warn!("font ({file_type}): empty data, falling back to the default font");
            return Ok(self.default_font());
        }
        let mut s = self.state.borrow_mut();
        let size = if size > 0 { size } else { 32 };
        let texture = s.add_texture(RgbaImage::new(512, 512));
        let id = s.next_id();
        let info = FontInfo {
            id,
            base_size: size,
            glyph_count: 95,
            glyph_padding: 4,
            texture,
        };
        s.fonts.insert(id, info);
        s.stats.fonts_loaded += 1;
        debug!("font {id} loaded ({file_type}, size {size})");
        Ok(info)
    }

    fn unload_font(&self, id: FontId) {
        if id == DEFAULT_FONT {
            return;
        }
        let texture = {
            let mut s = self.state.borrow_mut();
            let Some(font) = s.fonts.remove(&id) else {
                warn!("font {id} unloaded twice or never loaded");
                return;
            };
            s.stats.fonts_unloaded += 1;
            font.texture.id
        };
        debug!("font {id} unloaded");
        self.unload_texture(texture);
    }

    fn measure_text(&self, font: FontId, text: &str, size: f32, spacing: f32) -> Vector2 {
        let base = self.state.borrow().font_size(font) as f32;
        let scale = size / base;
        let advance = base * 0.5 * scale;
        let mut width = 0.0f32;
        let mut lines = 0;
        for line in text.split('\n') {
            let n = line.chars().count() as f32;
            let w = if n > 0.0 {
                n * advance + (n - 1.0) * spacing
            } else {
                0.0
            };
            width = width.max(w);
            lines += 1;
        }
        Vector2::new(width, size * lines as f32)
    }

    fn init_audio_device(&self) {
        self.state.borrow_mut().audio_ready = true;
        info!("audio device ready ({SAMPLE_RATE} Hz)");
    }

    fn close_audio_device(&self) {
        self.state.borrow_mut().audio_ready = false;
        info!("audio device closed");
    }

    fn is_audio_device_ready(&self) -> bool {
        self.state.borrow().audio_ready
    }

    fn set_master_volume(&self, volume: f32) {
        self.state.borrow_mut().master_volume = volume.clamp(0.0, 1.0);
    }

    fn load_sound(&self, file_type: &str, data: &[u8]) -> Result<SoundInfo> {
        let (frame_count, rate) = pcm_info(file_type, data)?;
        let mut s = self.state.borrow_mut();
        let id = s.next_id();
        s.sounds.insert(id, Voice::new(frame_count, rate, false));
        s.stats.sounds_loaded += 1;
        debug!("sound {id} loaded ({file_type}, {frame_count} frames)");
        Ok(SoundInfo { id, frame_count })
    }

    fn load_music(&self, file_type: &str, data: &[u8]) -> Result<MusicInfo> {
        let (frame_count, rate) = pcm_info(file_type, data)?;
        let mut s = self.state.borrow_mut();
        let id = s.next_id();
        s.music.insert(id, Voice::new(frame_count, rate, true));
        s.stats.music_loaded += 1;
        debug!("music {id} loaded ({file_type}, {frame_count} frames)");
        Ok(MusicInfo {
            id,
            frame_count,
            looping: true,
        })
    }

    fn playback(&self, handle: AudioHandle, op: Playback) {
        let mut s = self.state.borrow_mut();
        let Some(voice) = s.voice(handle) else {
            warn!("{handle:?}: playback on unknown handle");
            return;
        };
        match op {
            Playback::Play => {
                voice.playing = true;
                voice.paused = false;
                voice.played = 0.0;
            }
            Playback::Stop => {
                voice.playing = false;
                voice.paused = false;
                voice.played = 0.0;
            }
            Playback::Pause if voice.playing => voice.paused = true,
            Playback::Resume => voice.paused = false,
            Playback::Pause => {}
        }
    }

    fn is_playing(&self, handle: AudioHandle) -> bool {
        self.state
            .borrow_mut()
            .voice(handle)
            .is_some_and(|v| v.playing && !v.paused)
    }

    fn set_volume(&self, handle: AudioHandle, volume: f32) {
        if let Some(voice) = self.state.borrow_mut().voice(handle) {
            voice.volume = volume;
        }
    }

    fn set_pitch(&self, handle: AudioHandle, pitch: f32) {
        if let Some(voice) = self.state.borrow_mut().voice(handle) {
            voice.pitch = pitch;
        }
    }

    fn update_music(&self, id: MusicId) {
        let mut s = self.state.borrow_mut();
        let step = s.frame_time;
        let Some(voice) = s.music.get_mut(&id) else {
            return;
        };
        if !voice.playing || voice.paused {
            return;
        }
        let length = voice.length();
        voice.played += step * voice.pitch;
        if voice.played >= length {
            if voice.looping && length > 0.0 {
                voice.played %= length;
            } else {
                voice.playing = false;
                voice.played = 0.0;
            }
        }
    }

    fn set_music_looping(&self, id: MusicId, looping: bool) {
        if let Some(voice) = self.state.borrow_mut().music.get_mut(&id) {
            voice.looping = looping;
        }
    }

    fn music_time_length(&self, id: MusicId) -> f32 {
        self.state.borrow().music.get(&id).map_or(0.0, Voice::length)
    }

    fn music_time_played(&self, id: MusicId) -> f32 {
        self.state.borrow().music.get(&id).map_or(0.0, |v| v.played)
    }

    fn unload_audio(&self, handle: AudioHandle) {
        let mut s = self.state.borrow_mut();
        let removed = match handle {
            AudioHandle::Sound(id) => {
                let hit = s.sounds.remove(&id).is_some();
                if hit {
                    s.stats.sounds_unloaded += 1;
                }
                hit
            }
            AudioHandle::Music(id) => {
                let hit = s.music.remove(&id).is_some();
                if hit {
                    s.stats.music_unloaded += 1;
                }
                hit
            }
        };
        if removed {
            debug!("{handle:?} unloaded");
        } else {
            warn!("{handle:?} unloaded twice or never loaded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_edges_follow_frames() {
        let hl = Headless::default();
        hl.press_key(65);
        assert!(hl.is_key_pressed(65) && hl.is_key_down(65));
        assert_eq!(hl.key_pressed(), 65);
        assert_eq!(hl.key_pressed(), 0);
        hl.end_drawing();
        assert!(!hl.is_key_pressed(65) && hl.is_key_down(65));
        hl.release_key(65);
        assert!(hl.is_key_released(65));
        hl.poll_input_events();
        assert!(!hl.is_key_released(65));
    }

    #[test]
    fn max_frames_closes_window() {
        let hl = Headless::new(HeadlessConfig {
            max_frames: Some(2),
            ..HeadlessConfig::default()
        });
        assert!(!hl.window_should_close());
        hl.end_drawing();
        assert!(!hl.window_should_close());
        hl.end_drawing();
        assert!(hl.window_should_close());
    }

    #[test]
    fn escape_closes_window() {
        let hl = Headless::default();
        hl.press_key(KEY_ESCAPE);
        assert!(hl.window_should_close());
    }

    #[test]
    fn texture_unload_is_counted_once() {
        let hl = Headless::default();
        let tex = hl.load_texture(&RgbaImage::new(4, 4)).unwrap();
        hl.unload_texture(tex.id);
        hl.unload_texture(tex.id);
        let stats = hl.stats();
        assert_eq!((stats.textures_loaded, stats.textures_unloaded), (1, 1));
    }

    #[test]
    fn default_font_is_never_unloaded() {
        let hl = Headless::default();
        let font = hl.default_font();
        hl.unload_font(font.id);
        hl.unload_texture(font.texture.id);
        assert!(hl.texture_image(font.texture.id).is_ok());
        assert_eq!(hl.stats(), Stats::default());
    }

    /// 16-bit PCM WAV of silence.
    fn wav(channels: u16, rate: u32, frames: u32) -> Vec<u8> {
        let block = u32::from(channels) * 2;
        let len = frames * block;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&(rate * block).to_le_bytes());
        out.extend_from_slice(&(block as u16).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&len.to_le_bytes());
        out.resize(out.len() + len as usize, 0);
        out
    }

    #[test]
    fn decoded_audio_gives_frame_count() {
        assert_eq!(pcm_info(".wav", &wav(1, 22050, 100)).unwrap(), (100, 22050));
        assert_eq!(pcm_info(".wav", &wav(2, 44100, 441)).unwrap(), (441, 44100));
    }

    #[test]
    fn undecodable_audio_is_an_error() {
        let hl = Headless::default();
        assert!(matches!(hl.load_sound(".ogg", &[0; 40]), Err(Error::Audio { .. })));
        assert_eq!(hl.stats().sounds_loaded, 0);
    }

    #[test]
    fn music_loops_or_stops() {
        let hl = Headless::new(HeadlessConfig {
            frame_time: 0.5,
            ..HeadlessConfig::default()
        });
        let music = hl.load_music(".wav", &wav(2, 44100, 44100)).unwrap();
        hl.playback(AudioHandle::Music(music.id), Playback::Play);
        hl.update_music(music.id);
        hl.update_music(music.id);
        hl.update_music(music.id);
        assert!((hl.music_time_played(music.id) - 0.5).abs() < 1e-4);

        hl.set_music_looping(music.id, false);
        hl.update_music(music.id);
        assert!(!hl.is_playing(AudioHandle::Music(music.id)));
    }
}
