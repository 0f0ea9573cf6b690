use mlua::{Lua, Table};

use crate::types::Color;

macro_rules! constants {
    ($table:ident: $ty:ty { $($name:ident = $value:expr),+ $(,)? }) => {
        $(pub const $name: $ty = $value;)+
        const $table: &[(&str, $ty)] = &[$((stringify!($name), $name)),+];
    };
}

constants!(KEYS: i32 {
    KEY_NULL = 0,
    KEY_APOSTROPHE = 39,
    KEY_COMMA = 44,
    KEY_MINUS = 45,
    KEY_PERIOD = 46,
    KEY_SLASH = 47,
    KEY_ZERO = 48,
    KEY_ONE = 49,
    KEY_TWO = 50,
    KEY_THREE = 51,
    KEY_FOUR = 52,
    KEY_FIVE = 53,
    KEY_SIX = 54,
    KEY_SEVEN = 55,
    KEY_EIGHT = 56,
    KEY_NINE = 57,
    KEY_SEMICOLON = 59,
    KEY_EQUAL = 61,
    KEY_A = 65,
    KEY_B = 66,
    KEY_C = 67,
    KEY_D = 68,
    KEY_E = 69,
    KEY_F = 70,
    KEY_G = 71,
    KEY_H = 72,
    KEY_I = 73,
    KEY_J = 74,
    KEY_K = 75,
    KEY_L = 76,
    KEY_M = 77,
    KEY_N = 78,
    KEY_O = 79,
    KEY_P = 80,
    KEY_Q = 81,
    KEY_R = 82,
    KEY_S = 83,
    KEY_T = 84,
    KEY_U = 85,
    KEY_V = 86,
    KEY_W = 87,
    KEY_X = 88,
    KEY_Y = 89,
    KEY_Z = 90,
    KEY_LEFT_BRACKET = 91,
    KEY_BACKSLASH = 92,
    KEY_RIGHT_BRACKET = 93,
    KEY_GRAVE = 96,
    KEY_SPACE = 32,
    KEY_ESCAPE = 256,
    KEY_ENTER = 257,
    KEY_TAB = 258,
    KEY_BACKSPACE = 259,
    KEY_INSERT = 260,
    KEY_DELETE = 261,
    KEY_RIGHT = 262,
    KEY_LEFT = 263,
    KEY_DOWN = 264,
    KEY_UP = 265,
    KEY_PAGE_UP = 266,
    KEY_PAGE_DOWN = 267,
    KEY_HOME = 268,
    KEY_END = 269,
    KEY_CAPS_LOCK = 280,
    KEY_SCROLL_LOCK = 281,
    KEY_NUM_LOCK = 282,
    KEY_PRINT_SCREEN = 283,
    KEY_PAUSE = 284,
    KEY_F1 = 290,
    KEY_F2 = 291,
    KEY_F3 = 292,
    KEY_F4 = 293,
    KEY_F5 = 294,
    KEY_F6 = 295,
    KEY_F7 = 296,
    KEY_F8 = 297,
    KEY_F9 = 298,
    KEY_F10 = 299,
    KEY_F11 = 300,
    KEY_F12 = 301,
    KEY_LEFT_SHIFT = 340,
    KEY_LEFT_CONTROL = 341,
    KEY_LEFT_ALT = 342,
    KEY_LEFT_SUPER = 343,
    KEY_RIGHT_SHIFT = 344,
    KEY_RIGHT_CONTROL = 345,
    KEY_RIGHT_ALT = 346,
    KEY_RIGHT_SUPER = 347,
    KEY_KB_MENU = 348,
    KEY_KP_0 = 320,
    KEY_KP_1 = 321,
    KEY_KP_2 = 322,
    KEY_KP_3 = 323,
    KEY_KP_4 = 324,
    KEY_KP_5 = 325,
    KEY_KP_6 = 326,
    KEY_KP_7 = 327,
    KEY_KP_8 = 328,
    KEY_KP_9 = 329,
    KEY_KP_DECIMAL = 330,
    KEY_KP_DIVIDE = 331,
    KEY_KP_MULTIPLY = 332,
    KEY_KP_SUBTRACT = 333,
    KEY_KP_ADD = 334,
    KEY_KP_ENTER = 335,
    KEY_KP_EQUAL = 336,
    KEY_BACK = 4,
    KEY_MENU = 82,
    KEY_VOLUME_UP = 24,
    KEY_VOLUME_DOWN = 25,
});

constants!(MOUSE: i32 {
    MOUSE_BUTTON_LEFT = 0,
    MOUSE_BUTTON_RIGHT = 1,
    MOUSE_BUTTON_MIDDLE = 2,
    MOUSE_BUTTON_SIDE = 3,
    MOUSE_BUTTON_EXTRA = 4,
    MOUSE_BUTTON_FORWARD = 5,
    MOUSE_BUTTON_BACK = 6,
    MOUSE_CURSOR_DEFAULT = 0,
    MOUSE_CURSOR_ARROW = 1,
    MOUSE_CURSOR_IBEAM = 2,
    MOUSE_CURSOR_CROSSHAIR = 3,
    MOUSE_CURSOR_POINTING_HAND = 4,
    MOUSE_CURSOR_RESIZE_EW = 5,
    MOUSE_CURSOR_RESIZE_NS = 6,
    MOUSE_CURSOR_RESIZE_NWSE = 7,
    MOUSE_CURSOR_RESIZE_NESW = 8,
    MOUSE_CURSOR_RESIZE_ALL = 9,
    MOUSE_CURSOR_NOT_ALLOWED = 10,
});

constants!(GAMEPAD: i32 {
    GAMEPAD_BUTTON_UNKNOWN = 0,
    GAMEPAD_BUTTON_LEFT_FACE_UP = 1,
    GAMEPAD_BUTTON_LEFT_FACE_RIGHT = 2,
    GAMEPAD_BUTTON_LEFT_FACE_DOWN = 3,
    GAMEPAD_BUTTON_LEFT_FACE_LEFT = 4,
    GAMEPAD_BUTTON_RIGHT_FACE_UP = 5,
    GAMEPAD_BUTTON_RIGHT_FACE_RIGHT = 6,
    GAMEPAD_BUTTON_RIGHT_FACE_DOWN = 7,
    GAMEPAD_BUTTON_RIGHT_FACE_LEFT = 8,
    GAMEPAD_BUTTON_LEFT_TRIGGER_1 = 9,
    GAMEPAD_BUTTON_LEFT_TRIGGER_2 = 10,
    GAMEPAD_BUTTON_RIGHT_TRIGGER_1 = 11,
    GAMEPAD_BUTTON_RIGHT_TRIGGER_2 = 12,
    GAMEPAD_BUTTON_MIDDLE_LEFT = 13,
    GAMEPAD_BUTTON_MIDDLE = 14,
    GAMEPAD_BUTTON_MIDDLE_RIGHT = 15,
    GAMEPAD_BUTTON_LEFT_THUMB = 16,
    GAMEPAD_BUTTON_RIGHT_THUMB = 17,
    GAMEPAD_AXIS_LEFT_X = 0,
    GAMEPAD_AXIS_LEFT_Y = 1,
    GAMEPAD_AXIS_RIGHT_X = 2,
    GAMEPAD_AXIS_RIGHT_Y = 3,
    GAMEPAD_AXIS_LEFT_TRIGGER = 4,
    GAMEPAD_AXIS_RIGHT_TRIGGER = 5,
});

constants!(FLAGS: u32 {
    FLAG_VSYNC_HINT = 0x0000_0040,
    FLAG_FULLSCREEN_MODE = 0x0000_0002,
    FLAG_WINDOW_RESIZABLE = 0x0000_0004,
    FLAG_WINDOW_UNDECORATED = 0x0000_0008,
    FLAG_WINDOW_HIDDEN = 0x0000_0080,
    FLAG_WINDOW_MINIMIZED = 0x0000_0200,
    FLAG_WINDOW_MAXIMIZED = 0x0000_0400,
    FLAG_WINDOW_UNFOCUSED = 0x0000_0800,
    FLAG_WINDOW_TOPMOST = 0x0000_1000,
    FLAG_WINDOW_ALWAYS_RUN = 0x0000_0100,
    FLAG_WINDOW_TRANSPARENT = 0x0000_0010,
    FLAG_WINDOW_HIGHDPI = 0x0000_2000,
    FLAG_WINDOW_MOUSE_PASSTHROUGH = 0x0000_4000,
    FLAG_MSAA_4X_HINT = 0x0000_0020,
    FLAG_INTERLACED_HINT = 0x0001_0000,
});

constants!(MODES: i32 {
    BLEND_ALPHA = 0,
    BLEND_ADDITIVE = 1,
    BLEND_MULTIPLIED = 2,
    BLEND_ADD_COLORS = 3,
    BLEND_SUBTRACT_COLORS = 4,
    BLEND_ALPHA_PREMULTIPLY = 5,
    BLEND_CUSTOM = 6,
    TEXTURE_FILTER_POINT = 0,
    TEXTURE_FILTER_BILINEAR = 1,
    TEXTURE_FILTER_TRILINEAR = 2,
    TEXTURE_FILTER_ANISOTROPIC_4X = 3,
    TEXTURE_FILTER_ANISOTROPIC_8X = 4,
    TEXTURE_FILTER_ANISOTROPIC_16X = 5,
    TEXTURE_WRAP_REPEAT = 0,
    TEXTURE_WRAP_CLAMP = 1,
    TEXTURE_WRAP_MIRROR_REPEAT = 2,
    TEXTURE_WRAP_MIRROR_CLAMP = 3,
    CAMERA_PERSPECTIVE = 0,
    CAMERA_ORTHOGRAPHIC = 1,
    PIXELFORMAT_UNCOMPRESSED_R8G8B8A8 = 7,
});

constants!(PALETTE: Color {
    LIGHTGRAY = Color::rgba(200, 200, 200, 255),
    GRAY = Color::rgba(130, 130, 130, 255),
    DARKGRAY = Color::rgba(80, 80, 80, 255),
    YELLOW = Color::rgba(253, 249, 0, 255),
    GOLD = Color::rgba(255, 203, 0, 255),
    ORANGE = Color::rgba(255, 161, 0, 255),
    PINK = Color::rgba(255, 109, 194, 255),
    RED = Color::rgba(230, 41, 55, 255),
    MAROON = Color::rgba(190, 33, 55, 255),
    GREEN = Color::rgba(0, 228, 48, 255),
    LIME = Color::rgba(0, 158, 47, 255),
    DARKGREEN = Color::rgba(0, 117, 44, 255),
    SKYBLUE = Color::rgba(102, 191, 255, 255),
    BLUE = Color::rgba(0, 121, 241, 255),
    DARKBLUE = Color::rgba(0, 82, 172, 255),
    PURPLE = Color::rgba(200, 122, 255, 255),
    VIOLET = Color::rgba(135, 60, 190, 255),
    DARKPURPLE = Color::rgba(112, 31, 126, 255),
    BEIGE = Color::rgba(211, 176, 131, 255),
    BROWN = Color::rgba(127, 106, 79, 255),
    DARKBROWN = Color::rgba(76, 63, 47, 255),
    WHITE = Color::WHITE,
    BLACK = Color::BLACK,
    BLANK = Color::BLANK,
    MAGENTA = Color::rgba(255, 0, 255, 255),
    RAYWHITE = Color::rgba(245, 245, 245, 255),
});

/// Export every constant as a global. Colors are fresh owned instances, so
/// scripts mutating `RED.r` only change their own global.
pub fn register(_: &Lua, globals: &Table) -> mlua::Result<()> {
    for table in [KEYS, MOUSE, GAMEPAD, MODES] {
        for &(name, value) in table {
            globals.set(name, value)?;
        }
    }
    for &(name, value) in FLAGS {
        globals.set(name, value)?;
    }
    for &(name, color) in PALETTE {
        globals.set(name, color)?;
    }
    Ok(())
}
