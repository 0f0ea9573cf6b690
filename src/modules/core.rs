use std::rc::Rc;

use mlua::{Lua, Table};

use crate::backend::{Backend, DrawCommand};
use crate::constants::{
    FLAG_FULLSCREEN_MODE, FLAG_WINDOW_HIDDEN, FLAG_WINDOW_MAXIMIZED, FLAG_WINDOW_MINIMIZED,
    KEY_NULL,
};
use crate::types::{Camera2D, Camera3D, Color, Image, Rectangle, Vector2};

pub fn register(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    window(lua, g, rl)?;
    frame(lua, g, rl)?;
    input(lua, g, rl)?;
    Ok(())
}

fn window(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_backend!(lua, g, rl, "InitWindow", |b, (w, h, title): (i32, i32, String)| b.init_window(w, h, &title));
    insert_backend!(lua, g, rl, "WindowShouldClose", |b, (): ()| b.window_should_close());
    insert_backend!(lua, g, rl, "CloseWindow", |b, (): ()| b.close_window());
    insert_backend!(lua, g, rl, "IsWindowReady", |b, (): ()| b.is_window_ready());
    insert_backend!(lua, g, rl, "IsWindowFullscreen", |b, (): ()| b.window_flags() & FLAG_FULLSCREEN_MODE != 0);
    insert_backend!(lua, g, rl, "IsWindowHidden", |b, (): ()| b.window_flags() & FLAG_WINDOW_HIDDEN != 0);
    insert_backend!(lua, g, rl, "IsWindowMinimized", |b, (): ()| b.window_flags() & FLAG_WINDOW_MINIMIZED != 0);
    insert_backend!(lua, g, rl, "IsWindowMaximized", |b, (): ()| b.window_flags() & FLAG_WINDOW_MAXIMIZED != 0);
    insert_backend!(lua, g, rl, "IsWindowFocused", |b, (): ()| b.is_window_focused());
    insert_backend!(lua, g, rl, "IsWindowResized", |b, (): ()| b.is_window_resized());
    insert_backend!(lua, g, rl, "IsWindowState", |b, flag: u32| b.window_flags() & flag != 0);
    insert_backend!(lua, g, rl, "SetWindowState", |b, flags: u32| b.set_window_flags(flags));
    insert_backend!(lua, g, rl, "ClearWindowState", |b, flags: u32| b.clear_window_flags(flags));
    insert_backend!(lua, g, rl, "ToggleFullscreen", |b, (): ()| {
        if b.window_flags() & FLAG_FULLSCREEN_MODE != 0 {
            b.clear_window_flags(FLAG_FULLSCREEN_MODE)
        } else {
            b.set_window_flags(FLAG_FULLSCREEN_MODE)
        }
    });
    insert_backend!(lua, g, rl, "MaximizeWindow", |b, (): ()| {
        b.clear_window_flags(FLAG_WINDOW_MINIMIZED);
        b.set_window_flags(FLAG_WINDOW_MAXIMIZED)
    });
    insert_backend!(lua, g, rl, "MinimizeWindow", |b, (): ()| {
        b.clear_window_flags(FLAG_WINDOW_MAXIMIZED);
        b.set_window_flags(FLAG_WINDOW_MINIMIZED)
    });
    insert_backend!(lua, g, rl, "RestoreWindow", |b, (): ()| {
        b.clear_window_flags(FLAG_WINDOW_MINIMIZED | FLAG_WINDOW_MAXIMIZED)
    });
    insert_backend!(lua, g, rl, "SetWindowIcon", |b, icon: Image| b.set_window_icon(&icon.pixels));
    insert_backend!(lua, g, rl, "SetWindowTitle", |b, title: String| b.set_window_title(&title));
    insert_backend!(lua, g, rl, "SetWindowPosition", |b, (x, y): (i32, i32)| b.set_window_position(x, y));
    insert_backend!(lua, g, rl, "SetWindowMinSize", |b, (w, h): (i32, i32)| b.set_window_min_size(w, h));
    insert_backend!(lua, g, rl, "SetWindowSize", |b, (w, h): (i32, i32)| b.set_window_size(w, h));
    insert_backend!(lua, g, rl, "SetWindowOpacity", |b, opacity: f32| b.set_window_opacity(opacity));
    insert_backend!(lua, g, rl, "GetScreenSize", |b, (): ()| b.screen_size());
    insert_backend!(lua, g, rl, "GetRenderSize", |b, (): ()| b.render_size());
    insert_backend!(lua, g, rl, "SetClipboardText", |b, text: String| b.set_clipboard_text(&text));
    insert_backend!(lua, g, rl, "GetClipboardText", |b, (): ()| b.clipboard_text());

    insert_backend!(lua, g, rl, "ShowCursor", |b, (): ()| b.set_cursor_hidden(false));
    insert_backend!(lua, g, rl, "HideCursor", |b, (): ()| b.set_cursor_hidden(true));
    insert_backend!(lua, g, rl, "IsCursorHidden", |b, (): ()| b.is_cursor_hidden());
    insert_backend!(lua, g, rl, "EnableCursor", |b, (): ()| b.set_cursor_locked(false));
    insert_backend!(lua, g, rl, "DisableCursor", |b, (): ()| b.set_cursor_locked(true));
    insert_backend!(lua, g, rl, "IsCursorOnScreen", |b, (): ()| b.is_cursor_on_screen());
    Ok(())
}

fn frame(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_backend!(lua, g, rl, "SwapScreenBuffer", |b, (): ()| b.swap_screen_buffer());
    insert_backend!(lua, g, rl, "PollInputEvents", |b, (): ()| b.poll_input_events());
    insert_backend!(lua, g, rl, "WaitTime", |b, seconds: f64| b.wait_time(seconds));

    insert_backend!(lua, g, rl, "ClearBackground", |b, color: Color| b.draw(DrawCommand::Clear(color)));
    insert_backend!(lua, g, rl, "BeginDrawing", |b, (): ()| b.begin_drawing());
    insert_backend!(lua, g, rl, "EndDrawing", |b, (): ()| b.end_drawing());
    insert_backend!(lua, g, rl, "BeginMode2D", |b, cam: Camera2D| b.draw(DrawCommand::BeginMode2D(cam)));
    insert_backend!(lua, g, rl, "EndMode2D", |b, (): ()| b.draw(DrawCommand::EndMode2D));
    insert_backend!(lua, g, rl, "BeginMode3D", |b, cam: Camera3D| b.draw(DrawCommand::BeginMode3D(cam)));
    insert_backend!(lua, g, rl, "EndMode3D", |b, (): ()| b.draw(DrawCommand::EndMode3D));
    insert_backend!(lua, g, rl, "BeginBlendMode", |b, mode: i32| b.draw(DrawCommand::BeginBlendMode(mode)));
    insert_backend!(lua, g, rl, "EndBlendMode", |b, (): ()| b.draw(DrawCommand::EndBlendMode));
    insert_backend!(lua, g, rl, "BeginScissorMode", |b, (x, y, w, h): (i32, i32, i32, i32)| {
        b.draw(DrawCommand::BeginScissor(Rectangle::new(x as f32, y as f32, w as f32, h as f32)))
    });
    insert_backend!(lua, g, rl, "EndScissorMode", |b, (): ()| b.draw(DrawCommand::EndScissor));

    insert_backend!(lua, g, rl, "SetTargetFPS", |b, fps: i32| b.set_target_fps(fps));
    insert_backend!(lua, g, rl, "GetFPS", |b, (): ()| b.fps());
    insert_backend!(lua, g, rl, "GetFrameTime", |b, (): ()| b.frame_time());
    insert_backend!(lua, g, rl, "GetTime", |b, (): ()| b.time());
    Ok(())
}

fn input(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_backend!(lua, g, rl, "IsKeyPressed", |b, key: i32| b.is_key_pressed(key));
    insert_backend!(lua, g, rl, "IsKeyDown", |b, key: i32| b.is_key_down(key));
    insert_backend!(lua, g, rl, "IsKeyReleased", |b, key: i32| b.is_key_released(key));
    insert_backend!(lua, g, rl, "IsKeyUp", |b, key: i32| !b.is_key_down(key));
    insert_backend!(lua, g, rl, "SetExitKey", |b, key: Option<i32>| b.set_exit_key(key.unwrap_or(KEY_NULL)));
    insert_backend!(lua, g, rl, "GetKeyPressed", |b, (): ()| b.key_pressed());
    insert_backend!(lua, g, rl, "GetCharPressed", |b, (): ()| b.char_pressed());

    insert_backend!(lua, g, rl, "IsGamepadAvailable", |b, pad: i32| b.is_gamepad_available(pad));
    insert_backend!(lua, g, rl, "GetGamepadName", |b, pad: i32| b.gamepad_name(pad));
    insert_backend!(lua, g, rl, "IsGamepadButtonPressed", |b, (pad, button): (i32, i32)| {
        b.is_gamepad_button_pressed(pad, button)
    });
    insert_backend!(lua, g, rl, "IsGamepadButtonDown", |b, (pad, button): (i32, i32)| {
        b.is_gamepad_button_down(pad, button)
    });
    insert_backend!(lua, g, rl, "IsGamepadButtonReleased", |b, (pad, button): (i32, i32)| {
        b.is_gamepad_button_released(pad, button)
    });
    insert_backend!(lua, g, rl, "IsGamepadButtonUp", |b, (pad, button): (i32, i32)| {
        !b.is_gamepad_button_down(pad, button)
    });
    insert_backend!(lua, g, rl, "GetGamepadButtonPressed", |b, (): ()| b.gamepad_button_pressed());
    insert_backend!(lua, g, rl, "GetGamepadAxisCount", |b, pad: i32| b.gamepad_axis_count(pad));
    insert_backend!(lua, g, rl, "GetGamepadAxisMovement", |b, (pad, axis): (i32, i32)| {
        b.gamepad_axis_movement(pad, axis)
    });

    insert_backend!(lua, g, rl, "IsMouseButtonPressed", |b, button: i32| b.is_mouse_button_pressed(button));
    insert_backend!(lua, g, rl, "IsMouseButtonDown", |b, button: i32| b.is_mouse_button_down(button));
    insert_backend!(lua, g, rl, "IsMouseButtonReleased", |b, button: i32| b.is_mouse_button_released(button));
    insert_backend!(lua, g, rl, "IsMouseButtonUp", |b, button: i32| !b.is_mouse_button_down(button));
    insert_backend!(lua, g, rl, "GetMousePosition", |b, (): ()| b.mouse_position());
    insert_backend!(lua, g, rl, "GetMouseDelta", |b, (): ()| b.mouse_delta());
    insert_backend!(lua, g, rl, "SetMousePosition", |b, p: Vector2| b.set_mouse_position(p.x as i32, p.y as i32));
    insert_backend!(lua, g, rl, "SetMouseOffset", |b, p: Vector2| b.set_mouse_offset(p.x as i32, p.y as i32));
    insert_backend!(lua, g, rl, "SetMouseScale", |b, p: Vector2| b.set_mouse_scale(p.x, p.y));
    insert_backend!(lua, g, rl, "GetMouseWheelMove", |b, (): ()| b.mouse_wheel_move());
    insert_backend!(lua, g, rl, "SetMouseCursor", |b, cursor: i32| b.set_mouse_cursor(cursor));
    Ok(())
}
