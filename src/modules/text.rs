use std::rc::Rc;

use mlua::{Lua, Table};

use super::{file_type, read_file};
use crate::backend::{Backend, DrawCommand, FontId};
use crate::constants::{LIME, ORANGE, RED};
use crate::insert_global;
use crate::types::{Color, Font, Vector2};

/// Smallest size the default font is drawn or measured at.
const MIN_DEFAULT_SIZE: f32 = 10.0;

/// Size requested by `LoadFont`.
const LOAD_SIZE: i32 = 32;

/// Size requested by `LoadFontFromString` when none is given.
const STRING_SIZE: i32 = 20;

fn default_size(size: f32) -> f32 {
    size.max(MIN_DEFAULT_SIZE)
}

struct Label<'a> {
    font: FontId,
    text: &'a str,
    position: Vector2,
    size: f32,
    spacing: f32,
    color: Color,
}

impl Label<'_> {
    fn rotated(self, origin: Vector2, rotation: f32) -> DrawCommand {
        DrawCommand::Text {
            font: self.font,
            text: self.text.to_owned(),
            position: self.position,
            origin,
            rotation,
            size: self.size,
            spacing: self.spacing,
            color: self.color,
        }
    }

    fn command(self) -> DrawCommand {
        self.rotated(Vector2::ZERO, 0.0)
    }
}

/// Text in the default font, sized the way the library sizes it.
fn default_label(b: &dyn Backend, text: &str, x: f32, y: f32, size: f32, color: Color) -> DrawCommand {
    let size = default_size(size);
    Label {
        font: b.default_font().id,
        text,
        position: Vector2::new(x.trunc(), y.trunc()),
        size,
        spacing: size / MIN_DEFAULT_SIZE,
        color,
    }
    .command()
}

fn fps_color(fps: i32) -> Color {
    match fps {
        f if f < 15 => RED,
        f if f < 30 => ORANGE,
        _ => LIME,
    }
}

pub fn register(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_backend!(lua, g, rl, "GetFontDefault", |b, (): ()| Font::new(b.default_font(), Rc::clone(&b)));
    let b = Rc::clone(rl);
    insert_global!(lua, g, "LoadFont", move |_, path: String| {
        let data = read_file(&path)?;
        let info = b.load_font(file_type(&path), &data, LOAD_SIZE)?;
        Ok(Font::new(info, Rc::clone(&b)))
    });
    insert_backend!(
        lua, g, rl, "LoadFontFromString",
        |b, (file_type, data, size): (String, mlua::String, Option<i32>)| {
            let info = b.load_font(&file_type, &data.as_bytes(), size.unwrap_or(STRING_SIZE))?;
            Font::new(info, Rc::clone(&b))
        }
    );

    insert_backend!(lua, g, rl, "DrawFPS", |b, (x, y): (f32, f32)| {
        let fps = b.fps();
        b.draw(default_label(&*b, &format!("{fps} FPS"), x, y, 20.0, fps_color(fps)))
    });
    insert_backend!(
        lua, g, rl, "DrawText",
        |b, (text, x, y, size, color): (String, f32, f32, f32, Color)| {
            b.draw(default_label(&*b, &text, x, y, size, color))
        }
    );
    insert_backend!(
        lua, g, rl, "DrawTextEx",
        |b, (font, text, position, size, spacing, color): (Font, String, Vector2, f32, f32, Color)| {
            b.draw(Label { font: font.id(), text: &text, position, size, spacing, color }.command())
        }
    );
    insert_backend!(
        lua, g, rl, "DrawTextPro",
        |b, (font, text, position, origin, rotation, size, spacing, color):
            (Font, String, Vector2, Vector2, f32, f32, f32, Color)| {
            let label = Label { font: font.id(), text: &text, position, size, spacing, color };
            b.draw(label.rotated(origin, rotation))
        }
    );
    insert_backend!(
        lua, g, rl, "DrawTextCodepoint",
        |b, (font, codepoint, position, size, color): (Font, u32, Vector2, f32, Color)| {
            let text = char::from_u32(codepoint).unwrap_or('?').to_string();
            b.draw(Label { font: font.id(), text: &text, position, size, spacing: 0.0, color }.command())
        }
    );

    insert_backend!(lua, g, rl, "MeasureText", |b, (text, size): (String, f32)| {
        let size = default_size(size);
        b.measure_text(b.default_font().id, &text, size, size / MIN_DEFAULT_SIZE).x as i32
    });
    insert_backend!(
        lua, g, rl, "MeasureTextEx",
        |b, (font, text, size, spacing): (Font, String, f32, f32)| {
            b.measure_text(font.id(), &text, size, spacing)
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_color_degrades() {
        assert_eq!(fps_color(60), LIME);
        assert_eq!(fps_color(20), ORANGE);
        assert_eq!(fps_color(5), RED);
    }

    #[test]
    fn default_font_has_a_floor() {
        assert_eq!(default_size(4.0), MIN_DEFAULT_SIZE);
        assert_eq!(default_size(24.0), 24.0);
    }
}
