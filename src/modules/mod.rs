//! Global functions, one submodule per area of the library.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use mlua::{Lua, Table, Value};

use crate::backend::Backend;
use crate::error::Error;
use crate::instance;
use crate::insert_global;
use crate::types::{Camera2D, Camera3D, Color, Rectangle, Vector2, Vector3};

/// Register a global that forwards to the backend. The closure gets its own
/// handle on the backend.
macro_rules! insert_backend {
    ($lua:ident, $table:ident, $backend:ident, $name:expr, |$b:ident, $args:tt: $ty:ty| $body:expr) => {{
        let $b = ::std::rc::Rc::clone($backend);
        $crate::insert_global!($lua, $table, $name, move |_, $args: $ty| Ok($body));
    }};
}

mod audio;
mod core;
mod files;
mod shapes;
mod text;
mod textures;

/// Most points a list argument may hold.
pub const MAX_POINTS: usize = 1024;

/// Read a sequence of `Vector2`. The list ends at the first entry that is
/// not a `Vector2`.
pub fn check_points(list: &Table) -> mlua::Result<Vec<Vector2>> {
    let mut points = Vec::new();
    for value in list.clone().sequence_values::<Value>() {
        match instance::test::<Vector2>(&value?) {
            Some(p) if points.len() < MAX_POINTS => points.push(p),
            _ => break,
        }
    }
    Ok(points)
}

/// Contents of a file the script asked for, or `NotFound`.
pub fn read_file(path: &str) -> crate::Result<Vec<u8>> {
    let file = Path::new(path);
    if !file.is_file() {
        return Err(Error::NotFound(file.to_owned()));
    }
    Ok(fs::read(file)?)
}

/// Extension the loaders key their decoder on, without the dot.
pub fn file_type(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
}

pub fn register(lua: &Lua, globals: &Table, backend: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_global!(lua, globals, "Vector2", Vector2::l_new);
    insert_global!(lua, globals, "Vector3", Vector3::l_new);
    insert_global!(lua, globals, "Color", Color::l_new);
    insert_global!(lua, globals, "Rectangle", Rectangle::l_new);
    insert_global!(lua, globals, "Camera2D", Camera2D::l_new);
    insert_global!(lua, globals, "Camera3D", Camera3D::l_new);

    core::register(lua, globals, backend)?;
    files::register(lua, globals, backend)?;
    shapes::register(lua, globals, backend)?;
    textures::register(lua, globals, backend)?;
    text::register(lua, globals, backend)?;
    audio::register(lua, globals, backend)?;
    Ok(())
}
