use mlua::{FromLua, Lua, Value, Variadic};

use super::{fmt_number, Vector2};
use crate::dispatch::TypeDef;
use crate::instance::{self, Bound};
use crate::{bound_value, def_field, insert_field, insert_function};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

bound_value!(Rectangle);

impl Rectangle {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    pub fn contains(&self, p: Vector2) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    pub fn l_new(lua: &Lua, args: Variadic<Value>) -> mlua::Result<Self> {
        let n = |v: &Value| f32::from_lua(v.clone(), lua);
        match args.as_slice() {
            [] => Ok(Self::default()),
            [other] => Self::from_lua(other.clone(), lua),
            [x, y, w, h] => Ok(Self::new(n(x)?, n(y)?, n(w)?, n(h)?)),
            _ => Err(mlua::Error::runtime("wrong number of arguments")),
        }
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Rectangle(x = {}, y = {}, width = {}, height = {})",
            fmt_number(this.x as f64),
            fmt_number(this.y as f64),
            fmt_number(this.width as f64),
            fmt_number(this.height as f64)
        ))
    }

    fn lm_eq(_: &Lua, (this, other): (Self, Value)) -> mlua::Result<bool> {
        Ok(instance::test::<Self>(&other).is_some_and(|other| other == this))
    }

    def_field!(x: f32, y: f32, width: f32, height: f32);
}

impl Bound for Rectangle {
    const NAME: &'static str = "Rectangle";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_function!(lua, def, "__eq", Self::lm_eq);
        insert_field!(lua, def, x, y, width, height);
        Ok(def)
    }
}
