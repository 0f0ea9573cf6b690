use mlua::{AnyUserData, FromLua, Lua, Value, Variadic};

use super::clamp_component;
use crate::dispatch::TypeDef;
use crate::instance::{self, Bound};
use crate::{bound_value, insert_function};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

bound_value!(Color);

impl Default for Color {
    fn default() -> Self {
        Self::BLANK
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(px: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = px.0;
        Self { r, g, b, a }
    }
}

impl From<Color> for image::Rgba<u8> {
    fn from(c: Color) -> Self {
        image::Rgba([c.r, c.g, c.b, c.a])
    }
}

macro_rules! def_component {
    ($($name:ident),+) => {
        paste::paste! {
            $(
                fn [<lm_get_ $name>](_: &Lua, this: AnyUserData) -> mlua::Result<i64> {
                    instance::with(&this, |this: &Self| this.$name as i64)
                }

                fn [<lm_set_ $name>](_: &Lua, (this, value): (AnyUserData, f64)) -> mlua::Result<()> {
                    instance::modify(&this, |this: &mut Self| this.$name = clamp_component(value))
                }
            )+
        }
    };
}

impl Color {
    pub const BLANK: Self = Self::rgba(0, 0, 0, 0);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn fade(self, alpha: f32) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            a: (255.0 * alpha) as u8,
            ..self
        }
    }

    /// Normalised components, `0.0..=1.0`.
    pub fn normalize(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as f32 / 255.0)
    }

    pub fn from_normalized([r, g, b, a]: [f32; 4]) -> Self {
        let c = |v: f32| clamp_component((v * 255.0) as f64);
        Self::rgba(c(r), c(g), c(b), c(a))
    }

    pub fn l_new(lua: &Lua, args: Variadic<Value>) -> mlua::Result<Self> {
        let component = |v: &Value| f64::from_lua(v.clone(), lua).map(clamp_component);
        match args.as_slice() {
            [other] => Self::from_lua(other.clone(), lua),
            [r, g, b] => Ok(Self::rgba(component(r)?, component(g)?, component(b)?, 255)),
            [r, g, b, a] => Ok(Self::rgba(
                component(r)?,
                component(g)?,
                component(b)?,
                component(a)?,
            )),
            _ => Err(mlua::Error::runtime("wrong number of arguments")),
        }
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Color(r = {}, g = {}, b = {}, a = {})",
            this.r, this.g, this.b, this.a
        ))
    }

    fn lm_eq(_: &Lua, (this, other): (Self, Value)) -> mlua::Result<bool> {
        Ok(instance::test::<Self>(&other).is_some_and(|other| other == this))
    }

    fn lm_fade(_: &Lua, (this, alpha): (Self, f32)) -> mlua::Result<Self> {
        Ok(this.fade(alpha))
    }

    def_component!(r, g, b, a);
}

impl Bound for Color {
    const NAME: &'static str = "Color";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_function!(lua, def, "__eq", Self::lm_eq);
        insert_function!(lua, def, "Fade", Self::lm_fade);
        insert_function!(lua, def, "?r", Self::lm_get_r);
        insert_function!(lua, def, "=r", Self::lm_set_r);
        insert_function!(lua, def, "?g", Self::lm_get_g);
        insert_function!(lua, def, "=g", Self::lm_set_g);
        insert_function!(lua, def, "?b", Self::lm_get_b);
        insert_function!(lua, def, "=b", Self::lm_set_b);
        insert_function!(lua, def, "?a", Self::lm_get_a);
        insert_function!(lua, def, "=a", Self::lm_set_a);
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn fade_clamps_alpha() {
        let c = Color::rgba(10, 20, 30, 255);
        assert_eq!(c.fade(0.5).a, 127);
        assert_eq!(c.fade(2.0).a, 255);
        assert_eq!(c.fade(-1.0).a, 0);
        assert_eq!(c.fade(0.5).r, 10);
    }
}
