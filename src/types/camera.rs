use glam::{Affine2, Vec2};
use mlua::{AnyUserData, FromLua, Lua, Value, Variadic};

use super::{fmt_number, Vector2, Vector3};
use crate::constants::CAMERA_PERSPECTIVE;
use crate::dispatch::TypeDef;
use crate::instance::{self, Bound};
use crate::{bound_value, def_field, insert_field, insert_function};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub offset: Vector2,
    pub target: Vector2,
    pub rotation: f32,
    pub zoom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera3D {
    pub position: Vector3,
    pub target: Vector3,
    pub up: Vector3,
    pub fovy: f32,
    pub projection: i32,
}

bound_value!(Camera2D, Camera3D);

/// Reference reader and value writer for a nested bound field.
macro_rules! def_nested {
    ($($name:ident: $ty:ty),+ $(,)?) => {
        paste::paste! {
            $(
                fn [<lm_get_ $name>](lua: &Lua, this: AnyUserData) -> mlua::Result<AnyUserData> {
                    instance::push_field(lua, &this, |o: &Self| o.$name, |o: &mut Self, v: $ty| o.$name = v)
                }

                fn [<lm_set_ $name>](_: &Lua, (this, value): (AnyUserData, $ty)) -> mlua::Result<()> {
                    instance::modify(&this, |this: &mut Self| this.$name = value)
                }
            )+
        }
    };
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            offset: Vector2::ZERO,
            target: Vector2::ZERO,
            rotation: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera2D {
    /// World to screen transform.
    pub fn matrix(&self) -> Affine2 {
        Affine2::from_translation(self.offset.vec())
            * Affine2::from_angle(self.rotation.to_radians())
            * Affine2::from_scale(Vec2::splat(self.zoom))
            * Affine2::from_translation(-self.target.vec())
    }

    pub fn world_to_screen(&self, p: Vector2) -> Vector2 {
        self.matrix().transform_point2(p.vec()).into()
    }

    pub fn screen_to_world(&self, p: Vector2) -> Vector2 {
        self.matrix().inverse().transform_point2(p.vec()).into()
    }

    pub fn l_new(lua: &Lua, args: Variadic<Value>) -> mlua::Result<Self> {
        match args.as_slice() {
            [] => Ok(Self::default()),
            [other] => Self::from_lua(other.clone(), lua),
            [offset, target, rotation, zoom] => Ok(Self {
                offset: Vector2::from_lua(offset.clone(), lua)?,
                target: Vector2::from_lua(target.clone(), lua)?,
                rotation: f32::from_lua(rotation.clone(), lua)?,
                zoom: f32::from_lua(zoom.clone(), lua)?,
            }),
            _ => Err(mlua::Error::runtime("wrong number of arguments")),
        }
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Camera2D(offset = ({}, {}), target = ({}, {}), rotation = {}, zoom = {})",
            fmt_number(this.offset.x as f64),
            fmt_number(this.offset.y as f64),
            fmt_number(this.target.x as f64),
            fmt_number(this.target.y as f64),
            fmt_number(this.rotation as f64),
            fmt_number(this.zoom as f64)
        ))
    }

    fn lm_world_to_screen(_: &Lua, (this, p): (Self, Vector2)) -> mlua::Result<Vector2> {
        Ok(this.world_to_screen(p))
    }

    fn lm_screen_to_world(_: &Lua, (this, p): (Self, Vector2)) -> mlua::Result<Vector2> {
        Ok(this.screen_to_world(p))
    }

    def_nested!(offset: Vector2, target: Vector2);
    def_field!(rotation: f32, zoom: f32);
}

impl Bound for Camera2D {
    const NAME: &'static str = "Camera2D";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_function!(lua, def, "GetWorldToScreen", Self::lm_world_to_screen);
        insert_function!(lua, def, "GetScreenToWorld", Self::lm_screen_to_world);
        insert_field!(lua, def, offset, target, rotation, zoom);
        Ok(def)
    }
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            target: Vector3::ZERO,
            up: Vector3::new(0.0, 1.0, 0.0),
            fovy: 45.0,
            projection: CAMERA_PERSPECTIVE,
        }
    }
}

impl Camera3D {
    pub fn l_new(lua: &Lua, args: Variadic<Value>) -> mlua::Result<Self> {
        let v3 = |v: &Value| Vector3::from_lua(v.clone(), lua);
        match args.as_slice() {
            [] => Ok(Self::default()),
            [other] => Self::from_lua(other.clone(), lua),
            [position, target, up, fovy, rest @ ..] if rest.len() <= 1 => Ok(Self {
                position: v3(position)?,
                target: v3(target)?,
                up: v3(up)?,
                fovy: f32::from_lua(fovy.clone(), lua)?,
                projection: match rest.first() {
                    Some(p) => i32::from_lua(p.clone(), lua)?,
                    None => CAMERA_PERSPECTIVE,
                },
            }),
            _ => Err(mlua::Error::runtime("wrong number of arguments")),
        }
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        let v = |v: Vector3| {
            format!(
                "({}, {}, {})",
                fmt_number(v.x as f64),
                fmt_number(v.y as f64),
                fmt_number(v.z as f64)
            )
        };
        Ok(format!(
            "Camera3D(position = {}, target = {}, up = {}, fovy = {}, projection = {})",
            v(this.position),
            v(this.target),
            v(this.up),
            fmt_number(this.fovy as f64),
            this.projection
        ))
    }

    def_nested!(position: Vector3, target: Vector3, up: Vector3);
    def_field!(fovy: f32, projection: i32);
}

impl Bound for Camera3D {
    const NAME: &'static str = "Camera3D";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_field!(lua, def, position, target, up, fovy, projection);
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera2d_round_trips_points() {
        let cam = Camera2D {
            offset: Vector2::new(400.0, 300.0),
            target: Vector2::new(10.0, 20.0),
            rotation: 90.0,
            zoom: 2.0,
        };
        let screen = cam.world_to_screen(Vector2::new(10.0, 20.0));
        assert!((screen.x - 400.0).abs() < 1e-4 && (screen.y - 300.0).abs() < 1e-4);

        let screen = cam.world_to_screen(Vector2::new(11.0, 20.0));
        assert!((screen.x - 400.0).abs() < 1e-4 && (screen.y - 302.0).abs() < 1e-4);

        let world = cam.screen_to_world(screen);
        assert!((world.x - 11.0).abs() < 1e-4 && (world.y - 20.0).abs() < 1e-4);
    }
}
