use glam::Vec2;
use mlua::{FromLua, Lua, Variadic, Value};

use super::{fmt_number, Operand};
use crate::dispatch::TypeDef;
use crate::instance::{self, Bound};
use crate::{bound_value, def_field, insert_field, insert_function};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

bound_value!(Vector2);

impl From<Vec2> for Vector2 {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vector2> for Vec2 {
    fn from(v: Vector2) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl Vector2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn vec(self) -> Vec2 {
        self.into()
    }

    pub fn l_new(lua: &Lua, args: Variadic<Value>) -> mlua::Result<Self> {
        match args.as_slice() {
            [] => Ok(Self::ZERO),
            [other] => Self::from_lua(other.clone(), lua),
            [x, y] => Ok(Self::new(
                f32::from_lua(x.clone(), lua)?,
                f32::from_lua(y.clone(), lua)?,
            )),
            _ => Err(mlua::Error::runtime("wrong number of arguments")),
        }
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Vector2(x = {}, y = {})",
            fmt_number(this.x as f64),
            fmt_number(this.y as f64)
        ))
    }

    fn lm_add(_: &Lua, (this, rhs): (Self, Operand<Self>)) -> mlua::Result<Self> {
        Ok(match rhs {
            Operand::Value(rhs) => this.vec() + rhs.vec(),
            Operand::Scalar(n) => this.vec() + Vec2::splat(n),
        }
        .into())
    }

    fn lm_sub(_: &Lua, (this, rhs): (Self, Operand<Self>)) -> mlua::Result<Self> {
        Ok(match rhs {
            Operand::Value(rhs) => this.vec() - rhs.vec(),
            Operand::Scalar(n) => this.vec() - Vec2::splat(n),
        }
        .into())
    }

    fn lm_mul(_: &Lua, (this, rhs): (Self, Operand<Self>)) -> mlua::Result<Self> {
        Ok(match rhs {
            Operand::Value(rhs) => this.vec() * rhs.vec(),
            Operand::Scalar(n) => this.vec() * n,
        }
        .into())
    }

    fn lm_div(_: &Lua, (this, rhs): (Self, Operand<Self>)) -> mlua::Result<Self> {
        Ok(match rhs {
            Operand::Value(rhs) => this.vec() / rhs.vec(),
            Operand::Scalar(n) => this.vec() * (1.0 / n),
        }
        .into())
    }

    fn lm_unm(_: &Lua, this: Self) -> mlua::Result<Self> {
        Ok((-this.vec()).into())
    }

    fn lm_eq(_: &Lua, (this, other): (Self, Value)) -> mlua::Result<bool> {
        Ok(instance::test::<Self>(&other).is_some_and(|other| other == this))
    }

    fn lm_length(_: &Lua, this: Self) -> mlua::Result<f32> {
        Ok(this.vec().length())
    }

    fn lm_distance(_: &Lua, (this, other): (Self, Self)) -> mlua::Result<f32> {
        Ok(this.vec().distance(other.vec()))
    }

    fn lm_normal(_: &Lua, this: Self) -> mlua::Result<Self> {
        Ok(this.vec().normalize_or_zero().into())
    }

    fn lm_angle(_: &Lua, (this, other): (Self, Self)) -> mlua::Result<f32> {
        let dot = this.x * other.x + this.y * other.y;
        let det = this.x * other.y - this.y * other.x;
        Ok(det.atan2(dot))
    }

    def_field!(x: f32, y: f32);
}

impl Bound for Vector2 {
    const NAME: &'static str = "Vector2";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_function!(lua, def, "__add", Self::lm_add);
        insert_function!(lua, def, "__sub", Self::lm_sub);
        insert_function!(lua, def, "__mul", Self::lm_mul);
        insert_function!(lua, def, "__div", Self::lm_div);
        insert_function!(lua, def, "__unm", Self::lm_unm);
        insert_function!(lua, def, "__eq", Self::lm_eq);
        insert_function!(lua, def, "Length", Self::lm_length);
        insert_function!(lua, def, "Distance", Self::lm_distance);
        insert_function!(lua, def, "Normal", Self::lm_normal);
        insert_function!(lua, def, "Angle", Self::lm_angle);
        insert_field!(lua, def, x, y);
        Ok(def)
    }
}
