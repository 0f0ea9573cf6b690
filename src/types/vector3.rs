use glam::Vec3;
use mlua::{FromLua, Lua, Value, Variadic};

use super::{fmt_number, Operand};
use crate::dispatch::TypeDef;
use crate::instance::{self, Bound};
use crate::{bound_value, def_field, insert_field, insert_function};

const EPSILON: f32 = 0.000001;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

bound_value!(Vector3);

impl From<Vec3> for Vector3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for Vec3 {
    fn from(v: Vector3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn vec(self) -> Vec3 {
        self.into()
    }

    /// Component-wise comparison with a tolerance relative to magnitude.
    pub fn approx_eq(self, other: Self) -> bool {
        let close = |p: f32, q: f32| (p - q).abs() <= EPSILON * 1.0f32.max(p.abs().max(q.abs()));
        close(self.x, other.x) && close(self.y, other.y) && close(self.z, other.z)
    }

    pub fn l_new(lua: &Lua, args: Variadic<Value>) -> mlua::Result<Self> {
        match args.as_slice() {
            [] => Ok(Self::ZERO),
            [other] => Self::from_lua(other.clone(), lua),
            [x, y, z] => Ok(Self::new(
                f32::from_lua(x.clone(), lua)?,
                f32::from_lua(y.clone(), lua)?,
                f32::from_lua(z.clone(), lua)?,
            )),
            _ => Err(mlua::Error::runtime("wrong number of arguments")),
        }
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Vector3(x = {}, y = {}, z = {})",
            fmt_number(this.x as f64),
            fmt_number(this.y as f64),
            fmt_number(this.z as f64)
        ))
    }

    fn lm_add(_: &Lua, (this, rhs): (Self, Operand<Self>)) -> mlua::Result<Self> {
        Ok(match rhs {
            Operand::Value(rhs) => this.vec() + rhs.vec(),
            Operand::Scalar(n) => this.vec() + Vec3::splat(n),
        }
        .into())
    }

    fn lm_sub(_: &Lua, (this, rhs): (Self, Operand<Self>)) -> mlua::Result<Self> {
        Ok(match rhs {
            Operand::Value(rhs) => this.vec() - rhs.vec(),
            Operand::Scalar(n) => this.vec() - Vec3::splat(n),
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
        Ok(instance::test::<Self>(&other).is_some_and(|other| this.approx_eq(other)))
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

    def_field!(x: f32, y: f32, z: f32);
}

impl Bound for Vector3 {
    const NAME: &'static str = "Vector3";

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
        insert_field!(lua, def, x, y, z);
        Ok(def)
    }
}
