mod audio;
mod camera;
mod color;
mod font;
mod image;
mod rectangle;
mod texture;
mod vector2;
mod vector3;

pub use audio::{Music, Sound};
pub use camera::{Camera2D, Camera3D};
pub use color::Color;
pub use font::Font;
pub use self::image::Image;
pub use rectangle::Rectangle;
pub use texture::Texture;
pub use vector2::Vector2;
pub use vector3::Vector3;

use mlua::{FromLua, Lua, Value};

/// Right-hand side of an arithmetic hook: another value or a scalar.
pub enum Operand<T> {
    Value(T),
    Scalar(f32),
}

impl<T: FromLua> FromLua for Operand<T> {
    fn from_lua(value: Value, lua: &Lua) -> mlua::Result<Self> {
        match value {
            Value::Integer(n) => Ok(Operand::Scalar(n as f32)),
            Value::Number(n) => Ok(Operand::Scalar(n as f32)),
            Value::String(_) => match lua.coerce_number(value.clone())? {
                Some(n) => Ok(Operand::Scalar(n as f32)),
                None => T::from_lua(value, lua).map(Operand::Value),
            },
            other => T::from_lua(other, lua).map(Operand::Value),
        }
    }
}

/// Format a number the way Lua's `tostring` does (`%.14g`, with `.0`
/// appended to integral values).
pub fn fmt_number(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let sci = format!("{:.13e}", n);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let mut out = if !(-4..14).contains(&exp) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (13 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, n)).to_owned()
    };
    if out.bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
        out.push_str(".0");
    }
    out
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Raylib's `Clamp`, used for color components.
pub(crate) fn clamp_component(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::fmt_number;

    #[test]
    fn numbers_format_like_lua() {
        assert_eq!(fmt_number(3.0), "3.0");
        assert_eq!(fmt_number(-2.0), "-2.0");
        assert_eq!(fmt_number(4.5), "4.5");
        assert_eq!(fmt_number(0.1f32 as f64), "0.10000000149012");
        assert_eq!(fmt_number(1e20), "1e+20");
        assert_eq!(fmt_number(0.00001), "1e-05");
        assert_eq!(fmt_number(123456.25), "123456.25");
        assert_eq!(fmt_number(f64::INFINITY), "inf");
    }
}
