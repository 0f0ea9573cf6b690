#[macro_export]
macro_rules! insert_function {
    ($lua:ident, $target:ident, $name:expr, $func:expr) => {
        $target.push($name, $lua.create_function($func)?);
    };
}

#[macro_export]
macro_rules! insert_global {
    ($lua:ident, $table:ident, $name:expr, $func:expr) => {
        $table.set($name, $lua.create_function($func)?)?;
    };
}

/// `FromLua`/`IntoLua` for a bound type: values cross the boundary as
/// owned userdata copies.
#[macro_export]
macro_rules! bound_value {
    ($ty:ty) => {
        impl mlua::FromLua for $ty {
            fn from_lua(value: mlua::Value, _: &mlua::Lua) -> mlua::Result<Self> {
                $crate::instance::check::<$ty>(&value)
            }
        }

        impl mlua::IntoLua for $ty {
            fn into_lua(self, lua: &mlua::Lua) -> mlua::Result<mlua::Value> {
                $crate::instance::push(lua, self).map(mlua::Value::UserData)
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $($crate::bound_value!($ty);)+
    };
}

/// Reader/writer pair over a plain field.
#[macro_export]
macro_rules! def_field {
    ($name:ident: $ty:ty) => {
        paste::paste! {
            fn [<lm_get_ $name>](_: &mlua::Lua, this: mlua::AnyUserData) -> mlua::Result<$ty> {
                $crate::instance::with(&this, |this: &Self| this.$name)
            }

            fn [<lm_set_ $name>](
                _: &mlua::Lua,
                (this, value): (mlua::AnyUserData, $ty),
            ) -> mlua::Result<()> {
                $crate::instance::modify(&this, |this: &mut Self| this.$name = value)
            }
        }
    };
    ($($name:ident: $ty:ty),+ $(,)?) => {
        $($crate::def_field!($name: $ty);)+
    };
}

/// Reader only.
#[macro_export]
macro_rules! def_getter {
    ($name:ident: $ty:ty) => {
        paste::paste! {
            fn [<lm_get_ $name>](_: &mlua::Lua, this: mlua::AnyUserData) -> mlua::Result<$ty> {
                $crate::instance::with(&this, |this: &Self| this.$name as $ty)
            }
        }
    };
    ($($name:ident: $ty:ty),+ $(,)?) => {
        $($crate::def_getter!($name: $ty);)+
    };
}

/// Register `?name` and `=name` for fields made by `def_field!`.
#[macro_export]
macro_rules! insert_field {
    ($lua:ident, $target:ident, $($name:ident),+ $(,)?) => {
        paste::paste! {
            $(
                $crate::insert_function!($lua, $target, concat!("?", stringify!($name)), Self::[<lm_get_ $name>]);
                $crate::insert_function!($lua, $target, concat!("=", stringify!($name)), Self::[<lm_set_ $name>]);
            )+
        }
    };
}

/// Register `?name` for getters made by `def_getter!`.
#[macro_export]
macro_rules! insert_getter {
    ($lua:ident, $target:ident, $($name:ident => $field:ident),+ $(,)?) => {
        paste::paste! {
            $(
                $crate::insert_function!($lua, $target, concat!("?", stringify!($name)), Self::[<lm_get_ $field>]);
            )+
        }
    };
}
