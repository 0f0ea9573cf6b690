use mlua::{AnyUserData, Lua, Value};

use crate::dispatch::TypeDef;
use crate::error::Error;

/// A native value type exposed to Lua.
pub trait Bound: Clone + 'static {
    const NAME: &'static str;

    /// Flat tagged registration table, see [`crate::dispatch`].
    fn metatable(lua: &Lua) -> mlua::Result<TypeDef>;

    /// Give back the native resource behind an owned instance.
    fn release(&mut self) {}
}

type Reader<T> = Box<dyn Fn(&AnyUserData) -> mlua::Result<T>>;
type Writer<T> = Box<dyn Fn(&AnyUserData, T) -> mlua::Result<()>>;

/// Alias of a field inside another instance. Holds the owner alive.
pub struct FieldRef<T> {
    owner: AnyUserData,
    read: Reader<T>,
    write: Option<Writer<T>>,
}

/// Userdata payload of every bound type.
pub enum Instance<T: Bound> {
    Owned(T),
    Field(FieldRef<T>),
}

impl<T: Bound> Instance<T> {
    pub fn get(&self) -> mlua::Result<T> {
        match self {
            Instance::Owned(value) => Ok(value.clone()),
            Instance::Field(field) => (field.read)(&field.owner),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> mlua::Result<R> {
        match self {
            Instance::Owned(value) => Ok(f(value)),
            Instance::Field(field) => (field.read)(&field.owner).map(|value| f(&value)),
        }
    }

    /// Mutate in place, or read-modify-write through the owner.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> mlua::Result<R> {
        match self {
            Instance::Owned(value) => Ok(f(value)),
            Instance::Field(field) => {
                let write = field.write.as_ref().ok_or(Error::ReadOnly(T::NAME))?;
                let mut value = (field.read)(&field.owner)?;
                let out = f(&mut value);
                write(&field.owner, value)?;
                Ok(out)
            }
        }
    }

    pub fn set(&mut self, value: T) -> mlua::Result<()> {
        self.modify(|this| *this = value)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Instance::Field(_))
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Instance::Field(FieldRef { write: None, .. }))
    }

    pub fn owner(&self) -> Option<&AnyUserData> {
        match self {
            Instance::Owned(_) => None,
            Instance::Field(field) => Some(&field.owner),
        }
    }
}

impl<T: Bound> Drop for Instance<T> {
    fn drop(&mut self) {
        if let Instance::Owned(value) = self {
            value.release();
        }
    }
}

pub fn push<T: Bound>(lua: &Lua, value: T) -> mlua::Result<AnyUserData> {
    lua.create_any_userdata(Instance::Owned(value))
}

/// Push a writable reference to a field of `owner`.
pub fn push_field<O: Bound, T: Bound>(
    lua: &Lua,
    owner: &AnyUserData,
    read: fn(&O) -> T,
    write: fn(&mut O, T),
) -> mlua::Result<AnyUserData> {
    lua.create_any_userdata(Instance::Field(FieldRef {
        owner: owner.clone(),
        read: Box::new(move |owner: &AnyUserData| owner.borrow::<Instance<O>>()?.with(read)),
        write: Some(Box::new(move |owner: &AnyUserData, value: T| {
            owner
                .borrow_mut::<Instance<O>>()?
                .modify(|this| write(this, value))
        })),
    }))
}

/// Push a read-only reference to a field of `owner`.
pub fn push_view<O: Bound, T: Bound>(
    lua: &Lua,
    owner: &AnyUserData,
    read: fn(&O) -> T,
) -> mlua::Result<AnyUserData> {
    lua.create_any_userdata(Instance::Field(FieldRef {
        owner: owner.clone(),
        read: Box::new(move |owner: &AnyUserData| owner.borrow::<Instance<O>>()?.with(read)),
        write: None,
    }))
}

/// Like `luaL_testudata`: the value if it is a `T`, otherwise nothing.
pub fn test<T: Bound>(value: &Value) -> Option<T> {
    match value {
        Value::UserData(ud) => ud.borrow::<Instance<T>>().ok()?.get().ok(),
        _ => None,
    }
}

pub fn check<T: Bound>(value: &Value) -> mlua::Result<T> {
    match value {
        Value::UserData(ud) if ud.is::<Instance<T>>() => ud.borrow::<Instance<T>>()?.get(),
        _ => Err(mlua::Error::runtime(format!(
            "{} expected, got {}",
            T::NAME,
            type_name(value)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::UserData(_) => "foreign userdata",
        other => other.type_name(),
    }
}

/// Fail before any side effect when `this` cannot be written back.
pub fn ensure_writable<T: Bound>(this: &AnyUserData) -> mlua::Result<()> {
    if this.borrow::<Instance<T>>()?.is_read_only() {
        return Err(Error::ReadOnly(T::NAME).into());
    }
    Ok(())
}

pub fn modify<T: Bound, R>(this: &AnyUserData, f: impl FnOnce(&mut T) -> R) -> mlua::Result<R> {
    this.borrow_mut::<Instance<T>>()?.modify(f)
}

pub fn with<T: Bound, R>(this: &AnyUserData, f: impl FnOnce(&T) -> R) -> mlua::Result<R> {
    this.borrow::<Instance<T>>()?.with(f)
}
