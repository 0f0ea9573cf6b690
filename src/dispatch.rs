//! Property dispatch for bound types.
//!
//! Every bound type is described by a flat list of tagged names. The tag picks
//! the bucket the callable lands in:
//!
//! * `=name`  computed writer
//! * `?name`  computed reader
//! * `__name` metatable hook (`__tostring`, `__add`, ...)
//! * `name`   method
//!
//! `__index` and `__newindex` on every bound type resolve through the
//! [`Registry`] stored in the Lua state's app data.

use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;
use mlua::{AnyUserData, Function, Lua, MetaMethod, MultiValue, UserDataMethods, Value};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::instance::{Bound, Instance};

pub const READ_MARKER: char = '?';
pub const WRITE_MARKER: char = '=';
pub const HOOK_MARKER: &str = "__";

/// Hooks the shim installs itself or that `Drop` replaces.
const RESERVED_HOOKS: [&str; 3] = ["__index", "__newindex", "__gc"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Method,
    Reader,
    Writer,
    Hook,
}

impl Slot {
    /// Split a tagged name into its bucket and the bare name.
    pub fn classify(tagged: &str) -> (Slot, &str) {
        if let Some(name) = tagged.strip_prefix(WRITE_MARKER) {
            (Slot::Writer, name)
        } else if let Some(name) = tagged.strip_prefix(READ_MARKER) {
            (Slot::Reader, name)
        } else if tagged.starts_with(HOOK_MARKER) {
            (Slot::Hook, tagged)
        } else {
            (Slot::Method, tagged)
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Slot::Method => "a method",
            Slot::Reader => "a reader",
            Slot::Writer => "a writer",
            Slot::Hook => "a hook",
        }
    }
}

/// What happens when a script assigns a property that has no writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownWrite {
    #[default]
    Ignore,
    Raise,
}

/// What happens when a name is registered both as a method and a reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCollision {
    #[default]
    Reject,
    Shadow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    pub unknown_write: UnknownWrite,
    pub name_collision: NameCollision,
}

/// Flat registration table for one bound type.
pub struct TypeDef {
    name: &'static str,
    entries: Vec<(String, Function)>,
}

impl TypeDef {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push(&mut self, tagged: impl Into<String>, func: Function) {
        self.entries.push((tagged.into(), func));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct Descriptor {
    name: &'static str,
    methods: HashMap<String, Function>,
    readers: HashMap<String, Function>,
    writers: HashMap<String, Function>,
    hooks: Vec<(String, Function)>,
}

impl Descriptor {
    pub fn build(def: TypeDef, policy: &Policy) -> Result<Self> {
        let type_name = def.name;
        let mut desc = Self {
            name: type_name,
            methods: HashMap::new(),
            readers: HashMap::new(),
            writers: HashMap::new(),
            hooks: Vec::new(),
        };
        for (tagged, func) in def.entries {
            let (slot, name) = Slot::classify(&tagged);
            if name.is_empty() || (slot == Slot::Hook && name.len() == HOOK_MARKER.len()) {
                return Err(Error::EmptyName {
                    type_name,
                    tagged: tagged.clone(),
                });
            }
            let duplicate = || Error::Duplicate {
                type_name,
                name: name.to_owned(),
                bucket: slot.describe(),
            };
            let map = match slot {
                Slot::Hook => {
                    if RESERVED_HOOKS.contains(&name) {
                        return Err(Error::ReservedHook {
                            type_name,
                            name: name.to_owned(),
                        });
                    }
                    if desc.hooks.iter().any(|(hook, _)| hook == name) {
                        return Err(duplicate());
                    }
                    desc.hooks.push((name.to_owned(), func));
                    continue;
                }
                Slot::Method => &mut desc.methods,
                Slot::Reader => &mut desc.readers,
                Slot::Writer => &mut desc.writers,
            };
            if map.contains_key(name) {
                return Err(duplicate());
            }
            map.insert(name.to_owned(), func);
        }
        if policy.name_collision == NameCollision::Reject {
            let clash = desc
                .methods
                .keys()
                .filter(|name| desc.readers.contains_key(name.as_str()))
                .min();
            if let Some(name) = clash {
                return Err(Error::Collision {
                    type_name,
                    name: name.clone(),
                });
            }
        }
        Ok(desc)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn has_reader(&self, name: &str) -> bool {
        self.readers.contains_key(name)
    }

    pub fn has_writer(&self, name: &str) -> bool {
        self.writers.contains_key(name)
    }

    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.iter().any(|(hook, _)| hook == name)
    }

    /// Method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Read-intercept. Methods come back unbound; readers are invoked with
    /// the instance and yield their first result. A miss is `nil`.
    pub fn index(&self, this: &AnyUserData, key: &str) -> mlua::Result<Value> {
        if let Some(method) = self.methods.get(key) {
            return Ok(Value::Function(method.clone()));
        }
        match self.readers.get(key) {
            Some(reader) => reader.call::<Value>(this.clone()),
            None => Ok(Value::Nil),
        }
    }

    /// Write-intercept. Never creates a field.
    pub fn newindex(
        &self,
        this: &AnyUserData,
        key: &str,
        value: Value,
        policy: UnknownWrite,
    ) -> mlua::Result<()> {
        match self.writers.get(key) {
            Some(writer) => writer.call::<()>((this.clone(), value)),
            None if policy == UnknownWrite::Raise => Err(Error::NotWritable {
                type_name: self.name,
                name: key.to_owned(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Every bound type known to one Lua state, keyed by Rust type.
#[derive(Default)]
pub struct Registry {
    policy: Policy,
    types: HashMap<TypeId, Rc<Descriptor>>,
    names: HashMap<&'static str, TypeId>,
}

impl Registry {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Build `T`'s descriptor and install the shim on its userdata metatable.
    pub fn register<T: Bound>(&mut self, lua: &Lua) -> Result<()> {
        let type_id = TypeId::of::<T>();
        if self.types.contains_key(&type_id) {
            return Err(Error::AlreadyRegistered(T::NAME));
        }
        let def = T::metatable(lua)?;
        let desc = Descriptor::build(def, &self.policy)?;
        install::<T>(lua, &desc)?;
        debug!(
            "registered {} ({} methods, {} readers, {} writers, {} hooks)",
            T::NAME,
            desc.methods.len(),
            desc.readers.len(),
            desc.writers.len(),
            desc.hooks.len()
        );
        self.names.insert(T::NAME, type_id);
        self.types.insert(type_id, Rc::new(desc));
        Ok(())
    }

    pub fn get<T: 'static>(&self) -> Option<Rc<Descriptor>> {
        self.types.get(&TypeId::of::<T>()).cloned()
    }

    pub fn by_name(&self, name: &str) -> Option<Rc<Descriptor>> {
        self.names.get(name).and_then(|id| self.types.get(id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Hand the registry to the Lua state. Replaces any previous one.
    pub fn install(self, lua: &Lua) {
        lua.set_app_data(self);
    }
}

/// Register `T` with the registry already installed in `lua`.
pub fn register<T: Bound>(lua: &Lua) -> Result<()> {
    let mut registry = lua
        .app_data_mut::<Registry>()
        .ok_or_else(|| mlua::Error::runtime("dispatch registry is not installed"))?;
    registry.register::<T>(lua)
}

fn resolve<T: 'static>(lua: &Lua) -> Option<(Rc<Descriptor>, UnknownWrite)> {
    let registry = lua.app_data_ref::<Registry>()?;
    let desc = registry.get::<T>()?;
    Some((desc, registry.policy.unknown_write))
}

fn read_intercept<T: 'static>(lua: &Lua, this: &AnyUserData, key: Value) -> mlua::Result<Value> {
    let Some((desc, _)) = resolve::<T>(lua) else {
        return Ok(Value::Nil);
    };
    match key {
        Value::String(key) => match key.to_str() {
            Ok(key) => desc.index(this, &key),
            Err(_) => Ok(Value::Nil),
        },
        _ => Ok(Value::Nil),
    }
}

fn write_intercept<T: 'static>(
    lua: &Lua,
    this: &AnyUserData,
    key: Value,
    value: Value,
) -> mlua::Result<()> {
    let Some((desc, policy)) = resolve::<T>(lua) else {
        return Ok(());
    };
    match key {
        Value::String(key) => match key.to_str() {
            Ok(key) => desc.newindex(this, &key, value, policy),
            Err(_) => Ok(()),
        },
        _ => Ok(()),
    }
}

fn install<T: Bound>(lua: &Lua, desc: &Descriptor) -> mlua::Result<()> {
    let hooks = desc.hooks.clone();
    lua.register_userdata_type::<Instance<T>>(move |reg| {
        reg.add_meta_function(
            MetaMethod::Index,
            |lua, (this, key): (AnyUserData, Value)| read_intercept::<T>(lua, &this, key),
        );
        reg.add_meta_function(
            MetaMethod::NewIndex,
            |lua, (this, key, value): (AnyUserData, Value, Value)| {
                write_intercept::<T>(lua, &this, key, value)
            },
        );
        for (name, hook) in hooks {
            reg.add_meta_function(name, move |_, args: MultiValue| {
                hook.call::<MultiValue>(args)
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(lua: &Lua) -> Function {
        lua.create_function(|_, ()| Ok(())).unwrap()
    }

    #[test]
    fn classify_tags() {
        assert_eq!(Slot::classify("=x"), (Slot::Writer, "x"));
        assert_eq!(Slot::classify("?x"), (Slot::Reader, "x"));
        assert_eq!(Slot::classify("__add"), (Slot::Hook, "__add"));
        assert_eq!(Slot::classify("Length"), (Slot::Method, "Length"));
        assert_eq!(Slot::classify("_private"), (Slot::Method, "_private"));
    }

    #[test]
    fn buckets_are_filled_by_tag() {
        let lua = Lua::new();
        let mut def = TypeDef::new("Gauge");
        def.push("Length", noop(&lua));
        def.push("?x", noop(&lua));
        def.push("=x", noop(&lua));
        def.push("__tostring", noop(&lua));
        let desc = Descriptor::build(def, &Policy::default()).unwrap();
        assert!(desc.has_method("Length"));
        assert!(desc.has_reader("x"));
        assert!(desc.has_writer("x"));
        assert!(desc.has_hook("__tostring"));
        assert!(!desc.has_method("x"));
    }

    #[test]
    fn duplicate_in_bucket_is_rejected() {
        let lua = Lua::new();
        let mut def = TypeDef::new("Gauge");
        def.push("?x", noop(&lua));
        def.push("?x", noop(&lua));
        let err = Descriptor::build(def, &Policy::default()).err().unwrap();
        assert!(matches!(err, Error::Duplicate { bucket: "a reader", .. }));
    }

    #[test]
    fn reserved_hooks_are_rejected() {
        let lua = Lua::new();
        for hook in RESERVED_HOOKS {
            let mut def = TypeDef::new("Gauge");
            def.push(hook, noop(&lua));
            let err = Descriptor::build(def, &Policy::default()).err().unwrap();
            assert!(matches!(err, Error::ReservedHook { .. }), "{hook}");
        }
    }

    #[test]
    fn empty_names_are_rejected() {
        let lua = Lua::new();
        for tagged in ["?", "=", "", "__"] {
            let mut def = TypeDef::new("Gauge");
            def.push(tagged, noop(&lua));
            let err = Descriptor::build(def, &Policy::default()).err().unwrap();
            assert!(matches!(err, Error::EmptyName { .. }), "{tagged:?}");
        }
    }

    #[test]
    fn collision_policy() {
        let lua = Lua::new();
        let def = || {
            let mut def = TypeDef::new("Gauge");
            def.push("x", noop(&lua));
            def.push("?x", noop(&lua));
            def
        };
        let err = Descriptor::build(def(), &Policy::default()).err().unwrap();
        assert!(matches!(err, Error::Collision { ref name, .. } if name == "x"));

        let shadow = Policy {
            name_collision: NameCollision::Shadow,
            ..Policy::default()
        };
        assert!(Descriptor::build(def(), &shadow).is_ok());
    }

    #[test]
    fn writer_and_method_may_share_a_name() {
        let lua = Lua::new();
        let mut def = TypeDef::new("Gauge");
        def.push("x", noop(&lua));
        def.push("=x", noop(&lua));
        assert!(Descriptor::build(def, &Policy::default()).is_ok());
    }
}
