use std::cell::Cell;
use std::rc::Rc;

use mlua::{AnyUserData, Lua};

use raylua::dispatch::{NameCollision, Policy, Registry, TypeDef, UnknownWrite};
use raylua::instance::{self, Bound};
use raylua::{insert_function, Error};

thread_local! {
    static RELEASED: Cell<u32> = const { Cell::new(0) };
}

#[derive(Clone)]
struct Gauge {
    value: f64,
}

impl Gauge {
    fn lm_double(_: &Lua, this: AnyUserData) -> mlua::Result<f64> {
        instance::with(&this, |p: &Self| p.value * 2.0)
    }

    fn lm_get_value(_: &Lua, this: AnyUserData) -> mlua::Result<f64> {
        instance::with(&this, |p: &Self| p.value)
    }

    fn lm_set_value(_: &Lua, (this, value): (AnyUserData, f64)) -> mlua::Result<()> {
        instance::modify(&this, |p: &mut Self| p.value = value)
    }

    fn lm_get_pair(_: &Lua, _: AnyUserData) -> mlua::Result<(i32, i32)> {
        Ok((1, 2))
    }

    fn lm_get_broken(_: &Lua, _: AnyUserData) -> mlua::Result<()> {
        Err(mlua::Error::runtime("sensor offline"))
    }

    fn lm_tostring(_: &Lua, this: AnyUserData) -> mlua::Result<String> {
        instance::with(&this, |p: &Self| format!("Gauge({})", p.value))
    }
}

impl Bound for Gauge {
    const NAME: &'static str = "Gauge";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_function!(lua, def, "Double", Self::lm_double);
        insert_function!(lua, def, "?value", Self::lm_get_value);
        insert_function!(lua, def, "=value", Self::lm_set_value);
        insert_function!(lua, def, "?pair", Self::lm_get_pair);
        insert_function!(lua, def, "?broken", Self::lm_get_broken);
        Ok(def)
    }

    fn release(&mut self) {
        RELEASED.with(|n| n.set(n.get() + 1));
    }
}

/// Registers `size` both as a method and as a reader.
#[derive(Clone)]
struct Clash;

impl Bound for Clash {
    const NAME: &'static str = "Clash";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "size", |_, _: AnyUserData| Ok("method"));
        insert_function!(lua, def, "?size", |_, _: AnyUserData| Ok("reader"));
        Ok(def)
    }
}

#[derive(Clone)]
struct Hijack;

impl Bound for Hijack {
    const NAME: &'static str = "Hijack";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__index", |_, ()| Ok(()));
        Ok(def)
    }
}

fn setup(policy: Policy) -> Lua {
    let lua = Lua::new();
    let mut registry = Registry::new(policy);
    registry.register::<Gauge>(&lua).unwrap();
    registry.install(&lua);
    let gauge = instance::push(&lua, Gauge { value: 21.0 }).unwrap();
    lua.globals().set("p", gauge).unwrap();
    lua
}

fn run(lua: &Lua, src: &str) -> mlua::Result<()> {
    lua.load(src).exec()
}

#[test]
fn method_reads_as_callable() {
    let lua = setup(Policy::default());
    run(
        &lua,
        r#"
        assert(type(p.Double) == "function")
        assert(p.Double(p) == 42)
        assert(p:Double() == 42)
        "#,
    )
    .unwrap();
}

#[test]
fn reader_yields_its_first_result() {
    let lua = setup(Policy::default());
    run(
        &lua,
        r#"
        assert(p.value == 21)
        local a, b = p.pair
        assert(a == 1 and b == nil)
        assert(tostring(p) == "Gauge(21)")
        "#,
    )
    .unwrap();
}

#[test]
fn writer_updates_the_instance() {
    let lua = setup(Policy::default());
    run(&lua, "p.value = 5; assert(p.value == 5); assert(p:Double() == 10)").unwrap();
}

#[test]
fn unknown_write_is_ignored_by_default() {
    let lua = setup(Policy::default());
    run(
        &lua,
        r#"
        p.missing = 1
        p.pair = 3
        assert(p.missing == nil)
        assert(p.pair == 1)
        "#,
    )
    .unwrap();
}

#[test]
fn unknown_write_raises_when_strict() {
    let lua = setup(Policy {
        unknown_write: UnknownWrite::Raise,
        ..Policy::default()
    });
    let err = run(&lua, "p.missing = 1").unwrap_err();
    assert!(err.to_string().contains("no writable property 'missing' on Gauge"));
    run(&lua, "p.value = 1").unwrap();
}

#[test]
fn miss_and_non_string_keys_read_nil() {
    let lua = setup(Policy::default());
    run(&lua, "assert(p.nothing == nil); assert(p[1] == nil); assert(p[true] == nil)").unwrap();
}

#[test]
fn calling_a_reader_is_a_host_error() {
    let lua = setup(Policy::default());
    let err = run(&lua, "p.value()").unwrap_err();
    assert!(err.to_string().contains("attempt to call"));
}

#[test]
fn reader_errors_pass_through() {
    let lua = setup(Policy::default());
    let err = run(&lua, "local _ = p.broken").unwrap_err();
    assert!(err.to_string().contains("sensor offline"));
}

#[test]
fn collision_is_rejected_at_registration() {
    let lua = Lua::new();
    let mut registry = Registry::new(Policy::default());
    let err = registry.register::<Clash>(&lua).unwrap_err();
    assert!(matches!(err, Error::Collision { type_name: "Clash", ref name } if name == "size"));
    assert!(registry.is_empty());
}

#[test]
fn method_shadows_reader_when_allowed() {
    let lua = Lua::new();
    let mut registry = Registry::new(Policy {
        name_collision: NameCollision::Shadow,
        ..Policy::default()
    });
    registry.register::<Clash>(&lua).unwrap();
    registry.install(&lua);
    lua.globals()
        .set("c", instance::push(&lua, Clash).unwrap())
        .unwrap();
    run(&lua, r#"assert(type(c.size) == "function"); assert(c:size() == "method")"#).unwrap();
}

#[test]
fn reserved_hooks_are_refused() {
    let lua = Lua::new();
    let mut registry = Registry::new(Policy::default());
    let err = registry.register::<Hijack>(&lua).unwrap_err();
    assert!(matches!(err, Error::ReservedHook { .. }));
}

#[test]
fn double_registration_is_refused() {
    let lua = Lua::new();
    let mut registry = Registry::new(Policy::default());
    registry.register::<Gauge>(&lua).unwrap();
    let err = registry.register::<Gauge>(&lua).unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered("Gauge")));
    assert_eq!(registry.len(), 1);
    assert!(registry.by_name("Gauge").is_some_and(|d| d.has_method("Double")));
}

#[test]
fn lookups_fail_closed_without_a_registry() {
    let lua = setup(Policy::default());
    lua.remove_app_data::<Registry>();
    run(&lua, "assert(p.value == nil); p.value = 3").unwrap();
}

#[test]
fn owned_instance_releases_once() {
    let lua = setup(Policy::default());
    let before = RELEASED.with(Cell::get);
    run(&lua, "p = nil").unwrap();
    lua.gc_collect().unwrap();
    lua.gc_collect().unwrap();
    assert_eq!(RELEASED.with(Cell::get), before + 1);
}

#[test]
fn values_cross_as_copies() {
    let lua = setup(Policy::default());
    let shared = Rc::new(Cell::new(0.0));
    let out = Rc::clone(&shared);
    let peek = lua
        .create_function(move |_, this: AnyUserData| {
            out.set(instance::with(&this, |p: &Gauge| p.value)?);
            Ok(())
        })
        .unwrap();
    lua.globals().set("peek", peek).unwrap();
    run(&lua, "p.value = 7; peek(p)").unwrap();
    assert_eq!(shared.get(), 7.0);
}
