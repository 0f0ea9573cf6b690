//! Lua bindings for a raylib-style game library.
//!
//! [`open`] installs every bound type, global function and constant into a
//! Lua state. [`Runtime`] bundles a state with its backend for running
//! scripts.

use std::path::Path;
use std::rc::Rc;

use log::{debug, info};
use mlua::Lua;

pub mod backend;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod instance;
mod macros;
pub mod modules;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};

use backend::Backend;
use dispatch::{Policy, Registry};
use types::*;

/// Install the bindings into `lua`, drawing through `backend`.
pub fn open(lua: &Lua, backend: Rc<dyn Backend>, policy: Policy) -> Result<()> {
    let mut registry = Registry::new(policy);
    registry.register::<Vector2>(lua)?;
    registry.register::<Vector3>(lua)?;
    registry.register::<Color>(lua)?;
    registry.register::<Rectangle>(lua)?;
    registry.register::<Camera2D>(lua)?;
    registry.register::<Camera3D>(lua)?;
    registry.register::<Image>(lua)?;
    registry.register::<Texture>(lua)?;
    registry.register::<Font>(lua)?;
    registry.register::<Sound>(lua)?;
    registry.register::<Music>(lua)?;
    debug!("{} types bound", registry.len());
    registry.install(lua);

    lua.set_app_data(Rc::clone(&backend));

    let globals = lua.globals();
    modules::register(lua, &globals, &backend)?;
    constants::register(lua, &globals)?;

    let meta = lua.create_table()?;
    meta.set("_VERSION", concat!("raylua ", env!("CARGO_PKG_VERSION")))?;
    globals.set("raylua", meta)?;
    Ok(())
}

/// A Lua state with the bindings installed.
pub struct Runtime {
    lua: Lua,
    backend: Rc<dyn Backend>,
}

impl Runtime {
    pub fn new(policy: Policy, backend: Rc<dyn Backend>) -> Result<Self> {
        let lua = Lua::new();
        open(&lua, Rc::clone(&backend), policy)?;
        Ok(Self { lua, backend })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn backend(&self) -> &Rc<dyn Backend> {
        &self.backend
    }

    /// Run a chunk of source.
    pub fn exec(&self, source: &str) -> Result<()> {
        Ok(self.lua.load(source).set_name("=exec").exec()?)
    }

    /// Run a script file. Its directory is not added to any search path.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(path.to_owned()));
        }
        info!("running {}", path.display());
        let source = std::fs::read_to_string(path)?;
        self.lua
            .load(source)
            .set_name(format!("@{}", path.display()))
            .exec()?;
        Ok(())
    }

    /// Evaluate an expression.
    pub fn eval<R: mlua::FromLuaMulti>(&self, source: &str) -> Result<R> {
        Ok(self.lua.load(source).set_name("=eval").eval()?)
    }
}
