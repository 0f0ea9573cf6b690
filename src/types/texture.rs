use std::rc::Rc;

use mlua::{AnyUserData, Lua};

use crate::backend::{Backend, TextureInfo};
use crate::dispatch::TypeDef;
use crate::instance::{self, Bound};
use crate::{bound_value, insert_function};

/// GPU texture handle. The owned instance unloads it on drop.
#[derive(Clone)]
pub struct Texture {
    pub info: TextureInfo,
    backend: Rc<dyn Backend>,
}

bound_value!(Texture);

macro_rules! def_info_getter {
    ($($name:ident),+) => {
        paste::paste! {
            $(
                fn [<lm_get_ $name>](_: &Lua, this: AnyUserData) -> mlua::Result<i64> {
                    instance::with(&this, |this: &Self| this.info.$name as i64)
                }
            )+
        }
    };
}

impl Texture {
    pub fn new(info: TextureInfo, backend: Rc<dyn Backend>) -> Self {
        Self { info, backend }
    }

    pub fn id(&self) -> u32 {
        self.info.id
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Texture(id = {}, width = {}, height = {})",
            this.info.id, this.info.width, this.info.height
        ))
    }

    def_info_getter!(id, width, height, mipmaps, format);
}

impl Bound for Texture {
    const NAME: &'static str = "Texture";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_function!(lua, def, "?id", Self::lm_get_id);
        insert_function!(lua, def, "?width", Self::lm_get_width);
        insert_function!(lua, def, "?height", Self::lm_get_height);
        insert_function!(lua, def, "?mipmaps", Self::lm_get_mipmaps);
        insert_function!(lua, def, "?format", Self::lm_get_format);
        Ok(def)
    }

    fn release(&mut self) {
        self.backend.unload_texture(self.info.id);
    }
}
