use std::rc::Rc;

use mlua::{AnyUserData, Lua};

use super::Texture;
use crate::backend::{Backend, FontInfo};
use crate::dispatch::TypeDef;
use crate::instance::{self, Bound};
use crate::{bound_value, insert_function};

#[derive(Clone)]
pub struct Font {
    pub info: FontInfo,
    texture: Texture,
    backend: Rc<dyn Backend>,
}

bound_value!(Font);

impl Font {
    pub fn new(info: FontInfo, backend: Rc<dyn Backend>) -> Self {
        Self {
            texture: Texture::new(info.texture, Rc::clone(&backend)),
            info,
            backend,
        }
    }

    pub fn id(&self) -> u32 {
        self.info.id
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Font(id = {}, baseSize = {}, glyphCount = {})",
            this.info.id, this.info.base_size, this.info.glyph_count
        ))
    }

    fn lm_get_base_size(_: &Lua, this: AnyUserData) -> mlua::Result<i32> {
        instance::with(&this, |f: &Self| f.info.base_size)
    }

    fn lm_get_glyph_count(_: &Lua, this: AnyUserData) -> mlua::Result<i32> {
        instance::with(&this, |f: &Self| f.info.glyph_count)
    }

    fn lm_get_glyph_padding(_: &Lua, this: AnyUserData) -> mlua::Result<i32> {
        instance::with(&this, |f: &Self| f.info.glyph_padding)
    }

    /// The atlas, as a read-only reference that pins this font.
    fn lm_get_texture(lua: &Lua, this: AnyUserData) -> mlua::Result<AnyUserData> {
        instance::push_view(lua, &this, |f: &Self| f.texture.clone())
    }
}

impl Bound for Font {
    const NAME: &'static str = "Font";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_function!(lua, def, "?baseSize", Self::lm_get_base_size);
        insert_function!(lua, def, "?glyphCount", Self::lm_get_glyph_count);
        insert_function!(lua, def, "?glyphPadding", Self::lm_get_glyph_padding);
        insert_function!(lua, def, "?texture", Self::lm_get_texture);
        Ok(def)
    }

    fn release(&mut self) {
        self.backend.unload_font(self.info.id);
    }
}
