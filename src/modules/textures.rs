use std::rc::Rc;

use mlua::{AnyUserData, Lua, Table};

use super::read_file;
use crate::backend::{Backend, DrawCommand};
use crate::insert_global;
use crate::instance;
use crate::types::{Color, Image, Rectangle, Texture, Vector2};

pub fn register(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    images(lua, g, rl)?;
    textures(lua, g, rl)?;
    drawing(lua, g, rl)
}

/// Global name of an `Image` method.
fn image_global(method: &str) -> String {
    match method {
        "Export" => "ExportImage".to_owned(),
        "LoadColors" => "LoadImageColors".to_owned(),
        "LoadPalette" => "LoadImagePalette".to_owned(),
        "GetAlphaBorder" => "GetImageAlphaBorder".to_owned(),
        "GetColor" => "GetImageColor".to_owned(),
        other => format!("Image{other}"),
    }
}

fn images(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_global!(lua, g, "LoadImage", |_, path: String| Ok(Image::load(path)?));
    insert_global!(
        lua,
        g,
        "LoadImageRaw",
        |_, (path, w, h, format, header): (String, i32, i32, i32, usize)| {
            Ok(Image::from_raw(&read_file(&path)?, w, h, format, header)?)
        }
    );
    // Only still images are decoded, so an animation is one frame long.
    insert_global!(lua, g, "LoadImageAnim", |_, path: String| Ok((Image::load(path)?, 1)));
    insert_global!(lua, g, "LoadImageFromString", |_, (file_type, data): (String, mlua::String)| {
        Ok(Image::from_memory(&file_type, &data.as_bytes())?)
    });
    insert_backend!(lua, g, rl, "LoadImageFromTexture", |b, tex: Texture| {
        Image::from(b.texture_image(tex.id())?)
    });
    insert_backend!(lua, g, rl, "LoadImageFromScreen", |b, (): ()| Image::from(b.load_image_from_screen()));

    insert_global!(lua, g, "GenImageColor", |_, (w, h, color): (i32, i32, Color)| {
        Ok(Image::filled(w, h, color))
    });
    insert_global!(lua, g, "GenImageGradientV", |_, (w, h, top, bottom): (i32, i32, Color, Color)| {
        Ok(Image::gradient_v(w, h, top, bottom))
    });
    insert_global!(lua, g, "GenImageGradientH", |_, (w, h, left, right): (i32, i32, Color, Color)| {
        Ok(Image::gradient_h(w, h, left, right))
    });
    insert_global!(
        lua,
        g,
        "GenImageGradientRadial",
        |_, (w, h, density, inner, outer): (i32, i32, f32, Color, Color)| {
            Ok(Image::gradient_radial(w, h, density, inner, outer))
        }
    );
    insert_global!(
        lua,
        g,
        "GenImageChecked",
        |_, (w, h, checks_x, checks_y, a, b): (i32, i32, i32, i32, Color, Color)| {
            Ok(Image::checked(w, h, checks_x, checks_y, a, b))
        }
    );
    insert_global!(lua, g, "GenImageWhiteNoise", |_, (w, h, factor): (i32, i32, f32)| {
        Ok(Image::white_noise(w, h, factor))
    });
    insert_global!(lua, g, "GenImageCellular", |_, (w, h, tile_size): (i32, i32, i32)| {
        Ok(Image::cellular(w, h, tile_size))
    });

    for (name, func) in Image::methods(lua)? {
        g.set(image_global(name), func)?;
    }
    Ok(())
}

fn textures(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    let b = Rc::clone(rl);
    insert_global!(lua, g, "LoadTexture", move |_, path: String| {
        let img = Image::load(path)?;
        let info = b.load_texture(&img.pixels)?;
        Ok(Texture::new(info, Rc::clone(&b)))
    });
    let b = Rc::clone(rl);
    insert_global!(lua, g, "LoadTextureFromImage", move |_, img: Image| {
        let info = b.load_texture(&img.pixels)?;
        Ok(Texture::new(info, Rc::clone(&b)))
    });
    insert_backend!(lua, g, rl, "UpdateTexture", |b, (tex, img): (Texture, Image)| {
        b.update_texture(tex.id(), &img.pixels)?
    });
    let b = Rc::clone(rl);
    insert_global!(lua, g, "GenTextureMipmaps", move |_, this: AnyUserData| {
        instance::ensure_writable::<Texture>(&this)?;
        let id = instance::with(&this, Texture::id)?;
        let mipmaps = b.gen_texture_mipmaps(id)?;
        instance::modify(&this, |tex: &mut Texture| tex.info.mipmaps = mipmaps)
    });
    insert_backend!(lua, g, rl, "SetTextureFilter", |b, (tex, filter): (Texture, i32)| {
        b.set_texture_filter(tex.id(), filter)
    });
    insert_backend!(lua, g, rl, "SetTextureWrap", |b, (tex, wrap): (Texture, i32)| {
        b.set_texture_wrap(tex.id(), wrap)
    });
    Ok(())
}

fn full(tex: &Texture) -> Rectangle {
    Rectangle::new(0.0, 0.0, tex.info.width as f32, tex.info.height as f32)
}

fn blit(tex: &Texture, source: Rectangle, dest: Rectangle, origin: Vector2, rotation: f32, tint: Color) -> DrawCommand {
    DrawCommand::Texture {
        id: tex.id(),
        source,
        dest,
        origin,
        rotation,
        tint,
    }
}

fn drawing(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_backend!(lua, g, rl, "DrawTexture", |b, (tex, x, y, tint): (Texture, f32, f32, Color)| {
        let dest = Rectangle::new(x.trunc(), y.trunc(), tex.info.width as f32, tex.info.height as f32);
        b.draw(blit(&tex, full(&tex), dest, Vector2::ZERO, 0.0, tint))
    });
    insert_backend!(lua, g, rl, "DrawTextureV", |b, (tex, pos, tint): (Texture, Vector2, Color)| {
        let dest = Rectangle::new(pos.x, pos.y, tex.info.width as f32, tex.info.height as f32);
        b.draw(blit(&tex, full(&tex), dest, Vector2::ZERO, 0.0, tint))
    });
    insert_backend!(
        lua, g, rl, "DrawTextureEx",
        |b, (tex, pos, rotation, scale, tint): (Texture, Vector2, f32, f32, Color)| {
            let dest = Rectangle::new(
                pos.x,
                pos.y,
                tex.info.width as f32 * scale,
                tex.info.height as f32 * scale,
            );
            b.draw(blit(&tex, full(&tex), dest, Vector2::ZERO, rotation, tint))
        }
    );
    insert_backend!(
        lua, g, rl, "DrawTextureRec",
        |b, (tex, source, pos, tint): (Texture, Rectangle, Vector2, Color)| {
            let dest = Rectangle::new(pos.x, pos.y, source.width.abs(), source.height.abs());
            b.draw(blit(&tex, source, dest, Vector2::ZERO, 0.0, tint))
        }
    );
    insert_backend!(
        lua, g, rl, "DrawTexturePro",
        |b, (tex, source, dest, origin, rotation, tint): (Texture, Rectangle, Rectangle, Vector2, f32, Color)| {
            b.draw(blit(&tex, source, dest, origin, rotation, tint))
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::image_global;

    #[test]
    fn image_methods_map_to_library_names() {
        assert_eq!(image_global("Crop"), "ImageCrop");
        assert_eq!(image_global("Export"), "ExportImage");
        assert_eq!(image_global("GetColor"), "GetImageColor");
        assert_eq!(image_global("LoadPalette"), "LoadImagePalette");
    }
}
