use std::path::Path;

use image::{imageops, imageops::FilterType, Pixel, RgbaImage};
use log::warn;
use mlua::{AnyUserData, Lua, Table};
use rand::Rng;

use super::{Color, Rectangle, Vector2};
use crate::backend::PIXELFORMAT_RGBA8;
use crate::dispatch::TypeDef;
use crate::error::{Error, Result};
use crate::instance::{self, Bound};
use crate::{bound_value, insert_function};

/// CPU-side pixel buffer, always RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub pixels: RgbaImage,
    pub mipmaps: i32,
}

bound_value!(Image);

impl From<RgbaImage> for Image {
    fn from(pixels: RgbaImage) -> Self {
        Self { pixels, mipmaps: 1 }
    }
}

fn lerp(a: Color, b: Color, t: f32) -> Color {
    let mix = |a: u8, b: u8| (b as f32 * t + a as f32 * (1.0 - t)) as u8;
    Color::rgba(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
}

fn dim(n: i32) -> u32 {
    n.max(0) as u32
}

/// Snap an 8-bit channel value to the nearest level `bits` can express.
fn quantize(v: f32, bits: i32) -> f32 {
    let levels = ((1 << bits) - 1) as f32;
    ((v.clamp(0.0, 255.0) / 255.0 * levels).round() / levels * 255.0).round()
}

impl Image {
    pub fn width(&self) -> i32 {
        self.pixels.width() as i32
    }

    pub fn height(&self) -> i32 {
        self.pixels.height() as i32
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_owned()));
        }
        Ok(image::open(path)?.to_rgba8().into())
    }

    pub fn from_memory(file_type: &str, data: &[u8]) -> Result<Self> {
        let ext = file_type.trim_start_matches('.');
        let decoded = match image::ImageFormat::from_extension(ext) {
            Some(format) => image::load_from_memory_with_format(data, format)?,
            None => image::load_from_memory(data)?,
        };
        Ok(decoded.to_rgba8().into())
    }

    pub fn from_raw(data: &[u8], width: i32, height: i32, format: i32, header: usize) -> Result<Self> {
        if format != PIXELFORMAT_RGBA8 {
            return Err(Error::PixelFormat(format));
        }
        let len = dim(width) as usize * dim(height) as usize * 4;
        let body = header.checked_add(len).and_then(|end| data.get(header..end));
        let body = body.ok_or_else(|| {
            mlua::Error::runtime(format!(
                "raw image data too short: need {} bytes after a {header} byte header",
                len
            ))
        })?;
        RgbaImage::from_raw(dim(width), dim(height), body.to_vec())
            .map(Self::from)
            .ok_or(Error::PixelFormat(format))
    }

    pub fn export(&self, path: impl AsRef<Path>) -> bool {
        match self.pixels.save(path.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                warn!("image export to {} failed: {e}", path.as_ref().display());
                false
            }
        }
    }

    pub fn filled(width: i32, height: i32, color: Color) -> Self {
        RgbaImage::from_pixel(dim(width), dim(height), color.into()).into()
    }

    pub fn gradient_v(width: i32, height: i32, top: Color, bottom: Color) -> Self {
        let h = height.max(1) as f32;
        RgbaImage::from_fn(dim(width), dim(height), |_, y| lerp(top, bottom, y as f32 / h).into()).into()
    }

    pub fn gradient_h(width: i32, height: i32, left: Color, right: Color) -> Self {
        let w = width.max(1) as f32;
        RgbaImage::from_fn(dim(width), dim(height), |x, _| lerp(left, right, x as f32 / w).into()).into()
    }

    pub fn gradient_radial(width: i32, height: i32, density: f32, inner: Color, outer: Color) -> Self {
        let radius = width.min(height) as f32 / 2.0;
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        RgbaImage::from_fn(dim(width), dim(height), |x, y| {
            let dist = (x as f32 - cx).hypot(y as f32 - cy);
            let t = ((dist - radius * density) / (radius * (1.0 - density))).clamp(0.0, 1.0);
            lerp(inner, outer, t).into()
        })
        .into()
    }

    pub fn checked(width: i32, height: i32, checks_x: i32, checks_y: i32, a: Color, b: Color) -> Self {
        let (cx, cy) = (dim(checks_x).max(1), dim(checks_y).max(1));
        RgbaImage::from_fn(dim(width), dim(height), |x, y| {
            let c = if (x / cx + y / cy) % 2 == 0 { a } else { b };
            c.into()
        })
        .into()
    }

    pub fn white_noise(width: i32, height: i32, factor: f32) -> Self {
        let mut rng = rand::thread_rng();
        let threshold = (factor * 100.0) as i32;
        RgbaImage::from_fn(dim(width), dim(height), |_, _| {
            let c = if rng.gen_range(0..100) < threshold {
                Color::WHITE
            } else {
                Color::BLACK
            };
            c.into()
        })
        .into()
    }

    /// Worley noise, one seed per tile.
    pub fn cellular(width: i32, height: i32, tile_size: i32) -> Self {
        if width <= 0 || height <= 0 {
            return Self::filled(width, height, Color::BLANK);
        }
        let tile = i64::from(tile_size.max(1));
        let (w, h) = (i64::from(width), i64::from(height));
        let (tx, ty) = ((w + tile - 1) / tile, (h + tile - 1) / tile);
        let mut rng = rand::thread_rng();
        let seeds: Vec<(f32, f32)> = (0..tx * ty)
            .map(|i| {
                let (x, y) = (i % tx, i / tx);
                (
                    (x * tile + rng.gen_range(0..tile)) as f32,
                    (y * tile + rng.gen_range(0..tile)) as f32,
                )
            })
            .collect();
        RgbaImage::from_fn(dim(width), dim(height), |x, y| {
            let (cx, cy) = (i64::from(x) / tile, i64::from(y) / tile);
            let mut best = f32::MAX;
            for j in (cy - 1).max(0)..=(cy + 1).min(ty - 1) {
                for i in (cx - 1).max(0)..=(cx + 1).min(tx - 1) {
                    let (sx, sy) = seeds[(j * tx + i) as usize];
                    best = best.min((x as f32 - sx).hypot(y as f32 - sy));
                }
            }
            let v = (best * 256.0 / tile as f32).min(255.0) as u8;
            image::Rgba([v, v, v, 255])
        })
        .into()
    }

    /// Clip `rec` to the image; `None` when nothing is left.
    fn clip(&self, rec: Rectangle) -> Option<(u32, u32, u32, u32)> {
        let x0 = rec.x.max(0.0) as i64;
        let y0 = rec.y.max(0.0) as i64;
        let x1 = ((rec.x + rec.width) as i64).min(self.width() as i64);
        let y1 = ((rec.y + rec.height) as i64).min(self.height() as i64);
        (x1 > x0 && y1 > y0).then(|| (x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    pub fn sub_image(&self, rec: Rectangle) -> Self {
        match self.clip(rec) {
            Some((x, y, w, h)) => imageops::crop_imm(&self.pixels, x, y, w, h).to_image().into(),
            None => Self::filled(0, 0, Color::BLANK),
        }
    }

    pub fn crop(&mut self, rec: Rectangle) {
        match self.clip(rec) {
            Some(_) => *self = self.sub_image(rec),
            None => warn!("image crop rectangle is out of bounds"),
        }
    }

    pub fn alpha_border(&self, threshold: f32) -> Rectangle {
        let limit = (threshold * 255.0) as u8;
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, px) in self.pixels.enumerate_pixels() {
            if px[3] > limit {
                let b = bounds.get_or_insert((x, y, x, y));
                *b = (b.0.min(x), b.1.min(y), b.2.max(x), b.3.max(y));
            }
        }
        bounds.map_or_else(Rectangle::default, |(x0, y0, x1, y1)| {
            Rectangle::new(x0 as f32, y0 as f32, (x1 - x0 + 1) as f32, (y1 - y0 + 1) as f32)
        })
    }

    pub fn alpha_crop(&mut self, threshold: f32) {
        let border = self.alpha_border(threshold);
        if border.width > 0.0 && border.height > 0.0 {
            self.crop(border);
        }
    }

    pub fn alpha_clear(&mut self, color: Color, threshold: f32) {
        let limit = (threshold * 255.0) as u8;
        for px in self.pixels.pixels_mut() {
            if px[3] <= limit {
                *px = color.into();
            }
        }
    }

    pub fn alpha_mask(&mut self, mask: &Image) {
        if mask.pixels.dimensions() != self.pixels.dimensions() {
            warn!("alpha mask must be the same size as the image");
            return;
        }
        for (px, m) in self.pixels.pixels_mut().zip(mask.pixels.pixels()) {
            px[3] = m.to_luma()[0];
        }
    }

    pub fn alpha_premultiply(&mut self) {
        for px in self.pixels.pixels_mut() {
            let a = px[3] as f32 / 255.0;
            for c in 0..3 {
                px[c] = (px[c] as f32 * a) as u8;
            }
        }
    }

    pub fn resize(&mut self, width: i32, height: i32, filter: FilterType) {
        self.pixels = imageops::resize(&self.pixels, dim(width), dim(height), filter);
    }

    pub fn resize_canvas(&mut self, width: i32, height: i32, offset_x: i32, offset_y: i32, fill: Color) {
        let mut canvas = RgbaImage::from_pixel(dim(width), dim(height), fill.into());
        imageops::replace(&mut canvas, &self.pixels, offset_x as i64, offset_y as i64);
        self.pixels = canvas;
    }

    pub fn to_pot(&mut self, fill: Color) {
        let w = self.pixels.width().next_power_of_two() as i32;
        let h = self.pixels.height().next_power_of_two() as i32;
        if (w, h) != (self.width(), self.height()) {
            self.resize_canvas(w, h, 0, 0, fill);
        }
    }

    fn map_pixels(&mut self, f: impl Fn(&mut image::Rgba<u8>)) {
        self.pixels.pixels_mut().for_each(f);
    }

    pub fn tint(&mut self, tint: Color) {
        let t = [tint.r, tint.g, tint.b, tint.a].map(|c| c as f32 / 255.0);
        self.map_pixels(|px| {
            for c in 0..4 {
                px[c] = (px[c] as f32 * t[c]) as u8;
            }
        });
    }

    pub fn invert(&mut self) {
        self.map_pixels(|px| {
            for c in 0..3 {
                px[c] = 255 - px[c];
            }
        });
    }

    pub fn grayscale(&mut self) {
        self.map_pixels(|px| {
            let v = px.to_luma()[0];
            px[0] = v;
            px[1] = v;
            px[2] = v;
        });
    }

    pub fn contrast(&mut self, contrast: f32) {
        let k = ((100.0 + contrast.clamp(-100.0, 100.0)) / 100.0).powi(2);
        self.map_pixels(|px| {
            for c in 0..3 {
                let v = ((px[c] as f32 / 255.0 - 0.5) * k + 0.5) * 255.0;
                px[c] = v.clamp(0.0, 255.0) as u8;
            }
        });
    }

    pub fn brightness(&mut self, brightness: i32) {
        let b = brightness.clamp(-255, 255);
        self.map_pixels(|px| {
            for c in 0..3 {
                px[c] = (px[c] as i32 + b).clamp(0, 255) as u8;
            }
        });
    }

    pub fn replace(&mut self, color: Color, with: Color) {
        let (from, to): (image::Rgba<u8>, image::Rgba<u8>) = (color.into(), with.into());
        self.map_pixels(|px| {
            if *px == from {
                *px = to;
            }
        });
    }

    pub fn colors(&self) -> Vec<Color> {
        self.pixels.pixels().map(|&px| px.into()).collect()
    }

    /// Distinct non-transparent colors in scan order.
    pub fn palette(&self, max: usize) -> Vec<Color> {
        let mut out: Vec<Color> = Vec::new();
        for &px in self.pixels.pixels() {
            let c = Color::from(px);
            if c.a == 0 || out.contains(&c) {
                continue;
            }
            out.push(c);
            if out.len() == max {
                break;
            }
        }
        out
    }

    pub fn color_at(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x >= self.width() || y >= self.height() {
            warn!("requested image pixel ({x}, {y}) out of bounds");
            return Color::BLANK;
        }
        (*self.pixels.get_pixel(x as u32, y as u32)).into()
    }

    pub fn clear(&mut self, color: Color) {
        let px = color.into();
        self.map_pixels(|p| *p = px);
    }

    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x >= 0 && y >= 0 && x < self.width() && y < self.height() {
            self.pixels.put_pixel(x as u32, y as u32, color.into());
        }
    }

    /// Clip the segment to one pixel around the image, so far endpoints
    /// do not walk millions of off-screen pixels.
    fn clip_line(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<[i64; 4]> {
        let (x0, y0, x1, y1) = (x0 as f64, y0 as f64, x1 as f64, y1 as f64);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let (max_x, max_y) = (self.width() as f64, self.height() as f64);
        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in [(-dx, x0 + 1.0), (dx, max_x - x0), (-dy, y0 + 1.0), (dy, max_y - y0)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
        }
        (t0 <= t1).then(|| {
            [
                (x0 + t0 * dx).round() as i64,
                (y0 + t0 * dy).round() as i64,
                (x0 + t1 * dx).round() as i64,
                (y0 + t1 * dy).round() as i64,
            ]
        })
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let Some([x0, y0, x1, y1]) = self.clip_line(x0, y0, x1, y1) else {
            return;
        };
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            if let (Ok(px), Ok(py)) = (i32::try_from(x), i32::try_from(y)) {
                self.draw_pixel(px, py, color);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Color) {
        let (r, cx, cy) = (i64::from(radius.max(0)), i64::from(cx), i64::from(cy));
        let rows = (-r).max(-cy)..=r.min(i64::from(self.height()) - 1 - cy);
        for dy in rows {
            let half = ((r * r - dy * dy) as f64).sqrt() as i64;
            let row = Rectangle::new((cx - half) as f32, (cy + dy) as f32, (2 * half + 1) as f32, 1.0);
            self.draw_rectangle(row, color);
        }
    }

    pub fn draw_rectangle(&mut self, rec: Rectangle, color: Color) {
        let Some((x, y, w, h)) = self.clip(rec) else {
            return;
        };
        let px = color.into();
        for j in y..y + h {
            for i in x..x + w {
                self.pixels.put_pixel(i, j, px);
            }
        }
    }

    pub fn draw_rectangle_lines(&mut self, rec: Rectangle, thick: i32, color: Color) {
        let t = thick as f32;
        let Rectangle { x, y, width, height } = rec;
        self.draw_rectangle(Rectangle::new(x, y, width, t), color);
        self.draw_rectangle(Rectangle::new(x, y + t, t, height - 2.0 * t), color);
        self.draw_rectangle(Rectangle::new(x + width - t, y + t, t, height - 2.0 * t), color);
        self.draw_rectangle(Rectangle::new(x, y + height - t, width, t), color);
    }

    /// Blend `src_rec` of `src`, scaled to `dst_rec`, onto this image.
    pub fn draw(&mut self, src: &Image, src_rec: Rectangle, dst_rec: Rectangle, tint: Color) {
        let mut part = src.sub_image(src_rec);
        if part.pixels.width() == 0 || part.pixels.height() == 0 {
            return;
        }
        let (w, h) = (dst_rec.width as i32, dst_rec.height as i32);
        if (w, h) != (part.width(), part.height()) {
            part.resize(w, h, FilterType::Triangle);
        }
        if tint != Color::WHITE {
            part.tint(tint);
        }
        let (ox, oy) = (dst_rec.x as i64, dst_rec.y as i64);
        for (x, y, px) in part.pixels.enumerate_pixels() {
            let (dx, dy) = (ox + x as i64, oy + y as i64);
            if dx >= 0 && dy >= 0 && dx < self.width() as i64 && dy < self.height() as i64 {
                self.pixels.get_pixel_mut(dx as u32, dy as u32).blend(px);
            }
        }
    }
}

impl Image {
    /// Length of the full mipmap chain down to 1x1.
    pub fn gen_mipmaps(&mut self) {
        let side = self.pixels.width().max(self.pixels.height()).max(1);
        self.mipmaps = (32 - side.leading_zeros()) as i32;
    }

    /// Floyd-Steinberg dither down to the given bits per channel. Pixels
    /// stay RGBA8 but only hold values the reduced depth can express. Alpha
    /// is quantized without error diffusion; zero alpha bits make it opaque.
    pub fn dither(&mut self, r_bpp: i32, g_bpp: i32, b_bpp: i32, a_bpp: i32) {
        let bits = [r_bpp, g_bpp, b_bpp, a_bpp];
        if bits.iter().any(|b| !(0..=8).contains(b)) || bits.iter().sum::<i32>() > 16 {
            warn!("unsupported dithering bpps ({r_bpp}bpp, {g_bpp}bpp, {b_bpp}bpp, {a_bpp}bpp)");
            return;
        }
        let (w, h) = (self.pixels.width() as usize, self.pixels.height() as usize);
        let mut acc: Vec<[f32; 3]> = self
            .pixels
            .pixels()
            .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
            .collect();

        for y in 0..h {
            for x in 0..w {
                let old = acc[y * w + x];
                let mut err = [0.0f32; 3];
                let px = self.pixels.get_pixel_mut(x as u32, y as u32);
                for c in 0..3 {
                    let new = if bits[c] == 0 { 0.0 } else { quantize(old[c], bits[c]) };
                    px[c] = new as u8;
                    err[c] = old[c] - new;
                }
                px[3] = if bits[3] == 0 { 255 } else { quantize(px[3] as f32, bits[3]) as u8 };

                let mut spread = |xi: usize, yi: usize, k: f32| {
                    if xi < w && yi < h {
                        let cell = &mut acc[yi * w + xi];
                        for c in 0..3 {
                            cell[c] += err[c] * k;
                        }
                    }
                };
                spread(x + 1, y, 7.0 / 16.0);
                if x > 0 {
                    spread(x - 1, y + 1, 3.0 / 16.0);
                }
                spread(x, y + 1, 5.0 / 16.0);
                spread(x + 1, y + 1, 1.0 / 16.0);
            }
        }
    }
}

macro_rules! def_image_op {
    ($($name:ident($($arg:ident: $ty:ty),*) => $method:ident);+ $(;)?) => {
        $(
            fn $name(_: &Lua, (this, $($arg),*): (AnyUserData, $($ty),*)) -> mlua::Result<()> {
                instance::modify(&this, |img: &mut Self| img.$method($($arg),*))
            }
        )+
    };
}

impl Image {
    fn lm_tostring(_: &Lua, this: AnyUserData) -> mlua::Result<String> {
        instance::with(&this, |img: &Self| {
            format!("Image(width = {}, height = {})", img.width(), img.height())
        })
    }

    fn lm_export(_: &Lua, (this, path): (AnyUserData, String)) -> mlua::Result<bool> {
        instance::with(&this, |img: &Self| img.export(&path))
    }

    fn lm_copy(_: &Lua, this: Self) -> mlua::Result<Self> {
        Ok(this)
    }

    fn lm_from_image(_: &Lua, (this, rec): (AnyUserData, Rectangle)) -> mlua::Result<Self> {
        instance::with(&this, |img: &Self| img.sub_image(rec))
    }

    fn lm_alpha_mask(_: &Lua, (this, mask): (AnyUserData, Self)) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| img.alpha_mask(&mask))
    }

    fn lm_resize(_: &Lua, (this, w, h): (AnyUserData, i32, i32)) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| img.resize(w, h, FilterType::Triangle))
    }

    fn lm_resize_nn(_: &Lua, (this, w, h): (AnyUserData, i32, i32)) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| img.resize(w, h, FilterType::Nearest))
    }

    fn lm_flip_vertical(_: &Lua, this: AnyUserData) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| imageops::flip_vertical_in_place(&mut img.pixels))
    }

    fn lm_flip_horizontal(_: &Lua, this: AnyUserData) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| imageops::flip_horizontal_in_place(&mut img.pixels))
    }

    fn lm_rotate_cw(_: &Lua, this: AnyUserData) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| img.pixels = imageops::rotate90(&img.pixels))
    }

    fn lm_rotate_ccw(_: &Lua, this: AnyUserData) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| img.pixels = imageops::rotate270(&img.pixels))
    }

    fn lm_load_colors(lua: &Lua, this: AnyUserData) -> mlua::Result<Table> {
        let colors = instance::with(&this, |img: &Self| img.colors())?;
        lua.create_sequence_from(colors)
    }

    fn lm_load_palette(lua: &Lua, this: AnyUserData) -> mlua::Result<Table> {
        let colors = instance::with(&this, |img: &Self| img.palette(256))?;
        lua.create_sequence_from(colors)
    }

    fn lm_alpha_border(_: &Lua, (this, threshold): (AnyUserData, f32)) -> mlua::Result<Rectangle> {
        instance::with(&this, |img: &Self| img.alpha_border(threshold))
    }

    fn lm_get_color(_: &Lua, (this, x, y): (AnyUserData, i32, i32)) -> mlua::Result<Color> {
        instance::with(&this, |img: &Self| img.color_at(x, y))
    }

    fn lm_draw_pixel_v(_: &Lua, (this, p, color): (AnyUserData, Vector2, Color)) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| img.draw_pixel(p.x as i32, p.y as i32, color))
    }

    fn lm_draw_line_v(
        _: &Lua,
        (this, start, end, color): (AnyUserData, Vector2, Vector2, Color),
    ) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| {
            img.draw_line(start.x as i32, start.y as i32, end.x as i32, end.y as i32, color)
        })
    }

    fn lm_draw_circle_v(
        _: &Lua,
        (this, center, radius, color): (AnyUserData, Vector2, i32, Color),
    ) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| {
            img.draw_circle(center.x as i32, center.y as i32, radius, color)
        })
    }

    fn lm_draw_rectangle(
        _: &Lua,
        (this, x, y, w, h, color): (AnyUserData, i32, i32, i32, i32, Color),
    ) -> mlua::Result<()> {
        let rec = Rectangle::new(x as f32, y as f32, w as f32, h as f32);
        instance::modify(&this, |img: &mut Self| img.draw_rectangle(rec, color))
    }

    fn lm_draw_rectangle_v(
        _: &Lua,
        (this, pos, size, color): (AnyUserData, Vector2, Vector2, Color),
    ) -> mlua::Result<()> {
        let rec = Rectangle::new(pos.x, pos.y, size.x, size.y);
        instance::modify(&this, |img: &mut Self| img.draw_rectangle(rec, color))
    }

    fn lm_draw(
        _: &Lua,
        (this, src, src_rec, dst_rec, tint): (AnyUserData, Self, Rectangle, Rectangle, Color),
    ) -> mlua::Result<()> {
        instance::modify(&this, |img: &mut Self| img.draw(&src, src_rec, dst_rec, tint))
    }

    def_image_op! {
        lm_to_pot(fill: Color) => to_pot;
        lm_crop(rec: Rectangle) => crop;
        lm_alpha_crop(threshold: f32) => alpha_crop;
        lm_alpha_clear(color: Color, threshold: f32) => alpha_clear;
        lm_alpha_premultiply() => alpha_premultiply;
        lm_resize_canvas(w: i32, h: i32, x: i32, y: i32, fill: Color) => resize_canvas;
        lm_mipmaps() => gen_mipmaps;
        lm_dither(r_bpp: i32, g_bpp: i32, b_bpp: i32, a_bpp: i32) => dither;
        lm_color_tint(color: Color) => tint;
        lm_color_invert() => invert;
        lm_color_grayscale() => grayscale;
        lm_color_contrast(contrast: f32) => contrast;
        lm_color_brightness(brightness: i32) => brightness;
        lm_color_replace(color: Color, with: Color) => replace;
        lm_clear_background(color: Color) => clear;
        lm_draw_pixel(x: i32, y: i32, color: Color) => draw_pixel;
        lm_draw_line(x0: i32, y0: i32, x1: i32, y1: i32, color: Color) => draw_line;
        lm_draw_circle(x: i32, y: i32, radius: i32, color: Color) => draw_circle;
        lm_draw_rectangle_rec(rec: Rectangle, color: Color) => draw_rectangle;
        lm_draw_rectangle_lines(rec: Rectangle, thick: i32, color: Color) => draw_rectangle_lines;
    }

    fn lm_get_width(_: &Lua, this: AnyUserData) -> mlua::Result<i32> {
        instance::with(&this, Self::width)
    }

    fn lm_get_height(_: &Lua, this: AnyUserData) -> mlua::Result<i32> {
        instance::with(&this, Self::height)
    }

    fn lm_get_format(_: &Lua, _: AnyUserData) -> mlua::Result<i32> {
        Ok(PIXELFORMAT_RGBA8)
    }

    fn lm_get_mipmaps(_: &Lua, this: AnyUserData) -> mlua::Result<i32> {
        instance::with(&this, |img: &Self| img.mipmaps)
    }

    /// Method table shared by the bound type and the `ImageXxx` globals.
    pub(crate) fn methods(lua: &Lua) -> mlua::Result<Vec<(&'static str, mlua::Function)>> {
        Ok(vec![
            ("Export", lua.create_function(Self::lm_export)?),
            ("Copy", lua.create_function(Self::lm_copy)?),
            ("FromImage", lua.create_function(Self::lm_from_image)?),
            ("ToPOT", lua.create_function(Self::lm_to_pot)?),
            ("Crop", lua.create_function(Self::lm_crop)?),
            ("AlphaCrop", lua.create_function(Self::lm_alpha_crop)?),
            ("AlphaClear", lua.create_function(Self::lm_alpha_clear)?),
            ("AlphaMask", lua.create_function(Self::lm_alpha_mask)?),
            ("AlphaPremultiply", lua.create_function(Self::lm_alpha_premultiply)?),
            ("Resize", lua.create_function(Self::lm_resize)?),
            ("ResizeNN", lua.create_function(Self::lm_resize_nn)?),
            ("ResizeCanvas", lua.create_function(Self::lm_resize_canvas)?),
            ("FlipVertical", lua.create_function(Self::lm_flip_vertical)?),
            ("FlipHorizontal", lua.create_function(Self::lm_flip_horizontal)?),
            ("RotateCW", lua.create_function(Self::lm_rotate_cw)?),
            ("RotateCCW", lua.create_function(Self::lm_rotate_ccw)?),
            ("Mipmaps", lua.create_function(Self::lm_mipmaps)?),
            ("Dither", lua.create_function(Self::lm_dither)?),
            ("ColorTint", lua.create_function(Self::lm_color_tint)?),
            ("ColorInvert", lua.create_function(Self::lm_color_invert)?),
            ("ColorGrayscale", lua.create_function(Self::lm_color_grayscale)?),
            ("ColorContrast", lua.create_function(Self::lm_color_contrast)?),
            ("ColorBrightness", lua.create_function(Self::lm_color_brightness)?),
            ("ColorReplace", lua.create_function(Self::lm_color_replace)?),
            ("LoadColors", lua.create_function(Self::lm_load_colors)?),
            ("LoadPalette", lua.create_function(Self::lm_load_palette)?),
            ("GetAlphaBorder", lua.create_function(Self::lm_alpha_border)?),
            ("GetColor", lua.create_function(Self::lm_get_color)?),
            ("ClearBackground", lua.create_function(Self::lm_clear_background)?),
            ("DrawPixel", lua.create_function(Self::lm_draw_pixel)?),
            ("DrawPixelV", lua.create_function(Self::lm_draw_pixel_v)?),
            ("DrawLine", lua.create_function(Self::lm_draw_line)?),
            ("DrawLineV", lua.create_function(Self::lm_draw_line_v)?),
            ("DrawCircle", lua.create_function(Self::lm_draw_circle)?),
            ("DrawCircleV", lua.create_function(Self::lm_draw_circle_v)?),
            ("DrawRectangle", lua.create_function(Self::lm_draw_rectangle)?),
            ("DrawRectangleV", lua.create_function(Self::lm_draw_rectangle_v)?),
            ("DrawRectangleRec", lua.create_function(Self::lm_draw_rectangle_rec)?),
            ("DrawRectangleLines", lua.create_function(Self::lm_draw_rectangle_lines)?),
            ("Draw", lua.create_function(Self::lm_draw)?),
        ])
    }
}

impl Bound for Image {
    const NAME: &'static str = "Image";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_function!(lua, def, "?width", Self::lm_get_width);
        insert_function!(lua, def, "?height", Self::lm_get_height);
        insert_function!(lua, def, "?format", Self::lm_get_format);
        insert_function!(lua, def, "?mipmaps", Self::lm_get_mipmaps);
        for (name, func) in Self::methods(lua)? {
            def.push(name, func);
        }
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgba(255, 0, 0, 255);

    #[test]
    fn crop_clips_to_bounds() {
        let mut img = Image::filled(10, 10, RED);
        img.crop(Rectangle::new(-2.0, 5.0, 6.0, 20.0));
        assert_eq!((img.width(), img.height()), (4, 5));
    }

    #[test]
    fn alpha_border_finds_opaque_box() {
        let mut img = Image::filled(8, 8, Color::BLANK);
        img.draw_rectangle(Rectangle::new(2.0, 3.0, 3.0, 2.0), RED);
        assert_eq!(img.alpha_border(0.0), Rectangle::new(2.0, 3.0, 3.0, 2.0));
        img.alpha_crop(0.0);
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[test]
    fn line_reaches_both_ends() {
        let mut img = Image::filled(5, 5, Color::BLANK);
        img.draw_line(0, 0, 4, 2, RED);
        assert_eq!(img.color_at(0, 0), RED);
        assert_eq!(img.color_at(4, 2), RED);
        assert_eq!(img.color_at(4, 4), Color::BLANK);
    }

    #[test]
    fn out_of_bounds_pixel_is_blank() {
        let img = Image::filled(2, 2, RED);
        assert_eq!(img.color_at(5, 0), Color::BLANK);
    }

    #[test]
    fn to_pot_pads_with_fill() {
        let mut img = Image::filled(3, 5, RED);
        img.to_pot(Color::BLANK);
        assert_eq!((img.width(), img.height()), (4, 8));
        assert_eq!(img.color_at(3, 0), Color::BLANK);
        assert_eq!(img.color_at(2, 4), RED);
    }

    #[test]
    fn color_ops() {
        let mut img = Image::filled(1, 1, Color::rgba(100, 150, 200, 255));
        img.invert();
        assert_eq!(img.color_at(0, 0), Color::rgba(155, 105, 55, 255));
        img.brightness(200);
        assert_eq!(img.color_at(0, 0), Color::rgba(255, 255, 255, 255));
        img.replace(Color::WHITE, RED);
        assert_eq!(img.color_at(0, 0), RED);
    }

    #[test]
    fn palette_skips_transparent_and_duplicates() {
        let mut img = Image::filled(4, 1, Color::BLANK);
        img.draw_pixel(1, 0, RED);
        img.draw_pixel(2, 0, RED);
        img.draw_pixel(3, 0, Color::WHITE);
        assert_eq!(img.palette(256), vec![RED, Color::WHITE]);
    }

    #[test]
    fn draw_blends_and_clips() {
        let mut dst = Image::filled(4, 4, Color::BLACK);
        let src = Image::filled(2, 2, Color::WHITE);
        dst.draw(&src, Rectangle::new(0.0, 0.0, 2.0, 2.0), Rectangle::new(3.0, 3.0, 2.0, 2.0), Color::WHITE);
        assert_eq!(dst.color_at(3, 3), Color::WHITE);
        assert_eq!(dst.color_at(2, 2), Color::BLACK);
    }

    #[test]
    fn huge_circle_fills_the_image() {
        let mut img = Image::filled(10, 10, Color::BLANK);
        img.draw_circle(5, 5, 50_000, RED);
        assert!(img.colors().iter().all(|&c| c == RED));

        let mut img = Image::filled(4, 4, Color::BLANK);
        img.draw_circle(i32::MIN, i32::MAX, i32::MAX, RED);
        assert!(img.colors().iter().all(|&c| c == Color::BLANK));
    }

    #[test]
    fn far_line_endpoints_are_clipped() {
        let mut img = Image::filled(5, 5, Color::BLANK);
        img.draw_line(0, 0, i32::MAX, 0, RED);
        assert!((0..5).all(|x| img.color_at(x, 0) == RED));
        assert_eq!(img.color_at(0, 1), Color::BLANK);

        img.draw_line(i32::MIN, 4, i32::MAX, 4, RED);
        assert!((0..5).all(|x| img.color_at(x, 4) == RED));

        img.draw_line(-10, -10, -1, i32::MAX, RED);
        assert_eq!(img.color_at(0, 2), Color::BLANK);
    }

    #[test]
    fn empty_cellular_is_not_generated() {
        let img = Image::cellular(i32::MAX, 0, 16);
        assert_eq!(img.height(), 0);
        assert!(img.pixels.is_empty());
        let img = Image::cellular(-3, 5, 0);
        assert_eq!((img.width(), img.height()), (0, 5));
    }

    #[test]
    fn cellular_covers_every_pixel() {
        let img = Image::cellular(17, 9, 4);
        assert_eq!((img.width(), img.height()), (17, 9));
        assert!(img.colors().iter().all(|c| c.a == 255 && c.r == c.g && c.g == c.b));
    }

    #[test]
    fn mipmap_chain_reaches_one_pixel() {
        let mut img = Image::filled(4, 4, RED);
        assert_eq!(img.mipmaps, 1);
        img.gen_mipmaps();
        assert_eq!(img.mipmaps, 3);

        let mut img = Image::filled(5, 1, RED);
        img.gen_mipmaps();
        assert_eq!(img.mipmaps, 3);
    }

    #[test]
    fn dither_keeps_only_expressible_levels() {
        let mut img = Image::filled(4, 4, Color::rgba(128, 128, 128, 200));
        img.dither(1, 1, 1, 1);
        let colors = img.colors();
        assert!(colors
            .iter()
            .all(|c| [c.r, c.g, c.b, c.a].iter().all(|&v| v == 0 || v == 255)));
        let lit = colors.iter().filter(|c| c.r == 255).count();
        assert!(lit > 0 && lit < 16);
        assert!(colors.iter().all(|c| c.a == 255));

        let mut img = Image::filled(2, 2, Color::rgba(100, 150, 200, 255));
        img.dither(5, 6, 5, 0);
        let on_level = |v: u8, bits: i32| quantize(v as f32, bits) as u8 == v;
        assert!(img
            .colors()
            .iter()
            .all(|c| c.a == 255 && on_level(c.r, 5) && on_level(c.g, 6) && on_level(c.b, 5)));
    }

    #[test]
    fn dither_refuses_too_many_bits() {
        let before = Image::filled(2, 2, Color::rgba(100, 150, 200, 255));
        let mut img = before.clone();
        img.dither(8, 8, 8, 8);
        assert_eq!(img, before);
    }

    #[test]
    fn oversized_raw_header_is_an_error() {
        let err = Image::from_raw(&[0; 16], 2, 2, PIXELFORMAT_RGBA8, usize::MAX - 4).unwrap_err();
        assert!(err.to_string().contains("raw image data too short"));
    }

    #[test]
    fn raw_rejects_other_formats() {
        assert!(matches!(Image::from_raw(&[0; 16], 2, 2, 4, 0), Err(Error::PixelFormat(4))));
        let img = Image::from_raw(&[7; 20], 2, 2, PIXELFORMAT_RGBA8, 4).unwrap();
        assert_eq!(img.color_at(1, 1), Color::rgba(7, 7, 7, 7));
    }
}
