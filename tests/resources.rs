use std::fs;
use std::rc::Rc;

use raylua::backend::{Headless, Stats};
use raylua::dispatch::Policy;
use raylua::Runtime;

fn setup() -> (Rc<Headless>, Runtime) {
    let hl = Rc::new(Headless::default());
    let rt = Runtime::new(Policy::default(), hl.clone()).unwrap();
    (hl, rt)
}

/// Stereo 16-bit PCM WAV of silence.
fn wav(rate: u32, frames: u32) -> Vec<u8> {
    let len = frames * 4;
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&(rate * 4).to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&len.to_le_bytes());
    out.resize(out.len() + len as usize, 0);
    out
}

fn collect(rt: &Runtime) {
    rt.lua().gc_collect().unwrap();
    rt.lua().gc_collect().unwrap();
}

#[test]
fn texture_is_unloaded_exactly_once() {
    let (hl, rt) = setup();
    rt.exec(
        r#"
        tex = LoadTextureFromImage(GenImageColor(4, 4, RED))
        alias = tex
        DrawTexture(tex, 0, 0, WHITE)
        assert(tex.width == 4 and tex.height == 4)
        "#,
    )
    .unwrap();
    collect(&rt);
    assert_eq!(hl.stats().textures_unloaded, 0);
    assert_eq!(hl.live_textures(), 1);

    rt.exec("tex = nil; alias = nil").unwrap();
    collect(&rt);
    let stats = hl.stats();
    assert_eq!((stats.textures_loaded, stats.textures_unloaded), (1, 1));
    assert_eq!(hl.live_textures(), 0);
}

#[test]
fn mipmaps_update_the_instance() {
    let (_hl, rt) = setup();
    rt.exec(
        r#"
        local tex = LoadTextureFromImage(GenImageColor(4, 4, RED))
        assert(tex.mipmaps == 1)
        GenTextureMipmaps(tex)
        assert(tex.mipmaps == 3)
        "#,
    )
    .unwrap();
}

#[test]
fn font_texture_keeps_the_font_alive() {
    let (hl, rt) = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono.ttf");
    fs::write(&path, b"not really a font").unwrap();
    rt.lua()
        .globals()
        .set("path", path.to_str().unwrap())
        .unwrap();

    rt.exec(
        r#"
        local font = LoadFont(path)
        assert(font.baseSize == 32)
        atlas = font.texture
        "#,
    )
    .unwrap();
    collect(&rt);
    assert_eq!(hl.stats().fonts_unloaded, 0);
    rt.exec("assert(atlas.width == 512)").unwrap();

    rt.exec("atlas = nil").unwrap();
    collect(&rt);
    let stats = hl.stats();
    assert_eq!((stats.fonts_loaded, stats.fonts_unloaded), (1, 1));
    assert_eq!((stats.textures_loaded, stats.textures_unloaded), (1, 1));
}

#[test]
fn default_font_is_never_unloaded() {
    let (hl, rt) = setup();
    rt.exec(
        r#"
        local f = GetFontDefault()
        assert(f.baseSize == 10)
        local again = LoadFontFromString(".ttf", "")
        assert(again.texture.id == f.texture.id)
        "#,
    )
    .unwrap();
    collect(&rt);
    assert_eq!(hl.stats(), Stats::default());
    rt.exec(r#"DrawText("still here", 0, 0, 10, BLACK)"#).unwrap();
}

#[test]
fn font_atlas_rejects_mipmaps() {
    let (hl, rt) = setup();
    let err = rt
        .exec("GenTextureMipmaps(GetFontDefault().texture)")
        .unwrap_err();
    assert!(err.to_string().contains("Texture is a read-only reference"));
    rt.exec("assert(GetFontDefault().texture.mipmaps == 1)").unwrap();
    assert_eq!(hl.stats(), Stats::default());
}

#[test]
fn missing_files_raise() {
    let (_hl, rt) = setup();
    let err = rt.exec(r#"LoadTexture("no/such/file.png")"#).unwrap_err();
    assert!(err.to_string().contains("no/such/file.png"));
    let err = rt.exec(r#"LoadSound("no/such/file.wav")"#).unwrap_err();
    assert!(err.to_string().contains("no/such/file.wav"));
}

#[test]
fn undecodable_audio_raises() {
    let (hl, rt) = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.ogg");
    fs::write(&path, [7u8; 64]).unwrap();
    rt.lua()
        .globals()
        .set("path", path.to_str().unwrap())
        .unwrap();
    let err = rt.exec("LoadSound(path)").unwrap_err();
    assert!(err.to_string().contains("cannot decode ogg audio"));
    assert_eq!(hl.stats().sounds_loaded, 0);
}

#[test]
fn closing_the_state_releases_everything() {
    let hl = Rc::new(Headless::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beep.wav");
    fs::write(&path, wav(22050, 100)).unwrap();

    let rt = Runtime::new(Policy::default(), hl.clone()).unwrap();
    rt.lua()
        .globals()
        .set("path", path.to_str().unwrap())
        .unwrap();
    rt.exec(
        r#"
        InitAudioDevice()
        sound = LoadSound(path)
        music = LoadMusicStream(path)
        tex = LoadTextureFromImage(GenImageChecked(8, 8, 2, 2, RED, BLUE))
        PlaySound(sound)
        assert(IsSoundPlaying(sound))
        assert(sound.frameCount == 100)
        assert(math.abs(GetMusicTimeLength(music) - 100 / 22050) < 1e-6)
        "#,
    )
    .unwrap();
    drop(rt);

    let stats = hl.stats();
    assert_eq!(stats.sounds_loaded, stats.sounds_unloaded);
    assert_eq!(stats.music_loaded, stats.music_unloaded);
    assert_eq!(stats.textures_loaded, stats.textures_unloaded);
    assert_eq!(stats.sounds_loaded, 1);
}
