use std::rc::Rc;

use log::info;
use mlua::{Lua, Table};

use super::{file_type, read_file};
use crate::backend::Backend;
use crate::insert_global;
use crate::types::{Music, Sound};

/// Forward a global to an instance method: `PlaySound(s)` is `s:Play()`.
macro_rules! insert_forward {
    ($lua:ident, $table:ident, $ty:ty, $($name:expr => $method:ident($($arg:ident: $argty:ty),*)),+ $(,)?) => {
        $(
            insert_global!($lua, $table, $name, |_, (this, $($arg),*): ($ty, $($argty),*)| {
                Ok(this.$method($($arg),*))
            });
        )+
    };
}

pub fn register(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_backend!(lua, g, rl, "InitAudioDevice", |b, (): ()| {
        b.init_audio_device();
        info!("audio device ready: {}", b.is_audio_device_ready());
    });
    insert_backend!(lua, g, rl, "CloseAudioDevice", |b, (): ()| {
        b.close_audio_device();
        info!("audio device closed");
    });
    insert_backend!(lua, g, rl, "IsAudioDeviceReady", |b, (): ()| b.is_audio_device_ready());
    insert_backend!(lua, g, rl, "SetMasterVolume", |b, volume: f32| b.set_master_volume(volume));

    let b = Rc::clone(rl);
    insert_global!(lua, g, "LoadSound", move |_, path: String| {
        let data = read_file(&path)?;
        let info = b.load_sound(file_type(&path), &data)?;
        Ok(Sound::new(info, Rc::clone(&b)))
    });
    insert_forward!(lua, g, Sound,
        "PlaySound" => play(),
        "StopSound" => stop(),
        "PauseSound" => pause(),
        "ResumeSound" => resume(),
        "IsSoundPlaying" => is_playing(),
        "SetSoundVolume" => set_volume(volume: f32),
        "SetSoundPitch" => set_pitch(pitch: f32),
    );

    let b = Rc::clone(rl);
    insert_global!(lua, g, "LoadMusicStream", move |_, path: String| {
        let data = read_file(&path)?;
        let info = b.load_music(file_type(&path), &data)?;
        Ok(Music::new(info, Rc::clone(&b)))
    });
    insert_forward!(lua, g, Music,
        "PlayMusicStream" => play(),
        "StopMusicStream" => stop(),
        "PauseMusicStream" => pause(),
        "ResumeMusicStream" => resume(),
        "UpdateMusicStream" => update(),
        "IsMusicStreamPlaying" => is_playing(),
        "SetMusicVolume" => set_volume(volume: f32),
        "SetMusicPitch" => set_pitch(pitch: f32),
        "GetMusicTimeLength" => time_length(),
        "GetMusicTimePlayed" => time_played(),
    );
    Ok(())
}
