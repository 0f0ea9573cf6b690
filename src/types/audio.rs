use std::rc::Rc;

use mlua::{AnyUserData, Lua};

use crate::backend::{AudioHandle, Backend, MusicInfo, Playback, SoundInfo};
use crate::dispatch::TypeDef;
use crate::instance::{self, Bound};
use crate::{bound_value, insert_function};

#[derive(Clone)]
pub struct Sound {
    pub info: SoundInfo,
    backend: Rc<dyn Backend>,
}

#[derive(Clone)]
pub struct Music {
    pub info: MusicInfo,
    backend: Rc<dyn Backend>,
}

bound_value!(Sound, Music);

/// Playback controls shared by sounds and music streams.
macro_rules! def_playback {
    () => {
        pub fn play(&self) {
            self.backend.playback(self.handle(), Playback::Play);
        }

        pub fn stop(&self) {
            self.backend.playback(self.handle(), Playback::Stop);
        }

        pub fn pause(&self) {
            self.backend.playback(self.handle(), Playback::Pause);
        }

        pub fn resume(&self) {
            self.backend.playback(self.handle(), Playback::Resume);
        }

        pub fn is_playing(&self) -> bool {
            self.backend.is_playing(self.handle())
        }

        pub fn set_volume(&self, volume: f32) {
            self.backend.set_volume(self.handle(), volume);
        }

        pub fn set_pitch(&self, pitch: f32) {
            self.backend.set_pitch(self.handle(), pitch);
        }

        fn lm_play(_: &Lua, this: Self) -> mlua::Result<()> {
            this.play();
            Ok(())
        }

        fn lm_stop(_: &Lua, this: Self) -> mlua::Result<()> {
            this.stop();
            Ok(())
        }

        fn lm_pause(_: &Lua, this: Self) -> mlua::Result<()> {
            this.pause();
            Ok(())
        }

        fn lm_resume(_: &Lua, this: Self) -> mlua::Result<()> {
            this.resume();
            Ok(())
        }

        fn lm_is_playing(_: &Lua, this: Self) -> mlua::Result<bool> {
            Ok(this.is_playing())
        }

        fn lm_set_volume(_: &Lua, (this, volume): (Self, f32)) -> mlua::Result<()> {
            this.set_volume(volume);
            Ok(())
        }

        fn lm_set_pitch(_: &Lua, (this, pitch): (Self, f32)) -> mlua::Result<()> {
            this.set_pitch(pitch);
            Ok(())
        }

        fn lm_get_frame_count(_: &Lua, this: AnyUserData) -> mlua::Result<u32> {
            instance::with(&this, |this: &Self| this.info.frame_count)
        }
    };
}

macro_rules! insert_playback {
    ($lua:ident, $def:ident) => {
        insert_function!($lua, $def, "Play", Self::lm_play);
        insert_function!($lua, $def, "Stop", Self::lm_stop);
        insert_function!($lua, $def, "Pause", Self::lm_pause);
        insert_function!($lua, $def, "Resume", Self::lm_resume);
        insert_function!($lua, $def, "IsPlaying", Self::lm_is_playing);
        insert_function!($lua, $def, "SetVolume", Self::lm_set_volume);
        insert_function!($lua, $def, "SetPitch", Self::lm_set_pitch);
        insert_function!($lua, $def, "?frameCount", Self::lm_get_frame_count);
    };
}

impl Sound {
    pub fn new(info: SoundInfo, backend: Rc<dyn Backend>) -> Self {
        Self { info, backend }
    }

    fn handle(&self) -> AudioHandle {
        AudioHandle::Sound(self.info.id)
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Sound(id = {}, frameCount = {})",
            this.info.id, this.info.frame_count
        ))
    }

    def_playback!();
}

impl Bound for Sound {
    const NAME: &'static str = "Sound";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_playback!(lua, def);
        Ok(def)
    }

    fn release(&mut self) {
        self.backend.unload_audio(self.handle());
    }
}

impl Music {
    pub fn new(info: MusicInfo, backend: Rc<dyn Backend>) -> Self {
        Self { info, backend }
    }

    fn handle(&self) -> AudioHandle {
        AudioHandle::Music(self.info.id)
    }

    pub fn update(&self) {
        self.backend.update_music(self.info.id);
    }

    pub fn time_length(&self) -> f32 {
        self.backend.music_time_length(self.info.id)
    }

    pub fn time_played(&self) -> f32 {
        self.backend.music_time_played(self.info.id)
    }

    fn lm_tostring(_: &Lua, this: Self) -> mlua::Result<String> {
        Ok(format!(
            "Music(id = {}, frameCount = {}, looping = {})",
            this.info.id, this.info.frame_count, this.info.looping
        ))
    }

    fn lm_update(_: &Lua, this: Self) -> mlua::Result<()> {
        this.update();
        Ok(())
    }

    fn lm_time_length(_: &Lua, this: Self) -> mlua::Result<f32> {
        Ok(this.time_length())
    }

    fn lm_time_played(_: &Lua, this: Self) -> mlua::Result<f32> {
        Ok(this.time_played())
    }

    fn lm_get_looping(_: &Lua, this: AnyUserData) -> mlua::Result<bool> {
        instance::with(&this, |m: &Self| m.info.looping)
    }

    fn lm_set_looping(_: &Lua, (this, looping): (AnyUserData, bool)) -> mlua::Result<()> {
        instance::modify(&this, |m: &mut Self| {
            m.info.looping = looping;
            m.backend.set_music_looping(m.info.id, looping);
        })
    }

    def_playback!();
}

impl Bound for Music {
    const NAME: &'static str = "Music";

    fn metatable(lua: &Lua) -> mlua::Result<TypeDef> {
        let mut def = TypeDef::new(Self::NAME);
        insert_function!(lua, def, "__tostring", Self::lm_tostring);
        insert_playback!(lua, def);
        insert_function!(lua, def, "Update", Self::lm_update);
        insert_function!(lua, def, "GetTimeLength", Self::lm_time_length);
        insert_function!(lua, def, "GetTimePlayed", Self::lm_time_played);
        insert_function!(lua, def, "?looping", Self::lm_get_looping);
        insert_function!(lua, def, "=looping", Self::lm_set_looping);
        Ok(def)
    }

    fn release(&mut self) {
        self.backend.unload_audio(self.handle());
    }
}
