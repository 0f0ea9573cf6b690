use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{type_name}: '{name}' is registered twice as {bucket}")]
    Duplicate {
        type_name: &'static str,
        name: String,
        bucket: &'static str,
    },

    #[error("{type_name}: '{name}' is registered both as a method and as a readable property")]
    Collision { type_name: &'static str, name: String },

    #[error("{type_name}: '{name}' is reserved by the dispatch shim")]
    ReservedHook { type_name: &'static str, name: String },

    #[error("{type_name}: empty name after marker in '{tagged}'")]
    EmptyName { type_name: &'static str, tagged: String },

    #[error("{0} is already registered")]
    AlreadyRegistered(&'static str),

    #[error("no writable property '{name}' on {type_name}")]
    NotWritable { type_name: &'static str, name: String },

    #[error("{0} is a read-only reference")]
    ReadOnly(&'static str),

    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot decode {file_type} audio: {source}")]
    Audio {
        file_type: String,
        source: rodio::decoder::DecoderError,
    },

    #[error("unsupported pixel format {0}")]
    PixelFormat(i32),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

impl From<Error> for mlua::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Lua(e) => e,
            other => mlua::Error::external(other),
        }
    }
}
