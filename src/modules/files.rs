use std::fs;
use std::io::{Read, Write};
use std::path::{Path, MAIN_SEPARATOR};
use std::rc::Rc;
use std::time::UNIX_EPOCH;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use log::warn;
use mlua::{Lua, Table};

use crate::backend::Backend;
use crate::insert_global;

pub fn register(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_global!(lua, g, "LoadFileData", l_load_file_data);
    insert_global!(lua, g, "SaveFileData", l_save_file_data);
    insert_global!(lua, g, "FileExists", l_file_exists);
    insert_global!(lua, g, "DirectoryExists", l_directory_exists);
    insert_global!(lua, g, "IsFileExtension", l_is_file_extension);
    insert_global!(lua, g, "GetFileLength", l_get_file_length);
    insert_global!(lua, g, "GetFileExtension", l_get_file_extension);
    insert_global!(lua, g, "GetFileName", l_get_file_name);
    insert_global!(lua, g, "GetFileNameWithoutExt", l_get_file_name_without_ext);
    insert_global!(lua, g, "GetDirectoryPath", l_get_directory_path);
    insert_global!(lua, g, "GetPrevDirectoryPath", l_get_prev_directory_path);
    insert_global!(lua, g, "GetWorkingDirectory", l_get_working_directory);
    insert_global!(lua, g, "GetApplicationDirectory", l_get_application_directory);
    insert_global!(lua, g, "ChangeDirectory", l_change_directory);
    insert_global!(lua, g, "IsPathFile", l_is_path_file);
    insert_global!(lua, g, "LoadDirectoryFiles", l_load_directory_files);
    insert_global!(lua, g, "LoadDirectoryFilesEx", l_load_directory_files_ex);
    insert_global!(lua, g, "GetFileModTime", l_get_file_mod_time);
    // Kept under the misspelled name older scripts call.
    insert_global!(lua, g, "GetFileModTile", l_get_file_mod_time);
    insert_global!(lua, g, "CompressData", l_compress_data);
    insert_global!(lua, g, "DecompressData", l_decompress_data);
    insert_global!(lua, g, "EncodeDataBase64", l_encode_data_base64);
    insert_global!(lua, g, "DecodeDataBase64", l_decode_data_base64);

    insert_backend!(lua, g, rl, "IsFileDropped", |b, (): ()| b.is_file_dropped());
    insert_backend!(lua, g, rl, "LoadDroppedFiles", |b, (): ()| b.take_dropped_files());
    Ok(())
}

fn l_load_file_data(lua: &Lua, path: String) -> mlua::Result<Option<mlua::String>> {
    match fs::read(&path) {
        Ok(data) => lua.create_string(data).map(Some),
        Err(e) => {
            warn!("failed to read {path}: {e}");
            Ok(None)
        }
    }
}

fn l_save_file_data(_: &Lua, (path, data): (String, mlua::String)) -> mlua::Result<bool> {
    match fs::write(&path, &*data.as_bytes()) {
        Ok(()) => Ok(true),
        Err(e) => {
            warn!("failed to write {path}: {e}");
            Ok(false)
        }
    }
}

fn l_file_exists(_: &Lua, path: String) -> mlua::Result<bool> {
    Ok(Path::new(&path).is_file())
}

fn l_directory_exists(_: &Lua, path: String) -> mlua::Result<bool> {
    Ok(Path::new(&path).is_dir())
}

fn l_is_path_file(_: &Lua, path: String) -> mlua::Result<bool> {
    Ok(Path::new(&path).is_file())
}

/// Extension including the dot, or `None`.
fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(i) => Some(&name[i..]),
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// `ext` may list several extensions separated by `;`. Case is ignored.
fn has_extension(path: &str, ext: &str) -> bool {
    let Some(actual) = extension(path) else {
        return false;
    };
    ext.split(';')
        .filter(|e| !e.is_empty())
        .any(|e| e.eq_ignore_ascii_case(actual))
}

fn l_is_file_extension(_: &Lua, (path, ext): (String, String)) -> mlua::Result<bool> {
    Ok(has_extension(&path, &ext))
}

fn l_get_file_length(_: &Lua, path: String) -> mlua::Result<u64> {
    Ok(fs::metadata(&path).map(|m| m.len()).unwrap_or(0))
}

fn l_get_file_extension(_: &Lua, path: String) -> mlua::Result<Option<String>> {
    Ok(extension(&path).map(str::to_owned))
}

fn l_get_file_name(_: &Lua, path: String) -> mlua::Result<String> {
    Ok(file_name(&path).to_owned())
}

fn l_get_file_name_without_ext(_: &Lua, path: String) -> mlua::Result<String> {
    let name = file_name(&path);
    Ok(match extension(&path) {
        Some(ext) => name[..name.len() - ext.len()].to_owned(),
        None => name.to_owned(),
    })
}

fn l_get_directory_path(_: &Lua, path: String) -> mlua::Result<String> {
    Ok(match path.rfind(['/', '\\']) {
        Some(0) => path[..1].to_owned(),
        Some(i) => path[..i].to_owned(),
        None => ".".to_owned(),
    })
}

fn l_get_prev_directory_path(_: &Lua, path: String) -> mlua::Result<String> {
    let trimmed = path.trim_end_matches(['/', '\\']);
    Ok(match trimmed.rfind(['/', '\\']) {
        Some(0) => path[..1].to_owned(),
        Some(i) => trimmed[..i].to_owned(),
        None if trimmed.is_empty() => path,
        None => ".".to_owned(),
    })
}

fn l_get_working_directory(_: &Lua, _: ()) -> mlua::Result<String> {
    let cwd = std::env::current_dir().map_err(mlua::Error::external)?;
    Ok(cwd.display().to_string())
}

fn l_get_application_directory(_: &Lua, _: ()) -> mlua::Result<String> {
    let exe = std::env::current_exe().map_err(mlua::Error::external)?;
    let dir = exe.parent().unwrap_or(Path::new("."));
    Ok(format!("{}{}", dir.display(), MAIN_SEPARATOR))
}

fn l_change_directory(_: &Lua, path: String) -> mlua::Result<bool> {
    match std::env::set_current_dir(&path) {
        Ok(()) => Ok(true),
        Err(e) => {
            warn!("failed to change directory to {path}: {e}");
            Ok(false)
        }
    }
}

/// Entries of `dir`, sorted. `filter` keeps files by extension and
/// directories when it names `DIR`.
fn scan(dir: &Path, filter: Option<&str>, recursive: bool, out: &mut Vec<String>) -> std::io::Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        let shown = path.display().to_string();
        if path.is_dir() {
            if filter.map_or(true, |f| f.contains("DIR")) {
                out.push(shown);
            }
            if recursive {
                scan(&path, filter, recursive, out)?;
            }
        } else if filter.map_or(true, |f| has_extension(&shown, f)) {
            out.push(shown);
        }
    }
    Ok(())
}

fn l_load_directory_files(lua: &Lua, dir: String) -> mlua::Result<Table> {
    let mut files = Vec::new();
    if let Err(e) = scan(Path::new(&dir), None, false, &mut files) {
        warn!("failed to scan {dir}: {e}");
    }
    lua.create_sequence_from(files)
}

fn l_load_directory_files_ex(
    lua: &Lua,
    (dir, filter, recursive): (String, Option<String>, Option<bool>),
) -> mlua::Result<Table> {
    let mut files = Vec::new();
    if let Err(e) = scan(Path::new(&dir), filter.as_deref(), recursive.unwrap_or(false), &mut files) {
        warn!("failed to scan {dir}: {e}");
    }
    lua.create_sequence_from(files)
}

fn l_get_file_mod_time(_: &Lua, path: String) -> mlua::Result<i64> {
    let secs = fs::metadata(&path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs() as i64);
    Ok(secs)
}

fn l_compress_data(lua: &Lua, data: mlua::String) -> mlua::Result<mlua::String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&data.as_bytes())?;
    lua.create_string(encoder.finish()?)
}

fn l_decompress_data(lua: &Lua, data: mlua::String) -> mlua::Result<Option<mlua::String>> {
    let bytes = data.as_bytes();
    let mut out = Vec::new();
    match DeflateDecoder::new(&bytes[..]).read_to_end(&mut out) {
        Ok(_) => lua.create_string(out).map(Some),
        Err(e) => {
            warn!("failed to decompress data: {e}");
            Ok(None)
        }
    }
}

fn l_encode_data_base64(_: &Lua, data: mlua::String) -> mlua::Result<String> {
    Ok(STANDARD.encode(&*data.as_bytes()))
}

fn l_decode_data_base64(lua: &Lua, data: mlua::String) -> mlua::Result<Option<mlua::String>> {
    match STANDARD.decode(&*data.as_bytes()) {
        Ok(bytes) => lua.create_string(bytes).map(Some),
        Err(e) => {
            warn!("failed to decode base64 data: {e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_match_lists_and_ignore_case() {
        assert_eq!(extension("dir.d/file.tar.gz"), Some(".gz"));
        assert_eq!(extension("dir.d/.hidden"), None);
        assert_eq!(extension("noext"), None);
        assert!(has_extension("a/B.PNG", ".jpg;.png"));
        assert!(!has_extension("a/b.png", ".jpg"));
    }

    #[test]
    fn file_names_split_on_both_separators() {
        assert_eq!(file_name("a/b\\c.txt"), "c.txt");
        assert_eq!(file_name("c.txt"), "c.txt");
    }
}
