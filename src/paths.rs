use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::MediaError;

pub(crate) const SERIES_STORE_FILE: &str = ".videos.json";
pub(crate) const WATCH_OPTIONS_FILE: &str = ".watch-options.json";
const GLOBAL_RECORD_FILE: &str = ".videorecord.jsonl";
const DEFAULT_REMOTE_PLAYER: &str = "spotify";

pub(crate) fn series_store_path(dir: &Path) -> PathBuf {
    dir.join(SERIES_STORE_FILE)
}

pub(crate) fn global_record_path() -> Result<PathBuf> {
    global_record_path_from_env(env::var_os("BABIES_GLOBAL_RECORD"), dirs::home_dir())
}

pub(crate) fn global_record_path_from_env(
    env_value: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    match env_value {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => {
            let home = home.ok_or_else(|| {
                MediaError::ConfigurationMissing(
                    "unable to resolve home directory for the global record".to_string(),
                )
            })?;
            Ok(home.join(GLOBAL_RECORD_FILE))
        }
    }
}

pub(crate) fn resolve_mpv_bin() -> PathBuf {
    resolve_mpv_bin_from_env(env::var_os("BABIES_MPV_BIN"))
}

pub(crate) fn resolve_mpv_bin_from_env(env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from("mpv"),
    }
}

pub(crate) fn resolve_remote_player() -> String {
    resolve_remote_player_from_env(env::var("BABIES_REMOTE_PLAYER").ok())
}

pub(crate) fn resolve_remote_player_from_env(env_value: Option<String>) -> String {
    match env_value {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => DEFAULT_REMOTE_PLAYER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_record_defaults_to_home() {
        let path = global_record_path_from_env(None, Some(PathBuf::from("/home/viewer")))
            .expect("home should resolve");
        assert_eq!(path, PathBuf::from("/home/viewer/.videorecord.jsonl"));
    }

    #[test]
    fn global_record_env_override_wins() {
        let path = global_record_path_from_env(
            Some(OsString::from("/tmp/record.jsonl")),
            Some(PathBuf::from("/home/viewer")),
        )
        .expect("override should resolve");
        assert_eq!(path, PathBuf::from("/tmp/record.jsonl"));
    }

    #[test]
    fn global_record_without_home_is_configuration_missing() {
        let err = global_record_path_from_env(None, None).expect_err("no home available");
        assert!(matches!(
            err.downcast_ref::<MediaError>(),
            Some(MediaError::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn empty_mpv_override_falls_back_to_default() {
        assert_eq!(
            resolve_mpv_bin_from_env(Some(OsString::new())),
            PathBuf::from("mpv")
        );
        assert_eq!(
            resolve_mpv_bin_from_env(Some(OsString::from("/opt/mpv/bin/mpv"))),
            PathBuf::from("/opt/mpv/bin/mpv")
        );
    }

    #[test]
    fn remote_player_override_is_trimmed() {
        assert_eq!(resolve_remote_player_from_env(None), "spotify");
        assert_eq!(
            resolve_remote_player_from_env(Some(" spotifyd ".to_string())),
            "spotifyd"
        );
    }
}
