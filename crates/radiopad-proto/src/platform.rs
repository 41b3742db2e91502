use std::path::PathBuf;

/// Default control-channel path handed to mpv via `--input-ipc-server`.
pub const DEFAULT_MPV_SOCKET: &str = "/tmp/mpv-socket";

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("radiopad")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

pub fn mpv_socket_arg(socket_path: &std::path::Path) -> String {
    format!("--input-ipc-server={}", socket_path.display())
}

pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

/// Find the mpv binary: beside the current exe first, then PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    let exe_name = mpv_binary_name();

    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let local_mpv = dir.join(exe_name);
            if local_mpv.is_file() {
                return Some(local_mpv);
            }
        }
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(exe_name))
        .find(|candidate| candidate.is_file())
}
