//! Platform-specific install and user data locations.

use std::path::PathBuf;

#[cfg(windows)]
pub fn game_dirs() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from(r"C:\Program Files\Factorio"),
        PathBuf::from(r"C:\Program Files (x86)\Steam\steamapps\common\Factorio"),
    ];
    if let Some(steam) = steam_install_path() {
        candidates.push(steam.join(r"steamapps\common\Factorio"));
    }
    candidates
}

#[cfg(windows)]
fn steam_install_path() -> Option<PathBuf> {
    use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_QUERY_VALUE};
    use winreg::RegKey;

    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let key = hklm
        .open_subkey_with_flags(r"SOFTWARE\Wow6432Node\Valve\Steam", KEY_QUERY_VALUE)
        .ok()?;
    let path: String = key.get_value("InstallPath").ok()?;
    Some(PathBuf::from(path))
}

#[cfg(windows)]
pub fn data_dirs() -> Vec<PathBuf> {
    // %APPDATA%
    dirs::config_dir()
        .map(|appdata| vec![appdata.join("Factorio")])
        .unwrap_or_default()
}

#[cfg(target_os = "macos")]
pub fn game_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(
            "Library/Application Support/Steam/steamapps/common/Factorio/factorio.app/Contents",
        ));
    }
    candidates.push(PathBuf::from("/Applications/factorio.app/Contents"));
    candidates
}

#[cfg(target_os = "macos")]
pub fn data_dirs() -> Vec<PathBuf> {
    dirs::home_dir()
        .map(|home| vec![home.join("Library/Application Support/factorio")])
        .unwrap_or_default()
}

#[cfg(not(any(windows, target_os = "macos")))]
pub fn game_dirs() -> Vec<PathBuf> {
    match dirs::home_dir() {
        Some(home) => vec![
            home.join(".steam/steam/SteamApps/common/Factorio"),
            home.join(".steam/steam/steamapps/common/Factorio"),
            home.join(".factorio"),
        ],
        None => Vec::new(),
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
pub fn data_dirs() -> Vec<PathBuf> {
    dirs::home_dir()
        .map(|home| vec![home.join(".factorio")])
        .unwrap_or_default()
}
