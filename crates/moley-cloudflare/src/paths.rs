use std::path::PathBuf;

use crate::error::CloudflareError;

/// `~/.moley`, created on first use.
pub fn moley_home() -> Result<PathBuf, CloudflareError> {
    let home = dirs::home_dir().ok_or_else(|| CloudflareError::Io {
        path: "$HOME".into(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory"),
    })?;
    let folder = home.join(".moley");
    std::fs::create_dir_all(&folder)
        .map_err(|e| CloudflareError::Io { path: folder.display().to_string(), source: e })?;
    Ok(folder)
}

/// Where the rendered ingress file for `tunnel_name` lives.
pub fn tunnel_config_path(tunnel_name: &str) -> Result<PathBuf, CloudflareError> {
    let dir = moley_home()?.join("tunnels");
    std::fs::create_dir_all(&dir).map_err(|e| CloudflareError::Io { path: dir.display().to_string(), source: e })?;
    Ok(dir.join(format!("{tunnel_name}.yml")))
}

/// Where cloudflared itself writes tunnel credentials after `tunnel create`.
pub fn credentials_path(tunnel_id: &str) -> Result<PathBuf, CloudflareError> {
    let home = dirs::home_dir().ok_or_else(|| CloudflareError::Io {
        path: "$HOME".into(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory"),
    })?;
    Ok(home.join(".cloudflared").join(format!("{tunnel_id}.json")))
}
