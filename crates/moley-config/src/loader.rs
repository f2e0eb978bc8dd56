use std::path::Path;

use moley_domain::{AppConfig, Expose, Ingress, IngressMode, Protocol, Target, Tunnel, TunnelId};

use crate::error::ConfigError;
use crate::raw::{RawApp, RawConfig};

const ENV_TUNNEL_ID: &str = "MOLEY_TUNNEL_ID";
const ENV_TUNNEL_ZONE: &str = "MOLEY_TUNNEL_ZONE";

/// Loads a tunnel and its ingress rules from a YAML file, then applies any
/// `MOLEY_TUNNEL_ID` / `MOLEY_TUNNEL_ZONE` environment overrides on top —
/// handy for running the same config file against a throwaway tunnel in CI.
pub fn load_tunnel_config(path: &Path) -> Result<(Tunnel, Ingress), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut raw: RawConfig = serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;

    if let Ok(id) = std::env::var(ENV_TUNNEL_ID) {
        raw.tunnel_id = id;
    }
    if let Ok(zone) = std::env::var(ENV_TUNNEL_ZONE) {
        raw.zone = zone;
    }

    convert(raw)
}

fn convert(raw: RawConfig) -> Result<(Tunnel, Ingress), ConfigError> {
    let tunnel_id = TunnelId::parse(&raw.tunnel_id)?;
    let tunnel = Tunnel::new(tunnel_id);

    let mode = match raw.mode.as_deref() {
        Some(m) => IngressMode::parse(m)?,
        None => IngressMode::default(),
    };

    let apps = raw.apps.into_iter().map(convert_app).collect::<Result<Vec<_>, _>>()?;
    let ingress = Ingress::new(raw.zone, mode, apps)?;

    Ok((tunnel, ingress))
}

fn convert_app(raw: RawApp) -> Result<AppConfig, ConfigError> {
    let protocol = Protocol::parse(&raw.protocol)?;
    let target = Target::new(raw.hostname, raw.port, protocol)?;
    let expose = Expose::new(raw.subdomain)?;
    Ok(AppConfig { target, expose })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("moley.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_minimal_subdomain_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
tunnel_id: 6ba7b810-9dad-11d1-80b4-00c04fd430c8
zone: moley.dev
apps:
  - hostname: localhost
    port: 3000
    subdomain: app
"#,
        );

        let (tunnel, ingress) = load_tunnel_config(&path).unwrap();
        assert_eq!(tunnel.name(), "moley-6ba7b810-9dad-11d1-80b4-00c04fd430c8");
        assert_eq!(ingress.mode, IngressMode::Subdomain);
        assert_eq!(ingress.apps.len(), 1);
    }

    #[test]
    fn rejects_an_unknown_ingress_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
tunnel_id: 6ba7b810-9dad-11d1-80b4-00c04fd430c8
zone: moley.dev
mode: round-robin
apps: []
"#,
        );

        assert!(load_tunnel_config(&path).is_err());
    }

    #[test]
    fn env_override_replaces_the_configured_zone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
tunnel_id: 6ba7b810-9dad-11d1-80b4-00c04fd430c8
zone: moley.dev
apps: []
"#,
        );

        std::env::set_var(ENV_TUNNEL_ZONE, "override.dev");
        let result = load_tunnel_config(&path);
        std::env::remove_var(ENV_TUNNEL_ZONE);

        let (_, ingress) = result.unwrap();
        assert_eq!(ingress.zone, "override.dev");
    }
}
