use serde::{Deserialize, Serialize};

use moley_domain::{Ingress, IngressMode, Tunnel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflaredIngressRule {
    pub service: String,
    pub hostname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflaredConfigFile {
    pub tunnel: String,
    #[serde(rename = "credentials-file")]
    pub credentials_file: String,
    pub logfile: String,
    pub loglevel: String,
    pub ingress: Vec<CloudflaredIngressRule>,
}

/// Builds the cloudflared ingress file for `tunnel`/`ingress`. The
/// catch-all `http_status:404` rule is always appended last, regardless
/// of ingress mode, since cloudflared matches rules top to bottom and a
/// tunnel with no fallback rule refuses to start.
pub fn render_ingress_file(tunnel: &Tunnel, ingress: &Ingress, credentials_file: String) -> CloudflaredConfigFile {
    let mut rules: Vec<CloudflaredIngressRule> = match ingress.mode {
        IngressMode::Subdomain => ingress
            .apps
            .iter()
            .map(|app| CloudflaredIngressRule {
                service: app.target.target_url(),
                hostname: format!("{}.{}", app.expose.subdomain, ingress.zone),
            })
            .collect(),
        IngressMode::Wildcard => ingress
            .apps
            .iter()
            .map(|app| CloudflaredIngressRule {
                service: app.target.target_url(),
                hostname: format!("*.{}", ingress.zone),
            })
            .collect(),
    };

    rules.push(CloudflaredIngressRule { service: "http_status:404".into(), hostname: "*".into() });

    CloudflaredConfigFile {
        tunnel: tunnel.name(),
        credentials_file,
        logfile: "cloudflared.log".into(),
        loglevel: "info".into(),
        ingress: rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moley_domain::{AppConfig, Expose, Protocol, Target, TunnelId};

    fn sample_tunnel() -> Tunnel {
        Tunnel::new(TunnelId::parse("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap())
    }

    #[test]
    fn catch_all_rule_is_always_last() {
        let tunnel = sample_tunnel();
        let ingress = Ingress::new(
            "moley.dev".into(),
            IngressMode::Subdomain,
            vec![AppConfig {
                target: Target::new("localhost".into(), 3000, Protocol::Http).unwrap(),
                expose: Expose::new("api".into()).unwrap(),
            }],
        )
        .unwrap();

        let file = render_ingress_file(&tunnel, &ingress, "/tmp/creds.json".into());
        assert_eq!(file.ingress.last().unwrap().service, "http_status:404");
        assert_eq!(file.ingress.last().unwrap().hostname, "*");
        assert_eq!(file.ingress.len(), 2);
    }

    #[test]
    fn wildcard_mode_emits_a_single_star_hostname_per_app() {
        let tunnel = sample_tunnel();
        let ingress = Ingress::new(
            "moley.dev".into(),
            IngressMode::Wildcard,
            vec![AppConfig {
                target: Target::new("localhost".into(), 3000, Protocol::Http).unwrap(),
                expose: Expose::new("api".into()).unwrap(),
            }],
        )
        .unwrap();

        let file = render_ingress_file(&tunnel, &ingress, "/tmp/creds.json".into());
        assert_eq!(file.ingress[0].hostname, "*.moley.dev");
    }
}
