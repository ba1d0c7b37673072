// src/service.rs
//! Service units: named groups of certificate paths with their own expiry policy

use crate::config::{parse_duration, Config, DEFAULT_MIN_CERT_LIFETIME};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Display name of the service described by the `[global]` table
pub const UNNAMED_SERVICE: &str = "Unnamed Service";

/// Where a service's settings live in the config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKey {
    Global,
    Named(String),
}

impl std::fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKey::Global => write!(f, "global"),
            ServiceKey::Named(name) => write!(f, "namedServices.{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub name: String,
    pub cert_paths: Vec<PathBuf>,
    pub min_cert_lifetime: Duration,
}

/// Build one service from its config table.
///
/// The minimum lifetime resolves service value, then global value, then
/// [`DEFAULT_MIN_CERT_LIFETIME`]. Unparsable values are logged and skipped.
pub fn build_service(config: &Config, key: &ServiceKey, override_name: Option<&str>) -> ServiceUnit {
    let name = override_name
        .map(str::to_string)
        .unwrap_or_else(|| key.to_string());

    let (cert_paths, service_lifetime) = match key {
        ServiceKey::Global => (config.global.cert_paths.clone(), None),
        ServiceKey::Named(service) => match config.named_services.get(service) {
            Some(cfg) => (cfg.cert_paths.clone(), cfg.min_cert_lifetime.as_deref()),
            None => {
                warn!(service = %name, "No configuration found under {}", key);
                (Vec::new(), None)
            }
        },
    };

    let candidates = [
        (service_lifetime, "service"),
        (config.global.min_cert_lifetime.as_deref(), "global"),
    ];

    let mut min_cert_lifetime = DEFAULT_MIN_CERT_LIFETIME;
    for (value, scope) in candidates {
        let Some(value) = value else { continue };
        match parse_duration(value) {
            Ok(lifetime) if !lifetime.is_zero() => {
                min_cert_lifetime = lifetime;
                break;
            }
            Ok(_) => {
                error!(service = %name, scope, "Certificate lifetime must be greater than zero, ignoring");
            }
            Err(e) => {
                error!(service = %name, scope, "Could not parse duration for certificate lifetime: {}", e);
            }
        }
    }

    ServiceUnit {
        name,
        cert_paths,
        min_cert_lifetime,
    }
}

/// Collect the services to check this run.
///
/// With `only` set, just that named service. Otherwise the unnamed global
/// service followed by every named service, each built on its own task.
pub async fn discover_services(config: Arc<Config>, only: Option<&str>) -> Vec<ServiceUnit> {
    if let Some(name) = only {
        return vec![build_service(&config, &ServiceKey::Named(name.to_string()), Some(name))];
    }

    let mut services = vec![build_service(&config, &ServiceKey::Global, Some(UNNAMED_SERVICE))];

    let handles: Vec<_> = config
        .named_services
        .keys()
        .cloned()
        .map(|name| {
            let config = Arc::clone(&config);
            tokio::spawn(async move {
                build_service(&config, &ServiceKey::Named(name.clone()), Some(name.as_str()))
            })
        })
        .collect();

    for result in futures_util::future::join_all(handles).await {
        match result {
            Ok(service) => services.push(service),
            Err(e) => error!("Service discovery task failed: {}", e),
        }
    }

    services
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn config(toml_content: &str) -> Config {
        toml::from_str(toml_content).unwrap()
    }

    #[test]
    fn test_service_lifetime_wins() {
        let cfg = config(
            r#"
[global]
minCertLifetime = "240h"
[namedServices.Alpha]
certPaths = ["/a.pem", "/b.pem"]
minCertLifetime = "48h"
"#,
        );
        let s = build_service(&cfg, &ServiceKey::Named("Alpha".into()), Some("Alpha"));
        assert_eq!(s.name, "Alpha");
        assert_eq!(s.cert_paths, vec![PathBuf::from("/a.pem"), PathBuf::from("/b.pem")]);
        assert_eq!(s.min_cert_lifetime, 2 * DAY);
    }

    #[test]
    fn test_falls_back_to_global_lifetime() {
        let cfg = config(
            r#"
[global]
minCertLifetime = "240h"
[namedServices.Alpha]
certPaths = ["/a.pem"]
"#,
        );
        let s = build_service(&cfg, &ServiceKey::Named("Alpha".into()), Some("Alpha"));
        assert_eq!(s.min_cert_lifetime, 10 * DAY);
    }

    #[test]
    fn test_unparsable_service_lifetime_uses_global() {
        let cfg = config(
            r#"
[global]
minCertLifetime = "240h"
[namedServices.Alpha]
minCertLifetime = "a fortnight"
"#,
        );
        let s = build_service(&cfg, &ServiceKey::Named("Alpha".into()), Some("Alpha"));
        assert_eq!(s.min_cert_lifetime, 10 * DAY);
    }

    #[test]
    fn test_missing_lifetimes_use_default() {
        let cfg = config("[namedServices.Alpha]\ncertPaths = [\"/a.pem\"]\n");
        let s = build_service(&cfg, &ServiceKey::Named("Alpha".into()), Some("Alpha"));
        assert_eq!(s.min_cert_lifetime, 30 * DAY);
    }

    #[test]
    fn test_unparsable_everywhere_uses_default() {
        let cfg = config(
            r#"
[global]
minCertLifetime = "soon"
[namedServices.Alpha]
minCertLifetime = "later"
"#,
        );
        let s = build_service(&cfg, &ServiceKey::Named("Alpha".into()), Some("Alpha"));
        assert_eq!(s.min_cert_lifetime, DEFAULT_MIN_CERT_LIFETIME);
    }

    #[test]
    fn test_zero_lifetime_is_rejected() {
        let cfg = config("[global]\nminCertLifetime = \"0s\"\n");
        let s = build_service(&cfg, &ServiceKey::Global, None);
        assert_eq!(s.name, "global");
        assert_eq!(s.min_cert_lifetime, DEFAULT_MIN_CERT_LIFETIME);
    }

    #[test]
    fn test_unknown_named_service_has_no_paths() {
        let cfg = config("[global]\n");
        let s = build_service(&cfg, &ServiceKey::Named("Ghost".into()), None);
        assert_eq!(s.name, "namedServices.Ghost");
        assert!(s.cert_paths.is_empty());
    }

    #[tokio::test]
    async fn test_discover_all_services_in_order() {
        let cfg = Arc::new(config(
            r#"
[global]
certPaths = ["/host.pem"]
[namedServices.Gamma]
certPaths = ["/g.pem"]
[namedServices.Alpha]
certPaths = ["/a.pem"]
"#,
        ));
        let services = discover_services(cfg, None).await;
        let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![UNNAMED_SERVICE, "Alpha", "Gamma"]);
    }

    #[tokio::test]
    async fn test_discover_single_service() {
        let cfg = Arc::new(config(
            r#"
[global]
certPaths = ["/host.pem"]
[namedServices.Alpha]
certPaths = ["/a.pem"]
"#,
        ));
        let services = discover_services(cfg, Some("Alpha")).await;
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "Alpha");
    }
}
