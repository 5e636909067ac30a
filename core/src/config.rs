//! Configuration loading, validation, and the probe registry
//!
//! This module parses a YAML configuration into `schema::ConfigFile`,
//! performs strict validation with field-path error messages, and builds
//! the probe behind each configured check. Unknown check classes are
//! rejected by deserialization itself, before any check runs.

use crate::cache::QueryCache;
use crate::probe::{
    self, DefaultRoutesProbe, DnsProbe, InterfacesProbe, MaintenanceProbe, Probe, StatusFileProbe,
    SysctlProbe, TcpProbe, UdpRequestProbe, UrlProbe,
};
use crate::runner::CheckRunner;
use crate::store::ResultStore;
use crate::{CoreError, Result};
use hickory_proto::rr::RecordType;
use schema::{ConfigFile, ServerParams, ThreadClass, ThreadSpec};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Load and validate a configuration file
pub fn load_from_yaml_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let data = std::fs::read_to_string(&path).map_err(|e| {
        CoreError::ConfigurationError(format!("Failed to read config {:?}: {}", path.as_ref(), e))
    })?;
    load_from_yaml_str(&data)
}

/// Load and validate a configuration from a YAML string
pub fn load_from_yaml_str(input: &str) -> Result<ConfigFile> {
    let cfg: ConfigFile = serde_yaml::from_str(input)
        .map_err(|e| CoreError::ConfigurationError(format!("YAML parse error: {}", e)))?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate the configuration with field-path error messages
pub fn validate(cfg: &ConfigFile) -> Result<()> {
    if cfg.threads.is_empty() {
        return Err(CoreError::ValidationError(
            "threads: must contain at least one thread".to_string(),
        ));
    }

    for (name, spec) in &cfg.threads {
        if name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "threads: thread name cannot be empty".to_string(),
            ));
        }
        if !spec.is_server() {
            if spec.interval_secs == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.interval: must be > 0",
                    name
                )));
            }
            if spec.timeout_secs == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.timeout: must be > 0",
                    name
                )));
            }
        }
        validate_class(name, &spec.class)?;
    }
    Ok(())
}

fn validate_class(name: &str, class: &ThreadClass) -> Result<()> {
    match class {
        ThreadClass::Dns {
            host, port, qtype, ..
        } => {
            if host.trim().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.host: cannot be empty",
                    name
                )));
            }
            if *port == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.port: must be 1..=65535",
                    name
                )));
            }
            if RecordType::from_str(qtype).is_err() {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.qtype: unknown record type '{}'",
                    name, qtype
                )));
            }
        }
        ThreadClass::DefaultRoutes | ThreadClass::Maintenance => {}
        ThreadClass::Interfaces { interfaces } => {
            if interfaces.is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.interfaces: must list at least one interface",
                    name
                )));
            }
            if interfaces.iter().any(|i| i.trim().is_empty()) {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.interfaces: names cannot be empty",
                    name
                )));
            }
        }
        ThreadClass::Tcp { host, port, .. } => {
            if host.trim().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.host: cannot be empty",
                    name
                )));
            }
            if *port == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.port: must be 1..=65535",
                    name
                )));
            }
        }
        ThreadClass::UdpRequest {
            host,
            port,
            response,
            max_response_size,
            ..
        } => {
            if host.trim().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.host: cannot be empty",
                    name
                )));
            }
            if *port == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.port: must be 1..=65535",
                    name
                )));
            }
            if *max_response_size == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.max_response_size: must be > 0",
                    name
                )));
            }
            if let Err(e) = probe::compile_response_pattern(response) {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.response: invalid pattern: {}",
                    name, e
                )));
            }
        }
        ThreadClass::Url { url, response } => {
            if url.parse::<hyper::Uri>().is_err() {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.url: invalid url '{}'",
                    name, url
                )));
            }
            if let Err(e) = probe::compile_response_pattern(response) {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.response: invalid pattern: {}",
                    name, e
                )));
            }
        }
        ThreadClass::Sysctl { variables } => {
            if variables.is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.variables: must list at least one variable",
                    name
                )));
            }
        }
        ThreadClass::StatusFile { status_file, .. } => {
            if status_file.as_os_str().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.status_file: cannot be empty",
                    name
                )));
            }
        }
        ThreadClass::HttpServer(params) => {
            if params.port == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.port: must be 1..=65535",
                    name
                )));
            }
            if !params.location.starts_with('/') {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.location: must start with '/'",
                    name
                )));
            }
            if params.query_timeout_secs == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.query_timeout: must be > 0",
                    name
                )));
            }
            if params.query_cache_ttl_secs == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.query_cache_ttl: must be > 0",
                    name
                )));
            }
            if params.wait_status_timeout_secs > 0 && params.wait_status_interval_secs == 0 {
                return Err(CoreError::ValidationError(format!(
                    "threads.{}.wait_status_interval: must be > 0",
                    name
                )));
            }
        }
    }
    Ok(())
}

/// Names of all check threads (everything that is not a server)
pub fn check_names(cfg: &ConfigFile) -> Vec<String> {
    cfg.threads
        .iter()
        .filter(|(_, spec)| !spec.is_server())
        .map(|(name, _)| name.clone())
        .collect()
}

/// The `http_server` threads, in name order
pub fn server_threads(cfg: &ConfigFile) -> Vec<(&String, &ThreadSpec, &ServerParams)> {
    cfg.threads
        .iter()
        .filter_map(|(name, spec)| match &spec.class {
            ThreadClass::HttpServer(params) => Some((name, spec, params)),
            _ => None,
        })
        .collect()
}

/// Build the probe behind one check class
///
/// The maintenance sweeper gets the shared query cache and the
/// process-wide TTL; every other probe is self-contained.
pub fn create_probe(
    class: &ThreadClass,
    cache: &Arc<QueryCache>,
    query_cache_ttl: Duration,
) -> Result<Arc<dyn Probe>> {
    let probe: Arc<dyn Probe> = match class {
        ThreadClass::Dns {
            host,
            port,
            tcp,
            qname,
            qtype,
        } => {
            let qtype = RecordType::from_str(qtype).map_err(|_| {
                CoreError::ConfigurationError(format!("unknown record type '{}'", qtype))
            })?;
            Arc::new(DnsProbe::new(host.clone(), *port, *tcp, qname.clone(), qtype))
        }
        ThreadClass::DefaultRoutes => Arc::new(DefaultRoutesProbe::new()),
        ThreadClass::Interfaces { interfaces } => {
            Arc::new(InterfacesProbe::new(interfaces.clone()))
        }
        ThreadClass::Tcp { host, port, use_ssl } => {
            Arc::new(TcpProbe::new(host.clone(), *port, *use_ssl))
        }
        ThreadClass::UdpRequest {
            host,
            port,
            request,
            response,
            max_response_size,
        } => {
            let response = probe::compile_response_pattern(response).map_err(|e| {
                CoreError::ConfigurationError(format!("invalid response pattern: {}", e))
            })?;
            Arc::new(UdpRequestProbe::new(
                host.clone(),
                *port,
                request.clone(),
                response,
                *max_response_size,
            ))
        }
        ThreadClass::Url { url, response } => {
            let response = probe::compile_response_pattern(response).map_err(|e| {
                CoreError::ConfigurationError(format!("invalid response pattern: {}", e))
            })?;
            Arc::new(UrlProbe::new(url.clone(), response))
        }
        ThreadClass::Sysctl { variables } => {
            let variables = variables
                .iter()
                .map(|(variable, expected)| (variable.clone(), expected.to_string()))
                .collect();
            Arc::new(SysctlProbe::new(variables))
        }
        ThreadClass::StatusFile {
            status_file,
            status_file_ttl,
            error_string,
            success_string,
        } => Arc::new(StatusFileProbe::new(
            status_file.clone(),
            Duration::from_secs(*status_file_ttl),
            error_string.clone(),
            success_string.clone(),
        )),
        ThreadClass::Maintenance => {
            Arc::new(MaintenanceProbe::new(Arc::clone(cache), query_cache_ttl))
        }
        ThreadClass::HttpServer(_) => {
            return Err(CoreError::ConfigurationError(
                "http_server threads have no probe".to_string(),
            ));
        }
    };
    Ok(probe)
}

/// Build one runner per configured check
pub fn build_runners(
    cfg: &ConfigFile,
    store: &Arc<ResultStore>,
    cache: &Arc<QueryCache>,
    query_cache_ttl: Duration,
) -> Result<Vec<CheckRunner>> {
    let mut runners = Vec::new();
    for (name, spec) in &cfg.threads {
        if spec.is_server() {
            continue;
        }
        let probe = create_probe(&spec.class, cache, query_cache_ttl)?;
        runners.push(CheckRunner::new(
            name.clone(),
            probe,
            spec.interval(),
            spec.timeout(),
            spec.error_message,
            spec.status_message,
            Arc::clone(store),
        ));
    }
    Ok(runners)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> &'static str {
        r#"
        logging:
          level: debug
        threads:
          dns_local:
            class: dns
            host: 127.0.0.1
            qname: localhost.
          routes:
            class: default_routes
          cache_sweep:
            class: maintenance
            interval: 60
          status:
            class: http_server
            port: 8048
        "#
    }

    #[test]
    fn parses_and_validates_valid_config() {
        let cfg = load_from_yaml_str(valid_config()).expect("should parse");
        assert_eq!(cfg.threads.len(), 4);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(check_names(&cfg), vec!["cache_sweep", "dns_local", "routes"]);
        assert_eq!(server_threads(&cfg).len(), 1);
    }

    #[test]
    fn errors_on_empty_threads() {
        let err = load_from_yaml_str("threads: {}").unwrap_err();
        assert!(err.to_string().contains("at least one thread"));
    }

    #[test]
    fn errors_on_unknown_class() {
        let err = load_from_yaml_str(
            r#"
            threads:
              bogus:
                class: carrier_pigeon
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationError(_)));
    }

    #[test]
    fn errors_on_zero_interval_with_field_path() {
        let err = load_from_yaml_str(
            r#"
            threads:
              routes:
                class: default_routes
                interval: 0
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("threads.routes.interval"));
    }

    #[test]
    fn errors_on_bad_response_pattern() {
        let err = load_from_yaml_str(
            r#"
            threads:
              web:
                class: url
                url: http://127.0.0.1/status
                response: "(unclosed"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("threads.web.response"));
    }

    #[test]
    fn errors_on_unknown_qtype() {
        let err = load_from_yaml_str(
            r#"
            threads:
              dns:
                class: dns
                host: 127.0.0.1
                qname: example.com.
                qtype: BOGUS
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("threads.dns.qtype"));
    }

    #[test]
    fn errors_on_empty_interface_list() {
        let err = load_from_yaml_str(
            r#"
            threads:
              ifs:
                class: interfaces
                interfaces: []
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("threads.ifs.interfaces"));
    }

    #[test]
    fn errors_on_relative_server_location() {
        let err = load_from_yaml_str(
            r#"
            threads:
              status:
                class: http_server
                port: 8048
                location: getstatus
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("threads.status.location"));
    }

    #[test]
    fn builds_runners_for_every_check() {
        let cfg = load_from_yaml_str(valid_config()).expect("should parse");
        let store = Arc::new(ResultStore::new(check_names(&cfg)));
        let cache = Arc::new(QueryCache::new());
        let runners =
            build_runners(&cfg, &store, &cache, Duration::from_secs(1)).expect("should build");
        let mut names: Vec<_> = runners.iter().map(|r| r.name().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_sweep", "dns_local", "routes"]);
    }
}
