//! End-to-end resolution behavior through `ServiceConfigurator`.

use std::sync::Arc;

use serde_json::{Value, json};
use smelt_core::{
    Config, ConfigOutcome, Dependency, FileIdentityStore, HookError, IdentityStore,
    MemoryIdentityStore, PluginModule, ResolveError, ResolvedService, ServiceContext, ServiceSpec,
    Uuid,
};
use smelt_framework::{PluginRegistry, ServiceConfigurator, define_plugin};

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// A test module with configurable group and dependencies.
struct Module {
    name: &'static str,
    group: Option<&'static str>,
    deps: &'static [&'static str],
}

impl PluginModule for Module {
    fn name(&self) -> &str {
        self.name
    }

    fn group(&self) -> Option<&str> {
        self.group
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.deps.iter().map(|d| d.parse().unwrap()).collect()
    }
}

fn module(name: &'static str, deps: &'static [&'static str]) -> Module {
    Module {
        name,
        group: None,
        deps,
    }
}

fn auth_config(
    _plugin: &str,
    config: &Config,
    _service: &ServiceContext,
) -> Result<ConfigOutcome, HookError> {
    let mut next = config.clone();
    next.insert("auth".into(), json!({ "realm": "svc" }));
    Ok(ConfigOutcome::Replace(next))
}

fn http_config(
    _plugin: &str,
    config: &Config,
    _service: &ServiceContext,
) -> Result<ConfigOutcome, HookError> {
    match config.get("port").and_then(Value::as_u64) {
        Some(_) => Ok(ConfigOutcome::Unchanged),
        None => Err(HookError::new("port is required")),
    }
}

fn http_cache(
    _plugin: &str,
    config: &Config,
    service: &ServiceContext,
) -> Result<Option<Value>, HookError> {
    Ok(Some(json!({
        "listen": format!("0.0.0.0:{}", config["port"]),
        "authenticated": config.contains_key("auth"),
        "hash_seen": service.hash.is_some(),
    })))
}

static AUTH: smelt_framework::PluginDescriptor = define_plugin! {
    name: "auth_plugin",
    config: auth_config,
};

static HTTP: smelt_framework::PluginDescriptor = define_plugin! {
    name: "http_callbacks",
    config: http_config,
    cache: http_cache,
};

fn registry() -> PluginRegistry {
    let registry = PluginRegistry::with_builtins();
    registry.register_descriptor(AUTH);
    registry.register_descriptor(HTTP);
    registry
}

fn configurator_with(registry: PluginRegistry) -> (ServiceConfigurator, Arc<MemoryIdentityStore>) {
    let store = Arc::new(MemoryIdentityStore::new());
    (
        ServiceConfigurator::new(Arc::new(registry), store.clone()),
        store,
    )
}

fn http_spec(port: u64) -> ServiceSpec {
    ServiceSpec::new("svc1", "http")
        .with_plugins(["auth"])
        .with_config_value("port", port)
}

fn position(service: &ResolvedService, name: &str) -> usize {
    service
        .expanded_plugins
        .iter()
        .position(|p| p == name)
        .unwrap_or_else(|| panic!("{name} missing from {:?}", service.expanded_plugins))
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[test]
fn test_base_and_callback_exactly_once_callback_last() {
    let reg = registry();
    reg.register(module("db", &[]));
    reg.register(module("cache", &["db"]));
    let (configurator, _) = configurator_with(reg);

    let spec = ServiceSpec::new("svc1", "http")
        .with_plugins(["cache", "auth", "base", "cache"])
        .with_config_value("port", 80);
    let service = configurator.config(spec, None).unwrap();

    let count = |name: &str| service.expanded_plugins.iter().filter(|p| *p == name).count();
    assert_eq!(count("base"), 1);
    assert_eq!(count("http"), 1);
    assert_eq!(service.expanded_plugins.last().unwrap(), "http");
    assert_eq!(service.expanded_plugins.first().unwrap(), "base");
}

#[test]
fn test_dependencies_precede_dependents() {
    let reg = registry();
    reg.register(module("pool", &[]));
    reg.register(module("db", &["pool"]));
    reg.register(module("session", &["db", "auth"]));
    let (configurator, _) = configurator_with(reg);

    let spec = ServiceSpec::new("svc1", "http")
        .with_plugins(["session"])
        .with_config_value("port", 80);
    let service = configurator.config(spec, None).unwrap();

    assert!(position(&service, "pool") < position(&service, "db"));
    assert!(position(&service, "db") < position(&service, "session"));
    assert!(position(&service, "auth") < position(&service, "session"));
    assert!(position(&service, "base") < position(&service, "pool"));
}

#[test]
fn test_group_chain_in_request_order() {
    let reg = registry();
    for name in ["c", "a", "b"] {
        reg.register(Module {
            name,
            group: Some("middleware"),
            deps: &[],
        });
    }
    let (configurator, _) = configurator_with(reg);

    let spec = ServiceSpec::new("svc1", "http")
        .with_plugins(["c", "a", "b"])
        .with_config_value("port", 80);
    let service = configurator.config(spec, None).unwrap();

    assert!(position(&service, "c") < position(&service, "a"));
    assert!(position(&service, "a") < position(&service, "b"));
}

fn gzip_config(
    _plugin: &str,
    config: &Config,
    _service: &ServiceContext,
) -> Result<ConfigOutcome, HookError> {
    let mut next = config.clone();
    next.insert("encoding".into(), json!("gzip"));
    Ok(ConfigOutcome::Replace(next))
}

fn brotli_config(
    _plugin: &str,
    config: &Config,
    _service: &ServiceContext,
) -> Result<ConfigOutcome, HookError> {
    let mut next = config.clone();
    next.insert("encoding".into(), json!("br"));
    Ok(ConfigOutcome::Replace(next))
}

static GZIP: smelt_framework::PluginDescriptor = define_plugin! {
    name: "gzip_plugin",
    config: gzip_config,
};

static BROTLI: smelt_framework::PluginDescriptor = define_plugin! {
    name: "brotli_plugin",
    config: brotli_config,
};

#[test]
fn test_request_order_decides_last_writer() {
    let reg = registry();
    reg.register_descriptor(GZIP);
    reg.register_descriptor(BROTLI);
    let (configurator, _) = configurator_with(reg);

    let spec = |plugins: [&str; 2]| {
        ServiceSpec::new("svc1", "http")
            .with_plugins(plugins)
            .with_config_value("port", 80)
    };

    let service = configurator.config(spec(["gzip", "brotli"]), None).unwrap();
    assert_eq!(service.expanded_plugins, vec!["base", "gzip", "brotli", "http"]);
    assert_eq!(service.config["encoding"], json!("br"));

    let service = configurator.config(spec(["brotli", "gzip"]), None).unwrap();
    assert_eq!(service.expanded_plugins, vec!["base", "brotli", "gzip", "http"]);
    assert_eq!(service.config["encoding"], json!("gzip"));
}

// ─── Missing dependencies ────────────────────────────────────────────────────

#[test]
fn test_missing_optional_dependency_omitted() {
    let reg = registry();
    reg.register(module("metrics_consumer", &["?metrics"]));
    let (configurator, _) = configurator_with(reg);

    let spec = ServiceSpec::new("svc1", "http")
        .with_plugins(["metrics_consumer"])
        .with_config_value("port", 80);
    let service = configurator.config(spec, None).unwrap();

    assert!(!service.has_plugin("metrics"));
    assert!(service.has_plugin("metrics_consumer"));
}

#[test]
fn test_missing_mandatory_dependency_fails() {
    let reg = registry();
    reg.register(module("session", &["db"]));
    let (configurator, store) = configurator_with(reg);

    let spec = ServiceSpec::new("svc1", "http")
        .with_plugins(["session"])
        .with_config_value("port", 80);
    let err = configurator.config(spec, None).unwrap_err();

    assert_eq!(err, ResolveError::PluginUnknown("db".into()));
    assert_eq!(err.code(), "plugin_unknown");
    // Identity is assigned before the graph is expanded.
    assert_eq!(store.len(), 1);
}

#[test]
fn test_unknown_class_fails() {
    let (configurator, _) = configurator_with(registry());
    let err = configurator
        .config(ServiceSpec::new("svc1", "ftp"), None)
        .unwrap_err();
    assert_eq!(err.code(), "package_class_invalid");
}

#[test]
fn test_cycle_fails() {
    let reg = registry();
    reg.register(module("a", &["b"]));
    reg.register(module("b", &["a"]));
    let (configurator, _) = configurator_with(reg);

    let spec = ServiceSpec::new("svc1", "http")
        .with_plugins(["a"])
        .with_config_value("port", 80);
    let err = configurator.config(spec, None).unwrap_err();
    assert_eq!(err.code(), "cycle");
}

// ─── Hashing and identity ────────────────────────────────────────────────────

#[test]
fn test_reconfigure_unchanged_is_idempotent() {
    let (configurator, _) = configurator_with(registry());
    let first = configurator.config(http_spec(8080), None).unwrap();
    let second = configurator.config(http_spec(8080), Some(&first)).unwrap();

    assert_eq!(first.hash, second.hash);
    assert_eq!(first.uuid, second.uuid);
    assert!(second.is_same_config(&first));

    let third = configurator.config(second.to_spec(), Some(&second)).unwrap();
    assert_eq!(third.hash, first.hash);
}

#[test]
fn test_id_class_and_uuid_are_immutable() {
    let (configurator, _) = configurator_with(registry());
    let first = configurator.config(http_spec(8080), None).unwrap();

    let mut renamed = http_spec(8080);
    renamed.id = "svc2".into();
    let err = configurator.config(renamed, Some(&first)).unwrap_err();
    assert_eq!(err.code(), "id_cannot_be_updated");

    let mut reclassed = http_spec(8080);
    reclassed.class = "auth".into();
    let err = configurator.config(reclassed, Some(&first)).unwrap_err();
    assert_eq!(err.code(), "class_cannot_be_updated");

    let err = configurator
        .config(http_spec(8080).with_uuid(Uuid::new_v4()), Some(&first))
        .unwrap_err();
    assert_eq!(err.code(), "uuid_cannot_be_updated");

    let ok = configurator
        .config(http_spec(8080).with_uuid(first.uuid), Some(&first))
        .unwrap();
    assert_eq!(ok.uuid, first.uuid);
}

#[test]
fn test_fresh_identity_persisted_and_reused() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileIdentityStore::new(dir.path().join("ids")));
    let configurator = ServiceConfigurator::new(Arc::new(registry()), store.clone());

    let first = configurator.config(http_spec(8080), None).unwrap();
    assert_eq!(first.uuid.get_version_num(), 4);
    assert_eq!(store.read("svc1").unwrap(), Some(first.uuid));

    let second = configurator.config(http_spec(8080), None).unwrap();
    assert_eq!(second.uuid, first.uuid);
}

// ─── Worked examples ─────────────────────────────────────────────────────────

#[test]
fn test_http_service_with_auth() {
    let (configurator, _) = configurator_with(registry());
    let service = configurator.config(http_spec(8080), None).unwrap();

    assert_eq!(service.expanded_plugins, vec!["base", "auth", "http"]);
    assert!(!service.uuid.is_nil());
    assert_eq!(service.config["port"], json!(8080));
    assert_eq!(service.config["auth"], json!({ "realm": "svc" }));
    assert_eq!(
        service.cache_for("http"),
        Some(&json!({
            "listen": "0.0.0.0:8080",
            "authenticated": true,
            "hash_seen": true,
        }))
    );
}

#[test]
fn test_port_change_rehashes_and_keeps_uuid() {
    let (configurator, _) = configurator_with(registry());
    let first = configurator.config(http_spec(8080), None).unwrap();
    let second = configurator.config(http_spec(9090), Some(&first)).unwrap();

    assert_ne!(first.hash, second.hash);
    assert_eq!(first.uuid, second.uuid);
    assert_eq!(second.cache_for("http").unwrap()["listen"], json!("0.0.0.0:9090"));
}

// ─── Hook failures ───────────────────────────────────────────────────────────

#[test]
fn test_config_hook_error_aborts() {
    let (configurator, _) = configurator_with(registry());
    let err = configurator
        .config(ServiceSpec::new("svc1", "http").with_plugins(["auth"]), None)
        .unwrap_err();

    assert_eq!(err.code(), "service_config_error");
    match err {
        ResolveError::ServiceConfig { plugin, reason } => {
            assert_eq!(plugin, "http");
            assert_eq!(reason.message(), "port is required");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_service_id_entry_is_not_hooked() {
    fn poison(
        _plugin: &str,
        _config: &Config,
        _service: &ServiceContext,
    ) -> Result<ConfigOutcome, HookError> {
        Err(HookError::new("own id must not be hooked"))
    }
    static SELF_NAMED: smelt_framework::PluginDescriptor = define_plugin! {
        name: "svc1",
        config: poison,
    };

    let reg = registry();
    reg.register_descriptor(SELF_NAMED);
    let (configurator, _) = configurator_with(reg);

    let spec = http_spec(8080).with_plugins(["svc1"]);
    let service = configurator.config(spec, None).unwrap();
    assert!(service.has_plugin("svc1"));
}
