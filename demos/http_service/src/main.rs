//! HTTP Service Example
//!
//! Resolves an `http` service with a few plugins, then reconfigures it with a
//! different port to show that the identity is kept while the fingerprint
//! changes.
//!
//! ```text
//! base ─▶ metrics? ─▶ auth ─▶ cors ─▶ http
//!                     └─ group "security" ─┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package http-service -- --port 8080 --reconfigure-port 9090
//! cargo run --package http-service -- --metrics --plugins cors,auth
//! cargo run --package http-service -- --spec services/web.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use smelt::prelude::*;
use tracing::info;

// ============================================================================
// Plugins
// ============================================================================

/// Fills in authentication defaults the service did not set.
fn auth_config(
    _plugin: &str,
    config: &Config,
    service: &ServiceContext,
) -> Result<ConfigOutcome, HookError> {
    if config.contains_key("auth") {
        return Ok(ConfigOutcome::Unchanged);
    }
    let mut next = config.clone();
    next.insert(
        "auth".into(),
        json!({
            "realm": service.id,
            "metrics": service.expanded_plugins.iter().any(|p| p == "metrics"),
        }),
    );
    Ok(ConfigOutcome::Replace(next))
}

fn cors_config(
    _plugin: &str,
    config: &Config,
    _service: &ServiceContext,
) -> Result<ConfigOutcome, HookError> {
    let mut next = config.clone();
    next.entry("allowed_origins").or_insert_with(|| json!(["*"]));
    Ok(ConfigOutcome::Replace(next))
}

fn metrics_cache(
    _plugin: &str,
    _config: &Config,
    service: &ServiceContext,
) -> Result<Option<Value>, HookError> {
    Ok(Some(json!({ "labels": { "service": service.id, "uuid": service.uuid } })))
}

/// Rejects a missing or out-of-range port.
fn http_config(
    _plugin: &str,
    config: &Config,
    _service: &ServiceContext,
) -> Result<ConfigOutcome, HookError> {
    let port = config
        .get("port")
        .and_then(Value::as_u64)
        .ok_or_else(|| HookError::new("`port` must be set to a number"))?;
    if port == 0 || port > u64::from(u16::MAX) {
        return Err(HookError::new(format!("port {port} is out of range")));
    }
    Ok(ConfigOutcome::Unchanged)
}

fn http_cache(
    _plugin: &str,
    config: &Config,
    service: &ServiceContext,
) -> Result<Option<Value>, HookError> {
    Ok(Some(json!({
        "listen": format!("0.0.0.0:{}", config["port"]),
        "etag": service.hash,
    })))
}

static AUTH: PluginDescriptor = define_plugin! {
    name: "auth_plugin",
    group: "security",
    depends_on: ["?metrics"],
    config: auth_config,
    metadata: {
        desc: "Request authentication defaults.",
    },
};

static CORS: PluginDescriptor = define_plugin! {
    name: "cors_plugin",
    group: "security",
    config: cors_config,
};

/// Only registered with `--metrics`, so `auth` sees it as an absent optional.
static METRICS: PluginDescriptor = define_plugin! {
    name: "metrics_plugin",
    cache: metrics_cache,
};

static HTTP: PluginDescriptor = define_plugin! {
    name: "http_callbacks",
    config: http_config,
    cache: http_cache,
};

register_plugin!(AUTH, CORS, HTTP);

// ============================================================================
// Main Entry Point
// ============================================================================

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Runtime configuration file (smelt.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service spec file; overrides the built-in `svc1` spec.
    #[arg(short, long)]
    spec: Option<PathBuf>,

    /// Port of the built-in spec.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Plugins requested by the built-in spec, in order.
    #[arg(long, value_delimiter = ',', default_values_t = ["auth".to_string(), "cors".to_string()])]
    plugins: Vec<String>,

    /// Register the metrics plugin.
    #[arg(long)]
    metrics: bool,

    /// Reconfigure the service with this port after the first resolution.
    #[arg(short, long)]
    reconfigure_port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = SmeltRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    let runtime = builder.build().context("loading runtime configuration")?;

    if args.metrics {
        runtime.register_plugin(METRICS);
    }

    let spec = match &args.spec {
        Some(path) => runtime.load_spec(path)?,
        None => ServiceSpec::new("svc1", "http")
            .with_plugins(args.plugins.clone())
            .with_config_value("port", args.port),
    };

    let service = runtime.configure(spec, None)?;
    info!(uuid = %service.uuid, hash = %service.hash, "Service resolved");
    println!("{}", serde_json::to_string_pretty(&service)?);

    if let Some(port) = args.reconfigure_port {
        let mut next = service.to_spec();
        next.config.insert("port".into(), json!(port));
        let updated = runtime.configure(next, Some(&service))?;

        println!("{}", serde_json::to_string_pretty(&updated)?);
        println!(
            "uuid kept: {}, config changed: {}",
            updated.uuid == service.uuid,
            !updated.is_same_config(&service)
        );
    }

    Ok(())
}
