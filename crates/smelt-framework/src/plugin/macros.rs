// ─── Internal helper: PluginMetadata builder ──────────────────────────────────
//
// Used exclusively by `define_plugin!`.  Not part of the public API.

/// Internal helper macro: builds a [`PluginMetadata`] from optional overrides.
///
/// [`PluginMetadata`]: crate::plugin::PluginMetadata
#[macro_export]
#[doc(hidden)]
macro_rules! __smelt_plugin_metadata {
    // TT-muncher: skip leading comma
    (@pm $ver:tt $dsc:tt , $($rest:tt)*) => {
        $crate::__smelt_plugin_metadata!(@pm $ver $dsc $($rest)*)
    };

    // version: "..."
    (@pm [$($old:expr)?] $dsc:tt version : $v:literal $($rest:tt)*) => {
        $crate::__smelt_plugin_metadata!(@pm [$v] $dsc $($rest)*)
    };

    // desc: "..."
    (@pm $ver:tt [$($old:expr)?] desc : $v:literal $($rest:tt)*) => {
        $crate::__smelt_plugin_metadata!(@pm $ver [$v] $($rest)*)
    };

    // End of tokens → emit
    (@pm [$($ver:expr)?] [$($dsc:expr)?]) => {
        $crate::plugin::PluginMetadata {
            version: $crate::__smelt_plugin_metadata!(@get_ver [$($ver)?]),
            desc:    $crate::__smelt_plugin_metadata!(@get_dsc [$($dsc)?]),
        }
    };

    (@get_ver []) => { ::std::env!("CARGO_PKG_VERSION") };
    (@get_ver [$ver:expr]) => { $ver };

    (@get_dsc []) => { ::std::env!("CARGO_PKG_DESCRIPTION") };
    (@get_dsc [$dsc:expr]) => { $dsc };

    // Entry
    ($($meta:tt)*) => {
        $crate::__smelt_plugin_metadata!(@pm [] [] $($meta)*)
    };
}

/// Internal helper: `Some(expr)` or `None`.
#[macro_export]
#[doc(hidden)]
macro_rules! __smelt_option {
    () => {
        ::std::option::Option::None
    };
    ($value:expr) => {
        ::std::option::Option::Some($value)
    };
}

// ─── define_plugin! ──────────────────────────────────────────────────────────

/// Creates a [`PluginDescriptor`], the static, `Copy` handle to a plugin.
///
/// # Syntax
///
/// ```rust,ignore
/// pub static AUTH: PluginDescriptor = define_plugin! {
///     name: "auth",
///     group: "security",
///     depends_on: ["db", "?metrics"],
///     config: auth_config,   // fn(&str, &Config, &ServiceContext) -> Result<ConfigOutcome, HookError>
///     cache:  auth_cache,    // fn(&str, &Config, &ServiceContext) -> Result<Option<Value>, HookError>
///     metadata: {
///         version: "2.0.0",
///         desc:    "Request authentication.",
///     },
/// };
/// ```
///
/// ## Field reference
///
/// | Field | Required | Description |
/// |-------|----------|-------------|
/// | `name` | ✓ | Must be **first**. Registry name. |
/// | `group` | — | Group literal; same-group plugins are chained in request order |
/// | `depends_on` | — | `["name", "?optional", …]` |
/// | `config` | — | Configuration hook path |
/// | `cache` | — | Cache-build hook path |
/// | `metadata` | — | Must be **last**. `{ version, desc }` |
///
/// [`PluginDescriptor`]: crate::plugin::PluginDescriptor
#[macro_export]
macro_rules! define_plugin {
    // ── Entry: name only ──────────────────────────────────────────────────────
    (name: $name:literal $(,)?) => {
        $crate::define_plugin!(@acc [$name] [] [] [] [])
    };

    // ── Entry: name + more fields ─────────────────────────────────────────────
    //
    // Accumulator slots:
    //   [$n]         plugin name literal
    //   [$($g)?]     group literal
    //   [$($d),*]    depends_on literals
    //   [$($c)?]     config hook path
    //   [$($k)?]     cache hook path
    (name: $name:literal, $($tail:tt)+) => {
        $crate::define_plugin!(@acc [$name] [] [] [] [] $($tail)+)
    };

    // ── Accumulator: skip stray commas ────────────────────────────────────────
    (@acc $n:tt $g:tt $d:tt $c:tt $k:tt , $($rest:tt)*) => {
        $crate::define_plugin!(@acc $n $g $d $c $k $($rest)*)
    };

    // ── Consume group: "…" ────────────────────────────────────────────────────
    (@acc $n:tt [] $d:tt $c:tt $k:tt group: $group:literal $($rest:tt)*) => {
        $crate::define_plugin!(@acc $n [$group] $d $c $k $($rest)*)
    };

    // ── Consume depends_on: ["…", …] ──────────────────────────────────────────
    (@acc $n:tt $g:tt [] $c:tt $k:tt depends_on: [$($dep:literal),* $(,)?] $($rest:tt)*) => {
        $crate::define_plugin!(@acc $n $g [$($dep),*] $c $k $($rest)*)
    };

    // ── Consume config: path , <more fields> ──────────────────────────────────
    (@acc $n:tt $g:tt $d:tt [] $k:tt config: $hook:path , $($rest:tt)+) => {
        $crate::define_plugin!(@acc $n $g $d [$hook] $k $($rest)+)
    };

    // ── Consume config: path (last field) ─────────────────────────────────────
    (@acc $n:tt $g:tt $d:tt [] $k:tt config: $hook:path $(,)?) => {
        $crate::define_plugin!(@acc $n $g $d [$hook] $k)
    };

    // ── Consume cache: path , <more fields> ───────────────────────────────────
    (@acc $n:tt $g:tt $d:tt $c:tt [] cache: $hook:path , $($rest:tt)+) => {
        $crate::define_plugin!(@acc $n $g $d $c [$hook] $($rest)+)
    };

    // ── Consume cache: path (last field) ──────────────────────────────────────
    (@acc $n:tt $g:tt $d:tt $c:tt [] cache: $hook:path $(,)?) => {
        $crate::define_plugin!(@acc $n $g $d $c [$hook])
    };

    // ── Consume metadata: { … } (last field) ──────────────────────────────────
    (@acc $n:tt $g:tt $d:tt $c:tt $k:tt metadata: { $($meta:tt)* } $(,)?) => {
        $crate::define_plugin!(@terminal $n $g $d $c $k $($meta)*)
    };

    // ── No remaining fields → terminal ────────────────────────────────────────
    (@acc $n:tt $g:tt $d:tt $c:tt $k:tt) => {
        $crate::define_plugin!(@terminal $n $g $d $c $k)
    };

    // ── @terminal: emit the PluginDescriptor ─────────────────────────────────
    (
        @terminal [$n:literal] [$($g:literal)?] [$($d:literal),*] [$($c:path)?] [$($k:path)?]
            $($meta:tt)*
    ) => {
        $crate::plugin::PluginDescriptor {
            api_version: $crate::plugin::SMELT_PLUGIN_API_VERSION,
            name:        $n,
            group:       $crate::__smelt_option!($($g)?),
            depends_on:  &[$($d),*],
            config:      $crate::__smelt_option!($($c as $crate::plugin::ConfigHookFn)?),
            cache:       $crate::__smelt_option!($($k as $crate::plugin::CacheHookFn)?),
            metadata:    $crate::__smelt_plugin_metadata!($($meta)*),
        }
    };
}

// ─── register_plugin! ────────────────────────────────────────────────────────

/// Adds static descriptors to [`PLUGIN_REGISTRY`], so that
/// [`PluginRegistry::collect_all`] picks them up.
///
/// ```rust,ignore
/// pub static AUTH: PluginDescriptor = define_plugin! { name: "auth" };
/// register_plugin!(AUTH);
/// ```
///
/// [`PLUGIN_REGISTRY`]: crate::plugin::PLUGIN_REGISTRY
/// [`PluginRegistry::collect_all`]: crate::registry::PluginRegistry::collect_all
#[macro_export]
macro_rules! register_plugin {
    ($($desc:path),+ $(,)?) => {
        $(
            const _: () = {
                #[$crate::linkme::distributed_slice($crate::plugin::PLUGIN_REGISTRY)]
                #[linkme(crate = $crate::linkme)]
                static ENTRY: &$crate::plugin::PluginDescriptor = &$desc;
            };
        )+
    };
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use smelt_core::{Config, ConfigOutcome, HookError, PluginModule, ServiceContext};

    use crate::plugin::PluginDescriptor;

    fn replace_config(
        _plugin: &str,
        config: &Config,
        _service: &ServiceContext,
    ) -> Result<ConfigOutcome, HookError> {
        let mut config = config.clone();
        config.insert("touched".into(), json!(true));
        Ok(ConfigOutcome::Replace(config))
    }

    fn build_cache(
        plugin: &str,
        _config: &Config,
        _service: &ServiceContext,
    ) -> Result<Option<Value>, HookError> {
        Ok(Some(json!(plugin)))
    }

    static NAME_ONLY: PluginDescriptor = define_plugin! { name: "bare" };

    static FULL: PluginDescriptor = define_plugin! {
        name: "full",
        group: "security",
        depends_on: ["db", "?metrics"],
        config: replace_config,
        cache: build_cache,
        metadata: {
            version: "2.0.0",
            desc: "Everything set.",
        },
    };

    static REORDERED: PluginDescriptor = define_plugin! {
        name: "reordered",
        cache: build_cache,
        depends_on: [],
        group: "g",
    };

    #[test]
    fn test_define_plugin_name_only() {
        assert_eq!(NAME_ONLY.name, "bare");
        assert!(NAME_ONLY.group.is_none());
        assert!(NAME_ONLY.depends_on.is_empty());
        assert!(NAME_ONLY.config.is_none());
        assert!(NAME_ONLY.cache.is_none());
        assert_eq!(NAME_ONLY.metadata.version, env!("CARGO_PKG_VERSION"));
        assert!(NAME_ONLY.is_compatible());
    }

    #[test]
    fn test_define_plugin_all_fields() {
        assert_eq!(FULL.group, Some("security"));
        assert_eq!(FULL.depends_on, &["db", "?metrics"]);
        assert_eq!(FULL.metadata.version, "2.0.0");
        assert_eq!(FULL.metadata.desc, "Everything set.");

        let ctx = ServiceContext::new("svc", "http", smelt_core::Uuid::nil(), chrono::Utc::now(), vec![]);
        let outcome = FULL.config("full", &Config::new(), &ctx).unwrap();
        assert!(matches!(outcome, ConfigOutcome::Replace(c) if c["touched"] == json!(true)));
        assert_eq!(FULL.cache("full", &Config::new(), &ctx).unwrap(), Some(json!("full")));
    }

    #[test]
    fn test_define_plugin_any_field_order() {
        assert_eq!(REORDERED.group, Some("g"));
        assert!(REORDERED.cache.is_some());
        assert!(REORDERED.config.is_none());
    }
}
