//! Built-in plugins and the static plugin registry slice.

use linkme::distributed_slice;

use super::PluginDescriptor;

/// Registry of static plugin descriptors.
///
/// Each crate that defines plugins contributes entries with
/// [`register_plugin!`](crate::register_plugin).
#[distributed_slice]
pub static PLUGIN_REGISTRY: [&'static PluginDescriptor];

/// The universal root plugin. Every other plugin implicitly depends on it.
pub static BASE: PluginDescriptor = crate::define_plugin! {
    name: "base",
    metadata: {
        desc: "Universal root plugin required by every service.",
    },
};

crate::register_plugin!(BASE);
