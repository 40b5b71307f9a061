//! Structured logging helpers.
//!
//! The subscriber itself is installed by `spendwise serve`; this module
//! holds the pieces shared with the rest of the crate.

pub mod middleware;

pub use middleware::generate_request_id;

/// Filter directives for a [`LoggingConfig`](crate::config::LoggingConfig).
///
/// The base level comes first, followed by one `spendwise::<component>=<level>`
/// directive per configured component, sorted by component name.
///
/// ```
/// use spendwise::config::LoggingConfig;
/// use spendwise::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("advisor".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     component_levels: Some(component_levels),
///     ..LoggingConfig::default()
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,spendwise::advisor=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",spendwise::{}={}", component, level));
        }
    }

    filter_str
}
