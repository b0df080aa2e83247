use pid::{Registry, ResolveOptions, StdError};
use serde::{Deserialize, Serialize};

use crate::{Config, ConfigSection};

/// The `resolver` config section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub eager_providers: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolveOptions::default().into()
    }
}

impl ConfigSection for ResolverConfig {
    fn key() -> &'static str {
        "resolver"
    }
}

impl From<ResolverConfig> for ResolveOptions {
    fn from(config: ResolverConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            eager_providers: config.eager_providers,
        }
    }
}

impl From<ResolveOptions> for ResolverConfig {
    fn from(options: ResolveOptions) -> Self {
        Self {
            max_depth: options.max_depth,
            eager_providers: options.eager_providers,
        }
    }
}

fn default_max_depth() -> usize {
    ResolveOptions::default().max_depth
}

pub trait ConfigureRegistryExt {
    /// Applies the `resolver` section of `config` and registers `config` as a value
    /// component.
    ///
    /// A missing `resolver` section keeps the current options.
    ///
    /// # Panics
    ///
    /// Panics if a [`Config`] has already been registered.
    fn add_config(&mut self, config: Config) -> Result<&mut Self, StdError>;
}

impl ConfigureRegistryExt for Registry {
    fn add_config(&mut self, config: Config) -> Result<&mut Self, StdError> {
        if let Some(resolver) = config.get::<Option<ResolverConfig>>(ResolverConfig::key())? {
            tracing::debug!(
                max_depth = resolver.max_depth,
                eager_providers = resolver.eager_providers,
                "Configured resolver"
            );
            self.set_options(resolver.into());
        }
        Ok(self.add_value(config))
    }
}
