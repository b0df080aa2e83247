use std::collections::BTreeMap;
use std::path::Path;

use pid::StdError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// JSON-backed map of configuration sections.
///
/// Registered as a value component by
/// [`ConfigureRegistryExt::add_config`](crate::ConfigureRegistryExt::add_config), so
/// components can depend on `Arc<Config>` and read their own sections.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub(crate) sections: BTreeMap<String, serde_json::Value>,
}

/// A typed section stored under a fixed key.
pub trait ConfigSection: DeserializeOwned {
    fn key() -> &'static str;
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes the section `name`. A missing section reads as `null`, so optional
    /// sections can be requested as `Option<T>`.
    pub fn get<T>(&self, name: impl AsRef<str>) -> Result<T, StdError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(
            self.sections
                .get(name.as_ref())
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        )?)
    }

    /// Deserializes the section stored under `T::key()`.
    pub fn section<T>(&self) -> Result<T, StdError>
    where
        T: ConfigSection,
    {
        self.get(T::key())
    }

    pub fn set<T>(&mut self, name: impl Into<String>, value: T) -> Result<(), StdError>
    where
        T: Serialize,
    {
        self.sections
            .insert(name.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn with<T>(mut self, name: impl Into<String>, value: T) -> Result<Self, StdError>
    where
        T: Serialize,
    {
        self.set(name, value)?;
        Ok(self)
    }

    /// Deep merges `other` into this config.
    ///
    /// Objects are merged key by key. Any other value, arrays included, is replaced by the
    /// value from `other`.
    pub fn merge_from(&mut self, other: Self) -> Result<(), StdError> {
        for (key, value) in other.sections {
            let entry = self.sections.entry(key);
            merge_json_from(entry.or_insert(serde_json::Value::Null), value)?;
        }
        Ok(())
    }

    pub fn parse<T>(text: T) -> Result<Self, StdError>
    where
        T: AsRef<str>,
    {
        Ok(serde_json::from_str(text.as_ref())?)
    }

    pub async fn parse_file(path: impl AsRef<Path>) -> Result<Self, StdError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(text)?;
        tracing::debug!(path = %path.display(), sections = config.len(), "Loaded config");
        Ok(config)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}

fn merge_json_from(lhs: &mut serde_json::Value, rhs: serde_json::Value) -> Result<(), StdError> {
    match (lhs, rhs) {
        (serde_json::Value::Object(target), serde_json::Value::Object(source)) => {
            for (key, value) in source {
                let slot = target.entry(key).or_insert(serde_json::Value::Null);
                merge_json_from(slot, value)?;
            }
        }
        (lhs, rhs) => *lhs = rhs,
    }
    Ok(())
}
