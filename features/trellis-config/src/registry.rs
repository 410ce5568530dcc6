use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use trellis_di::TypeInfo;

use crate::{config::Config, errors::ConfigError};

/// Holds one config value per type
///
/// Filled once at startup, read-only afterwards.
#[derive(Default)]
pub struct ConfigRegistry {
    configs: HashMap<TypeId, Arc<dyn Any + Send + Sync + 'static>>,
}

impl ConfigRegistry {
    /// Initializes an empty registry
    pub fn initialize() -> Self {
        Self {
            configs: HashMap::new(),
        }
    }

    /// Retrieve the config of the specified type
    pub fn get_config<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ConfigError> {
        self.configs
            .get(&TypeId::of::<T>())
            .map(|entry| entry.clone().downcast())
            .transpose()
            .map_err(|_| ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Retrieve the config of the specified type, wrapped for injection
    ///
    /// Unlike [`ConfigRegistry::get_config`] an absent type is an error.
    pub fn config<T: Send + Sync + 'static>(&self) -> Result<Config<T>, ConfigError> {
        let inner = self
            .get_config::<T>()?
            .ok_or(ConfigError::Missing(TypeInfo::of::<T>()))?;
        Ok(Config::new(inner))
    }

    /// Add a config to the registry
    ///
    /// Each type can be added once.
    pub fn add_config<T: Send + Sync + 'static>(&mut self, config: T) -> Result<&mut Self, ConfigError> {
        let type_id = TypeId::of::<T>();
        if self.configs.contains_key(&type_id) {
            return Err(ConfigError::AlreadyRegistered(TypeInfo::of::<T>()));
        }
        tracing::debug!("Registering config '{}'", TypeInfo::of::<T>());
        self.configs.insert(type_id, Arc::new(config));
        Ok(self)
    }

    /// Add a config when one is present
    ///
    /// `None` just returns `Ok(self)` for chaining.
    pub fn maybe_add_config<T: Send + Sync + 'static>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(config) => self.add_config(config),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    struct Sample {
        retries: u8,
    }

    #[test]
    fn configs_are_registered_once_per_type() {
        let mut registry = ConfigRegistry::initialize();
        registry.add_config(Sample { retries: 3 }).unwrap();
        let err = registry
            .add_config(Sample { retries: 5 })
            .err()
            .expect("the type is already registered");
        assert!(matches!(err, ConfigError::AlreadyRegistered(_)));
        assert_eq!(
            registry.get_config::<Sample>().unwrap().unwrap().retries,
            3
        );
    }

    #[test]
    fn absent_types_resolve_to_none_or_an_error() {
        let registry = ConfigRegistry::initialize();
        assert!(registry.get_config::<Sample>().unwrap().is_none());
        assert!(matches!(
            registry.config::<Sample>(),
            Err(ConfigError::Missing(_))
        ));
    }
}
