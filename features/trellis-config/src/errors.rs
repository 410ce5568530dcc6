use trellis_di::TypeInfo;

/// Errors of the config registry
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// The required config type is not in the registry
    #[error("The config type '{0}' is not registered")]
    Missing(TypeInfo),
    /// A config of this type is already in the registry
    #[error("The config type '{0}' is already registered")]
    AlreadyRegistered(TypeInfo),
}
