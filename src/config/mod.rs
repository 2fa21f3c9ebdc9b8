mod settings;

pub use settings::{HttpConfig, LoggingConfig, ProviderEndpoint, ProvidersConfig, Settings};
