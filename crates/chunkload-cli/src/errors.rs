use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: '{path}'")]
    FileNotFound { path: String },
    #[error("Missing setting '{setting}': pass {flag} or set it in the config file")]
    MissingSetting {
        setting: &'static str,
        flag: &'static str,
    },
    #[error("'{setting}' must be greater than 0")]
    NotPositive { setting: &'static str },
}
