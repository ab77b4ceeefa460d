use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Configuration error: {0}")]
    Config(String),
}
