use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] livedata_server::ConfigError),

    #[error(transparent)]
    Server(#[from] livedata_server::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
