use thiserror::Error;

use std::io::Error as IOError;

#[derive(Error, Debug)]
pub enum PlateError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] IOError),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("no input images given")]
    NoInputs,
}

pub type Result<T> = std::result::Result<T, PlateError>;
