use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsiError {
    #[error("too few cards: deck must contain at least 2 distinct cards")]
    TooFewCards,

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store schema mismatch: {0}")]
    SchemaMismatch(String),
}

pub type AsiResult<T> = Result<T, AsiError>;
