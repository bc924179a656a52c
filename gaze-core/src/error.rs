use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("balanced runs need a positive even width, got {0}")]
    InvalidRunWidth(usize),

    #[error("cannot cycle through an empty set")]
    EmptyCycle,
}
