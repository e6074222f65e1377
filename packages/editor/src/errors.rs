use thiserror::Error;
use trellis_model::ModelError;

pub type EditResult<T> = Result<T, EditError>;

/// Errors surfaced by the editing layer. Structural failures come up
/// from the model unchanged.
#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Model(#[from] ModelError),
}
