use impf_types::DossierStatus;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown dossier status: {0}")]
    UnknownStatus(String),

    /// Both statuses belong to the booster phase, which is re-entered on every booster cycle
    /// and therefore has no global order.
    #[error("cannot compare two booster-phase statuses ({status} and {other})")]
    InvalidBoosterComparison {
        status: DossierStatus,
        other: DossierStatus,
    },
}

impl From<impf_types::TypesError> for CoreError {
    fn from(err: impf_types::TypesError) -> Self {
        match err {
            impf_types::TypesError::UnknownStatus(name) => CoreError::UnknownStatus(name),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
