use crate::errors::VigilError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("initial load already in progress")]
    AlreadyLoading,

    #[error("initial load cancelled")]
    Cancelled,
}

impl VigilError for LoadError {
    fn error_code(&self) -> &'static str {
        match self {
            LoadError::AlreadyLoading => "LOAD_ALREADY_IN_PROGRESS",
            LoadError::Cancelled => "LOAD_CANCELLED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LoadError::AlreadyLoading.error_code(), "LOAD_ALREADY_IN_PROGRESS");
        assert_eq!(LoadError::Cancelled.error_code(), "LOAD_CANCELLED");
        assert!(!LoadError::Cancelled.is_user_error());
        assert_eq!(LoadError::Cancelled.to_string(), "initial load cancelled");
    }
}
