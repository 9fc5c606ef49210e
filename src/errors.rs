use thiserror::Error;

#[derive(Debug, Error)]
pub enum LongRunError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Hook '{name}' failed: {message}")]
    Hook { name: String, message: String },

    #[error("No hook registered under '{0}'")]
    MissingHook(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_display() {
        let err = LongRunError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_scheduler_display() {
        let err = LongRunError::Scheduler("trigger rejected".to_string());
        assert_eq!(err.to_string(), "Scheduler error: trigger rejected");
    }

    #[test]
    fn test_validation_display() {
        let err = LongRunError::Validation("iterations must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: iterations must be at least 1"
        );
    }

    #[test]
    fn test_hook_display() {
        let err = LongRunError::Hook {
            name: "exportChunk".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Hook 'exportChunk' failed: boom");
    }

    #[test]
    fn test_missing_hook_display() {
        let err = LongRunError::MissingHook("noSuchHook".to_string());
        assert_eq!(err.to_string(), "No hook registered under 'noSuchHook'");
    }

}
