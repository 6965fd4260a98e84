use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,
}

/// Failures reported by the email transport. These propagate out of issuance
/// as hard errors so a caller never tells a user to check their inbox for a
/// message that was never sent.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

impl Error {
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_delivery_error(&self) -> bool {
        matches!(self, Error::Delivery(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let validation_error =
            Error::Validation(ValidationError::InvalidEmail("test@".to_string()));
        assert_eq!(
            validation_error.to_string(),
            "Validation error: Invalid email format: test@"
        );

        let storage_error = Error::Storage(StorageError::NotFound);
        assert_eq!(storage_error.to_string(), "Storage error: Record not found");

        let delivery_error =
            Error::Delivery(DeliveryError::Transport("smtp timeout".to_string()));
        assert_eq!(
            delivery_error.to_string(),
            "Delivery error: Transport error: smtp timeout"
        );
    }

    #[test]
    fn test_error_from_conversions() {
        let error: Error = ValidationError::MissingField("email".to_string()).into();
        assert!(error.is_validation_error());

        let error: Error = StorageError::Database("connection failed".to_string()).into();
        assert!(error.is_storage_error());

        let error: Error = DeliveryError::Transport("refused".to_string()).into();
        assert!(error.is_delivery_error());
    }
}
