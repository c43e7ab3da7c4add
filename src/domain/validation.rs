use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    TooLong { field: &'static str, max: usize, actual: usize },
    TooManyRecipients { max: usize, actual: usize },
    InvalidPhoneNumber { input: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} is too long: {actual} characters (max {max})")
            }
            Self::TooManyRecipients { max, actual } => {
                write!(f, "too many recipients: {actual} (max {max})")
            }
            Self::InvalidPhoneNumber { input } => write!(f, "invalid phone number: {input}"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::ValidationError;

    #[test]
    fn display_messages_are_human_readable() {
        let err = ValidationError::Empty { field: "to" };
        assert_eq!(err.to_string(), "to must not be empty");

        let err = ValidationError::TooLong {
            field: "tag",
            max: 32,
            actual: 40,
        };
        assert_eq!(err.to_string(), "tag is too long: 40 characters (max 32)");

        let err = ValidationError::TooManyRecipients {
            max: 2,
            actual: 3,
        };
        assert_eq!(err.to_string(), "too many recipients: 3 (max 2)");

        let err = ValidationError::InvalidPhoneNumber {
            input: "bad".to_owned(),
        };
        assert_eq!(err.to_string(), "invalid phone number: bad");
    }
}
