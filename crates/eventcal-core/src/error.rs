use thiserror::Error;

/// The user-visible message shown instead of a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMessage {
    RequiredFieldsMissing,
    WrongFieldTypes,
}

impl DisplayMessage {
    pub fn text(self) -> &'static str {
        match self {
            Self::RequiredFieldsMissing => "'Start Date' and 'Event' are required fields",
            Self::WrongFieldTypes => {
                "'Start date' should be in 'datetime' format & 'Events' should be in 'text' format."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("required roles missing: start date present = {start_date}, events present = {events}")]
    MissingRoles { start_date: bool, events: bool },
    #[error("wrong role types: start date is datetime = {start_date}, events is text = {events}")]
    WrongTypes { start_date: bool, events: bool },
    #[error("persisted state error: {0}")]
    Persisted(String),
    #[error("projection failed: {0}")]
    Unhandled(String),
}

impl ProjectionError {
    /// Role failures are recoverable and surface as a message; everything else is a failed render.
    pub fn display_message(&self) -> Option<DisplayMessage> {
        match self {
            Self::MissingRoles { .. } => Some(DisplayMessage::RequiredFieldsMissing),
            Self::WrongTypes { .. } => Some(DisplayMessage::WrongFieldTypes),
            Self::Persisted(_) | Self::Unhandled(_) => None,
        }
    }
}
