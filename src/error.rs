use std::fmt;

use crate::schema::InputError;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    CannotConnect(String),
    InvalidData(String),
    InvalidInput(Vec<InputError>),
    EntryNotFound(String),
    Json(serde_json::Error),
    Timeout,
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::CannotConnect(msg) => write!(f, "cannot connect: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidInput(errors) => {
                write!(f, "invalid input:")?;
                for e in errors {
                    write!(f, " {e};")?;
                }
                Ok(())
            }
            Error::EntryNotFound(id) => write!(f, "config entry not found: {id}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Timeout => write!(f, "request timed out"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Base error code shown on a redisplayed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowErrorCode {
    CannotConnect,
    InvalidData,
    Unknown,
}

impl FlowErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowErrorCode::CannotConnect => "cannot_connect",
            FlowErrorCode::InvalidData => "invalid_data",
            FlowErrorCode::Unknown => "unknown",
        }
    }
}

impl From<&Error> for FlowErrorCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::CannotConnect(_) => FlowErrorCode::CannotConnect,
            Error::InvalidData(_) => FlowErrorCode::InvalidData,
            _ => FlowErrorCode::Unknown,
        }
    }
}

impl fmt::Display for FlowErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_their_codes() {
        let e = Error::CannotConnect("HTTP 500".into());
        assert_eq!(FlowErrorCode::from(&e).as_str(), "cannot_connect");

        let e = Error::InvalidData("missing keys".into());
        assert_eq!(FlowErrorCode::from(&e).as_str(), "invalid_data");
    }

    #[test]
    fn other_errors_map_to_unknown() {
        let e = Error::Io(std::io::Error::other("disk full"));
        assert_eq!(FlowErrorCode::from(&e), FlowErrorCode::Unknown);
        assert_eq!(FlowErrorCode::from(&Error::Timeout), FlowErrorCode::Unknown);
    }

    #[test]
    fn display_includes_detail() {
        let e = Error::CannotConnect("HTTP 404".into());
        assert_eq!(e.to_string(), "cannot connect: HTTP 404");
        assert_eq!(
            Error::EntryNotFound("abc".into()).to_string(),
            "config entry not found: abc"
        );
    }
}
