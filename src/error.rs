//! Error types of the bot.

use std::fmt;
use serenity::model::id::UserId;

#[derive(Debug)]
pub enum Error {
    /// A call to Discord (rename, role change, member lookup) was rejected or timed out.
    ExternalCall(String),
    /// The member cannot be resolved anymore (left the server, unknown id...).
    MissingMember(UserId),
    /// A required configuration key is absent.
    ConfigMissing(&'static str),
    /// A configuration key holds a value that cannot be parsed.
    ConfigInvalid {
        key: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ExternalCall(what) => write!(f, "Discord call failed: {}", what),
            Error::MissingMember(user) => write!(f, "Member {} not found", user),
            Error::ConfigMissing(key) => write!(f, "Missing configuration key {}", key),
            Error::ConfigInvalid { key, value } => write!(f, "Invalid value for {}: {:?}", key, value),
        }
    }
}

impl std::error::Error for Error {}

impl From<serenity::Error> for Error {
    fn from(e: serenity::Error) -> Self {
        Error::ExternalCall(e.to_string())
    }
}
