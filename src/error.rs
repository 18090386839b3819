use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    InvalidArgs(String),
    Config(String),
    Clock(String),
    Thread(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidArgs(msg) => write!(f, "invalid arguments: {}", msg),
            Error::Config(msg) => write!(f, "scheduling configuration error: {}", msg),
            Error::Clock(msg) => write!(f, "clock error: {}", msg),
            Error::Thread(msg) => write!(f, "thread error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
