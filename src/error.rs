//! definition of the general gateway core error types

use core::fmt;
use crate::data::PackingError;

/**
    general object reporting an unexpected result of a core operation

    Its variants are meant to help finding the cause responsible for the problem and how to deal with it. A failing operation never leaves the shared state partially modified.
*/
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CoreError {
    /// a slot, signal or parameter index is out of the device model's range
    ///
    /// these errors are caused by the user code and can be fixed by using valid indices
    Index(&'static str),

    /// a buffer does not have the size expected by the computed layout
    ///
    /// these errors are caused by the user code passing wrongly sized frames or parameter data
    Size(&'static str),

    /// the device model is inconsistent
    ///
    /// these errors can only be fixed by regenerating the device model
    Model(&'static str),

    /// a resource could not be obtained (memory, queue space)
    Resource(&'static str),

    /// the communication with the peer is not working
    ///
    /// these errors generally require the transport to be restarted
    Communication(ErrorCode),

    /// the requested change conflicts with the current state, like raising an alarm twice
    Conflict(&'static str),
}

/// convenient alias to simplify return annotations
pub type CoreResult<T=()> = core::result::Result<T, CoreError>;

impl CoreError {
    /// negative return code matching this error, for callers speaking in integer status codes
    pub fn code(&self) -> i32 {
        match self {
            Self::Index(_) => -2,
            Self::Size(_) => -3,
            Self::Model(_) => -4,
            Self::Resource(_) => -5,
            Self::Communication(_) => -6,
            Self::Conflict(_) => -7,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (src, msg) = match self {
            Self::Index(msg) => ("Index", *msg),
            Self::Size(msg) => ("Size", *msg),
            Self::Model(msg) => ("Model", *msg),
            Self::Resource(msg) => ("Resource", *msg),
            Self::Communication(code) => ("Communication", code.as_str()),
            Self::Conflict(msg) => ("Conflict", *msg),
        };
        f.debug_struct("CoreError")
            .field("source", &src)
            .field("message", &msg)
            .field("code", &self.code())
            .finish()
    }
}

impl std::error::Error for CoreError {}

impl From<PackingError> for CoreError {
    fn from(src: PackingError) -> Self {
        CoreError::Size(match src {
            PackingError::BadSize(_, text) => text,
            PackingError::BadLength(_, text) => text,
        })
    }
}


/**
    errors reported asynchronously to the host and the adapter

    These do not come as return values but as error messages in the message channel and calls to [crate::Adapter::error_ind]
*/
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    /// the host/core communication watchdog expired
    CoreCommunication,
    /// the transport reported a failure or a loss of link
    Transport,
    /// the device configuration could not be applied
    Configuration,
    /// a frame with a bad checksum was received
    Crc,
    /// the core detected an inconsistency in its own state
    Internal,
}

impl ErrorCode {
    /// string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoreCommunication => "core communication error",
            Self::Transport => "transport error",
            Self::Configuration => "configuration error",
            Self::Crc => "crc error",
            Self::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
