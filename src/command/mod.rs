//! Command routing for the router
//!
//! This module handles:
//! - Binding action handlers to trigger names
//! - Resolving the sending device and dispatching by trigger
//! - Answering commands nobody can handle with `unknown_command`

mod dispatcher;
pub mod handlers;
mod table;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use table::{ActionHandler, HandlerTable, RegistrationError};

use crate::transport::{Outbox, ParameterSink};
use thiserror::Error;

/// Why a decoded command could not be acted on
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no handler registered for trigger {0:?}")]
    UnknownTrigger(String),

    #[error("missing argument {key:?} for trigger {trigger:?}")]
    MissingArgument { trigger: String, key: String },

    #[error("invalid value {value:?} for argument {key:?}")]
    InvalidArgument { key: String, value: String },
}

/// Context passed to action handlers
///
/// Valid for a single dispatch; `index` must not be kept past it.
pub struct HandlerContext<'a> {
    pub index: usize,
    pub token: &'a str,
    pub trigger: &'a str,
    pub outbox: &'a Outbox,
    pub parameters: &'a dyn ParameterSink,
}
