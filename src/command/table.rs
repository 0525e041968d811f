//! Trigger → handler table
//!
//! Each trigger is bound once, together with the argument keys its handler
//! cannot work without. Names are checked when they are registered so a bad
//! binding fails at startup instead of on the first matching command.

use super::{DispatchError, HandlerContext};
use router_shared::codec::{ARG_SEPARATOR, FIELD_SEPARATOR, KEY_VALUE_SEPARATOR};
use router_shared::{protocol, Args, Message};
use std::collections::HashMap;
use thiserror::Error;

/// A user-level action bound to a trigger
pub trait ActionHandler: Send + Sync {
    fn handle(&self, ctx: &HandlerContext<'_>, args: &Args) -> Result<(), DispatchError>;
}

impl<F> ActionHandler for F
where
    F: Fn(&HandlerContext<'_>, &Args) -> Result<(), DispatchError> + Send + Sync,
{
    fn handle(&self, ctx: &HandlerContext<'_>, args: &Args) -> Result<(), DispatchError> {
        self(ctx, args)
    }
}

/// Rejected handler bindings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("trigger name is empty")]
    EmptyTrigger,

    #[error("trigger {0:?} contains a protocol separator")]
    InvalidTrigger(String),

    #[error("trigger {0:?} is reserved by the protocol")]
    Reserved(String),

    #[error("trigger {0:?} is already registered")]
    Duplicate(String),

    #[error("argument key {key:?} for trigger {trigger:?} is not a valid key")]
    InvalidKey { trigger: String, key: String },
}

struct Route {
    required: Vec<String>,
    handler: Box<dyn ActionHandler>,
}

/// Mapping from trigger name to handler
#[derive(Default)]
pub struct HandlerTable {
    routes: HashMap<String, Route>,
}

impl HandlerTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to a trigger
    pub fn register<H>(
        &mut self,
        trigger: &str,
        required: &[&str],
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: ActionHandler + 'static,
    {
        if trigger.is_empty() {
            return Err(RegistrationError::EmptyTrigger);
        }
        if has_separator(trigger) {
            return Err(RegistrationError::InvalidTrigger(trigger.to_owned()));
        }
        if protocol::is_reserved(trigger) {
            return Err(RegistrationError::Reserved(trigger.to_owned()));
        }
        if self.routes.contains_key(trigger) {
            return Err(RegistrationError::Duplicate(trigger.to_owned()));
        }
        if let Some(key) = required.iter().find(|k| k.is_empty() || has_separator(k)) {
            return Err(RegistrationError::InvalidKey {
                trigger: trigger.to_owned(),
                key: (*key).to_owned(),
            });
        }

        self.routes.insert(
            trigger.to_owned(),
            Route {
                required: required.iter().map(|k| (*k).to_owned()).collect(),
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Registered triggers, sorted
    pub fn triggers(&self) -> Vec<&str> {
        let mut triggers: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        triggers.sort_unstable();
        triggers
    }

    /// Route a message to its handler after checking required arguments
    pub fn invoke(&self, ctx: &HandlerContext<'_>, msg: &Message) -> Result<(), DispatchError> {
        let route = self
            .routes
            .get(&msg.trigger)
            .ok_or_else(|| DispatchError::UnknownTrigger(msg.trigger.clone()))?;

        if let Some(key) = route.required.iter().find(|k| !msg.args.contains_key(*k)) {
            return Err(DispatchError::MissingArgument {
                trigger: msg.trigger.clone(),
                key: key.clone(),
            });
        }

        route.handler.handle(ctx, &msg.args)
    }
}

fn has_separator(name: &str) -> bool {
    name.contains(&[FIELD_SEPARATOR, ARG_SEPARATOR, KEY_VALUE_SEPARATOR][..])
}
