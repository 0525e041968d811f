//! Action dispatcher - resolves the sender and routes by trigger

use super::table::HandlerTable;
use super::{DispatchError, HandlerContext};
use crate::liveness::SharedRegistry;
use crate::transport::{Outbox, ParameterSink};
use router_shared::{protocol, Message};
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to a dispatched message
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Ping answer; the device was marked alive
    Alive { index: usize },
    /// A handler ran to completion
    Handled { index: usize },
    /// No handler could act on it; `unknown_command` was sent back
    Rejected { index: usize, error: DispatchError },
}

/// Routes decoded messages to action handlers
pub struct Dispatcher {
    registry: SharedRegistry,
    table: HandlerTable,
    outbox: Outbox,
    parameters: Arc<dyn ParameterSink>,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(
        registry: SharedRegistry,
        table: HandlerTable,
        outbox: Outbox,
        parameters: Arc<dyn ParameterSink>,
    ) -> Self {
        Self {
            registry,
            table,
            outbox,
            parameters,
        }
    }

    /// Dispatch one message; `raw` is the text it was decoded from
    ///
    /// The resolved index is only used for the duration of this call.
    pub async fn dispatch(&self, msg: &Message, raw: &str) -> DispatchOutcome {
        // Protocol-level answer, never routed to user handlers
        if msg.trigger == protocol::PING {
            let index = self.registry.heartbeat(&msg.device_token).await;
            debug!("Ping answer from {} (index {})", msg.device_token, index);
            return DispatchOutcome::Alive { index };
        }

        let index = self.registry.resolve(&msg.device_token).await;

        let ctx = HandlerContext {
            index,
            token: &msg.device_token,
            trigger: &msg.trigger,
            outbox: &self.outbox,
            parameters: self.parameters.as_ref(),
        };

        match self.table.invoke(&ctx, msg) {
            Ok(()) => DispatchOutcome::Handled { index },
            Err(error) => {
                self.unknown_command(&ctx, raw, &error);
                DispatchOutcome::Rejected { index, error }
            }
        }
    }

    /// Fallback for commands no handler could act on
    fn unknown_command(&self, ctx: &HandlerContext<'_>, raw: &str, error: &DispatchError) {
        warn!(
            "Unknown command from {} (index {}): {:?} ({})",
            ctx.token, ctx.index, raw, error
        );
        self.outbox.send(&Message::unknown_command(ctx.token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::parameter::RecordingSink;
    use router_shared::{codec, Args};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    type Calls = Arc<Mutex<Vec<(usize, String, Args)>>>;

    struct Fixture {
        dispatcher: Dispatcher,
        registry: SharedRegistry,
        outbound: mpsc::UnboundedReceiver<String>,
        calls: Calls,
    }

    fn fixture() -> Fixture {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();

        let mut table = HandlerTable::new();
        table
            .register(
                "skip_button_pressed",
                &["time", "x", "y"],
                move |ctx: &HandlerContext<'_>, args: &Args| -> Result<(), DispatchError> {
                    if let Ok(mut calls) = recorded.lock() {
                        calls.push((ctx.index, ctx.token.to_owned(), args.clone()));
                    }
                    Ok(())
                },
            )
            .expect("register failed");

        let registry = SharedRegistry::new();
        let (outbox, outbound) = Outbox::channel();
        let dispatcher = Dispatcher::new(
            registry.clone(),
            table,
            outbox,
            Arc::new(RecordingSink::default()),
        );

        Fixture {
            dispatcher,
            registry,
            outbound,
            calls,
        }
    }

    async fn dispatch_raw(dispatcher: &Dispatcher, raw: &str) -> DispatchOutcome {
        let msg = codec::decode(raw).expect("decode failed");
        dispatcher.dispatch(&msg, raw).await
    }

    fn recorded(calls: &Calls) -> Vec<(usize, String, Args)> {
        calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_ping_marks_alive_and_skips_handlers() {
        let mut fx = fixture();

        let outcome = dispatch_raw(&fx.dispatcher, "5:ping").await;
        assert_eq!(outcome, DispatchOutcome::Alive { index: 0 });
        assert!(fx.registry.is_alive("5").await);
        assert!(recorded(&fx.calls).is_empty());
        assert!(fx.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mapped_trigger_invokes_handler() {
        let mut fx = fixture();

        let outcome =
            dispatch_raw(&fx.dispatcher, "d1:skip_button_pressed:time=19.78,x=16,y=19").await;
        assert_eq!(outcome, DispatchOutcome::Handled { index: 0 });
        assert_eq!(fx.registry.index_of("d1").await, Some(0));

        let calls = recorded(&fx.calls);
        assert_eq!(calls.len(), 1);
        let (index, token, args) = &calls[0];
        assert_eq!(*index, 0);
        assert_eq!(token, "d1");
        assert_eq!(args.get("time").map(String::as_str), Some("19.78"));
        assert_eq!(args.get("x").map(String::as_str), Some("16"));
        assert_eq!(args.get("y").map(String::as_str), Some("19"));
        assert!(fx.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_trigger_replies_once() {
        let mut fx = fixture();

        let outcome = dispatch_raw(&fx.dispatcher, "d7:dance").await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Rejected {
                index: 0,
                error: DispatchError::UnknownTrigger(_)
            }
        ));

        assert_eq!(fx.outbound.try_recv().ok().as_deref(), Some("d7:unknown_command"));
        assert!(fx.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_argument_treated_as_unknown() {
        let mut fx = fixture();

        let outcome = dispatch_raw(&fx.dispatcher, "d1:skip_button_pressed:time=1").await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Rejected {
                error: DispatchError::MissingArgument { .. },
                ..
            }
        ));
        assert!(recorded(&fx.calls).is_empty());
        assert_eq!(fx.outbound.try_recv().ok().as_deref(), Some("d1:unknown_command"));
    }

    #[tokio::test]
    async fn test_senders_get_distinct_indices() {
        let fx = fixture();

        dispatch_raw(&fx.dispatcher, "a:ping").await;
        dispatch_raw(&fx.dispatcher, "b:dance").await;
        let outcome = dispatch_raw(&fx.dispatcher, "a:ping").await;

        assert_eq!(outcome, DispatchOutcome::Alive { index: 0 });
        assert_eq!(fx.registry.tokens().await, vec!["a".to_string(), "b".to_string()]);
    }
}
