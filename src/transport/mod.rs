#[cfg(test)]
pub mod channel;
pub mod outbox;
pub mod parameter;
pub mod tcp;
pub mod traits;

#[cfg(test)]
pub use channel::ChannelBus;
pub use outbox::Outbox;
pub use parameter::{LogParameterSink, UdpParameterSink};
pub use tcp::TcpBus;
pub use traits::{Bus, ParameterSink};
