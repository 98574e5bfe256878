//! WebSocket fan-out for real-time reservation notifications.
//!
//! Every connected client receives every broker message; there is no
//! per-user routing. A message reaches clients of every server process
//! because producers publish to the broker instead of writing to sockets.
//!
//! # Message Flow
//!
//! 1. A client opens `/ws`; its `Origin` header is checked against the
//!    [`OriginPolicy`] before the upgrade.
//! 2. [`session::serve`] registers the connection in the
//!    [`ConnectionRegistry`] and hands its read half to the [`Dispatcher`].
//! 3. Client frames are decoded into an [`InboundFrame`] and published to the
//!    matching broker topic. Bad frames are logged and dropped.
//! 4. Domain events are published to the broker by [`BrokerEventHandler`].
//! 5. The [`FanoutLoop`] receives each broker message, wraps it in an
//!    [`Envelope`] and broadcasts it to every registered connection.
//!    Connections whose write fails or stalls are removed during the pass.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry, ConnectionId and the MessageSink seam
//! - `dispatcher`: inbound frame routing to the broker
//! - `fanout`: the broker to client relay loop
//! - `message`: wire envelope and inbound frame decoding
//! - `origin`: upgrade allow-list
//! - `session`: per-connection lifecycle

pub mod connection;
pub mod dispatcher;
pub mod domain_event_handler;
pub mod error;
pub mod fanout;
pub mod message;
pub mod origin;
pub mod session;

pub use connection::{BroadcastReport, ConnectionId, ConnectionRegistry, MessageSink};
pub use dispatcher::{Dispatch, Dispatcher};
pub use domain_event_handler::BrokerEventHandler;
pub use error::{DecodeError, DecodeErrorKind, TransportError, TransportErrorKind};
pub use fanout::FanoutLoop;
pub use message::{Envelope, EventKind, InboundFrame};
pub use origin::OriginPolicy;
