//! Binary control-plane API for the interface mirror.
//!
//! Message layouts are fixed and big-endian with bounded NUL-padded string
//! fields, so a control agent in any language can speak the protocol
//! without a schema compiler. Message ids are not constants: the daemon
//! assigns a contiguous block at startup and agents resolve ids by name
//! through the reserved lookup exchange (id 0).

pub mod error;
pub mod msg;
pub mod wire;

pub use error::{ApiError, ApiResult};
pub use msg::{Header, HostType, MsgKind, MSG_LOOKUP_ID};
