//! Binary API surface: message-id table, dispatcher and socket transport.

pub mod server;
pub mod service;
pub mod table;

pub use server::ApiServer;
pub use service::ApiService;
pub use table::MsgTable;
