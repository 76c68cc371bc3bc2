pub mod address;
pub mod error;
pub mod logging;
pub mod message;

pub use address::{AddressMap, Mailbox, Recipients};
pub use error::MessageError;
pub use message::CapturedMessage;

pub use tracing;
