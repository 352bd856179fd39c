mod checksum;
mod receive;
mod send;

pub use checksum::run_checksum;
pub use receive::{run_receive, ReceiveOptions};
pub use send::{run_send, SendOptions};
