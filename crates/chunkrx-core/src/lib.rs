pub mod config;
pub mod logging;

pub mod digest;
pub mod error;
pub mod receiver;
pub mod sender;
pub mod storage;
pub mod transport;
