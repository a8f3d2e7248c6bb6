pub mod config;
pub mod core;
pub mod mock;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;
