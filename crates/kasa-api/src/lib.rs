// kasa-api: Async Rust client for the TP-Link Kasa smart plug local protocol

pub mod cipher;
pub mod client;
pub mod command;
mod emeter;
pub mod error;
pub mod frame;
pub mod models;
mod system;
mod time;
pub mod transport;

pub use cipher::AutokeyCipher;
pub use client::KasaClient;
pub use command::{Command, Request, Target};
pub use error::Error;
pub use frame::FrameCodec;
pub use models::Response;
pub use transport::{DEFAULT_PORT, TransportConfig};
