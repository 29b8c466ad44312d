mod client;
mod server;

pub use client::IpcClient;
pub use server::IpcServer;

use std::path::PathBuf;

/// Control socket location: the user's runtime dir when available.
pub fn socket_path() -> PathBuf {
    if let Some(dir) = dirs::runtime_dir() {
        return dir.join("oshiire.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    std::env::temp_dir().join(format!("oshiire-{}.sock", user))
}
