pub mod attachment;
mod client;
pub mod notifier;

pub use client::DEFAULT_API_URL;
pub use notifier::{notify, NotifyOutcome};
