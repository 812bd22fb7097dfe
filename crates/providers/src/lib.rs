//! Completion service providers for Helpline.
//!
//! All providers implement the `helpline_core::Provider` trait.
//! [`build_from_config`] turns an `AppConfig` into the provider the router uses.

pub mod factory;
pub mod openai_compat;
pub mod retry;

pub use factory::build_from_config;
pub use openai_compat::{OpenAiCompatProvider, Timeouts};
pub use retry::RetryProvider;
