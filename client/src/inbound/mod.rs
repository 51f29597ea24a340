//! Inbound adapters translating user input into domain intents.
//!
//! - **cli**: interactive shell over stdin/stdout
//!
//! Adapters depend on domain services and ports only; concrete outbound
//! adapters are chosen by the binary.

pub mod cli;
