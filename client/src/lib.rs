//! ShareLinks client library.
//!
//! A link-sharing board over a hosted document store and identity
//! provider, arranged as ports and adapters:
//!
//! - [`domain`]: link model, account service and the board controller
//! - [`inbound`]: the terminal shell
//! - [`outbound`]: hosted and in-memory adapters
//! - [`settings`]: layered configuration

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;

#[cfg(test)]
mod test_support;
