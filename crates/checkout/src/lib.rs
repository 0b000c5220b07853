//! Checkout pipeline for the storefront backend.
//!
//! Placing an order runs through a single orchestrator:
//! 1. Validate the active cart and the shipping address
//! 2. Price the order from the live catalog
//! 3. Apply one atomic store commit that checks and decrements stock,
//!    writes the order, and retires the cart
//!
//! Transient storage failures are retried with bounded exponential
//! backoff; business failures such as running out of stock are not.

pub mod address;
pub mod error;
pub mod orchestrator;
pub mod retry;

pub use address::{Address, AddressDirectory, InMemoryAddressDirectory};
pub use error::CheckoutError;
pub use orchestrator::CheckoutOrchestrator;
pub use retry::{RetryPolicy, retry_transient};
