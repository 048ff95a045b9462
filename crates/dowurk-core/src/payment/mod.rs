//! Payment confirmation after the checkout redirect.

pub mod poller;
pub mod session;

pub use poller::{PaymentConfirmationPoller, PollHandle};
pub use session::PaymentSession;
