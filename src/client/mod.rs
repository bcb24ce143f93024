//! Client half of the registration protocol.
//!
//! [`OptimisticController`] applies registrations speculatively and
//! reconciles them with the server through a [`RegistrationTransport`].

pub mod controller;
pub mod transport;

pub use controller::{
    AttemptOutcome, ControllerView, OptimisticController, PendingRegistration, RegistrationState,
    RequestRejected,
};
pub use transport::{HttpTransport, RegistrationTransport};
