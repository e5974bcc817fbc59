//! CAS handshake: page-scoped forms, the state machine, and its driver.

pub mod forms;
pub mod protocol;
pub mod state;

pub use forms::{ContinuePage, ExecutionToken, LoginPage};
pub use protocol::CasHandshake;
pub use state::HandshakeState;
