pub mod client;
pub mod session;
pub mod transport;
pub mod view;

pub use client::{ClientEvent, SessionClient};
pub use session::{HistoryEntry, Session};
pub use transport::{ConnectionState, Transport};
pub use view::{SubTaskView, SubTaskVisual, ThoughtLine, ViewModel};

#[cfg(test)]
pub(crate) mod test_support;
