pub mod backend;
pub mod details;
pub mod protocol;
pub mod uds;

pub use backend::Backend;
pub use details::DetailLoader;
pub use protocol::Incoming;
pub use uds::UdsBackend;
