pub mod app;
pub mod graph;
pub mod net;
pub mod util;
