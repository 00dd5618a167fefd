pub mod explain;
pub mod geo;
pub mod layout;
pub mod model;
pub mod query;
pub mod selection;
pub mod state;
pub mod subgraph;
pub mod timeline;

pub use layout::{Pane, PaneLayout};
pub use selection::{ModifierInput, PointerModifiers, SelectModifiers, SelectionSource};
pub use state::{Effect, Notice, Session};
