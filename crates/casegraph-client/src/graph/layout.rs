#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaneLayout {
    #[default]
    Single,
    Split,
}

impl PaneLayout {
    pub fn is_split(self) -> bool {
        self == PaneLayout::Split
    }

    pub fn open_split(&mut self) {
        *self = PaneLayout::Split;
    }

    pub fn close(&mut self) {
        *self = PaneLayout::Single;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Main,
    Subgraph,
}
