use casegraph_core::{Node, NodeKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Graph,
    Subgraph,
    Timeline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerModifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierInput {
    Pointer(PointerModifiers),
    Resolved { multi_select: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectModifiers {
    pub multi_select: bool,
}

impl SelectModifiers {
    pub const SINGLE: Self = Self {
        multi_select: false,
    };
    pub const MULTI: Self = Self { multi_select: true };
}

impl From<PointerModifiers> for SelectModifiers {
    fn from(m: PointerModifiers) -> Self {
        Self {
            multi_select: m.ctrl || m.meta || m.shift,
        }
    }
}

impl From<ModifierInput> for SelectModifiers {
    fn from(input: ModifierInput) -> Self {
        match input {
            ModifierInput::Pointer(m) => m.into(),
            ModifierInput::Resolved { multi_select } => Self { multi_select },
        }
    }
}

// Ordered selection, in click order. Holds whole nodes so consumers do not
// need to look them up again.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    nodes: Vec<Node>,
    // slot of the last node toggled off, so toggling it back restores order
    vacated: Option<(NodeKey, usize)>,
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Selection {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn keys(&self) -> Vec<NodeKey> {
        self.nodes.iter().map(|n| n.key.clone()).collect()
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.iter().any(|n| &n.key == key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn select_single(&mut self, node: Node) {
        self.vacated = None;
        self.nodes.clear();
        self.nodes.push(node);
    }

    pub fn toggle(&mut self, node: Node) {
        if let Some(pos) = self.nodes.iter().position(|n| n.key == node.key) {
            self.nodes.remove(pos);
            self.vacated = Some((node.key, pos));
            return;
        }
        match self.vacated.take() {
            Some((key, pos)) if key == node.key => {
                self.nodes.insert(pos.min(self.nodes.len()), node);
            }
            _ => self.nodes.push(node),
        }
    }

    pub fn select(&mut self, node: Node, mods: SelectModifiers) {
        if mods.multi_select {
            self.toggle(node);
        } else {
            self.select_single(node);
        }
    }

    pub fn replace(&mut self, nodes: Vec<Node>) {
        self.vacated = None;
        self.nodes.clear();
        for node in nodes {
            if !self.contains(&node.key) {
                self.nodes.push(node);
            }
        }
    }

    pub fn clear(&mut self) {
        self.vacated = None;
        self.nodes.clear();
    }
}
