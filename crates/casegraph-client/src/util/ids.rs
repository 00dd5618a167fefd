use casegraph_core::{Node, NodeDetail};

pub fn node_label_short(n: &Node) -> String {
    if n.name.trim().is_empty() {
        n.key.0.clone()
    } else {
        n.name.clone()
    }
}

pub fn node_label_long(n: &Node) -> Vec<String> {
    let mut out = Vec::new();
    if !n.node_type.is_empty() {
        out.push(format!("type: {}", n.node_type));
    }
    if !n.id.is_empty() && n.id != n.key.0 {
        out.push(format!("id: {}", n.id));
    }
    match (&n.date, &n.time) {
        (Some(d), Some(t)) => out.push(format!("when: {d} {t}")),
        (Some(d), None) => out.push(format!("when: {d}")),
        _ => {}
    }
    if let Some(s) = &n.summary {
        out.push(format!("summary: {s}"));
    }
    out
}

pub fn detail_headline(d: &NodeDetail) -> String {
    let name = if d.name.trim().is_empty() {
        d.key.0.as_str()
    } else {
        d.name.as_str()
    };
    format!("{name} [{}] ({} connections)", d.node_type, d.connections.len())
}
