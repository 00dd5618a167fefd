use casegraph_core::{Node, NodeKey};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub key: NodeKey,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

fn prop_f64(node: &Node, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| match node.properties.get(*name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn node_point(node: &Node) -> Option<GeoPoint> {
    let lat = node
        .latitude
        .or_else(|| prop_f64(node, &["latitude", "lat"]))?;
    let lon = node
        .longitude
        .or_else(|| prop_f64(node, &["longitude", "lng", "lon"]))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some(GeoPoint {
        key: node.key.clone(),
        name: node.name.clone(),
        latitude: lat,
        longitude: lon,
    })
}

pub fn map_points<'a, I: IntoIterator<Item = &'a Node>>(nodes: I) -> Vec<GeoPoint> {
    nodes.into_iter().filter_map(node_point).collect()
}
