use casegraph_core::{NodeKey, TimelineEvent};
use std::collections::BTreeSet;

use crate::graph::model::GraphModel;

// written by graph-originated selection, never by the timeline itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineContext {
    keys: BTreeSet<NodeKey>,
}

impl TimelineContext {
    pub fn keys(&self) -> &BTreeSet<NodeKey> {
        &self.keys
    }

    pub fn overwrite<I: IntoIterator<Item = NodeKey>>(&mut self, keys: I) {
        self.keys = keys.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn admits(&self, event: &TimelineEvent) -> bool {
        self.keys.is_empty()
            || self.keys.contains(&event.key)
            || event.connections.iter().any(|k| self.keys.contains(k))
    }
}

pub fn filter_events<'a>(events: &'a [TimelineEvent], ctx: &TimelineContext) -> Vec<&'a TimelineEvent> {
    events.iter().filter(|e| ctx.admits(e)).collect()
}

pub fn events_from_model(model: &GraphModel) -> Vec<TimelineEvent> {
    let neighbours = model.neighbour_map();
    let mut events: Vec<TimelineEvent> = model
        .graph()
        .nodes
        .iter()
        .filter_map(|n| {
            let date = n.date.as_ref().filter(|d| !d.trim().is_empty())?;
            Some(TimelineEvent {
                key: n.key.clone(),
                name: n.name.clone(),
                event_type: n.node_type.clone(),
                date: date.clone(),
                time: n.time.clone(),
                connections: neighbours
                    .get(&n.key)
                    .map(|set| set.iter().map(|k| (*k).clone()).collect())
                    .unwrap_or_default(),
            })
        })
        .collect();
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.time.cmp(&b.time))
            .then_with(|| a.key.cmp(&b.key))
    });
    events
}
