use casegraph_core::{AnalysisKind, AnalysisResult, Node};
use std::cmp::Ordering;

use crate::util::ids::node_label_short;

const TOP: usize = 5;

fn ranked_by<F>(nodes: &[Node], score: F) -> Vec<(&Node, f64)>
where
    F: Fn(&Node) -> Option<f64>,
{
    let mut out: Vec<(&Node, f64)> = nodes.iter().filter_map(|n| score(n).map(|s| (n, s))).collect();
    out.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.key.cmp(&b.0.key))
    });
    out.truncate(TOP);
    out
}

fn ranking_line(label: &str, ranked: &[(&Node, f64)]) -> String {
    let parts: Vec<String> = ranked
        .iter()
        .map(|(n, s)| format!("{} ({s:.3})", node_label_short(n)))
        .collect();
    format!("{label}: {}", parts.join(", "))
}

pub fn describe_analysis(result: &AnalysisResult) -> String {
    let nodes = &result.graph.nodes;
    let links = result.graph.links.len();
    let mut lines = Vec::new();

    match result.kind {
        AnalysisKind::ShortestPaths => {
            lines.push(format!(
                "Shortest paths: {} nodes connected by {links} links",
                nodes.len()
            ));
        }
        AnalysisKind::PageRank => {
            lines.push(format!("PageRank over {} nodes", nodes.len()));
            let ranked = ranked_by(nodes, |n| n.pagerank_score);
            if !ranked.is_empty() {
                lines.push(ranking_line("Most influential", &ranked));
            }
        }
        AnalysisKind::Betweenness => {
            lines.push(format!("Betweenness centrality over {} nodes", nodes.len()));
            let ranked = ranked_by(nodes, |n| n.betweenness_centrality);
            if !ranked.is_empty() {
                lines.push(ranking_line("Key bridges", &ranked));
            }
        }
        AnalysisKind::Communities => {
            let mut sizes: Vec<(&String, usize)> = result
                .communities
                .iter()
                .map(|(id, c)| (id, c.size))
                .collect();
            if sizes.is_empty() {
                let mut counts = std::collections::BTreeMap::<String, usize>::new();
                for n in nodes {
                    if let Some(id) = n.community_id {
                        *counts.entry(id.to_string()).or_default() += 1;
                    }
                }
                lines.push(format!(
                    "{} communities across {} nodes",
                    counts.len(),
                    nodes.len()
                ));
                return lines.join("\n");
            }
            sizes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            lines.push(format!(
                "{} communities across {} nodes",
                sizes.len(),
                nodes.len()
            ));
            for (id, size) in sizes.into_iter().take(TOP) {
                let summary = result
                    .communities
                    .get(id)
                    .and_then(|c| c.summary.as_deref())
                    .map(|s| format!(": {s}"))
                    .unwrap_or_default();
                lines.push(format!("community {id} ({size} members){summary}"));
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegraph_core::{CommunitySummary, Graph};

    fn scored(key: &str, score: f64) -> Node {
        let mut n = Node::new(key, key, "person");
        n.pagerank_score = Some(score);
        n
    }

    #[test]
    fn pagerank_lists_highest_scores_first() {
        let result = AnalysisResult::new(
            AnalysisKind::PageRank,
            Graph::new(vec![scored("low", 0.1), scored("high", 0.7), scored("mid", 0.2)], vec![]),
        );
        let text = describe_analysis(&result);
        assert!(text.starts_with("PageRank over 3 nodes"));
        let high = text.find("high").unwrap();
        let mid = text.find("mid").unwrap();
        assert!(high < mid);
    }

    #[test]
    fn communities_use_summary_map() {
        let mut result = AnalysisResult::new(AnalysisKind::Communities, Graph::default());
        result.communities.insert(
            "1".into(),
            CommunitySummary {
                size: 4,
                summary: Some("shell companies".into()),
            },
        );
        result.communities.insert(
            "2".into(),
            CommunitySummary {
                size: 9,
                summary: None,
            },
        );
        let text = describe_analysis(&result);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "2 communities across 0 nodes");
        assert_eq!(lines[1], "community 2 (9 members)");
        assert_eq!(lines[2], "community 1 (4 members): shell companies");
    }
}
