use anyhow::Result;
use casegraph_client::app::App;
use casegraph_client::graph::{Notice, SelectModifiers, SelectionSource};
use casegraph_client::net::UdsBackend;
use casegraph_client::util::config::{self, QueryMode};
use casegraph_client::util::ids::{detail_headline, node_label_long, node_label_short};
use casegraph_core::{AnalysisKind, DateRange, NodeKey};
use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

const WAIT: Duration = Duration::from_secs(30);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    socket: Option<String>,
    from: Option<String>,
    to: Option<String>,
    query: Option<String>,
    analysis: Option<AnalysisKind>,
    keys: Vec<NodeKey>,
    save_config: bool,
}

fn parse_analysis(input: &str) -> Result<AnalysisKind> {
    match input {
        "pagerank" => Ok(AnalysisKind::PageRank),
        "communities" => Ok(AnalysisKind::Communities),
        "betweenness" => Ok(AnalysisKind::Betweenness),
        "paths" => Ok(AnalysisKind::ShortestPaths),
        _ => anyhow::bail!(
            "invalid analysis: {input} (expected pagerank|communities|betweenness|paths)"
        ),
    }
}

fn parse_args_from<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let flag = arg.to_string_lossy().into_owned();
        let mut value = || -> Result<String> {
            let Some(v) = args.next() else {
                anyhow::bail!("{flag} expects a value");
            };
            Ok(v.to_string_lossy().into_owned())
        };
        match flag.as_str() {
            "--socket" => out.socket = Some(value()?),
            "--from" => out.from = Some(value()?),
            "--to" => out.to = Some(value()?),
            "--query" => out.query = Some(value()?),
            "--analysis" => out.analysis = Some(parse_analysis(&value()?)?),
            "--key" => out.keys.push(NodeKey(value()?)),
            "--save-config" => out.save_config = true,
            _ => anyhow::bail!("unknown argument: {:?}", arg),
        }
    }
    Ok(out)
}

fn drain_notices(app: &mut App) {
    for notice in app.session.take_notices() {
        match notice {
            Notice::Info(msg) => println!("note: {msg}"),
            Notice::Error(msg) => eprintln!("error: {msg}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = parse_args_from(std::env::args_os().skip(1))?;

    let mut cfg = config::load_or_default();
    if let Some(socket) = args.socket.clone() {
        cfg.socket_path = socket;
    }
    if args.from.is_some() || args.to.is_some() {
        cfg.date_range = DateRange::new(args.from.as_deref(), args.to.as_deref());
    }
    if args.save_config {
        config::save(&cfg)?;
        tracing::info!("saved client config");
    }
    let range = cfg.date_range.clone();

    let backend = Arc::new(UdsBackend::new(cfg.socket_path.clone()));
    let mut app = App::new(cfg, backend, Handle::current());

    app.load_graph(range);
    app.wait_idle(WAIT).await;
    drain_notices(&mut app);

    if let Some(query) = &args.query {
        app.session.set_query_input(query);
        if app.session.query().mode == QueryMode::Search {
            app.session.execute_search();
        }
    }
    let model = app.session.model();
    let shown = app.session.displayed_graph();
    let range = model.range().cloned().unwrap_or_default();
    println!(
        "graph {}..{}: {} nodes, {} links ({} nodes, {} links shown, {} mappable)",
        range.start.as_deref().unwrap_or(""),
        range.end.as_deref().unwrap_or(""),
        model.node_count(),
        model.link_count(),
        shown.nodes.len(),
        shown.links.len(),
        app.session.displayed_map_points().len()
    );

    for key in &args.keys {
        if !app
            .session
            .select_key(key, SelectionSource::Graph, SelectModifiers::MULTI)
        {
            eprintln!("error: unknown node {key}");
        }
    }

    if let Some(kind) = args.analysis {
        if app.analyze_selection(kind) {
            app.wait_idle(WAIT).await;
        }
    } else {
        app.wait_idle(WAIT).await;
    }
    drain_notices(&mut app);

    if !app.session.selection().is_empty() {
        println!("\nselected:");
        for n in app.session.selection() {
            println!("  {}", node_label_short(n));
            for line in node_label_long(n) {
                println!("    {line}");
            }
        }
    }

    if let Some(narrative) = app.session.narrative() {
        println!("\n{narrative}");
    }
    let sub = app.session.subgraph_render_source();
    if !sub.nodes.is_empty() {
        println!("\nsubgraph: {} nodes, {} links", sub.nodes.len(), sub.links.len());
        for n in &sub.nodes {
            println!("  {} [{}]", node_label_short(n), n.node_type);
        }
    }

    let events = app.session.visible_events();
    if !events.is_empty() {
        println!("\ntimeline:");
        for ev in events {
            let time = ev.time.as_deref().unwrap_or("");
            println!("  {} {time} {} ({})", ev.date, ev.name, ev.event_type);
        }
    }

    if !app.session.details().is_empty() {
        println!("\ndetails:");
        for d in app.session.details() {
            println!("  {}", detail_headline(d));
        }
    }

    let points = app.session.selected_map_points();
    if !points.is_empty() {
        println!("\nmap:");
        for p in points {
            println!("  {} {:.5},{:.5}", p.name, p.latitude, p.longitude);
        }
    }
    Ok(())
}
