use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use cresliant::config::{EditorConfig, load_config, load_config_from};
use cresliant::{EditorSession, HeadlessFrontend, ModuleKind, SettingValue};

#[derive(Parser, Debug)]
#[command(name = "cresliant-cli", version)]
struct Cli {
    /// Editor config file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project that passes an image straight to the output.
    New(NewArgs),
    /// Print the nodes, links and active path of a project.
    Info(InfoArgs),
    /// Render a project and export the result.
    Render(RenderArgs),
    /// Append a node to the end of a project's chain.
    Add(AddArgs),
}

#[derive(Parser, Debug)]
struct NewArgs {
    /// Source image.
    #[arg(long)]
    image: PathBuf,

    /// Project file to write.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    project: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    project: PathBuf,

    /// Output image. PNG when no extension is given.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct AddArgs {
    project: PathBuf,

    /// Module kind, e.g. `Resize`.
    #[arg(long)]
    kind: String,

    /// Setting to apply, as `key=value`. May be repeated.
    #[arg(long = "set", value_parser = parse_setting)]
    settings: Vec<(String, SettingValue)>,
}

type Session = EditorSession<HeadlessFrontend>;

fn parse_setting(s: &str) -> Result<(String, SettingValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.trim().to_string(), value.parse()?))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    };

    match cli.cmd {
        Command::New(args) => cmd_new(config, args),
        Command::Info(args) => cmd_info(config, args),
        Command::Render(args) => cmd_render(config, args),
        Command::Add(args) => cmd_add(config, args),
    }
}

fn open(config: EditorConfig, path: &Path) -> anyhow::Result<Session> {
    let mut session = EditorSession::new(config.clone(), HeadlessFrontend::new(config));
    let report = session
        .open_project(path)
        .with_context(|| format!("open project '{}'", path.display()))?;
    for e in &report.recovered {
        eprintln!("warning: {}", e);
    }
    Ok(session)
}

fn cmd_new(config: EditorConfig, args: NewArgs) -> anyhow::Result<()> {
    // Stored absolute so the project can be opened from anywhere
    let image = args
        .image
        .canonicalize()
        .with_context(|| format!("locate image '{}'", args.image.display()))?;
    let mut session = EditorSession::new(config.clone(), HeadlessFrontend::new(config));
    session
        .load_source_image(&image)
        .with_context(|| format!("load image '{}'", image.display()))?;

    let graph = session.graph();
    let source = graph
        .node(graph.input_id())
        .and_then(|node| node.output_port)
        .context("input node has no output port")?;
    let target = graph
        .node(graph.output_id())
        .and_then(|node| node.input_port)
        .context("output node has no input port")?;
    session.connect(source, target)?;

    let written = session.save_project(Some(args.out.as_path()))?;
    println!("{}", written.display());
    Ok(())
}

fn cmd_info(config: EditorConfig, args: InfoArgs) -> anyhow::Result<()> {
    let session = open(config, &args.project)?;
    let graph = session.graph();

    println!("nodes:");
    for node in graph.nodes() {
        let settings: Vec<String> = node
            .settings
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        println!(
            "  {:<14} {:<10} [{}, {}] {}",
            node.alias,
            node.kind,
            node.position.x,
            node.position.y,
            settings.join(" ")
        );
    }

    println!("links:");
    for ends in graph.links().filter_map(|link| graph.link_ends(link)) {
        println!("  {}", ends);
    }

    let path = session.active_path();
    let aliases: Vec<&str> = path
        .nodes()
        .iter()
        .filter_map(|id| graph.alias_of(*id))
        .collect();
    println!("active path: {}", aliases.join(" -> "));
    println!("complete: {}", path.is_complete());
    if let Some(image) = graph.output_image() {
        println!("output: {}x{}", image.width(), image.height());
    }
    Ok(())
}

fn cmd_render(config: EditorConfig, args: RenderArgs) -> anyhow::Result<()> {
    let mut session = open(config, &args.project)?;
    if !session.active_path().is_complete() {
        anyhow::bail!("the active path does not reach the output node");
    }
    let written = session
        .export_output(&args.out)
        .with_context(|| format!("export to '{}'", args.out.display()))?;
    println!("{}", written.display());
    Ok(())
}

fn cmd_add(config: EditorConfig, args: AddArgs) -> anyhow::Result<()> {
    let kind = ModuleKind::from_name(&args.kind)?;
    let mut session = open(config, &args.project)?;

    // The new node goes after the last node that is not Output
    let output = session.graph().output_id();
    let predecessor = session
        .active_path()
        .nodes()
        .iter()
        .rev()
        .copied()
        .find(|id| *id != output)
        .context("project has no input node")?;

    let id = session.add_node(kind)?;
    for (key, value) in &args.settings {
        session
            .set_setting(id, key, *value)
            .with_context(|| format!("set {}", key))?;
    }

    let graph = session.graph();
    let ports = |node| graph.node(node).map(|n| (n.input_port, n.output_port));
    let (_, Some(pred_out)) = ports(predecessor).context("predecessor vanished")? else {
        anyhow::bail!("predecessor has no output port");
    };
    let (Some(new_in), Some(new_out)) = ports(id).context("new node vanished")? else {
        anyhow::bail!("{} cannot be placed in a chain", kind);
    };
    let (Some(out_in), _) = ports(output).context("output node vanished")? else {
        anyhow::bail!("output node has no input port");
    };

    session.connect(pred_out, new_in)?;
    session.connect(new_out, out_in)?;

    let written = session.save_project(None)?;
    println!("{}", written.display());
    Ok(())
}
