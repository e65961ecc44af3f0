//! Headless tools for SketchBoard scene files.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sketchboard_core::binding::{clear_bindings_to, resolve_connector};
use sketchboard_core::geometry::{EstimatedMetrics, group_bounds};
use sketchboard_core::{
    BoardConfig, ConfigError, Element, ElementId, ExportError, OrphanBindingPolicy, SceneFile,
};
use sketchboard_render::{RendererError, export_svg};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid scene: {0}")]
    Scene(#[from] ExportError),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("render failed: {0}")]
    Render(#[from] RendererError),
    #[error("{0} connector binding(s) need attention; rerun with --fix")]
    StaleBindings(usize),
}

#[derive(Parser, Debug)]
#[command(name = "sketchboard", about = "Inspect and export SketchBoard scenes")]
struct Cli {
    /// Board config JSON (grid size, orphan binding policy, ...).
    #[arg(long, global = true, env = "SKETCHBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print element counts and content bounds.
    Info { input: PathBuf },
    /// Render a scene to SVG.
    ExportSvg {
        input: PathBuf,
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Report connectors whose endpoints have drifted from their targets
    /// or whose targets no longer exist.
    Check {
        input: PathBuf,
        /// Rewrite the file with bindings resolved.
        #[arg(long)]
        fix: bool,
    },
}

/// Binding problems found in a scene.
#[derive(Debug, Default, PartialEq)]
struct BindingReport {
    /// Connectors whose bound endpoint is off its anchor.
    drifted: Vec<ElementId>,
    /// (connector, missing target) pairs.
    orphaned: Vec<(ElementId, ElementId)>,
}

impl BindingReport {
    fn issues(&self) -> usize {
        self.drifted.len() + self.orphaned.len()
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// Execute a command and return what it prints.
fn run(cli: Cli) -> Result<String, CliError> {
    let config = match &cli.config {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    };
    log::debug!("config: {config:?}");

    match cli.command {
        Command::Info { input } => {
            let scene = read_scene(&input)?;
            Ok(summarize(&scene))
        }
        Command::ExportSvg { input, output } => {
            let scene = read_scene(&input)?;
            let svg = export_svg(&scene.elements)?;
            match output {
                Some(path) => {
                    write_file(&path, &svg)?;
                    log::info!("wrote {}", path.display());
                    Ok(format!("wrote {}\n", path.display()))
                }
                None => Ok(svg),
            }
        }
        Command::Check { input, fix } => {
            let mut scene = read_scene(&input)?;
            let report = check_bindings(&scene.elements);
            if report.issues() == 0 {
                return Ok("bindings ok\n".to_string());
            }
            if !fix {
                return Err(CliError::StaleBindings(report.issues()));
            }
            fix_bindings(&mut scene.elements, &report, config.orphan_policy);
            write_file(&input, &scene.to_json()?)?;
            Ok(format!(
                "fixed {} drifted, {} orphaned\n",
                report.drifted.len(),
                report.orphaned.len()
            ))
        }
    }
}

fn read_scene(path: &Path) -> Result<SceneFile, CliError> {
    let json = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SceneFile::from_json(&json)?)
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn summarize(scene: &SceneFile) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for element in &scene.elements {
        *counts.entry(element.type_name()).or_default() += 1;
    }

    let mut out = format!(
        "{} v{} from {}: {} elements\n",
        scene.kind,
        scene.version,
        if scene.source.is_empty() { "unknown" } else { scene.source.as_str() },
        scene.elements.len()
    );
    for (kind, count) in &counts {
        out.push_str(&format!("  {kind}: {count}\n"));
    }
    let ids = scene.elements.iter().map(|e| &e.id);
    if let Some(bounds) = group_bounds(ids, &scene.elements, &EstimatedMetrics) {
        out.push_str(&format!(
            "bounds: ({:.1}, {:.1}) {:.1} x {:.1}\n",
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height()
        ));
    }
    out
}

fn check_bindings(elements: &[Element]) -> BindingReport {
    let ids: HashSet<ElementId> = elements.iter().map(|e| e.id).collect();
    let mut report = BindingReport::default();
    for element in elements {
        let Some(shape) = element.as_connector() else {
            continue;
        };
        for binding in [shape.start_binding, shape.end_binding].into_iter().flatten() {
            if !ids.contains(&binding.element_id) {
                report.orphaned.push((element.id, binding.element_id));
            }
        }
        let mut resolved = element.clone();
        if resolve_connector(&mut resolved, elements) {
            report.drifted.push(element.id);
        }
    }
    report
}

fn fix_bindings(elements: &mut [Element], report: &BindingReport, policy: OrphanBindingPolicy) {
    for id in &report.drifted {
        let Some(index) = elements.iter().position(|e| e.id == *id) else {
            continue;
        };
        let mut connector = elements[index].clone();
        resolve_connector(&mut connector, elements);
        elements[index] = connector;
    }
    if policy == OrphanBindingPolicy::Clear {
        for (_, target) in &report.orphaned {
            clear_bindings_to(*target, elements);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use sketchboard_core::elements::{
        Anchor, Binding, BoxShape, ConnectorShape, ElementKind, ElementStyle,
    };
    use sketchboard_core::ToolOptions;
    use tempfile::TempDir;

    fn rect(x: f64, y: f64) -> Element {
        Element::new(
            ElementKind::Rectangle(BoxShape {
                width: 100.0,
                height: 100.0,
                label: None,
            }),
            Point::new(x, y),
            ElementStyle::default(),
        )
    }

    fn connector(start: Option<Binding>, end: Option<Binding>, points: Vec<Point>) -> Element {
        Element::new(
            ElementKind::Connector(ConnectorShape {
                points,
                start_binding: start,
                end_binding: end,
                ..Default::default()
            }),
            Point::ZERO,
            ElementStyle::default(),
        )
    }

    fn write_scene(dir: &TempDir, elements: Vec<Element>) -> PathBuf {
        let path = dir.path().join("scene.json");
        let scene = SceneFile::new(elements, &ToolOptions::default());
        fs::write(&path, scene.to_json().unwrap()).unwrap();
        path
    }

    fn cli(command: Command) -> Cli {
        Cli {
            config: None,
            command,
        }
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["sketchboard", "export-svg", "in.json", "-o", "out.svg"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::ExportSvg { output: Some(_), .. }
        ));
        let cli = Cli::try_parse_from(["sketchboard", "check", "in.json", "--fix"]).unwrap();
        assert!(matches!(cli.command, Command::Check { fix: true, .. }));
    }

    #[test]
    fn test_info_summary() {
        let dir = TempDir::new().unwrap();
        let path = write_scene(&dir, vec![rect(0.0, 0.0), rect(200.0, 0.0)]);
        let out = run(cli(Command::Info { input: path })).unwrap();
        assert!(out.contains("2 elements"));
        assert!(out.contains("rectangle: 2"));
        assert!(out.contains("300.0 x 100.0"));
    }

    #[test]
    fn test_export_svg_to_file() {
        let dir = TempDir::new().unwrap();
        let input = write_scene(&dir, vec![rect(0.0, 0.0)]);
        let output = dir.path().join("scene.svg");
        run(cli(Command::ExportSvg {
            input,
            output: Some(output.clone()),
        }))
        .unwrap();
        let svg = fs::read_to_string(output).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn test_export_empty_scene_fails() {
        let dir = TempDir::new().unwrap();
        let input = write_scene(&dir, Vec::new());
        let result = run(cli(Command::ExportSvg {
            input,
            output: None,
        }));
        assert!(matches!(result, Err(CliError::Render(RendererError::EmptyScene))));
    }

    #[test]
    fn test_missing_file() {
        let result = run(cli(Command::Info {
            input: PathBuf::from("/nonexistent/scene.json"),
        }));
        assert!(matches!(result, Err(CliError::Io { .. })));
    }

    #[test]
    fn test_check_and_fix_drift() {
        let target = rect(0.0, 0.0);
        let binding = Binding {
            element_id: target.id,
            anchor: Anchor::Right,
        };
        // Right anchor is (100, 50); the stored endpoint is off by 30.
        let link = connector(
            Some(binding),
            None,
            vec![Point::new(130.0, 50.0), Point::new(300.0, 50.0)],
        );
        let link_id = link.id;
        let dir = TempDir::new().unwrap();
        let input = write_scene(&dir, vec![target, link]);

        let result = run(cli(Command::Check {
            input: input.clone(),
            fix: false,
        }));
        assert!(matches!(result, Err(CliError::StaleBindings(1))));

        run(cli(Command::Check {
            input: input.clone(),
            fix: true,
        }))
        .unwrap();
        let scene = read_scene(&input).unwrap();
        let fixed = scene.elements.iter().find(|e| e.id == link_id).unwrap();
        assert_eq!(fixed.absolute_points()[0], Point::new(100.0, 50.0));

        let out = run(cli(Command::Check { input, fix: false })).unwrap();
        assert_eq!(out, "bindings ok\n");
    }

    #[test]
    fn test_orphans_follow_policy() {
        let missing = Binding {
            element_id: ElementId::new_v4(),
            anchor: Anchor::Top,
        };
        let mut elements = vec![connector(
            None,
            Some(missing),
            vec![Point::ZERO, Point::new(50.0, 0.0)],
        )];
        let report = check_bindings(&elements);
        assert_eq!(report.orphaned.len(), 1);
        assert!(report.drifted.is_empty());

        fix_bindings(&mut elements, &report, OrphanBindingPolicy::KeepStale);
        assert!(elements[0].as_connector().unwrap().end_binding.is_some());

        fix_bindings(&mut elements, &report, OrphanBindingPolicy::Clear);
        assert!(elements[0].as_connector().unwrap().end_binding.is_none());
    }
}
