use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::BufReader;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::args::{CliArgs, Command};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::counter::{IncrementMode, ViewCounter};
use crate::dataset::{DatasetLoader, DatasetSource, DatasetState, MediaPaths};
use crate::filter::{FilterCriteria, StaffPickGate};
use crate::output::{self, render, OutputFormat};
use crate::store::{
    CounterStore, FileStore, FirebaseStore, MemoryStore, StoreBackend, DEFAULT_NAMESPACE,
};
use crate::surface::events::COMMAND_HELP;
use crate::surface::{
    drive, Chain, CurationSurface, GallerySurface, LineEvents, ScriptedEvents, Surface, UiEvent,
    ViewerSurface,
};

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn format_opt_value<'a>(v: Option<&'a str>, default: &'a str) -> &'a str {
    match v {
        Some(s) if !s.trim().is_empty() => s,
        _ => default,
    }
}

/// Help for the top-level command or the subcommand named in `argv`.
fn render_custom_help(argv: &[String]) -> String {
    let root = CliArgs::command();
    let sub = argv
        .iter()
        .skip(1)
        .find_map(|a| root.find_subcommand(a.as_str()).cloned());
    let is_root = sub.is_none();
    let cmd = sub.unwrap_or_else(|| root.clone());
    let mut out = String::new();

    out.push_str(root.get_name());
    if !is_root {
        out.push(' ');
        out.push_str(cmd.get_name());
    }
    if let Some(version) = root.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }
    if is_root {
        if let Some(long_about) = cmd.get_long_about() {
            out.push('\n');
            out.push_str(&long_about.to_string());
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(root.get_name());
    if is_root {
        out.push_str(" [OPTIONS] <COMMAND>\n\n");
        out.push_str("Commands:\n");
        for sub in root.get_subcommands() {
            out.push_str(&format!("  {:<12}", sub.get_name()));
            if let Some(about) = sub.get_about() {
                out.push_str(&about.to_string());
            }
            out.push('\n');
        }
        out.push('\n');
    } else {
        out.push(' ');
        out.push_str(cmd.get_name());
        out.push_str(" [OPTIONS]\n\n");
    }

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();
    let globals: Vec<&clap::Arg> = if is_root {
        Vec::new()
    } else {
        root.get_arguments().collect()
    };

    for arg in cmd.get_arguments().chain(globals) {
        if arg.is_hide_set() {
            continue;
        }
        let heading = arg.get_help_heading().unwrap_or("Options").to_string();
        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };
        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();
            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }
            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }
            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = parts.join(", ");
            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                let min_values = arg.get_num_args().map(|r| r.min_values()).unwrap_or(1);
                if min_values == 0 {
                    flags.push_str(&format!(" [<{value_name}>]"));
                } else {
                    flags.push_str(&format!(" <{value_name}>"));
                }
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');
            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }
            out.push('\n');
        }
    }

    out
}

#[derive(Debug)]
enum SurfaceRun {
    Feature {
        another: usize,
        interactive: bool,
    },
    Gallery {
        criteria: FilterCriteria,
        open: Vec<String>,
        format: OutputFormat,
        output: Option<String>,
        interactive: bool,
    },
    Curate {
        toggle: Vec<String>,
        save: bool,
        export_dir: PathBuf,
        interactive: bool,
    },
}

#[derive(Debug)]
struct RunConfig {
    verbose: u8,
    no_color: bool,
    dataset: DatasetSource,
    store: StoreBackend,
    database_url: Option<String>,
    auth: Option<String>,
    namespace: String,
    file_store_path: PathBuf,
    timeout: u64,
    rate: u32,
    proxy: Option<String>,
    increment_mode: IncrementMode,
    paths: MediaPaths,
    surface: SurfaceRun,
}

fn split_ids(values: &[String]) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    for raw in values {
        for id in crate::utils::parse_id_csv(raw)? {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }
    Ok(out)
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let dataset_raw = args
        .dataset
        .or(cfg.dataset)
        .unwrap_or_else(|| format!("./{}", crate::dataset::DATASET_FILE_NAME));
    let dataset = DatasetSource::parse(&dataset_raw);

    let store_raw = args
        .store
        .or(cfg.store)
        .unwrap_or_else(|| "file".to_string());
    let store = StoreBackend::parse(&store_raw)
        .ok_or_else(|| format!("invalid store '{store_raw}', expected memory, file or firebase"))?;

    let database_url = args
        .database_url
        .or(cfg.database_url)
        .filter(|u| !u.trim().is_empty());
    if store == StoreBackend::Firebase && database_url.is_none() {
        return Err("the firebase store needs --database-url (or database_url in config)".to_string());
    }
    let auth = args.auth.or(cfg.auth);
    let namespace = args
        .namespace
        .or(cfg.namespace)
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    let file_store_path = config::expand_tilde(
        &args
            .file_store_path
            .or(cfg.file_store_path)
            .unwrap_or_else(|| "./views.json".to_string()),
    );

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    let rate = match args.rate.as_deref() {
        Some(raw) => crate::utils::parse_rate(raw)?,
        None => cfg.rate.unwrap_or(0),
    };
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let increment_mode = if args.atomic.or(cfg.atomic).unwrap_or(false) {
        IncrementMode::Atomic
    } else {
        IncrementMode::ReadModifyWrite
    };

    let defaults = MediaPaths::default();
    let paths = MediaPaths {
        media_root: args
            .media_root
            .or(cfg.media_root)
            .unwrap_or(defaults.media_root),
        pdf_placeholder: cfg.pdf_placeholder.unwrap_or(defaults.pdf_placeholder),
        fallback_placeholder: cfg
            .fallback_placeholder
            .unwrap_or(defaults.fallback_placeholder),
    };

    let surface = match args.command {
        Command::Feature(f) => SurfaceRun::Feature {
            another: f.another,
            interactive: f.interactive,
        },
        Command::Gallery(g) => {
            let mut criteria = FilterCriteria {
                search: g.search.unwrap_or_default(),
                project_type: g.project_type.unwrap_or_default(),
                category: g.category.unwrap_or_default(),
                year: g.year.unwrap_or_default(),
                staff_pick: StaffPickGate::Any,
            };
            if let Some(raw) = g.staff_pick.as_deref() {
                criteria.staff_pick = StaffPickGate::parse(raw)
                    .ok_or_else(|| format!("invalid --staff-pick '{raw}', expected 'yes'"))?;
            }
            let format_raw = g.format.or(cfg.output_format);
            let format = match format_raw.as_deref() {
                Some(raw) => OutputFormat::parse(raw)
                    .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
                None => g
                    .output
                    .as_deref()
                    .and_then(output::infer_format_from_path)
                    .unwrap_or(OutputFormat::Text),
            };
            SurfaceRun::Gallery {
                criteria,
                open: split_ids(&g.open)?,
                format,
                output: g.output,
                interactive: g.interactive,
            }
        }
        Command::Curate(c) => SurfaceRun::Curate {
            toggle: split_ids(&c.toggle)?,
            save: c.save,
            export_dir: config::expand_tilde(
                &c.export_dir
                    .or(cfg.export_dir)
                    .unwrap_or_else(|| "./exports".to_string()),
            ),
            interactive: c.interactive,
        },
        Command::InitConfig => return Err("init-config does not run a surface".to_string()),
    };

    Ok(RunConfig {
        verbose: args.verbose,
        no_color,
        dataset,
        store,
        database_url,
        auth,
        namespace,
        file_store_path,
        timeout,
        rate,
        proxy,
        increment_mode,
        paths,
        surface,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("showcase={level}")));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_store(run: &RunConfig, client: reqwest::Client) -> Result<Arc<dyn CounterStore>, String> {
    let store: Arc<dyn CounterStore> = match run.store {
        StoreBackend::Memory if run.increment_mode == IncrementMode::Atomic => {
            Arc::new(MemoryStore::with_atomic_add())
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::new(run.file_store_path.clone())),
        StoreBackend::Firebase => {
            let url = run
                .database_url
                .as_deref()
                .ok_or_else(|| "missing database URL".to_string())?;
            Arc::new(FirebaseStore::new(url, run.auth.clone(), client).with_rate_limit(run.rate))
        }
    };
    Ok(store)
}

fn print_summary(run: &RunConfig) {
    format_kv_line("Dataset", &run.dataset.describe());
    let store = match run.store {
        StoreBackend::File => format!("file ({})", run.file_store_path.display()),
        StoreBackend::Firebase => format!(
            "firebase ({})",
            format_opt_value(run.database_url.as_deref(), "-")
        ),
        StoreBackend::Memory => run.store.label().to_string(),
    };
    format_kv_line("Store", &store);
    format_kv_line("Namespace", &run.namespace);
    format_kv_line("Increment", run.increment_mode.label());
    format_kv_line("Proxy", format_opt_value(run.proxy.as_deref(), "-"));
    if run.store == StoreBackend::Firebase {
        let rate = if run.rate == 0 {
            "unlimited".to_string()
        } else {
            format!("{}/s", run.rate)
        };
        format_kv_line("Rate", &rate);
    }
    if let SurfaceRun::Curate { export_dir, .. } = &run.surface {
        format_kv_line("Export dir", &export_dir.display().to_string());
    }
    eprintln!();
}

/// Flag-built events run first; with `interactive` stdin commands follow them.
async fn run_surface<S: Surface>(surface: &mut S, mut scripted: ScriptedEvents, interactive: bool) {
    let emit = |block: String| println!("{block}\n");
    if interactive {
        eprintln!("{COMMAND_HELP}");
        let lines = LineEvents::new(BufReader::new(tokio::io::stdin()))
            .on_error(|e| eprintln!("{}", render::warning(&e)));
        let mut events = Chain::new(scripted, lines);
        drive(surface, &mut events, emit).await;
    } else {
        drive(surface, &mut scripted, emit).await;
    }
}

fn curation_progress() -> Result<ProgressBar, String> {
    let pb = ProgressBar::new(0);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template(":: Loading views: [{pos}/{len}] :: [{elapsed_precise}]")
            .map_err(|e| format!("failed to build progress bar style: {e}"))?
            .progress_chars(r#"#>-"#),
    );
    Ok(pb)
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    if run.verbose > 0 {
        print_summary(&run);
    }

    let client = crate::utils::build_http_client(run.timeout, run.proxy.as_deref())
        .map_err(|e| format!("failed to build HTTP client: {e}"))?;
    let loader = DatasetLoader::with_client(run.dataset.clone(), client.clone());
    let state = DatasetState::load(&loader).await;
    let load_failed = matches!(state, DatasetState::Failed(_));

    let store = build_store(&run, client)?;
    let counter = ViewCounter::new(store)
        .with_namespace(&run.namespace)
        .with_mode(run.increment_mode);

    match run.surface {
        SurfaceRun::Feature {
            another,
            interactive,
        } => {
            let mut surface = ViewerSurface::new(state, counter, run.paths);
            let scripted = ScriptedEvents::new(std::iter::repeat(UiEvent::ShowAnother).take(another));
            run_surface(&mut surface, scripted, interactive).await;
        }
        SurfaceRun::Gallery {
            criteria,
            open,
            format,
            output,
            interactive,
        } => {
            let mut surface =
                GallerySurface::new(state, counter, run.paths).with_criteria(criteria);
            let mut scripted = ScriptedEvents::default();
            for id in open {
                scripted.push(UiEvent::OpenProject(id));
            }
            run_surface(&mut surface, scripted, interactive).await;

            if let Some(path) = output {
                let body = output::render(format, &surface.records());
                tokio::fs::write(&path, body)
                    .await
                    .map_err(|e| format!("failed to write output '{path}': {e}"))?;
                println!("{}", render::notice(&format!("listing written to {path}")));
            } else if format == OutputFormat::Json {
                let body = output::render(format, &surface.records());
                println!("{}", String::from_utf8_lossy(&body));
            }
        }
        SurfaceRun::Curate {
            toggle,
            save,
            export_dir,
            interactive,
        } => {
            let origin = run.dataset.describe();
            let mut surface = CurationSurface::new(state, counter, run.paths, export_dir, origin)
                .with_progress(curation_progress()?);
            let mut scripted = ScriptedEvents::default();
            for id in toggle {
                scripted.push(UiEvent::ToggleStaffPick(id));
            }
            if save {
                scripted.push(UiEvent::SaveChanges);
            }
            run_surface(&mut surface, scripted, interactive).await;
        }
    }

    if load_failed {
        return Err(format!(
            "failed to load projects from {}",
            loader.source().describe()
        ));
    }
    Ok(())
}

fn init_config(args: &CliArgs) -> Result<(), String> {
    let path = match args.config.as_deref() {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "cannot locate home directory for the default config".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        println!("{}", render::notice(&format!("wrote {}", path.display())));
    } else {
        println!(
            "{}",
            render::warning(&format!("{} already exists, left untouched", path.display()))
        );
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let argv: Vec<String> = std::env::args().collect();
    let args = match CliArgs::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help(&argv));
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }

    if let Command::InitConfig = args.command {
        return init_config(&args);
    }

    let cfg = match args.config.as_deref() {
        Some(p) => config::load_config(&config::expand_tilde(p), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    fn run_for(argv: &[&str], cfg: ConfigFile) -> Result<RunConfig, String> {
        build_run_config(CliArgs::parse_from(argv), cfg)
    }

    #[test]
    fn defaults_without_config() {
        let run = run_for(&["showcase", "feature"], ConfigFile::default()).unwrap();
        assert_eq!(run.store, StoreBackend::File);
        assert_eq!(run.namespace, "views");
        assert_eq!(run.timeout, 10);
        assert_eq!(run.rate, 0);
        assert_eq!(run.increment_mode, IncrementMode::ReadModifyWrite);
        assert_eq!(run.dataset, DatasetSource::Path(PathBuf::from("./projects.json")));
    }

    #[test]
    fn cli_overrides_config_file() {
        let cfg = ConfigFile {
            store: Some("memory".to_string()),
            namespace: Some("cfg".to_string()),
            timeout: Some(30),
            atomic: Some(true),
            ..Default::default()
        };
        let run = run_for(&["showcase", "--namespace", "cli", "feature"], cfg).unwrap();
        assert_eq!(run.namespace, "cli");
        assert_eq!(run.store, StoreBackend::Memory);
        assert_eq!(run.timeout, 30);
        assert_eq!(run.increment_mode, IncrementMode::Atomic);

        let cfg = ConfigFile {
            atomic: Some(true),
            ..Default::default()
        };
        let run = run_for(&["showcase", "--atomic", "false", "feature"], cfg).unwrap();
        assert_eq!(run.increment_mode, IncrementMode::ReadModifyWrite);
    }

    #[test]
    fn firebase_requires_database_url() {
        let err = run_for(&["showcase", "-s", "firebase", "feature"], ConfigFile::default());
        assert!(err.is_err());
        let cfg = ConfigFile {
            database_url: Some("https://demo.firebaseio.com".to_string()),
            ..Default::default()
        };
        assert!(run_for(&["showcase", "-s", "firebase", "feature"], cfg).is_ok());
    }

    #[test]
    fn gallery_flags_become_criteria_and_format() {
        let run = run_for(
            &[
                "showcase", "gallery", "-q", "Market", "-t", "Poster", "--staff-pick", "yes",
                "--open", "a,b", "--open", "a", "-o", "out.json",
            ],
            ConfigFile::default(),
        )
        .unwrap();
        match run.surface {
            SurfaceRun::Gallery {
                criteria,
                open,
                format,
                ..
            } => {
                assert_eq!(criteria.search, "Market");
                assert_eq!(criteria.project_type, "Poster");
                assert_eq!(criteria.staff_pick, StaffPickGate::Yes);
                assert_eq!(open, vec!["a", "b"]);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected surface {other:?}"),
        }
    }

    #[test]
    fn curate_export_dir_precedence() {
        let cfg = ConfigFile {
            export_dir: Some("./from-cfg".to_string()),
            ..Default::default()
        };
        let run = run_for(&["showcase", "curate", "--toggle", "p1", "--save"], cfg).unwrap();
        match run.surface {
            SurfaceRun::Curate {
                toggle,
                save,
                export_dir,
                ..
            } => {
                assert_eq!(toggle, vec!["p1"]);
                assert!(save);
                assert_eq!(export_dir, PathBuf::from("./from-cfg"));
            }
            other => panic!("unexpected surface {other:?}"),
        }
    }

    #[test]
    fn help_lists_commands_and_subcommand_flags() {
        let root = render_custom_help(&["showcase".to_string(), "--help".to_string()]);
        assert!(root.contains("Commands:"));
        assert!(root.contains("gallery"));

        let gallery = render_custom_help(&[
            "showcase".to_string(),
            "gallery".to_string(),
            "--help".to_string(),
        ]);
        assert!(gallery.contains("--search"));
        assert!(gallery.contains("--store"));
    }
}
