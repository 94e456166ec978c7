use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "showcase",
    version,
    about = "student project gallery with shared view counters",
    long_about = "Showcase renders a project dataset as a spotlight, a filterable gallery and a staff-pick curation table, counting views in a shared key-value store.\n\nExamples:\n  showcase feature\n  showcase gallery --search market --type Poster\n  showcase gallery -i --store firebase --database-url https://demo-default-rtdb.firebaseio.com\n  showcase curate --toggle p3,p7 --save\n\nTip: Use --config to persist store settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.showcase/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'd',
        long = "ds",
        visible_alias = "dataset",
        value_name = "PATH|URL",
        global = true,
        help_heading = "Input",
        help = "Project dataset, a JSON file or an http(s) URL."
    )]
    pub dataset: Option<String>,

    #[arg(
        long = "mr",
        visible_alias = "media-root",
        value_name = "DIR",
        global = true,
        help_heading = "Input",
        help = "Directory project media files are served from."
    )]
    pub media_root: Option<String>,

    #[arg(
        short = 's',
        long = "st",
        visible_alias = "store",
        value_name = "BACKEND",
        global = true,
        help_heading = "Counters",
        help = "Counter store backend (memory, file or firebase)."
    )]
    pub store: Option<String>,

    #[arg(
        long = "db",
        visible_alias = "database-url",
        value_name = "URL",
        global = true,
        help_heading = "Counters",
        help = "Realtime-database base URL for the firebase backend."
    )]
    pub database_url: Option<String>,

    #[arg(
        long = "auth",
        value_name = "TOKEN",
        global = true,
        help_heading = "Counters",
        help = "Database secret or ID token appended as ?auth=."
    )]
    pub auth: Option<String>,

    #[arg(
        long = "ns",
        visible_alias = "namespace",
        value_name = "NAME",
        global = true,
        help_heading = "Counters",
        help = "Key namespace counters live under (default: views)."
    )]
    pub namespace: Option<String>,

    #[arg(
        long = "fsp",
        visible_alias = "file-store",
        value_name = "FILE",
        global = true,
        help_heading = "Counters",
        help = "JSON file used by the file backend."
    )]
    pub file_store_path: Option<String>,

    #[arg(
        long = "atomic",
        num_args = 0..=1,
        default_missing_value = "true",
        global = true,
        help_heading = "Counters",
        help = "Use the store's server-side increment when available."
    )]
    pub atomic: Option<bool>,

    #[arg(
        short = 'r',
        long = "rt",
        visible_alias = "rate",
        value_name = "RPS",
        global = true,
        help_heading = "HTTP",
        help = "Request rate limit against the database (0 = unlimited)."
    )]
    pub rate: Option<String>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Proxy for dataset and database requests."
    )]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show site stats and a random featured project.
    #[command(visible_alias = "home")]
    Feature(FeatureArgs),
    /// Browse, search and filter all projects.
    Gallery(GalleryArgs),
    /// Toggle staff picks and export the edited dataset.
    Curate(CurateArgs),
    /// Write a commented default config file if none exists.
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FeatureArgs {
    #[arg(
        short = 'a',
        long = "another",
        value_name = "N",
        default_value_t = 0,
        help = "Show N more random projects after the first."
    )]
    pub another: usize,

    #[arg(
        short = 'i',
        long = "interactive",
        help = "Read commands from stdin (another, quit)."
    )]
    pub interactive: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GalleryArgs {
    #[arg(
        short = 'q',
        long = "search",
        value_name = "TEXT",
        help_heading = "Filters",
        help = "Case-insensitive match on first name, last name or title."
    )]
    pub search: Option<String>,

    #[arg(
        short = 't',
        long = "type",
        value_name = "TYPE",
        help_heading = "Filters",
        help = "Exact project type."
    )]
    pub project_type: Option<String>,

    #[arg(
        short = 'c',
        long = "category",
        value_name = "CATEGORY",
        help_heading = "Filters",
        help = "Exact category."
    )]
    pub category: Option<String>,

    #[arg(
        short = 'y',
        long = "year",
        value_name = "YEAR",
        help_heading = "Filters",
        help = "Exact year."
    )]
    pub year: Option<String>,

    #[arg(
        long = "sp",
        visible_alias = "staff-pick",
        value_name = "yes",
        help_heading = "Filters",
        help = "Only staff picks when set to 'yes'."
    )]
    pub staff_pick: Option<String>,

    #[arg(
        long = "open",
        value_name = "IDS",
        action = ArgAction::Append,
        help = "Open project details (comma-separated or repeatable); each counts a view."
    )]
    pub open: Vec<String>,

    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Listing format for --output (text or json)."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the filtered listing to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'i',
        long = "interactive",
        help = "Read commands from stdin (search, type, category, year, staff-pick, clear, open, close, quit)."
    )]
    pub interactive: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CurateArgs {
    #[arg(
        short = 't',
        long = "toggle",
        value_name = "IDS",
        action = ArgAction::Append,
        help = "Flip the staff-pick flag (comma-separated or repeatable)."
    )]
    pub toggle: Vec<String>,

    #[arg(long = "save", help = "Export the edited dataset after toggling.")]
    pub save: bool,

    #[arg(
        short = 'e',
        long = "ed",
        visible_alias = "export-dir",
        value_name = "DIR",
        help = "Directory the exported projects.json is written to."
    )]
    pub export_dir: Option<String>,

    #[arg(
        short = 'i',
        long = "interactive",
        help = "Read commands from stdin (toggle, save, quit)."
    )]
    pub interactive: bool,
}
