use std::{fs, path::Path};

use arbor::{Converter, ConverterOptions, HierarchyOptions, MetaFields, RootMarker, UnnestOptions};
use miette::{IntoDiagnostic, WrapErr};
use serde::Deserialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the log filter when `RUST_LOG` is unset.
pub const LOG_ENV: &str = "ARBOR_LOG";

/// Field settings given on the command line. Unset flags fall back to the config file.
#[derive(Clone, Debug, Default, clap::Args)]
pub struct FieldArgs {
    /// Field holding each record's identifier [default: id]
    #[arg(long, value_name = "NAME", global = true)]
    pub id_field: Option<String>,

    /// Field holding the parent identifier [default: parent_id]
    #[arg(long, value_name = "NAME", global = true)]
    pub parent_field: Option<String>,

    /// Field holding child nodes in a nested tree [default: children]
    #[arg(long, value_name = "NAME", global = true)]
    pub children_field: Option<String>,

    /// Field holding the numeric weight (required by `weighted`)
    #[arg(long, value_name = "NAME", global = true)]
    pub weight_field: Option<String>,

    /// Parent value marking top-level records, parsed as JSON or taken as a string
    #[arg(long, value_name = "JSON", global = true)]
    pub root: Option<String>,

    /// Start below this identifier instead of at the top-level records
    #[arg(long, value_name = "JSON", global = true)]
    pub start: Option<String>,

    /// Depth assigned to the first output level [default: 1]
    #[arg(long, value_name = "N", global = true)]
    pub depth: Option<usize>,
}

/// Settings read from a TOML file. Every key is optional.
///
/// ```toml
/// id_field = "dept_id"
/// parent_field = "parent_dept"
/// weight_field = "headcount"
/// root_marker = 0
///
/// [meta]
/// level = "depth"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub id_field: Option<String>,
    pub parent_field: Option<String>,
    pub children_field: Option<String>,
    pub weight_field: Option<String>,
    pub depth: Option<usize>,
    pub root_marker: Option<RootMarker>,
    pub meta: Option<MetaFields>,
}

impl FileConfig {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let content = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .wrap_err_with(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> miette::Result<Self> {
        toml::from_str(content).into_diagnostic()
    }
}

/// Effective settings after merging flags over the config file over the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub id_field: String,
    pub parent_field: String,
    pub weight_field: Option<String>,
    pub depth: usize,
    pub root_marker: RootMarker,
    pub start: Option<Value>,
    pub meta: MetaFields,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&FieldArgs::default(), FileConfig::default())
    }
}

impl Settings {
    pub fn resolve(args: &FieldArgs, file: FileConfig) -> Self {
        let mut meta = file.meta.unwrap_or_default();
        if let Some(children) = args.children_field.clone().or(file.children_field) {
            meta.children = children.into();
        }

        Self {
            id_field: args
                .id_field
                .clone()
                .or(file.id_field)
                .unwrap_or_else(|| "id".to_string()),
            parent_field: args
                .parent_field
                .clone()
                .or(file.parent_field)
                .unwrap_or_else(|| "parent_id".to_string()),
            weight_field: args.weight_field.clone().or(file.weight_field),
            depth: args.depth.or(file.depth).unwrap_or(1),
            root_marker: args
                .root
                .as_deref()
                .map(|root| RootMarker::new(parse_json_arg(root)))
                .or(file.root_marker)
                .unwrap_or_default(),
            start: args.start.as_deref().map(parse_json_arg),
            meta,
        }
    }

    pub fn converter(&self) -> Converter {
        Converter::new(ConverterOptions {
            id_field: self.id_field.as_str().into(),
            parent_field: self.parent_field.as_str().into(),
            root_marker: self.root_marker.clone(),
            meta: self.meta.clone(),
        })
    }

    pub fn hierarchy_options(&self, converter: &Converter) -> HierarchyOptions {
        let options = converter.hierarchy_options().with_depth(self.depth);
        match &self.start {
            Some(start) => options.with_start(start.clone()),
            None => options,
        }
    }

    pub fn unnest_options(&self, converter: &Converter) -> UnnestOptions {
        converter.unnest_options().with_depth(self.depth)
    }
}

/// `1` is the number one, `"1"` and `root` are strings, `null` is null.
pub fn parse_json_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn log_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbose)))
}
