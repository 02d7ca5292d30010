use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, miette};
use serde_json::Value;
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::{fs, path::PathBuf};

use crate::config::{FieldArgs, FileConfig, Settings, log_filter};

#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "# Examples:\n\n\
    ## To nest flat rows exported from a database:\n\
    arbor tree rows.json\n\n\
    ## To list rows in hierarchical order with path indices:\n\
    arbor flatten -I csv rows.csv\n\n\
    ## To spread a weight field down the hierarchy:\n\
    arbor weighted --weight-field headcount rows.json\n\n\
    ## To flatten a nested tree back into rows:\n\
    arbor unnest tree.json")]
#[command(
    about = "arbor converts flat parent-linked records into trees, hierarchical lists and back.",
    long_about = None
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    output: OutputArgs,

    #[clap(flatten)]
    fields: FieldArgs,

    /// Read field settings from a TOML file
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Clone, Debug, Default, PartialEq, clap::ValueEnum)]
enum InputFormat {
    #[default]
    Json,
    /// Header row followed by one record per row; every cell is read as a string.
    Csv,
}

#[derive(Clone, Debug, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Clone, Debug, clap::Args, Default)]
struct InputArgs {
    /// Set input format
    #[arg(short = 'I', long, value_enum, default_value_t, global = true)]
    input_format: InputFormat,
}

#[derive(Clone, Debug, clap::Args, Default)]
struct OutputArgs {
    /// Set output format
    #[arg(short = 'F', long, value_enum, default_value_t, global = true)]
    output_format: OutputFormat,

    /// Output to the specified file
    #[clap(short = 'o', long = "output", value_name = "FILE", global = true)]
    output_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Nest flat records into a tree of children arrays
    Tree {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
    /// List flat records in hierarchical order with level and path indices
    Flatten {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Like flatten, and spread a weight field down the hierarchy as shares
    Weighted {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Flatten a nested tree into records with generated identifiers
    Unnest {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
}

impl Commands {
    fn file(&self) -> Option<&PathBuf> {
        match self {
            Commands::Tree { file }
            | Commands::Flatten { file }
            | Commands::Weighted { file }
            | Commands::Unnest { file } => file.as_ref(),
        }
    }
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        self.init_tracing();

        let file_config = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let settings = Settings::resolve(&self.fields, file_config);
        let output = self.execute(&settings, &self.read_input()?)?;

        self.print(output)
    }

    fn init_tracing(&self) {
        // A subscriber may already be installed when running inside tests.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(log_filter(self.verbose))
            .with_writer(io::stderr)
            .try_init();
    }

    fn execute(&self, settings: &Settings, content: &str) -> miette::Result<Vec<arbor::Record>> {
        let mut converter = settings.converter();

        match &self.command {
            Commands::Tree { .. } => {
                let records = self.parse_records(content)?;
                Ok(arbor::build_tree(&records, &settings.hierarchy_options(&converter)))
            }
            Commands::Flatten { .. } => {
                let records = self.parse_records(content)?;
                Ok(arbor::flatten_hierarchical(
                    &records,
                    &settings.hierarchy_options(&converter),
                ))
            }
            Commands::Weighted { .. } => {
                let weight_field = settings.weight_field.as_deref().ok_or_else(|| {
                    miette!("weighted requires --weight-field or `weight_field` in the config file")
                })?;
                let records = self.parse_records(content)?;
                Ok(arbor::flatten_weighted(
                    &records,
                    &settings.hierarchy_options(&converter),
                    &arbor::WeightOptions::new(weight_field),
                ))
            }
            Commands::Unnest { .. } => {
                if self.input.input_format == InputFormat::Csv {
                    return Err(miette!(
                        "The unnest command reads a nested JSON tree; CSV input is not supported"
                    ));
                }
                let tree = arbor::tree_from_json(content)?;
                let options = settings.unnest_options(&converter);
                Ok(converter.flatten_tree_to_array_with(&tree, &options))
            }
        }
    }

    fn parse_records(&self, content: &str) -> miette::Result<Vec<arbor::Record>> {
        let records = match self.input.input_format {
            InputFormat::Json => arbor::records_from_json(content)?,
            InputFormat::Csv => arbor::records_from_csv(content.as_bytes())?,
        };
        tracing::info!(records = records.len(), "Read input records");
        Ok(records)
    }

    fn read_input(&self) -> miette::Result<String> {
        if let Some(file) = self.command.file() {
            if !file.exists() {
                return Err(miette!("File not found: {}", file.display()));
            }
            return fs::read_to_string(file).into_diagnostic();
        }

        if io::stdin().is_terminal() {
            return Err(miette!("No input: pass a file or pipe records on stdin"));
        }

        let mut input = String::new();
        io::stdin().read_to_string(&mut input).into_diagnostic()?;
        Ok(input)
    }

    fn print(&self, records: Vec<arbor::Record>) -> miette::Result<()> {
        let stdout = io::stdout();
        let mut handle: Box<dyn Write> = if let Some(output_file) = &self.output.output_file {
            let file = fs::File::create(output_file).into_diagnostic()?;
            Box::new(BufWriter::new(file))
        } else {
            Box::new(BufWriter::new(stdout.lock()))
        };
        let output = Value::Array(records.into_iter().map(Value::Object).collect());

        match self.output.output_format {
            OutputFormat::Json => serde_json::to_writer(&mut handle, &output).into_diagnostic()?,
            OutputFormat::Pretty => {
                serde_json::to_writer_pretty(&mut handle, &output).into_diagnostic()?
            }
        }
        writeln!(handle).into_diagnostic()?;
        handle.flush().into_diagnostic()
    }
}
