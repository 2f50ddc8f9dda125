//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::listing::personnel::PersonnelSortKey;
use crate::listing::reports::ReportSortKey;
use crate::listing::vehicles::VehicleSortKey;
use crate::listing::SortDirection;
use crate::models::{ReportStatus, StatusDetail};
use crate::preferences::Theme;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reskrim - case register client for criminal investigation units
///
/// Browse reports, stolen vehicles and personnel, follow case progress on
/// the analytics dashboard and export the crime-data recap as a spreadsheet.
///
/// Examples:
///   reskrim login --email admin@polresta.id
///   reskrim dashboard
///   reskrim reports --status proses --search curanmor --sort date --direction asc
///   reskrim crime-data --start 2024-01-01 --end 2024-03-31 --export summary
///   reskrim update-status r-123 --status selesai --detail p21 --description "Berkas lengkap"
///   reskrim --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the hosted case store
    #[arg(long, global = true, value_name = "URL", env = "RESKRIM_URL")]
    pub url: Option<String>,

    /// Public API key of the case store
    #[arg(
        long,
        global = true,
        value_name = "KEY",
        env = "RESKRIM_ANON_KEY",
        hide_env_values = true
    )]
    pub anon_key: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .reskrim.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// File holding the theme and the current session
    #[arg(long, global = true, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Offset from UTC, in hours, used to assign reports to months
    ///
    /// Default: from config or 9 (WIT).
    #[arg(long, global = true, value_name = "HOURS", allow_hyphen_values = true)]
    pub utc_offset: Option<i32>,

    /// Output format (markdown, json)
    #[arg(long, global = true, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the rendered view to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .reskrim.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(long, env = "RESKRIM_EMAIL")]
        email: Option<String>,

        #[arg(long, env = "RESKRIM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the session
    Logout,

    /// Toggle the colour theme, or set it explicitly
    Theme {
        #[arg(value_enum)]
        theme: Option<Theme>,
    },

    /// Analytics dashboard for both report types
    Dashboard,

    /// The report list, or one report's detail with --id
    Reports {
        /// Show the detail of one report
        #[arg(long, value_name = "ID", conflicts_with_all = ["status", "search", "sort", "page"])]
        id: Option<String>,

        /// Only reports with this status (default: all except deleted)
        #[arg(long, value_enum)]
        status: Option<ReportStatus>,

        /// Search number, case type, reporter and location
        #[arg(short, long)]
        search: Option<String>,

        /// Column to sort by
        #[arg(long, value_enum)]
        sort: Option<ReportSortKey>,

        #[arg(long, value_enum, default_value = "desc", requires = "sort")]
        direction: SortDirection,

        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Category recap and three-month trend, optionally as a spreadsheet
    CrimeData {
        /// First day of the period (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,

        /// Last day of the period, inclusive (YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,

        /// Export a sheet instead of rendering the view
        #[arg(long, value_enum)]
        export: Option<ExportKind>,

        /// Directory for the exported spreadsheet
        #[arg(long, value_name = "DIR")]
        export_dir: Option<PathBuf>,
    },

    /// Stolen vehicles across all reports
    Vehicles {
        /// Search vehicle type, frame and engine numbers, and reporter
        #[arg(short, long)]
        search: Option<String>,

        /// Column to sort by
        #[arg(long, value_enum)]
        sort: Option<VehicleSortKey>,

        #[arg(long, value_enum, default_value = "desc", requires = "sort")]
        direction: SortDirection,

        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// The personnel roster
    Personnel {
        /// Only members of this unit
        #[arg(long, value_name = "UNIT_ID")]
        unit: Option<String>,

        /// Search name and rank
        #[arg(short, long)]
        search: Option<String>,

        /// Column to sort by
        #[arg(long, value_enum)]
        sort: Option<PersonnelSortKey>,

        #[arg(long, value_enum, default_value = "desc", requires = "sort")]
        direction: SortDirection,

        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Units and their member counts
    Units,

    /// File a new report from a TOML draft
    CreateReport {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Edit a report; keys absent from the draft keep their value
    EditReport {
        id: String,

        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Soft-delete a report
    DeleteReport { id: String },

    /// Record a status change in the report's history
    UpdateStatus {
        id: String,

        #[arg(long, value_enum)]
        status: ReportStatus,

        #[arg(long, value_enum)]
        detail: StatusDetail,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Assign a report to a unit
    AssignUnit {
        id: String,

        #[arg(long, value_name = "UNIT_ID")]
        unit: String,
    },

    /// Set the personnel handling a report
    AssignPersonnel {
        id: String,

        /// Personnel ids (comma-separated), all from the report's unit
        #[arg(long, value_delimiter = ',', required_unless_present = "clear")]
        personnel: Vec<String>,

        /// Remove every assigned personnel
        #[arg(long, conflicts_with = "personnel")]
        clear: bool,
    },

    CreateUnit { name: String },

    RenameUnit { id: String, name: String },

    DeleteUnit { id: String },

    CreatePersonnel {
        #[arg(long)]
        name: String,

        #[arg(long)]
        rank: String,

        #[arg(long, value_name = "UNIT_ID")]
        unit: String,
    },

    /// Edit a personnel record; omitted fields keep their value
    EditPersonnel {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        rank: Option<String>,

        #[arg(long, value_name = "UNIT_ID")]
        unit: Option<String>,
    },

    DeletePersonnel { id: String },

    /// Create a login account for a personnel record
    CreateOperator {
        #[arg(long, value_name = "PERSONNEL_ID")]
        personnel: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "RESKRIM_OPERATOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// Output format for rendered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Which crime-data sheet to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportKind {
    /// Category recap over the selected period
    Summary,
    /// Last three months per case type
    Trend,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(command) = &self.command else {
            return Err("No command given. Run with --help to see the commands".to_string());
        };

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Store URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(hours) = self.utc_offset {
            if !(-12..=14).contains(&hours) {
                return Err("UTC offset must be between -12 and 14 hours".to_string());
            }
        }

        match command {
            Command::Reports { page, .. }
            | Command::Vehicles { page, .. }
            | Command::Personnel { page, .. }
                if *page == 0 =>
            {
                return Err("Page numbers start at 1".to_string());
            }
            Command::CrimeData {
                start: Some(start),
                end: Some(end),
                ..
            } if start > end => {
                return Err(format!(
                    "Start date {} is after end date {}",
                    start, end
                ));
            }
            Command::CreateReport { file } | Command::EditReport { file, .. } if !file.is_file() => {
                return Err(format!("Draft file does not exist: {}", file.display()));
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
