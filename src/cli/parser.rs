use crate::export::ExportFormat;
use clap::{ArgGroup, Parser, Subcommand};

/// Command-line interface definition for rollcall
#[derive(Parser)]
#[command(
    name = "rollcall",
    version = env!("CARGO_PKG_VERSION"),
    about = "Attendance tracking for recurring services with QR code check-in",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Create, list, edit and expand services
    Service {
        #[command(subcommand)]
        action: ServiceCmd,
    },

    /// Seed and list members
    Member {
        #[command(subcommand)]
        action: MemberCmd,
    },

    /// Check a member in to a session
    Checkin {
        /// Member code (the content of their QR badge)
        identifier: String,

        #[arg(long, value_name = "SERVICE_ID", help = "Session or one-off service id")]
        service: i64,

        #[arg(
            long,
            value_name = "YYYY-MM-DD HH:MM",
            help = "Check-in time (default: now)"
        )]
        at: Option<String>,
    },

    /// Mark every expected member without a record as absent
    Close {
        service_id: i64,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Scan member codes from a keyboard-wedge scanner on stdin
    Scan {
        #[arg(long, value_name = "SERVICE_ID")]
        service: i64,
    },

    /// Show or export the attendance of a service
    Report {
        service_id: i64,

        #[arg(long, value_enum, requires = "file")]
        format: Option<ExportFormat>,

        #[arg(long, value_name = "FILE", requires = "format")]
        file: Option<String>,

        #[arg(long, short = 'f', help = "Overwrite the output file without asking")]
        force: bool,
    },

    /// Create a backup copy of the database
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long)]
        compress: bool,
    },
}

#[derive(Subcommand)]
pub enum ServiceCmd {
    /// Add a one-off service (--date) or a recurring template (--weekly / --monthly)
    #[command(group(
        ArgGroup::new("when")
            .required(true)
            .args(["date", "weekly", "monthly"])
    ))]
    Add {
        name: String,

        #[arg(long, value_name = "HH:MM")]
        start: String,

        #[arg(long, value_name = "HH:MM")]
        end: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", help = "Date of a one-off service")]
        date: Option<String>,

        #[arg(long, help = "Repeat every week")]
        weekly: bool,

        #[arg(long, help = "Repeat every month")]
        monthly: bool,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "First session of a recurring service (default: today)"
        )]
        anchor: Option<String>,
    },

    /// List services, or the sessions of one template
    List {
        #[arg(long, value_name = "TEMPLATE_ID")]
        sessions: Option<i64>,
    },

    /// Show one service
    Show { id: i64 },

    /// Change a service; template changes reach all of its sessions
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_name = "HH:MM")]
        start: Option<String>,

        #[arg(long, value_name = "HH:MM")]
        end: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a service (a template takes its sessions with it)
    Del {
        id: i64,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Create the sessions of a template for the coming months
    Expand {
        template_id: i64,

        #[arg(long, help = "Number of calendar months (default from config)")]
        months: Option<u32>,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Skip sessions before this date; the months count from here"
        )]
        from: Option<String>,
    },

    /// Add one session of a template on a specific date
    AddDate {
        template_id: i64,

        #[arg(value_name = "YYYY-MM-DD")]
        date: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long, value_name = "HH:MM")]
        start: Option<String>,

        #[arg(long, value_name = "HH:MM")]
        end: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MemberCmd {
    /// Register a member
    Add {
        code: String,

        #[arg(value_name = "FULL_NAME")]
        name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long, help = "Visitors are never marked absent")]
        visitor: bool,
    },

    /// List members
    List,
}
