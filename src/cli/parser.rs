use crate::export::ExportFormat;
use clap::{Args, Parser, Subcommand};

/// Command-line interface definition for turnqr
#[derive(Parser)]
#[command(
    name = "turnqr",
    version = env!("CARGO_PKG_VERSION"),
    about = "QR time clock: clock-in/clock-out sessions, shift review and hour reports on SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Name recorded in the audit log for administrative changes
    #[arg(global = true, long = "actor")]
    pub actor: Option<String>,

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
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields to the configuration file")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/vim)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Editor to use (vim, nano, or custom path)")]
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

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "op", help = "Only rows of this operation (e.g. clock_in, session_edit)")]
        operation: Option<String>,
    },

    /// Manage the employee roster
    #[command(subcommand)]
    Employee(EmployeeCmd),

    /// Manage business locations and their QR tokens
    #[command(subcommand)]
    Location(LocationCmd),

    /// Show or change business settings
    #[command(subcommand)]
    Settings(SettingsCmd),

    /// Clock in, clock out or show the current shift
    #[command(subcommand)]
    Clock(ClockCmd),

    /// Show the shift history of an employee
    History {
        #[arg(long = "employee", help = "Employee id (default: employee_id from config)")]
        employee: Option<String>,

        #[arg(long = "limit", help = "Show only the most recent N sessions")]
        limit: Option<usize>,
    },

    /// Review and correct sessions (administrator)
    #[command(subcommand)]
    Session(SessionCmd),

    /// Who is working right now at a location
    Dashboard {
        #[arg(long = "location", help = "Location id (default: selected location)")]
        location: Option<i64>,
    },

    /// Export the hours report
    Export {
        #[arg(long = "format", value_enum, default_value = "pdf")]
        format: ExportFormat,

        /// Absolute output file path
        #[arg(long = "file")]
        file: String,

        /// Range: this-month, last-month, YYYY, YYYY-MM, YYYY-MM-DD or start:end
        #[arg(long = "range")]
        range: Option<String>,

        #[arg(long = "location", help = "Location id (default: selected location)")]
        location: Option<i64>,

        #[arg(long = "employee", help = "Report a single employee")]
        employee: Option<String>,

        #[arg(long = "force", help = "Overwrite an existing file without asking")]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum EmployeeCmd {
    /// Add an employee
    Add {
        id: String,
        #[arg(long = "name")]
        name: Option<String>,
        #[arg(long = "email")]
        email: Option<String>,
        /// head-chef, cook, waiter, shift-manager or other
        #[arg(long = "role", default_value = "other")]
        role: String,
    },
    /// List employees, optionally only those of one location
    List {
        #[arg(long = "location")]
        location: Option<i64>,
    },
    /// Change the role of an employee
    Role { id: String, role: String },
    /// Re-enable a deactivated employee
    Activate { id: String },
    /// Disable an employee without deleting the history
    Deactivate { id: String },
    /// Allow the employee to clock in at a location
    Assign { id: String, location: i64 },
    /// Remove a location assignment
    Unassign { id: String, location: i64 },
    /// Delete an employee without sessions
    Del {
        id: String,
        #[arg(long = "yes", help = "Do not ask for confirmation")]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum LocationCmd {
    /// Add a location (a QR token is generated unless --no-token)
    Add {
        name: String,
        #[arg(long = "no-token")]
        no_token: bool,
    },
    /// List locations
    List,
    /// Set, clear or regenerate the QR token of a location
    Token {
        id: i64,
        #[arg(long = "set", conflicts_with_all = ["clear", "regenerate"])]
        set: Option<String>,
        #[arg(long = "clear", conflicts_with = "regenerate")]
        clear: bool,
        #[arg(long = "regenerate")]
        regenerate: bool,
    },
    /// Print the URL to encode in the location QR
    Url { id: i64 },
}

#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    #[arg(long = "name", help = "Business name")]
    pub name: Option<String>,

    #[arg(long = "opening", help = "Opening time (HH:MM)")]
    pub opening: Option<String>,

    #[arg(long = "max-hours", help = "Hours after which an open shift counts as forgotten")]
    pub max_hours: Option<f64>,

    #[arg(long = "location", conflicts_with = "no_location", help = "Selected location id")]
    pub location: Option<i64>,

    #[arg(long = "no-location", help = "Clear the selected location")]
    pub no_location: bool,

    #[arg(long = "token", conflicts_with = "clear_token", help = "Business-wide QR token")]
    pub token: Option<String>,

    #[arg(long = "clear-token", help = "Remove the business-wide QR token")]
    pub clear_token: bool,
}

#[derive(Subcommand)]
pub enum SettingsCmd {
    /// Print the current settings and their version stamp
    Show,
    /// Change settings
    Set {
        #[command(flatten)]
        values: SettingsArgs,

        /// Version stamp shown by `settings show` (`never` before the first save)
        #[arg(long = "expect")]
        expect: Option<String>,
    },
    /// Replace the business-wide QR token with a fresh one
    RegenerateToken {
        #[arg(long = "expect")]
        expect: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ClockArgs {
    #[arg(long = "employee", help = "Employee id (default: employee_id from config)")]
    pub employee: Option<String>,

    #[arg(long = "email", help = "E-mail used when the employee record must be created")]
    pub email: Option<String>,

    #[arg(long = "token", conflicts_with = "url", help = "Raw token read from the QR")]
    pub token: Option<String>,

    #[arg(long = "url", help = "Full URL scanned from the QR")]
    pub url: Option<String>,

    #[arg(long = "location", help = "Location to clock at (default: the one the token belongs to)")]
    pub location: Option<i64>,
}

#[derive(Subcommand)]
pub enum ClockCmd {
    /// Start a shift
    In {
        #[command(flatten)]
        args: ClockArgs,
    },
    /// End the current shift
    Out {
        #[command(flatten)]
        args: ClockArgs,
    },
    /// Show the current shift
    Status {
        #[arg(long = "employee")]
        employee: Option<String>,

        #[arg(long = "forget-token", help = "Clear the QR token remembered on this terminal")]
        forget_token: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionCmd {
    /// List sessions in a range
    List {
        #[arg(long = "employee")]
        employee: Option<String>,
        #[arg(long = "location")]
        location: Option<i64>,
        /// Same grammar as `export --range`
        #[arg(long = "range")]
        range: Option<String>,
    },
    /// Record a closed session by hand
    Add {
        employee: String,
        /// Clock-in: RFC 3339, `YYYY-MM-DD HH:MM` or `HH:MM` (local)
        clock_in: String,
        clock_out: String,
        #[arg(long = "location")]
        location: Option<i64>,
        #[arg(long = "reason")]
        reason: Option<String>,
    },
    /// Correct the times of a session
    Edit {
        id: i64,
        #[arg(long = "in")]
        clock_in: Option<String>,
        #[arg(long = "out", conflicts_with = "reopen")]
        clock_out: Option<String>,
        #[arg(long = "reopen", help = "Clear the clock-out")]
        reopen: bool,
        #[arg(long = "reason")]
        reason: Option<String>,
    },
    /// Delete a session
    Del {
        id: i64,
        #[arg(long = "reason")]
        reason: Option<String>,
        #[arg(long = "yes", help = "Do not ask for confirmation")]
        yes: bool,
    },
}
