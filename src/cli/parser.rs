//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// Include shadow-rs generated build information
use shadow_rs::shadow;
shadow!(build);

/// An email automation server with trigger-driven drip campaigns
#[derive(Parser, Debug)]
#[command(name = "automail-rs")]
#[command(about = "An email automation server with trigger-driven drip campaigns")]
#[command(long_about = "
Automail-rs runs trigger-driven email automations: users are enrolled into
automations by signup, purchase, or inactivity triggers, and each automation
schedules a sequence of emails with per-step delays. A processing pass picks
up due events and hands them to the configured delivery provider.

EXAMPLES:
    # Start the server with default configuration
    automail-rs serve

    # Start server on custom host and port
    automail-rs serve --host 0.0.0.0 --port 8080

    # Use custom configuration file
    automail-rs --config /path/to/config.toml serve

    # Check configuration without starting server
    automail-rs serve --dry-run

    # Run database migrations
    automail-rs migrate

    # Preview pending migrations
    automail-rs migrate --dry-run

    # Run a single delivery pass without the server
    automail-rs process

    # Mint an admin API token for an operator
    automail-rs token ops@example.com

For more information about configuration options, see the documentation.
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Specify a custom configuration file to use instead of the default.
    /// The file should be in TOML format and contain valid configuration sections.
    /// The file must exist and be readable.
    ///
    /// Example: --config /etc/automail-rs/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Force the application to use a specific environment configuration.
    /// This affects which configuration files are loaded and default settings.
    ///
    /// Available values: development (dev), production (prod), test
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Increases log output to debug level, showing detailed information
    /// about application operations. Useful for troubleshooting.
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Reduces log output to error level only, hiding informational messages.
    /// Useful for production deployments or automated scripts.
    /// Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Launches the HTTP server with the configured settings. The server will
    /// bind to the specified host and port, load the database connection pool,
    /// and begin accepting requests.
    ///
    /// Examples:
    ///   automail-rs serve                           # Start with defaults
    ///   automail-rs serve --host 0.0.0.0 --port 80 # Bind to all interfaces on port 80
    ///   automail-rs serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// The network interface address where the server will listen for connections.
        /// Use 127.0.0.1 for localhost only, or 0.0.0.0 to accept connections from any interface.
        /// Must be a valid IPv4 address, hostname, or 'localhost'.
        ///
        /// Default: 127.0.0.1
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        ///
        /// The TCP port where the server will accept HTTP connections.
        /// Must be between 1 and 65535. Ports below 1024 typically require root privileges.
        ///
        /// Default: 8080
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Set the logging verbosity for this server instance.
        /// This overrides both configuration file settings and global --verbose/--quiet flags.
        ///
        /// Available levels: error, warn, info, debug, trace
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        ///
        /// Performs a complete configuration validation check without starting the server.
        /// Useful for testing configuration changes or deployment validation.
        /// Returns exit code 0 if valid, non-zero if invalid.
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    ///
    /// Manage database schema migrations. This command connects to the configured
    /// database and applies or rolls back schema changes.
    ///
    /// Examples:
    ///   automail-rs migrate                    # Apply all pending migrations
    ///   automail-rs migrate --dry-run          # Show pending migrations without applying
    ///   automail-rs migrate --rollback 3       # Rollback the last 3 migrations
    Migrate {
        /// Show pending migrations without applying
        ///
        /// Lists all migrations that would be applied without actually running them.
        /// Useful for reviewing changes before deployment.
        /// Cannot be used with --rollback.
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to rollback
        ///
        /// Reverts the specified number of most recent migrations.
        /// Use with caution as this can result in data loss.
        /// Must be between 1 and 100 for safety reasons.
        /// Cannot be used with --dry-run.
        ///
        /// Example: --rollback 2 (reverts last 2 migrations)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
    /// Run a single delivery pass and exit
    ///
    /// Claims all due pending events, delivers them through the configured
    /// provider, and prints a summary. Equivalent to one POST /api/automations/process
    /// call, useful from cron or for one-off catch-up runs.
    ///
    /// Examples:
    ///   automail-rs process                  # Deliver all due events
    ///   automail-rs process --requeue-stale  # Reset stuck events first
    Process {
        /// Requeue events stuck in the sending state before processing
        ///
        /// Events older than the configured stale threshold are moved back to
        /// pending so this pass can pick them up again.
        #[arg(long)]
        requeue_stale: bool,
    },
    /// Mint an admin API token
    ///
    /// Generates a signed JWT with the admin role for the given subject,
    /// using the configured secret. The token is printed to stdout.
    ///
    /// Examples:
    ///   automail-rs token ops@example.com
    ///   automail-rs token ops@example.com --expiration-hours 72
    Token {
        /// Subject to embed in the token (typically an operator email)
        #[arg(value_name = "SUBJECT")]
        subject: String,

        /// Token lifetime in hours
        ///
        /// Overrides the jwt.token_expiration setting for this token.
        /// Must be between 1 and 8760 (one year).
        #[arg(long, value_name = "HOURS", value_parser = super::validation::validate_expiration_hours)]
        expiration_hours: Option<i64>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "production", alias = "prod")]
    Production,
    #[value(name = "test")]
    Test,
}

/// Log level options
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Validate CLI arguments and provide detailed error messages
    ///
    /// This method performs additional validation beyond what clap provides,
    /// ensuring that all argument combinations are valid and providing
    /// specific error messages for validation failures.
    pub fn validate(&self) -> Result<(), String> {
        // Validate command-specific arguments
        if let Some(ref command) = self.command {
            match command {
                Commands::Serve {
                    host,
                    port,
                    log_level: _,
                    dry_run: _,
                } => {
                    if let (Some(host_addr), Some(port)) = (host, port) {
                        if host_addr == "0.0.0.0" && *port < 1024 {
                            return Err("Warning: Binding to 0.0.0.0 on a privileged port (< 1024) typically requires root privileges".to_string());
                        }
                    }
                }
                Commands::Migrate { dry_run, rollback } => {
                    if *dry_run && rollback.is_some() {
                        return Err("Cannot use --dry-run and --rollback together".to_string());
                    }
                }
                Commands::Process { .. } => {}
                Commands::Token { subject, .. } => {
                    if subject.trim().is_empty() {
                        return Err("Token subject cannot be empty".to_string());
                    }
                }
            }
        }

        // Validate global argument combinations
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }

    /// Get detailed help for validation errors
    pub fn get_validation_help() -> &'static str {
        r#"
Common validation errors and solutions:

Port validation:
  - Port must be between 1 and 65535
  - Ports below 1024 require root privileges on most systems
  - Example: --port 8080

Host validation:
  - Use 'localhost' or '127.0.0.1' for local access only
  - Use '0.0.0.0' to accept connections from any interface
  - IPv4 addresses must be in valid format (e.g., 192.168.1.100)
  - Example: --host 0.0.0.0

Configuration file validation:
  - File must exist and be readable
  - File must be in TOML format
  - Example: --config /path/to/config.toml

Migration rollback validation:
  - Steps must be between 1 and 100
  - Cannot be used with --dry-run
  - Example: --rollback 3

Token validation:
  - Subject must not be empty
  - Expiration must be between 1 and 8760 hours
  - Example: automail-rs token ops@example.com --expiration-hours 72

For more help, use: automail-rs help <subcommand>
"#
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Production => crate::config::Environment::Production,
            Environment::Test => crate::config::Environment::Test,
        }
    }
}
