//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// kthold - Kotlin lint driver with baseline support
#[derive(Parser)]
#[command(name = "kthold")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root used for baseline paths (defaults to the config file's
    /// directory, then the current directory)
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint files
    Lint {
        /// Kotlin files to lint
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        reporter: OutputFormat,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Lint files and fix what can be fixed
    Format {
        /// Kotlin files to format
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        reporter: OutputFormat,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// List every rule id that can be disabled
    Rules {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Record the current violations as accepted
    Baseline {
        /// Kotlin files to record
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Baseline file to write
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

/// Output format for lint and format results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Lint using the Android Kotlin style guide
    #[arg(long)]
    pub android: bool,

    /// Disable a rule (repeatable, or comma-separated)
    #[arg(long = "disable", value_name = "RULE", value_delimiter = ',')]
    pub disabled_rules: Vec<String>,

    /// Load rules from a plugin archive (repeatable)
    #[arg(long = "plugin", value_name = "PATH")]
    pub plugins: Vec<PathBuf>,

    /// Enable experimental rules
    #[arg(long)]
    pub experimental: bool,

    /// Baseline file with accepted violations
    #[arg(long, value_name = "PATH")]
    pub baseline: Option<PathBuf>,

    /// Explicit .editorconfig location
    #[arg(long, value_name = "PATH")]
    pub editorconfig: Option<PathBuf>,

    /// Engine command
    #[arg(long, value_name = "COMMAND")]
    pub engine: Option<String>,

    /// Argument passed to the engine command (repeatable)
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_disable_accepts_commas_and_repeats() {
        let cli = Cli::parse_from([
            "kthold",
            "lint",
            "Main.kt",
            "--disable",
            "indent,custom:bar",
            "--disable",
            "no-wildcard-imports",
        ]);

        let Commands::Lint { overrides, .. } = cli.command else {
            panic!("expected lint");
        };
        assert_eq!(
            overrides.disabled_rules,
            vec!["indent", "custom:bar", "no-wildcard-imports"]
        );
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "kthold",
            "rules",
            "--verbose",
            "--project-root",
            "/project",
        ]);

        assert!(cli.verbose);
        assert_eq!(cli.project_root, Some(PathBuf::from("/project")));
    }
}
