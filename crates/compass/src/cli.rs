use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::coord::Coordinate;
use crate::filter::CategoryFilter;

#[derive(Parser)]
#[command(name = "compass")]
#[command(author, version, about)]
#[command(long_about = "A campus map with points of interest, filters and directions.\n\n\
    Examples:\n  \
    compass                                Open the campus map\n  \
    compass --location 0.3480,32.5830      Open the map with a known position\n  \
    compass pois --category dining         List dining locations\n  \
    compass directions \"Main Library\"      Print directions to a location")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Open in a normal window instead of maximized
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Device position to use instead of asking the platform (LAT,LNG)
    #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true, global = false)]
    pub location: Option<Coordinate>,

    /// Start with voice guidance turned off
    #[arg(long, global = false)]
    pub no_voice: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List points of interest, optionally filtered
    Pois {
        /// Only names containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// Category to show: all, academic, dining, recreation, services, transportation
        /// or emergency
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,

        /// Only essential locations
        #[arg(long)]
        essential: bool,

        /// Only wheelchair-accessible locations
        #[arg(long)]
        accessible: bool,
    },

    /// Print directions to a point of interest
    Directions {
        /// Destination id or name
        destination: String,

        /// Start position (LAT,LNG); defaults to the device position or campus centre
        #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
        from: Option<Coordinate>,

        /// Read the directions aloud
        #[arg(long)]
        speak: bool,
    },

    /// Sign in (any non-empty username and password)
    Login {
        /// Username; prompted for when omitted
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Sign out
    Logout,

    /// Show who is signed in
    Whoami,

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. map.zoom, routing.profile, voice.enabled)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Pois {
                search,
                category,
                essential,
                accessible,
            }) => {
                crate::commands::pois::run(search.as_deref(), category, essential, accessible);
                Ok(())
            }
            Some(Commands::Directions {
                destination,
                from,
                speak,
            }) => crate::commands::directions::run(&destination, from, speak),
            Some(Commands::Login { username }) => crate::commands::session::login(username),
            Some(Commands::Logout) => crate::commands::session::logout(),
            Some(Commands::Whoami) => crate::commands::session::whoami(),
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("compass {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => crate::app::run(self.windowed, self.location, !self.no_voice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::Category;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pois_filters() {
        let cli = Cli::try_parse_from([
            "compass",
            "pois",
            "--category",
            "Dining",
            "--essential",
            "-s",
            "caf",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Pois {
                search,
                category,
                essential,
                accessible,
            }) => {
                assert_eq!(search.as_deref(), Some("caf"));
                assert_eq!(category, CategoryFilter::Only(Category::Dining));
                assert!(essential);
                assert!(!accessible);
            }
            _ => panic!("expected pois"),
        }
    }

    #[test]
    fn test_unknown_category_is_usage_error() {
        assert!(Cli::try_parse_from(["compass", "pois", "--category", "parking"]).is_err());
    }

    #[test]
    fn test_parse_viewer_flags() {
        let cli = Cli::try_parse_from([
            "compass",
            "--location",
            "0.348,32.583",
            "--no-voice",
            "-vv",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.location, Some(Coordinate::new(0.348, 32.583)));
        assert!(cli.no_voice);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_directions_from() {
        let cli = Cli::try_parse_from([
            "compass",
            "directions",
            "Main Library",
            "--from",
            "0.3470,32.5820",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Directions {
                destination, from, ..
            }) => {
                assert_eq!(destination, "Main Library");
                assert_eq!(from, Some(Coordinate::new(0.3470, 32.5820)));
            }
            _ => panic!("expected directions"),
        }
    }
}
