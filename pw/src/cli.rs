//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::session::ParticipantInfo;

/// Planwizard - conversational planning wizard
#[derive(Parser)]
#[command(
    name = "pw",
    about = "Extract structured plans from planning conversations and preview agent markup",
    version,
    after_help = "Logs are written to: ~/.local/share/planwizard/logs/planwizard.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// List rule sets, or show one in detail
    Rules {
        /// Rule set to show
        name: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the opening message and offline greeting for a new session
    Start {
        #[command(flatten)]
        participant: ParticipantArgs,

        /// Rule set (domain) to plan with
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Extract a plan from a transcript
    Extract {
        /// Transcript file (JSON array, JSON lines or YAML list)
        transcript: PathBuf,

        /// Rule set (domain) to extract with
        #[arg(short, long)]
        domain: Option<String>,

        /// Participant name used in record templates
        #[arg(long)]
        name: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Render agent markup (reads stdin when no file or "-" is given)
    Render {
        /// Markup file
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Replay a transcript and write the session export file
    Export {
        /// Transcript file (JSON array, JSON lines or YAML list)
        transcript: PathBuf,

        #[command(flatten)]
        participant: ParticipantArgs,

        /// Rule set (domain) to extract with
        #[arg(short, long)]
        domain: Option<String>,

        /// Output directory (defaults to the configured export dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Infer the participant profile and next question from a transcript
    Profile {
        /// Transcript file (JSON array, JSON lines or YAML list)
        transcript: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Participant details
#[derive(clap::Args, Debug, Clone)]
pub struct ParticipantArgs {
    /// Participant name
    #[arg(long)]
    pub name: String,

    /// Participant role
    #[arg(long)]
    pub role: String,

    /// Participant department
    #[arg(long)]
    pub department: String,

    /// Participant email
    #[arg(long)]
    pub email: Option<String>,
}

impl From<ParticipantArgs> for ParticipantInfo {
    fn from(args: ParticipantArgs) -> Self {
        let info = ParticipantInfo::new(args.name, args.role, args.department);
        match args.email {
            Some(email) => info.with_email(email),
            None => info,
        }
    }
}

/// Output format for commands that print data
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["pw"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_extract() {
        let cli = Cli::parse_from(["pw", "extract", "chat.json", "-d", "stakeholder", "-f", "json"]);
        if let Some(Command::Extract {
            transcript,
            domain,
            name,
            format,
        }) = cli.command
        {
            assert_eq!(transcript, PathBuf::from("chat.json"));
            assert_eq!(domain.as_deref(), Some("stakeholder"));
            assert!(name.is_none());
            assert_eq!(format, OutputFormat::Json);
        } else {
            panic!("Expected Extract command");
        }
    }

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from([
            "pw",
            "export",
            "chat.json",
            "--name",
            "Jordan Lee",
            "--role",
            "Teacher",
            "--department",
            "Nursing",
            "-o",
            "/tmp/out",
        ]);
        match cli.command {
            Some(Command::Export {
                participant, output, ..
            }) => {
                assert_eq!(participant.name, "Jordan Lee");
                assert!(participant.email.is_none());
                assert_eq!(output, Some(PathBuf::from("/tmp/out")));
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_cli_export_requires_participant() {
        assert!(Cli::try_parse_from(["pw", "export", "chat.json", "--name", "Jordan"]).is_err());
    }

    #[test]
    fn test_cli_parse_render_stdin() {
        let cli = Cli::parse_from(["pw", "render"]);
        assert!(matches!(cli.command, Some(Command::Render { file: None, .. })));
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["pw", "-c", "/path/to/config.yml", "rules"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
    }
}
