//! Planwizard - conversational planning wizard
//!
//! CLI entry point for extracting plans, rendering agent markup and writing
//! session exports.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;

use planextract::{Plan, RuleCatalog, SessionContext, extract, infer_profile, next_question_id};
use planwizard::cli::{Cli, Command, OutputFormat, ParticipantArgs};
use planwizard::config::Config;
use planwizard::session::{ParticipantInfo, PlanningSession, select_rules};
use planwizard::transcript::load_transcript;
use planwizard::view::{document_view, plan_view, profile_view};

/// Send tracing output to `planwizard.log` under the local data dir so it never mixes with command output
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planwizard")
        .join("logs");
    fs::create_dir_all(&log_dir).with_context(|| format!("Cannot create planwizard log dir {}", log_dir.display()))?;

    let log_path = log_dir.join("planwizard.log");
    let log_file =
        fs::File::create(&log_path).with_context(|| format!("Cannot create planwizard log {}", log_path.display()))?;
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!(path = %log_path.display(), %level, "planwizard logging to file");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_ref())?;
    info!(
        "planwizard loaded config: default-domain={}, rule paths={}",
        config.session.default_domain,
        config.rules.paths.len()
    );

    match cli.command {
        Some(Command::Rules { name, format }) => cmd_rules(&config, name.as_deref(), format),
        Some(Command::Start { participant, domain }) => cmd_start(&config, participant, domain.as_deref()),
        Some(Command::Extract {
            transcript,
            domain,
            name,
            format,
        }) => cmd_extract(&config, &transcript, domain.as_deref(), name.as_deref(), format),
        Some(Command::Render { file, format }) => cmd_render(file.as_deref(), format),
        Some(Command::Export {
            transcript,
            participant,
            domain,
            output,
        }) => cmd_export(&config, &transcript, participant, domain.as_deref(), output),
        Some(Command::Profile { transcript, format }) => cmd_profile(&transcript, format),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// List rule sets or show one
fn cmd_rules(config: &Config, name: Option<&str>, format: OutputFormat) -> Result<()> {
    let catalog = RuleCatalog::load(&config.rules)?;

    if let Some(name) = name {
        let rules = select_rules(&catalog, name)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rules.definition())?),
            OutputFormat::Text => {
                println!("{} - {}", rules.name().bold(), rules.title());
                if !rules.description().is_empty() {
                    println!("  {}", rules.description());
                }
                for category in rules.categories() {
                    println!();
                    println!("  {}", category.cyan().bold());
                    for rule in rules.rules().iter().filter(|r| &r.category == category) {
                        let fallback = if rule.fallback { " (fallback)" } else { "" };
                        println!("    {}{}: {}", rule.id, fallback.dimmed(), rule.triggers.join(", "));
                    }
                }
            }
        }
        return Ok(());
    }

    if catalog.is_empty() {
        println!("No rule sets found.");
        println!("Rule set paths searched:");
        for path in &config.rules.paths {
            println!("  - {}", path);
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let names: Vec<&str> = catalog.names().collect();
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
        OutputFormat::Text => {
            println!("Available rule sets:");
            println!();
            for rules in catalog.iter() {
                println!("  {}", rules.name());
                println!("    {}", rules.title());
                println!("    Categories: {}", rules.categories().join(", "));
                println!("    Rules: {}", rules.rules().len());
                println!();
            }
        }
    }
    Ok(())
}

/// Show how a new session opens
fn cmd_start(config: &Config, participant: ParticipantArgs, domain: Option<&str>) -> Result<()> {
    let catalog = RuleCatalog::load(&config.rules)?;
    let rules = select_rules(&catalog, domain.unwrap_or(&config.session.default_domain))?;
    let session = PlanningSession::new(ParticipantInfo::from(participant), rules.clone())?;

    println!("{} {}", "Session:".dimmed(), session.id());
    println!("{} {}", "User:".dimmed(), session.participant().user_id());
    println!("{} {}", "You:".bold(), session.opening_message());
    println!("{} {}", format!("{}:", agent_name(session.rules())).bold(), session.offline_greeting());
    Ok(())
}

fn agent_name(rules: &planextract::RuleSet) -> &str {
    match rules.agent().name.as_str() {
        "" => "Agent",
        name => name,
    }
}

/// Extract a plan from a transcript
fn cmd_extract(
    config: &Config,
    transcript: &Path,
    domain: Option<&str>,
    name: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let catalog = RuleCatalog::load(&config.rules)?;
    let rules = select_rules(&catalog, domain.unwrap_or(&config.session.default_domain))?;
    let turns = load_transcript(transcript)?;

    let context = name.map(SessionContext::for_user).unwrap_or_default();
    let plan: Plan = extract(&turns, rules, &context, &rules.empty_plan());
    info!(rule_set = %rules.name(), record_count = plan.len(), "Extracted plan");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print!("{}", plan_view(&plan, rules)),
    }
    Ok(())
}

/// Render markup from a file or stdin
fn cmd_render(file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let markup = match file {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))?
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };

    let doc = markrender::render_str(&markup);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
        OutputFormat::Text => println!("{}", document_view(&doc)),
    }
    Ok(())
}

/// Replay a transcript and write the export file
fn cmd_export(
    config: &Config,
    transcript: &Path,
    participant: ParticipantArgs,
    domain: Option<&str>,
    output: Option<PathBuf>,
) -> Result<()> {
    let catalog = RuleCatalog::load(&config.rules)?;
    let rules = select_rules(&catalog, domain.unwrap_or(&config.session.default_domain))?;
    let turns = load_transcript(transcript)?;

    let mut session = PlanningSession::new(ParticipantInfo::from(participant), rules.clone())?;
    session.replay(turns);
    let export = session.export()?;

    let dir = output.unwrap_or_else(|| config.export.expanded_dir());
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create export directory: {}", dir.display()))?;
    let path = dir.join(export.file_name());

    let json = if config.export.pretty {
        serde_json::to_string_pretty(&export)?
    } else {
        serde_json::to_string(&export)?
    };
    fs::write(&path, json).with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!(path = %path.display(), record_count = export.plan.len(), "Wrote session export");
    println!("{} {}", "Exported:".green(), path.display());
    Ok(())
}

/// Show the inferred participant profile
fn cmd_profile(transcript: &Path, format: OutputFormat) -> Result<()> {
    let turns = load_transcript(transcript)?;
    let profile = infer_profile(&turns);
    let next = next_question_id(&turns);

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "profile": profile,
                "next_question_id": next,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => print!("{}", profile_view(&profile, next)),
    }
    Ok(())
}
