//! Transcript loading
//!
//! A transcript file holds the turns of one conversation as a JSON array,
//! as JSON lines (one turn per line), or as a YAML list.

use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use planextract::Turn;
use tracing::debug;

/// Read and parse a transcript file
pub fn load_transcript(path: &Path) -> Result<Vec<Turn>> {
    debug!(?path, "load_transcript: called");
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read transcript: {}", path.display()))?;
    parse_transcript(&content).with_context(|| format!("Failed to parse transcript: {}", path.display()))
}

/// Parse transcript text, detecting the format from its first character
pub fn parse_transcript(content: &str) -> Result<Vec<Turn>> {
    let trimmed = content.trim_start();
    let turns = if trimmed.is_empty() {
        debug!("parse_transcript: empty");
        Vec::new()
    } else if trimmed.starts_with('[') {
        debug!("parse_transcript: json array");
        serde_json::from_str(trimmed).context("Invalid JSON transcript")?
    } else if trimmed.starts_with('{') {
        debug!("parse_transcript: json lines");
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| serde_json::from_str(line).with_context(|| format!("Invalid turn on line {}", n + 1)))
            .collect::<Result<Vec<Turn>>>()?
    } else {
        debug!("parse_transcript: yaml");
        serde_yaml::from_str(trimmed).context("Invalid YAML transcript")?
    };
    debug!(turn_count = turns.len(), "parse_transcript: complete");
    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use planextract::Speaker;
    use tempfile::TempDir;

    #[test]
    fn test_parse_json_array_with_original_field_names() {
        let turns = parse_transcript(r#"[{"sender": "ai", "message": "hi"}, {"speaker": "user", "text": "hello"}]"#).unwrap();
        assert_eq!(turns, vec![Turn::agent("hi"), Turn::user("hello")]);
    }

    #[test]
    fn test_parse_json_lines() {
        let content = "{\"speaker\":\"user\",\"text\":\"a\"}\n\n{\"speaker\":\"agent\",\"text\":\"b\"}\n";
        let turns = parse_transcript(content).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].speaker, Speaker::Agent);
    }

    #[test]
    fn test_parse_yaml() {
        let content = "- speaker: user\n  text: We need staff\n- speaker: assistant\n  text: Noted\n";
        let turns = parse_transcript(content).unwrap();
        assert_eq!(turns, vec![Turn::user("We need staff"), Turn::agent("Noted")]);
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert!(parse_transcript("  \n").unwrap().is_empty());
        assert!(parse_transcript("[{\"speaker\": \"robot\"}]").is_err());
        let err = parse_transcript("{\"speaker\":\"user\"}\n{oops").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_load_transcript_reports_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.json");
        let err = load_transcript(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }
}
