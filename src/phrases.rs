//! Phrase file loading
//!
//! Plain UTF-8 text, one phrase per line. Each phrase becomes one wave.

use std::fs;
use std::path::Path;

/// Split `text` into phrases, one per non-blank line, with runs of
/// whitespace collapsed to single spaces.
pub fn parse_phrases(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|phrase| !phrase.is_empty())
        .collect()
}

/// Read the phrase file. An unreadable file yields no phrases.
pub fn load_phrases(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let phrases = parse_phrases(&text);
            if phrases.is_empty() {
                log::warn!("Phrase file {} has no phrases", path.display());
            } else {
                log::info!("Loaded {} phrases from {}", phrases.len(), path.display());
            }
            phrases
        }
        Err(err) => {
            log::warn!("Could not read phrase file {}: {err}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_and_normalises() {
        let text = "go home\n\n   \n  the   quick\tfox  \r\nlast";
        assert_eq!(parse_phrases(text), vec!["go home", "the quick fox", "last"]);
    }

    #[test]
    fn test_parse_keeps_symbols() {
        assert_eq!(parse_phrases("don't stop, believe!"), vec!["don't stop, believe!"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let path = std::env::temp_dir().join("battle-keys-no-such-phrases.txt");
        assert!(load_phrases(&path).is_empty());
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!("battle-keys-phrases-{}.txt", std::process::id()));
        fs::write(&path, "alpha beta\ngamma\n").unwrap();
        let phrases = load_phrases(&path);
        fs::remove_file(&path).ok();
        assert_eq!(phrases, vec!["alpha beta", "gamma"]);
    }
}
