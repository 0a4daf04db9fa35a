//! Command vocabulary
//!
//! Maps recognised utterances (voice keywords, or console lines standing in
//! for them) to narrator commands.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Command issued by the input layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Spotlight pass over what the viewer faces
    ReadText,
    /// Read every beacon
    ReadAllText,
    /// Read only beacons not heard before, after the capture grace period
    ReadNewText,
    Stop,
    Skip,
    Repeat,
    IncreaseSpeed,
    DecreaseSpeed,
    ClearBeacons,
    /// Hand text to the capture subsystem, then read what it placed
    CaptureText(String),
}

/// Phrase table for commands without arguments
pub static PHRASES: Lazy<HashMap<&'static str, Command>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Reading
    m.insert("read text", Command::ReadText);
    m.insert("read", Command::ReadText);
    m.insert("what's here", Command::ReadText);
    m.insert("read all text", Command::ReadAllText);
    m.insert("read all", Command::ReadAllText);
    m.insert("read new text", Command::ReadNewText);

    // Interrupts
    m.insert("stop", Command::Stop);
    m.insert("skip", Command::Skip);
    m.insert("next", Command::Skip);
    m.insert("repeat", Command::Repeat);
    m.insert("again", Command::Repeat);

    // Speed
    m.insert("faster", Command::IncreaseSpeed);
    m.insert("increase speed", Command::IncreaseSpeed);
    m.insert("slower", Command::DecreaseSpeed);
    m.insert("decrease speed", Command::DecreaseSpeed);

    // Beacons
    m.insert("clear", Command::ClearBeacons);
    m.insert("clear text", Command::ClearBeacons);

    m
});

/// Normalise an utterance: lower case, single spaces, no trailing punctuation
fn normalize(input: &str) -> String {
    input
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse an utterance into a command
///
/// `capture <text>` carries the captured text verbatim.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    if parts
        .next()
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("capture"))
    {
        let text = parts.next().unwrap_or("").trim();
        if text.is_empty() {
            return None;
        }
        return Some(Command::CaptureText(text.to_string()));
    }

    PHRASES.get(normalize(trimmed).as_str()).cloned()
}
