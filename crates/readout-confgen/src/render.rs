//! JSON rendering of command sequences.
//!
//! Documents are written with sorted keys and four-space indentation so
//! that regenerating with the same parameters gives byte-identical files.

use daq_schema::{Command, CommandData, CommandSequence};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

const BANNER_WIDTH: usize = 80;

/// Serialize `value` with sorted keys and four-space indentation.
pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    // Round-trip through Value: its maps are ordered by key
    let value = serde_json::to_value(value)?;

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;

    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render the full command sequence document.
pub fn render_document(sequence: &CommandSequence) -> serde_json::Result<String> {
    to_pretty_json(sequence)
}

fn title(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_block(command: &Command) -> serde_json::Result<String> {
    match (&command.data, command.id.as_str()) {
        (CommandData::Init(init), _) => to_pretty_json(init),
        (_, "conf") => to_pretty_json(command),
        _ => Ok(format!(
            "{}\n{}\n\n {}",
            "=".repeat(BANNER_WIDTH),
            title(&command.id),
            to_pretty_json(command)?
        )),
    }
}

/// Render one human-readable block per command.
///
/// The init block carries only the topology, `conf` is printed as is and
/// every later command is preceded by a banner with its title.
pub fn render_blocks(sequence: &CommandSequence) -> serde_json::Result<Vec<String>> {
    sequence.commands.iter().map(render_block).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_schema::{AddressedCmd, Init, ModulePattern, QueueKind, QueueSpec};
    use serde_json::json;

    #[test]
    fn test_keys_sorted_and_indented() {
        let rendered = to_pretty_json(&json!({"zeta": 1, "alpha": {"b": 2.0, "a": [1, 2]}})).unwrap();
        let expected = "{\n    \"alpha\": {\n        \"a\": [\n            1,\n            2\n        ],\n        \"b\": 2.0\n    },\n    \"zeta\": 1\n}";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_float_rendering() {
        assert_eq!(to_pretty_json(&50_000.0_f64).unwrap(), "50000.0");
        assert_eq!(to_pretty_json(&0.8_f64).unwrap(), "0.8");
    }

    #[test]
    fn test_blocks() {
        let init = Init::new(
            vec![QueueSpec::new("time_sync_q", QueueKind::FollyMpmc, 100)],
            vec![],
        );
        let sequence = CommandSequence::new(vec![
            Command::init(init),
            Command::modules("conf", vec![]),
            Command::modules("start", vec![AddressedCmd::empty(ModulePattern::exact("tde"))]),
        ]);

        let blocks = render_blocks(&sequence).unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].starts_with("{\n    \"modules\""));
        assert!(blocks[1].contains("\"id\": \"conf\""));
        assert!(blocks[2].starts_with(&format!("{}\nStart\n\n {{", "=".repeat(80))));
    }

    #[test]
    fn test_document_is_array() {
        let sequence = CommandSequence::new(vec![Command::modules("scrap", vec![])]);
        let rendered = render_document(&sequence).unwrap();
        assert!(rendered.starts_with('['));
        assert!(rendered.ends_with(']'));
    }
}
