//! Integration tests for loading the plugin schema from disk.

use daq_schema::{
    AddressedCmd, Command, CommandSequence, Init, ModSpec, ModulePattern, QueueInfo, QueueKind,
    QueueSpec, SchemaError, SchemaRegistry,
};
use std::io::Write;

fn write_schema(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_registry_from_file() {
    let file = write_schema(
        r#"
plugins:
  - name: FakeCardReader
    commands: [conf, start, stop, scrap]
  - name: DataLinkHandler
    commands: [conf, start, stop, scrap]
"#,
    );

    let registry = SchemaRegistry::from_file(file.path()).unwrap();
    assert!(registry.has_plugin("FakeCardReader"));
    assert!(!registry.has_plugin("DataWriter"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SchemaRegistry::from_file(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, SchemaError::IoError(_)));
}

#[test]
fn test_check_sequence_with_restricted_schema() {
    let file = write_schema(
        r#"
plugins:
  - name: FakeCardReader
    commands: [conf]
"#,
    );
    let registry = SchemaRegistry::from_file(file.path()).unwrap();

    let init = Init::new(
        vec![QueueSpec::new("wib_fake_link_0", QueueKind::FollySpsc, 100000)],
        vec![ModSpec::new(
            "fake_source",
            "FakeCardReader",
            vec![QueueInfo::output("output_0", "wib_fake_link_0")],
        )],
    );
    let sequence = CommandSequence::new(vec![
        Command::init(init),
        Command::modules(
            "conf",
            vec![AddressedCmd::empty(ModulePattern::exact("fake_source"))],
        ),
        Command::modules(
            "start",
            vec![AddressedCmd::empty(ModulePattern::exact("fake_source"))],
        ),
    ]);

    let err = registry.check_sequence(&sequence).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::UnsupportedCommand { ref command, .. } if command == "start"
    ));
}
