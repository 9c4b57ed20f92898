//! Command handlers driven through the CLI definition.

use clap::Parser;
use daq_confgen::commands::{balance, generate};
use daq_confgen::{Cli, Commands};
use std::collections::BTreeSet;
use std::fs;
use thread_balancer::{AffinityError, ProcessInfo, ProcessTable, ThreadInfo};

fn parse(args: &[&str]) -> Commands {
    Cli::try_parse_from(std::iter::once("daq-confgen").chain(args.iter().copied()))
        .unwrap()
        .command
}

#[test]
fn test_fake_readout_writes_document() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/fake_readout.json");

    let Commands::FakeReadout(args) = parse(&[
        "fake-readout",
        "-n",
        "2",
        "-t",
        "1",
        "--enable-software-tpg",
        out.to_str().unwrap(),
    ]) else {
        panic!("expected fake-readout");
    };
    generate::run_fake_readout(args).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let ids: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["init", "conf", "start", "stop", "scrap"]);

    let modules = value[0]["data"]["modules"].as_array().unwrap();
    assert!(modules.iter().any(|m| m["inst"] == "tp_datahandler_0"));
}

#[test]
fn test_minidaq_with_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("plugins.yaml");
    fs::write(
        &schema,
        r#"
plugins:
  - name: FakeCardReader
    commands: [conf, start, stop, pause, resume, scrap]
  - name: DataLinkHandler
    commands: [conf, start, stop, pause, resume, scrap, record]
  - name: DataRecorder
    commands: [conf, start, stop, pause, resume, scrap]
  - name: TriggerDecisionEmulator
    commands: [conf, start, stop, pause, resume, scrap]
  - name: RequestGenerator
    commands: [conf, start, stop, pause, resume, scrap]
  - name: FragmentReceiver
    commands: [conf, start, stop, pause, resume, scrap]
  - name: DataWriter
    commands: [conf, start, stop, pause, resume, scrap]
"#,
    )
    .unwrap();
    let out = dir.path().join("minidaq.json");

    let Commands::Minidaq(args) = parse(&[
        "minidaq",
        "--schema",
        schema.to_str().unwrap(),
        "--record-duration",
        "3",
        "-c",
        "-4",
        out.to_str().unwrap(),
    ]) else {
        panic!("expected minidaq");
    };
    generate::run_minidaq(args).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let commands = value.as_array().unwrap();
    assert_eq!(commands.len(), 8);
    assert_eq!(commands[0]["entry_state"], "NONE");
    assert_eq!(commands[6]["id"], "record");
}

#[test]
fn test_missing_schema_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.yaml");
    let out = dir.path().join("out.json");

    let Commands::Minidaq(args) = parse(&[
        "minidaq",
        "--schema",
        missing.to_str().unwrap(),
        out.to_str().unwrap(),
    ]) else {
        panic!("expected minidaq");
    };
    let err = generate::run_minidaq(args).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load plugin schema"));
    assert!(!out.exists());
}

struct SingleThread;

impl ProcessTable for SingleThread {
    fn processes(&self) -> Vec<ProcessInfo> {
        vec![ProcessInfo {
            pid: 10,
            name: "daq_application".to_string(),
            cmdline: vec!["daq_application".into(), "--name".into(), "appA".into()],
            memory_bytes: 0,
        }]
    }

    fn threads(&self, _pid: u32) -> Vec<ThreadInfo> {
        vec![ThreadInfo {
            tid: 11,
            name: "threadX".to_string(),
        }]
    }

    fn affinity(&self, _tid: u32) -> Result<BTreeSet<usize>, AffinityError> {
        Ok(BTreeSet::from([0, 1, 2, 3]))
    }

    fn set_affinity(&self, _tid: u32, _cpus: &BTreeSet<usize>) -> Result<(), AffinityError> {
        Ok(())
    }
}

#[test]
fn test_balance_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let pins = dir.path().join("pins.json");
    fs::write(&pins, r#"{"appA": {"threadX": [0, 1]}}"#).unwrap();

    let Commands::Balance(args) = parse(&[
        "balance",
        "-p",
        "daq_app",
        "-f",
        pins.to_str().unwrap(),
        "--output-format",
        "json",
    ]) else {
        panic!("expected balance");
    };
    let rendered = balance::balance_with(&SingleThread, &args).unwrap().unwrap();

    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["threads"][0]["outcome"]["status"], "applied");
    assert_eq!(value["threads"][0]["app"], "appA");
}

#[test]
fn test_balance_unreadable_pin_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();

    let Commands::Balance(args) = parse(&[
        "balance",
        "-p",
        "daq_app",
        "-f",
        dir.path().join("missing.json").to_str().unwrap(),
    ]) else {
        panic!("expected balance");
    };
    assert!(balance::balance_with(&SingleThread, &args).unwrap().is_none());
}
