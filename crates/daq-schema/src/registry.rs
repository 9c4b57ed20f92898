//! Plugin schema handle.
//!
//! The registry names the plugins the consuming runtime can instantiate and
//! the lifecycle commands each of them accepts. Generators receive it
//! explicitly; it is either the built-in readout set or loaded from YAML:
//!
//! ```yaml
//! plugins:
//!   - name: FakeCardReader
//!     commands: [conf, start, stop, scrap]
//!   - name: DataLinkHandler
//!     commands: [conf, start, stop, record, scrap]
//! ```

use crate::command::{Command, CommandSequence};
use crate::init::{Init, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Error converting a payload to JSON
    #[error("Failed to serialize payload: {0}")]
    PayloadError(#[from] serde_json::Error),

    /// Plugin not present in the schema
    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    /// Module pattern is not a valid regular expression
    #[error("Invalid module pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A command is addressed to a module whose plugin does not accept it
    #[error("Plugin '{plugin}' of module '{module}' does not accept command '{command}'")]
    UnsupportedCommand {
        command: String,
        module: String,
        plugin: String,
    },

    /// An exact module address names no module
    #[error("Command '{command}' addresses unknown module '{module}'")]
    UnknownModule { command: String, module: String },

    /// Topology invariant violated
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// A plugin and the commands it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSchema {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<String>,
}

impl PluginSchema {
    pub fn new(name: &str, commands: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn accepts(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c == command)
    }
}

/// Loaded plugin schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaRegistry {
    pub plugins: Vec<PluginSchema>,

    /// Cached plugin lookup (not serialized)
    #[serde(skip)]
    plugin_map: BTreeMap<String, usize>,
}

const LIFECYCLE: &[&str] = &["conf", "start", "stop", "pause", "resume", "scrap"];

impl SchemaRegistry {
    pub fn new(plugins: Vec<PluginSchema>) -> Self {
        let mut registry = Self {
            plugins,
            plugin_map: BTreeMap::new(),
        };
        registry.build_plugin_map();
        registry
    }

    /// Plugins of the readout, dataflow and trigger emulation packages.
    pub fn builtin() -> Self {
        let mut handler_commands = LIFECYCLE.to_vec();
        handler_commands.push("record");

        Self::new(vec![
            PluginSchema::new("FakeCardReader", LIFECYCLE),
            PluginSchema::new("DataLinkHandler", &handler_commands),
            PluginSchema::new("DataRecorder", LIFECYCLE),
            PluginSchema::new("TriggerDecisionEmulator", LIFECYCLE),
            PluginSchema::new("RequestGenerator", LIFECYCLE),
            PluginSchema::new("FragmentReceiver", LIFECYCLE),
            PluginSchema::new("DataWriter", LIFECYCLE),
        ])
    }

    /// Load a registry from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, SchemaError> {
        let mut registry: SchemaRegistry = serde_yaml::from_str(content)?;
        registry.build_plugin_map();
        Ok(registry)
    }

    fn build_plugin_map(&mut self) {
        self.plugin_map = self
            .plugins
            .iter()
            .enumerate()
            .map(|(idx, plugin)| (plugin.name.clone(), idx))
            .collect();
    }

    pub fn get_plugin(&self, name: &str) -> Option<&PluginSchema> {
        self.plugin_map
            .get(name)
            .and_then(|&idx| self.plugins.get(idx))
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugin_map.contains_key(name)
    }

    /// Get a plugin, failing if the schema does not declare it.
    pub fn require_plugin(&self, name: &str) -> Result<&PluginSchema, SchemaError> {
        self.get_plugin(name)
            .ok_or_else(|| SchemaError::PluginNotFound(name.to_string()))
    }

    /// Check that every module addressed by `command` accepts it.
    pub fn check_command(&self, init: &Init, command: &Command) -> Result<(), SchemaError> {
        for addressed in command.addressed() {
            let mut matched = false;
            for module in init
                .modules
                .iter()
                .filter(|m| addressed.pattern.matches(&m.inst))
            {
                matched = true;
                let plugin = self.require_plugin(&module.plugin)?;
                if !plugin.accepts(&command.id) {
                    return Err(SchemaError::UnsupportedCommand {
                        command: command.id.clone(),
                        module: module.inst.clone(),
                        plugin: plugin.name.clone(),
                    });
                }
            }
            // A pattern may legitimately match nothing (zero producers)
            if !matched && addressed.pattern.is_exact() {
                return Err(SchemaError::UnknownModule {
                    command: command.id.clone(),
                    module: addressed.pattern.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate a whole command sequence: topology then every command.
    pub fn check_sequence(&self, sequence: &CommandSequence) -> Result<(), SchemaError> {
        let Some(init) = sequence.init() else {
            return Ok(());
        };
        init.validate(self)?;
        for command in &sequence.commands {
            self.check_command(init, command)?;
        }
        Ok(())
    }
}
