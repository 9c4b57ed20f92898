//! Lifecycle commands and module addressing.

use crate::init::Init;
use crate::registry::SchemaError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Application state before or after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    None,
    Initial,
    Configured,
    Running,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::None => write!(f, "NONE"),
            RunState::Initial => write!(f, "INITIAL"),
            RunState::Configured => write!(f, "CONFIGURED"),
            RunState::Running => write!(f, "RUNNING"),
        }
    }
}

/// Addresses one module by name or a group of modules by regular expression.
///
/// On the wire both forms are a bare string; the consuming runtime resolves
/// patterns against its module names. The empty pattern addresses every
/// module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModulePattern {
    Exact(String),
    Pattern(ModuleRegex),
}

/// A module expression compiled once, anchored to the whole name.
///
/// Equality and hashing go by the source expression.
#[derive(Debug, Clone)]
pub struct ModuleRegex {
    expr: String,
    /// `None` for the empty expression, which matches every module
    regex: Option<Regex>,
}

impl ModuleRegex {
    fn compile(expr: String) -> Result<Self, regex::Error> {
        let regex = if expr.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("^(?:{expr})$"))?)
        };
        Ok(Self { expr, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.expr
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.as_ref().map_or(true, |re| re.is_match(name))
    }
}

impl PartialEq for ModuleRegex {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl Eq for ModuleRegex {}

impl std::hash::Hash for ModuleRegex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.expr.hash(state);
    }
}

const REGEX_META: &[char] = &[
    '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^', '$', '\\',
];

impl ModulePattern {
    pub fn exact(name: impl Into<String>) -> Self {
        ModulePattern::Exact(name.into())
    }

    /// Build a pattern, rejecting expressions that do not compile.
    pub fn pattern(expr: impl Into<String>) -> Result<Self, SchemaError> {
        let expr = expr.into();
        ModuleRegex::compile(expr.clone())
            .map(ModulePattern::Pattern)
            .map_err(|e| SchemaError::InvalidPattern {
                pattern: expr,
                message: e.to_string(),
            })
    }

    /// The pattern addressing every module.
    pub fn any() -> Self {
        ModulePattern::Pattern(ModuleRegex {
            expr: String::new(),
            regex: None,
        })
    }

    /// Classify a wire string: empty or containing regex syntax is a pattern.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        if s.is_empty() || s.contains(REGEX_META) {
            Self::pattern(s)
        } else {
            Ok(Self::exact(s))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ModulePattern::Exact(s) => s,
            ModulePattern::Pattern(re) => re.as_str(),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, ModulePattern::Exact(_))
    }

    /// Whether this pattern addresses the module called `name`.
    ///
    /// Patterns must match the whole name.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ModulePattern::Exact(exact) => exact == name,
            ModulePattern::Pattern(re) => re.is_match(name),
        }
    }
}

impl std::fmt::Display for ModulePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModulePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModulePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ModulePattern::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A payload addressed to the modules matched by `match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressedCmd {
    #[serde(rename = "match")]
    pub pattern: ModulePattern,
    /// Plugin-specific payload, `null` when the command takes no parameters
    pub data: Option<serde_json::Value>,
}

impl AddressedCmd {
    /// Address a typed payload.
    pub fn new<T: Serialize>(pattern: ModulePattern, payload: &T) -> Result<Self, SchemaError> {
        Ok(Self {
            pattern,
            data: Some(serde_json::to_value(payload)?),
        })
    }

    /// Address a command without payload.
    pub fn empty(pattern: ModulePattern) -> Self {
        Self {
            pattern,
            data: None,
        }
    }
}

/// Per-module payloads of a non-`init` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmdObj {
    pub modules: Vec<AddressedCmd>,
}

/// Data carried by a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandData {
    Init(Init),
    Modules(CmdObj),
}

/// One lifecycle command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_state: Option<RunState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_state: Option<RunState>,
    pub data: CommandData,
}

impl Command {
    /// The `init` command carrying the topology.
    pub fn init(init: Init) -> Self {
        Self {
            id: "init".to_string(),
            entry_state: None,
            exit_state: None,
            data: CommandData::Init(init),
        }
    }

    /// A command addressing modules.
    pub fn modules(id: impl Into<String>, modules: Vec<AddressedCmd>) -> Self {
        Self {
            id: id.into(),
            entry_state: None,
            exit_state: None,
            data: CommandData::Modules(CmdObj { modules }),
        }
    }

    /// Attach run-control entry and exit states.
    pub fn with_states(mut self, entry: RunState, exit: RunState) -> Self {
        self.entry_state = Some(entry);
        self.exit_state = Some(exit);
        self
    }

    pub fn as_init(&self) -> Option<&Init> {
        match &self.data {
            CommandData::Init(init) => Some(init),
            CommandData::Modules(_) => None,
        }
    }

    /// Addressed payloads; empty for `init`.
    pub fn addressed(&self) -> &[AddressedCmd] {
        match &self.data {
            CommandData::Init(_) => &[],
            CommandData::Modules(obj) => &obj.modules,
        }
    }

    /// Payload addressed with exactly this pattern string.
    pub fn payload_for(&self, pattern: &str) -> Option<&serde_json::Value> {
        self.addressed()
            .iter()
            .find(|a| a.pattern.as_str() == pattern)
            .and_then(|a| a.data.as_ref())
    }
}

/// The ordered command sequence sent to an application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSequence {
    pub commands: Vec<Command>,
}

impl CommandSequence {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn command(&self, id: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.id.as_str()).collect()
    }

    /// The topology from the `init` command.
    pub fn init(&self) -> Option<&Init> {
        self.commands.iter().find_map(|c| c.as_init())
    }
}
