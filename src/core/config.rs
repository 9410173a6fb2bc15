//! Sequencer and script configuration from YAML

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

fn default_timeout_secs() -> f64 {
    30.0
}

fn default_skip_count() -> usize {
    1
}

/// Settings applied when a sequencer is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Seconds a step may take before the sequence times out (fractions allowed)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SequencerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout_secs(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SequencerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_timeout(self.timeout_secs)
    }

    /// Timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::ZERO)
    }
}

fn validate_timeout(timeout_secs: f64) -> Result<()> {
    if !timeout_secs.is_finite() || timeout_secs < 0.0 {
        anyhow::bail!(
            "Timeout must be a non-negative number of seconds, got {}",
            timeout_secs
        );
    }
    Ok(())
}

/// Top-level script run by the `tasks` binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Script name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Timeout between steps, in seconds (defaults to 30)
    #[serde(default)]
    pub timeout_secs: Option<f64>,

    /// Arguments passed to the first step
    #[serde(default)]
    pub args: Vec<Value>,

    /// Steps, in queue order
    pub steps: Vec<ScriptStep>,
}

/// One step of a script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Unique step identifier
    pub id: String,

    /// What the step does
    pub action: StepAction,
}

/// Built-in step behaviors available to scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    /// Continue with the incoming arguments
    Pass,
    /// Continue with new arguments
    SetArgs { args: Vec<Value> },
    /// Notify a custom event with the incoming arguments, then continue
    Emit { event: String },
    /// Continue after a delay
    Delay { ms: u64 },
    /// Fail with a message
    Fail { message: String },
    /// Drop the next `count` steps (one if omitted), then continue
    Skip {
        #[serde(default = "default_skip_count")]
        count: usize,
    },
    /// Drop everything and report success
    SkipAll,
    /// Extend the deadline, then continue
    ResetTimeout,
    /// Never continue; the sequence can only end by timing out, so a stall
    /// must be followed by another step
    Stall,
}

impl ScriptConfig {
    /// Load a script from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a script from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ScriptConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the script
    pub fn validate(&self) -> Result<()> {
        let mut seen_ids = std::collections::HashSet::new();
        for step in &self.steps {
            if step.id.trim().is_empty() {
                anyhow::bail!("Step IDs must not be empty");
            }
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step ID: {}", step.id);
            }
            if let StepAction::Emit { event } = &step.action {
                if event.trim().is_empty() {
                    anyhow::bail!("Step '{}' emits an event with an empty name", step.id);
                }
            }
        }

        // With nothing left queued no deadline is armed, so a final stall would hang
        if let Some(last) = self.steps.last() {
            if last.action == StepAction::Stall {
                anyhow::bail!("Step '{}' stalls as the last step and could never time out", last.id);
            }
        }

        if let Some(timeout_secs) = self.timeout_secs {
            validate_timeout(timeout_secs)?;
        }

        Ok(())
    }

    /// Custom event names emitted by the script's steps, deduplicated in order
    pub fn custom_events(&self) -> Vec<String> {
        let mut events: Vec<String> = Vec::new();
        for step in &self.steps {
            if let StepAction::Emit { event } = &step.action {
                if !events.contains(event) {
                    events.push(event.clone());
                }
            }
        }
        events
    }

    /// Sequencer settings for this script
    pub fn sequencer_config(&self) -> SequencerConfig {
        match self.timeout_secs {
            Some(timeout_secs) => SequencerConfig::new().with_timeout_secs(timeout_secs),
            None => SequencerConfig::new(),
        }
    }
}
