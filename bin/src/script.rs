//! Replay scripts: a list of buffers and the editor events to feed the beacon.
//!
//! ```toml
//! [[buffer]]
//! name = "main.rs"
//! lines = 400
//!
//! [[step]]
//! action = "move"
//! line = 120
//!
//! [[step]]
//! action = "wait"
//! ms = 200
//! ```
//!
//! The first buffer is active when the replay starts. Without any `[[buffer]]`
//! table a 100 line scratch buffer is used.

use anyhow::{bail, Context, Result};
use beacon::{sim::SimBuffer, JumpDirection, MouseButton};
use serde::Deserialize;
use std::{collections::HashSet, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default, rename = "buffer")]
    pub buffers: Vec<BufferDef>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BufferDef {
    pub name: String,
    #[serde(default = "default_lines")]
    pub lines: u32,
    /// Length of every line, in columns.
    #[serde(default = "default_width")]
    pub width: u32,
    pub filetype: Option<String>,
}

fn default_lines() -> u32 {
    100
}

fn default_width() -> u32 {
    80
}

impl BufferDef {
    pub fn to_sim(&self) -> SimBuffer {
        let buffer = SimBuffer::uniform(self.name.clone(), self.lines, self.width);
        match &self.filetype {
            Some(filetype) => buffer.with_filetype(filetype.clone()),
            None => buffer,
        }
    }
}

/// One scripted editor event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Plain cursor motion.
    Move {
        line: u32,
        #[serde(default)]
        column: u32,
    },
    /// Cursor motion that records a jump-list entry, like a search or `G`.
    JumpTo {
        line: u32,
        #[serde(default)]
        column: u32,
    },
    /// Mouse press, optionally moving the cursor to where it landed.
    Click {
        #[serde(default)]
        button: Button,
        line: Option<u32>,
        #[serde(default)]
        column: u32,
    },
    /// Switch to a named buffer.
    Enter { buffer: String },
    /// Enhanced jump-list navigation.
    Jump { direction: Direction },
    /// Manual beacon at the cursor.
    Show,
    Toggle,
    /// Let time pass.
    Wait { ms: u64 },
    /// Close every beacon overlay from the editor side.
    CloseOverlays,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    #[default]
    Left,
    Right,
    Middle,
}

impl From<Button> for MouseButton {
    fn from(button: Button) -> Self {
        match button {
            Button::Left => MouseButton::Left,
            Button::Right => MouseButton::Right,
            Button::Middle => MouseButton::Middle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Backward,
    Forward,
}

impl From<Direction> for JumpDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Backward => JumpDirection::Backward,
            Direction::Forward => JumpDirection::Forward,
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid script: {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        let script: Script = toml::from_str(source).context("Failed to parse script")?;
        script.validate()?;
        Ok(script)
    }

    /// Buffers to create, the first one active.
    pub fn sim_buffers(&self) -> Vec<SimBuffer> {
        if self.buffers.is_empty() {
            return vec![SimBuffer::uniform("scratch", default_lines(), default_width())];
        }
        self.buffers.iter().map(BufferDef::to_sim).collect()
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for buffer in &self.buffers {
            if !names.insert(buffer.name.as_str()) {
                bail!("Buffer `{}` is defined twice", buffer.name);
            }
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Step::Enter { buffer } = step {
                if !names.contains(buffer.as_str()) {
                    bail!("Step {}: unknown buffer `{buffer}`", index + 1);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_step_kind() {
        let script = Script::parse(
            r#"
            [[buffer]]
            name = "main.rs"
            lines = 300
            filetype = "rust"

            [[buffer]]
            name = "notes.md"

            [[step]]
            action = "move"
            line = 20

            [[step]]
            action = "jump_to"
            line = 250
            column = 4

            [[step]]
            action = "click"
            button = "middle"
            line = 40

            [[step]]
            action = "enter"
            buffer = "notes.md"

            [[step]]
            action = "jump"
            direction = "backward"

            [[step]]
            action = "show"

            [[step]]
            action = "toggle"

            [[step]]
            action = "wait"
            ms = 250

            [[step]]
            action = "close_overlays"
            "#,
        )
        .unwrap();

        assert_eq!(script.buffers.len(), 2);
        assert_eq!(script.buffers[1].lines, 100);
        assert_eq!(
            script.steps,
            vec![
                Step::Move { line: 20, column: 0 },
                Step::JumpTo {
                    line: 250,
                    column: 4
                },
                Step::Click {
                    button: Button::Middle,
                    line: Some(40),
                    column: 0
                },
                Step::Enter {
                    buffer: "notes.md".to_string()
                },
                Step::Jump {
                    direction: Direction::Backward
                },
                Step::Show,
                Step::Toggle,
                Step::Wait { ms: 250 },
                Step::CloseOverlays,
            ]
        );
    }

    #[test]
    fn empty_script_uses_scratch_buffer() {
        let script = Script::parse("").unwrap();
        let buffers = script.sim_buffers();
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].name, "scratch");
        assert_eq!(buffers[0].line_count(), 100);
    }

    #[test]
    fn rejects_unknown_buffer() {
        let result = Script::parse(
            r#"
            [[step]]
            action = "enter"
            buffer = "missing.rs"
            "#,
        );
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("unknown buffer `missing.rs`"), "{message}");
    }

    #[test]
    fn rejects_duplicate_buffer() {
        let result = Script::parse(
            r#"
            [[buffer]]
            name = "a"
            [[buffer]]
            name = "a"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_action() {
        let result = Script::parse(
            r#"
            [[step]]
            action = "teleport"
            "#,
        );
        assert!(result.is_err());
    }
}
