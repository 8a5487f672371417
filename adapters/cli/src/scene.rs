//! Scene files and command scripts consumed by the replay adapter.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use golmi_core::{Command, Configuration, GripperId, NewGripper, NewObject, ObjectId};
use golmi_world::World;
use serde::Deserialize;

/// Initial population of a world.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SceneFile {
    /// Objects keyed by identifier.
    pub(crate) objs: BTreeMap<ObjectId, NewObject>,
    /// Grippers keyed by identifier.
    pub(crate) grippers: BTreeMap<GripperId, NewGripper>,
}

impl SceneFile {
    /// Parses a scene document.
    pub(crate) fn parse(document: &str) -> Result<Self> {
        serde_json::from_str(document).context("scene document is malformed")
    }

    /// Inserts every entity of the scene into the world.
    pub(crate) fn populate(self, world: &mut World, config: &Configuration) -> Result<()> {
        for (id, object) in self.objs {
            let _ = world
                .add_object(id, object, config)
                .context("failed to place scene object")?;
        }
        for (id, gripper) in self.grippers {
            let _ = world
                .add_gripper(id, gripper)
                .context("failed to place scene gripper")?;
        }
        Ok(())
    }
}

/// Command parsed from a script together with its one-based line number.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScriptLine {
    pub(crate) line: usize,
    pub(crate) command: Command,
}

/// Parses a script holding one JSON command per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub(crate) fn parse_script(script: &str) -> Result<Vec<ScriptLine>> {
    script
        .lines()
        .enumerate()
        .map(|(index, text)| (index + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
        .map(|(line, text)| {
            serde_json::from_str(text)
                .with_context(|| format!("script line {line} is not a valid command"))
                .map(|command| ScriptLine { line, command })
        })
        .collect()
}
