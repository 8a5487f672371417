//! Process-wide world configuration loaded once before any world exists.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ActionError, ActionKind, Bounds, InvalidShapeError, Shape, GRIPPER_TYPE};

const DEFAULT_GRID_WIDTH: u32 = 20;
const DEFAULT_GRID_HEIGHT: u32 = 20;
const DEFAULT_MOVE_STEP: f32 = 0.5;
const DEFAULT_ROTATION_STEP: u32 = 90;
const DEFAULT_ACTION_INTERVAL: f32 = 0.5;
const DEFAULT_COLORS: [&str; 8] = [
    "red",
    "orange",
    "yellow",
    "green",
    "blue",
    "purple",
    "saddlebrown",
    "grey",
];

/// Reasons a configuration document is rejected at load time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON or has the wrong layout.
    #[error("configuration document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Grid width or height was zero.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidGrid {
        /// Configured grid width.
        width: u32,
        /// Configured grid height.
        height: u32,
    },
    /// A type's block matrix is not a valid shape.
    #[error("shape for type '{type_name}' is invalid: {source}")]
    InvalidTypeShape {
        /// Name of the offending type.
        type_name: String,
        /// Validation failure reported by the shape constructor.
        #[source]
        source: InvalidShapeError,
    },
    /// The type table tried to define the name reserved for grippers.
    #[error("type name '{0}' is reserved")]
    ReservedTypeName(String),
    /// The rotation step is not a whole number of quarter turns.
    #[error("rotation step of {0} degrees is not a multiple of 90")]
    UnsupportedRotationStep(u32),
    /// The movement step was zero, negative or not finite.
    #[error("move step must be a positive number, got {0}")]
    InvalidMoveStep(f32),
    /// The repeat interval was negative or not finite.
    #[error("action interval must be a non-negative number of seconds, got {0}")]
    InvalidActionInterval(f32),
}

/// On-disk configuration document.
///
/// Every field except `type_config` may be omitted, in which case the
/// defaults of the reference deployment apply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Number of block columns on the board.
    pub width: u32,
    /// Number of block rows on the board.
    pub height: u32,
    /// Lock released objects to the nearest block.
    pub snap_to_grid: bool,
    /// Reject any action that would make objects overlap or leave the board.
    pub prevent_overlap: bool,
    /// Object manipulations clients may perform.
    pub actions: Vec<ActionKind>,
    /// Distance travelled by a single move action, in blocks.
    pub move_step: f32,
    /// Angle applied by a single rotate action, in degrees.
    pub rotation_step: u32,
    /// Seconds between repetitions of a held-down action.
    pub action_interval: f32,
    /// Object type names mapped to 0/1 block matrices.
    pub type_config: BTreeMap<String, Vec<Vec<u8>>>,
    /// Palette offered to clients for new objects.
    pub colors: Vec<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            snap_to_grid: false,
            prevent_overlap: true,
            actions: vec![ActionKind::Move, ActionKind::Rotate],
            move_step: DEFAULT_MOVE_STEP,
            rotation_step: DEFAULT_ROTATION_STEP,
            action_interval: DEFAULT_ACTION_INTERVAL,
            type_config: BTreeMap::new(),
            colors: DEFAULT_COLORS.iter().map(|color| (*color).to_owned()).collect(),
        }
    }
}

/// Validated, immutable world configuration.
///
/// Constructed once at start-up and passed by reference into every world
/// mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    grid_width: u32,
    grid_height: u32,
    type_shapes: BTreeMap<String, Shape>,
    allowed_actions: BTreeSet<ActionKind>,
    move_step: f32,
    rotation_step: u32,
    snap_to_grid: bool,
    prevent_overlap: bool,
    action_interval: f32,
    colors: Vec<String>,
}

impl Configuration {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(document)?;
        Self::try_from(file)
    }

    /// Builds a configuration with default settings around a type table.
    pub fn with_types<I, S>(types: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, Vec<Vec<u8>>)>,
        S: Into<String>,
    {
        Self::try_from(ConfigFile {
            type_config: types
                .into_iter()
                .map(|(name, matrix)| (name.into(), matrix))
                .collect(),
            ..ConfigFile::default()
        })
    }

    /// Number of block columns on the board.
    #[must_use]
    pub const fn grid_width(&self) -> u32 {
        self.grid_width
    }

    /// Number of block rows on the board.
    #[must_use]
    pub const fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Rectangle every entity must stay within when overlap prevention is on.
    #[must_use]
    pub fn grid_bounds(&self) -> Bounds {
        Bounds::new(0.0, 0.0, self.grid_width as f32, self.grid_height as f32)
    }

    /// Names of all registered object types in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.type_shapes.keys().map(String::as_str)
    }

    /// Base shape registered for the provided type, if any.
    #[must_use]
    pub fn shape_for(&self, type_name: &str) -> Option<&Shape> {
        self.type_shapes.get(type_name)
    }

    /// Reports whether clients may perform the given action.
    #[must_use]
    pub fn is_allowed(&self, kind: ActionKind) -> bool {
        self.allowed_actions.contains(&kind)
    }

    /// Fails with [`ActionError::ActionNotAllowed`] when the action is disabled.
    pub fn ensure_allowed(&self, kind: ActionKind) -> Result<(), ActionError> {
        if self.is_allowed(kind) {
            Ok(())
        } else {
            Err(ActionError::ActionNotAllowed(kind))
        }
    }

    /// Enabled actions in sorted order.
    pub fn allowed_actions(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.allowed_actions.iter().copied()
    }

    /// Distance travelled by a single move action, in blocks.
    #[must_use]
    pub const fn move_step(&self) -> f32 {
        self.move_step
    }

    /// Angle applied by a single rotate action, in degrees.
    #[must_use]
    pub const fn rotation_step(&self) -> u32 {
        self.rotation_step
    }

    /// Whether released objects lock to the nearest block.
    #[must_use]
    pub const fn snap_to_grid(&self) -> bool {
        self.snap_to_grid
    }

    /// Whether moves that overlap objects or leave the board are rejected.
    #[must_use]
    pub const fn prevent_overlap(&self) -> bool {
        self.prevent_overlap
    }

    /// Minimum spacing between repetitions of a held-down action.
    ///
    /// Enforced by the transport layer; the world never sleeps or throttles.
    #[must_use]
    pub fn action_interval(&self) -> Duration {
        Duration::try_from_secs_f32(self.action_interval).unwrap_or(Duration::MAX)
    }

    /// Palette offered to clients.
    #[must_use]
    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Client-facing summary of the configuration.
    #[must_use]
    pub fn to_client_view(&self) -> ConfigView {
        ConfigView {
            width: self.grid_width,
            height: self.grid_height,
            actions: self.allowed_actions.iter().copied().collect(),
            rotation_step: self.rotation_step,
            type_config: self.type_shapes.clone(),
            colors: self.colors.clone(),
        }
    }
}

impl TryFrom<ConfigFile> for Configuration {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        if file.width == 0 || file.height == 0 {
            return Err(ConfigError::InvalidGrid {
                width: file.width,
                height: file.height,
            });
        }
        if file.rotation_step == 0 || file.rotation_step % 90 != 0 || file.rotation_step % 360 == 0
        {
            return Err(ConfigError::UnsupportedRotationStep(file.rotation_step));
        }
        if !file.move_step.is_finite() || file.move_step <= 0.0 {
            return Err(ConfigError::InvalidMoveStep(file.move_step));
        }
        if !file.action_interval.is_finite() || file.action_interval < 0.0 {
            return Err(ConfigError::InvalidActionInterval(file.action_interval));
        }

        let mut type_shapes = BTreeMap::new();
        for (type_name, matrix) in file.type_config {
            if type_name == GRIPPER_TYPE {
                return Err(ConfigError::ReservedTypeName(type_name));
            }
            let shape = Shape::from_matrix(&matrix).map_err(|source| {
                ConfigError::InvalidTypeShape {
                    type_name: type_name.clone(),
                    source,
                }
            })?;
            let _ = type_shapes.insert(type_name, shape);
        }

        Ok(Self {
            grid_width: file.width,
            grid_height: file.height,
            type_shapes,
            allowed_actions: file.actions.into_iter().collect(),
            move_step: file.move_step,
            rotation_step: file.rotation_step,
            snap_to_grid: file.snap_to_grid,
            prevent_overlap: file.prevent_overlap,
            action_interval: file.action_interval,
            colors: file.colors,
        })
    }
}

/// Configuration details clients need to render and drive the board.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigView {
    /// Number of block columns on the board.
    pub width: u32,
    /// Number of block rows on the board.
    pub height: u32,
    /// Enabled object manipulations.
    pub actions: Vec<ActionKind>,
    /// Angle applied by a single rotate action, in degrees.
    pub rotation_step: u32,
    /// Object type names mapped to their base shapes.
    pub type_config: BTreeMap<String, Shape>,
    /// Palette offered to clients.
    pub colors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: &str = r#"{
        "type_config": {
            "F": [[0,1,1],[1,1,0],[0,1,0]],
            "I": [[0,1,0,0],[0,1,0,0],[0,1,0,0],[0,1,0,0]]
        }
    }"#;

    #[test]
    fn defaults_follow_reference_deployment() {
        let config = Configuration::from_json_str(TYPES).expect("valid configuration");
        assert_eq!(config.grid_width(), 20);
        assert_eq!(config.grid_height(), 20);
        assert!(config.prevent_overlap());
        assert!(!config.snap_to_grid());
        assert!(config.is_allowed(ActionKind::Move));
        assert!(config.is_allowed(ActionKind::Rotate));
        assert!(!config.is_allowed(ActionKind::Mirror));
        assert!(!config.is_allowed(ActionKind::Grip));
        assert_eq!(
            config.ensure_allowed(ActionKind::Grip),
            Err(ActionError::ActionNotAllowed(ActionKind::Grip))
        );
        assert_eq!(config.rotation_step(), 90);
        assert_eq!(config.action_interval(), Duration::from_millis(500));
        assert_eq!(config.colors().len(), 8);
        assert_eq!(config.type_names().collect::<Vec<_>>(), vec!["F", "I"]);
        assert_eq!(config.shape_for("I").map(Shape::side), Some(4));
    }

    #[test]
    fn explicit_settings_override_defaults() {
        let config = Configuration::from_json_str(
            r#"{
                "width": 8,
                "height": 6,
                "snap_to_grid": true,
                "prevent_overlap": false,
                "actions": ["move", "mirror", "grip"],
                "move_step": 1.0,
                "rotation_step": 180,
                "action_interval": 0.25,
                "type_config": {"dot": [[1]]}
            }"#,
        )
        .expect("valid configuration");

        assert_eq!(config.grid_bounds(), Bounds::new(0.0, 0.0, 8.0, 6.0));
        assert!(config.snap_to_grid());
        assert!(!config.prevent_overlap());
        assert_eq!(
            config.allowed_actions().collect::<Vec<_>>(),
            vec![ActionKind::Move, ActionKind::Mirror, ActionKind::Grip]
        );
        assert_eq!(config.ensure_allowed(ActionKind::Grip), Ok(()));
        assert_eq!(
            config.ensure_allowed(ActionKind::Rotate),
            Err(ActionError::ActionNotAllowed(ActionKind::Rotate))
        );
    }

    #[test]
    fn rejects_malformed_type_shape() {
        let error = Configuration::with_types([("bad", vec![vec![1, 0], vec![1]])])
            .expect_err("non-square shape must fail");
        assert!(matches!(
            error,
            ConfigError::InvalidTypeShape { ref type_name, source: InvalidShapeError::NotSquare { .. } }
                if type_name == "bad"
        ));
    }

    #[test]
    fn rejects_reserved_gripper_type() {
        let error = Configuration::with_types([(GRIPPER_TYPE, vec![vec![1]])])
            .expect_err("gripper is reserved");
        assert!(matches!(error, ConfigError::ReservedTypeName(_)));
    }

    #[test]
    fn rejects_invalid_scalars() {
        let grid = ConfigFile {
            width: 0,
            ..ConfigFile::default()
        };
        assert!(matches!(
            Configuration::try_from(grid),
            Err(ConfigError::InvalidGrid { width: 0, .. })
        ));

        for step in [0, 45, 360, 100] {
            let file = ConfigFile {
                rotation_step: step,
                ..ConfigFile::default()
            };
            assert!(
                matches!(
                    Configuration::try_from(file),
                    Err(ConfigError::UnsupportedRotationStep(value)) if value == step
                ),
                "rotation step {step} must be rejected"
            );
        }

        let move_step = ConfigFile {
            move_step: 0.0,
            ..ConfigFile::default()
        };
        assert!(matches!(
            Configuration::try_from(move_step),
            Err(ConfigError::InvalidMoveStep(_))
        ));

        let interval = ConfigFile {
            action_interval: -1.0,
            ..ConfigFile::default()
        };
        assert!(matches!(
            Configuration::try_from(interval),
            Err(ConfigError::InvalidActionInterval(_))
        ));
    }

    #[test]
    fn rejects_unknown_action_names() {
        let error = Configuration::from_json_str(r#"{"actions": ["teleport"]}"#)
            .expect_err("unknown action must fail");
        assert!(matches!(error, ConfigError::Malformed(_)));
    }

    #[test]
    fn client_view_exposes_shapes_as_matrices() {
        let config = Configuration::with_types([("dot", vec![vec![1]])]).expect("valid");
        let json = serde_json::to_value(config.to_client_view()).expect("serialize");
        assert_eq!(json["type_config"]["dot"], serde_json::json!([[1]]));
        assert_eq!(json["actions"], serde_json::json!(["move", "rotate"]));
        assert_eq!(json["width"], 20);
    }
}
