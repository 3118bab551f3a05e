//! Recorded reference demonstrations
//!
//! A [`ReferencePath`] is an ordered list of frames; some frames carry a
//! checkpoint marker and the name of the segment they close.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LoadError};
use crate::profile::pose::PoseSample;

/// One frame of the demonstration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub pose: PoseSample,
    #[serde(default)]
    pub checkpoint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

impl ReferenceFrame {
    pub fn new(pose: PoseSample) -> Self {
        ReferenceFrame {
            pose,
            checkpoint: false,
            segment: None,
        }
    }
}

/// Immutable demonstration path
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferencePath {
    #[serde(default)]
    pub name: String,
    pub frames: Vec<ReferenceFrame>,
}

impl ReferencePath {
    /// Path without checkpoints
    pub fn from_poses(name: impl Into<String>, poses: Vec<PoseSample>) -> Self {
        ReferencePath {
            name: name.into(),
            frames: poses.into_iter().map(ReferenceFrame::new).collect(),
        }
    }

    /// Path with checkpoints at the given `(frame index, segment name)` markers.
    /// Markers must be strictly increasing and in range.
    pub fn with_checkpoints(
        name: impl Into<String>,
        poses: Vec<PoseSample>,
        markers: &[(usize, &str)],
    ) -> Result<Self, ConfigError> {
        let mut path = Self::from_poses(name, poses);
        let mut previous: Option<usize> = None;

        for &(index, segment) in markers {
            let in_order = previous.map_or(true, |p| index > p);
            let frame = path
                .frames
                .get_mut(index)
                .filter(|_| in_order)
                .ok_or(ConfigError::CheckpointOrder { index })?;
            frame.checkpoint = true;
            frame.segment = Some(segment.to_string());
            previous = Some(index);
        }

        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&ReferenceFrame> {
        self.frames.get(index)
    }

    /// Frame indices carrying a checkpoint marker, ascending
    pub fn checkpoint_indices(&self) -> Vec<usize> {
        self.frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.checkpoint)
            .map(|(index, _)| index)
            .collect()
    }

    /// Segment name reported for the checkpoint at `index`
    pub fn segment_name(&self, index: usize) -> String {
        self.frames
            .get(index)
            .and_then(|frame| frame.segment.clone())
            .unwrap_or_else(|| format!("checkpoint@{}", index))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        for (index, frame) in self.frames.iter().enumerate() {
            if let Some(axis) = frame.pose.first_non_finite() {
                return Err(ConfigError::NonFiniteFrame {
                    index,
                    field: axis.name(),
                });
            }
        }
        Ok(())
    }

    /// Load and validate a path from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path)?;
        let reference: ReferencePath = serde_json::from_str(&content)?;
        reference.validate()?;
        Ok(reference)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}
