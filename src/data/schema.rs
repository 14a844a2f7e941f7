use serde::{Deserialize, Serialize};

use super::model::DummyKind;

/// Sample points in the flameD simulation.
pub const FLAME_D_ROWS: usize = 10613;
/// Temperature plus 36 species.
pub const FLAME_D_COLS: usize = 37;
/// Ux, Uy, Uz, epsilon, k, nut, P.
pub const FLUID_VAR_COLS: usize = 7;

/// Shapes the synthetic folder is expected to contain.
pub const DUMMY_KINDS: [DummyKind; 3] = [DummyKind::Blobs, DummyKind::Moons, DummyKind::Circles];

/// Expected shape of one fixture file. `None` means "not constrained".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSchema {
    pub file_name: String,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
}

impl FileSchema {
    pub fn new(file_name: &str, rows: Option<usize>, cols: Option<usize>) -> Self {
        FileSchema {
            file_name: file_name.to_string(),
            rows,
            cols,
        }
    }
}

/// Expected entry count of the column-name file. Label files have no matrix
/// shape, so row and column counts are rejected when read from config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsSchema {
    pub file_name: String,
    #[serde(default)]
    pub entries: Option<usize>,
}

/// The contract of the `reactive_flow/` folder.
///
/// Defaults describe the published flameD fixture; configuration may shrink
/// the counts so the same rules check a truncated copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveFlowSchema {
    pub state: FileSchema,
    pub labels: LabelsSchema,
    pub mesh: FileSchema,
    pub fluid: FileSchema,
}

impl Default for ReactiveFlowSchema {
    fn default() -> Self {
        ReactiveFlowSchema {
            state: FileSchema::new("flameD.csv", Some(FLAME_D_ROWS), Some(FLAME_D_COLS)),
            labels: LabelsSchema {
                file_name: "labels.csv".to_string(),
                entries: Some(FLAME_D_COLS),
            },
            mesh: FileSchema::new("mesh.csv", Some(FLAME_D_ROWS), None),
            fluid: FileSchema::new("fluid_var.csv", Some(FLAME_D_ROWS), Some(FLUID_VAR_COLS)),
        }
    }
}

impl ReactiveFlowSchema {
    /// Default file names, no absolute counts.
    pub fn relational() -> Self {
        Self::default().without_counts()
    }

    /// Drop the sample and species counts so only cross-file agreement and
    /// the fixed fluid column count are checked.
    pub fn without_counts(mut self) -> Self {
        self.state.rows = None;
        self.state.cols = None;
        self.mesh.rows = None;
        self.fluid.rows = None;
        self.labels.entries = None;
        self
    }

    /// Override the sample count on every row-aligned file.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.state.rows = Some(rows);
        self.mesh.rows = Some(rows);
        self.fluid.rows = Some(rows);
        self
    }
}
