//! Solution snapshot export.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use streamer_core::SolutionTag;

use crate::grid::AxisymmetricGrid;

/// What `export_solution` does with a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportMode {
    /// Drop it.
    Discard,
    /// Remember the tag only.
    #[default]
    Record,
    /// Write `"{tag}.txt"` with one `r z phi E_norm sigma` row per cell.
    Text,
}

/// Write a plain-text snapshot, creating parent directories as needed.
pub fn write_text_snapshot(
    path: &Path,
    tag: &SolutionTag,
    grid: &AxisymmetricGrid,
    potential: &[f64],
    field_norm: &[f64],
    conductivity: &[f64],
) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(fs::File::create(path)?);
    writeln!(out, "# step {} time {:.6e}", tag.step, tag.time)?;
    writeln!(out, "# nr {} nz {}", grid.nr(), grid.nz())?;
    writeln!(out, "# r z phi E_norm sigma")?;
    for j in 0..grid.nz() {
        for i in 0..grid.nr() {
            let k = grid.index(i, j);
            writeln!(
                out,
                "{:.6e} {:.6e} {:.6e} {:.6e} {:.6e}",
                grid.r_center(i),
                grid.z_center(j),
                potential[k],
                field_norm[k],
                conductivity[k]
            )?;
        }
    }
    out.flush()
}
