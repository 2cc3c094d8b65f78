// ============================================================
// Layer 6 — CSV Export
// ============================================================
// Writes analysis results as plain CSV for external plotting.
//
// Candidate tables, one set per layer:
//   cand-{data}-{model}-{layer}-{k}.csv   ← k ids per unit
//   mean-{data}-{model}-{layer}-{k}.csv   ← their mean changes
//   std-{data}-{model}-{layer}-{k}.csv    ← their stds
// Row i of each file belongs to unit i; the k columns are ordered
// strongest first.
//
// Error-bar series, one file per vocabulary id:
//   errorbar-{data}-{model}-{id}.csv
//   layer,dim,mean,std,error_l,error_u
//   0,12,-0.183200,0.052100,0.091000,0.120400
//   ...
// Units are sub-sampled with a start/stop/step range. When the
// statistics were sorted by mean, `dim` is the original unit index.
//
// Why CSV?
//   Every plotting tool reads it, and a diff of two runs is
//   readable in a terminal.
//
// Reference: Rust Book §12 (I/O), std::io::BufWriter

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::analysis::stats::{Candidates, StateStats};

/// Unit range `start..stop` taken every `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimSlice {
    pub start: usize,
    pub stop:  usize,
    pub step:  usize,
}

impl Default for DimSlice {
    fn default() -> Self {
        Self { start: 0, stop: 600, step: 5 }
    }
}

impl DimSlice {
    /// Positions selected out of `len` units.
    pub fn positions(&self, len: usize) -> impl Iterator<Item = usize> {
        let stop = self.stop.min(len);
        (self.start..stop).step_by(self.step.max(1))
    }
}

pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `rows` as comma-separated lines, no header.
    pub fn write_rows<T: Display>(&self, name: &str, rows: &[Vec<T>]) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let mut f = BufWriter::new(
            File::create(&path).with_context(|| format!("Cannot create '{}'", path.display()))?,
        );
        for row in rows {
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(f, "{}", line.join(","))?;
        }
        f.flush()?;
        tracing::debug!("Wrote {} rows to '{}'", rows.len(), path.display());
        Ok(path)
    }

    /// Write the three candidate tables of one layer.
    pub fn write_candidates(
        &self,
        data:  &str,
        model: &str,
        layer: usize,
        k:     usize,
        cand:  &Candidates,
    ) -> Result<()> {
        let suffix = format!("{data}-{model}-{layer}-{k}.csv");
        self.write_rows(&format!("cand-{suffix}"), &cand.ids)?;
        self.write_rows(&format!("mean-{suffix}"), &cand.means)?;
        self.write_rows(&format!("std-{suffix}"), &cand.stds)?;
        Ok(())
    }

    /// Write the error-bar series of one vocabulary id.
    pub fn write_error_bars(
        &self,
        data:    &str,
        model:   &str,
        word_id: usize,
        stats:   &StateStats,
        dims:    &DimSlice,
    ) -> Result<PathBuf> {
        let path = self.dir.join(format!("errorbar-{data}-{model}-{word_id}.csv"));
        let mut f = BufWriter::new(
            File::create(&path).with_context(|| format!("Cannot create '{}'", path.display()))?,
        );
        writeln!(f, "layer,dim,mean,std,error_l,error_u")?;

        for layer in 0..stats.layer_count() {
            let order = stats.indices[layer].as_deref();
            for pos in dims.positions(stats.means[layer].len()) {
                let dim = order.map_or(pos, |idx| idx[pos]);
                writeln!(
                    f,
                    "{},{},{:.6},{:.6},{:.6},{:.6}",
                    layer,
                    dim,
                    stats.means[layer][pos],
                    stats.stds[layer][pos],
                    stats.errors_l[layer][pos],
                    stats.errors_u[layer][pos],
                )?;
            }
        }
        f.flush()?;
        Ok(path)
    }
}
