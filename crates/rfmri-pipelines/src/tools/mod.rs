//! Wrappers around the external registration binaries.
//!
//! Each wrapper collects the parameters of one tool invocation, builds the
//! argument list, and blocks until the tool exits. The registration work
//! itself happens entirely inside FSL, ANTs and FreeSurfer; nothing here
//! goes beyond marshalling paths and flags.

pub mod ants;
pub mod freesurfer;
pub mod fsl;

pub use ants::{AntsApplyTransforms, AntsRegistration, N4BiasFieldCorrection, SynCost};
pub use freesurfer::MriVol2Surf;
pub use fsl::{ApplyXfm, ConvertXfm, Flirt, FslOutputType};

use anyhow::{bail, Context, Result};
use std::process::Command;
use tracing::info;

/// Run an external tool, failing on a non-zero exit status.
///
/// The captured stderr is attached to the error so a failed registration
/// step surfaces the tool's own diagnostics.
pub(crate) fn run_tool(mut command: Command) -> Result<()> {
    info!("running {:?}", command);
    let output = command
        .output()
        .with_context(|| format!("Failed to launch {:?}", command.get_program()))?;
    if !output.status.success() {
        bail!(
            "{:?} exited with {}: {}",
            command.get_program(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
