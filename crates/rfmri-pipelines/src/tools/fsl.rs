//! FSL command wrappers (flirt, convert_xfm).

use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;

use super::run_tool;

/// FSL output file type, exported through `FSLOUTPUTTYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FslOutputType {
    Nifti,
    NiftiGz,
}

impl FslOutputType {
    fn as_env(&self) -> &'static str {
        match self {
            FslOutputType::Nifti => "NIFTI",
            FslOutputType::NiftiGz => "NIFTI_GZ",
        }
    }
}

/// Rigid/affine registration with FSL flirt.
#[derive(Debug, Clone)]
pub struct Flirt {
    pub in_file: PathBuf,
    pub reference: PathBuf,
    pub out_file: PathBuf,
    pub out_matrix_file: PathBuf,
    pub cost_func: String,
    pub dof: u32,
    pub interp: String,
    pub output_type: FslOutputType,
}

impl Flirt {
    /// Create a flirt invocation with the defaults the pipelines use:
    /// correlation-ratio cost, six degrees of freedom, trilinear
    /// interpolation.
    pub fn new(
        in_file: impl Into<PathBuf>,
        reference: impl Into<PathBuf>,
        out_file: impl Into<PathBuf>,
        out_matrix_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            in_file: in_file.into(),
            reference: reference.into(),
            out_file: out_file.into(),
            out_matrix_file: out_matrix_file.into(),
            cost_func: "corratio".into(),
            dof: 6,
            interp: "trilinear".into(),
            output_type: FslOutputType::Nifti,
        }
    }

    /// Set the cost function (corratio, mutualinfo, ...).
    pub fn with_cost_func(mut self, cost_func: impl Into<String>) -> Self {
        self.cost_func = cost_func.into();
        self
    }

    /// Set the degrees of freedom.
    pub fn with_dof(mut self, dof: u32) -> Self {
        self.dof = dof;
        self
    }

    /// Set the interpolation (trilinear, nearestneighbour, sinc, spline).
    pub fn with_interp(mut self, interp: impl Into<String>) -> Self {
        self.interp = interp.into();
        self
    }

    /// Set the output file type.
    pub fn with_output_type(mut self, output_type: FslOutputType) -> Self {
        self.output_type = output_type;
        self
    }

    /// The argument list passed to flirt.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-in".into(),
            self.in_file.display().to_string(),
            "-ref".into(),
            self.reference.display().to_string(),
            "-out".into(),
            self.out_file.display().to_string(),
            "-omat".into(),
            self.out_matrix_file.display().to_string(),
            "-cost".into(),
            self.cost_func.clone(),
            "-dof".into(),
            self.dof.to_string(),
            "-interp".into(),
            self.interp.clone(),
        ]
    }

    /// Run flirt.
    pub fn run(&self) -> Result<()> {
        let mut command = Command::new("flirt");
        command
            .args(self.args())
            .env("FSLOUTPUTTYPE", self.output_type.as_env());
        run_tool(command)
    }
}

/// Matrix inversion with FSL convert_xfm.
#[derive(Debug, Clone)]
pub struct ConvertXfm {
    pub in_file: PathBuf,
    pub out_file: PathBuf,
    pub invert_xfm: bool,
}

impl ConvertXfm {
    /// Create an inverting convert_xfm invocation.
    pub fn invert(in_file: impl Into<PathBuf>, out_file: impl Into<PathBuf>) -> Self {
        Self {
            in_file: in_file.into(),
            out_file: out_file.into(),
            invert_xfm: true,
        }
    }

    /// The argument list passed to convert_xfm.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-omat".into(), self.out_file.display().to_string()];
        if self.invert_xfm {
            args.push("-inverse".into());
        }
        args.push(self.in_file.display().to_string());
        args
    }

    /// Run convert_xfm.
    pub fn run(&self) -> Result<()> {
        let mut command = Command::new("convert_xfm");
        command.args(self.args());
        run_tool(command)
    }
}

/// Resampling through a stored matrix with flirt -applyxfm.
#[derive(Debug, Clone)]
pub struct ApplyXfm {
    pub in_file: PathBuf,
    pub reference: PathBuf,
    pub in_matrix_file: PathBuf,
    pub out_file: PathBuf,
    pub interp: String,
    pub padding_size: u32,
    pub output_type: FslOutputType,
}

impl ApplyXfm {
    /// Create an applyxfm invocation with trilinear interpolation and no
    /// padding.
    pub fn new(
        in_file: impl Into<PathBuf>,
        reference: impl Into<PathBuf>,
        in_matrix_file: impl Into<PathBuf>,
        out_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            in_file: in_file.into(),
            reference: reference.into(),
            in_matrix_file: in_matrix_file.into(),
            out_file: out_file.into(),
            interp: "trilinear".into(),
            padding_size: 0,
            output_type: FslOutputType::NiftiGz,
        }
    }

    /// Set the interpolation.
    pub fn with_interp(mut self, interp: impl Into<String>) -> Self {
        self.interp = interp.into();
        self
    }

    /// Set the output file type.
    pub fn with_output_type(mut self, output_type: FslOutputType) -> Self {
        self.output_type = output_type;
        self
    }

    /// The argument list passed to flirt.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-in".into(),
            self.in_file.display().to_string(),
            "-ref".into(),
            self.reference.display().to_string(),
            "-applyxfm".into(),
            "-init".into(),
            self.in_matrix_file.display().to_string(),
            "-out".into(),
            self.out_file.display().to_string(),
            "-interp".into(),
            self.interp.clone(),
            "-paddingsize".into(),
            self.padding_size.to_string(),
        ]
    }

    /// Run flirt -applyxfm.
    pub fn run(&self) -> Result<()> {
        let mut command = Command::new("flirt");
        command
            .args(self.args())
            .env("FSLOUTPUTTYPE", self.output_type.as_env());
        run_tool(command)
    }
}
