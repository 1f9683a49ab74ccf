//! ANTs command wrappers (N4BiasFieldCorrection, antsRegistration,
//! antsApplyTransforms).

use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;

use super::run_tool;

/// Bias field correction with N4BiasFieldCorrection.
#[derive(Debug, Clone)]
pub struct N4BiasFieldCorrection {
    pub dimension: u32,
    pub input_image: PathBuf,
    pub bias_image: PathBuf,
    pub output_image: PathBuf,
}

impl N4BiasFieldCorrection {
    /// Create a 3D bias correction invocation.
    pub fn new(
        input_image: impl Into<PathBuf>,
        bias_image: impl Into<PathBuf>,
        output_image: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dimension: 3,
            input_image: input_image.into(),
            bias_image: bias_image.into(),
            output_image: output_image.into(),
        }
    }

    /// The argument list passed to N4BiasFieldCorrection.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-d".into(),
            self.dimension.to_string(),
            "-i".into(),
            self.input_image.display().to_string(),
            "-o".into(),
            format!(
                "[{},{}]",
                self.output_image.display(),
                self.bias_image.display()
            ),
        ]
    }

    /// Run N4BiasFieldCorrection.
    pub fn run(&self) -> Result<()> {
        let mut command = Command::new("N4BiasFieldCorrection");
        command.args(self.args());
        run_tool(command)
    }
}

/// Cost function for the SyN registration stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynCost {
    CrossCorrelation,
    MutualInformation,
}

/// Multi-stage registration with antsRegistration.
///
/// Mirrors the rigid / affine / SyN staging the pipelines drive: each
/// enabled stage adds a `--transform`, `--metric` and `--convergence`
/// block to the command line. The warp outputs land at
/// `<prefix>1Warp.nii.gz` and `<prefix>1InverseWarp.nii.gz`.
#[derive(Debug, Clone)]
pub struct AntsRegistration {
    pub fixed: PathBuf,
    pub moving: PathBuf,
    pub output_prefix: PathBuf,
    pub run_rigid: bool,
    pub rigid_iterations: u32,
    pub run_affine: bool,
    pub affine_iterations: u32,
    pub run_syn: bool,
    pub coarse_iterations: u32,
    pub medium_iterations: u32,
    pub fine_iterations: u32,
    pub cost_function: SynCost,
    pub interpolation: String,
    pub convergence: f64,
}

impl AntsRegistration {
    /// Create a registration with the staging the pipelines default to:
    /// rigid initialisation followed by SyN, cross-correlation cost.
    pub fn new(
        fixed: impl Into<PathBuf>,
        moving: impl Into<PathBuf>,
        output_prefix: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fixed: fixed.into(),
            moving: moving.into(),
            output_prefix: output_prefix.into(),
            run_rigid: true,
            rigid_iterations: 1000,
            run_affine: false,
            affine_iterations: 1000,
            run_syn: true,
            coarse_iterations: 50,
            medium_iterations: 150,
            fine_iterations: 100,
            cost_function: SynCost::CrossCorrelation,
            interpolation: "Linear".into(),
            convergence: 1e-6,
        }
    }

    /// Path of the forward warp produced by the SyN stage.
    pub fn warp_file(&self) -> PathBuf {
        let mut name = self.output_prefix.as_os_str().to_os_string();
        name.push("1Warp.nii.gz");
        PathBuf::from(name)
    }

    /// Path of the inverse warp produced by the SyN stage.
    pub fn inverse_warp_file(&self) -> PathBuf {
        let mut name = self.output_prefix.as_os_str().to_os_string();
        name.push("1InverseWarp.nii.gz");
        PathBuf::from(name)
    }

    /// Path of the affine transform produced by the linear stages.
    pub fn affine_file(&self) -> PathBuf {
        let mut name = self.output_prefix.as_os_str().to_os_string();
        name.push("0GenericAffine.mat");
        PathBuf::from(name)
    }

    fn metric(&self) -> String {
        let pair = format!("{},{}", self.fixed.display(), self.moving.display());
        match self.cost_function {
            SynCost::CrossCorrelation => format!("CC[{},1,4]", pair),
            SynCost::MutualInformation => format!("MI[{},1,32,Regular,0.25]", pair),
        }
    }

    /// The argument list passed to antsRegistration.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--dimensionality".into(),
            "3".into(),
            "--float".into(),
            "0".into(),
            "--output".into(),
            self.output_prefix.display().to_string(),
            "--interpolation".into(),
            self.interpolation.clone(),
            "--use-histogram-matching".into(),
            "0".into(),
            "--initial-moving-transform".into(),
            format!("[{},{},1]", self.fixed.display(), self.moving.display()),
        ];

        if self.run_rigid {
            args.extend([
                "--transform".into(),
                "Rigid[0.1]".into(),
                "--metric".into(),
                self.metric(),
                "--convergence".into(),
                format!("[{},{:e},10]", self.rigid_iterations, self.convergence),
                "--shrink-factors".into(),
                "1".into(),
                "--smoothing-sigmas".into(),
                "0vox".into(),
            ]);
        }
        if self.run_affine {
            args.extend([
                "--transform".into(),
                "Affine[0.1]".into(),
                "--metric".into(),
                self.metric(),
                "--convergence".into(),
                format!("[{},{:e},10]", self.affine_iterations, self.convergence),
                "--shrink-factors".into(),
                "1".into(),
                "--smoothing-sigmas".into(),
                "0vox".into(),
            ]);
        }
        if self.run_syn {
            args.extend([
                "--transform".into(),
                "SyN[0.1,3,0]".into(),
                "--metric".into(),
                self.metric(),
                "--convergence".into(),
                format!(
                    "[{}x{}x{},{:e},10]",
                    self.coarse_iterations, self.medium_iterations, self.fine_iterations,
                    self.convergence
                ),
                "--shrink-factors".into(),
                "4x2x1".into(),
                "--smoothing-sigmas".into(),
                "2x1x0vox".into(),
            ]);
        }
        args
    }

    /// Run antsRegistration.
    pub fn run(&self) -> Result<()> {
        let mut command = Command::new("antsRegistration");
        command.args(self.args());
        run_tool(command)
    }
}

/// Warp application with antsApplyTransforms.
#[derive(Debug, Clone)]
pub struct AntsApplyTransforms {
    pub input: PathBuf,
    pub reference: PathBuf,
    pub output: PathBuf,
    pub transforms: Vec<String>,
    pub interpolation: String,
    /// ANTs input image type code; 3 marks a time series, which is how a
    /// coordinate mapping's component axis rides through.
    pub input_image_type: u32,
}

impl AntsApplyTransforms {
    /// Create a warp application.
    pub fn new(
        input: impl Into<PathBuf>,
        reference: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            reference: reference.into(),
            output: output.into(),
            transforms: Vec::new(),
            interpolation: "Linear".into(),
            input_image_type: 0,
        }
    }

    /// Append a transform (applied in reverse order by ANTs).
    pub fn with_transform(mut self, transform: impl Into<PathBuf>) -> Self {
        self.transforms
            .push(transform.into().display().to_string());
        self
    }

    /// Append a transform to apply inverted (ANTs bracket syntax).
    pub fn with_inverse_transform(mut self, transform: impl Into<PathBuf>) -> Self {
        self.transforms
            .push(format!("[{},1]", transform.into().display()));
        self
    }

    /// Treat the input as a time series (for multi-component volumes).
    pub fn as_time_series(mut self) -> Self {
        self.input_image_type = 3;
        self
    }

    /// The argument list passed to antsApplyTransforms.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-d".into(),
            "3".into(),
            "-e".into(),
            self.input_image_type.to_string(),
            "-i".into(),
            self.input.display().to_string(),
            "-r".into(),
            self.reference.display().to_string(),
            "-o".into(),
            self.output.display().to_string(),
            "-n".into(),
            self.interpolation.clone(),
        ];
        for t in &self.transforms {
            args.push("-t".into());
            args.push(t.clone());
        }
        args
    }

    /// Run antsApplyTransforms.
    pub fn run(&self) -> Result<()> {
        let mut command = Command::new("antsApplyTransforms");
        command.args(self.args());
        run_tool(command)
    }
}
