//! Board diagram rendering.
//!
//! The [`DiagramRenderer`] trait is the seam between the pipeline and the tool
//! that draws boards. The production implementation, [`SgfRenderBackend`],
//! shells out to [sgf-render](https://github.com/julianandrews/sgf-render)
//! once per move:
//!
//! ```text
//! sgf-render game.sgf --move-numbers --first-move-number 12 -n 12 \
//!     --style minimalist -o EPUB/Images/diagram_012.svg
//! ```
//!
//! `-n 12` draws the board as it stands after move 12, and
//! `--first-move-number 12` makes that move the only numbered stone, so every
//! page labels exactly the move it is about.
//!
//! Invocations are synchronous: the pipeline waits for each process to exit
//! before building the page that embeds its output.

use crate::config::RendererConfig;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to start renderer {executable}: {source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("renderer exited with {status} for move {move_number}: {stderr}")]
    Failed {
        move_number: usize,
        status: ExitStatus,
        stderr: String,
    },
    #[error("renderer reported success but wrote no diagram at {0}")]
    MissingOutput(PathBuf),
}

/// One diagram to draw: the board after `move_number` moves of `record`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub record: PathBuf,
    pub move_number: usize,
    pub output: PathBuf,
}

/// Something that can draw the board of a record at a given move.
pub trait DiagramRenderer {
    /// Write the diagram for `request.move_number` to `request.output`.
    fn render(&self, request: &RenderRequest) -> Result<(), RenderError>;
}

/// Renderer backed by the external `sgf-render` executable.
#[derive(Debug, Clone)]
pub struct SgfRenderBackend {
    config: RendererConfig,
}

impl SgfRenderBackend {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn executable(&self) -> &Path {
        &self.config.executable
    }

    /// Full argument list for one request, excluding the executable itself.
    pub fn arguments(&self, request: &RenderRequest) -> Vec<OsString> {
        let number = request.move_number.to_string();
        let mut args: Vec<OsString> = vec![request.record.clone().into_os_string()];
        if self.config.move_numbers {
            args.push("--move-numbers".into());
        }
        args.extend([
            OsString::from("--first-move-number"),
            OsString::from(&number),
            OsString::from("-n"),
            OsString::from(&number),
            OsString::from("--style"),
            OsString::from(&self.config.style),
        ]);
        args.extend(self.config.extra_args.iter().map(OsString::from));
        args.push("-o".into());
        args.push(request.output.clone().into_os_string());
        args
    }

    /// Check whether the executable can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.executable)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }
}

impl DiagramRenderer for SgfRenderBackend {
    fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
        let args = self.arguments(request);
        tracing::debug!(
            executable = %self.config.executable.display(),
            ?args,
            "rendering diagram"
        );

        let output = Command::new(&self.config.executable)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RenderError::Spawn {
                executable: self.config.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                move_number: request.move_number,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !request.output.is_file() {
            return Err(RenderError::MissingOutput(request.output.clone()));
        }
        Ok(())
    }
}
