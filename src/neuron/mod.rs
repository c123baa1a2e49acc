//! NEURON simulator state introspection.
//!
//! [`NeuronEngine`] shells out to the external `nrniv` interpreter: it
//! assembles a hoc script from the bundled helper library plus user-queued
//! hoc files and commands, runs it, and parses the JSON payload the helpers
//! print between sentinel markers. Script assembly and payload parsing are
//! pure; only [`NeuronEngine::run_script`] touches the subprocess, so
//! everything else is testable without a NEURON installation.

pub mod report;

pub use report::*;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::io::Write;

/// Bundled hoc helper library (JSON emitters used by generated scripts).
pub const UTILS_HOC: &str = include_str!("utils.hoc");

const PAYLOAD_BEGIN: &str = "NMLPACK-JSON-BEGIN";
const PAYLOAD_END: &str = "NMLPACK-JSON-END";

/// Handle to the external `nrniv` interpreter plus the model-setup steps
/// (hoc files to load, hoc commands to run) executed before each query.
#[derive(Debug, Clone)]
pub struct NeuronEngine {
    nrniv: Utf8PathBuf,
    hoc_files: Vec<Utf8PathBuf>,
    commands: Vec<String>,
}

impl Default for NeuronEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NeuronEngine {
    /// Engine using `nrniv` from `PATH`.
    pub fn new() -> Self {
        Self {
            nrniv: Utf8PathBuf::from("nrniv"),
            hoc_files: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Use a specific `nrniv` executable.
    pub fn with_executable(mut self, nrniv: impl AsRef<Utf8Path>) -> Self {
        self.nrniv = nrniv.as_ref().to_path_buf();
        self
    }

    /// Queue a hoc file to be loaded before queries.
    ///
    /// Python model files are not supported; any extension other than `.hoc`
    /// is rejected, as is a file that does not exist.
    pub fn load_hoc_file(&mut self, path: impl AsRef<Utf8Path>) -> Result<()> {
        let path = path.as_ref();
        match path.extension() {
            Some("hoc") => {}
            Some("py") => bail!("Loading Python files is not supported: {}", path),
            _ => bail!("Not a hoc file: {}", path),
        }
        if !path.exists() {
            bail!("Hoc file {} not found", path);
        }
        self.hoc_files.push(path.to_path_buf());
        Ok(())
    }

    /// Queue a raw hoc command (e.g. instantiating a cell template) to run
    /// after the hoc files are loaded.
    pub fn exec(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Morphology of `section`, or of the currently accessed section when
    /// `None`.
    pub fn morphology(&self, section: Option<&str>) -> Result<SectionMorphology> {
        let payload = self.run_script(&self.morphology_script(section))?;
        serde_json::from_str(&payload).context("Malformed morphology payload from nrniv")
    }

    /// Distributed mechanism parameters over all instantiated sections.
    pub fn mechanisms(&self) -> Result<MechanismReport> {
        let payload = self.run_script(&self.mechanisms_script())?;
        serde_json::from_str(&payload).context("Malformed mechanism payload from nrniv")
    }

    /// The hoc script for a morphology query.
    pub fn morphology_script(&self, section: Option<&str>) -> String {
        let query = match section {
            Some(sec) => format!("{} {{ nmlpack_morphjson() }}\n", sec),
            None => "nmlpack_morphjson()\n".to_string(),
        };
        self.script_with_query(&query)
    }

    /// The hoc script for a mechanism query.
    pub fn mechanisms_script(&self) -> String {
        self.script_with_query("nmlpack_mechjson()\n")
    }

    fn script_with_query(&self, query: &str) -> String {
        let mut script = String::with_capacity(UTILS_HOC.len() + 256);
        script.push_str(UTILS_HOC);
        script.push('\n');
        for hoc in &self.hoc_files {
            script.push_str(&format!("load_file(\"{}\")\n", hoc));
        }
        for cmd in &self.commands {
            script.push_str(cmd);
            script.push('\n');
        }
        script.push_str(query);
        script.push_str("quit()\n");
        script
    }

    /// Run a hoc script under `nrniv` and return the extracted JSON payload.
    fn run_script(&self, script: &str) -> Result<String> {
        let mut tmp = tempfile::Builder::new()
            .prefix("nmlpack-")
            .suffix(".hoc")
            .tempfile()
            .context("Failed to create temporary hoc script")?;
        tmp.write_all(script.as_bytes())?;
        tmp.flush()?;

        debug!("Running {} on {}", self.nrniv, tmp.path().display());
        let output = std::process::Command::new(self.nrniv.as_str())
            .arg("-nobanner")
            .arg(tmp.path())
            .output()
            .with_context(|| format!("Failed to run {}", self.nrniv))?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.nrniv,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        extract_payload(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract the JSON payload between the sentinel markers of interpreter
/// output.
pub fn extract_payload(stdout: &str) -> Result<String> {
    let begin = stdout
        .find(PAYLOAD_BEGIN)
        .with_context(|| format!("No {} marker in nrniv output", PAYLOAD_BEGIN))?
        + PAYLOAD_BEGIN.len();
    let end = stdout[begin..]
        .find(PAYLOAD_END)
        .with_context(|| format!("No {} marker in nrniv output", PAYLOAD_END))?;
    Ok(stdout[begin..begin + end].trim().to_string())
}

/// Write the bundled hoc helper library into `dir`, returning the path of
/// the written file.
pub fn write_utils_hoc(dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let path = dir.join("utils.hoc");
    std::fs::write(path.as_std_path(), UTILS_HOC)
        .with_context(|| format!("Failed to write {}", path))?;
    Ok(path)
}
