// OCR engine abstraction.
//
// The default engine drives the system `tesseract` binary, feeding PNG bytes
// on stdin and reading text from stdout. The child is spawned with
// kill_on_drop, so when the caller's timeout drops the future the process is
// killed rather than left running.
//
// The trait exists so tests (and future engines) can stand in for tesseract.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};

/// Default OCR binary.
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";

/// Default OCR language model (German).
pub const DEFAULT_LANGUAGE: &str = "deu";

/// Errors from OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    NotAvailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An image-to-text engine.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize the text in a PNG-encoded image using `language`.
    async fn recognize(&self, png: Vec<u8>, language: &str) -> Result<String, OcrError>;
}

/// Tesseract via its command-line interface.
pub struct TesseractEngine {
    program: String,
}

impl TesseractEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the configured binary can be found (PATH lookup or explicit path).
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    /// First line of `tesseract --version`.
    pub async fn version(&self) -> Result<String, OcrError> {
        let output = self.run(&["--version"]).await?;
        // Older releases print the version banner on stderr
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        text.lines()
            .next()
            .map(|l| l.trim().to_string())
            .ok_or_else(|| OcrError::Failed("empty --version output".to_string()))
    }

    /// Installed language models, from `tesseract --list-langs`.
    pub async fn languages(&self) -> Result<Vec<String>, OcrError> {
        let output = self.run(&["--list-langs"]).await?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(parse_language_list(&text))
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, OcrError> {
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "{} {} failed: {}",
                self.program,
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(output)
    }

    fn spawn_error(&self, e: std::io::Error) -> OcrError {
        if e.kind() == std::io::ErrorKind::NotFound {
            OcrError::NotAvailable(format!("{} not found (install tesseract-ocr)", self.program))
        } else {
            OcrError::Io(e)
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TESSERACT_CMD)
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, png: Vec<u8>, language: &str) -> Result<String, OcrError> {
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Failed("tesseract stdin unavailable".to_string()))?;

        // Write and read concurrently so a large image can't deadlock the pipes
        let (written, output) = tokio::join!(feed_stdin(stdin, png), child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!("tesseract failed: {}", stderr.trim())));
        }
        written?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

async fn feed_stdin(mut stdin: ChildStdin, png: Vec<u8>) -> std::io::Result<()> {
    stdin.write_all(&png).await?;
    stdin.shutdown().await
}

/// Parse `--list-langs` output: a header line ending in ':' then one code per line.
fn parse_language_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.ends_with(':'))
        .map(str::to_string)
        .collect()
}
