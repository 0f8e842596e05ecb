//! CFI generator
//!
//! Segmenting an EPUB into CFI-tagged text nodes is done by the external
//! `epub-cfi-generator` tool, run out-of-process:
//!
//! ```text
//! epub-cfi-generator <book.epub> <output.json>
//! ```
//!
//! The output is an array of headings, each with a `content` array of
//! `{ "node": <text>, "cfi": <locator> }` entries.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::GeneratorConfig;
use crate::error::{AppError, Result};
use crate::locator::Section;

/// Source of the section/node tree for a book
#[async_trait]
pub trait CfiGenerator: Send + Sync {
    async fn generate(&self, epub: &Path) -> Result<Vec<Section>>;
}

/// Runs the external generator executable
#[derive(Debug, Clone)]
pub struct ExternalGenerator {
    executable: PathBuf,
    output_dir: PathBuf,
}

impl ExternalGenerator {
    pub fn new(executable: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(&config.executable, &config.output_dir)
    }

    /// Where the generator output for `epub` is written
    pub fn output_path(&self, epub: &Path) -> PathBuf {
        self.output_dir
            .join(format!("{}_cfi_output.json", book_name(epub)))
    }
}

#[async_trait]
impl CfiGenerator for ExternalGenerator {
    async fn generate(&self, epub: &Path) -> Result<Vec<Section>> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output_path = self.output_path(epub);

        tracing::info!(
            epub = %epub.display(),
            generator = %self.executable.display(),
            "Generating CFIs"
        );

        let output = Command::new(&self.executable)
            .arg(epub)
            .arg(&output_path)
            .output()
            .await
            .map_err(|e| {
                AppError::Generator(format!(
                    "failed to run {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Generator(format!(
                "{} exited with {}: {}",
                self.executable.display(),
                output.status,
                stderr.trim()
            )));
        }

        let json = tokio::fs::read_to_string(&output_path).await?;
        let sections: Vec<Section> = serde_json::from_str(&json)?;

        if let Err(e) = tokio::fs::remove_file(&output_path).await {
            tracing::warn!(
                path = %output_path.display(),
                "Failed to remove generator output: {}",
                e
            );
        }

        tracing::debug!(sections = sections.len(), "Generator output parsed");
        Ok(sections)
    }
}

/// File stem with whitespace runs replaced by `_`
pub fn book_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = String::with_capacity(stem.len());
    let mut in_whitespace = false;
    for ch in stem.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                name.push('_');
            }
            in_whitespace = true;
        } else {
            name.push(ch);
            in_whitespace = false;
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_book_name() {
        assert_eq!(book_name(Path::new("/books/Moby Dick.epub")), "Moby_Dick");
        assert_eq!(book_name(Path::new("A  Tale\tof Two.kepub.epub")), "A_Tale_of_Two.kepub");
        assert_eq!(book_name(Path::new("plain.epub")), "plain");
    }

    #[test]
    fn test_output_path() {
        let generator = ExternalGenerator::new("gen", "/tmp/out");
        assert_eq!(
            generator.output_path(Path::new("/books/My Book.epub")),
            PathBuf::from("/tmp/out/My_Book_cfi_output.json")
        );
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-generator.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_external_generator() {
        let temp_dir = TempDir::new().unwrap();
        let executable = script(
            temp_dir.path(),
            r#"echo '[{"content":[{"node":"Hello there","cfi":"/6/2!/4/2/1"}]}]' > "$2""#,
        );
        let output_dir = temp_dir.path().join("out");
        let generator = ExternalGenerator::new(&executable, &output_dir);

        let epub = temp_dir.path().join("book.epub");
        std::fs::write(&epub, b"not really an epub").unwrap();

        let sections = generator.generate(&epub).await.unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content[0].text, "Hello there");
        assert_eq!(sections[0].content[0].locator.as_str(), "/6/2!/4/2/1");

        // Transient output is cleaned up
        assert!(!generator.output_path(&epub).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generator_failure() {
        let temp_dir = TempDir::new().unwrap();
        let executable = script(temp_dir.path(), "echo 'bad epub' >&2\nexit 3");
        let generator = ExternalGenerator::new(&executable, temp_dir.path().join("out"));

        let err = generator
            .generate(&temp_dir.path().join("book.epub"))
            .await
            .unwrap_err();

        match err {
            AppError::Generator(msg) => assert!(msg.contains("bad epub")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let temp_dir = TempDir::new().unwrap();
        let generator = ExternalGenerator::new(
            temp_dir.path().join("does-not-exist"),
            temp_dir.path().join("out"),
        );

        let err = generator
            .generate(&temp_dir.path().join("book.epub"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generator(_)));
    }
}
