// Article archiver: renders an article's URL to plain text through an
// external program and writes the result under the output directory.
// De-duplication is purely path-existence based; a file that is already
// there is never re-rendered or overwritten.

use crate::api::Article;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The renderer could not be spawned or exited non-zero. Recoverable
    /// per article; the dump loop logs it and moves on.
    #[error("renderer `{renderer}` failed for {url}: {reason}")]
    Renderer {
        renderer: String,
        url: String,
        reason: String,
    },

    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What `archive` did with an article.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The target file already existed; nothing was rendered or written.
    Skipped,
    /// The article was rendered and written to the given path.
    Written(PathBuf),
}

/// Collapse every run of dots, slashes and backslashes in a title into a
/// single hyphen. No other characters are touched.
pub fn sanitize_filename(title: &str) -> String {
    let re = Regex::new(r"[./\\]+").unwrap();
    re.replace_all(title, "-").into_owned()
}

/// Target path for an article inside the output directory:
/// `<output_dir>/<item_id>_<sanitized title>`.
pub fn target_path(output_dir: &Path, article: &Article) -> PathBuf {
    output_dir.join(format!(
        "{}_{}",
        article.item_id,
        sanitize_filename(&article.resolved_title)
    ))
}

/// Run `<renderer> -dump <url>` and capture its standard output as the
/// article's plain-text rendering.
pub fn render(renderer: &str, url: &str) -> Result<Vec<u8>, ArchiveError> {
    let renderer_err = |reason| ArchiveError::Renderer {
        renderer: renderer.to_string(),
        url: url.to_string(),
        reason,
    };
    let output = Command::new(renderer)
        .arg("-dump")
        .arg(url)
        .output()
        .map_err(|e| renderer_err(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = if stderr.trim().is_empty() {
            format!("exit status {}", output.status)
        } else {
            format!("{} ({})", output.status, stderr.trim())
        };
        return Err(renderer_err(reason));
    }
    Ok(output.stdout)
}

/// Archive one article. An existing file at the target path short-circuits
/// the whole operation; otherwise the renderer runs and its output is
/// written. Renderer failure leaves no file behind.
pub fn archive(
    output_dir: &Path,
    renderer: &str,
    article: &Article,
) -> Result<Outcome, ArchiveError> {
    let path = target_path(output_dir, article);
    if path.exists() {
        return Ok(Outcome::Skipped);
    }
    let text = render(renderer, &article.resolved_url)?;
    fs::write(&path, &text).map_err(|e| ArchiveError::Write {
        path: path.clone(),
        source: e,
    })?;
    Ok(Outcome::Written(path))
}
