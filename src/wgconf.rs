//! WireGuard config rendering and patching
//!
//! Renders a canonical block sequence as the comma-joined value of an
//! `AllowedIPs` directive, and patches config templates by swapping
//! that one directive line (plus its generated comment) while leaving
//! every other line byte-for-byte unchanged.

use crate::policy::Block;
use chrono::Utc;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Failed to patch config: {0}")]
    IoError(#[from] std::io::Error),
}

/// Comment written above the generated directive; previous runs are
/// recognized (and removed) by this prefix.
const GENERATED_COMMENT_PREFIX: &str = "# Split tunneling:";

/// Render blocks as a comma-space-joined `AllowedIPs` value.
pub fn render_allowed_ips(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|blk| blk.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replace the `AllowedIPs` line of a config template.
///
/// The first `AllowedIPs` line is replaced by a dated comment plus the
/// fresh directive; any further `AllowedIPs` lines and stale generated
/// comments are dropped. Everything else passes through unchanged.
pub fn patch_template(template: &str, allowed_ips: &str) -> String {
    patch_template_dated(
        template,
        allowed_ips,
        &Utc::now().format("%Y-%m-%d").to_string(),
    )
}

fn patch_template_dated(template: &str, allowed_ips: &str, date: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut replaced = false;
    for line in template.lines() {
        let stripped = line.trim_start();
        if stripped.starts_with("AllowedIPs") {
            if !replaced {
                out.push(format!(
                    "{} bypass ranges go direct, the rest through the tunnel (generated {})",
                    GENERATED_COMMENT_PREFIX, date
                ));
                out.push(format!("AllowedIPs = {}", allowed_ips));
                replaced = true;
            }
        } else if stripped.starts_with(GENERATED_COMMENT_PREFIX) {
            // stale comment from a previous run
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n") + "\n"
}

/// Patch `template_path` and write the result to `output_path`.
pub fn patch_file(
    template_path: &Path,
    output_path: &Path,
    allowed_ips: &str,
    label: &str,
) -> Result<(), PatchError> {
    let content = std::fs::read_to_string(template_path)?;
    let patched = patch_template(&content, allowed_ips);
    std::fs::write(output_path, patched)?;
    info!("Wrote {}: {}", label, output_path.display());
    Ok(())
}
