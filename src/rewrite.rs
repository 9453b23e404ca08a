//! Template rewriter
//!
//! Two layers:
//!
//! - A pure line transform (`match_line`, `rewrite_text`) that knows nothing
//!   about files.
//! - `TemplateRewriter`, which reads one template through a `FileSystem`,
//!   writes the output file and moves the template into the archive directory.
//!
//! # Matching rules
//!
//! A line is replaced by `NAME=VALUE` when `NAME` is a prefix of the line.
//! Required pairs are scanned first, in plan order, and the first hit wins;
//! optional pairs are scanned only when enabled. With `replace_commented`, one
//! leading `#` is ignored for matching and dropped from a substituted line.
//! Unmatched lines are copied byte for byte.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{ConfigError, Result};
use crate::fs::FileSystem;
use crate::overrides::OverridePair;
use crate::plan::SubstitutionPlan;

/// Rewriting switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Also substitute optional macros
    pub replace_optional: bool,
    /// Also substitute macros on lines commented out with a single `#`
    pub replace_commented: bool,
}

/// A substitution performed on one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// 1-based line number in the template
    pub line: usize,
    pub name: String,
}

/// Result of rewriting a whole template body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rewritten {
    pub text: String,
    pub substitutions: Vec<Substitution>,
}

/// Find the pair that replaces `line`, if any.
///
/// `line` must not include its terminator.
pub fn match_line<'p>(
    line: &str,
    plan: &'p SubstitutionPlan,
    options: RewriteOptions,
) -> Option<&'p OverridePair> {
    let candidate = if options.replace_commented {
        line.strip_prefix('#').unwrap_or(line)
    } else {
        line
    };

    let hit = |pairs: &'p [OverridePair]| pairs.iter().find(|p| candidate.starts_with(&p.name));

    hit(plan.required.as_slice()).or_else(|| {
        if options.replace_optional {
            hit(plan.optional.as_slice())
        } else {
            None
        }
    })
}

fn split_terminator(chunk: &str) -> (&str, &str) {
    if let Some(body) = chunk.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = chunk.strip_suffix('\n') {
        (body, "\n")
    } else {
        (chunk, "")
    }
}

/// Rewrite a template body, preserving line order and untouched lines.
///
/// A substituted line keeps the original terminator; a substituted final line
/// without one gets `\n`.
pub fn rewrite_text(text: &str, plan: &SubstitutionPlan, options: RewriteOptions) -> Rewritten {
    let mut out = Rewritten {
        text: String::with_capacity(text.len()),
        substitutions: Vec::new(),
    };

    for (idx, chunk) in text.split_inclusive('\n').enumerate() {
        let (body, terminator) = split_terminator(chunk);
        match match_line(body, plan, options) {
            Some(pair) => {
                out.text.push_str(&pair.to_line());
                out.text.push_str(if terminator.is_empty() { "\n" } else { terminator });
                out.substitutions.push(Substitution {
                    line: idx + 1,
                    name: pair.name.clone(),
                });
            }
            None => out.text.push_str(chunk),
        }
    }

    out
}

/// What happened to one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub template: PathBuf,
    pub output: PathBuf,
    pub archived: PathBuf,
    pub substitutions: usize,
}

/// Rewrites template files and archives them
pub struct TemplateRewriter<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    plan: &'a SubstitutionPlan,
    settings: &'a Settings,
    options: RewriteOptions,
}

impl<'a, F: FileSystem + ?Sized> TemplateRewriter<'a, F> {
    pub fn new(
        fs: &'a F,
        plan: &'a SubstitutionPlan,
        settings: &'a Settings,
        options: RewriteOptions,
    ) -> Self {
        Self {
            fs,
            plan,
            settings,
            options,
        }
    }

    /// Output path for a template, next to it
    pub fn output_path(&self, template: &Path) -> Result<PathBuf> {
        let name = template
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let output_name =
            self.settings
                .output_name(name)
                .ok_or_else(|| ConfigError::InvalidTemplateName {
                    name: name.to_string(),
                })?;
        Ok(parent_dir(template).join(output_name))
    }

    /// Rewrite one template, write its output and archive the original.
    ///
    /// The output is written before the move, so an `ArchiveMoveFailed`
    /// leaves both the output and the template in place.
    pub fn rewrite(&self, template: &Path) -> Result<RewriteOutcome> {
        let output = self.output_path(template)?;

        let text = self
            .fs
            .read_to_string(template)
            .map_err(|e| ConfigError::template_unreadable(template, e))?;

        let rewritten = rewrite_text(&text, self.plan, self.options);
        for sub in &rewritten.substitutions {
            debug!("{:?}:{} substituted {}", template, sub.line, sub.name);
        }
        self.fs.write(&output, &rewritten.text)?;

        let archived = self.archive(template)?;
        info!(
            "Wrote {:?} ({} substitutions), archived template to {:?}",
            output,
            rewritten.substitutions.len(),
            archived
        );

        Ok(RewriteOutcome {
            template: template.to_path_buf(),
            output,
            archived,
            substitutions: rewritten.substitutions.len(),
        })
    }

    fn archive(&self, template: &Path) -> Result<PathBuf> {
        let archive_dir = parent_dir(template).join(&self.settings.archive_dir);
        if !self.fs.is_dir(&archive_dir) {
            return Err(ConfigError::archive_move_failed(
                template,
                &archive_dir,
                "archive directory is missing",
            ));
        }

        let target = archive_dir.join(template.file_name().unwrap_or_default());
        self.fs
            .rename(template, &target)
            .map_err(|e| ConfigError::archive_move_failed(template, &archive_dir, e.to_string()))?;
        Ok(target)
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}
