//! Preview of a matched tree, printed before anything remote is touched.

use std::io::Write;

use anyhow::Result;

use crate::model::{Presence, ScanSummary, ScanTree};

const BRANCH: &str = "├── ";
const INDENT: &str = "│   ";

fn annotation(presence: &Presence) -> &'static str {
    match presence {
        Presence::Exists(_) => " (using)",
        Presence::Create => " (creating)",
        Presence::Unknown => "",
    }
}

fn line(out: &mut dyn Write, depth: usize, text: &str, presence: Option<&Presence>) -> Result<()> {
    writeln!(
        out,
        "{}{}{}{}",
        INDENT.repeat(depth),
        BRANCH,
        text,
        presence.map(annotation).unwrap_or("")
    )?;
    Ok(())
}

/// Writes the tree, the files that will be ignored, and the per-kind counts.
pub fn render_preview(tree: &ScanTree, summary: &ScanSummary, out: &mut dyn Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "The following data hierarchy was found:")?;
    writeln!(out)?;

    for group in &tree.groups {
        line(out, 0, &group.name, Some(&group.presence))?;
        for project in &group.projects {
            line(out, 1, &project.label, Some(&project.presence))?;
            for file in &project.attachments {
                line(out, 2, &file.name, None)?;
            }
            for subject in &project.subjects {
                line(out, 2, &subject.code, None)?;
                for session in &subject.sessions {
                    line(out, 3, &session.label, Some(&session.presence))?;
                    for file in &session.attachments {
                        line(out, 4, &file.name, None)?;
                    }
                    for acq in &session.acquisitions {
                        line(out, 4, &acq.label, Some(&acq.presence))?;
                        for file in &acq.attachments {
                            line(out, 5, &file.name, None)?;
                        }
                        for packfile in &acq.packfiles {
                            line(out, 5, &format!("(*) {}", packfile.kind), None)?;
                        }
                    }
                }
            }
        }
    }

    if !tree.rejected.is_empty() {
        writeln!(out)?;
        for rejected in &tree.rejected {
            writeln!(
                out,
                "File {} ignored as attachments to {} are not allowed",
                rejected.path.display(),
                rejected.level.as_plural()
            )?;
        }
    }

    let counts = [
        (summary.groups, "group"),
        (summary.projects, "project"),
        (summary.subjects, "subject"),
        (summary.sessions, "session"),
        (summary.acquisitions, "acquisition"),
        (summary.attachments, "attachment"),
        (summary.packfiles, "packfile"),
    ];
    let mut parts: Vec<String> = counts.iter().map(|(n, kind)| plural(*n, kind)).collect();
    let last = parts.pop().unwrap_or_default();
    writeln!(out)?;
    writeln!(out, "This scan consists of: {}, and {}.", parts.join(", "), last)?;
    writeln!(out)?;
    Ok(())
}

fn plural(n: u64, kind: &str) -> String {
    if n == 1 {
        format!("{} {}", n, kind)
    } else {
        format!("{} {}s", n, kind)
    }
}

#[cfg(test)]
#[path = "../tests/import/report_tests.rs"]
mod tests;
