//! Decides, node by node, whether a container already exists remotely.

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::{AcquisitionNode, GroupNode, Presence, ProjectNode, ScanTree, SessionNode};
use crate::remote::{RemoteApi, RemoteNode};

/// Settles the presence of every container in `tree`.
///
/// Paths are built from local names. Once a container is known to be missing, its
/// descendants are marked for creation without asking the remote. Resolver errors are fatal.
pub fn match_tree(tree: &mut ScanTree, remote: &impl RemoteApi) -> Result<()> {
    for group in &mut tree.groups {
        match_group(group, remote)?;
    }
    Ok(())
}

fn match_group(group: &mut GroupNode, remote: &impl RemoteApi) -> Result<()> {
    let path = vec![group.name.clone()];
    let (presence, _) = lookup(remote, &path, "group")?;
    group.presence = presence;

    for project in &mut group.projects {
        if group.presence.exists() {
            match_project(project, &path, remote)?;
        } else {
            create_project_subtree(project);
        }
    }
    Ok(())
}

fn match_project(
    project: &mut ProjectNode,
    group_path: &[String],
    remote: &impl RemoteApi,
) -> Result<()> {
    let mut path = group_path.to_vec();
    path.push(project.label.clone());
    let (presence, children) = lookup(remote, &path, "project")?;
    project.presence = presence;

    if !project.presence.exists() {
        create_project_subtree(project);
        return Ok(());
    }

    // Subjects are not addressable: sessions are matched among the project's children by
    // label and subject code.
    for subject in &mut project.subjects {
        for session in &mut subject.sessions {
            let found = children.iter().find_map(|child| match child {
                RemoteNode::Session { id, label, .. }
                    if *label == session.label
                        && child.subject_code() == Some(session.subject_code.as_str()) =>
                {
                    Some(id.clone())
                }
                _ => None,
            });
            match found {
                Some(id) => {
                    debug!(session = %session.label, subject = %session.subject_code, %id, "session exists");
                    let mut session_path = path.clone();
                    session_path.push(format!("<id:{}>", id));
                    session.presence = Presence::Exists(id);
                    for acq in &mut session.acquisitions {
                        match_acquisition(acq, &session_path, remote)?;
                    }
                }
                None => create_session_subtree(session),
            }
        }
    }
    Ok(())
}

fn match_acquisition(
    acq: &mut AcquisitionNode,
    session_path: &[String],
    remote: &impl RemoteApi,
) -> Result<()> {
    let mut path = session_path.to_vec();
    path.push(acq.label.clone());
    let (presence, _) = lookup(remote, &path, "acquisition")?;
    acq.presence = presence;
    Ok(())
}

/// Resolves `path`; the terminal node must be of `kind` to count as existing.
fn lookup(
    remote: &impl RemoteApi,
    path: &[String],
    kind: &str,
) -> Result<(Presence, Vec<RemoteNode>)> {
    let result = remote
        .resolve(path)
        .with_context(|| format!("resolve {}", path.join("/")))?;

    let presence = match result.terminal(path.len()) {
        Some(node) if node.kind() == kind => match node.id() {
            Some(id) => Presence::Exists(id.clone()),
            None => Presence::Create,
        },
        _ => Presence::Create,
    };
    debug!(path = %path.join("/"), kind, exists = presence.exists(), "matched");
    Ok((presence, result.children))
}

fn create_project_subtree(project: &mut ProjectNode) {
    project.presence = Presence::Create;
    for session in project.subjects.iter_mut().flat_map(|s| &mut s.sessions) {
        create_session_subtree(session);
    }
}

fn create_session_subtree(session: &mut SessionNode) {
    session.presence = Presence::Create;
    for acq in &mut session.acquisitions {
        acq.presence = Presence::Create;
    }
}

#[cfg(test)]
#[path = "../tests/import/matcher_tests.rs"]
mod tests;
