use super::*;
use crate::import::matcher::match_tree;
use crate::import::retry::Canceled;
use crate::import::testing::{Call, FakeRemote, ScriptedPrompter, example_folder, scan};

fn inflate(
    remote: &FakeRemote,
    tree: ScanTree,
    answers: &[bool],
) -> (Result<InflateReport>, String, ScriptedPrompter) {
    let mut prompter = ScriptedPrompter::new(answers);
    let mut out = Vec::new();
    let result = Inflater::new(remote, &mut prompter, &mut out).run(tree);
    (result, String::from_utf8(out).unwrap(), prompter)
}

fn matched_example(remote: &FakeRemote) -> Result<(tempfile::TempDir, ScanTree)> {
    let dir = example_folder()?;
    let mut tree = scan(dir.path())?;
    match_tree(&mut tree, remote)?;
    remote.clear_calls();
    Ok((dir, tree))
}

#[test]
fn fresh_remote_gets_every_container_then_uploads_in_order() -> Result<()> {
    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;

    let (result, out, prompter) = inflate(&remote, tree, &[]);
    let report = result?;

    assert_eq!(
        report,
        InflateReport {
            groups_created: 1,
            projects_created: 1,
            sessions_created: 1,
            acquisitions_created: 1,
            attachments_uploaded: 1,
            packfiles_uploaded: 1,
        }
    );
    assert!(prompter.asked.is_empty());

    let project = RemoteId::new("project-1");
    let expected_metadata = PackfileContext {
        group_id: RemoteId::new("groupA"),
        project_id: project.clone(),
        project_label: "projA".to_string(),
        session_label: "sess1".to_string(),
        subject_code: "subj1".to_string(),
        acquisition_label: "acq1".to_string(),
    }
    .finalize("dicom");
    assert_eq!(
        remote.mutations(),
        vec![
            Call::CreateGroup("groupA".to_string()),
            Call::CreateProject {
                group: RemoteId::new("groupA"),
                label: "projA".to_string(),
            },
            Call::CreateSession {
                project: project.clone(),
                label: "sess1".to_string(),
                subject: "subj1".to_string(),
            },
            Call::CreateAcquisition {
                session: RemoteId::new("session-2"),
                label: "acq1".to_string(),
            },
            Call::Upload {
                dest: ContainerRef::Acquisition(RemoteId::new("acquisition-3")),
                names: vec!["scan.dat".to_string()],
            },
            Call::PackfileStart(project.clone()),
            Call::PackfileStream {
                project: project.clone(),
                token: "token-4".to_string(),
                names: vec!["1.dcm".to_string(), "2.dcm".to_string()],
            },
            Call::PackfileFinish {
                project,
                token: "token-4".to_string(),
                metadata: expected_metadata,
            },
        ]
    );

    assert!(out.contains("Creating group groupA"));
    assert!(out.contains("Creating acquisition acq1"));
    assert!(out.contains("Upload file scan.dat"));
    assert!(out.contains("Upload packfile dicom"));
    assert!(out.contains("  Streaming 2 files from"));
    Ok(())
}

#[test]
fn second_run_creates_nothing() -> Result<()> {
    let remote = FakeRemote::new();
    let (dir, tree) = matched_example(&remote)?;
    inflate(&remote, tree, &[]).0?;

    let mut tree = scan(dir.path())?;
    match_tree(&mut tree, &remote)?;
    assert_eq!(tree.pending_creates(), 0);
    remote.clear_calls();

    let report = inflate(&remote, tree, &[]).0?;
    assert_eq!(report.containers_created(), 0);
    assert!(!remote.calls().iter().any(Call::is_create));
    Ok(())
}

#[test]
fn packfile_metadata_is_complete_and_sent_after_streaming() -> Result<()> {
    let metadata = PackfileContext {
        group_id: RemoteId::new("g"),
        project_id: RemoteId::new("p1"),
        project_label: "proj".to_string(),
        session_label: "ses".to_string(),
        subject_code: "s01".to_string(),
        acquisition_label: "acq".to_string(),
    }
    .finalize("dicom");
    let json = serde_json::to_value(&metadata)?;
    assert_eq!(
        json,
        serde_json::json!({
            "group": {"_id": "g"},
            "project": {"_id": "p1", "label": "proj"},
            "session": {"label": "ses", "subject": {"code": "s01"}},
            "acquisition": {"label": "acq"},
            "packfile": {"type": "dicom"},
        })
    );

    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;
    inflate(&remote, tree, &[]).0?;
    let calls = remote.mutations();
    let stream = calls
        .iter()
        .position(|c| matches!(c, Call::PackfileStream { .. }))
        .unwrap();
    let finish = calls
        .iter()
        .position(|c| matches!(c, Call::PackfileFinish { .. }))
        .unwrap();
    assert!(stream < finish);
    Ok(())
}

#[test]
fn failed_create_is_retried_after_confirmation() -> Result<()> {
    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;
    remote.fail("create_session", 1);

    let (result, out, prompter) = inflate(&remote, tree, &[true]);
    let report = result?;

    assert_eq!(report.sessions_created, 1);
    assert_eq!(prompter.asked, vec!["Retry?"]);
    let attempts = remote
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::CreateSession { .. }))
        .count();
    assert_eq!(attempts, 2);
    assert!(out.contains("An error occurred while trying to create session sess1"));
    Ok(())
}

#[test]
fn packfile_retry_restarts_from_a_fresh_token() -> Result<()> {
    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;
    remote.fail("packfile_finish", 1);

    let report = inflate(&remote, tree, &[true]).0?;
    assert_eq!(report.packfiles_uploaded, 1);

    let tokens: Vec<(&'static str, String)> = remote
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::PackfileStart(_) => Some(("start", String::new())),
            Call::PackfileStream { token, .. } => Some(("stream", token)),
            Call::PackfileFinish { token, .. } => Some(("finish", token)),
            _ => None,
        })
        .collect();
    assert_eq!(
        tokens,
        vec![
            ("start", String::new()),
            ("stream", "token-4".to_string()),
            ("finish", "token-4".to_string()),
            ("start", String::new()),
            ("stream", "token-5".to_string()),
            ("finish", "token-5".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn declining_retry_stops_before_dependents() -> Result<()> {
    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;
    remote.fail("create_project", 1);

    let (result, out, _) = inflate(&remote, tree, &[false]);
    let err = result.unwrap_err();

    assert!(err.downcast_ref::<Canceled>().is_some());
    assert!(out.contains("Canceled."));
    assert!(
        !remote
            .calls()
            .iter()
            .any(|c| matches!(c, Call::CreateSession { .. } | Call::Upload { .. }))
    );
    Ok(())
}

#[test]
fn empty_packfile_token_never_streams() -> Result<()> {
    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;
    remote.hand_out_empty_tokens();

    let (result, out, _) = inflate(&remote, tree, &[false]);
    assert!(result.is_err());
    assert!(out.contains("packfile token was empty or missing"));
    assert!(
        !remote
            .calls()
            .iter()
            .any(|c| matches!(c, Call::PackfileStream { .. }))
    );
    Ok(())
}

#[test]
fn unmatched_tree_is_refused() -> Result<()> {
    let dir = example_folder()?;
    let tree = scan(dir.path())?;
    let remote = FakeRemote::new();

    let err = inflate(&remote, tree, &[]).0.unwrap_err();
    assert!(err.to_string().contains("was never matched"));
    assert!(remote.mutations().is_empty());
    Ok(())
}

#[test]
fn failed_stream_never_finishes_the_packfile() -> Result<()> {
    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;
    remote.fail("packfile_stream", 1);

    let (result, out, prompter) = inflate(&remote, tree, &[false]);

    assert!(result.unwrap_err().downcast_ref::<Canceled>().is_some());
    assert_eq!(prompter.asked, vec!["Retry?"]);
    assert!(out.contains("An error occurred while trying to upload packfile dicom"));
    let calls = remote.calls();
    assert!(calls.iter().any(|c| matches!(c, Call::PackfileStream { .. })));
    assert!(!calls.iter().any(|c| matches!(c, Call::PackfileFinish { .. })));
    Ok(())
}

#[test]
fn failed_attachment_upload_is_retried() -> Result<()> {
    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;
    remote.fail("upload", 1);

    let (result, out, prompter) = inflate(&remote, tree, &[true]);
    let report = result?;

    assert_eq!(report.attachments_uploaded, 1);
    assert_eq!(report.packfiles_uploaded, 1);
    assert_eq!(prompter.asked, vec!["Retry?"]);
    let uploads: Vec<Call> = remote
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Upload { .. }))
        .collect();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0], uploads[1]);
    assert!(out.contains("An error occurred while trying to upload scan.dat"));
    Ok(())
}

#[test]
fn declined_upload_retry_stops_the_run() -> Result<()> {
    let remote = FakeRemote::new();
    let (_dir, tree) = matched_example(&remote)?;
    remote.fail("upload", 1);

    let (result, _, _) = inflate(&remote, tree, &[false]);

    assert!(result.unwrap_err().downcast_ref::<Canceled>().is_some());
    assert!(
        !remote
            .calls()
            .iter()
            .any(|c| matches!(c, Call::PackfileStart(_)))
    );
    Ok(())
}

#[test]
fn partially_matched_tree_is_refused_before_any_call() -> Result<()> {
    let dir = example_folder()?;
    let mut tree = scan(dir.path())?;
    tree.groups[0].presence = Presence::Create;
    let remote = FakeRemote::new();

    let err = inflate(&remote, tree, &[]).0.unwrap_err();
    assert!(err.to_string().contains("never matched"));
    assert!(remote.mutations().is_empty());
    Ok(())
}

#[test]
fn empty_packfile_still_runs_the_full_protocol() -> Result<()> {
    let dir = example_folder()?;
    std::fs::create_dir_all(dir.path().join("groupA/projA/subj1/sess1/acq1/physio"))?;
    let remote = FakeRemote::new();
    let mut tree = scan(dir.path())?;
    match_tree(&mut tree, &remote)?;
    remote.clear_calls();

    let report = inflate(&remote, tree, &[]).0?;
    assert_eq!(report.packfiles_uploaded, 2);

    let physio: Vec<Call> = remote
        .calls()
        .into_iter()
        .filter(|c| match c {
            Call::PackfileStream { names, .. } => names.is_empty(),
            Call::PackfileFinish { metadata, .. } => metadata.packfile.kind == "physio",
            _ => false,
        })
        .collect();
    assert_eq!(physio.len(), 2);
    assert!(matches!(physio[0], Call::PackfileStream { .. }));
    Ok(())
}
