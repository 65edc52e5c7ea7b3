use super::*;
use crate::import::testing::{Call, FakeRemote, ScriptedPrompter, example_folder, touch};

fn run(
    remote: &FakeRemote,
    root: &Path,
    opts: &ImportOptions,
    answers: &[bool],
) -> (Result<InflateReport>, String) {
    let mut prompter = ScriptedPrompter::new(answers);
    let mut out = Vec::new();
    let result = import_folder(remote, root, opts, &mut prompter, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn declining_the_preview_makes_no_mutations() -> Result<()> {
    let dir = example_folder()?;
    let remote = FakeRemote::new();

    let (result, out) = run(&remote, dir.path(), &ImportOptions::default(), &[false]);

    assert!(result.unwrap_err().downcast_ref::<Canceled>().is_some());
    assert!(remote.mutations().is_empty());
    assert!(out.contains("├── groupA (creating)"));
    assert!(out.ends_with("Canceled.\n"));
    Ok(())
}

#[test]
fn confirmed_import_inflates_the_tree() -> Result<()> {
    let dir = example_folder()?;
    let remote = FakeRemote::new();

    let (result, out) = run(&remote, dir.path(), &ImportOptions::default(), &[true]);
    let report = result?;

    assert_eq!(report.containers_created(), 4);
    assert_eq!(report.attachments_uploaded, 1);
    assert_eq!(report.packfiles_uploaded, 1);
    assert!(out.contains("Beginning upload."));
    assert!(out.contains("Done: 4 containers created, 1 files and 1 packfiles uploaded."));
    Ok(())
}

#[test]
fn assume_yes_skips_the_confirmation() -> Result<()> {
    let dir = example_folder()?;
    let remote = FakeRemote::new();
    let opts = ImportOptions {
        assume_yes: true,
        ..ImportOptions::default()
    };

    let mut prompter = ScriptedPrompter::new(&[]);
    let mut out = Vec::new();
    import_folder(&remote, dir.path(), &opts, &mut prompter, &mut out)?;

    assert!(prompter.asked.is_empty());
    assert_eq!(
        remote.mutations().first(),
        Some(&Call::CreateGroup("groupA".to_string()))
    );
    Ok(())
}

#[test]
fn empty_folder_has_nothing_to_import() -> Result<()> {
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "loose.txt", b"x")?;
    let remote = FakeRemote::new();

    let (result, out) = run(&remote, dir.path(), &ImportOptions::default(), &[]);

    assert_eq!(result?, InflateReport::default());
    assert!(remote.calls().is_empty());
    assert!(out.contains("ignored as attachments to root are not allowed"));
    assert!(out.contains("Nothing to import."));
    Ok(())
}

#[test]
fn resolver_failure_is_fatal_before_preview() -> Result<()> {
    let dir = example_folder()?;
    let remote = FakeRemote::new();
    remote.break_resolver();

    let (result, out) = run(&remote, dir.path(), &ImportOptions::default(), &[true]);

    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("match local tree against remote"));
    assert!(!out.contains("The following data hierarchy was found:"));
    Ok(())
}

#[test]
fn excludes_apply_inside_packfiles() -> Result<()> {
    let dir = example_folder()?;
    touch(dir.path(), "groupA/projA/subj1/sess1/acq1/other.tmp", b"x")?;
    touch(dir.path(), "groupA/projA/subj1/sess1/acq1/dicom/junk.tmp", b"x")?;
    let remote = FakeRemote::new();
    let opts = ImportOptions {
        discover: DiscoverOptions::new(&["*.tmp".to_string()], false)?,
        assume_yes: true,
        ..ImportOptions::default()
    };

    run(&remote, dir.path(), &opts, &[]).0?;

    let mut uploaded = Vec::new();
    let mut streamed = Vec::new();
    for call in remote.calls() {
        match call {
            Call::Upload { names, .. } => uploaded.extend(names),
            Call::PackfileStream { names, .. } => streamed.extend(names),
            _ => {}
        }
    }
    assert_eq!(uploaded, vec!["scan.dat"]);
    assert_eq!(streamed, vec!["1.dcm", "2.dcm"]);
    Ok(())
}
