use super::*;
use crate::import::testing::ScriptedPrompter;

#[test]
fn success_needs_no_prompt() {
    let mut prompter = ScriptedPrompter::new(&[]);
    let mut out = Vec::new();
    let v = with_retry(&mut prompter, &mut out, "create group g", |_| Ok(7)).unwrap();
    assert_eq!(v, 7);
    assert!(prompter.asked.is_empty());
    assert!(out.is_empty());
}

#[test]
fn retries_whole_operation_until_it_succeeds() {
    let mut prompter = ScriptedPrompter::new(&[true, true]);
    let mut out = Vec::new();
    let mut attempts = 0;
    let v = with_retry(&mut prompter, &mut out, "upload a.txt", |w| {
        attempts += 1;
        writeln!(w, "attempt {}", attempts)?;
        if attempts < 3 {
            anyhow::bail!("connection reset");
        }
        Ok(attempts)
    })
    .unwrap();

    assert_eq!(v, 3);
    assert_eq!(prompter.asked, vec!["Retry?", "Retry?"]);
    let out = String::from_utf8(out).unwrap();
    assert_eq!(
        out.matches("An error occurred while trying to upload a.txt: connection reset")
            .count(),
        2
    );
    assert!(out.contains("attempt 3"));
}

#[test]
fn declining_cancels_with_last_error() {
    let mut prompter = ScriptedPrompter::new(&[false]);
    let mut out = Vec::new();
    let err = with_retry::<()>(&mut prompter, &mut out, "create project p", |_| {
        anyhow::bail!("server said no")
    })
    .unwrap_err();

    assert!(err.downcast_ref::<Canceled>().is_some());
    assert!(format!("{:#}", err).contains("server said no"));
    let out = String::from_utf8(out).unwrap();
    assert!(out.ends_with("Canceled.\n"));
}
