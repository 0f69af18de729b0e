//! Mirror network folders onto the local disk.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::FolderCopy;
use crate::runner::RetryPolicy;
use crate::steps::{StepDefinition, StepOutcome};

use super::{StepContext, FOLDERS};

pub fn step(copies: &[FolderCopy], ctx: &StepContext) -> StepDefinition {
    let copies = copies.to_vec();
    let retry = ctx.retry.clone();
    let sources: Vec<String> = copies
        .iter()
        .map(|c| c.source.display().to_string())
        .collect();
    let detail = match copies.len() {
        0 => "nothing configured".to_string(),
        1 => format!("1 folder from {}", sources[0]),
        n => format!("{} folders", n),
    };

    StepDefinition::new(FOLDERS, "Copy network folders", move || {
        Ok(copy_all(&copies, &retry))
    })
    .with_detail(detail)
    .with_preflight_paths(sources)
}

/// Copy every entry; one entry failing does not stop the others.
pub fn copy_all(copies: &[FolderCopy], retry: &RetryPolicy) -> StepOutcome {
    if copies.is_empty() {
        return StepOutcome::skipped("no folders configured");
    }

    StepOutcome::combine(copies.iter().map(|copy| copy_one(copy, retry)))
}

fn copy_one(copy: &FolderCopy, retry: &RetryPolicy) -> StepOutcome {
    let label = format!("Copy {}", copy.source.display());
    info!(
        "Copying {} -> {}",
        copy.source.display(),
        copy.destination.display()
    );

    let result = retry.execute_if(
        &label,
        || copy_tree(&copy.source, &copy.destination),
        is_transient,
    );

    match result {
        Ok(done) if done.attempts > 1 => {
            let retries = done.attempts - 1;
            warn!(
                "Copied {} files to {} after {} retries",
                done.value,
                copy.destination.display(),
                retries
            );
            StepOutcome::warning(format!(
                "{}: retried {}x",
                copy.destination.display(),
                retries
            ))
        }
        Ok(done) => {
            info!(
                "Copied {} files to {}",
                done.value,
                copy.destination.display()
            );
            StepOutcome::Success
        }
        Err(e) => StepOutcome::failed(format!(
            "{} -> {}: {}",
            copy.source.display(),
            copy.destination.display(),
            e
        )),
    }
}

/// Replace `destination` with a recursive copy of `source`.
///
/// Returns the number of files copied.
pub fn copy_tree(source: &Path, destination: &Path) -> io::Result<u64> {
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source folder {} is not reachable", source.display()),
        ));
    }

    if destination.exists() {
        fs::remove_dir_all(destination)?;
    }

    let mut files = 0;
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }

    Ok(files)
}

/// Share hiccups surface as almost any I/O error; access denial does not heal.
fn is_transient(e: &io::Error) -> bool {
    e.kind() != io::ErrorKind::PermissionDenied
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn policy() -> RetryPolicy {
        context(Rc::new(ScriptedRunner::default()), SetProbe::default()).retry
    }

    #[test]
    fn copy_tree_replaces_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("nested/b.txt"), "b").unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("stale.txt"), "old").unwrap();

        let copied = copy_tree(&src, &dst).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
        assert!(!dst.join("stale.txt").exists());
    }

    #[test]
    fn missing_source_fails_after_retries() {
        let temp = TempDir::new().unwrap();
        let copy = FolderCopy {
            source: temp.path().join("absent"),
            destination: temp.path().join("dst"),
        };

        let outcome = copy_all(&[copy], &policy());

        assert!(outcome.is_failure());
        assert!(outcome.reason().unwrap().contains("not reachable"));
    }

    #[test]
    fn one_bad_entry_does_not_stop_the_rest() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good");
        fs::create_dir_all(&good).unwrap();
        fs::write(good.join("f"), "x").unwrap();
        let copies = [
            FolderCopy {
                source: temp.path().join("absent"),
                destination: temp.path().join("out1"),
            },
            FolderCopy {
                source: good,
                destination: temp.path().join("out2"),
            },
        ];

        let outcome = copy_all(&copies, &policy());

        assert!(outcome.is_failure());
        assert!(temp.path().join("out2/f").exists());
    }

    #[test]
    fn nothing_configured_is_skipped() {
        assert!(copy_all(&[], &policy()).is_skipped());
    }

    #[test]
    fn step_declares_sources_for_preflight() {
        let ctx = context(Rc::new(ScriptedRunner::default()), SetProbe::default());
        let copies = [FolderCopy {
            source: r"\\srv\apps".into(),
            destination: r"C:\Apps".into(),
        }];

        let step = step(&copies, &ctx);

        assert_eq!(step.preflight_paths(), [r"\\srv\apps".to_string()]);
    }
}
