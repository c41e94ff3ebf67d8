use std::path::Path;

use git2::{Commit, IndexAddOption, Oid, Repository, Signature};
use thiserror::Error;
use time::{OffsetDateTime, UtcOffset};
use time::macros::format_description;

const FALLBACK_NAME: &str = "infakt-mirror";
const FALLBACK_EMAIL: &str = "infakt-mirror@localhost";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("failed to format commit time: {0}")]
    Time(#[from] time::error::Format),
}

pub fn commit_message(success: bool, at: OffsetDateTime) -> Result<String, HistoryError> {
    let stamp = at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
    ))?;
    let status = if success { "SUCCESS" } else { "ERROR" };
    Ok(format!("Syncing InFakt at {stamp} - {status}"))
}

pub fn open_or_init(data_dir: &Path) -> Result<Repository, HistoryError> {
    match Repository::open(data_dir) {
        Ok(repo) => Ok(repo),
        Err(_) => Ok(Repository::init(data_dir)?),
    }
}

pub fn commit_run(data_dir: &Path, success: bool, at: OffsetDateTime) -> Result<Oid, HistoryError> {
    let repo = open_or_init(data_dir)?;

    let mut index = repo.index()?;
    index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"], None)?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };
    let parents: Vec<&Commit<'_>> = parent.iter().collect();

    let signature = repo
        .signature()
        .or_else(|_| Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))?;
    let message = commit_message(success, at)?;
    let oid = repo.commit(Some("HEAD"), &signature, &signature, &message, &tree, &parents)?;
    tracing::info!(commit = %oid, %message, "recorded run in history");
    Ok(oid)
}

// The local offset can only be determined while the process is
// single-threaded, so it is read once at startup and passed in.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn now_at(offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::{datetime, offset};

    #[test]
    fn message_carries_timestamp_and_status() {
        let at = datetime!(2024-03-05 07:08:09 +01:00);
        assert_eq!(
            commit_message(true, at).unwrap(),
            "Syncing InFakt at 2024-03-05 07:08:09 +0100 - SUCCESS"
        );
        assert_eq!(
            commit_message(false, at).unwrap(),
            "Syncing InFakt at 2024-03-05 07:08:09 +0100 - ERROR"
        );
    }

    #[test]
    fn timestamp_keeps_the_captured_offset() {
        let at = now_at(offset!(+02:00));
        assert_eq!(at.offset(), offset!(+02:00));
        assert!(commit_message(true, at).unwrap().contains(" +0200 - "));
    }

    #[test]
    fn first_run_initializes_repository() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("accounting/JPK")).unwrap();
        std::fs::write(dir.path().join("accounting/JPK/list.json"), "[]\n").unwrap();

        let oid = commit_run(dir.path(), true, datetime!(2024-03-05 07:08:09 UTC)).unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let commit = repo.find_commit(oid).unwrap();
        assert_eq!(commit.parent_count(), 0);
        assert!(commit.message().unwrap().ends_with("- SUCCESS"));
        assert!(
            commit
                .tree()
                .unwrap()
                .get_path(Path::new("accounting/JPK/list.json"))
                .is_ok()
        );
    }

    #[test]
    fn renames_are_captured_and_every_run_is_recorded() {
        let dir = tempdir().unwrap();
        let details = dir.path().join("details");
        std::fs::create_dir_all(&details).unwrap();
        std::fs::write(details.join("7.json"), "{}\n").unwrap();
        let first = commit_run(dir.path(), true, datetime!(2024-03-05 07:08:09 UTC)).unwrap();

        std::fs::rename(details.join("7.json"), details.join("(DELETED) 7.json")).unwrap();
        let second = commit_run(dir.path(), false, datetime!(2024-03-06 07:08:09 UTC)).unwrap();
        let third = commit_run(dir.path(), false, datetime!(2024-03-07 07:08:09 UTC)).unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let second = repo.find_commit(second).unwrap();
        assert_eq!(second.parent_id(0).unwrap(), first);
        let tree = second.tree().unwrap();
        assert!(tree.get_path(Path::new("details/7.json")).is_err());
        assert!(tree.get_path(Path::new("details/(DELETED) 7.json")).is_ok());

        let third = repo.find_commit(third).unwrap();
        assert_eq!(third.tree_id(), second.tree_id());
        assert!(third.message().unwrap().ends_with("- ERROR"));
    }
}
