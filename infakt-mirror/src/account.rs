use std::path::{Path, PathBuf};

use infakt_core::InfaktClient;

use crate::mirror::writer::{WriteResult, write_json_if_changed};
use crate::mirror::{MirrorError, RecordSchema};

pub const ACCOUNT_DETAILS_RESOURCE: &str = "account/details";

// The subscription countdown changes daily and would produce a commit per run.
const ACCOUNT_DETAILS_SCHEMA: RecordSchema =
    RecordSchema::new(&[], &["current_subscription.days_until_expiration"]);

pub fn account_details_path(data_dir: &Path) -> PathBuf {
    data_dir.join("account").join("details.json")
}

pub async fn download_account_details(
    client: &InfaktClient,
    data_dir: &Path,
) -> Result<WriteResult, MirrorError> {
    let path = account_details_path(data_dir);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| MirrorError::DirectoryCreation {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let details = client.get_resource(ACCOUNT_DETAILS_RESOURCE).await?;
    ACCOUNT_DETAILS_SCHEMA
        .validate(&details)
        .map_err(|detail| MirrorError::schema("account details", detail))?;
    write_json_if_changed(&path, &ACCOUNT_DETAILS_SCHEMA.normalize(&details)).await
}
