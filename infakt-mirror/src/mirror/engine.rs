use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use infakt_core::{InfaktClient, Paginator};
use serde_json::Value;

use super::category::{AttachmentSpec, CategorySpec, DetailSpec, RemoteId, sort_records};
use super::error::{MirrorError, io_err};
use super::index::ArchiveIndex;
use super::paths::{
    DETAILS_DIR_NAME, LIST_FILE_NAME, attachment_file_name, attachments_dir_name, slot_file_name,
    tombstone_file_name,
};
use super::writer::{WriteResult, write_atomic, write_json_if_changed};

#[derive(Debug, Clone, PartialEq)]
pub struct ListedEntity {
    pub id: RemoteId,
    pub record: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub listed: usize,
    pub written: usize,
    pub unchanged: usize,
    pub renamed: usize,
    pub tombstoned: usize,
    pub duplicates: usize,
    pub attachments: usize,
}

pub struct CategoryMirror<'a> {
    client: &'a InfaktClient,
    spec: &'a CategorySpec,
    category_dir: PathBuf,
}

impl<'a> CategoryMirror<'a> {
    pub fn new(client: &'a InfaktClient, spec: &'a CategorySpec, data_dir: &Path) -> Self {
        Self {
            client,
            spec,
            category_dir: data_dir.join(&spec.archive_dir),
        }
    }

    pub fn category_dir(&self) -> &Path {
        &self.category_dir
    }

    pub fn details_dir(&self) -> PathBuf {
        self.category_dir.join(DETAILS_DIR_NAME)
    }

    pub async fn run(&self) -> Result<MirrorReport, MirrorError> {
        self.prepare_dirs().await?;

        let entities = self.fetch_listing().await?;
        let mut report = MirrorReport {
            listed: entities.len(),
            ..MirrorReport::default()
        };
        self.write_snapshot(&entities).await?;

        let Some(detail) = &self.spec.detail else {
            return Ok(report);
        };
        let details_dir = self.details_dir();
        let index = ArchiveIndex::scan(&details_dir, self.spec.id_pattern).await?;
        let fresh = self
            .sync_details(detail, &entities, &index, &mut report)
            .await?;
        self.reconcile_deletions(&index, &fresh, &mut report).await?;
        Ok(report)
    }

    async fn prepare_dirs(&self) -> Result<(), MirrorError> {
        let dir = if self.spec.detail.is_some() {
            self.details_dir()
        } else {
            self.category_dir.clone()
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| MirrorError::DirectoryCreation { path: dir, source })
    }

    pub async fn fetch_listing(&self) -> Result<Vec<ListedEntity>, MirrorError> {
        let endpoint = self.client.resource_url(&self.spec.endpoint)?;
        let raw = Paginator::new(self.client, endpoint, self.spec.page_size)
            .collect_all()
            .await?;

        let mut entities = Vec::with_capacity(raw.len());
        for record in raw {
            self.spec
                .entity_schema
                .validate(&record)
                .map_err(|detail| MirrorError::schema(&self.spec.name, detail))?;
            let id = self.spec.remote_id(&record).ok_or_else(|| {
                MirrorError::schema(
                    &self.spec.name,
                    format!("list record has no usable `{}`", self.spec.id_field),
                )
            })?;
            entities.push(ListedEntity {
                id,
                record: self.spec.entity_schema.normalize(&record),
            });
        }
        sort_records(&mut entities, self.spec.sort, |entity| &entity.record);
        Ok(entities)
    }

    async fn write_snapshot(&self, entities: &[ListedEntity]) -> Result<(), MirrorError> {
        let snapshot = Value::Array(entities.iter().map(|e| e.record.clone()).collect());
        let path = self.category_dir.join(LIST_FILE_NAME);
        write_json_if_changed(&path, &snapshot).await?;
        Ok(())
    }

    async fn sync_details(
        &self,
        detail: &DetailSpec,
        entities: &[ListedEntity],
        index: &ArchiveIndex,
        report: &mut MirrorReport,
    ) -> Result<HashSet<RemoteId>, MirrorError> {
        let details_dir = self.details_dir();
        let mut fresh = HashSet::with_capacity(entities.len());
        let mut claimed: HashMap<String, RemoteId> = HashMap::with_capacity(entities.len());

        for entity in entities {
            if !fresh.insert(entity.id.clone()) {
                tracing::warn!(
                    category = %self.spec.name,
                    id = %entity.id,
                    "id listed more than once, keeping the first occurrence"
                );
                report.duplicates += 1;
                continue;
            }

            let resource = self
                .spec
                .detail_resource(detail, &entity.record)
                .ok_or_else(|| {
                    MirrorError::schema(
                        &self.spec.name,
                        format!("record {} has no usable `{}`", entity.id, detail.key_field),
                    )
                })?;
            let mut fetched = self.client.get_resource(&resource).await?;
            detail
                .schema
                .validate(&fetched)
                .map_err(|reason| {
                    MirrorError::schema(&self.spec.name, format!("detail {}: {reason}", entity.id))
                })?;
            if let Some(attachments) = detail.attachments.filter(|a| a.fetch_separately) {
                let listing = self
                    .client
                    .get_resource(&attachments.listing_resource(&resource))
                    .await?;
                let entries = listing
                    .get("entities")
                    .filter(|entries| entries.is_array())
                    .cloned()
                    .ok_or_else(|| {
                        MirrorError::schema(
                            &self.spec.name,
                            format!("attachment listing of {} has no entities", entity.id),
                        )
                    })?;
                if let Some(object) = fetched.as_object_mut() {
                    object.insert(attachments.field.to_string(), entries);
                }
            }

            let label = detail
                .label
                .filter(|label| label.applies_to(&fetched))
                .map(|label| label.label);
            let display_name = self
                .spec
                .naming
                .display_name(&entity.id, &entity.record, label);
            let file_name = slot_file_name(&display_name)?;
            claim_name(&mut claimed, &self.spec.name, &file_name, &entity.id)?;

            let target = details_dir.join(&file_name);
            if let Some(current) = index.get(&entity.id).filter(|current| *current != file_name) {
                let source = details_dir.join(current);
                tokio::fs::rename(&source, &target)
                    .await
                    .map_err(|err| io_err(&source, err))?;
                self.move_attachments_dir(current, &file_name).await?;
                tracing::info!(
                    category = %self.spec.name,
                    id = %entity.id,
                    from = %current,
                    to = %file_name,
                    "renamed archive slot"
                );
                report.renamed += 1;
            }

            if let Some(attachments) = &detail.attachments {
                let dir = details_dir.join(attachments_dir_name(&file_name));
                report.attachments += self
                    .download_attachments(attachments, &entity.id, &fetched, &dir)
                    .await?;
            }

            let normalized = detail.schema.normalize(&fetched);
            match write_json_if_changed(&target, &normalized).await? {
                WriteResult::Written => report.written += 1,
                WriteResult::Unchanged => report.unchanged += 1,
            }
        }
        Ok(fresh)
    }

    async fn reconcile_deletions(
        &self,
        index: &ArchiveIndex,
        fresh: &HashSet<RemoteId>,
        report: &mut MirrorReport,
    ) -> Result<(), MirrorError> {
        let details_dir = self.details_dir();
        for (id, current) in index.iter() {
            if fresh.contains(id) {
                continue;
            }
            let tombstone = tombstone_file_name(id);
            if current == tombstone {
                continue;
            }

            let target = details_dir.join(&tombstone);
            let exists = tokio::fs::try_exists(&target)
                .await
                .map_err(|err| io_err(&target, err))?;
            if exists {
                tracing::warn!(
                    category = %self.spec.name,
                    %id,
                    slot = %current,
                    "tombstone already exists, leaving slot in place"
                );
                continue;
            }

            let source = details_dir.join(current);
            tokio::fs::rename(&source, &target)
                .await
                .map_err(|err| io_err(&source, err))?;
            self.move_attachments_dir(current, &tombstone).await?;
            tracing::info!(
                category = %self.spec.name,
                %id,
                from = %current,
                "tombstoned archive slot"
            );
            report.tombstoned += 1;
        }
        Ok(())
    }

    async fn download_attachments(
        &self,
        spec: &AttachmentSpec,
        id: &RemoteId,
        record: &Value,
        dir: &Path,
    ) -> Result<usize, MirrorError> {
        let Some(entries) = record.get(spec.field).and_then(Value::as_array) else {
            return Ok(0);
        };

        let mut downloaded = 0;
        for entry in entries {
            let name = entry
                .get(spec.name_field)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    MirrorError::schema(
                        &self.spec.name,
                        format!("attachment of {id} has no `{}`", spec.name_field),
                    )
                })?;
            let target = dir.join(attachment_file_name(name)?);
            let present = tokio::fs::try_exists(&target)
                .await
                .map_err(|err| io_err(&target, err))?;
            if present {
                continue;
            }

            let link = entry
                .get(spec.link_field)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    MirrorError::schema(
                        &self.spec.name,
                        format!("attachment {name:?} of {id} has no `{}`", spec.link_field),
                    )
                })?;
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| MirrorError::DirectoryCreation {
                    path: dir.to_path_buf(),
                    source,
                })?;
            let bytes = self.client.get_bytes(link).await?;
            write_atomic(&target, &bytes).await?;
            tracing::info!(
                category = %self.spec.name,
                %id,
                attachment = %name,
                bytes = bytes.len(),
                "downloaded attachment"
            );
            downloaded += 1;
        }
        Ok(downloaded)
    }

    async fn move_attachments_dir(&self, from_slot: &str, to_slot: &str) -> Result<(), MirrorError> {
        let details_dir = self.details_dir();
        let source = details_dir.join(attachments_dir_name(from_slot));
        let target = details_dir.join(attachments_dir_name(to_slot));
        let source_exists = tokio::fs::try_exists(&source)
            .await
            .map_err(|err| io_err(&source, err))?;
        if !source_exists {
            return Ok(());
        }
        let target_exists = tokio::fs::try_exists(&target)
            .await
            .map_err(|err| io_err(&target, err))?;
        if target_exists {
            tracing::warn!(
                category = %self.spec.name,
                from = %source.display(),
                to = %target.display(),
                "attachment directory already exists, leaving old one in place"
            );
            return Ok(());
        }
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|err| io_err(&source, err))
    }
}

fn claim_name(
    claimed: &mut HashMap<String, RemoteId>,
    category: &str,
    file_name: &str,
    id: &RemoteId,
) -> Result<(), MirrorError> {
    match claimed.get(file_name) {
        Some(owner) if owner != id => Err(MirrorError::schema(
            category,
            format!("ids {owner} and {id} both map to slot {file_name:?}"),
        )),
        _ => {
            claimed.insert(file_name.to_string(), id.clone());
            Ok(())
        }
    }
}
