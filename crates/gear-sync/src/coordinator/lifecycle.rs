//! Creating, removing, renaming and reindexing containers and entries

use gear_order::{
    Container, ContainerId, Entry, EntryId, Payload, Scope, ValidationError,
    next_container_position, next_entry_position, plan_reindex_containers, plan_reindex_entries,
    plan_remove_container, plan_remove_entry,
};

use super::{Coordinator, MoveReport, Recovery, unknown_entry};
use crate::Result;
use crate::events::ListEvent;
use crate::persistence::{ContainerPatch, NewContainer, NewEntry, Persistence};

impl<P: Persistence> Coordinator<P> {
    /// Append a new entry to the end of a container
    pub async fn add_entry(&self, container_id: &ContainerId, payload: Payload) -> Result<Entry> {
        let _guard = self
            .queue
            .acquire(&[Scope::Entries(container_id.clone())])
            .await?;
        let position = next_entry_position(&*self.state.lock().await, container_id)?;

        let entry = self
            .call(self.store.create_entry(NewEntry {
                container_id: container_id.clone(),
                position,
                payload,
            }))
            .await?;

        {
            let mut state = self.state.lock().await;
            let mut entries = state.entries(container_id).to_vec();
            entries.push(entry.clone());
            state.replace_entries(container_id.clone(), entries);
        }

        tracing::info!(entry = %entry.id, container = %container_id, position, "Added entry");
        self.events.publish(ListEvent::EntryAdded {
            entry_id: entry.id.clone(),
            container_id: container_id.clone(),
        });
        Ok(entry)
    }

    /// Append a new container to the end of the list
    pub async fn add_container(&self, title: &str) -> Result<Container> {
        let title = normalize_title(title)?;
        let _guard = self
            .queue
            .acquire(&[Scope::Containers(self.list_id.clone())])
            .await?;
        let position = next_container_position(&*self.state.lock().await);

        let container = self
            .call(self.store.create_container(NewContainer {
                list_id: self.list_id.clone(),
                title,
                position,
            }))
            .await?;

        {
            let mut state = self.state.lock().await;
            let mut containers = state.containers().to_vec();
            containers.push(container.clone());
            state.replace_containers(containers);
        }

        tracing::info!(container = %container.id, position, "Added container");
        self.events.publish(ListEvent::ContainerAdded {
            container_id: container.id.clone(),
        });
        Ok(container)
    }

    /// Delete an entry and close the gap it leaves
    pub async fn remove_entry(&self, entry_id: &EntryId) -> Result<MoveReport> {
        let container_id = self
            .state
            .lock()
            .await
            .locate_entry(entry_id)
            .map(|(container_id, _)| container_id.clone())
            .ok_or_else(|| unknown_entry(entry_id))?;

        let report = self
            .run(
                "remove_entry",
                vec![Scope::Entries(container_id.clone())],
                Recovery::Scopes,
                |state| plan_remove_entry(state, entry_id),
            )
            .await?;

        self.events.publish(ListEvent::EntryRemoved {
            entry_id: entry_id.clone(),
            container_id,
        });
        Ok(report)
    }

    /// Delete a container with all of its entries and close the gap.
    ///
    /// A failure here re-reads the whole list since the deletion cascades.
    pub async fn remove_container(&self, container_id: &ContainerId) -> Result<MoveReport> {
        let scopes = vec![
            Scope::Containers(self.list_id.clone()),
            Scope::Entries(container_id.clone()),
        ];
        let report = self
            .run("remove_container", scopes, Recovery::Full, |state| {
                plan_remove_container(state, container_id)
            })
            .await?;

        self.events.publish(ListEvent::ContainerRemoved {
            container_id: container_id.clone(),
        });
        Ok(report)
    }

    /// Change a container's title
    pub async fn rename_container(&self, container_id: &ContainerId, title: &str) -> Result<()> {
        let title = normalize_title(title)?;
        let scope = Scope::Containers(self.list_id.clone());
        let guard = self.queue.acquire(std::slice::from_ref(&scope)).await?;

        let previous = {
            let mut state = self.state.lock().await;
            let previous = state
                .container(container_id)
                .map(|c| c.title.clone())
                .ok_or_else(|| ValidationError::UnknownContainer {
                    id: container_id.clone(),
                })?;
            state.set_container_title(container_id, title.clone());
            previous
        };

        let written = self
            .call(
                self.store
                    .update_container(container_id, ContainerPatch::title(title.clone())),
            )
            .await;
        if let Err(source) = written {
            tracing::warn!(container = %container_id, error = %source, "Rename failed; rolling back");
            return Err(self.recover(Recovery::Scopes, guard, &[scope], source).await);
        }

        tracing::info!(container = %container_id, from = %previous, to = %title, "Renamed container");
        self.events.publish(ListEvent::ContainerRenamed {
            container_id: container_id.clone(),
            title,
        });
        Ok(())
    }

    /// Rewrite one container's entry positions to `0..len`
    pub async fn reindex_container(&self, container_id: &ContainerId) -> Result<MoveReport> {
        self.run(
            "reindex_entries",
            vec![Scope::Entries(container_id.clone())],
            Recovery::Scopes,
            |state| plan_reindex_entries(state, container_id),
        )
        .await
    }

    /// Rewrite the list's container positions to `0..len`
    pub async fn reindex_containers(&self) -> Result<MoveReport> {
        self.run(
            "reindex_containers",
            vec![Scope::Containers(self.list_id.clone())],
            Recovery::Scopes,
            |state| Ok(plan_reindex_containers(state)),
        )
        .await
    }

    /// Repair every sequence of the list
    pub async fn reindex_all(&self) -> Result<Vec<MoveReport>> {
        let mut reports = vec![self.reindex_containers().await?];
        let containers: Vec<ContainerId> = self
            .snapshot()
            .await
            .containers()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        for container_id in &containers {
            reports.push(self.reindex_container(container_id).await?);
        }
        Ok(reports)
    }
}

fn normalize_title(title: &str) -> std::result::Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}
