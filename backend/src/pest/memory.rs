//! In-memory pest store for router tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use super::{
    group_control_methods, ControlMethodRow, ControlMethods, NewPest, Pest, PestRecord,
    PestStore, PestUpdate,
};
use crate::error::{SagipError, SagipResult};

/// Mirrors the two-table layout so listing goes through the same grouping
/// path as the PostgreSQL store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPestStore {
    state: Arc<RwLock<InMemoryPestState>>,
}

#[derive(Debug, Default)]
struct InMemoryPestState {
    next_id: i32,
    pests: BTreeMap<i32, PestRecord>,
    control_methods: Vec<ControlMethodRow>,
}

impl InMemoryPestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of control-method rows stored for `id`.
    pub fn control_method_count(&self, id: i32) -> usize {
        self.state
            .read()
            .map(|state| {
                state
                    .control_methods
                    .iter()
                    .filter(|row| row.id_pest == id)
                    .count()
            })
            .unwrap_or(0)
    }
}

fn lock_error(err: impl std::fmt::Display) -> SagipError {
    SagipError::Internal(format!("pest store lock poisoned: {err}"))
}

fn push_rows(rows: &mut Vec<ControlMethodRow>, id_pest: i32, methods: &ControlMethods) {
    rows.extend(methods.entries().map(|(category, description)| ControlMethodRow {
        id_pest,
        category: category.as_str().to_string(),
        description: description.to_string(),
    }));
}

fn apply(record: &mut PestRecord, update: &PestUpdate) {
    let optional = [
        (&mut record.tagalog_name, &update.tagalog_name),
        (&mut record.pest_img, &update.pest_img),
        (&mut record.identifying_marks, &update.identifying_marks),
        (&mut record.where_to_find, &update.where_to_find),
        (&mut record.damage, &update.damage),
        (&mut record.life_cycle, &update.life_cycle),
        (&mut record.life_cycle_img, &update.life_cycle_img),
        (&mut record.host, &update.host),
    ];
    for (column, value) in optional {
        if value.is_some() {
            column.clone_from(value);
        }
    }
    if let Some(name) = &update.pest_name {
        record.pest_name.clone_from(name);
    }
}

#[async_trait]
impl PestStore for InMemoryPestStore {
    async fn list_pests(&self) -> SagipResult<Vec<Pest>> {
        let state = self.state.read().map_err(lock_error)?;
        let records = state.pests.values().cloned().collect();
        Ok(group_control_methods(records, state.control_methods.clone()))
    }

    async fn distinct_hosts(&self) -> SagipResult<Vec<String>> {
        let state = self.state.read().map_err(lock_error)?;
        let hosts: BTreeSet<String> = state
            .pests
            .values()
            .filter_map(|p| p.host.clone())
            .filter(|h| !h.is_empty())
            .collect();
        Ok(hosts.into_iter().collect())
    }

    async fn create_pest(&self, pest: NewPest) -> SagipResult<i32> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.next_id += 1;
        let id = state.next_id;
        state.pests.insert(
            id,
            PestRecord {
                id_pest: id,
                pest_name: pest.pest_name,
                tagalog_name: pest.tagalog_name,
                pest_img: pest.pest_img,
                identifying_marks: pest.identifying_marks,
                where_to_find: pest.where_to_find,
                damage: pest.damage,
                life_cycle: pest.life_cycle,
                life_cycle_img: pest.life_cycle_img,
                host: pest.host,
            },
        );
        push_rows(&mut state.control_methods, id, &pest.control_methods);
        Ok(id)
    }

    async fn update_pest(&self, id: i32, update: PestUpdate) -> SagipResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let record = state
            .pests
            .get_mut(&id)
            .ok_or_else(|| SagipError::NotFound("Pest not found".to_string()))?;
        apply(record, &update);
        state.control_methods.retain(|row| row.id_pest != id);
        push_rows(&mut state.control_methods, id, &update.control_methods);
        Ok(())
    }

    async fn delete_pest(&self, id: i32) -> SagipResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.control_methods.retain(|row| row.id_pest != id);
        Ok(state.pests.remove(&id).is_some())
    }
}
