//! Persistence port (§6): CRUD for the tabular entities the core hands off
//! to durable storage, kept distinct from the TTL `CacheStore` because its
//! contract (typed rows, not opaque strings) is wider.
//!
//! `InMemoryPersistence` is this crate's only concrete implementation — a
//! reference adapter for tests and embedding, not the production store. A
//! real deployment swaps in a SQL-backed port outside this crate (§1).

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::model::{FixedBlock, PlanResult, Settings, Task};

/// One planning request's durable record: the inputs that produced a
/// `PlanResult`, kept so the UI collaborator can redisplay or re-export it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: Uuid,
    pub date: chrono::NaiveDate,
    pub result: PlanResult,
}

/// get/put/delete on Settings (single row), Task, FixedBlock, and Plan.
/// `PlanItem`s are not stored separately — they live inside `Plan::result`,
/// since the scheduler always regenerates them as a unit.
pub trait PersistencePort: Send + Sync {
    fn get_settings(&self) -> Option<Settings>;
    fn put_settings(&self, settings: Settings);

    fn get_task(&self, id: Uuid) -> Option<Task>;
    fn list_tasks(&self) -> Vec<Task>;
    fn put_task(&self, task: Task);
    fn delete_task(&self, id: Uuid);

    fn get_fixed_block(&self, id: Uuid) -> Option<FixedBlock>;
    fn list_fixed_blocks(&self, date: chrono::NaiveDate) -> Vec<FixedBlock>;
    fn put_fixed_block(&self, block: FixedBlock);
    fn delete_fixed_block(&self, id: Uuid);

    fn get_plan(&self, id: Uuid) -> Option<Plan>;
    fn put_plan(&self, plan: Plan);
    fn delete_plan(&self, id: Uuid);
}

/// A `RwLock`-guarded in-memory store, mirroring `cache::InMemoryCacheStore`'s
/// concurrency discipline: lock-free-consistent reads, last-write-wins.
#[derive(Default)]
pub struct InMemoryPersistence {
    settings: RwLock<Option<Settings>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
    fixed_blocks: RwLock<HashMap<Uuid, FixedBlock>>,
    plans: RwLock<HashMap<Uuid, Plan>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistencePort for InMemoryPersistence {
    fn get_settings(&self) -> Option<Settings> {
        self.settings.read().ok()?.clone()
    }

    fn put_settings(&self, settings: Settings) {
        if let Ok(mut guard) = self.settings.write() {
            *guard = Some(settings);
        }
    }

    fn get_task(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().ok()?.get(&id).cloned()
    }

    fn list_tasks(&self) -> Vec<Task> {
        self.tasks.read().map(|t| t.values().cloned().collect()).unwrap_or_default()
    }

    fn put_task(&self, task: Task) {
        if let Ok(mut guard) = self.tasks.write() {
            guard.insert(task.id, task);
        }
    }

    fn delete_task(&self, id: Uuid) {
        if let Ok(mut guard) = self.tasks.write() {
            guard.remove(&id);
        }
    }

    fn get_fixed_block(&self, id: Uuid) -> Option<FixedBlock> {
        self.fixed_blocks.read().ok()?.get(&id).cloned()
    }

    fn list_fixed_blocks(&self, date: chrono::NaiveDate) -> Vec<FixedBlock> {
        self.fixed_blocks
            .read()
            .map(|blocks| blocks.values().filter(|b| b.date == date).cloned().collect())
            .unwrap_or_default()
    }

    fn put_fixed_block(&self, block: FixedBlock) {
        if let Ok(mut guard) = self.fixed_blocks.write() {
            guard.insert(block.id, block);
        }
    }

    fn delete_fixed_block(&self, id: Uuid) {
        if let Ok(mut guard) = self.fixed_blocks.write() {
            guard.remove(&id);
        }
    }

    fn get_plan(&self, id: Uuid) -> Option<Plan> {
        self.plans.read().ok()?.get(&id).cloned()
    }

    fn put_plan(&self, plan: Plan) {
        if let Ok(mut guard) = self.plans.write() {
            guard.insert(plan.id, plan);
        }
    }

    fn delete_plan(&self, id: Uuid) {
        if let Ok(mut guard) = self.plans.write() {
            guard.remove(&id);
        }
    }
}
