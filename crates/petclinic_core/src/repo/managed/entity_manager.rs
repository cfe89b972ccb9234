//! Persistence context and entity manager.
//!
//! # Invariants
//! - At most one tracked instance per `(table, id)` key.
//! - Removed entities are invisible to `find`/`query` until the context
//!   is cleared.
//! - `flush` writes pending updates first, then pending removals in the
//!   order they were requested.

use super::mapping::ManagedEntity;
use crate::db::in_unit_of_work;
use crate::model::EntityId;
use crate::repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::{Connection, Params};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

type EntityKey = (&'static str, EntityId);

/// Type-erased view of a tracked entity.
trait Tracked: Any {
    fn as_any(&self) -> &dyn Any;
    fn write_update(&self, conn: &Connection) -> RepoResult<()>;
    fn write_delete(&self, conn: &Connection) -> RepoResult<()>;
}

impl<E: ManagedEntity> Tracked for E {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn write_update(&self, conn: &Connection) -> RepoResult<()> {
        let Some(id) = self.id() else {
            return Ok(());
        };
        if self.update(conn)? == 0 {
            return Err(RepoError::not_found(E::NAME, id));
        }
        Ok(())
    }

    fn write_delete(&self, conn: &Connection) -> RepoResult<()> {
        match self.id() {
            Some(id) => E::delete_row(conn, id),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct PersistenceContext {
    entries: HashMap<EntityKey, Box<dyn Tracked>>,
    dirty: Vec<EntityKey>,
    removed: Vec<(EntityKey, Box<dyn Tracked>)>,
}

impl PersistenceContext {
    fn is_removed(&self, key: &EntityKey) -> bool {
        self.removed.iter().any(|(removed, _)| removed == key)
    }

    fn get<E: ManagedEntity>(&self, key: &EntityKey) -> Option<E> {
        self.entries
            .get(key)
            .and_then(|entry| entry.as_any().downcast_ref::<E>())
            .cloned()
    }
}

/// Unit-of-work scoped entity manager over one connection.
pub struct EntityManager<'conn> {
    conn: &'conn Connection,
    context: RefCell<PersistenceContext>,
    depth: Cell<u32>,
}

impl<'conn> EntityManager<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            context: RefCell::new(PersistenceContext::default()),
            depth: Cell::new(0),
        }
    }

    /// Writes pending updates and removals to the connection.
    pub fn flush(&self) -> RepoResult<()> {
        let mut context = self.context.borrow_mut();
        let dirty = std::mem::take(&mut context.dirty);
        for key in &dirty {
            if let Some(entry) = context.entries.get(key) {
                entry.write_update(self.conn)?;
            }
        }
        let removed = std::mem::take(&mut context.removed);
        for (_, entry) in &removed {
            entry.write_delete(self.conn)?;
        }
        if !dirty.is_empty() || !removed.is_empty() {
            debug!(
                "event=context_flush module=repo backend=managed updates={} removals={}",
                dirty.len(),
                removed.len()
            );
        }
        Ok(())
    }

    /// Detaches every tracked entity and drops unflushed changes.
    pub fn clear(&self) {
        *self.context.borrow_mut() = PersistenceContext::default();
    }

    pub(crate) fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Runs `work` in an atomic unit of work and flushes before commit.
    pub(crate) fn transactional<T>(
        &self,
        work: impl FnOnce(&Self) -> RepoResult<T>,
    ) -> RepoResult<T> {
        self.scoped(|em| {
            in_unit_of_work(em.conn, |_| {
                let value = work(em)?;
                em.flush()?;
                Ok(value)
            })
        })
    }

    /// Runs read-only `work` without opening a transaction.
    pub(crate) fn read_only<T>(&self, work: impl FnOnce(&Self) -> RepoResult<T>) -> RepoResult<T> {
        self.scoped(work)
    }

    fn scoped<T>(&self, work: impl FnOnce(&Self) -> RepoResult<T>) -> RepoResult<T> {
        let depth = self.depth.get();
        self.depth.set(depth + 1);
        let result = work(self);
        self.depth.set(depth);
        if depth == 0 || result.is_err() {
            self.clear();
        }
        result
    }

    /// Identity-mapped lookup; loads and resolves relationships on a miss.
    pub(crate) fn find<E: ManagedEntity>(&self, id: EntityId) -> RepoResult<Option<E>> {
        let key = (E::TABLE, id);
        {
            let context = self.context.borrow();
            if context.is_removed(&key) {
                return Ok(None);
            }
            if let Some(entity) = context.get::<E>(&key) {
                return Ok(Some(entity));
            }
        }

        let mut found = self.query::<E, _>("WHERE id = ?1", [id])?;
        Ok(found.pop())
    }

    /// Like [`Self::find`], but a missing row is `NotFound`.
    pub(crate) fn get<E: ManagedEntity>(&self, id: EntityId) -> RepoResult<E> {
        self.find::<E>(id)?
            .ok_or_else(|| RepoError::not_found(E::NAME, id))
    }

    /// Loads every row matching `filter` (a `WHERE`/`ORDER BY` tail).
    ///
    /// Rows already tracked are served from the context.
    pub(crate) fn query<E: ManagedEntity, P: Params>(
        &self,
        filter: &str,
        params: P,
    ) -> RepoResult<Vec<E>> {
        let records = {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {} FROM {} {filter};",
                E::COLUMNS,
                E::TABLE
            ))?;
            let rows = stmt.query_map(params, E::read_record)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut entities = Vec::with_capacity(records.len());
        for (id, record) in records {
            let key = (E::TABLE, id);
            {
                let context = self.context.borrow();
                if context.is_removed(&key) {
                    continue;
                }
                if let Some(entity) = context.get::<E>(&key) {
                    entities.push(entity);
                    continue;
                }
            }
            let entity = E::resolve(self, id, record)?;
            self.track(&entity);
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Inserts a new entity immediately and starts tracking it.
    pub(crate) fn persist<E: ManagedEntity>(&self, entity: &mut E) -> RepoResult<()> {
        let id = entity.insert(self.conn)?;
        entity.assign_id(id);
        self.track(entity);
        Ok(())
    }

    /// Persists new entities and merges existing ones.
    ///
    /// Returns the write mode for logging.
    pub(crate) fn save<E: ManagedEntity>(&self, entity: &mut E) -> RepoResult<&'static str> {
        if entity.is_new() {
            self.persist(entity)?;
            Ok("insert")
        } else {
            self.merge(entity)?;
            Ok("update")
        }
    }

    /// Copies the state of an existing entity into the context for flush.
    pub(crate) fn merge<E: ManagedEntity>(&self, entity: &E) -> RepoResult<()> {
        let Some(id) = entity.id() else {
            return Err(RepoError::InvalidData(format!(
                "cannot merge a new {} without identity",
                E::NAME
            )));
        };
        let key = (E::TABLE, id);
        let mut context = self.context.borrow_mut();
        context.entries.insert(key, Box::new(entity.clone()));
        if !context.dirty.contains(&key) {
            context.dirty.push(key);
        }
        Ok(())
    }

    pub(crate) fn contains<E: ManagedEntity>(&self, entity: &E) -> bool {
        entity
            .id()
            .is_some_and(|id| self.context.borrow().entries.contains_key(&(E::TABLE, id)))
    }

    /// Schedules the entity's row for deletion on the next flush.
    pub(crate) fn remove<E: ManagedEntity>(&self, entity: &E) {
        let Some(id) = entity.id() else {
            return;
        };
        let key = (E::TABLE, id);
        let mut context = self.context.borrow_mut();
        if context.is_removed(&key) {
            return;
        }
        context.dirty.retain(|dirty| dirty != &key);
        let entry = context
            .entries
            .remove(&key)
            .unwrap_or_else(|| Box::new(entity.clone()) as Box<dyn Tracked>);
        context.removed.push((key, entry));
    }

    /// Flushes pending changes, then runs a bulk statement that bypasses
    /// the context.
    pub(crate) fn execute_bulk<P: Params>(&self, sql: &str, params: P) -> RepoResult<usize> {
        self.flush()?;
        Ok(self.conn.execute(sql, params)?)
    }

    fn track<E: ManagedEntity>(&self, entity: &E) {
        if let Some(id) = entity.id() {
            self.context
                .borrow_mut()
                .entries
                .insert((E::TABLE, id), Box::new(entity.clone()));
        }
    }
}
