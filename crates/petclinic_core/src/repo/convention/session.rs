//! Convention session: generated CRUD over declarative table rules.

use super::rules::{Conventional, RowValues};
use super::BACKEND;
use crate::db::in_unit_of_work;
use crate::model::EntityId;
use crate::repo::{like_prefix_pattern, placeholders, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Params, ToSql};
use std::cell::RefCell;
use std::collections::HashMap;

/// Flat rows read or written through the session, keyed by table and id.
#[derive(Debug, Default)]
pub struct ReadCache {
    rows: HashMap<(&'static str, EntityId), Vec<Value>>,
}

impl ReadCache {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    fn get(&self, table: &'static str, id: EntityId) -> Option<Vec<Value>> {
        self.rows.get(&(table, id)).cloned()
    }

    fn put(&mut self, table: &'static str, id: EntityId, values: Vec<Value>) {
        self.rows.insert((table, id), values);
    }

    fn evict(&mut self, table: &'static str, id: EntityId) {
        self.rows.remove(&(table, id));
    }
}

/// One connection plus its read cache.
pub struct ConventionSession<'conn> {
    conn: &'conn Connection,
    cache: RefCell<ReadCache>,
}

impl<'conn> ConventionSession<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            cache: RefCell::new(ReadCache::default()),
        }
    }

    /// Number of rows currently held by the read cache.
    pub fn cached_rows(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub(crate) fn connection(&self) -> &'conn Connection {
        self.conn
    }

    pub(crate) fn find_by_id<E: Conventional>(&self, id: EntityId) -> RepoResult<E> {
        let rules = &E::RULES;
        let cached = self.cache.borrow().get(rules.table, id);
        let values = match cached {
            Some(values) => values,
            None => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE id = ?1;",
                    rules.columns.join(", "),
                    rules.table
                );
                let width = rules.columns.len();
                let values = self
                    .conn
                    .query_row(&sql, [id], |row| {
                        (0..width)
                            .map(|index| row.get::<_, Value>(index))
                            .collect::<rusqlite::Result<Vec<_>>>()
                    })
                    .optional()?;
                let Some(values) = values else {
                    debug!(
                        "event=row_find module=repo backend={BACKEND} status=not_found table={} id={id}",
                        rules.table
                    );
                    return Err(RepoError::not_found(rules.entity, id));
                };
                self.cache.borrow_mut().put(rules.table, id, values.clone());
                values
            }
        };
        E::from_values(self, RowValues::new(rules.entity, id, values))
    }

    pub(crate) fn find_all<E: Conventional>(&self) -> RepoResult<Vec<E>> {
        self.select("", [])
    }

    /// Equality finder on one mapped column.
    pub(crate) fn find_by<E: Conventional, V: ToSql>(
        &self,
        column: &str,
        value: V,
    ) -> RepoResult<Vec<E>> {
        self.select(&format!("WHERE {column} = ?1"), [value])
    }

    /// Prefix finder on one text column.
    pub(crate) fn find_by_prefix<E: Conventional>(
        &self,
        column: &str,
        prefix: &str,
    ) -> RepoResult<Vec<E>> {
        self.select(
            &format!("WHERE {column} LIKE ?1 ESCAPE '\\'"),
            [like_prefix_pattern(prefix)],
        )
    }

    /// Membership finder on one column.
    pub(crate) fn find_in<E: Conventional, V: ToSql>(
        &self,
        column: &str,
        values: &[V],
    ) -> RepoResult<Vec<E>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        self.select(
            &format!("WHERE {column} IN ({})", placeholders(values.len())),
            params_from_iter(values),
        )
    }

    /// Rows linked to `owner_id` through a junction table.
    pub(crate) fn find_linked<E: Conventional>(
        &self,
        junction: &str,
        target_column: &str,
        owner_column: &str,
        owner_id: EntityId,
    ) -> RepoResult<Vec<E>> {
        self.select(
            &format!(
                "WHERE id IN (SELECT {target_column} FROM {junction} WHERE {owner_column} = ?1)"
            ),
            [owner_id],
        )
    }

    fn select<E: Conventional, P: Params>(&self, filter: &str, params: P) -> RepoResult<Vec<E>> {
        let rules = &E::RULES;
        let width = rules.columns.len();
        let rows = {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT id, {} FROM {} {filter} ORDER BY {};",
                rules.columns.join(", "),
                rules.table,
                rules.default_order
            ))?;
            let rows = stmt
                .query_map(params, |row| {
                    let id = row.get::<_, EntityId>(0)?;
                    let values = (1..=width)
                        .map(|index| row.get::<_, Value>(index))
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    Ok((id, values))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut entities = Vec::with_capacity(rows.len());
        for (id, values) in rows {
            self.cache.borrow_mut().put(rules.table, id, values.clone());
            entities.push(E::from_values(self, RowValues::new(rules.entity, id, values))?);
        }
        Ok(entities)
    }

    /// Generated insert-or-update keyed by identity; returns the write mode.
    pub(crate) fn save<E: Conventional>(&self, entity: &mut E) -> RepoResult<&'static str> {
        let rules = &E::RULES;
        let values = entity.to_values()?;

        let (id, mode) = in_unit_of_work(self.conn, |conn| {
            let (id, mode) = match entity.id() {
                None => {
                    conn.execute(
                        &format!(
                            "INSERT INTO {} ({}) VALUES ({});",
                            rules.table,
                            rules.columns.join(", "),
                            placeholders(rules.columns.len())
                        ),
                        params_from_iter(&values),
                    )?;
                    (conn.last_insert_rowid(), "insert")
                }
                Some(id) => {
                    let assignments = rules
                        .columns
                        .iter()
                        .enumerate()
                        .map(|(index, column)| format!("{column} = ?{}", index + 1))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let mut bound = values.clone();
                    bound.push(Value::Integer(id));
                    let changed = conn.execute(
                        &format!(
                            "UPDATE {} SET {assignments} WHERE id = ?{};",
                            rules.table,
                            bound.len()
                        ),
                        params_from_iter(bound),
                    )?;
                    if changed == 0 {
                        return Err(RepoError::not_found(rules.entity, id));
                    }
                    (id, "update")
                }
            };
            entity.write_links(conn, id)?;
            Ok((id, mode))
        })?;

        if entity.is_new() {
            entity.assign_id(id);
        }
        self.cache.borrow_mut().put(rules.table, id, values);
        Ok(mode)
    }

    /// Generated single-row delete. Only correct for rows nothing references.
    pub(crate) fn delete_row<E: Conventional>(&self, entity: &E) -> RepoResult<()> {
        let Some(id) = entity.id() else {
            return Ok(());
        };
        let rules = &E::RULES;
        self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", rules.table),
            [id],
        )?;
        self.cache.borrow_mut().evict(rules.table, id);
        Ok(())
    }

    /// Runs an override delete atomically, then clears the read cache.
    pub(crate) fn override_delete<T>(
        &self,
        work: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let result = in_unit_of_work(self.conn, work);
        self.clear_cache();
        result
    }
}

/// Ids selected by a single-column query.
pub(crate) fn collect_ids(
    conn: &Connection,
    sql: &str,
    params: impl Params,
) -> RepoResult<Vec<EntityId>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params, |row| row.get::<_, EntityId>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// `DELETE FROM table WHERE column IN (ids)`; an empty id list is a no-op.
pub(crate) fn bulk_delete_in(
    conn: &Connection,
    table: &str,
    column: &str,
    ids: &[EntityId],
) -> RepoResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    Ok(conn.execute(
        &format!(
            "DELETE FROM {table} WHERE {column} IN ({});",
            placeholders(ids.len())
        ),
        params_from_iter(ids),
    )?)
}

#[cfg(test)]
mod tests {
    use super::ReadCache;
    use rusqlite::types::Value;

    #[test]
    fn read_cache_tracks_rows_per_table_and_id() {
        let mut cache = ReadCache::default();
        cache.put("owners", 1, vec![Value::Text("George".to_string())]);
        cache.put("pets", 1, vec![Value::Text("Leo".to_string())]);
        cache.put("owners", 1, vec![Value::Text("Georgina".to_string())]);
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.get("owners", 1),
            Some(vec![Value::Text("Georgina".to_string())])
        );

        cache.evict("pets", 1);
        assert_eq!(cache.get("pets", 1), None);
        cache.clear();
        assert!(cache.is_empty());
    }
}
