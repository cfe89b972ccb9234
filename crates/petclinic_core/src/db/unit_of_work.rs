//! Atomic unit-of-work wrapper.
//!
//! Multi-statement writes (cascading deletes, aggregate saves that touch
//! junction rows) run through [`in_unit_of_work`] so they either land in
//! full or not at all.

use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};

const SAVEPOINT_NAME: &str = "petclinic_unit_of_work";

/// Runs `work` atomically on `conn`.
///
/// - On an autocommit connection an IMMEDIATE transaction is opened and
///   committed when `work` succeeds.
/// - When the caller already holds a transaction, a savepoint is used
///   instead so the caller keeps ownership of the outer boundary.
///
/// Any error returned by `work` rolls back every statement it issued.
pub fn in_unit_of_work<T, E>(
    conn: &Connection,
    work: impl FnOnce(&Connection) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<rusqlite::Error>,
{
    if conn.is_autocommit() {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let value = work(&tx)?;
        tx.commit()?;
        return Ok(value);
    }

    conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT_NAME};"))?;
    match work(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {SAVEPOINT_NAME};"))?;
            Ok(value)
        }
        Err(err) => {
            // The original error wins over a failed rollback.
            if let Err(rollback_err) = conn.execute_batch(&format!(
                "ROLLBACK TO {SAVEPOINT_NAME}; RELEASE {SAVEPOINT_NAME};"
            )) {
                warn!(
                    "event=unit_of_work_rollback module=db status=error savepoint={SAVEPOINT_NAME} error={rollback_err}"
                );
            }
            Err(err)
        }
    }
}
