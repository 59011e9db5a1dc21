// ==========================================
// 地磅称重系统 - 序列号仓储
// ==========================================
// 对齐: ir_sequence 表 (code → prefix + 补零流水号)
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct SequenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SequenceRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 取下一个编号（事务内自增）
    ///
    /// # 返回
    /// - Ok(Some(String)): 例如 `WGH/00001`
    /// - Ok(None): 序列未定义
    pub fn next_by_code(&self, code: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let value = Self::next_by_code_tx(&tx, code)?;
        tx.commit()?;
        Ok(value)
    }

    /// 在调用方事务中取号
    pub(crate) fn next_by_code_tx(conn: &Connection, code: &str) -> RepositoryResult<Option<String>> {
        let row: Option<(String, i64, i64)> = conn
            .query_row(
                "SELECT prefix, padding, next_number FROM ir_sequence WHERE code = ?1",
                params![code],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let (prefix, padding, number) = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        conn.execute(
            "UPDATE ir_sequence SET next_number = next_number + 1 WHERE code = ?1",
            params![code],
        )?;

        Ok(Some(format!(
            "{}{:0width$}",
            prefix,
            number,
            width = padding.max(0) as usize
        )))
    }

    /// 新增或覆盖序列定义
    pub fn upsert(&self, code: &str, prefix: &str, padding: i64, next_number: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO ir_sequence (code, prefix, padding, next_number) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(code) DO UPDATE SET prefix = ?2, padding = ?3, next_number = ?4
            "#,
            params![code, prefix, padding, next_number],
        )?;
        Ok(())
    }
}
