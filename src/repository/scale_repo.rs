// ==========================================
// 地磅称重系统 - 地磅 / 操作员仓储
// ==========================================
// 对齐: weighing_scale / operator / operator_scale 表
// ==========================================

use crate::domain::master_data::{Operator, ScaleConnection, WeighingScale};
use crate::repository::error::{invalid_enum, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct ScaleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScaleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 地磅
    // ==========================================

    /// 新增或更新地磅
    pub fn upsert_scale(&self, scale: &WeighingScale) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let (manual_weight, host, port) = match &scale.connection {
            ScaleConnection::Manual { weight_kg } => (Some(*weight_kg), None, None),
            ScaleConnection::Tcp { host, port } => (None, Some(host.clone()), Some(*port as i64)),
        };

        conn.execute(
            r#"
            INSERT INTO weighing_scale (scale_id, name, enabled, connection_kind, manual_weight_kg, host, port)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(scale_id) DO UPDATE SET
                name = ?2, enabled = ?3, connection_kind = ?4,
                manual_weight_kg = ?5, host = ?6, port = ?7
            "#,
            params![
                scale.scale_id,
                scale.name,
                scale.enabled as i32,
                scale.connection.kind(),
                manual_weight,
                host,
                port,
            ],
        )?;
        Ok(())
    }

    /// 更新手工地磅读数（模拟仪表）
    pub fn set_manual_reading(&self, scale_id: &str, weight_kg: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE weighing_scale SET manual_weight_kg = ?2 WHERE scale_id = ?1 AND connection_kind = 'manual'",
            params![scale_id, weight_kg],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("WeighingScale(manual)", scale_id));
        }
        Ok(())
    }

    pub fn find_scale(&self, scale_id: &str) -> RepositoryResult<Option<WeighingScale>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT scale_id, name, enabled, connection_kind, manual_weight_kg, host, port
             FROM weighing_scale WHERE scale_id = ?1",
        )?;
        match stmt.query_row(params![scale_id], map_scale) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 已启用地磅（按插入顺序）
    pub fn list_enabled_scales(&self) -> RepositoryResult<Vec<WeighingScale>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT scale_id, name, enabled, connection_kind, manual_weight_kg, host, port
             FROM weighing_scale WHERE enabled = 1 ORDER BY rowid",
        )?;
        let scales = stmt
            .query_map([], map_scale)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(scales)
    }

    // ==========================================
    // 操作员
    // ==========================================

    /// 新增或更新操作员（含地磅分配，整体替换）
    pub fn upsert_operator(&self, operator: &Operator) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO operator (user_id, name, default_scale_id) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET name = ?2, default_scale_id = ?3
            "#,
            params![operator.user_id, operator.name, operator.default_scale_id],
        )?;
        tx.execute(
            "DELETE FROM operator_scale WHERE user_id = ?1",
            params![operator.user_id],
        )?;
        for (seq, scale_id) in operator.assigned_scale_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO operator_scale (user_id, scale_id, seq) VALUES (?1, ?2, ?3)",
                params![operator.user_id, scale_id, seq as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn find_operator(&self, user_id: &str) -> RepositoryResult<Option<Operator>> {
        let conn = self.get_conn()?;
        let head = conn.query_row(
            "SELECT user_id, name, default_scale_id FROM operator WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        );
        let (user_id, name, default_scale_id) = match head {
            Ok(h) => h,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stmt = conn.prepare(
            "SELECT scale_id FROM operator_scale WHERE user_id = ?1 ORDER BY seq",
        )?;
        let assigned_scale_ids = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(Some(Operator {
            user_id,
            name,
            default_scale_id,
            assigned_scale_ids,
        }))
    }
}

fn map_scale(row: &Row) -> SqliteResult<WeighingScale> {
    let kind: String = row.get(3)?;
    let connection = match kind.as_str() {
        "manual" => ScaleConnection::Manual {
            weight_kg: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
        },
        "tcp" => ScaleConnection::Tcp {
            host: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            port: row.get::<_, Option<u16>>(6)?.unwrap_or(0),
        },
        other => return Err(invalid_enum("connection_kind", other)),
    };

    Ok(WeighingScale {
        scale_id: row.get(0)?,
        name: row.get(1)?,
        enabled: row.get::<_, i32>(2)? != 0,
        connection,
    })
}
