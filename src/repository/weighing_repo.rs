// ==========================================
// 地磅称重系统 - 称重记录仓储
// ==========================================
// 对齐: truck_weighing 表
// 红线: 状态变更与操作日志同一事务提交
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::types::{OrderKind, WeighingState};
use crate::domain::weighing::{WeighingFilter, WeighingRecord};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{
    format_ts, invalid_enum, parse_ts, RepositoryError, RepositoryResult,
};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    weighing_id, reference, active, scale_id, truck_id, truck_plate, driver_name, product_id,
    partner_id, order_kind, order_id, order_line_id, picking_id, location_dest_id,
    live_weight, gross_weight, tare_weight, net_weight,
    weighing_date, gross_date, tare_date, state, notes,
    created_by, created_at, updated_at
"#;

/// 当日完成统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DoneStats {
    pub count: i64,
    pub total_net_weight: f64,
}

// ==========================================
// WeighingRepository - 称重记录仓储
// ==========================================
pub struct WeighingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WeighingRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新建称重记录并写入操作日志（同一事务）
    pub fn insert_with_log(&self, record: &WeighingRecord, log: &ActionLog) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::insert_tx(&tx, record)?;
        ActionLogRepository::insert_tx(&tx, log)?;
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn insert_tx(conn: &Connection, record: &WeighingRecord) -> RepositoryResult<()> {
        conn.execute(
            &format!(
                "INSERT INTO truck_weighing ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
                SELECT_COLUMNS
            ),
            params![
                record.weighing_id,
                record.reference,
                record.active as i32,
                record.scale_id,
                record.truck_id,
                record.truck_plate,
                record.driver_name,
                record.product_id,
                record.partner_id,
                record.order_kind.map(|k| k.as_str()),
                record.order_id,
                record.order_line_id,
                record.picking_id,
                record.location_dest_id,
                record.live_weight,
                record.gross_weight,
                record.tare_weight,
                record.net_weight,
                format_ts(&record.weighing_date),
                record.gross_date.as_ref().map(format_ts),
                record.tare_date.as_ref().map(format_ts),
                record.state.as_str(),
                record.notes,
                record.created_by,
                format_ts(&record.created_at),
                format_ts(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 更新称重记录并写入操作日志（同一事务）
    ///
    /// `expected` 为动作开始时读到的状态；期间状态已变化则整体回滚
    pub fn update_with_log(
        &self,
        record: &WeighingRecord,
        expected: WeighingState,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::update_tx(&tx, record, expected)?;
        ActionLogRepository::insert_tx(&tx, log)?;
        tx.commit()?;
        Ok(())
    }

    /// 只写实时重量（读数期间其他字段可能已被别的动作修改）
    pub fn update_live_weight_with_log(
        &self,
        weighing_id: &str,
        live_weight: f64,
        updated_at: &NaiveDateTime,
        expected: WeighingState,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let rows = tx.execute(
            "UPDATE truck_weighing SET live_weight = ?2, updated_at = ?3 \
             WHERE weighing_id = ?1 AND state = ?4",
            params![weighing_id, live_weight, format_ts(updated_at), expected.as_str()],
        )?;
        if rows == 0 {
            return Err(Self::missing_or_stale(&tx, weighing_id));
        }
        ActionLogRepository::insert_tx(&tx, log)?;
        tx.commit()?;
        Ok(())
    }

    /// 0 行受影响: 区分记录不存在与状态已变化
    fn missing_or_stale(conn: &Connection, weighing_id: &str) -> RepositoryError {
        let exists = conn.query_row(
            "SELECT 1 FROM truck_weighing WHERE weighing_id = ?1",
            params![weighing_id],
            |_| Ok(()),
        );
        match exists {
            Ok(()) => RepositoryError::StaleState {
                entity: "WeighingRecord".to_string(),
                id: weighing_id.to_string(),
            },
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                RepositoryError::not_found("WeighingRecord", weighing_id)
            }
            Err(e) => e.into(),
        }
    }

    /// 在调用方事务中整行更新（reference / created_* 不变），仅当状态仍为 `expected`
    pub(crate) fn update_tx(
        conn: &Connection,
        record: &WeighingRecord,
        expected: WeighingState,
    ) -> RepositoryResult<()> {
        let rows = conn.execute(
            r#"
            UPDATE truck_weighing SET
                active = ?2, scale_id = ?3, truck_id = ?4, truck_plate = ?5, driver_name = ?6,
                product_id = ?7, partner_id = ?8, order_kind = ?9, order_id = ?10,
                order_line_id = ?11, picking_id = ?12, location_dest_id = ?13,
                live_weight = ?14, gross_weight = ?15, tare_weight = ?16, net_weight = ?17,
                weighing_date = ?18, gross_date = ?19, tare_date = ?20, state = ?21, notes = ?22,
                updated_at = ?23
            WHERE weighing_id = ?1 AND state = ?24
            "#,
            params![
                record.weighing_id,
                record.active as i32,
                record.scale_id,
                record.truck_id,
                record.truck_plate,
                record.driver_name,
                record.product_id,
                record.partner_id,
                record.order_kind.map(|k| k.as_str()),
                record.order_id,
                record.order_line_id,
                record.picking_id,
                record.location_dest_id,
                record.live_weight,
                record.gross_weight,
                record.tare_weight,
                record.net_weight,
                format_ts(&record.weighing_date),
                record.gross_date.as_ref().map(format_ts),
                record.tare_date.as_ref().map(format_ts),
                record.state.as_str(),
                record.notes,
                format_ts(&record.updated_at),
                expected.as_str(),
            ],
        )?;
        if rows == 0 {
            return Err(Self::missing_or_stale(conn, &record.weighing_id));
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, weighing_id: &str) -> RepositoryResult<Option<WeighingRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM truck_weighing WHERE weighing_id = ?1",
            SELECT_COLUMNS
        );
        match conn.query_row(&sql, params![weighing_id], map_row) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按条件列出（weighing_date 倒序）
    pub fn list(&self, filter: &WeighingFilter) -> RepositoryResult<Vec<WeighingRecord>> {
        let conn = self.get_conn()?;

        let mut clauses: Vec<&str> = vec!["active = 1"];
        let mut values: Vec<Value> = Vec::new();
        if let Some(state) = filter.state {
            clauses.push("state = ?");
            values.push(Value::Text(state.as_str().to_string()));
        }
        if let Some(order_id) = &filter.order_id {
            clauses.push("order_id = ?");
            values.push(Value::Text(order_id.clone()));
        }
        if let Some(picking_id) = &filter.picking_id {
            clauses.push("picking_id = ?");
            values.push(Value::Text(picking_id.clone()));
        }
        if let Some(truck_id) = &filter.truck_id {
            clauses.push("truck_id = ?");
            values.push(Value::Text(truck_id.clone()));
        }

        let mut sql = format!(
            "SELECT {} FROM truck_weighing WHERE {} ORDER BY weighing_date DESC, rowid DESC",
            SELECT_COLUMNS,
            clauses.join(" AND ")
        );
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit.max(0)));
        }

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    // ==========================================
    // 统计查询（看板 / 单据汇总）
    // ==========================================

    pub fn count_by_state(&self, state: WeighingState) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM truck_weighing WHERE active = 1 AND state = ?1",
            params![state.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// weighing_date >= since 的完成记录数与净重合计
    pub fn done_stats_since(&self, since: &NaiveDateTime) -> RepositoryResult<DoneStats> {
        let conn = self.get_conn()?;
        let (count, total): (i64, f64) = conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(net_weight), 0)
            FROM truck_weighing
            WHERE active = 1 AND state = 'done' AND weighing_date >= ?1
            "#,
            params![format_ts(since)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(DoneStats {
            count,
            total_net_weight: total,
        })
    }

    /// 订单下已完成称重统计
    pub fn done_stats_by_order(&self, order_id: &str) -> RepositoryResult<DoneStats> {
        self.done_stats_where("order_id = ?1", order_id)
    }

    /// 订单行下已完成称重统计
    pub fn done_stats_by_order_line(&self, line_id: &str) -> RepositoryResult<DoneStats> {
        self.done_stats_where("order_line_id = ?1", line_id)
    }

    fn done_stats_where(&self, clause: &str, key: &str) -> RepositoryResult<DoneStats> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(net_weight), 0) FROM truck_weighing \
             WHERE active = 1 AND state = 'done' AND {}",
            clause
        );
        let (count, total): (i64, f64) =
            conn.query_row(&sql, params![key], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(DoneStats {
            count,
            total_net_weight: total,
        })
    }

    /// 单据关联的称重记录数（不含已取消）
    pub fn count_by_picking(&self, picking_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM truck_weighing WHERE active = 1 AND state != 'cancel' AND picking_id = ?1",
            params![picking_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ==========================================
// 行映射
// ==========================================
fn map_row(row: &Row) -> SqliteResult<WeighingRecord> {
    let order_kind = match row.get::<_, Option<String>>(9)? {
        Some(raw) => Some(OrderKind::parse(&raw).ok_or_else(|| invalid_enum("order_kind", &raw))?),
        None => None,
    };
    let state_raw: String = row.get(21)?;
    let state = WeighingState::parse(&state_raw).ok_or_else(|| invalid_enum("state", &state_raw))?;

    let opt_ts = |idx: usize| -> SqliteResult<Option<NaiveDateTime>> {
        match row.get::<_, Option<String>>(idx)? {
            Some(raw) => Ok(Some(parse_ts(&raw)?)),
            None => Ok(None),
        }
    };

    Ok(WeighingRecord {
        weighing_id: row.get(0)?,
        reference: row.get(1)?,
        active: row.get::<_, i32>(2)? != 0,
        scale_id: row.get(3)?,
        truck_id: row.get(4)?,
        truck_plate: row.get(5)?,
        driver_name: row.get(6)?,
        product_id: row.get(7)?,
        partner_id: row.get(8)?,
        order_kind,
        order_id: row.get(10)?,
        order_line_id: row.get(11)?,
        picking_id: row.get(12)?,
        location_dest_id: row.get(13)?,
        live_weight: row.get(14)?,
        gross_weight: row.get(15)?,
        tare_weight: row.get(16)?,
        net_weight: row.get(17)?,
        weighing_date: parse_ts(&row.get::<_, String>(18)?)?,
        gross_date: opt_ts(19)?,
        tare_date: opt_ts(20)?,
        state,
        notes: row.get(22)?,
        created_by: row.get(23)?,
        created_at: parse_ts(&row.get::<_, String>(24)?)?,
        updated_at: parse_ts(&row.get::<_, String>(25)?)?,
    })
}
