// ==========================================
// 地磅称重系统 - 库存单据仓储
// ==========================================
// 对齐: stock_picking / stock_move / stock_move_line 表
// 红线: 净重回写（单据状态 + 明细数量 + 称重状态 + 日志）同一事务
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::inventory::{
    PickingDetail, PickingToWeigh, QuantityWriteback, StockMove, StockMoveLine, StockPicking,
};
use crate::domain::types::{PickingState, PickingType, WeighingState};
use crate::domain::weighing::WeighingRecord;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{
    format_ts, invalid_enum, parse_ts, RepositoryError, RepositoryResult,
};
use crate::repository::weighing_repo::WeighingRepository;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const PICKING_COLUMNS: &str = r#"
    p.picking_id, p.name, p.picking_type, p.state, p.partner_id, p.origin,
    p.location_src_id, p.location_dest_id, p.scheduled_date, p.created_at
"#;

pub struct PickingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PickingRepository {
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

    /// 新建单据及其库存移动（同一事务）
    pub fn create_with_moves(
        &self,
        picking: &StockPicking,
        moves: &[StockMove],
        logs: &[ActionLog],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::create_with_moves_tx(&tx, picking, moves)?;
        for log in logs {
            ActionLogRepository::insert_tx(&tx, log)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// 由订单生成单据并关联到称重记录（同一事务）
    pub fn create_for_weighing(
        &self,
        picking: &StockPicking,
        moves: &[StockMove],
        weighing: &WeighingRecord,
        expected: WeighingState,
        logs: &[ActionLog],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::create_with_moves_tx(&tx, picking, moves)?;
        WeighingRepository::update_tx(&tx, weighing, expected)?;
        for log in logs {
            ActionLogRepository::insert_tx(&tx, log)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn create_with_moves_tx(
        conn: &Connection,
        picking: &StockPicking,
        moves: &[StockMove],
    ) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO stock_picking (
                picking_id, name, picking_type, state, partner_id, origin,
                location_src_id, location_dest_id, scheduled_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                picking.picking_id,
                picking.name,
                picking.picking_type.as_str(),
                picking.state.as_str(),
                picking.partner_id,
                picking.origin,
                picking.location_src_id,
                picking.location_dest_id,
                picking.scheduled_date.as_ref().map(format_ts),
                format_ts(&picking.created_at),
            ],
        )?;

        for m in moves {
            conn.execute(
                r#"
                INSERT INTO stock_move (move_id, picking_id, product_id, demand_qty, order_line_id)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![m.move_id, m.picking_id, m.product_id, m.demand_qty, m.order_line_id],
            )?;
        }
        Ok(())
    }

    pub fn update_state(&self, picking_id: &str, state: PickingState) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::update_state_tx(&conn, picking_id, state)
    }

    pub(crate) fn update_state_tx(
        conn: &Connection,
        picking_id: &str,
        state: PickingState,
    ) -> RepositoryResult<()> {
        let rows = conn.execute(
            "UPDATE stock_picking SET state = ?2 WHERE picking_id = ?1",
            params![picking_id, state.as_str()],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("StockPicking", picking_id));
        }
        Ok(())
    }

    /// 提交净重回写
    ///
    /// 单据状态、明细数量、称重记录、日志全部成功或全部回滚
    pub fn apply_writeback(
        &self,
        writeback: &QuantityWriteback,
        weighing: &WeighingRecord,
        expected: WeighingState,
        logs: &[ActionLog],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        Self::update_state_tx(&tx, &writeback.picking_id, writeback.picking_state)?;

        for line_id in &writeback.update_line_ids {
            let rows = tx.execute(
                "UPDATE stock_move_line SET quantity = ?2 WHERE move_line_id = ?1 AND move_id = ?3",
                params![line_id, writeback.quantity, writeback.move_id],
            )?;
            if rows == 0 {
                return Err(RepositoryError::not_found("StockMoveLine", line_id));
            }
        }

        if let Some(line) = &writeback.new_line {
            Self::insert_move_line_tx(&tx, line)?;
        }

        // 称重状态已不是 expected（例如重复回写）→ 上面的单据变更一并回滚
        WeighingRepository::update_tx(&tx, weighing, expected)?;
        for log in logs {
            ActionLogRepository::insert_tx(&tx, log)?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn insert_move_line(&self, line: &StockMoveLine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_move_line_tx(&conn, line)
    }

    fn insert_move_line_tx(conn: &Connection, line: &StockMoveLine) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO stock_move_line (
                move_line_id, move_id, picking_id, product_id, quantity,
                location_src_id, location_dest_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                line.move_line_id,
                line.move_id,
                line.picking_id,
                line.product_id,
                line.quantity,
                line.location_src_id,
                line.location_dest_id,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, picking_id: &str) -> RepositoryResult<Option<StockPicking>> {
        let conn = self.get_conn()?;
        let picking = conn
            .query_row(
                &format!("SELECT {} FROM stock_picking p WHERE p.picking_id = ?1", PICKING_COLUMNS),
                params![picking_id],
                map_picking,
            )
            .optional()?;
        Ok(picking)
    }

    /// 单据 + 移动 + 明细
    pub fn find_detail(&self, picking_id: &str) -> RepositoryResult<Option<PickingDetail>> {
        let conn = self.get_conn()?;
        let picking = conn
            .query_row(
                &format!("SELECT {} FROM stock_picking p WHERE p.picking_id = ?1", PICKING_COLUMNS),
                params![picking_id],
                map_picking,
            )
            .optional()?;
        let picking = match picking {
            Some(p) => p,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            "SELECT move_id, picking_id, product_id, demand_qty, order_line_id
             FROM stock_move WHERE picking_id = ?1 ORDER BY rowid",
        )?;
        let moves = stmt
            .query_map(params![picking_id], |row| {
                Ok(StockMove {
                    move_id: row.get(0)?,
                    picking_id: row.get(1)?,
                    product_id: row.get(2)?,
                    demand_qty: row.get(3)?,
                    order_line_id: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT move_line_id, move_id, picking_id, product_id, quantity, location_src_id, location_dest_id
             FROM stock_move_line WHERE picking_id = ?1 ORDER BY rowid",
        )?;
        let move_lines = stmt
            .query_map(params![picking_id], |row| {
                Ok(StockMoveLine {
                    move_line_id: row.get(0)?,
                    move_id: row.get(1)?,
                    picking_id: row.get(2)?,
                    product_id: row.get(3)?,
                    quantity: row.get(4)?,
                    location_src_id: row.get(5)?,
                    location_dest_id: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(Some(PickingDetail {
            picking,
            moves,
            move_lines,
        }))
    }

    /// 按来源单号查找未完成单据（最早创建的一张）
    pub fn find_open_by_origin(
        &self,
        origin: &str,
        picking_type: PickingType,
    ) -> RepositoryResult<Option<StockPicking>> {
        let conn = self.get_conn()?;
        let picking = conn
            .query_row(
                &format!(
                    "SELECT {} FROM stock_picking p
                     WHERE p.origin = ?1 AND p.picking_type = ?2
                       AND p.state IN ('draft', 'waiting', 'confirmed', 'assigned')
                     ORDER BY p.created_at, p.rowid LIMIT 1",
                    PICKING_COLUMNS
                ),
                params![origin, picking_type.as_str()],
                map_picking,
            )
            .optional()?;
        Ok(picking)
    }

    /// 单据中是否含需过磅物料
    pub fn has_weighable_moves(&self, picking_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists: Option<i64> = conn
            .query_row(
                r#"
                SELECT 1 FROM stock_move m JOIN product pr ON pr.product_id = m.product_id
                WHERE m.picking_id = ?1 AND pr.is_weighable = 1 LIMIT 1
                "#,
                params![picking_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    /// 待过磅单据: confirmed/assigned，含需过磅物料，且无未取消的称重记录
    pub fn list_to_weigh(&self, picking_type: PickingType) -> RepositoryResult<Vec<PickingToWeigh>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {},
                   (SELECT COALESCE(SUM(m2.demand_qty), 0) FROM stock_move m2 WHERE m2.picking_id = p.picking_id)
            FROM stock_picking p
            WHERE p.picking_type = ?1
              AND p.state IN ('confirmed', 'assigned')
              AND EXISTS (
                  SELECT 1 FROM stock_move m JOIN product pr ON pr.product_id = m.product_id
                  WHERE m.picking_id = p.picking_id AND pr.is_weighable = 1
              )
              AND NOT EXISTS (
                  SELECT 1 FROM truck_weighing w
                  WHERE w.picking_id = p.picking_id AND w.active = 1 AND w.state != 'cancel'
              )
            ORDER BY p.scheduled_date, p.created_at
            "#,
            PICKING_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![picking_type.as_str()], |row| {
                Ok(PickingToWeigh {
                    picking: map_picking(row)?,
                    total_demand: row.get(10)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_picking(row: &Row) -> SqliteResult<StockPicking> {
    let type_raw: String = row.get(2)?;
    let state_raw: String = row.get(3)?;
    Ok(StockPicking {
        picking_id: row.get(0)?,
        name: row.get(1)?,
        picking_type: PickingType::parse(&type_raw)
            .ok_or_else(|| invalid_enum("picking_type", &type_raw))?,
        state: PickingState::parse(&state_raw).ok_or_else(|| invalid_enum("state", &state_raw))?,
        partner_id: row.get(4)?,
        origin: row.get(5)?,
        location_src_id: row.get(6)?,
        location_dest_id: row.get(7)?,
        scheduled_date: match row.get::<_, Option<String>>(8)? {
            Some(raw) => Some(parse_ts(&raw)?),
            None => None,
        },
        created_at: parse_ts(&row.get::<_, String>(9)?)?,
    })
}
