// ==========================================
// 地磅称重系统 - 采购/销售订单仓储
// ==========================================
// 对齐: trade_order / trade_order_line 表
// ==========================================

use crate::domain::order::{OrderWithLines, TradeOrder, TradeOrderLine};
use crate::domain::types::{OrderKind, OrderState};
use crate::repository::error::{
    format_ts, invalid_enum, parse_ts, RepositoryError, RepositoryResult,
};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str =
    "o.order_id, o.order_no, o.kind, o.partner_id, o.state, o.amount_total, o.created_at";

pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增订单及订单行（同一事务）
    pub fn insert_with_lines(&self, order: &TradeOrder, lines: &[TradeOrderLine]) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO trade_order (order_id, order_no, kind, partner_id, state, amount_total, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                order.order_id,
                order.order_no,
                order.kind.as_str(),
                order.partner_id,
                order.state.as_str(),
                order.amount_total,
                format_ts(&order.created_at),
            ],
        )?;
        for line in lines {
            tx.execute(
                r#"
                INSERT INTO trade_order_line (line_id, order_id, product_id, ordered_qty, processed_qty)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    line.line_id,
                    line.order_id,
                    line.product_id,
                    line.ordered_qty,
                    line.processed_qty
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn update_state(&self, order_id: &str, state: OrderState) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE trade_order SET state = ?2 WHERE order_id = ?1",
            params![order_id, state.as_str()],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("TradeOrder", order_id));
        }
        Ok(())
    }

    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<OrderWithLines>> {
        let conn = self.get_conn()?;
        let order = conn
            .query_row(
                &format!("SELECT {} FROM trade_order o WHERE o.order_id = ?1", ORDER_COLUMNS),
                params![order_id],
                map_order,
            )
            .optional()?;
        match order {
            Some(order) => {
                let lines = Self::lines_of(&conn, &order.order_id)?;
                Ok(Some(OrderWithLines { order, lines }))
            }
            None => Ok(None),
        }
    }

    pub fn find_line(&self, line_id: &str) -> RepositoryResult<Option<TradeOrderLine>> {
        let conn = self.get_conn()?;
        let line = conn
            .query_row(
                "SELECT line_id, order_id, product_id, ordered_qty, processed_qty
                 FROM trade_order_line WHERE line_id = ?1",
                params![line_id],
                map_line,
            )
            .optional()?;
        Ok(line)
    }

    /// 订单中是否含需过磅物料
    pub fn has_weighable_lines(&self, order_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists: Option<i64> = conn
            .query_row(
                r#"
                SELECT 1 FROM trade_order_line l JOIN product pr ON pr.product_id = l.product_id
                WHERE l.order_id = ?1 AND pr.is_weighable = 1 LIMIT 1
                "#,
                params![order_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    /// 待过磅订单: 已确认/已锁定，含需过磅物料，且无未取消的称重记录
    pub fn list_to_weigh(&self, kind: OrderKind) -> RepositoryResult<Vec<OrderWithLines>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM trade_order o
            WHERE o.kind = ?1
              AND o.state IN ('confirmed', 'done')
              AND EXISTS (
                  SELECT 1 FROM trade_order_line l JOIN product pr ON pr.product_id = l.product_id
                  WHERE l.order_id = o.order_id AND pr.is_weighable = 1
              )
              AND NOT EXISTS (
                  SELECT 1 FROM truck_weighing w
                  WHERE w.order_id = o.order_id AND w.active = 1 AND w.state != 'cancel'
              )
            ORDER BY o.created_at, o.order_no
            "#,
            ORDER_COLUMNS
        ))?;
        let orders = stmt
            .query_map(params![kind.as_str()], map_order)?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let lines = Self::lines_of(&conn, &order.order_id)?;
            result.push(OrderWithLines { order, lines });
        }
        Ok(result)
    }

    fn lines_of(conn: &Connection, order_id: &str) -> RepositoryResult<Vec<TradeOrderLine>> {
        let mut stmt = conn.prepare(
            "SELECT line_id, order_id, product_id, ordered_qty, processed_qty
             FROM trade_order_line WHERE order_id = ?1 ORDER BY rowid",
        )?;
        let lines = stmt
            .query_map(params![order_id], map_line)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(lines)
    }
}

fn map_order(row: &Row) -> SqliteResult<TradeOrder> {
    let kind_raw: String = row.get(2)?;
    let state_raw: String = row.get(4)?;
    Ok(TradeOrder {
        order_id: row.get(0)?,
        order_no: row.get(1)?,
        kind: OrderKind::parse(&kind_raw).ok_or_else(|| invalid_enum("kind", &kind_raw))?,
        partner_id: row.get(3)?,
        state: OrderState::parse(&state_raw).ok_or_else(|| invalid_enum("state", &state_raw))?,
        amount_total: row.get(5)?,
        created_at: parse_ts(&row.get::<_, String>(6)?)?,
    })
}

fn map_line(row: &Row) -> SqliteResult<TradeOrderLine> {
    Ok(TradeOrderLine {
        line_id: row.get(0)?,
        order_id: row.get(1)?,
        product_id: row.get(2)?,
        ordered_qty: row.get(3)?,
        processed_qty: row.get(4)?,
    })
}
