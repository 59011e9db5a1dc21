// ==========================================
// 地磅称重系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表入口 init_schema（幂等，可重复执行）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 默认库位
pub const DEFAULT_SUPPLIER_LOCATION_ID: &str = "LOC-SUPPLIER";
pub const DEFAULT_STOCK_LOCATION_ID: &str = "LOC-STOCK";
pub const DEFAULT_CUSTOMER_LOCATION_ID: &str = "LOC-CUSTOMER";

/// 序列编码
pub const SEQ_TRUCK_WEIGHING: &str = "truck.weighing";
pub const SEQ_PICKING_INCOMING: &str = "stock.picking.incoming";
pub const SEQ_PICKING_OUTGOING: &str = "stock.picking.outgoing";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 包含:
/// - 称重记录 / 操作日志 / 序列
/// - 地磅、操作员、车辆、物料、伙伴、库位
/// - 订单、库存单据
/// - 默认库位、序列、配置项
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    seed_defaults(conn)?;

    let current = read_schema_version(conn)?;
    if current.unwrap_or(0) < CURRENT_SCHEMA_VERSION {
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "schema 初始化完成");
    }
    Ok(())
}

/// 写入默认库位、序列与配置
fn seed_defaults(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        r#"
        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        INSERT OR IGNORE INTO stock_location (location_id, name, usage) VALUES
            ('{supplier}', 'Partners/Vendors', 'supplier'),
            ('{stock}', 'WH/Stock', 'internal'),
            ('{customer}', 'Partners/Customers', 'customer');

        INSERT OR IGNORE INTO ir_sequence (code, prefix, padding, next_number) VALUES
            ('{seq_w}', 'WGH/', 5, 1),
            ('{seq_in}', 'WH/IN/', 5, 1),
            ('{seq_out}', 'WH/OUT/', 5, 1);
        "#,
        supplier = DEFAULT_SUPPLIER_LOCATION_ID,
        stock = DEFAULT_STOCK_LOCATION_ID,
        customer = DEFAULT_CUSTOMER_LOCATION_ID,
        seq_w = SEQ_TRUCK_WEIGHING,
        seq_in = SEQ_PICKING_INCOMING,
        seq_out = SEQ_PICKING_OUTGOING,
    ))
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id TEXT PRIMARY KEY,
    scope_type TEXT NOT NULL,
    scope_key TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(scope_type, scope_key)
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS ir_sequence (
    code TEXT PRIMARY KEY,
    prefix TEXT NOT NULL,
    padding INTEGER NOT NULL DEFAULT 5,
    next_number INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS stock_location (
    location_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    usage TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS weighing_scale (
    scale_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    connection_kind TEXT NOT NULL,
    manual_weight_kg REAL,
    host TEXT,
    port INTEGER
);

CREATE TABLE IF NOT EXISTS operator (
    user_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    default_scale_id TEXT REFERENCES weighing_scale(scale_id)
);

CREATE TABLE IF NOT EXISTS operator_scale (
    user_id TEXT NOT NULL REFERENCES operator(user_id) ON DELETE CASCADE,
    scale_id TEXT NOT NULL REFERENCES weighing_scale(scale_id) ON DELETE CASCADE,
    seq INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, scale_id)
);

CREATE TABLE IF NOT EXISTS truck (
    truck_id TEXT PRIMARY KEY,
    plate_number TEXT NOT NULL UNIQUE,
    driver_name TEXT,
    max_load_kg REAL,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS product (
    product_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    uom TEXT NOT NULL DEFAULT 'kg',
    is_weighable INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS partner (
    partner_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    customer_location_id TEXT REFERENCES stock_location(location_id)
);

CREATE TABLE IF NOT EXISTS trade_order (
    order_id TEXT PRIMARY KEY,
    order_no TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    partner_id TEXT REFERENCES partner(partner_id),
    state TEXT NOT NULL,
    amount_total REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trade_order_line (
    line_id TEXT PRIMARY KEY,
    order_id TEXT NOT NULL REFERENCES trade_order(order_id) ON DELETE CASCADE,
    product_id TEXT NOT NULL REFERENCES product(product_id),
    ordered_qty REAL NOT NULL DEFAULT 0,
    processed_qty REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS stock_picking (
    picking_id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    picking_type TEXT NOT NULL,
    state TEXT NOT NULL,
    partner_id TEXT REFERENCES partner(partner_id),
    origin TEXT,
    location_src_id TEXT REFERENCES stock_location(location_id),
    location_dest_id TEXT REFERENCES stock_location(location_id),
    scheduled_date TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stock_move (
    move_id TEXT PRIMARY KEY,
    picking_id TEXT NOT NULL REFERENCES stock_picking(picking_id) ON DELETE CASCADE,
    product_id TEXT NOT NULL REFERENCES product(product_id),
    demand_qty REAL NOT NULL DEFAULT 0,
    order_line_id TEXT REFERENCES trade_order_line(line_id)
);

CREATE TABLE IF NOT EXISTS stock_move_line (
    move_line_id TEXT PRIMARY KEY,
    move_id TEXT NOT NULL REFERENCES stock_move(move_id) ON DELETE CASCADE,
    picking_id TEXT NOT NULL REFERENCES stock_picking(picking_id) ON DELETE CASCADE,
    product_id TEXT NOT NULL REFERENCES product(product_id),
    quantity REAL NOT NULL DEFAULT 0,
    location_src_id TEXT,
    location_dest_id TEXT
);

CREATE TABLE IF NOT EXISTS truck_weighing (
    weighing_id TEXT PRIMARY KEY,
    reference TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    scale_id TEXT REFERENCES weighing_scale(scale_id),
    truck_id TEXT NOT NULL REFERENCES truck(truck_id),
    truck_plate TEXT,
    driver_name TEXT,
    product_id TEXT REFERENCES product(product_id),
    partner_id TEXT REFERENCES partner(partner_id),
    order_kind TEXT,
    order_id TEXT REFERENCES trade_order(order_id),
    order_line_id TEXT REFERENCES trade_order_line(line_id),
    picking_id TEXT REFERENCES stock_picking(picking_id),
    location_dest_id TEXT REFERENCES stock_location(location_id),
    live_weight REAL NOT NULL DEFAULT 0,
    gross_weight REAL NOT NULL DEFAULT 0,
    tare_weight REAL NOT NULL DEFAULT 0,
    net_weight REAL NOT NULL DEFAULT 0,
    weighing_date TEXT NOT NULL,
    gross_date TEXT,
    tare_date TEXT,
    state TEXT NOT NULL DEFAULT 'draft',
    notes TEXT,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_truck_weighing_state ON truck_weighing(state, weighing_date);
CREATE INDEX IF NOT EXISTS idx_truck_weighing_order ON truck_weighing(order_id);
CREATE INDEX IF NOT EXISTS idx_truck_weighing_picking ON truck_weighing(picking_id);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    target_type TEXT NOT NULL,
    target_id TEXT NOT NULL,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    payload_json TEXT,
    detail TEXT
);

CREATE INDEX IF NOT EXISTS idx_action_log_target ON action_log(target_type, target_id, action_ts);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let locations: i64 = conn
            .query_row("SELECT COUNT(*) FROM stock_location", [], |row| row.get(0))
            .unwrap();
        assert_eq!(locations, 3);

        let sequences: i64 = conn
            .query_row("SELECT COUNT(*) FROM ir_sequence", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sequences, 3);
    }

    #[test]
    fn test_schema_version_absent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
