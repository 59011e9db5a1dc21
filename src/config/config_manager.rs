// ==========================================
// 地磅称重系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::weighbridge_config_trait::WeighbridgeConfigReader;
use crate::db::{
    open_sqlite_connection, DEFAULT_CUSTOMER_LOCATION_ID, DEFAULT_STOCK_LOCATION_ID,
    DEFAULT_SUPPLIER_LOCATION_ID,
};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// TCP 仪表读数超时默认值（毫秒）
pub const DEFAULT_SCALE_TCP_TIMEOUT_MS: u64 = 3000;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖现有的 global 配置
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            let affected = tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            count += affected;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// WeighbridgeConfigReader Trait 实现
// ==========================================
#[async_trait]
impl WeighbridgeConfigReader for ConfigManager {
    async fn get_incoming_src_location(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::INCOMING_SRC_LOCATION, DEFAULT_SUPPLIER_LOCATION_ID)
    }

    async fn get_incoming_dest_location(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::INCOMING_DEST_LOCATION, DEFAULT_STOCK_LOCATION_ID)
    }

    async fn get_outgoing_src_location(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::OUTGOING_SRC_LOCATION, DEFAULT_STOCK_LOCATION_ID)
    }

    async fn get_default_customer_location(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(
            config_keys::DEFAULT_CUSTOMER_LOCATION,
            DEFAULT_CUSTOMER_LOCATION_ID,
        )
    }

    async fn get_reconcile_tolerance_kg(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::RECONCILE_TOLERANCE_KG, "0")?;
        match value.trim().parse::<f64>() {
            Ok(v) if v >= 0.0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = config_keys::RECONCILE_TOLERANCE_KG,
                    raw_value = %value,
                    "核对容差配置格式错误，使用 0"
                );
                Ok(0.0)
            }
        }
    }

    async fn get_scale_tcp_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::SCALE_TCP_TIMEOUT_MS,
            &DEFAULT_SCALE_TCP_TIMEOUT_MS.to_string(),
        )?;
        match value.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = config_keys::SCALE_TCP_TIMEOUT_MS,
                    raw_value = %value,
                    default = DEFAULT_SCALE_TCP_TIMEOUT_MS,
                    "仪表超时配置格式错误，使用默认值"
                );
                Ok(DEFAULT_SCALE_TCP_TIMEOUT_MS)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 库位
    pub const INCOMING_SRC_LOCATION: &str = "incoming_src_location_id";
    pub const INCOMING_DEST_LOCATION: &str = "incoming_dest_location_id";
    pub const OUTGOING_SRC_LOCATION: &str = "outgoing_src_location_id";
    pub const DEFAULT_CUSTOMER_LOCATION: &str = "default_customer_location_id";

    // 核对
    pub const RECONCILE_TOLERANCE_KG: &str = "reconcile_tolerance_kg";

    // 仪表
    pub const SCALE_TCP_TIMEOUT_MS: &str = "scale_tcp_timeout_ms";

    // 界面语言（未设置时保持默认 zh-CN）
    pub const LOCALE: &str = "locale";
}
