// ==========================================
// 地磅称重系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约定: 所有仓储共享同一个 SQLite 连接
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, DashboardApi, ImportApi, WeighingApi};
use crate::config::{ConfigManager, WeighbridgeConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::TruckImporter;
use crate::repository::{
    ActionLogRepository, MasterDataRepository, OrderRepository, PickingRepository,
    ScaleRepository, SequenceRepository, WeighingRepository,
};
use crate::scale::{ConnectionScaleReader, ScaleReader};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径（内存库为 ":memory:"）
    pub db_path: String,

    /// 称重操作API
    pub weighing_api: Arc<WeighingApi>,

    /// 看板API
    pub dashboard_api: Arc<DashboardApi>,

    /// 车辆档案导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    // 基础资料仓储（演示数据、测试准备）
    pub master_repo: Arc<MasterDataRepository>,
    pub scale_repo: Arc<ScaleRepository>,
    pub order_repo: Arc<OrderRepository>,
    pub picking_repo: Arc<PickingRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 打开（必要时创建）数据库并组装全部 API
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开连接并执行幂等建表
    /// 2. 按配置设置界面语言（未配置时不切换）
    /// 3. 创建所有Repository与API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::from_connection(conn, db_path)
    }

    /// 基于已有连接组装（测试使用内存库）
    pub fn from_connection(conn: Connection, db_path: String) -> Result<Self, String> {
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let weighing_repo = Arc::new(WeighingRepository::new(conn.clone()));
        let scale_repo = Arc::new(ScaleRepository::new(conn.clone()));
        let master_repo = Arc::new(MasterDataRepository::new(conn.clone()));
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let picking_repo = Arc::new(PickingRepository::new(conn.clone()));
        let sequence_repo = Arc::new(SequenceRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        // ==========================================
        // 配置与仪表
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        // 仅在显式配置时切换语言
        match config_manager.get_global_config_value(crate::config::config_keys::LOCALE) {
            Ok(Some(locale)) => crate::i18n::set_locale(&locale),
            Ok(None) => {}
            Err(e) => tracing::warn!("读取语言配置失败(使用默认语言): {}", e),
        }
        let config_reader: Arc<dyn WeighbridgeConfigReader> = config_manager.clone();
        let scale_reader: Arc<dyn ScaleReader> =
            Arc::new(ConnectionScaleReader::new(config_reader.clone()));

        // ==========================================
        // 创建API实例
        // ==========================================
        let weighing_api = Arc::new(WeighingApi::new(
            weighing_repo.clone(),
            scale_repo.clone(),
            master_repo.clone(),
            order_repo.clone(),
            picking_repo.clone(),
            sequence_repo,
            action_log_repo.clone(),
            config_reader,
            scale_reader,
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            weighing_repo,
            order_repo.clone(),
            picking_repo.clone(),
            master_repo.clone(),
        ));
        let import_api = Arc::new(ImportApi::new(TruckImporter::new(master_repo.clone())));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            weighing_api,
            dashboard_api,
            import_api,
            config_api,
            master_repo,
            scale_repo,
            order_repo,
            picking_repo,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 TRUCK_WEIGHBRIDGE_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("TRUCK_WEIGHBRIDGE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./truck_weighbridge.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("truck-weighbridge");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("truck_weighbridge.db");
        }
    }

    path.to_string_lossy().to_string()
}
