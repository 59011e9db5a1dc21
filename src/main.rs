// ==========================================
// 地磅称重系统 - 命令行入口
// ==========================================
// 输出: 标准输出为 JSON，日志写 stderr
// ==========================================

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use truck_weighbridge::app::{get_default_db_path, AppState};
use truck_weighbridge::domain::CreateWeighingRequest;

#[derive(Parser)]
#[command(name = "truck-weighbridge")]
#[command(version)]
#[command(about = "地磅称重: 毛重/皮重采集，净重回写入库单/出库单")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 数据库文件路径（默认: TRUCK_WEIGHBRIDGE_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 操作人
    #[arg(long, global = true, default_value = "admin")]
    actor: String,

    /// 界面语言（zh-CN / en），覆盖数据库配置
    #[arg(long, global = true)]
    locale: Option<String>,

    /// JSON 格式日志
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 初始化数据库
    Init,

    /// 看板与待称重汇总
    Dashboard {
        /// 统计日期（默认今天，格式 YYYY-MM-DD）
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// 新建称重记录
    Create {
        /// 车辆ID或车牌号
        truck: String,
        #[arg(long)]
        scale: Option<String>,
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        partner: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// 读取实时重量
    Fetch {
        weighing_id: String,
        /// 人工仪表: 先写入该读数（KG）
        #[arg(long)]
        weight: Option<f64>,
    },

    /// 以实时重量作为毛重
    Gross { weighing_id: String },

    /// 以实时重量作为皮重
    Tare { weighing_id: String },

    /// 完成称重（不回写库存）
    Complete { weighing_id: String },

    /// 净重回写入库单/出库单并完成称重
    UpdateInventory { weighing_id: String },

    /// 取消称重
    Cancel { weighing_id: String },

    /// 关联采购/销售订单（查找或生成入库/出库单）
    LinkOrder {
        weighing_id: String,
        order_id: String,
    },

    /// 关联入库单/出库单
    LinkPicking {
        weighing_id: String,
        picking_id: String,
    },

    /// 待称重的订单与单据
    Pending,

    /// 导入车辆档案（.csv / .xlsx）
    ImportTrucks { file: PathBuf },

    /// 查看称重记录及操作日志
    Show { weighing_id: String },

    /// 读取或修改全局配置
    Config {
        key: String,
        /// 提供时写入
        value: Option<String>,
    },

    /// 导出全部配置（JSON）
    ConfigExport,

    /// 从导出的 JSON 恢复配置
    ConfigImport { file: PathBuf },

    /// 最近的操作日志（全部单据）
    History {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Serialize)]
struct WeighingDetail<T: Serialize, M: Serialize> {
    weighing: T,
    messages: M,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        truck_weighbridge::logging::init_json();
    } else {
        truck_weighbridge::logging::init();
    }

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    if let Some(locale) = &cli.locale {
        truck_weighbridge::i18n::set_locale(locale);
    }

    let actor = cli.actor.as_str();
    let api = &state.weighing_api;

    match cli.command {
        Commands::Init => {
            tracing::info!("{} v{} 数据库已就绪", truck_weighbridge::APP_NAME, truck_weighbridge::VERSION);
            print_json(&serde_json::json!({
                "db_path": state.db_path,
                "version": truck_weighbridge::VERSION,
            }))?;
        }
        Commands::Dashboard { date } => {
            let today = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            print_json(&state.dashboard_api.get_overview_data(today)?)?;
        }
        Commands::Create {
            truck,
            scale,
            product,
            partner,
            notes,
        } => {
            let truck_id = match state.master_repo.find_truck(&truck)? {
                Some(t) => t.truck_id,
                None => state
                    .master_repo
                    .find_truck_by_plate(&truck.to_uppercase())?
                    .map(|t| t.truck_id)
                    .with_context(|| format!("车辆不存在: {}", truck))?,
            };
            let req = CreateWeighingRequest {
                truck_id,
                scale_id: scale,
                product_id: product,
                partner_id: partner,
                notes,
            };
            print_json(&api.create_weighing(req, actor)?)?;
        }
        Commands::Fetch {
            weighing_id,
            weight,
        } => {
            if let Some(weight) = weight {
                let record = api.get_weighing(&weighing_id)?;
                let scale_id = record
                    .scale_id
                    .with_context(|| format!("称重记录未选择地磅: {}", record.reference))?;
                api.set_manual_scale_weight(&scale_id, weight)?;
            }
            print_json(&api.fetch_live_weight(&weighing_id, actor).await?)?;
        }
        Commands::Gross { weighing_id } => {
            print_json(&api.set_gross_from_live(&weighing_id, actor)?)?;
        }
        Commands::Tare { weighing_id } => {
            print_json(&api.set_tare_from_live(&weighing_id, actor)?)?;
        }
        Commands::Complete { weighing_id } => {
            print_json(&api.complete_weighing(&weighing_id, actor)?)?;
        }
        Commands::UpdateInventory { weighing_id } => {
            print_json(&api.update_inventory(&weighing_id, actor).await?)?;
        }
        Commands::Cancel { weighing_id } => {
            print_json(&api.cancel_weighing(&weighing_id, actor)?)?;
        }
        Commands::LinkOrder {
            weighing_id,
            order_id,
        } => {
            print_json(&api.select_order(&weighing_id, &order_id, actor).await?)?;
        }
        Commands::LinkPicking {
            weighing_id,
            picking_id,
        } => {
            print_json(&api.select_picking(&weighing_id, &picking_id, actor)?)?;
        }
        Commands::Pending => {
            print_json(&state.dashboard_api.get_pending_weighing()?)?;
        }
        Commands::ImportTrucks { file } => {
            print_json(&state.import_api.import_trucks(&file, actor)?)?;
        }
        Commands::Show { weighing_id } => {
            print_json(&WeighingDetail {
                weighing: api.get_weighing(&weighing_id)?,
                messages: api.list_messages(&weighing_id)?,
            })?;
        }
        Commands::Config { key, value } => {
            if let Some(value) = value {
                state.config_api.update_config(&key, &value, actor)?;
            }
            print_json(&serde_json::json!({
                "key": key,
                "value": state.config_api.get_config(&key)?,
            }))?;
        }
        Commands::ConfigExport => {
            println!("{}", state.config_api.get_config_snapshot()?);
        }
        Commands::ConfigImport { file } => {
            let snapshot = std::fs::read_to_string(&file)
                .with_context(|| format!("无法读取配置文件: {}", file.display()))?;
            let restored = state.config_api.restore_config_from_snapshot(&snapshot)?;
            print_json(&serde_json::json!({ "restored": restored }))?;
        }
        Commands::History { limit } => {
            print_json(&state.action_log_repo.find_recent(limit)?)?;
        }
    }

    Ok(())
}
