// ==========================================
// 地磅称重系统 - 主数据领域模型
// ==========================================
// 地磅、操作员、车辆、物料、业务伙伴、库位
// 用途: 称重流程只读引用，不在此处维护业务规则
// ==========================================

use crate::domain::types::LocationUsage;
use serde::{Deserialize, Serialize};

// ==========================================
// WeighingScale - 地磅
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeighingScale {
    pub scale_id: String,
    pub name: String,
    pub enabled: bool,
    pub connection: ScaleConnection,
}

/// 地磅仪表连接方式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleConnection {
    /// 手工/模拟仪表: 读数为录入值
    Manual { weight_kg: f64 },
    /// 称重仪表 TCP 输出（ASCII 帧）
    Tcp { host: String, port: u16 },
}

impl ScaleConnection {
    pub fn kind(&self) -> &'static str {
        match self {
            ScaleConnection::Manual { .. } => "manual",
            ScaleConnection::Tcp { .. } => "tcp",
        }
    }
}

// ==========================================
// Operator - 过磅操作员
// ==========================================
// 默认地磅选择: default_scale_id → assigned_scale_ids[0]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub user_id: String,
    pub name: String,
    pub default_scale_id: Option<String>,
    pub assigned_scale_ids: Vec<String>,
}

// ==========================================
// Truck - 车辆档案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truck {
    pub truck_id: String,
    pub plate_number: String,
    pub driver_name: Option<String>,
    pub max_load_kg: Option<f64>, // 核定载重
    pub active: bool,
}

// ==========================================
// Product - 物料
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub uom: String,
    pub is_weighable: bool, // 是否需要过磅
}

// ==========================================
// Partner - 业务伙伴（供应商/客户）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub partner_id: String,
    pub name: String,
    pub customer_location_id: Option<String>, // 客户库位（出库目的地）
}

// ==========================================
// StockLocation - 库位
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLocation {
    pub location_id: String,
    pub name: String,
    pub usage: LocationUsage,
}
