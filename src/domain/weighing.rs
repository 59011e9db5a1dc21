// ==========================================
// 地磅称重系统 - 称重记录领域模型
// ==========================================
// 一车一记录: 毛重（重车）、皮重（空车）、净重（派生）
// 红线: 净重只由毛重/皮重派生，禁止直接写入
// ==========================================

use crate::domain::types::{OrderKind, WeighingState};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 编号未分配前的占位引用
pub const NEW_REFERENCE: &str = "New";

/// 重量精度: 0.001 KG（与 format_kg 显示一致）
pub fn round_kg(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ==========================================
// WeighingRecord - 称重记录
// ==========================================
// 对齐: schema truck_weighing 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeighingRecord {
    // ===== 标识 =====
    pub weighing_id: String, // 记录ID (UUID)
    pub reference: String,   // 顺序编号 (WGH/00001)
    pub active: bool,

    // ===== 地磅 / 车辆 / 物料 =====
    pub scale_id: Option<String>,
    pub truck_id: String,
    pub truck_plate: Option<String>, // 车牌（来自车辆档案）
    pub driver_name: Option<String>, // 司机（来自车辆档案，可改）
    pub product_id: Option<String>,

    // ===== 业务关联（不拥有，只回写数量）=====
    pub partner_id: Option<String>,
    pub order_kind: Option<OrderKind>,
    pub order_id: Option<String>,
    pub order_line_id: Option<String>,
    pub picking_id: Option<String>, // 入库单/出库单
    pub location_dest_id: Option<String>,

    // ===== 重量 (KG) =====
    pub live_weight: f64,
    pub gross_weight: f64,
    pub tare_weight: f64,
    pub net_weight: f64,

    // ===== 时间 =====
    pub weighing_date: NaiveDateTime,
    pub gross_date: Option<NaiveDateTime>,
    pub tare_date: Option<NaiveDateTime>,

    // ===== 状态 =====
    pub state: WeighingState,
    pub notes: Option<String>,

    // ===== 审计 =====
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl WeighingRecord {
    /// 创建草稿称重记录
    pub fn new_draft(
        weighing_id: String,
        reference: String,
        truck_id: String,
        created_by: String,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            weighing_id,
            reference,
            active: true,
            scale_id: None,
            truck_id,
            truck_plate: None,
            driver_name: None,
            product_id: None,
            partner_id: None,
            order_kind: None,
            order_id: None,
            order_line_id: None,
            picking_id: None,
            location_dest_id: None,
            live_weight: 0.0,
            gross_weight: 0.0,
            tare_weight: 0.0,
            net_weight: 0.0,
            weighing_date: now,
            gross_date: None,
            tare_date: None,
            state: WeighingState::Draft,
            notes: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否已关联采购单
    pub fn is_purchase(&self) -> bool {
        self.order_kind == Some(OrderKind::Purchase)
    }

    /// 是否已关联销售单
    pub fn is_sale(&self) -> bool {
        self.order_kind == Some(OrderKind::Sale)
    }
}

// ==========================================
// CreateWeighingRequest - 新建称重请求
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateWeighingRequest {
    pub truck_id: String,
    pub scale_id: Option<String>,
    pub product_id: Option<String>,
    pub partner_id: Option<String>,
    pub notes: Option<String>,
}

// ==========================================
// WeighingFilter - 列表筛选
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeighingFilter {
    pub state: Option<WeighingState>,
    pub order_id: Option<String>,
    pub picking_id: Option<String>,
    pub truck_id: Option<String>,
    pub limit: Option<i64>,
}
