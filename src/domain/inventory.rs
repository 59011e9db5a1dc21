// ==========================================
// 地磅称重系统 - 库存单据领域模型
// ==========================================
// 入库单/出库单 (StockPicking) → 库存移动 (StockMove) → 移动明细 (StockMoveLine)
// 红线: 称重记录只回写明细数量，不修改需求数量
// ==========================================

use crate::domain::types::{PickingState, PickingType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// StockPicking - 库存单据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPicking {
    pub picking_id: String,
    pub name: String,
    pub picking_type: PickingType,
    pub state: PickingState,
    pub partner_id: Option<String>,
    pub origin: Option<String>, // 来源订单号
    pub location_src_id: Option<String>,
    pub location_dest_id: Option<String>,
    pub scheduled_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// StockMove - 库存移动（需求数量）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMove {
    pub move_id: String,
    pub picking_id: String,
    pub product_id: String,
    pub demand_qty: f64, // 需求数量
    pub order_line_id: Option<String>,
}

// ==========================================
// StockMoveLine - 移动明细（实收/实发数量）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMoveLine {
    pub move_line_id: String,
    pub move_id: String,
    pub picking_id: String,
    pub product_id: String,
    pub quantity: f64,
    pub location_src_id: Option<String>,
    pub location_dest_id: Option<String>,
}

// ==========================================
// PickingDetail - 单据 + 移动 + 明细
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickingDetail {
    pub picking: StockPicking,
    pub moves: Vec<StockMove>,
    pub move_lines: Vec<StockMoveLine>,
}

impl PickingDetail {
    /// 指定物料的首个库存移动
    pub fn move_for_product(&self, product_id: &str) -> Option<&StockMove> {
        self.moves.iter().find(|m| m.product_id == product_id)
    }

    /// 指定库存移动下的全部明细
    pub fn lines_of_move(&self, move_id: &str) -> Vec<&StockMoveLine> {
        self.move_lines
            .iter()
            .filter(|l| l.move_id == move_id)
            .collect()
    }

    /// 需求数量合计
    pub fn total_demand(&self) -> f64 {
        self.moves.iter().map(|m| m.demand_qty).sum()
    }
}

// ==========================================
// PickingToWeigh - 待过磅单据（看板读模型）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickingToWeigh {
    pub picking: StockPicking,
    pub total_demand: f64,
}

// ==========================================
// QuantityWriteback - 净重回写计划
// ==========================================
// 由核对引擎生成，仓储层在同一事务内整体提交
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityWriteback {
    pub picking_id: String,
    pub picking_state: PickingState, // 写入后的单据状态
    pub move_id: String,
    pub quantity: f64,
    pub update_line_ids: Vec<String>,     // 覆盖数量的已有明细
    pub new_line: Option<StockMoveLine>,  // 无明细时新建
}
