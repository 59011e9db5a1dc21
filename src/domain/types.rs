// ==========================================
// 地磅称重系统 - 领域类型定义
// ==========================================
// 职责: 状态枚举、单据类型、收发货核对结果
// 约定: 数据库存储统一使用小写字符串（as_str / parse）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 称重状态 (Weighing State)
// ==========================================
// 状态机: draft → gross → tare → done，draft/gross/tare 可取消
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeighingState {
    Draft,  // 草稿
    Gross,  // 已采集毛重
    Tare,   // 已采集皮重
    Done,   // 完成
    Cancel, // 已取消
}

impl WeighingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeighingState::Draft => "draft",
            WeighingState::Gross => "gross",
            WeighingState::Tare => "tare",
            WeighingState::Done => "done",
            WeighingState::Cancel => "cancel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(WeighingState::Draft),
            "gross" => Some(WeighingState::Gross),
            "tare" => Some(WeighingState::Tare),
            "done" => Some(WeighingState::Done),
            "cancel" => Some(WeighingState::Cancel),
            _ => None,
        }
    }

    /// 是否为终态（完成/取消后不再接受任何称重动作）
    pub fn is_final(&self) -> bool {
        matches!(self, WeighingState::Done | WeighingState::Cancel)
    }
}

impl fmt::Display for WeighingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 订单类型 (采购 / 销售)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Purchase, // 采购 → 入库单
    Sale,     // 销售 → 出库单
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Purchase => "purchase",
            OrderKind::Sale => "sale",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(OrderKind::Purchase),
            "sale" => Some(OrderKind::Sale),
            _ => None,
        }
    }

    /// 订单对应的库存单据类型
    pub fn picking_type(&self) -> PickingType {
        match self {
            OrderKind::Purchase => PickingType::Incoming,
            OrderKind::Sale => PickingType::Outgoing,
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 订单状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Draft,     // 草稿/询价
    Confirmed, // 已确认（采购单 purchase / 销售单 sale）
    Done,      // 已锁定
    Cancel,    // 已取消
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Draft => "draft",
            OrderState::Confirmed => "confirmed",
            OrderState::Done => "done",
            OrderState::Cancel => "cancel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(OrderState::Draft),
            "confirmed" => Some(OrderState::Confirmed),
            "done" => Some(OrderState::Done),
            "cancel" => Some(OrderState::Cancel),
            _ => None,
        }
    }
}

// ==========================================
// 库存单据类型 (入库 / 出库)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickingType {
    Incoming, // 入库单（Receipt）
    Outgoing, // 出库单（Delivery）
}

impl PickingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickingType::Incoming => "incoming",
            PickingType::Outgoing => "outgoing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "incoming" => Some(PickingType::Incoming),
            "outgoing" => Some(PickingType::Outgoing),
            _ => None,
        }
    }

    /// 单据名称前缀
    pub fn name_prefix(&self) -> &'static str {
        match self {
            PickingType::Incoming => "IN",
            PickingType::Outgoing => "OUT",
        }
    }
}

// ==========================================
// 库存单据状态
// ==========================================
// draft → confirmed/waiting → assigned → done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickingState {
    Draft,
    Waiting,
    Confirmed,
    Assigned,
    Done,
    Cancel,
}

impl PickingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickingState::Draft => "draft",
            PickingState::Waiting => "waiting",
            PickingState::Confirmed => "confirmed",
            PickingState::Assigned => "assigned",
            PickingState::Done => "done",
            PickingState::Cancel => "cancel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PickingState::Draft),
            "waiting" => Some(PickingState::Waiting),
            "confirmed" => Some(PickingState::Confirmed),
            "assigned" => Some(PickingState::Assigned),
            "done" => Some(PickingState::Done),
            "cancel" => Some(PickingState::Cancel),
            _ => None,
        }
    }

    /// 未完成单据（可被称重记录关联）
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            PickingState::Draft
                | PickingState::Waiting
                | PickingState::Confirmed
                | PickingState::Assigned
        )
    }

    /// 写入数量前的状态推进: draft → confirmed → assigned
    pub fn ready_for_quantities(&self) -> PickingState {
        match self {
            PickingState::Draft | PickingState::Confirmed | PickingState::Waiting => {
                PickingState::Assigned
            }
            other => *other,
        }
    }
}

impl fmt::Display for PickingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 库位用途
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationUsage {
    Supplier, // 供应商库位
    Internal, // 内部库位
    Customer, // 客户库位
}

impl LocationUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationUsage::Supplier => "supplier",
            LocationUsage::Internal => "internal",
            LocationUsage::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "supplier" => Some(LocationUsage::Supplier),
            "internal" => Some(LocationUsage::Internal),
            "customer" => Some(LocationUsage::Customer),
            _ => None,
        }
    }
}

// ==========================================
// 收发货核对结果
// ==========================================
// 净重 vs 需求数量: 超收/超发、短收/短发、相符
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Over { delta_kg: f64 },
    Under { delta_kg: f64 },
    Exact,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Over { .. } => "over",
            DeliveryStatus::Under { .. } => "under",
            DeliveryStatus::Exact => "exact",
        }
    }
}
