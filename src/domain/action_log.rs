// ==========================================
// 地磅称重系统 - 操作日志领域模型
// ==========================================
// 红线: 所有状态变更必须留痕（称重记录 / 库存单据 / 订单）
// 用途: 审计追踪、单据沟通记录
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 对齐: schema action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,        // 日志ID
    pub target_type: String,      // 目标单据类型 (weighing/picking/order)
    pub target_id: String,        // 目标单据ID
    pub action_type: String,      // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime, // 操作时间戳
    pub actor: String,            // 操作人

    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 消息正文
}

// ==========================================
// TargetType - 日志目标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    Weighing,
    Picking,
    Order,
    Truck,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Weighing => "weighing",
            TargetType::Picking => "picking",
            TargetType::Order => "order",
            TargetType::Truck => "truck",
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Create,          // 新建称重
    FetchLiveWeight, // 读取实时重量
    SetGross,        // 采集毛重
    SetTare,         // 采集皮重
    Complete,        // 完成称重（不回写库存）
    UpdateInventory, // 回写库存单据
    QuantityUpdate,  // 单据数量被称重更新（写在入库/出库单上）
    Cancel,          // 取消
    LinkDocument,    // 关联订单/单据
    CreatePicking,   // 由订单生成草稿单据
    Import,          // 车辆档案导入
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "Create",
            ActionType::FetchLiveWeight => "FetchLiveWeight",
            ActionType::SetGross => "SetGross",
            ActionType::SetTare => "SetTare",
            ActionType::Complete => "Complete",
            ActionType::UpdateInventory => "UpdateInventory",
            ActionType::QuantityUpdate => "QuantityUpdate",
            ActionType::Cancel => "Cancel",
            ActionType::LinkDocument => "LinkDocument",
            ActionType::CreatePicking => "CreatePicking",
            ActionType::Import => "Import",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Create" => Some(ActionType::Create),
            "FetchLiveWeight" => Some(ActionType::FetchLiveWeight),
            "SetGross" => Some(ActionType::SetGross),
            "SetTare" => Some(ActionType::SetTare),
            "Complete" => Some(ActionType::Complete),
            "UpdateInventory" => Some(ActionType::UpdateInventory),
            "QuantityUpdate" => Some(ActionType::QuantityUpdate),
            "Cancel" => Some(ActionType::Cancel),
            "LinkDocument" => Some(ActionType::LinkDocument),
            "CreatePicking" => Some(ActionType::CreatePicking),
            "Import" => Some(ActionType::Import),
            _ => None,
        }
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志（ID 自动生成）
    pub fn new(
        target_type: TargetType,
        target_id: &str,
        action_type: ActionType,
        actor: &str,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            target_type: target_type.as_str().to_string(),
            target_id: target_id.to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: now,
            actor: actor.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置消息正文
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_roundtrip() {
        for t in [
            ActionType::Create,
            ActionType::SetGross,
            ActionType::SetTare,
            ActionType::UpdateInventory,
            ActionType::QuantityUpdate,
        ] {
            assert_eq!(ActionType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::parse("Recalc"), None);
    }

    #[test]
    fn test_with_payload_and_detail() {
        let now = chrono::Utc::now().naive_utc();
        let log = ActionLog::new(TargetType::Weighing, "W1", ActionType::SetGross, "op", now)
            .with_payload(&serde_json::json!({"gross_weight": 5000.0}))
            .with_detail("Gross weight set: 5000 KG");

        assert_eq!(log.target_type, "weighing");
        assert_eq!(log.action_type, "SetGross");
        assert_eq!(log.payload_json.unwrap()["gross_weight"], 5000.0);
        assert_eq!(log.detail.as_deref(), Some("Gross weight set: 5000 KG"));
    }
}
