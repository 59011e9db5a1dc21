// ==========================================
// 地磅称重系统 - 引擎层错误类型
// ==========================================
// 每个前置条件一个变体；user_message() 输出本地化提示
// 红线: 拒绝即中止，不重试、不部分提交
// ==========================================

use crate::domain::types::{PickingType, WeighingState};
use crate::i18n::{t, t_with_args};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeighingError {
    // ===== 地磅 =====
    #[error("未选择地磅")]
    ScaleRequired,

    #[error("地磅已停用: {scale}")]
    ScaleDisabled { scale: String },

    #[error("地磅读数失败: {reason}")]
    ScaleReadFailed { reason: String },

    // ===== 重量 =====
    #[error("未读取实时重量")]
    LiveWeightRequired,

    #[error("皮重必须小于毛重 (tare={tare}, gross={gross})")]
    TareNotLessThanGross { tare: f64, gross: f64 },

    #[error("当前状态不允许该操作: {state}")]
    InvalidState { state: WeighingState },

    #[error("记录已被其他操作修改")]
    Stale,

    #[error("无法完成称重: 状态={state}, 净重={net}")]
    CannotComplete { state: WeighingState, net: f64 },

    #[error("无法回写库存: 状态={state}, 净重={net}")]
    CannotUpdateInventory { state: WeighingState, net: f64 },

    // ===== 关联单据 =====
    #[error("未选择物料")]
    ProductRequired,

    #[error("未关联库存单据 ({})", .picking_type.as_str())]
    PickingRequired { picking_type: PickingType },

    #[error("单据 {picking} 中不存在物料 {product}")]
    ProductNotInPicking { product: String, picking: String },

    #[error("单据已关闭: {picking}")]
    PickingClosed { picking: String },

    #[error("未关联订单")]
    NoOrderLinked,

    #[error("未关联库存单据")]
    NoPickingLinked,
}

impl WeighingError {
    /// 面向操作员的提示（随当前语言）
    pub fn user_message(&self) -> String {
        match self {
            WeighingError::ScaleRequired => t("errors.scale_required"),
            WeighingError::ScaleDisabled { scale } => {
                t_with_args("errors.scale_disabled", &[("scale", scale.as_str())])
            }
            WeighingError::ScaleReadFailed { reason } => {
                t_with_args("errors.scale_read_failed", &[("reason", reason.as_str())])
            }
            WeighingError::LiveWeightRequired => t("errors.live_weight_required"),
            WeighingError::TareNotLessThanGross { .. } => t("errors.tare_not_less_than_gross"),
            WeighingError::InvalidState { state } => {
                t_with_args("errors.invalid_state", &[("state", state.as_str())])
            }
            WeighingError::Stale => t("errors.stale"),
            WeighingError::CannotComplete { .. } => t("errors.cannot_complete"),
            WeighingError::CannotUpdateInventory { .. } => t("errors.cannot_update_inventory"),
            WeighingError::ProductRequired => t("errors.product_required"),
            WeighingError::PickingRequired { picking_type } => match picking_type {
                PickingType::Incoming => t("errors.receipt_required"),
                PickingType::Outgoing => t("errors.delivery_required"),
            },
            WeighingError::ProductNotInPicking { product, picking } => t_with_args(
                "errors.product_not_in_picking",
                &[("product", product.as_str()), ("picking", picking.as_str())],
            ),
            WeighingError::PickingClosed { picking } => {
                t_with_args("errors.picking_closed", &[("picking", picking.as_str())])
            }
            WeighingError::NoOrderLinked => t("errors.no_order_linked"),
            WeighingError::NoPickingLinked => t("errors.no_picking_linked"),
        }
    }
}

pub type WeighingResult<T> = Result<T, WeighingError>;
