// ==========================================
// 地磅称重系统 - 称重状态机引擎
// ==========================================
// 状态机: draft → gross → tare → done，draft/gross/tare → cancel
// 红线: 净重只由毛重/皮重派生；拒绝时记录保持原样
// ==========================================
// 职责: 前置条件校验 + 状态推进（纯内存，不落库）
// 输入: WeighingRecord
// 输出: 更新后的 WeighingRecord 或 WeighingError
// ==========================================

use crate::domain::master_data::WeighingScale;
use crate::domain::types::WeighingState;
use crate::domain::weighing::{round_kg, WeighingRecord};
use crate::engine::error::{WeighingError, WeighingResult};
use chrono::NaiveDateTime;
use tracing::instrument;

/// 净重 = 毛重 - 皮重（两者均 > 0 时，按 0.001 KG 取整），否则为 0
pub fn compute_net_weight(gross: f64, tare: f64) -> f64 {
    if gross > 0.0 && tare > 0.0 {
        round_kg(gross - tare)
    } else {
        0.0
    }
}

// ==========================================
// WeighingLifecycleEngine - 称重状态机
// ==========================================
pub struct WeighingLifecycleEngine {}

impl WeighingLifecycleEngine {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 地磅与实时读数
    // ==========================================

    /// 校验地磅可用（已选择且启用）
    pub fn require_scale<'a>(
        &self,
        scale: Option<&'a WeighingScale>,
    ) -> WeighingResult<&'a WeighingScale> {
        let scale = scale.ok_or(WeighingError::ScaleRequired)?;
        if !scale.enabled {
            return Err(WeighingError::ScaleDisabled {
                scale: scale.name.clone(),
            });
        }
        Ok(scale)
    }

    /// 写入实时读数
    ///
    /// 不改变状态，重复读取只覆盖 live_weight；终态记录拒绝
    pub fn capture_live(
        &self,
        record: &mut WeighingRecord,
        weight: f64,
        now: NaiveDateTime,
    ) -> WeighingResult<()> {
        if record.state.is_final() {
            return Err(WeighingError::InvalidState {
                state: record.state,
            });
        }
        record.live_weight = weight;
        record.updated_at = now;
        Ok(())
    }

    // ==========================================
    // 毛重 / 皮重
    // ==========================================

    /// 采集毛重: draft/gross → gross
    #[instrument(skip(self, record), fields(weighing_id = %record.weighing_id, state = %record.state))]
    pub fn capture_gross(&self, record: &mut WeighingRecord, now: NaiveDateTime) -> WeighingResult<()> {
        if !matches!(record.state, WeighingState::Draft | WeighingState::Gross) {
            return Err(WeighingError::InvalidState {
                state: record.state,
            });
        }
        if record.live_weight <= 0.0 {
            return Err(WeighingError::LiveWeightRequired);
        }

        record.gross_weight = record.live_weight;
        record.gross_date = Some(now);
        record.net_weight = compute_net_weight(record.gross_weight, record.tare_weight);
        record.state = WeighingState::Gross;
        record.updated_at = now;
        Ok(())
    }

    /// 采集皮重: gross/tare → tare，皮重必须小于毛重
    #[instrument(skip(self, record), fields(weighing_id = %record.weighing_id, state = %record.state))]
    pub fn capture_tare(&self, record: &mut WeighingRecord, now: NaiveDateTime) -> WeighingResult<()> {
        if !matches!(record.state, WeighingState::Gross | WeighingState::Tare) {
            return Err(WeighingError::InvalidState {
                state: record.state,
            });
        }
        if record.live_weight <= 0.0 {
            return Err(WeighingError::LiveWeightRequired);
        }
        if record.live_weight >= record.gross_weight {
            return Err(WeighingError::TareNotLessThanGross {
                tare: record.live_weight,
                gross: record.gross_weight,
            });
        }

        record.tare_weight = record.live_weight;
        record.tare_date = Some(now);
        record.net_weight = compute_net_weight(record.gross_weight, record.tare_weight);
        record.state = WeighingState::Tare;
        record.updated_at = now;
        Ok(())
    }

    // ==========================================
    // 完成 / 取消
    // ==========================================

    /// 完成前置条件: state = tare 且净重 > 0，且已选择物料
    pub fn check_completion(&self, record: &WeighingRecord) -> WeighingResult<()> {
        if record.state != WeighingState::Tare || record.net_weight <= 0.0 {
            return Err(WeighingError::CannotComplete {
                state: record.state,
                net: record.net_weight,
            });
        }
        if record.product_id.is_none() {
            return Err(WeighingError::ProductRequired);
        }
        Ok(())
    }

    /// 完成称重（不回写库存）
    pub fn complete(&self, record: &mut WeighingRecord, now: NaiveDateTime) -> WeighingResult<()> {
        self.check_completion(record)?;
        self.mark_done(record, now);
        Ok(())
    }

    /// 置为完成（前置条件由调用方保证）
    pub(crate) fn mark_done(&self, record: &mut WeighingRecord, now: NaiveDateTime) {
        record.state = WeighingState::Done;
        record.updated_at = now;
    }

    /// 取消: draft/gross/tare → cancel
    pub fn cancel(&self, record: &mut WeighingRecord, now: NaiveDateTime) -> WeighingResult<()> {
        if record.state.is_final() {
            return Err(WeighingError::InvalidState {
                state: record.state,
            });
        }
        record.state = WeighingState::Cancel;
        record.updated_at = now;
        Ok(())
    }
}

impl Default for WeighingLifecycleEngine {
    fn default() -> Self {
        Self::new()
    }
}
