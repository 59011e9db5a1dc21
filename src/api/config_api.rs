// ==========================================
// 地磅称重系统 - 配置管理 API
// ==========================================
// 职责: 全局配置查询、更新、快照
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::i18n::{normalize_locale, SUPPORTED_LOCALES};
use std::error::Error;
use std::sync::Arc;

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

fn internal(err: Box<dyn Error>) -> ApiError {
    ApiError::InternalError(err.to_string())
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    pub fn get_config(&self, key: &str) -> ApiResult<Option<String>> {
        self.config_manager.get_global_config_value(key).map_err(internal)
    }

    /// 更新配置
    ///
    /// 容差、超时等数值项在写入前校验
    pub fn update_config(&self, key: &str, value: &str, actor: &str) -> ApiResult<()> {
        if key.trim().is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }
        if key == crate::config::config_keys::RECONCILE_TOLERANCE_KG {
            match value.trim().parse::<f64>() {
                Ok(v) if v >= 0.0 => {}
                _ => {
                    return Err(ApiError::InvalidInput(format!(
                        "容差必须为非负数: {}",
                        value
                    )))
                }
            }
        }
        if key == crate::config::config_keys::SCALE_TCP_TIMEOUT_MS
            && value.trim().parse::<u64>().map(|v| v == 0).unwrap_or(true)
        {
            return Err(ApiError::InvalidInput(format!("超时必须为正整数: {}", value)));
        }
        if key == crate::config::config_keys::LOCALE && normalize_locale(value).is_none() {
            return Err(ApiError::InvalidInput(format!(
                "不支持的语言: {}（可选: {}）",
                value,
                SUPPORTED_LOCALES.join(" / ")
            )));
        }

        self.config_manager
            .set_global_config_value(key, value.trim())
            .map_err(internal)?;
        tracing::info!(key = %key, value = %value, actor = %actor, "配置已更新");
        Ok(())
    }

    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager.get_config_snapshot().map_err(internal)
    }

    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ApiResult<usize> {
        self.config_manager
            .restore_config_from_snapshot(snapshot_json)
            .map_err(internal)
    }
}
