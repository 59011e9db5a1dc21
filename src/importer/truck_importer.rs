// ==========================================
// 地磅称重系统 - 车辆档案导入
// ==========================================
// 流程: 文件解析 → 字段映射/清洗 → 按车牌 upsert（单事务）→ 导入日志
// 列: plate_number（必填）/ driver_name / max_load_kg，兼容中文表头
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType, TargetType};
use crate::domain::master_data::Truck;
use crate::i18n::{t, t_with_args};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use crate::repository::MasterDataRepository;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const PLATE_HEADERS: &[&str] = &["plate_number", "plate", "车牌号", "车牌"];
const DRIVER_HEADERS: &[&str] = &["driver_name", "driver", "司机", "司机姓名"];
const MAX_LOAD_HEADERS: &[&str] = &["max_load_kg", "max_load", "核定载重", "核定载重(kg)"];

/// 被跳过的行（行号从 2 起，对应表格中的实际行）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

/// 导入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruckImportReport {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
    pub truck_ids: Vec<String>,
    pub message: String,
}

// ==========================================
// TruckImporter
// ==========================================
pub struct TruckImporter {
    master_repo: Arc<MasterDataRepository>,
}

impl TruckImporter {
    pub fn new(master_repo: Arc<MasterDataRepository>) -> Self {
        Self { master_repo }
    }

    /// 从文件导入车辆档案
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P, actor: &str) -> ImportResult<TruckImportReport> {
        let path = file_path.as_ref();
        let records = UniversalFileParser.parse(path)?;
        if let Some(first) = records.first() {
            if !has_any_header(first, PLATE_HEADERS) {
                return Err(ImportError::MissingColumn("plate_number".to_string()));
            }
        }

        let (trucks, skipped) = map_records(&records);
        let imported = trucks.len();

        let message = t_with_args(
            "import.completed",
            &[
                ("imported", imported.to_string().as_str()),
                ("skipped", skipped.len().to_string().as_str()),
            ],
        );
        let log = ActionLog::new(
            TargetType::Truck,
            &path.display().to_string(),
            ActionType::Import,
            actor,
            chrono::Local::now().naive_local(),
        )
        .with_payload(&serde_json::json!({
            "imported": imported,
            "skipped": skipped,
        }))
        .with_detail(message.clone());

        // 车辆与导入日志同一事务
        let truck_ids = self.master_repo.batch_upsert_trucks(&trucks, Some(&log))?;

        tracing::info!(
            file = %path.display(),
            imported = truck_ids.len(),
            skipped = skipped.len(),
            "车辆档案导入完成"
        );

        Ok(TruckImportReport {
            imported: truck_ids.len(),
            skipped,
            truck_ids,
            message,
        })
    }
}

fn has_any_header(row: &RawRecord, aliases: &[&str]) -> bool {
    aliases.iter().any(|a| row.contains_key(*a))
}

fn lookup<'a>(row: &'a RawRecord, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|a| row.get(*a))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

/// 字段映射与清洗: 车牌去空格转大写；文件内重复车牌只保留首行
pub(crate) fn map_records(records: &[RawRecord]) -> (Vec<Truck>, Vec<SkippedRow>) {
    let mut trucks = Vec::new();
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();

    for (idx, row) in records.iter().enumerate() {
        let row_no = idx + 2;
        let plate = match lookup(row, PLATE_HEADERS) {
            Some(p) => p.split_whitespace().collect::<String>().to_uppercase(),
            None => {
                skipped.push(SkippedRow {
                    row: row_no,
                    reason: t("import.skip.plate_missing"),
                });
                continue;
            }
        };
        if !seen.insert(plate.clone()) {
            skipped.push(SkippedRow {
                row: row_no,
                reason: t_with_args("import.skip.duplicate_plate", &[("plate", plate.as_str())]),
            });
            continue;
        }

        let max_load_kg = match lookup(row, MAX_LOAD_HEADERS) {
            None => None,
            Some(raw) => match raw.replace(',', "").parse::<f64>() {
                Ok(v) if v > 0.0 => Some(v),
                _ => {
                    skipped.push(SkippedRow {
                        row: row_no,
                        reason: t_with_args("import.skip.invalid_max_load", &[("value", raw)]),
                    });
                    continue;
                }
            },
        };

        trucks.push(Truck {
            truck_id: uuid::Uuid::new_v4().to_string(),
            plate_number: plate,
            driver_name: lookup(row, DRIVER_HEADERS).map(|s| s.to_string()),
            max_load_kg,
            active: true,
        });
    }
    (trucks, skipped)
}
