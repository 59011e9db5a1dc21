// ==========================================
// 地磅称重系统 - 车辆档案导入 API
// ==========================================
// 职责: 封装 TruckImporter，统一错误类型
// ==========================================

use crate::api::error::ApiResult;
use crate::importer::{TruckImportReport, TruckImporter};
use std::path::Path;

pub struct ImportApi {
    importer: TruckImporter,
}

impl ImportApi {
    pub fn new(importer: TruckImporter) -> Self {
        Self { importer }
    }

    /// 导入车辆档案（.csv / .xlsx）
    pub fn import_trucks<P: AsRef<Path>>(&self, file_path: P, actor: &str) -> ApiResult<TruckImportReport> {
        let path = file_path.as_ref();
        match self.importer.import_file(path, actor) {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "车辆档案导入失败");
                Err(e.into())
            }
        }
    }
}
