// ==========================================
// 地磅称重系统 - 导入层
// ==========================================
// 职责: 外部车辆档案导入（Excel / CSV）
// ==========================================

pub mod error;
pub mod file_parser;
pub mod truck_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use truck_importer::{SkippedRow, TruckImportReport, TruckImporter};
