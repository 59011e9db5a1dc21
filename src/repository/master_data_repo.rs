// ==========================================
// 地磅称重系统 - 主数据仓储
// ==========================================
// 车辆 / 物料 / 业务伙伴 / 库位
// 车辆按车牌 upsert（导入使用）
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::master_data::{Partner, Product, StockLocation, Truck};
use crate::domain::types::LocationUsage;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{invalid_enum, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct MasterDataRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MasterDataRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 车辆
    // ==========================================

    /// 按车牌 upsert 车辆档案
    ///
    /// # 返回
    /// - Ok(truck_id): 已存在车牌时返回原 truck_id
    pub fn upsert_truck_by_plate(&self, truck: &Truck) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::upsert_truck_tx(&conn, truck)
    }

    /// 批量 upsert（整批一个事务）
    pub fn batch_upsert_trucks(
        &self,
        trucks: &[Truck],
        log: Option<&ActionLog>,
    ) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(trucks.len());
        for truck in trucks {
            ids.push(Self::upsert_truck_tx(&tx, truck)?);
        }
        if let Some(log) = log {
            ActionLogRepository::insert_tx(&tx, log)?;
        }
        tx.commit()?;
        Ok(ids)
    }

    fn upsert_truck_tx(conn: &Connection, truck: &Truck) -> RepositoryResult<String> {
        let existing: Option<String> = conn
            .query_row(
                "SELECT truck_id FROM truck WHERE plate_number = ?1",
                params![truck.plate_number],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(truck_id) => {
                conn.execute(
                    "UPDATE truck SET driver_name = ?2, max_load_kg = ?3, active = ?4 WHERE truck_id = ?1",
                    params![truck_id, truck.driver_name, truck.max_load_kg, truck.active as i32],
                )?;
                Ok(truck_id)
            }
            None => {
                conn.execute(
                    "INSERT INTO truck (truck_id, plate_number, driver_name, max_load_kg, active) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        truck.truck_id,
                        truck.plate_number,
                        truck.driver_name,
                        truck.max_load_kg,
                        truck.active as i32
                    ],
                )?;
                Ok(truck.truck_id.clone())
            }
        }
    }

    pub fn find_truck(&self, truck_id: &str) -> RepositoryResult<Option<Truck>> {
        let conn = self.get_conn()?;
        let truck = conn
            .query_row(
                "SELECT truck_id, plate_number, driver_name, max_load_kg, active FROM truck WHERE truck_id = ?1",
                params![truck_id],
                map_truck,
            )
            .optional()?;
        Ok(truck)
    }

    pub fn find_truck_by_plate(&self, plate_number: &str) -> RepositoryResult<Option<Truck>> {
        let conn = self.get_conn()?;
        let truck = conn
            .query_row(
                "SELECT truck_id, plate_number, driver_name, max_load_kg, active FROM truck WHERE plate_number = ?1",
                params![plate_number],
                map_truck,
            )
            .optional()?;
        Ok(truck)
    }

    pub fn list_active_trucks(&self) -> RepositoryResult<Vec<Truck>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT truck_id, plate_number, driver_name, max_load_kg, active FROM truck WHERE active = 1 ORDER BY plate_number",
        )?;
        let trucks = stmt
            .query_map([], map_truck)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(trucks)
    }

    // ==========================================
    // 物料
    // ==========================================

    pub fn upsert_product(&self, product: &Product) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO product (product_id, name, uom, is_weighable) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(product_id) DO UPDATE SET name = ?2, uom = ?3, is_weighable = ?4
            "#,
            params![product.product_id, product.name, product.uom, product.is_weighable as i32],
        )?;
        Ok(())
    }

    pub fn find_product(&self, product_id: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let product = conn
            .query_row(
                "SELECT product_id, name, uom, is_weighable FROM product WHERE product_id = ?1",
                params![product_id],
                |row| {
                    Ok(Product {
                        product_id: row.get(0)?,
                        name: row.get(1)?,
                        uom: row.get(2)?,
                        is_weighable: row.get::<_, i32>(3)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(product)
    }

    // ==========================================
    // 业务伙伴
    // ==========================================

    pub fn upsert_partner(&self, partner: &Partner) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO partner (partner_id, name, customer_location_id) VALUES (?1, ?2, ?3)
            ON CONFLICT(partner_id) DO UPDATE SET name = ?2, customer_location_id = ?3
            "#,
            params![partner.partner_id, partner.name, partner.customer_location_id],
        )?;
        Ok(())
    }

    pub fn find_partner(&self, partner_id: &str) -> RepositoryResult<Option<Partner>> {
        let conn = self.get_conn()?;
        let partner = conn
            .query_row(
                "SELECT partner_id, name, customer_location_id FROM partner WHERE partner_id = ?1",
                params![partner_id],
                |row| {
                    Ok(Partner {
                        partner_id: row.get(0)?,
                        name: row.get(1)?,
                        customer_location_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(partner)
    }

    // ==========================================
    // 库位
    // ==========================================

    pub fn upsert_location(&self, location: &StockLocation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stock_location (location_id, name, usage) VALUES (?1, ?2, ?3)
            ON CONFLICT(location_id) DO UPDATE SET name = ?2, usage = ?3
            "#,
            params![location.location_id, location.name, location.usage.as_str()],
        )?;
        Ok(())
    }

    pub fn find_location(&self, location_id: &str) -> RepositoryResult<Option<StockLocation>> {
        let conn = self.get_conn()?;
        let location = conn
            .query_row(
                "SELECT location_id, name, usage FROM stock_location WHERE location_id = ?1",
                params![location_id],
                |row| {
                    let raw: String = row.get(2)?;
                    Ok(StockLocation {
                        location_id: row.get(0)?,
                        name: row.get(1)?,
                        usage: LocationUsage::parse(&raw).ok_or_else(|| invalid_enum("usage", &raw))?,
                    })
                },
            )
            .optional()?;
        Ok(location)
    }
}

fn map_truck(row: &Row) -> SqliteResult<Truck> {
    Ok(Truck {
        truck_id: row.get(0)?,
        plate_number: row.get(1)?,
        driver_name: row.get(2)?,
        max_load_kg: row.get(3)?,
        active: row.get::<_, i32>(4)? != 0,
    })
}
