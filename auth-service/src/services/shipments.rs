use async_trait::async_trait;
use mongodb::bson::doc;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::ShipmentBankRecord;
use crate::services::database::MongoDb;
use crate::services::error::AuthError;

/// Narrow read-only view into shipment counterpart bank details. Shipment
/// CRUD itself lives in the business services; this core only reads the
/// sensitive slice the unmask flow discloses.
#[async_trait]
pub trait ShipmentDirectory: Send + Sync {
    async fn find_bank_record(&self, shipment_id: &str)
        -> Result<Option<ShipmentBankRecord>, AuthError>;
}

#[derive(Clone)]
pub struct MongoShipmentDirectory {
    db: MongoDb,
}

impl MongoShipmentDirectory {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShipmentDirectory for MongoShipmentDirectory {
    async fn find_bank_record(
        &self,
        shipment_id: &str,
    ) -> Result<Option<ShipmentBankRecord>, AuthError> {
        self.db
            .run(self.db.shipments().find_one(doc! { "_id": shipment_id }, None))
            .await
    }
}

/// In-memory shipment directory for tests.
#[derive(Default)]
pub struct MockShipmentDirectory {
    records: Mutex<HashMap<String, ShipmentBankRecord>>,
}

impl MockShipmentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ShipmentBankRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(record.id.clone(), record);
        }
    }
}

#[async_trait]
impl ShipmentDirectory for MockShipmentDirectory {
    async fn find_bank_record(
        &self,
        shipment_id: &str,
    ) -> Result<Option<ShipmentBankRecord>, AuthError> {
        let records = self
            .records
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        Ok(records.get(shipment_id).cloned())
    }
}
