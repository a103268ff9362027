//! Equipment management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::Actor,
        equipment::{CreateEquipment, Equipment, EquipmentQuery, EquipmentTypeSummary, UpdateEquipment},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<(Vec<Equipment>, i64)> {
        self.repository.equipment.list(query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        self.repository.equipment.get_by_id(id).await
    }

    pub async fn types_summary(&self) -> AppResult<Vec<EquipmentTypeSummary>> {
        self.repository.equipment.types_summary().await
    }

    pub async fn create(&self, data: &CreateEquipment, actor: &Actor) -> AppResult<Equipment> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.equipment.serial_exists(&data.serial_number, None).await? {
            return Err(AppError::Conflict(format!(
                "Serial number \"{}\" already exists",
                data.serial_number
            )));
        }

        self.repository.equipment.create(data, actor).await
    }

    /// Bulk import. All units are created in one transaction; a duplicate
    /// serial anywhere in the batch aborts the whole import.
    pub async fn import(&self, items: &[CreateEquipment], actor: &Actor) -> AppResult<Vec<Equipment>> {
        if items.is_empty() {
            return Err(AppError::Validation("Import batch is empty".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        for data in items {
            data.validate()
                .map_err(|e| AppError::Validation(e.to_string()))?;
            if !seen.insert(data.serial_number.as_str()) {
                return Err(AppError::Conflict(format!(
                    "Serial number \"{}\" appears twice in the batch",
                    data.serial_number
                )));
            }
            if self.repository.equipment.serial_exists(&data.serial_number, None).await? {
                return Err(AppError::Conflict(format!(
                    "Serial number \"{}\" already exists",
                    data.serial_number
                )));
            }
        }

        self.repository.equipment.import(items, actor).await
    }

    pub async fn update(&self, id: i32, data: &UpdateEquipment, actor: &Actor) -> AppResult<Equipment> {
        if let Some(ref serial) = data.serial_number {
            if self.repository.equipment.serial_exists(serial, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "Serial number \"{}\" already exists",
                    serial
                )));
            }
        }

        self.repository.equipment.update(id, data, actor).await
    }

    pub async fn delete(&self, id: i32, actor: &Actor) -> AppResult<()> {
        self.repository.equipment.soft_delete(id, actor).await
    }
}
