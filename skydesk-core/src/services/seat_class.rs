use tracing::info;
use uuid::Uuid;

use super::found;
use crate::models::{CreateSeatClass, SeatClass, UpdateSeatClass};
use crate::{CoreError, CoreResult, Repositories};

#[derive(Clone)]
pub struct SeatClassService {
    repos: Repositories,
}

impl SeatClassService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn create(&self, req: &CreateSeatClass) -> CoreResult<SeatClass> {
        let seat_class = SeatClass::new(req)?;
        if self.repos.seat_classes.find_by_code(&seat_class.code).await?.is_some() {
            return Err(CoreError::conflict(format!("seat class {} already exists", seat_class.code)));
        }
        self.repos.seat_classes.insert(&seat_class).await?;
        info!(seat_class_id = %seat_class.id, code = %seat_class.code, "Seat class created");
        Ok(seat_class)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<SeatClass> {
        found(self.repos.seat_classes.find(id).await?, "Seat class", id)
    }

    pub async fn list(&self, include_inactive: bool) -> CoreResult<Vec<SeatClass>> {
        self.repos.seat_classes.list(include_inactive).await
    }

    pub async fn update(&self, id: Uuid, req: &UpdateSeatClass) -> CoreResult<SeatClass> {
        let mut seat_class = self.get(id).await?;
        seat_class.apply(req)?;
        self.repos.seat_classes.update(&seat_class).await?;
        Ok(seat_class)
    }

    pub async fn delete(&self, id: Uuid) -> CoreResult<SeatClass> {
        self.update(id, &UpdateSeatClass { is_active: Some(false), ..Default::default() }).await
    }
}
