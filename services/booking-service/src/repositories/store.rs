// Implementasi Postgres untuk trait storage engine & coordinator
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    booking_coordinator::{BookingStore, BookingTx},
    domain::{
        session::{NewSession, Session},
        slot::AvailabilitySlot,
        template::ScheduleTemplate,
    },
    error::StoreError,
    repositories::{session_repo, slot_repo, template_repo},
    schedule_engine::ScheduleStore,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for PgStore {
    async fn active_templates(&self, specialist_id: i32) -> Result<Vec<ScheduleTemplate>, StoreError> {
        Ok(template_repo::list_active_templates(&self.pool, specialist_id).await?)
    }

    async fn slot_exists(&self, specialist_id: i32, start_time: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(slot_repo::slot_exists(&self.pool, specialist_id, start_time).await?)
    }

    async fn insert_slot(
        &self,
        specialist_id: i32,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<AvailabilitySlot, StoreError> {
        Ok(slot_repo::create_slot(&self.pool, specialist_id, start_time, end_time).await?)
    }
}

// Transaction booking di atas satu koneksi pool
pub struct PgBookingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingStore for PgStore {
    type Tx = PgBookingTx;

    async fn begin(&self) -> Result<PgBookingTx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgBookingTx { tx })
    }

    async fn find_slot(&self, slot_id: i32) -> Result<Option<AvailabilitySlot>, StoreError> {
        Ok(slot_repo::find_slot_by_id(&self.pool, slot_id).await?)
    }

    async fn delete_available_slot(&self, slot_id: i32, specialist_id: i32) -> Result<u64, StoreError> {
        Ok(slot_repo::delete_available_slot(&self.pool, slot_id, specialist_id).await?)
    }
}

#[async_trait]
impl BookingTx for PgBookingTx {
    async fn lock_available_slot(&mut self, slot_id: i32) -> Result<Option<AvailabilitySlot>, StoreError> {
        Ok(slot_repo::lock_available_slot(&mut self.tx, slot_id).await?)
    }

    async fn mark_booked(&mut self, slot_id: i32) -> Result<(), StoreError> {
        Ok(slot_repo::mark_slot_booked(&mut self.tx, slot_id).await?)
    }

    async fn insert_session(&mut self, session: &NewSession) -> Result<Session, StoreError> {
        Ok(session_repo::insert_session(&mut self.tx, session).await?)
    }

    async fn commit(self) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(self.tx.rollback().await?)
    }
}
