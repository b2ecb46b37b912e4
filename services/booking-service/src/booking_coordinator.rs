// Claim satu slot untuk satu client secara atomic.
// Concurrency di-serialize oleh row lock di transaction, bukan di memory.
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::{
    domain::{
        session::{NewSession, Session},
        slot::AvailabilitySlot,
    },
    error::{AppError, AppResult, StoreError},
};

/// Storage untuk booking: buka transaction dan lookup slot tanpa lock
#[async_trait]
pub trait BookingStore: Send + Sync {
    type Tx: BookingTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn find_slot(&self, slot_id: i32) -> Result<Option<AvailabilitySlot>, StoreError>;

    /// Hapus slot kalau masih available dan milik specialist. Return jumlah row terhapus.
    async fn delete_available_slot(&self, slot_id: i32, specialist_id: i32) -> Result<u64, StoreError>;
}

/// Operasi di dalam satu transaction booking
#[async_trait]
pub trait BookingTx: Send + Sized {
    /// Lock slot kalau masih available. Block sampai lock lain selesai.
    async fn lock_available_slot(&mut self, slot_id: i32) -> Result<Option<AvailabilitySlot>, StoreError>;

    async fn mark_booked(&mut self, slot_id: i32) -> Result<(), StoreError>;

    async fn insert_session(&mut self, session: &NewSession) -> Result<Session, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot is no longer available")]
    SlotUnavailable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SlotNotFound => AppError::not_found("Slot not found"),
            BookingError::SlotUnavailable => AppError::conflict("Slot is no longer available"),
            BookingError::Store(e) => AppError::from(e),
        }
    }
}

// Rollback tanpa menutupi error utama
async fn abort<T: BookingTx>(tx: T, slot_id: i32) {
    if let Err(e) = tx.rollback().await {
        tracing::error!(slot_id, "Rollback booking transaction failed: {}", e);
    }
}

/// Book slot untuk client. Sukses hanya kalau slot available dan belum mulai;
/// specialist session selalu diambil dari slot.
pub async fn book_slot<S>(store: &S, slot_id: i32, client_id: i32) -> Result<Session, BookingError>
where
    S: BookingStore + ?Sized,
{
    let mut tx = store.begin().await?;

    let slot = match tx.lock_available_slot(slot_id).await {
        Ok(Some(slot)) => slot,
        Ok(None) => {
            abort(tx, slot_id).await;
            // Bedakan slot yang tidak ada dengan slot yang sudah di-book
            return match store.find_slot(slot_id).await? {
                Some(_) => Err(BookingError::SlotUnavailable),
                None => Err(BookingError::SlotNotFound),
            };
        }
        Err(e) => {
            abort(tx, slot_id).await;
            return Err(e.into());
        }
    };

    if slot.start_time <= Utc::now() {
        abort(tx, slot_id).await;
        tracing::warn!(slot_id, client_id, "Booking rejected, slot already started");
        return Err(BookingError::SlotUnavailable);
    }

    let new_session = NewSession {
        slot_id: slot.id,
        specialist_id: slot.specialist_id,
        client_id,
        start_time: slot.start_time,
        end_time: slot.end_time,
    };

    if let Err(e) = tx.mark_booked(slot.id).await {
        abort(tx, slot_id).await;
        return Err(e.into());
    }

    let session = match tx.insert_session(&new_session).await {
        Ok(session) => session,
        Err(e) => {
            abort(tx, slot_id).await;
            return Err(e.into());
        }
    };

    tx.commit().await?;

    tracing::info!(
        slot_id,
        client_id,
        specialist_id = session.specialist_id,
        session_id = session.id,
        "Slot booked"
    );

    Ok(session)
}

// Slot hanya boleh dihapus pemiliknya dan selama belum di-book
fn check_deletable(slot: &AvailabilitySlot, specialist_id: i32) -> AppResult {
    if !slot.is_owned_by(specialist_id) {
        return Err(AppError::forbidden("You can only delete your own slots"));
    }
    if !slot.is_available() {
        return Err(AppError::conflict("Booked slots cannot be deleted"));
    }
    Ok(())
}

/// Hapus slot milik specialist yang belum di-book.
/// Booking yang commit duluan di antara lookup dan delete jadi conflict.
pub async fn delete_slot<S>(store: &S, slot_id: i32, specialist_id: i32) -> AppResult
where
    S: BookingStore + ?Sized,
{
    let slot = store
        .find_slot(slot_id)
        .await?
        .ok_or_else(|| AppError::not_found("Slot not found"))?;

    check_deletable(&slot, specialist_id)?;

    let deleted = store.delete_available_slot(slot_id, specialist_id).await?;
    if deleted == 0 {
        tracing::warn!(slot_id, specialist_id, "Slot delete lost race with booking");
        return Err(AppError::conflict("Slot was booked before it could be deleted"));
    }

    tracing::info!(slot_id, specialist_id, "Slot deleted");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryBookingStore;
    use super::*;
    use chrono::{Duration, Utc};

    fn future_slot(id: i32, specialist_id: i32) -> AvailabilitySlot {
        let start = Utc::now() + Duration::days(2);
        AvailabilitySlot {
            id,
            specialist_id,
            start_time: start,
            end_time: start + Duration::minutes(30),
            status: "available".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_book_available_slot() {
        let store = MemoryBookingStore::with_slot(future_slot(1, 42));

        let session = book_slot(&store, 1, 9).await.unwrap();

        assert_eq!(session.slot_id, 1);
        assert_eq!(session.client_id, 9);
        // specialist dari slot, bukan dari caller
        assert_eq!(session.specialist_id, 42);
        assert_eq!(session.status, "scheduled");
        assert_eq!(store.slot(1).unwrap().status, "booked");
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_book_missing_slot_is_not_found() {
        let store = MemoryBookingStore::default();
        let result = book_slot(&store, 99, 9).await;
        assert!(matches!(result, Err(BookingError::SlotNotFound)));
    }

    #[tokio::test]
    async fn test_book_booked_slot_is_unavailable() {
        let store = MemoryBookingStore::with_slot(future_slot(1, 42));
        book_slot(&store, 1, 9).await.unwrap();

        let second = book_slot(&store, 1, 10).await;
        assert!(matches!(second, Err(BookingError::SlotUnavailable)));
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_book_started_slot_is_unavailable() {
        let mut slot = future_slot(1, 42);
        slot.start_time = Utc::now() - Duration::minutes(5);
        slot.end_time = Utc::now() + Duration::minutes(25);
        let store = MemoryBookingStore::with_slot(slot);

        let result = book_slot(&store, 1, 9).await;
        assert!(matches!(result, Err(BookingError::SlotUnavailable)));
        assert_eq!(store.slot(1).unwrap().status, "available");
    }

    #[tokio::test]
    async fn test_failure_after_lock_rolls_back() {
        let mut store = MemoryBookingStore::with_slot(future_slot(1, 42));
        store.fail_session_insert = true;

        let result = book_slot(&store, 1, 9).await;
        assert!(matches!(result, Err(BookingError::Store(_))));
        assert_eq!(store.slot(1).unwrap().status, "available");
        assert!(store.sessions.lock().unwrap().is_empty());

        // Lock sudah dilepas, booking berikutnya bisa jalan
        store.fail_session_insert = false;
        assert!(book_slot(&store, 1, 9).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_have_single_winner() {
        let store = MemoryBookingStore::with_slot(future_slot(1, 42));

        let handles: Vec<_> = (0..16)
            .map(|client_id| {
                let store = store.clone();
                tokio::spawn(async move { book_slot(&store, 1, client_id).await })
            })
            .collect();

        let mut won = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(BookingError::SlotUnavailable) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
        assert_eq!(store.slot(1).unwrap().status, "booked");
    }

    // Lookup selalu melihat snapshot lama, seperti read sebelum booking commit
    struct StaleLookup {
        inner: MemoryBookingStore,
        snapshot: AvailabilitySlot,
    }

    #[async_trait]
    impl BookingStore for StaleLookup {
        type Tx = <MemoryBookingStore as BookingStore>::Tx;

        async fn begin(&self) -> Result<Self::Tx, StoreError> {
            self.inner.begin().await
        }

        async fn find_slot(&self, _slot_id: i32) -> Result<Option<AvailabilitySlot>, StoreError> {
            Ok(Some(self.snapshot.clone()))
        }

        async fn delete_available_slot(&self, slot_id: i32, specialist_id: i32) -> Result<u64, StoreError> {
            self.inner.delete_available_slot(slot_id, specialist_id).await
        }
    }

    fn booked(mut slot: AvailabilitySlot) -> AvailabilitySlot {
        slot.status = "booked".to_string();
        slot
    }

    #[test]
    fn test_available_slot_deletable_by_owner() {
        assert!(check_deletable(&future_slot(1, 5), 5).is_ok());
    }

    #[test]
    fn test_booked_slot_not_deletable() {
        let result = check_deletable(&booked(future_slot(1, 5)), 5);
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_other_specialist_is_forbidden() {
        let result = check_deletable(&future_slot(1, 5), 6);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_available_slot_then_missing() {
        let store = MemoryBookingStore::with_slot(future_slot(1, 42));

        delete_slot(&store, 1, 42).await.unwrap();
        assert!(store.slot(1).is_none());

        let second = delete_slot(&store, 1, 42).await;
        assert!(matches!(second, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_booked_slot_is_conflict_and_slot_survives() {
        let store = MemoryBookingStore::with_slot(future_slot(1, 42));
        book_slot(&store, 1, 9).await.unwrap();

        let result = delete_slot(&store, 1, 42).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(store.slot(1).unwrap().status, "booked");
    }

    #[tokio::test]
    async fn test_delete_by_other_specialist_keeps_slot() {
        let store = MemoryBookingStore::with_slot(future_slot(1, 42));

        let result = delete_slot(&store, 1, 7).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(store.slot(1).unwrap().is_available());
    }

    #[tokio::test]
    async fn test_booking_committed_before_delete_is_conflict() {
        let inner = MemoryBookingStore::with_slot(future_slot(1, 42));
        let snapshot = inner.slot(1).unwrap();

        // Booking menang setelah lookup delete membaca slot masih available
        book_slot(&inner, 1, 9).await.unwrap();

        let store = StaleLookup { inner: inner.clone(), snapshot };
        let result = delete_slot(&store, 1, 42).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(inner.slot(1).unwrap().status, "booked");
        assert_eq!(inner.sessions.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(AppError::from(BookingError::SlotNotFound), AppError::NotFound(_)));
        assert!(matches!(AppError::from(BookingError::SlotUnavailable), AppError::Conflict(_)));
    }
}
