use crate::progress::{CoverageSnapshot, ProgressError};
use crate::records::ProgressStore;

/// Writes the snapshot's highest Juz back to the student's profile.
/// Overwrites unconditionally, so repeating the same snapshot is a no-op in effect.
pub fn sync_progress<P: ProgressStore + ?Sized>(
    store: &P,
    student_id: &str,
    snapshot: &CoverageSnapshot,
) -> Result<(), ProgressError> {
    let updated = store
        .write_highest_juz(student_id, snapshot.highest_juz_achieved)
        .map_err(|e| ProgressError::new("db_update_failed", e.to_string()))?;
    if !updated {
        return Err(ProgressError::new("not_found", "student not found"));
    }
    tracing::info!(
        student_id,
        highest_juz = snapshot.highest_juz_achieved,
        "synced highest juz"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quran::JuzNumber;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct MemProfiles {
        rows: RefCell<HashMap<String, JuzNumber>>,
        writes: RefCell<usize>,
    }

    impl ProgressStore for MemProfiles {
        fn write_highest_juz(&self, student_id: &str, highest: JuzNumber) -> anyhow::Result<bool> {
            *self.writes.borrow_mut() += 1;
            let mut rows = self.rows.borrow_mut();
            match rows.get_mut(student_id) {
                Some(slot) => {
                    *slot = highest;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    struct Failing;

    impl ProgressStore for Failing {
        fn write_highest_juz(&self, _student_id: &str, _highest: JuzNumber) -> anyhow::Result<bool> {
            anyhow::bail!("disk I/O error")
        }
    }

    fn snapshot(highest: JuzNumber) -> CoverageSnapshot {
        CoverageSnapshot {
            total_juz_equivalent: 0.0,
            per_juz: Vec::new(),
            highest_juz_achieved: highest,
            record_count: 0,
        }
    }

    fn profiles() -> MemProfiles {
        let mut rows = HashMap::new();
        rows.insert("s1".to_string(), 1);
        MemProfiles {
            rows: RefCell::new(rows),
            writes: RefCell::new(0),
        }
    }

    #[test]
    fn repeated_sync_leaves_same_state() {
        let store = profiles();
        sync_progress(&store, "s1", &snapshot(4)).expect("first sync");
        let after_first = store.rows.borrow().clone();
        sync_progress(&store, "s1", &snapshot(4)).expect("second sync");
        assert_eq!(*store.rows.borrow(), after_first);
        assert_eq!(store.rows.borrow()["s1"], 4);
        assert_eq!(*store.writes.borrow(), 2);
    }

    #[test]
    fn lower_value_still_overwrites() {
        let store = profiles();
        sync_progress(&store, "s1", &snapshot(7)).expect("sync");
        sync_progress(&store, "s1", &snapshot(0)).expect("sync");
        assert_eq!(store.rows.borrow()["s1"], 0);
    }

    #[test]
    fn unknown_student_and_store_failure_map_to_codes() {
        let err = sync_progress(&profiles(), "ghost", &snapshot(2)).expect_err("missing");
        assert_eq!(err.code, "not_found");

        let err = sync_progress(&Failing, "s1", &snapshot(2)).expect_err("failing store");
        assert_eq!(err.code, "db_update_failed");
        assert!(err.message.contains("disk I/O error"));
    }
}
