#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;

    use super::super::task_store::TaskStore;
    use crate::domain::{error::TaskError, storage::{KeyValueStorage, StorageError, TASKS_KEY}, task::{Priority, Task, TaskDraft, TaskId}};
    use crate::infrastructure::memory_storage::MemoryStorage;
    use chrono::NaiveDate;

    async fn stored(storage: &MemoryStorage) -> Vec<Task> {
        let raw = storage.get(TASKS_KEY).await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    /// Backend whose reads always fail.
    struct UnreadableStorage;

    #[async_trait]
    impl KeyValueStorage for UnreadableStorage {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Backend("disk unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> { Ok(()) }
    }

    fn titles(store: &TaskStore<MemoryStorage>) -> Vec<String> {
        store.list().iter().map(|t| t.title.clone()).collect()
    }

    #[tokio::test]
    async fn unit_create_appends_and_persists() {
        let storage = MemoryStorage::new();
        let mut store = TaskStore::load(storage.clone()).await.unwrap();
        let created = store
            .create(TaskDraft::new("  Pay rent ").with_priority(Priority::High).with_due_date(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()))
            .await
            .unwrap();
        assert_eq!(created.title, "Pay rent");
        assert!(!created.completed);
        assert_eq!(store.list(), &[created.clone()]);
        assert_eq!(stored(&storage).await, vec![created]);
    }

    #[tokio::test]
    async fn unit_ids_are_unique_even_within_one_millisecond() {
        let mut store = TaskStore::load(MemoryStorage::new()).await.unwrap();
        let mut seen = HashSet::new();
        for i in 0..50 {
            let task = store.create(TaskDraft::new(format!("task {i}"))).await.unwrap();
            assert!(seen.insert(task.id), "duplicate id {}", task.id);
        }
    }

    #[tokio::test]
    async fn unit_new_ids_stay_above_loaded_ids() {
        let storage = MemoryStorage::new();
        let far_future = i64::MAX / 2;
        storage
            .set(TASKS_KEY, &format!(r#"[{{"id":{far_future},"title":"old","description":"","dueDate":"","priority":"normal","completed":false}}]"#))
            .await
            .unwrap();
        let mut store = TaskStore::load(storage).await.unwrap();
        let task = store.create(TaskDraft::new("new")).await.unwrap();
        assert!(task.id.0 > far_future);
    }

    #[tokio::test]
    async fn unit_create_fails_cleanly_when_ids_are_exhausted() {
        let storage = MemoryStorage::new();
        storage.set(TASKS_KEY, r#"[{"id":9223372036854775807,"title":"old"}]"#).await.unwrap();
        let mut store = TaskStore::load(storage.clone()).await.unwrap();
        let before = storage.get(TASKS_KEY).await.unwrap();

        let err = store.create(TaskDraft::new("new")).await.unwrap_err();
        assert!(matches!(err, TaskError::IdsExhausted(TaskId(i64::MAX))));
        assert_eq!(titles(&store), vec!["old"]);
        assert_eq!(storage.get(TASKS_KEY).await.unwrap(), before);
    }

    #[tokio::test]
    async fn unit_blank_title_is_rejected_without_appending() {
        let storage = MemoryStorage::new();
        let mut store = TaskStore::load(storage.clone()).await.unwrap();
        for title in ["", "   ", "\n\t"] {
            let err = store.create(TaskDraft::new(title)).await.unwrap_err();
            assert!(matches!(err, TaskError::Validation(_)));
        }
        assert!(store.list().is_empty());
        assert_eq!(storage.get(TASKS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unit_unknown_priority_is_rejected_on_create() {
        let storage = MemoryStorage::new();
        let mut store = TaskStore::load(storage.clone()).await.unwrap();
        let err = store.create(TaskDraft::new("X").with_priority(Priority::from("urgent"))).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert!(store.list().is_empty());
        assert_eq!(storage.get(TASKS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unit_stored_unknown_priority_may_be_kept_but_not_introduced() {
        let storage = MemoryStorage::new();
        storage
            .set(TASKS_KEY, r#"[{"id":1,"title":"legacy","priority":"someday"},{"id":2,"title":"plain"}]"#)
            .await
            .unwrap();
        let mut store = TaskStore::load(storage).await.unwrap();

        let kept = store
            .update(TaskId(1), TaskDraft::new("legacy, renamed").with_priority(Priority::from("someday")))
            .await
            .unwrap();
        assert_eq!(kept.priority, Priority::Other("someday".into()));

        let err = store.update(TaskId(2), TaskDraft::new("plain").with_priority(Priority::from("someday"))).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(store.get(TaskId(2)).unwrap().priority, Priority::Normal);
    }

    #[tokio::test]
    async fn unit_update_keeps_id_completion_and_position() {
        let mut store = TaskStore::load(MemoryStorage::new()).await.unwrap();
        let a = store.create(TaskDraft::new("A")).await.unwrap();
        let b = store.create(TaskDraft::new("B")).await.unwrap();
        store.create(TaskDraft::new("C")).await.unwrap();
        store.toggle_completed(b.id, true).await.unwrap();

        let updated = store
            .update(b.id, TaskDraft::new("B2").with_description("details").with_priority(Priority::Low))
            .await
            .unwrap();
        assert_eq!(updated.id, b.id);
        assert!(updated.completed);
        assert_eq!(titles(&store), vec!["A", "B2", "C"]);
        assert_eq!(store.get(b.id).unwrap().description, "details");
        assert_eq!(store.get(a.id).unwrap().title, "A");
    }

    #[tokio::test]
    async fn unit_update_errors_leave_task_untouched() {
        let mut store = TaskStore::load(MemoryStorage::new()).await.unwrap();
        let a = store.create(TaskDraft::new("A").with_description("keep")).await.unwrap();

        let err = store.update(TaskId(-1), TaskDraft::new("X")).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound(TaskId(-1))));

        let err = store.update(a.id, TaskDraft::new(" ").with_description("lost")).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(store.get(a.id), Some(&a));
    }

    #[tokio::test]
    async fn unit_toggle_unknown_id_is_not_found() {
        let mut store = TaskStore::load(MemoryStorage::new()).await.unwrap();
        let err = store.toggle_completed(TaskId(7), true).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound(TaskId(7))));
    }

    #[tokio::test]
    async fn unit_delete_is_idempotent() {
        let mut store = TaskStore::load(MemoryStorage::new()).await.unwrap();
        let a = store.create(TaskDraft::new("A")).await.unwrap();
        store.create(TaskDraft::new("B")).await.unwrap();

        assert!(store.delete(a.id).await.unwrap());
        let once = store.list().to_vec();
        assert!(!store.delete(a.id).await.unwrap());
        assert_eq!(store.list(), once.as_slice());
        assert_eq!(titles(&store), vec!["B"]);
    }

    #[tokio::test]
    async fn unit_clear_completed_removes_exactly_completed_tasks() {
        let storage = MemoryStorage::new();
        let mut store = TaskStore::load(storage.clone()).await.unwrap();
        for title in ["A", "B", "C", "D", "E"] {
            store.create(TaskDraft::new(title)).await.unwrap();
        }
        let ids: Vec<TaskId> = store.list().iter().map(|t| t.id).collect();
        store.toggle_completed(ids[1], true).await.unwrap();
        store.toggle_completed(ids[3], true).await.unwrap();

        assert_eq!(store.clear_completed().await.unwrap(), 2);
        assert_eq!(titles(&store), vec!["A", "C", "E"]);
        assert_eq!(stored(&storage).await.len(), 3);
        assert_eq!(store.clear_completed().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unit_load_recovers_from_missing_or_garbage_entry() {
        let storage = MemoryStorage::new();
        assert!(TaskStore::load(storage.clone()).await.unwrap().list().is_empty());
        storage.set(TASKS_KEY, "{not json").await.unwrap();
        assert!(TaskStore::load(storage).await.unwrap().list().is_empty());
    }

    #[tokio::test]
    async fn unit_load_reports_backend_read_failure() {
        let err = TaskStore::load(UnreadableStorage).await.err().unwrap();
        assert!(matches!(err, TaskError::Load(StorageError::Backend(_))));
    }

    #[tokio::test]
    async fn unit_load_keeps_first_task_for_duplicate_ids() {
        let storage = MemoryStorage::new();
        storage
            .set(TASKS_KEY, r#"[{"id":5,"title":"first"},{"id":6,"title":"other"},{"id":5,"title":"second"}]"#)
            .await
            .unwrap();
        let mut store = TaskStore::load(storage).await.unwrap();
        assert_eq!(titles(&store), vec!["first", "other"]);

        assert!(store.delete(TaskId(5)).await.unwrap());
        assert!(store.get(TaskId(5)).is_none());
    }

    #[tokio::test]
    async fn unit_reload_restores_order_and_fields() {
        let storage = MemoryStorage::new();
        let mut store = TaskStore::load(storage.clone()).await.unwrap();
        store.create(TaskDraft::new("first")).await.unwrap();
        let second = store.create(TaskDraft::new("second").with_priority(Priority::Low)).await.unwrap();
        store.toggle_completed(second.id, true).await.unwrap();

        let reloaded = TaskStore::load(storage).await.unwrap();
        assert_eq!(reloaded.list(), store.list());
    }

    #[tokio::test]
    async fn unit_persistence_failure_keeps_memory_change() {
        let mut storage = MemoryStorage::new();
        let mut store = TaskStore::load(storage.clone()).await.unwrap();
        store.create(TaskDraft::new("fits")).await.unwrap();
        let persisted = storage.get(TASKS_KEY).await.unwrap();

        storage.set_quota(Some(1));
        let mut store = TaskStore::load(storage.clone()).await.unwrap();
        let err = store.create(TaskDraft::new("too big")).await.unwrap_err();
        assert!(matches!(err, TaskError::Persistence(StorageError::QuotaExceeded { .. })));
        assert_eq!(titles(&store), vec!["fits", "too big"]);
        assert_eq!(storage.get(TASKS_KEY).await.unwrap(), persisted);
    }
}
