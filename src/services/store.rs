use crate::core::io::Storage;
use crate::core::state::SavedWork;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Saved works, kept as one serialized collection under a single key.
/// Every mutation rewrites the whole collection.
pub struct StoryStore {
    storage: Arc<dyn Storage>,
    bucket: String,
}

impl StoryStore {
    pub fn new(storage: Arc<dyn Storage>, bucket: &str) -> Self {
        Self {
            storage,
            bucket: bucket.to_string(),
        }
    }

    async fn load(&self) -> Result<Vec<SavedWork>> {
        match self.storage.read(&self.bucket).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse saved works in '{}'", self.bucket)),
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, works: &[SavedWork]) -> Result<()> {
        let content = serde_json::to_vec(works)?;
        self.storage.write(&self.bucket, &content).await
    }

    /// Stored order. An unreadable bucket lists as empty.
    pub async fn list(&self) -> Vec<SavedWork> {
        match self.load().await {
            Ok(works) => works,
            Err(e) => {
                log::error!("Error reading saved works: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Newest first.
    pub async fn list_recent(&self) -> Vec<SavedWork> {
        let mut works = self.list().await;
        works.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        works
    }

    async fn upsert(&self, work: &SavedWork) -> Result<()> {
        let mut works = self.load().await?;
        match works.iter_mut().find(|w| w.id == work.id) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = work.clone();
                existing.created_at = created_at;
            }
            None => works.push(work.clone()),
        }
        self.persist(&works).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut works = self.load().await?;
        works.retain(|w| w.id != id);
        self.persist(&works).await
    }

    /// Upsert by id. An existing record keeps its first creation time.
    pub async fn save(&self, work: &SavedWork) -> Result<()> {
        let result = self.upsert(work).await;
        if let Err(e) = &result {
            log::error!("Error saving work {}: {:#}", work.id, e);
        }
        result
    }

    /// Removes the record with `id`; other records are left untouched.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = self.remove(id).await;
        if let Err(e) = &result {
            log::error!("Error deleting work {}: {:#}", id, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::{MemoryStorage, NativeStorage};
    use crate::core::state::{Script, StoryParameters};

    fn work(id: &str, created_at: i64, summary: &str) -> SavedWork {
        let mut form_data = StoryParameters::new_draft();
        form_data.chapter_settings[0].id = "c1".to_string();
        form_data.characters[0].id = "p1".to_string();
        SavedWork {
            id: id.to_string(),
            created_at,
            form_data,
            summary: summary.to_string(),
            script: Script {
                title: format!("Script {}", id),
                chapters: vec![],
            },
        }
    }

    fn memory_store() -> StoryStore {
        StoryStore::new(Arc::new(MemoryStorage::new()), "bd_gen_saved_stories")
    }

    #[tokio::test]
    async fn test_save_same_id_updates_in_place() -> Result<()> {
        let store = memory_store();
        store.save(&work("a", 100, "v1")).await?;
        store.save(&work("b", 200, "autre")).await?;
        store.save(&work("a", 300, "v2")).await?;

        let works = store.list().await;
        assert_eq!(works.len(), 2);
        assert_eq!(works[0].id, "a");
        assert_eq!(works[0].summary, "v2");
        assert_eq!(works[0].created_at, 100);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_only_matching() -> Result<()> {
        let store = memory_store();
        for (id, t) in [("a", 1), ("b", 2), ("c", 3)] {
            store.save(&work(id, t, "s")).await?;
        }
        store.delete("b").await?;

        let works = store.list().await;
        assert_eq!(works, vec![work("a", 1, "s"), work("c", 3, "s")]);

        store.delete("absent").await?;
        assert_eq!(store.list().await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_recent_is_newest_first() -> Result<()> {
        let store = memory_store();
        store.save(&work("old", 10, "s")).await?;
        store.save(&work("new", 30, "s")).await?;
        store.save(&work("mid", 20, "s")).await?;

        let ids: Vec<_> = store.list_recent().await.into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_bucket_lists_empty_and_refuses_overwrite() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        storage.write("bucket", b"not json").await?;
        let store = StoryStore::new(storage.clone(), "bucket");

        assert!(store.list().await.is_empty());
        assert!(store.save(&work("a", 1, "s")).await.is_err());
        assert_eq!(storage.read("bucket").await?, Some(b"not json".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_original_bucket_format() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let raw = r#"[{
            "id": "5f8c",
            "createdAt": 1718000000000,
            "formData": {
                "title": "Titre",
                "chapterSettings": [{ "id": "c1", "pages": "10" }],
                "genre": "Western",
                "subGenre": "Classique",
                "tone": "Épique",
                "targetAudience": "Adultes",
                "baseIdea": "Un shérif.",
                "plotKeywords": ["duel"],
                "mainThemes": ["Justice"],
                "characters": [{ "id": "p1", "name": "Jo", "description": "shérif" }],
                "artStyle": "Réaliste",
                "visualMood": "Sépia/Vintage"
            },
            "summary": "Résumé",
            "script": { "title": "Titre", "chapters": [] }
        }]"#;
        storage.write("bd_gen_saved_stories", raw.as_bytes()).await?;
        let store = StoryStore::new(storage, "bd_gen_saved_stories");

        let works = store.list().await;
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].form_data.chapter_settings[0].requested_page_count, 10);
        assert_eq!(works[0].form_data.sub_genre, "Classique");
        Ok(())
    }

    #[tokio::test]
    async fn test_native_backend_persists_across_instances() -> Result<()> {
        let dir = tempfile::tempdir()?;
        StoryStore::new(Arc::new(NativeStorage::new(dir.path())), "works")
            .save(&work("a", 1, "s"))
            .await?;

        let reopened = StoryStore::new(Arc::new(NativeStorage::new(dir.path())), "works");
        assert_eq!(reopened.list().await, vec![work("a", 1, "s")]);
        Ok(())
    }
}
