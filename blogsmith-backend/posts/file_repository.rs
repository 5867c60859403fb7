use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repository::BlogPostRepository;
use super::{BlogPost, PostQuery};

/// Blog posts stored as JSON files at `<data_dir>/posts/`.
pub struct FileBlogPostRepository {
    posts: RwLock<HashMap<String, BlogPost>>,
    dir: PathBuf,
}

impl FileBlogPostRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
            dir: base_dir.as_ref().join("posts"),
        }
    }

    fn write_file(&self, post: &BlogPost) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.dir.join(format!("{}.json", post.id));
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string_pretty(post)?)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("failed to rename into {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl BlogPostRepository for FileBlogPostRepository {
    async fn create(&self, post: BlogPost) -> Result<()> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            bail!("post {} already exists", post.id);
        }
        self.write_file(&post)?;
        posts.insert(post.id.clone(), post);
        Ok(())
    }

    async fn update(&self, mut post: BlogPost) -> Result<()> {
        let mut posts = self.posts.write().await;
        if !posts.contains_key(&post.id) {
            bail!("post {} not found", post.id);
        }
        post.updated_at = chrono::Utc::now();
        self.write_file(&post)?;
        posts.insert(post.id.clone(), post);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BlogPost>> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn list(&self, query: &PostQuery) -> Result<Vec<BlogPost>> {
        let mut matched: Vec<BlogPost> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn load_all(&self) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
            return Ok(());
        }

        let mut map = HashMap::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|c| serde_json::from_str::<BlogPost>(&c).map_err(anyhow::Error::from));
            match parsed {
                Ok(post) => {
                    map.insert(post.id.clone(), post);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping invalid post file");
                }
            }
        }

        tracing::info!(count = map.len(), "loaded blog posts");
        *self.posts.write().await = map;
        Ok(())
    }
}
