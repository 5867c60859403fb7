use anyhow::Result;
use async_trait::async_trait;

use super::{BlogPost, PostQuery};

#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    async fn create(&self, post: BlogPost) -> Result<()>;
    async fn update(&self, post: BlogPost) -> Result<()>;
    async fn find_by_id(&self, id: &str) -> Result<Option<BlogPost>>;
    /// Matching posts, newest first.
    async fn list(&self, query: &PostQuery) -> Result<Vec<BlogPost>>;
    async fn load_all(&self) -> Result<()>;
}
