//! Course content index abstraction.
//!
//! The search tool queries course material through [`CourseIndex`]; backends
//! decide how passages are stored and ranked.

mod memory;

pub use memory::{Catalog, CatalogCourse, CatalogLesson, MemoryCourseIndex};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A search against the course index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery<'a> {
    pub query: &'a str,
    /// Course title, possibly partial.
    pub course_name: Option<&'a str>,
    pub lesson_number: Option<u32>,
}

impl<'a> SearchQuery<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            query,
            course_name: None,
            lesson_number: None,
        }
    }
}

/// One passage returned by the index, in rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub text: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
}

/// Trait for course index implementations.
#[async_trait]
pub trait CourseIndex: Send + Sync {
    /// Search for passages. Errors carry a message suitable for showing to the model.
    async fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<SearchMatch>>;

    /// Link to a lesson, if the catalog knows one.
    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>>;

    /// Titles of all indexed courses.
    async fn course_titles(&self) -> Result<Vec<String>>;
}
