//! In-memory course index loaded from a JSON catalog.
//!
//! Useful for testing and small course collections.

use super::{CourseIndex, SearchMatch, SearchQuery};
use crate::error::{CoursemateError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// A course catalog as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub courses: Vec<CatalogCourse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogCourse {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<CatalogLesson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogLesson {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Passages of lesson content.
    #[serde(default)]
    pub chunks: Vec<String>,
}

/// In-memory course index.
pub struct MemoryCourseIndex {
    courses: Vec<CatalogCourse>,
    max_results: usize,
}

impl MemoryCourseIndex {
    /// Create an empty index.
    pub fn new(max_results: usize) -> Self {
        Self::from_catalog(Catalog::default(), max_results)
    }

    pub fn from_catalog(catalog: Catalog, max_results: usize) -> Self {
        Self {
            courses: catalog.courses,
            max_results,
        }
    }

    /// Load a JSON catalog file. A missing file yields an empty index.
    pub fn load(path: &Path, max_results: usize) -> Result<Self> {
        if !path.exists() {
            debug!("No catalog at {:?}, starting with an empty index", path);
            return Ok(Self::new(max_results));
        }
        let content = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        Ok(Self::from_catalog(catalog, max_results))
    }
}

/// Resolve a possibly partial course name: exact title first, then substring.
fn resolve_course<'a>(courses: &'a [CatalogCourse], name: &str) -> Option<&'a CatalogCourse> {
    let needle = name.trim().to_lowercase();
    courses
        .iter()
        .find(|c| c.title.to_lowercase() == needle)
        .or_else(|| {
            courses
                .iter()
                .find(|c| c.title.to_lowercase().contains(&needle))
        })
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[async_trait]
impl CourseIndex for MemoryCourseIndex {
    async fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<SearchMatch>> {
        let selected: Vec<&CatalogCourse> = match query.course_name {
            Some(name) => {
                let course = resolve_course(&self.courses, name).ok_or_else(|| {
                    CoursemateError::Index(format!("No course found matching '{}'", name))
                })?;
                vec![course]
            }
            None => self.courses.iter().collect(),
        };

        let query_terms = terms(query.query);
        let lesson_filter = query.lesson_number;
        // A course or lesson filter already narrowed the passages, so they
        // stay in the results even without term overlap.
        let keep_unscored = query.course_name.is_some() || lesson_filter.is_some();

        let mut scored: Vec<(usize, SearchMatch)> = selected
            .into_iter()
            .flat_map(|course| {
                course
                    .lessons
                    .iter()
                    .filter(move |l| lesson_filter.map_or(true, |n| n == l.number))
                    .flat_map(move |lesson| {
                        lesson.chunks.iter().map(move |chunk| (course, lesson, chunk))
                    })
            })
            .filter_map(|(course, lesson, chunk)| {
                let score = terms(chunk).intersection(&query_terms).count();
                (score > 0 || keep_unscored).then(|| {
                    (
                        score,
                        SearchMatch {
                            text: chunk.clone(),
                            course_title: course.title.clone(),
                            lesson_number: Some(lesson.number),
                        },
                    )
                })
            })
            .collect();

        // Stable sort keeps catalog order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(self.max_results);

        Ok(scored.into_iter().map(|(_, m)| m).collect())
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.title == course_title)
            .and_then(|c| c.lessons.iter().find(|l| l.number == lesson_number))
            .and_then(|l| l.link.clone()))
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        Ok(self.courses.iter().map(|c| c.title.clone()).collect())
    }
}
