//! Course data lookup.
//!
//! The planner never knows where course data comes from. It asks a
//! [`CourseCatalog`] for a record by course id and treats a
//! [`CatalogError::NotFound`] as "this course does not exist". The lookup is
//! the only asynchronous step of a mutation.

use std::collections::HashMap;
use std::future::Future;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::core::{CourseId, Metadata};
use crate::error::CatalogError;

/// A course as stored in the course database.
///
/// Deserializes from documents shaped like
/// `{"courseNumber": "CS201", "prerequisites": ["CS101"], "info": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(rename = "courseNumber")]
    pub id: CourseId,
    #[serde(default)]
    pub prerequisites: Vec<CourseId>,
    /// Display label, the course number when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub info: Metadata,
}

impl CourseRecord {
    pub fn new(id: impl Into<CourseId>) -> Self {
        Self {
            id: id.into(),
            prerequisites: Vec::new(),
            label: None,
            info: Metadata::new(),
        }
    }

    pub fn with_prerequisites<I, T>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CourseId>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Source of course records.
pub trait CourseCatalog {
    /// Looks up a course. Must fail with [`CatalogError::NotFound`] when the id
    /// does not name a course.
    fn fetch_course(
        &self,
        id: &CourseId,
    ) -> impl Future<Output = Result<CourseRecord, CatalogError>>;
}

impl<T> CourseCatalog for &T
where
    T: CourseCatalog + ?Sized,
{
    fn fetch_course(
        &self,
        id: &CourseId,
    ) -> impl Future<Output = Result<CourseRecord, CatalogError>> {
        (**self).fetch_course(id)
    }
}

/// A catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    courses: HashMap<CourseId, CourseRecord>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of course documents.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<CourseRecord> = serde_json::from_str(json)?;
        Ok(records.into_iter().collect())
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, CatalogError> {
        let mut buffer = String::new();
        reader.read_to_string(&mut buffer)?;
        Self::from_json(&buffer)
    }

    pub fn with(mut self, record: CourseRecord) -> Self {
        self.insert(record);
        self
    }

    /// Adds a course, returning the record it replaced.
    pub fn insert(&mut self, record: CourseRecord) -> Option<CourseRecord> {
        self.courses.insert(record.id.clone(), record)
    }

    pub fn get(&self, id: &str) -> Option<&CourseRecord> {
        self.courses.get(id)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl FromIterator<CourseRecord> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = CourseRecord>>(iter: I) -> Self {
        let mut catalog = StaticCatalog::new();
        for record in iter {
            catalog.insert(record);
        }
        catalog
    }
}

impl CourseCatalog for StaticCatalog {
    fn fetch_course(
        &self,
        id: &CourseId,
    ) -> impl Future<Output = Result<CourseRecord, CatalogError>> {
        let result = self
            .courses
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()));

        std::future::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSES: &str = r#"[
        {"courseNumber": "CS101", "prerequisites": [], "info": {"description": "Intro", "units": 4}},
        {"courseNumber": "CS201", "prerequisites": ["CS101"], "info": {"description": "Data structures"}},
        {"courseNumber": "CS301"}
    ]"#;

    #[test]
    fn test_from_json() {
        let catalog = StaticCatalog::from_json(COURSES).unwrap();
        assert_eq!(catalog.len(), 3);

        let cs201 = catalog.get("CS201").unwrap();
        assert_eq!(cs201.prerequisites, vec![CourseId::from("CS101")]);
        assert_eq!(cs201.label(), "CS201");
        assert_eq!(cs201.info["description"], "Data structures");

        let cs301 = catalog.get("CS301").unwrap();
        assert!(cs301.prerequisites.is_empty());
        assert!(cs301.info.is_empty());
    }

    #[test]
    fn test_from_json_malformed() {
        let err = StaticCatalog::from_json(r#"[{"prerequisites": []}]"#).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_from_reader() {
        let catalog = StaticCatalog::from_reader(COURSES.as_bytes()).unwrap();
        assert!(catalog.get("CS101").is_some());
    }

    #[test]
    fn test_label_override() {
        let record = CourseRecord::new("CS101").with_label("Intro to CS");
        assert_eq!(record.label(), "Intro to CS");
    }

    #[tokio::test]
    async fn test_fetch() {
        let catalog = StaticCatalog::new()
            .with(CourseRecord::new("CS201").with_prerequisites(["CS101"]));

        let record = catalog.fetch_course(&"CS201".into()).await.unwrap();
        assert_eq!(record.id, "CS201");

        let err = catalog.fetch_course(&"CS999".into()).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(id) if id == "CS999"));
    }
}
