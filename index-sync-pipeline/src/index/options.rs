//! Options accepted by index-level operations.

use index_sync_repository::RequestParams;
use index_sync_shared::Document;

use crate::collection::Context;

/// Which lazy attributes to resolve during an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttributeSelector {
    /// Every attribute registered on the repository.
    All,
    /// No attribute.
    #[default]
    None,
    /// The named attributes that the repository has registered.
    Only(Vec<String>),
}

impl AttributeSelector {
    /// Names to resolve for a repository, in registration order.
    ///
    /// Names the repository does not register are ignored.
    pub fn select(&self, registered: &[String]) -> Vec<String> {
        match self {
            Self::All => registered.to_vec(),
            Self::None => Vec::new(),
            Self::Only(names) => registered
                .iter()
                .filter(|name| names.contains(name))
                .cloned()
                .collect(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<bool> for AttributeSelector {
    fn from(all: bool) -> Self {
        if all {
            Self::All
        } else {
            Self::None
        }
    }
}

impl From<&str> for AttributeSelector {
    fn from(name: &str) -> Self {
        Self::Only(vec![name.to_string()])
    }
}

impl From<String> for AttributeSelector {
    fn from(name: String) -> Self {
        Self::Only(vec![name])
    }
}

impl From<Vec<String>> for AttributeSelector {
    fn from(names: Vec<String>) -> Self {
        Self::Only(names)
    }
}

impl From<Vec<&str>> for AttributeSelector {
    fn from(names: Vec<&str>) -> Self {
        Self::Only(names.into_iter().map(str::to_string).collect())
    }
}

/// Options for [`crate::Index::import`].
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Repositories to import, by document type. `None` imports all.
    pub repositories: Option<Vec<String>>,
    /// Context handed to collections and serializers.
    pub context: Context,
    /// Lazy attributes merged into the documents before they are indexed.
    pub eager: AttributeSelector,
    /// Lazy attributes sent as separate partial updates after indexing.
    pub lazy: AttributeSelector,
    /// Suffix of the target index.
    pub suffix: Option<String>,
    /// Parameters for every bulk request.
    pub params: RequestParams,
    /// Refresh the target index once the import is done.
    pub refresh: bool,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repositories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repositories = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_eager(mut self, eager: impl Into<AttributeSelector>) -> Self {
        self.eager = eager.into();
        self
    }

    pub fn with_lazy(mut self, lazy: impl Into<AttributeSelector>) -> Self {
        self.lazy = lazy.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}

/// Documents for [`crate::Index::bulk`], grouped by action.
#[derive(Debug, Clone, Default)]
pub struct BulkOptions {
    pub index: Vec<Document>,
    pub create: Vec<Document>,
    pub update: Vec<Document>,
    pub delete: Vec<Document>,
    pub suffix: Option<String>,
    pub params: RequestParams,
}

impl BulkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, documents: impl IntoIterator<Item = Document>) -> Self {
        self.index.extend(documents);
        self
    }

    pub fn create(mut self, documents: impl IntoIterator<Item = Document>) -> Self {
        self.create.extend(documents);
        self
    }

    pub fn update(mut self, documents: impl IntoIterator<Item = Document>) -> Self {
        self.update.extend(documents);
        self
    }

    pub fn delete(mut self, documents: impl IntoIterator<Item = Document>) -> Self {
        self.delete.extend(documents);
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
            && self.create.is_empty()
            && self.update.is_empty()
            && self.delete.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selector_conversions() {
        assert_eq!(AttributeSelector::from(true), AttributeSelector::All);
        assert_eq!(AttributeSelector::from(false), AttributeSelector::None);
        assert_eq!(
            AttributeSelector::from("tags"),
            AttributeSelector::Only(names(&["tags"]))
        );
        assert_eq!(
            AttributeSelector::from(vec!["a", "b"]),
            AttributeSelector::Only(names(&["a", "b"]))
        );
    }

    #[test]
    fn test_select_intersects_with_registered_names() {
        let registered = names(&["a", "b", "c"]);

        assert_eq!(AttributeSelector::All.select(&registered), registered);
        assert!(AttributeSelector::None.select(&registered).is_empty());
        assert_eq!(
            AttributeSelector::from(vec!["c", "z", "a"]).select(&registered),
            names(&["a", "c"])
        );
    }
}
