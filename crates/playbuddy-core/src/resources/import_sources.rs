use serde_json::Value;

use super::keys::IMPORT_SOURCES;
use super::DataClient;
use crate::models::{ImportSource, ImportSourceUpdate, NewImportSource};
use crate::query::{Mutation, QueryKey, QueryState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSourcesOptions {
    /// Include unapproved and excluded sources. Default `false`.
    pub include_all: bool,
    /// Default `true`.
    pub enabled: bool,
}

impl Default for ImportSourcesOptions {
    fn default() -> Self {
        Self {
            include_all: false,
            enabled: true,
        }
    }
}

impl ImportSourcesOptions {
    pub fn all() -> Self {
        Self {
            include_all: true,
            ..Self::default()
        }
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(IMPORT_SOURCES).with_params([("includeAll", self.include_all)])
    }
}

impl DataClient {
    pub async fn fetch_import_sources(&self, options: ImportSourcesOptions) -> QueryState<Vec<ImportSource>> {
        let api = self.api.clone();
        let include_all = options.include_all;
        self.queries
            .fetch_query(
                options.key(),
                move || async move {
                    if include_all {
                        api.get_with_query(&["import_sources"], &[("includeAll", "true")]).await
                    } else {
                        api.get(&["import_sources"]).await
                    }
                },
                self.options.enabled_if(options.enabled),
            )
            .await
    }

    pub fn create_import_source(&self) -> Mutation<NewImportSource, ImportSource> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |source: NewImportSource| {
            let api = api.clone();
            async move { api.post(&["import_sources"], &source).await }
        })
        .invalidates(IMPORT_SOURCES)
    }

    pub fn update_import_source(&self) -> Mutation<ImportSourceUpdate, ImportSource> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |update: ImportSourceUpdate| {
            let api = api.clone();
            async move { api.patch(&["import_sources", update.id.as_str()], &update).await }
        })
        .invalidates(IMPORT_SOURCES)
    }

    /// Takes the source id.
    pub fn delete_import_source(&self) -> Mutation<String, Value> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |id: String| {
            let api = api.clone();
            async move { api.delete(&["import_sources", id.as_str()]).await }
        })
        .invalidates(IMPORT_SOURCES)
    }
}
