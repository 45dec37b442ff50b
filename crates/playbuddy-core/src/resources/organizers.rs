use super::keys::{ATTENDEES, EVENTS, ORGANIZERS};
use super::{keys, DataClient};
use crate::models::{DeletedCount, MergeOutcome, Organizer, OrganizerEventsDeletion, OrganizerMerge, OrganizerUpdate};
use crate::query::{Mutation, QueryState};

impl DataClient {
    pub async fn fetch_organizers(&self) -> QueryState<Vec<Organizer>> {
        let api = self.api.clone();
        self.queries
            .fetch_query(
                keys::organizers(),
                move || async move { api.get(&["organizers"]).await },
                self.options,
            )
            .await
    }

    /// `PATCH /organizers/{id}`. Organizer names show on events, so both
    /// collections go stale.
    pub fn update_organizer(&self) -> Mutation<OrganizerUpdate, Organizer> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |update: OrganizerUpdate| {
            let api = api.clone();
            async move {
                let id = update.id.to_string();
                api.patch(&["organizers", id.as_str()], &update).await
            }
        })
        .invalidates(ORGANIZERS)
        .invalidates(EVENTS)
    }

    /// `POST /organizers/{source}/merge`. Events and attendee lists move
    /// to the target organizer.
    pub fn merge_organizer(&self) -> Mutation<OrganizerMerge, MergeOutcome> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |merge: OrganizerMerge| {
            let api = api.clone();
            async move {
                let id = merge.source_organizer_id.to_string();
                api.post(&["organizers", id.as_str(), "merge"], &merge).await
            }
        })
        .invalidates(ORGANIZERS)
        .invalidates(EVENTS)
        .invalidates(ATTENDEES)
    }

    /// `DELETE /organizers/{id}/events`.
    pub fn delete_organizer_events(&self) -> Mutation<OrganizerEventsDeletion, DeletedCount> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |deletion: OrganizerEventsDeletion| {
            let api = api.clone();
            async move {
                let id = deletion.organizer_id.to_string();
                api.delete_with_body(&["organizers", id.as_str(), "events"], &deletion).await
            }
        })
        .invalidates(EVENTS)
        .invalidates(ATTENDEES)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::ApiError;
    use crate::query::{QueryClient, QueryKey};
    use crate::resources::test_server::TestServer;

    fn seeded(server: &TestServer) -> DataClient {
        let client = DataClient::new(server.api(), QueryClient::new());
        for key in [ORGANIZERS, EVENTS, ATTENDEES, "kinks"] {
            client.queries().set_query_data(QueryKey::new(key), &json!([])).unwrap();
        }
        client
    }

    fn stale(client: &DataClient, name: &str) -> bool {
        client.queries().is_invalidated(&QueryKey::new(name))
    }

    #[tokio::test]
    async fn test_update_organizer_patches_and_invalidates() {
        let server = TestServer::start().await;
        server.route("PATCH", "/organizers/12", 200, json!({"id": 12, "name": "Ropes", "hidden": true}));
        let client = seeded(&server);

        let mut update = OrganizerUpdate::new(12);
        update.hidden = Some(true);
        let organizer = client.update_organizer().mutate(update).await.unwrap();

        assert!(organizer.is_hidden());
        let sent = &server.requests()[0];
        assert_eq!(sent.body, Some(json!({"hidden": true})));
        assert!(stale(&client, ORGANIZERS));
        assert!(stale(&client, EVENTS));
        assert!(!stale(&client, ATTENDEES));
        assert!(!stale(&client, "kinks"));
    }

    #[tokio::test]
    async fn test_failed_update_invalidates_nothing() {
        let server = TestServer::start().await;
        server.route("PATCH", "/organizers/12", 404, json!({"error": "missing"}));
        let client = seeded(&server);

        let result = client.update_organizer().mutate(OrganizerUpdate::new(12)).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert!(!stale(&client, ORGANIZERS));
        assert!(!stale(&client, EVENTS));
    }

    #[tokio::test]
    async fn test_merge_organizer() {
        let server = TestServer::start().await;
        server.route("POST", "/organizers/9/merge", 200, json!({"eventsMoved": 3}));
        let client = seeded(&server);

        let outcome = client
            .merge_organizer()
            .mutate(OrganizerMerge {
                source_organizer_id: 9,
                target_organizer_id: 4,
                delete_source: true,
            })
            .await
            .unwrap();

        assert_eq!(outcome.events_moved, Some(3));
        assert_eq!(
            server.requests()[0].body,
            Some(json!({"targetOrganizerId": 4, "deleteSource": true}))
        );
        for name in [ORGANIZERS, EVENTS, ATTENDEES] {
            assert!(stale(&client, name), "{name} should be stale");
        }
    }

    #[tokio::test]
    async fn test_delete_organizer_events() {
        let server = TestServer::start().await;
        server.route("DELETE", "/organizers/9/events", 200, json!({"deleted": 5}));
        let client = seeded(&server);

        let result = client
            .delete_organizer_events()
            .mutate(OrganizerEventsDeletion {
                organizer_id: 9,
                only_without_attendees: true,
            })
            .await
            .unwrap();

        assert_eq!(result.deleted, 5);
        assert!(stale(&client, EVENTS));
        assert!(stale(&client, ATTENDEES));
        assert!(!stale(&client, ORGANIZERS));
    }

    #[tokio::test]
    async fn test_fetch_organizers_caches() {
        let server = TestServer::start().await;
        server.route("GET", "/organizers", 200, json!([{"id": 1, "name": "A"}]));
        let client = DataClient::new(server.api(), QueryClient::new());

        let first = client.fetch_organizers().await;
        assert_eq!(first.data.map(|o| o.len()), Some(1));
        assert_eq!(server.count("GET", "/organizers"), 1);
    }
}
