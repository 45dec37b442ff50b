use super::{keys, DataClient};
use crate::models::EventAttendees;
use crate::query::QueryState;

impl DataClient {
    /// Who saved which event, for every event.
    pub async fn fetch_attendees(&self) -> QueryState<Vec<EventAttendees>> {
        let api = self.api.clone();
        self.queries
            .fetch_query(
                keys::attendees(),
                move || async move { api.get(&["attendees"]).await },
                self.options,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::QueryClient;
    use crate::resources::test_server::TestServer;

    #[tokio::test]
    async fn test_fetch_attendees() {
        let server = TestServer::start().await;
        server.route(
            "GET",
            "/attendees",
            200,
            json!([{"event_id": 4, "attendees": [{"id": "u1", "name": "Ann", "avatar_url": null}]}]),
        );
        let client = DataClient::new(server.api(), QueryClient::new());

        let state = client.fetch_attendees().await;
        let entries = state.data.unwrap();
        assert_eq!(entries[0].event_id, 4);
        assert_eq!(entries[0].attendees[0].name, "Ann");
        assert!(client.queries().get_query_data::<Vec<EventAttendees>>(&keys::attendees()).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_server_error_surfaces() {
        let server = TestServer::start().await;
        server.route("GET", "/attendees", 503, json!({"error": "down"}));
        let client = DataClient::new(server.api(), QueryClient::new());

        let state = client.fetch_attendees().await;
        assert!(state.is_error());
        assert!(state.data.is_none());
        assert_eq!(
            state.error.map(|e| e.kind()),
            Some(crate::api::ErrorKind::Response)
        );
    }
}
