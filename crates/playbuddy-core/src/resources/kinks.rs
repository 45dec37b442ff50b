use super::{keys, DataClient};
use crate::models::Kink;
use crate::query::QueryState;

impl DataClient {
    pub async fn fetch_kinks(&self) -> QueryState<Vec<Kink>> {
        let api = self.api.clone();
        self.queries
            .fetch_query(keys::kinks(), move || async move { api.get(&["kinks"]).await }, self.options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::query::{QueryClient, QueryOptions};
    use crate::resources::test_server::TestServer;

    #[tokio::test]
    async fn test_stale_time_reuses_cached_kinks() {
        let server = TestServer::start().await;
        server.route("GET", "/kinks", 200, json!([{"id": 1, "idea_title": "Blindfold"}]));
        let client = DataClient::new(server.api(), QueryClient::new())
            .with_query_options(QueryOptions::default().with_stale_time(Duration::from_secs(300)));

        let (a, b) = (client.fetch_kinks().await, client.fetch_kinks().await);
        assert_eq!(a.data.unwrap()[0].idea_title, "Blindfold");
        assert!(b.is_success());
        assert_eq!(server.count("GET", "/kinks"), 1);
    }
}
