use serde_json::Value;

use super::keys::{self, EVENTS};
use super::DataClient;
use crate::api::ApiError;
use crate::models::{ApprovalStatus, Event, EventUpdate, Organizer};
use crate::query::{KeyPart, Mutation, QueryKey, QueryState};

/// Which events to list. Filters are sent as query parameters and applied
/// again to the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventsOptions {
    pub include_facilitator_only: bool,
    pub include_non_ny: bool,
    pub include_private: bool,
    pub include_hidden_organizers: bool,
    pub include_hidden: bool,
    pub include_approval_pending: bool,
    /// Overrides `include_approval_pending` when set
    pub approval_statuses: Vec<ApprovalStatus>,
}

impl EventsOptions {
    /// Everything an admin screen needs to see.
    pub fn admin() -> Self {
        Self {
            include_facilitator_only: true,
            include_non_ny: true,
            include_hidden_organizers: true,
            include_hidden: true,
            approval_statuses: vec![ApprovalStatus::Approved, ApprovalStatus::Pending, ApprovalStatus::Rejected],
            ..Self::default()
        }
    }

    fn approval_param(&self) -> Option<String> {
        if !self.approval_statuses.is_empty() {
            let statuses: Vec<String> = self.approval_statuses.iter().map(|s| s.to_string()).collect();
            Some(statuses.join(","))
        } else if self.include_approval_pending {
            Some("approved,pending".to_string())
        } else {
            None
        }
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(EVENTS).with_params([
            ("includeFacilitatorOnly", KeyPart::from(self.include_facilitator_only)),
            ("includeNonNY", KeyPart::from(self.include_non_ny)),
            ("includePrivate", KeyPart::from(self.include_private)),
            ("includeHiddenOrganizers", KeyPart::from(self.include_hidden_organizers)),
            ("includeHidden", KeyPart::from(self.include_hidden)),
            ("includeApprovalPending", KeyPart::from(self.include_approval_pending)),
            ("approvalStatuses", KeyPart::from(self.approval_param())),
        ])
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.include_hidden_organizers {
            params.push(("includeHiddenOrganizers", "true".to_string()));
        }
        if self.include_hidden {
            params.push(("includeHidden", "true".to_string()));
        }
        if self.include_private {
            params.push(("visibility", "private".to_string()));
        }
        if let Some(statuses) = self.approval_param() {
            params.push(("approval_status", statuses));
        }
        params
    }

    /// Whether `event` belongs in the list. The server is not trusted to
    /// have applied the hidden, visibility and approval filters.
    pub fn keep(&self, event: &Event) -> bool {
        self.keep_audience(event)
            && (self.include_hidden || !event.hidden.unwrap_or(false))
            && (self.include_hidden_organizers || !event.organizer.as_ref().is_some_and(Organizer::is_hidden))
            && (self.include_private || !event.is_private())
            && event.approval_status.map_or(true, |status| self.allows(status))
    }

    fn keep_audience(&self, event: &Event) -> bool {
        if self.include_facilitator_only {
            return true;
        }
        if self.include_non_ny {
            return !event.facilitator_only;
        }
        !event.facilitator_only && !event.non_ny
    }

    fn allows(&self, status: ApprovalStatus) -> bool {
        if !self.approval_statuses.is_empty() {
            return self.approval_statuses.contains(&status);
        }
        match status {
            ApprovalStatus::Approved => true,
            ApprovalStatus::Pending => self.include_approval_pending,
            ApprovalStatus::Rejected => false,
        }
    }
}

/// Body of `PUT /events/weekly-picks/{id}`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WeeklyPick {
    #[serde(skip)]
    pub event_id: i64,
    pub status: bool,
}

impl DataClient {
    pub async fn fetch_events(&self, options: &EventsOptions) -> QueryState<Vec<Event>> {
        let api = self.api.clone();
        let filters = options.clone();
        self.queries
            .fetch_query(
                options.key(),
                move || async move {
                    let events: Vec<Event> = api.get_with_query(&["events"], &filters.query_params()).await?;
                    Ok::<_, ApiError>(events.into_iter().filter(|e| filters.keep(e)).collect::<Vec<_>>())
                },
                self.options,
            )
            .await
    }

    /// Events waiting for review.
    pub async fn fetch_unapproved_events(&self) -> QueryState<Vec<Event>> {
        let api = self.api.clone();
        self.queries
            .fetch_query(
                keys::unapproved_events(),
                move || async move { api.get(&["events", "unapproved"]).await },
                self.options,
            )
            .await
    }

    /// `PATCH /events/{id}`.
    pub fn update_event(&self) -> Mutation<EventUpdate, Event> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |update: EventUpdate| {
            let api = api.clone();
            async move {
                let id = update.id.to_string();
                api.patch(&["events", id.as_str()], &update).await
            }
        })
        .invalidates(EVENTS)
    }

    /// Ask the server to rebuild its events cache, then refetch.
    pub fn flush_events_cache(&self) -> Mutation<(), Value> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |()| {
            let api = api.clone();
            async move { api.get_with_query(&["events"], &[("flushCache", "true")]).await }
        })
        .invalidates(EVENTS)
    }

    pub fn set_weekly_pick(&self) -> Mutation<WeeklyPick, Value> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |pick: WeeklyPick| {
            let api = api.clone();
            async move {
                let id = pick.event_id.to_string();
                api.put(&["events", "weekly-picks", id.as_str()], &pick).await
            }
        })
        .invalidates(EVENTS)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::{QueryClient, QueryFilter};
    use crate::resources::test_server::TestServer;

    fn event(id: i64, facilitator_only: bool, non_ny: bool) -> Value {
        json!({
            "id": id,
            "name": format!("Event {id}"),
            "start_date": "2025-03-01T19:00:00Z",
            "facilitator_only": facilitator_only,
            "non_ny": non_ny
        })
    }

    #[test]
    fn test_default_key_and_params() {
        let options = EventsOptions::default();
        assert!(options.query_params().is_empty());
        assert_eq!(options.key().resource(), Some(EVENTS));
        assert!(QueryFilter::from(EVENTS).matches(&options.key()));
        assert_ne!(options.key(), EventsOptions::admin().key());
    }

    #[test]
    fn test_approval_param() {
        let pending = EventsOptions {
            include_approval_pending: true,
            ..EventsOptions::default()
        };
        assert_eq!(
            pending.query_params(),
            vec![("approval_status", "approved,pending".to_string())]
        );

        let admin = EventsOptions::admin();
        assert!(admin
            .query_params()
            .contains(&("approval_status", "approved,pending,rejected".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_events_filters_client_side() {
        let server = TestServer::start().await;
        server.route(
            "GET",
            "/events",
            200,
            json!([event(1, false, false), event(2, true, false), event(3, false, true)]),
        );
        let client = DataClient::new(server.api(), QueryClient::new());

        let ny_only = client.fetch_events(&EventsOptions::default()).await.data.unwrap();
        assert_eq!(ny_only.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1]);

        let with_non_ny = EventsOptions {
            include_non_ny: true,
            ..EventsOptions::default()
        };
        let wider = client.fetch_events(&with_non_ny).await.data.unwrap();
        assert_eq!(wider.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 3]);

        // Distinct keys, so both lists are cached side by side
        assert_eq!(client.queries().len(), 2);
    }

    #[test]
    fn test_keep_hidden_private_and_unapproved() {
        let parse = |value: Value| serde_json::from_value::<Event>(value).unwrap();
        let with = |field: &str, value: Value| {
            let mut raw = event(1, false, false);
            raw[field] = value;
            parse(raw)
        };
        let hidden = with("hidden", json!(true));
        let private = with("visibility", json!("private"));
        let pending = with("approval_status", json!("pending"));
        let rejected = with("approval_status", json!("rejected"));
        let approved = with("approval_status", json!("approved"));
        let hidden_organizer = with("organizer", json!({"id": 3, "name": "Quiet Org", "hidden": true}));

        let public = EventsOptions::default();
        assert!(public.keep(&parse(event(1, false, false))));
        assert!(public.keep(&approved));
        for dropped in [&hidden, &private, &pending, &rejected, &hidden_organizer] {
            assert!(!public.keep(dropped));
        }

        let with_pending = EventsOptions {
            include_approval_pending: true,
            ..EventsOptions::default()
        };
        assert!(with_pending.keep(&pending));
        assert!(!with_pending.keep(&rejected));

        let admin = EventsOptions::admin();
        for kept in [&hidden, &pending, &rejected, &hidden_organizer] {
            assert!(admin.keep(kept));
        }
        assert!(!admin.keep(&private));

        let only_rejected = EventsOptions {
            approval_statuses: vec![ApprovalStatus::Rejected],
            ..EventsOptions::default()
        };
        assert!(only_rejected.keep(&rejected));
        assert!(!only_rejected.keep(&approved));
    }

    #[tokio::test]
    async fn test_default_fetch_drops_hidden_and_private_rows() {
        let server = TestServer::start().await;
        let mut hidden = event(2, false, false);
        hidden["hidden"] = json!(true);
        let mut private = event(3, false, false);
        private["visibility"] = json!("private");
        let mut pending = event(4, false, false);
        pending["approval_status"] = json!("pending");
        server.route("GET", "/events", 200, json!([event(1, false, false), hidden, private, pending]));
        let client = DataClient::new(server.api(), QueryClient::new());

        let events = client.fetch_events(&EventsOptions::default()).await.data.unwrap();
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1]);

        let with_private = EventsOptions {
            include_private: true,
            ..EventsOptions::default()
        };
        let mut private = event(6, false, false);
        private["visibility"] = json!("private");
        server.route(
            "GET",
            "/events?visibility=private",
            200,
            json!([event(1, false, false), private]),
        );
        let events = client.fetch_events(&with_private).await.data.unwrap();
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 6]);
    }

    #[tokio::test]
    async fn test_update_event_invalidates_every_events_query() {
        let server = TestServer::start().await;
        server.route("PATCH", "/events/7", 200, event(7, false, false));
        let client = DataClient::new(server.api(), QueryClient::new());
        let public = EventsOptions::default().key();
        let admin = EventsOptions::admin().key();
        client.queries().set_query_data(public.clone(), &json!([])).unwrap();
        client.queries().set_query_data(admin.clone(), &json!([])).unwrap();
        client.queries().set_query_data(keys::kinks(), &json!([])).unwrap();

        let update = EventUpdate {
            id: 7,
            name: Some("Renamed".into()),
            ..EventUpdate::default()
        };
        client.update_event().mutate(update).await.unwrap();

        assert!(client.queries().is_invalidated(&public));
        assert!(client.queries().is_invalidated(&admin));
        assert!(!client.queries().is_invalidated(&keys::kinks()));
    }

    #[tokio::test]
    async fn test_flush_events_cache() {
        let server = TestServer::start().await;
        server.route("GET", "/events?flushCache=true", 200, json!([]));
        let client = DataClient::new(server.api(), QueryClient::new());
        let key = EventsOptions::default().key();
        client.queries().set_query_data(key.clone(), &json!([])).unwrap();

        client.flush_events_cache().mutate(()).await.unwrap();
        assert!(client.queries().is_invalidated(&key));
    }
}
