use super::{keys, DataClient};
use crate::models::FestivalScheduleEvent;
use crate::query::QueryState;

impl DataClient {
    /// The festival schedule is only served to signed-in users; with the
    /// gate closed this returns an idle state without a request.
    pub async fn fetch_festival_schedule(&self) -> QueryState<Vec<FestivalScheduleEvent>> {
        let api = self.api.clone();
        self.queries
            .fetch_query(
                keys::festival_schedule(),
                move || async move { api.get(&["do_festival_schedule"]).await },
                self.options.gated_by(self.gate),
            )
            .await
    }
}
