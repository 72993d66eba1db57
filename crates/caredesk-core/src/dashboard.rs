use caredesk_api::ApiClient;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::{info, warn};

use crate::models::{Beneficiary, BeneficiaryRequest, Employee, Guardian, Sponsor};
use crate::reports::Report;
use crate::schema::Record;
use crate::session::{Role, ViewKind};
use crate::stats::StatsSnapshot;
use crate::store::RecordStore;
use crate::Result;

/// Summary cards for one collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSummary {
    pub kind: ViewKind,
    pub stats: StatsSnapshot,
}

/// Landing screen: stats for every list the role may open
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub summaries: Vec<CollectionSummary>,
    /// Collections whose fetch failed, with the reason
    pub failures: Vec<(ViewKind, String)>,
}

impl Dashboard {
    pub fn summary(&self, kind: ViewKind) -> Option<&CollectionSummary> {
        self.summaries.iter().find(|s| s.kind == kind)
    }
}

/// Fetch one collection and compute its stats
pub async fn collection_stats<R: Record>(client: &ApiClient) -> Result<StatsSnapshot> {
    let listing = client.list::<R>(R::COLLECTION, None).await?;
    let store = RecordStore::new(listing.items, &R::list_config())?;
    Ok(store.stats().clone())
}

fn boxed<'a, R: Record>(client: &'a ApiClient) -> (ViewKind, BoxFuture<'a, Result<StatsSnapshot>>) {
    (R::KIND, collection_stats::<R>(client).boxed())
}

/// Load every accessible collection concurrently
///
/// One failing collection does not hide the others.
pub async fn load(client: &ApiClient, role: Role) -> Dashboard {
    let candidates = vec![
        boxed::<Beneficiary>(client),
        boxed::<Sponsor>(client),
        boxed::<Guardian>(client),
        boxed::<Employee>(client),
        boxed::<BeneficiaryRequest>(client),
        boxed::<Report>(client),
    ];

    let (kinds, fetches): (Vec<ViewKind>, Vec<_>) = candidates
        .into_iter()
        .filter(|(kind, _)| role.can_access(*kind))
        .unzip();

    let results = join_all(fetches).await;

    let mut dashboard = Dashboard::default();
    for (kind, result) in kinds.into_iter().zip(results) {
        match result {
            Ok(stats) => dashboard.summaries.push(CollectionSummary { kind, stats }),
            Err(e) => {
                warn!("Dashboard could not load {}: {}", kind, e);
                dashboard.failures.push((kind, e.to_string()));
            }
        }
    }

    info!(
        "Dashboard loaded {} collections ({} failed) for {}",
        dashboard.summaries.len(),
        dashboard.failures.len(),
        role
    );
    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_staff_dashboard_only_fetches_allowed_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/beneficiaries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 2,
                "beneficiaries": [
                    {"id": 1, "status": "active"},
                    {"id": 2, "status": "waiting_list"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/guardians"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/requests"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reports": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sponsors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let dashboard = load(&client, Role::Staff).await;

        let beneficiaries = dashboard.summary(ViewKind::Beneficiaries).unwrap();
        assert_eq!(beneficiaries.stats.total, 2);
        assert_eq!(beneficiaries.stats.count("waiting_list"), Some(1));
        assert_eq!(dashboard.summary(ViewKind::Guardians).unwrap().stats.total, 1);
        assert_eq!(dashboard.summary(ViewKind::Reports).unwrap().stats.total, 0);
        assert!(dashboard.summary(ViewKind::Sponsors).is_none());

        assert_eq!(dashboard.failures.len(), 1);
        assert_eq!(dashboard.failures[0].0, ViewKind::Requests);
        assert!(dashboard.failures[0].1.contains("db down"));
    }
}
