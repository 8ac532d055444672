//! Shared fixtures: a wiremock config gateway and a sync service pointed at it.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use db_config_sync::apply::ApplyStrategy;
use db_config_sync::credential::CredentialProvider;
use db_config_sync::gateway::GatewayClient;
use db_config_sync::model::{Category, MigrationRequest, TargetDescriptor};
use db_config_sync::DatabaseSync;
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_SECRET: &str = "test-secret-for-integration-tests";

pub fn sync_for(server: &MockServer, strategy: ApplyStrategy) -> DatabaseSync {
    let gateway = GatewayClient::new(Url::parse(&server.uri()).unwrap());
    DatabaseSync::new(CredentialProvider::new(TEST_SECRET), Arc::new(gateway))
        .with_strategy(strategy)
        .with_timeout(Duration::from_secs(10))
}

pub fn request(to: Value) -> MigrationRequest {
    MigrationRequest {
        project_id: "p1".into(),
        source_alias: "mongo1".into(),
        target: TargetDescriptor::from_value(to).unwrap(),
    }
}

/// Serve `records` for one category's list endpoint, filtered by `dbAlias=mongo1`.
pub async fn mount_list(server: &MockServer, category: Category, records: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(category.list_path("p1")))
        .and(query_param("dbAlias", "mongo1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": records })))
        .mount(server)
        .await;
}

/// Serve an empty list for every category not already mounted.
pub async fn mount_empty_lists(server: &MockServer, except: &[Category]) {
    for category in Category::ALL {
        if !except.contains(&category) {
            mount_list(server, category, vec![]).await;
        }
    }
}
