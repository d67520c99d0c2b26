/// Integration tests with a mocked GoHighLevel API
/// Exercises the client against wiremock without hitting the real CRM
use ev_quote_api::config::Config;
use ev_quote_api::ghl_client::GhlClient;
use ev_quote_api::ghl_models::{ContactRequest, OpportunityRequest};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(base_url: String) -> Config {
    Config {
        port: 3001,
        ghl_api_key: "test_key".to_string(),
        ghl_location_id: "loc_123".to_string(),
        ghl_pipeline_id: Some("pipe_1".to_string()),
        ghl_base_url: base_url,
        ghl_api_version: "2021-07-28".to_string(),
        ghl_max_retries: 2,
    }
}

fn test_client(server: &MockServer) -> GhlClient {
    GhlClient::new(&create_test_config(server.uri()))
        .unwrap()
        .with_retry_base_delay(Duration::from_millis(10))
}

fn jane() -> ContactRequest {
    let mut request = ContactRequest {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: Some("jane@example.com".to_string()),
        phone: Some("+12015550123".to_string()),
        ..Default::default()
    };
    request
        .custom_fields
        .insert("quiz_score".to_string(), json!(5));
    request
}

#[tokio::test]
async fn test_create_contact_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .and(header("Authorization", "Bearer test_key"))
        .and(header("Version", "2021-07-28"))
        .and(body_partial_json(json!({
            "firstName": "Jane",
            "locationId": "loc_123",
            "customFields": [{"key": "quiz_score", "field_value": 5}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "contact": {"id": "contact_1", "firstName": "Jane"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = test_client(&mock_server).create_contact(&jane()).await.unwrap();

    assert_eq!(outcome.contact_id.as_deref(), Some("contact_1"));
    assert!(!outcome.duplicate);
    assert_eq!(outcome.contact["firstName"], "Jane");
}

#[tokio::test]
async fn test_create_contact_duplicate_returns_existing_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": 400,
            "message": "This location does not allow duplicated contacts.",
            "meta": {"contactName": "Jane Doe", "contactId": "existing_9", "matchingField": "email"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = test_client(&mock_server).create_contact(&jane()).await.unwrap();

    assert!(outcome.duplicate);
    assert_eq!(outcome.contact_id.as_deref(), Some("existing_9"));
}

#[tokio::test]
async fn test_create_contact_validation_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .respond_with(ResponseTemplate::new(422).set_body_string("email is invalid"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = test_client(&mock_server).create_contact(&jane()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;

    // First two calls fail, third succeeds
    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contact": {"id": "contact_2"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = test_client(&mock_server).create_contact(&jane()).await.unwrap();

    assert_eq!(outcome.contact_id.as_deref(), Some("contact_2"));
}

#[tokio::test]
async fn test_retries_give_up_after_limit() {
    let mock_server = MockServer::start().await;

    // 1 attempt + 2 retries
    Mock::given(method("GET"))
        .and(path("/locations/loc_123"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = test_client(&mock_server).get_location().await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_create_opportunity_uses_lead_in_stage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opportunities/pipelines/pipe_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pipeline": {
                "id": "pipe_1",
                "stages": [
                    {"id": "stage_new", "name": "New"},
                    {"id": "stage_lead_in", "name": "Lead In"}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/opportunities/"))
        .and(body_partial_json(json!({
            "name": "EV Charger Quote - Jane Doe",
            "pipelineId": "pipe_1",
            "pipelineStageId": "stage_lead_in",
            "contactId": "contact_1",
            "monetaryValue": 1200.0,
            "status": "open",
            "locationId": "loc_123"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "opportunity": {"id": "opp_1"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = OpportunityRequest {
        contact_id: "contact_1".to_string(),
        title: "EV Charger Quote - Jane Doe".to_string(),
        status: None,
        value: Some(1200.0),
        source: Some("EV Charger Quiz".to_string()),
    };

    let opportunity = test_client(&mock_server)
        .create_opportunity("pipe_1", &request)
        .await
        .unwrap();

    assert_eq!(opportunity["id"], "opp_1");
}

#[tokio::test]
async fn test_create_opportunity_without_readable_pipeline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opportunities/pipelines/pipe_1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/opportunities/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "opp_2"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = OpportunityRequest {
        contact_id: "contact_1".to_string(),
        title: "Quote".to_string(),
        status: None,
        value: None,
        source: None,
    };

    let opportunity = test_client(&mock_server)
        .create_opportunity("pipe_1", &request)
        .await
        .unwrap();

    assert_eq!(opportunity["id"], "opp_2");
}

#[tokio::test]
async fn test_get_location() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/loc_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": {"id": "loc_123", "name": "Electric Medic"}
        })))
        .mount(&mock_server)
        .await;

    let location = test_client(&mock_server).get_location().await.unwrap();

    assert_eq!(location["name"], "Electric Medic");
}
