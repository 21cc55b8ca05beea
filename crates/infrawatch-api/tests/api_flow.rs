use infrawatch_api::{ApiServer, HttpResponse, ServerConfig};
use serde_json::{json, Value};

fn server() -> ApiServer {
    ApiServer::new(&ServerConfig::default())
}

fn call(server: &ApiServer, method: &str, path: &str, body: Value) -> (u16, Value) {
    let bytes = if body.is_null() {
        Vec::new()
    } else {
        serde_json::to_vec(&body).expect("encode body")
    };
    let resp: HttpResponse = server.dispatch(method, path, &bytes);
    let json = resp.json_body().unwrap_or(Value::Null);
    (resp.status, json)
}

fn dashboard_assets() -> Value {
    json!([
        {"id": "B-101", "name": "Downtown Artery Bridge", "fpi": 88},
        {"id": "B-102", "name": "Northside Overpass", "fpi": 92},
        {"id": "B-103", "name": "Rivercross Viaduct", "fpi": 76},
        {"id": "B-104", "name": "Westgate Bridge", "fpi": 42}
    ])
}

#[test]
fn index_and_health_respond() {
    let server = server();
    let (status, body) = call(&server, "GET", "/", Value::Null);
    assert_eq!(status, 200);
    assert_eq!(body["message"], "InfraWatch++ Backend API");
    assert!(body["endpoints"].get("/api/optimize-repairs").is_some());

    let (status, body) = call(&server, "GET", "/health", Value::Null);
    assert_eq!(status, 200);
    assert_eq!(body, json!({"status": "ok"}));
}

#[test]
fn bridges_are_listed_with_derived_category() {
    let server = server();
    let (status, body) = call(&server, "GET", "/api/bridges", Value::Null);
    assert_eq!(status, 200);
    let bridges = body.as_array().expect("bridge array");
    assert_eq!(bridges.len(), 2);
    assert_eq!(bridges[0]["id"], "B-101");
    assert_eq!(bridges[0]["fpi"], 88);
    assert_eq!(bridges[0]["risk_category"], "high");
    assert_eq!(bridges[1]["area"], "North Industrial Area");
}

#[test]
fn single_bridge_lookup_and_missing_bridge() {
    let server = server();
    let (status, body) = call(&server, "GET", "/api/bridges/B-102", Value::Null);
    assert_eq!(status, 200);
    assert_eq!(body["name"], "Northside Overpass");

    let (status, body) = call(&server, "GET", "/api/bridges/B-404", Value::Null);
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Bridge not found"}));
}

#[test]
fn calculate_risk_uses_live_formula() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/calculate-risk",
        json!({
            "id": "B-101",
            "age_years": 45,
            "traffic_load_index": 88,
            "heavy_vehicle_percentage": 32,
            "incident_reports_count": 17,
            "flood_exposure_index": 75,
            "heat_stress_index": 65,
            "earthquake_zone_index": 40
        }),
    );
    assert_eq!(status, 200);
    assert_eq!(body["fpi"], 56);
    assert_eq!(body["riskCategory"], "medium");
    let explanation = body["explanation"].as_str().expect("explanation text");
    assert!(explanation.starts_with("High risk due to: Age (45 years)"));
    assert!(explanation.contains("Flood-prone area"));
    assert_eq!(body["componentScores"]["usage"], 22.4);
}

#[test]
fn calculate_risk_reports_maintenance_gap() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/calculate-risk",
        json!({
            "age_years": 10,
            "traffic_load_index": 20,
            "heavy_vehicle_percentage": 5,
            "incident_reports_count": 0,
            "flood_exposure_index": 10,
            "heat_stress_index": 10,
            "earthquake_zone_index": 10,
            "last_maintenance_date": "2001-01-01"
        }),
    );
    assert_eq!(status, 200);
    assert_eq!(body["riskCategory"], "low");
    assert!(body["explanation"]
        .as_str()
        .expect("explanation text")
        .contains("-year maintenance gap"));
}

#[test]
fn calculate_risk_rejects_missing_and_out_of_range_fields() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/calculate-risk",
        json!({"age_years": 45, "traffic_load_index": 88}),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = call(
        &server,
        "POST",
        "/api/calculate-risk",
        json!({
            "age_years": -3,
            "traffic_load_index": 88,
            "heavy_vehicle_percentage": 32,
            "incident_reports_count": 17,
            "flood_exposure_index": 75,
            "heat_stress_index": 65,
            "earthquake_zone_index": 40
        }),
    );
    assert_eq!(status, 400);
    assert!(body["message"]
        .as_str()
        .expect("message")
        .contains("age_years"));
}

#[test]
fn optimize_repairs_matches_dashboard_example() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/optimize-repairs",
        json!({"budget": 3, "assets": dashboard_assets()}),
    );
    assert_eq!(status, 200);
    let repairs = body["recommendedRepairs"].as_array().expect("repairs");
    let ids: Vec<&str> = repairs
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["B-102", "B-101", "B-103"]);
    assert_eq!(repairs[0]["name"], "Northside Overpass");
    assert_eq!(body["currentTotalRisk"], 298);
    assert_eq!(body["newTotalRisk"], 102);
    assert_eq!(body["riskReduction"], "65.8");
    assert_eq!(body["message"], "Fix 3 assets to reduce total risk by 65.8%");
}

#[test]
fn optimize_repairs_zero_or_missing_budget_uses_default() {
    let server = server();
    for payload in [
        json!({"budget": 0, "assets": dashboard_assets()}),
        json!({"assets": dashboard_assets()}),
        json!({"budget": null, "assets": dashboard_assets()}),
    ] {
        let (status, body) = call(&server, "POST", "/api/optimize-repairs", payload);
        assert_eq!(status, 200);
        assert_eq!(body["recommendedRepairs"].as_array().map(Vec::len), Some(3));
        assert!(body["message"]
            .as_str()
            .expect("message")
            .starts_with("Fix 3 assets"));
    }
}

#[test]
fn optimize_repairs_accepts_integral_float_budget() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/optimize-repairs",
        json!({"budget": 2.0, "assets": dashboard_assets()}),
    );
    assert_eq!(status, 200);
    assert_eq!(body["recommendedRepairs"].as_array().map(Vec::len), Some(2));

    let (status, body) = call(
        &server,
        "POST",
        "/api/optimize-repairs",
        json!({"budget": 1.5, "assets": dashboard_assets()}),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_request");
}

#[test]
fn optimize_repairs_accepts_catalog_output() {
    let server = server();
    let (_, bridges) = call(&server, "GET", "/api/bridges", Value::Null);
    let (status, body) = call(
        &server,
        "POST",
        "/api/optimize-repairs",
        json!({"budget": 1, "assets": bridges}),
    );
    assert_eq!(status, 200);
    assert_eq!(body["recommendedRepairs"][0]["id"], "B-102");
    assert_eq!(body["recommendedRepairs"][0]["risk_category"], "high");
    assert_eq!(body["currentTotalRisk"], 180);
    assert_eq!(body["newTotalRisk"], 108);
    assert_eq!(body["riskReduction"], "40.0");
}

#[test]
fn optimize_repairs_on_empty_portfolio_reports_zero() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/optimize-repairs",
        json!({"budget": 2, "assets": []}),
    );
    assert_eq!(status, 200);
    assert_eq!(body["recommendedRepairs"], json!([]));
    assert_eq!(body["riskReduction"], "0.0");
}

#[test]
fn optimize_repairs_rejects_bad_payloads() {
    let server = server();
    let (status, _) = call(
        &server,
        "POST",
        "/api/optimize-repairs",
        json!({"budget": -1, "assets": dashboard_assets()}),
    );
    assert_eq!(status, 400);

    let (status, body) = call(
        &server,
        "POST",
        "/api/optimize-repairs",
        json!({"assets": [{"id": "B-1", "fpi": 140}]}),
    );
    assert_eq!(status, 400);
    assert!(body["message"]
        .as_str()
        .expect("message")
        .contains("assets[0].fpi"));

    let resp = server.dispatch("POST", "/api/optimize-repairs", b"{not json");
    assert_eq!(resp.status, 400);
}

#[test]
fn report_lifecycle_and_stats() {
    let server = server();
    let (status, created) = call(
        &server,
        "POST",
        "/api/reports",
        json!({"problemType": "crack", "bridgeId": "B-101", "description": "hairline crack on pier"}),
    );
    assert_eq!(status, 200);
    assert_eq!(created["success"], true);
    assert_eq!(created["message"], "Report submitted successfully");
    let report_id = created["reportId"].as_str().expect("report id").to_string();

    call(
        &server,
        "POST",
        "/api/reports",
        json!({"problemType": "flooding"}),
    );

    let (status, listed) = call(&server, "GET", "/api/reports", Value::Null);
    assert_eq!(status, 200);
    let listed = listed.as_array().expect("report list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1]["id"], report_id.as_str());
    assert_eq!(listed[1]["bridgeId"], "B-101");

    let path = format!("/api/reports/{report_id}/status");
    let (status, ack) = call(&server, "PUT", &path, json!({"status": "in-progress"}));
    assert_eq!(status, 200);
    assert_eq!(ack["message"], "Report status updated to in-progress");

    let (status, fetched) = call(
        &server,
        "GET",
        &format!("/api/reports/{report_id}"),
        Value::Null,
    );
    assert_eq!(status, 200);
    assert_eq!(fetched["status"], "in-progress");

    let (status, stats) = call(&server, "GET", "/api/report-stats", Value::Null);
    assert_eq!(status, 200);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["new"], 1);
    assert_eq!(stats["inProgress"], 1);
    assert_eq!(stats["resolved"], 0);
    assert_eq!(stats["byType"], json!({"crack": 1, "flooding": 1}));
}

#[test]
fn numeric_problem_type_is_kept() {
    let server = server();
    let (status, created) = call(&server, "POST", "/api/reports", json!({"problemType": 5}));
    assert_eq!(status, 200);
    let id = created["reportId"].as_str().expect("report id").to_string();

    let (_, fetched) = call(&server, "GET", &format!("/api/reports/{id}"), Value::Null);
    assert_eq!(fetched["problemType"], "5");
    let (_, stats) = call(&server, "GET", "/api/report-stats", Value::Null);
    assert_eq!(stats["byType"], json!({"5": 1}));
}

#[test]
fn report_errors_are_mapped() {
    let server = server();
    let (status, body) = call(&server, "GET", "/api/reports/RPT-0", Value::Null);
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Report not found"}));

    let (status, _) = call(
        &server,
        "PUT",
        "/api/reports/RPT-0/status",
        json!({"status": "resolved"}),
    );
    assert_eq!(status, 404);

    let (_, created) = call(&server, "POST", "/api/reports", json!({}));
    let id = created["reportId"].as_str().expect("report id").to_string();
    let (status, body) = call(
        &server,
        "PUT",
        &format!("/api/reports/{id}/status"),
        json!({"status": "archived"}),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_request");
}

#[test]
fn unknown_routes_and_methods() {
    let server = server();
    let (status, _) = call(&server, "GET", "/api/nowhere", Value::Null);
    assert_eq!(status, 404);

    let (status, _) = call(&server, "DELETE", "/api/bridges", Value::Null);
    assert_eq!(status, 405);

    let (status, _) = call(&server, "GET", "/api/calculate-risk", Value::Null);
    assert_eq!(status, 405);

    let (status, _) = call(&server, "POST", "/api/bridges/B-101", json!({}));
    assert_eq!(status, 405);
}
