use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use chrono::NaiveDate;
use cotiza_cli::commands::{build, catalog, config, expiration};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;

#[test]
fn config_reports_defaults_with_sources() {
    with_env(&[], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0, "expected config inspection success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("- budget.lead_business_days = 7 (source: default)"));
        assert!(message.contains("- data.fixture_path = <built-in demo> (source: default)"));
    });
}

#[test]
fn config_attributes_env_overrides() {
    with_env(&[("COTIZA_BUDGET_LEAD_BUSINESS_DAYS", "5"), ("COTIZA_LOG_LEVEL", "debug")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains(
            "- budget.lead_business_days = 5 (source: env (COTIZA_BUDGET_LEAD_BUSINESS_DAYS))"
        ));
        assert!(message.contains("- logging.level = debug (source: env (COTIZA_LOG_LEVEL))"));
    });
}

#[test]
fn config_returns_failure_for_invalid_values() {
    with_env(&[("COTIZA_BUDGET_LEAD_BUSINESS_DAYS", "0")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn expiration_skips_sundays() {
    with_env(&[], || {
        let result = expiration::run(Some(date(2024, 1, 1)), None);
        assert_eq!(result.exit_code, 0);

        let report = parse_message(&result.output);
        assert_eq!(report["lead_business_days"], 7);
        assert_eq!(report["valid_until"], "2024-01-09");

        let saturday = expiration::run(Some(date(2024, 1, 6)), Some(1));
        assert_eq!(parse_message(&saturday.output)["valid_until"], "2024-01-08");
    });
}

#[test]
fn expiration_rejects_zero_lead_time() {
    with_env(&[], || {
        let result = expiration::run(Some(date(2024, 1, 1)), Some(0));
        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn catalog_lists_categories_and_resolutions_from_demo_data() {
    with_env(&[], || {
        let result = catalog::run(None, Vec::new());
        assert_eq!(result.exit_code, 0);

        let report = parse_message(&result.output);
        let labels: Vec<&str> = report["categories"]
            .as_array()
            .map(|categories| {
                categories.iter().filter_map(|category| category["label"].as_str()).collect()
            })
            .unwrap_or_default();
        assert_eq!(labels, vec!["Convencional", "Bombeable", "Pavimento"]);
        assert_eq!(report["pump_product"], "srv-bombeo");

        assert_eq!(resolved(&report, "convencional", "150"), json!("c-conv-150"));
        assert_eq!(resolved(&report, "bombeable", "150"), Value::Null);
        assert_eq!(resolved(&report, "pavimento", "mr40"), json!("c-pav-40"));
    });
}

#[test]
fn catalog_reads_fixture_files() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let fixture = write_fixture(dir.path());

        let result = catalog::run(Some(fixture), vec!["300".to_string()]);
        assert_eq!(result.exit_code, 0);

        let report = parse_message(&result.output);
        assert_eq!(report["product_count"], 2);
        assert_eq!(report["pump_product"], Value::Null);
        assert_eq!(resolved(&report, "rapidaresistencia", "300"), json!("c-rr-300"));
    });
}

#[test]
fn catalog_reports_missing_fixture() {
    with_env(&[], || {
        let result = catalog::run(Some(PathBuf::from("does/not/exist.json")), Vec::new());
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "fixture");
    });
}

#[test]
fn build_reconciles_concrete_and_pump_lines() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let scenario = write_scenario(dir.path(), &complete_scenario());

        let result = build::run(&scenario, None, false);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let report = parse_message(&result.output);
        let ids: Vec<&str> = report["lines"]
            .as_array()
            .map(|lines| lines.iter().filter_map(|line| line["product_id"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec!["c-conv-150", "srv-bombeo", "oth-fibra"]);
        assert_eq!(report["validation"], json!({}));
        assert_eq!(report["specification"]["valid_until"], "2024-01-09");
        assert_eq!(report["submission"], Value::Null);

        // 12 x 1650 + 12 x 350 + 3 x 120 = 24360, plus 16% tax.
        assert_eq!(decimal(&report["totals"]["subtotal"]), Decimal::new(24_360, 0));
        assert_eq!(decimal(&report["totals"]["total"]), Decimal::new(2_825_760, 2));
    });
}

#[test]
fn build_submits_a_valid_budget() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let scenario = write_scenario(dir.path(), &complete_scenario());

        let result = build::run(&scenario, None, true);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let report = parse_message(&result.output);
        assert_eq!(report["submission"]["status"], "PENDING");
        assert!(report["submission"]["budget_id"].as_str().is_some_and(|id| !id.is_empty()));
    });
}

#[test]
fn build_submission_is_blocked_by_validation() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let scenario = write_scenario(
            dir.path(),
            &json!({
                "now": "2024-01-01T09:30:00",
                "updates": [{"field": "volume", "value": "12"}]
            }),
        );

        let result = build::run(&scenario, None, true);
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "bad_request");
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("client_id"));
        assert!(message.contains("title: Title is required"));
    });
}

#[test]
fn build_reports_locked_pump_toggle() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let scenario = write_scenario(
            dir.path(),
            &json!({
                "updates": [
                    {"field": "concrete_category", "value": "Bombeable"},
                    {"field": "pump_required", "value": false}
                ]
            }),
        );

        let result = build::run(&scenario, None, false);
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["error_class"], "bad_request");
    });
}

#[test]
fn build_reports_oversized_quantities_as_bad_requests() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let scenario = write_scenario(
            dir.path(),
            &json!({
                "manual_items": [
                    {"product_id": "oth-fibra", "quantity": "79228162514264337593543950335"}
                ]
            }),
        );

        let result = build::run(&scenario, None, false);
        assert_eq!(result.exit_code, 5, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "bad_request");
        assert!(payload["message"].as_str().unwrap_or("").contains("numeric range"));
    });
}

#[test]
fn build_rejects_malformed_scenarios() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let scenario = write_scenario(dir.path(), &json!({"updatez": []}));

        let result = build::run(&scenario, None, false);
        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_scenario");
    });
}

fn complete_scenario() -> Value {
    json!({
        "now": "2024-01-01T09:30:00",
        "updates": [
            {"field": "client_id", "value": "cli-001"},
            {"field": "title", "value": "Losa planta alta"},
            {"field": "delivery_date", "value": "2024-01-10"},
            {"field": "volume", "value": "12"},
            {"field": "pump_required", "value": true}
        ],
        "manual_items": [{"product_id": "oth-fibra", "quantity": "3"}],
        "tax_enabled": true
    })
}

fn write_scenario(dir: &Path, scenario: &Value) -> PathBuf {
    let path = dir.join("scenario.json");
    fs::write(&path, scenario.to_string()).expect("write scenario");
    path
}

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("catalog.json");
    let fixture = json!({
        "company": {"iva_rate": "8"},
        "products": [
            {
                "id": "c-rr-300",
                "name": "Concreto RR f'c 300",
                "type": "CONCRETE",
                "category": "Rapida Resistencia",
                "price": 2500
            },
            {
                "id": "oth-fibra",
                "name": "Fibra",
                "type": "OTHER",
                "category": "Aditivos",
                "price": 120
            }
        ]
    });
    fs::write(&path, fixture.to_string()).expect("write fixture");
    path
}

fn resolved(report: &Value, category: &str, resistance: &str) -> Value {
    report["resolutions"]
        .as_array()
        .and_then(|rows| {
            rows.iter().find(|row| row["category"] == category && row["resistance"] == resistance)
        })
        .map(|row| row["product_id"].clone())
        .unwrap_or_else(|| panic!("no resolution row for {category}/{resistance}"))
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => Decimal::from_str(raw).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn parse_message(output: &str) -> Value {
    let payload = parse_payload(output);
    let message = payload["message"].as_str().expect("message should be a string");
    serde_json::from_str(message).expect("message should carry a JSON report")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "COTIZA_BUDGET_LEAD_BUSINESS_DAYS",
        "COTIZA_BUDGET_PUMP_MINIMUM_VOLUME",
        "COTIZA_BUDGET_VOLUME_TOLERANCE",
        "COTIZA_BUDGET_DEFAULT_WORK_TYPE",
        "COTIZA_BUDGET_DEFAULT_CATEGORY",
        "COTIZA_BUDGET_DEFAULT_RESISTANCE",
        "COTIZA_BUDGET_PAVEMENT_RESISTANCE",
        "COTIZA_DATA_FIXTURE_PATH",
        "COTIZA_LOGGING_LEVEL",
        "COTIZA_LOGGING_FORMAT",
        "COTIZA_LOG_LEVEL",
        "COTIZA_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
