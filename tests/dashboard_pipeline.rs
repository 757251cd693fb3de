//! End-to-end loading tests: fixture payloads through the loader into reports

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use datacent::report::{Report, DEFAULT_TOP_N};
use datacent::services::api::Query;
use datacent::services::{DashboardLoader, LoadOutcome, Transport};
use datacent::types::{
    DataSource, DatacentError, DateRange, Department, DepartmentAnalytics, Result,
};
use serde_json::Value;

fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// Serves fixtures by path; unknown paths fail like a dead backend
#[derive(Default)]
struct FixtureTransport {
    routes: HashMap<&'static str, Value>,
    requests: Mutex<Vec<(String, Vec<(&'static str, String)>)>>,
}

impl FixtureTransport {
    fn route(mut self, path: &'static str, body: Value) -> Self {
        self.routes.insert(path, body);
        self
    }

    fn requests(&self) -> Vec<(String, Vec<(&'static str, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for &FixtureTransport {
    fn get_json(&self, path: &str, query: &Query) -> Result<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), query.to_vec()));
        self.routes
            .get(path)
            .cloned()
            .ok_or_else(|| DatacentError::Status {
                status: 503,
                url: format!("http://fixture{}", path),
            })
    }
}

/// Serves different bodies for the first and later calls to the same path
struct FlakyTransport {
    calls: Mutex<usize>,
    second: Value,
}

impl Transport for &FlakyTransport {
    fn get_json(&self, path: &str, _query: &Query) -> Result<Value> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == 1 {
            Err(DatacentError::Parse(format!("garbled body from {}", path)))
        } else {
            Ok(self.second.clone())
        }
    }
}

fn ready(outcome: LoadOutcome) -> (DepartmentAnalytics, DataSource) {
    match outcome {
        LoadOutcome::Ready { analytics, source } => (analytics, source),
        LoadOutcome::NoData { reason } => panic!("expected data, got no-data: {}", reason),
    }
}

// ========== Sales ==========

#[test]
fn test_sales_rows_aggregated_client_side() {
    let transport = FixtureTransport::default().route("/sales", fixture("sales_rows.json"));
    let loader = DashboardLoader::new(&transport, 10);

    let (analytics, source) = ready(loader.load(Department::Sales, None));
    assert_eq!(source, DataSource::ClientSide);

    let DepartmentAnalytics::Sales(sales) = &analytics else {
        panic!("wrong department");
    };
    assert_eq!(sales.kpis.total_units, 8.0);
    assert_eq!(sales.kpis.total_revenue, 150.0);
    assert_eq!(sales.kpis.returns_pct, 12.5);
    assert_eq!(sales.time_series.len(), 2);
    assert_eq!(sales.by_region.len(), 2);
    assert_eq!(
        sales.conclusions,
        vec![
            "Revenue decreased 50.0% over the selected range.",
            "Top region by revenue: A (100).",
        ]
    );
}

#[test]
fn test_sales_server_analytics_used_directly() {
    let transport = FixtureTransport::default().route("/sales", fixture("sales_analytics.json"));
    let loader = DashboardLoader::new(&transport, 10);

    let (analytics, source) = ready(loader.load(Department::Sales, None));
    assert_eq!(source, DataSource::Server);

    let DepartmentAnalytics::Sales(sales) = &analytics else {
        panic!("wrong department");
    };
    assert_eq!(sales.kpis.total_units, 8.0);
    assert_eq!(sales.kpis.arpu, 18.75);
    // Dates arrive unordered and come out ascending
    let dates: Vec<String> = sales
        .time_series
        .iter()
        .map(|p| p.date.to_string())
        .collect();
    assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);
    assert_eq!(sales.by_dealer[0].key, "D1");
    assert_eq!(
        sales.conclusions,
        vec!["Revenue decreased 50.0% over the selected range."]
    );
    assert_eq!(sales.sample.rows.len(), 2);
}

#[test]
fn test_sales_range_sent_and_applied() {
    let transport = FixtureTransport::default().route("/sales", fixture("sales_rows.json"));
    let loader = DashboardLoader::new(&transport, 10);
    let range = DateRange::parse("2024-01-02", "2024-01-31").unwrap();

    let (analytics, _) = ready(loader.load(Department::Sales, Some(&range)));
    let DepartmentAnalytics::Sales(sales) = &analytics else {
        panic!("wrong department");
    };
    assert_eq!(sales.kpis.total_units, 3.0);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].1,
        vec![
            ("start", "2024-01-02".to_string()),
            ("end", "2024-01-31".to_string()),
        ]
    );
}

#[test]
fn test_sales_falls_back_once() {
    let transport = FlakyTransport {
        calls: Mutex::new(0),
        second: fixture("sales_rows.json"),
    };
    let loader = DashboardLoader::new(&transport, 10);

    let (_, source) = ready(loader.load(Department::Sales, None));
    assert_eq!(source, DataSource::Fallback);
    assert_eq!(*transport.calls.lock().unwrap(), 2);
}

#[test]
fn test_sales_backend_down_is_no_data() {
    let transport = FixtureTransport::default();
    let loader = DashboardLoader::new(&transport, 10);

    let outcome = loader.load(Department::Sales, None);
    assert!(matches!(outcome, LoadOutcome::NoData { .. }));
    // Primary request plus exactly one fallback
    assert_eq!(transport.requests().len(), 2);
}

#[test]
fn test_sales_mixed_date_formats_ascending() {
    let transport =
        FixtureTransport::default().route("/sales", fixture("sales_mixed_dates.json"));
    let loader = DashboardLoader::new(&transport, 10);

    let (analytics, _) = ready(loader.load(Department::Sales, None));
    let DepartmentAnalytics::Sales(sales) = &analytics else {
        panic!("wrong department");
    };
    let dates: Vec<String> = sales
        .time_series
        .iter()
        .map(|p| p.date.to_string())
        .collect();
    assert_eq!(
        dates,
        vec![
            "2024-01-01",
            "2024-01-03",
            "2024-01-05",
            "2024-01-10",
            "2024-01-15",
        ]
    );
}

#[test]
fn test_sales_row_order_does_not_change_results() {
    let rows = fixture("sales_mixed_dates.json");
    let mut reversed = rows.clone();
    if let Value::Array(items) = &mut reversed {
        items.reverse();
    }

    let forward = FixtureTransport::default().route("/sales", rows);
    let backward = FixtureTransport::default().route("/sales", reversed);
    let (a, _) = ready(DashboardLoader::new(&forward, 10).load(Department::Sales, None));
    let (b, _) = ready(DashboardLoader::new(&backward, 10).load(Department::Sales, None));
    let (DepartmentAnalytics::Sales(a), DepartmentAnalytics::Sales(b)) = (&a, &b) else {
        panic!("wrong department");
    };

    assert_eq!(a.kpis, b.kpis);
    assert_eq!(a.kpis.total_revenue, 61.6);
    assert_eq!(a.time_series, b.time_series);

    let mut regions = a.by_region.clone();
    let mut other = b.by_region.clone();
    regions.sort_by(|x, y| x.key.cmp(&y.key));
    other.sort_by(|x, y| x.key.cmp(&y.key));
    assert_eq!(regions, other);
    assert_eq!(a.sample.rows.len(), b.sample.rows.len());
}

// ========== Manufacturing ==========

#[test]
fn test_manufacturing_rows_default_window() {
    let transport = FixtureTransport::default().route(
        "/analysis/manufacturing",
        fixture("manufacturing_rows.json"),
    );
    let loader = DashboardLoader::new(&transport, 10);

    let (analytics, source) = ready(loader.load(Department::Manufacturing, None));
    assert_eq!(source, DataSource::ClientSide);

    let DepartmentAnalytics::Manufacturing(mfg) = &analytics else {
        panic!("wrong department");
    };
    // The undated row falls outside the date window
    assert_eq!(mfg.kpis.total_production, 350.0);
    assert_eq!(mfg.kpis.total_defects, 5.0);
    assert_eq!(mfg.downtime_by_machine[0].name, "M2");
    assert_eq!(
        mfg.conclusions,
        vec![
            "Total production: 350, defects: 5 (rate 1.43%).",
            "Production decreased 25.0% over the selected range.",
        ]
    );
}

// ========== Field & Testing ==========

#[test]
fn test_field_range_filtered_client_side() {
    let transport = FixtureTransport::default().route("/field", fixture("field_rows.json"));
    let loader = DashboardLoader::new(&transport, 10);
    let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();

    let (analytics, _) = ready(loader.load(Department::Field, Some(&range)));
    let DepartmentAnalytics::Field(field) = &analytics else {
        panic!("wrong department");
    };
    assert_eq!(field.kpis.total_incidents, 2);
    assert_eq!(field.kpis.models_affected, 1);

    // The backend takes no range parameters for field data
    assert!(transport.requests()[0].1.is_empty());
}

#[test]
fn test_field_conclusions() {
    let transport = FixtureTransport::default().route("/field", fixture("field_rows.json"));
    let loader = DashboardLoader::new(&transport, 10);

    let (analytics, _) = ready(loader.load(Department::Field, None));
    assert_eq!(
        analytics.conclusions(),
        &[
            "The model Trail X shows the highest failure activity (2 incidents).",
            "Most common failure type: Brake (2).",
            "Highest average repair cost: Trail X (200).",
        ]
    );
}

#[test]
fn test_testing_wrapped_rows() {
    let transport = FixtureTransport::default().route("/testing", fixture("testing_rows.json"));
    let loader = DashboardLoader::new(&transport, 10);

    let (analytics, _) = ready(loader.load(Department::Testing, None));
    let DepartmentAnalytics::Testing(testing) = &analytics else {
        panic!("wrong department");
    };
    assert_eq!(testing.kpis.total_tests, 4);
    assert_eq!(testing.kpis.pass_rate_pct, 75.0);
    assert_eq!(
        testing.conclusions,
        vec![
            "Pass rate is 75.0% across 4 tests.",
            "Lowest average hardness: batch B2 (55).",
        ]
    );
}

// ========== Report ==========

#[test]
fn test_report_text_for_loaded_sales() {
    let transport = FixtureTransport::default().route("/sales", fixture("sales_rows.json"));
    let loader = DashboardLoader::new(&transport, 10);
    let (analytics, source) = ready(loader.load(Department::Sales, None));

    let text = Report::build(&analytics, source, None, DEFAULT_TOP_N).render_text();
    assert!(text.starts_with("Sales dashboard (client-side aggregation)"));
    assert!(text.contains("Conclusions"));
    assert!(text.contains("  - Top region by revenue: A (100)."));
}
