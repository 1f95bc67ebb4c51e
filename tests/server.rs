use csvstats::{
    config::Config,
    server::{self, Defaults},
    AnalyticsEngine, DatasetStore,
};
use serde_json::Value;
use std::sync::Arc;
use warp::{http::StatusCode, Filter, Reply};

const BOUNDARY: &str = "csvstats-test-boundary";

const MONTHS_CSV: &str = "Month,A,B\nJan,10,5\nFeb,20,15\nMar,30,10\n";

fn routes() -> impl Filter<Extract = (impl Reply,), Error = std::convert::Infallible> + Clone {
    let engine = AnalyticsEngine::new(Arc::new(DatasetStore::new()));
    server::routes(engine, Defaults::from(&Config::default()))
}

fn multipart(field: &str, file_name: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    )
}

async fn upload<F>(routes: &F, field: &str, content: &str) -> (StatusCode, Value)
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    let resp = warp::test::request()
        .method("POST")
        .path("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart(field, "data.csv", content))
        .reply(routes)
        .await;
    let body = serde_json::from_slice(resp.body()).expect("json body");
    (resp.status(), body)
}

async fn get<F>(routes: &F, path: &str) -> (StatusCode, Value)
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    let resp = warp::test::request()
        .method("GET")
        .path(path)
        .reply(routes)
        .await;
    let body = serde_json::from_slice(resp.body()).expect("json body");
    (resp.status(), body)
}

#[tokio::test]
async fn health_check() {
    let routes = routes();
    let (status, body) = get(&routes, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn upload_then_run_every_analysis() {
    let routes = routes();
    let (status, body) = upload(&routes, "file", MONTHS_CSV).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 3);
    assert_eq!(body["columns"], serde_json::json!(["Month", "A", "B"]));
    let id = body["fileId"].as_str().unwrap().to_string();

    let (status, total) = get(&routes, &format!("/analytics/{id}/total")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total["topSeries"], "A");
    assert_eq!(total["total"], 60.0);

    let (_, corr) = get(&routes, &format!("/analytics/{id}/correlation")).await;
    assert_eq!(corr["A"]["B"], 0.5);
    assert_eq!(corr["B"]["A"], 0.5);
    assert_eq!(corr["A"]["A"], 1.0);

    let (_, ma) = get(
        &routes,
        &format!("/analytics/{id}/moving-average?series=B&window=1"),
    )
    .await;
    let averages: Vec<f64> = ma
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["average"].as_f64().unwrap())
        .collect();
    assert_eq!(averages, vec![5.0, 15.0, 10.0]);
    assert_eq!(ma[2]["index"], 2);

    let (_, fc) = get(
        &routes,
        &format!("/analytics/{id}/forecast?series=A&months=2"),
    )
    .await;
    assert_eq!(fc["slope"], 10.0);
    assert_eq!(fc["intercept"], 10.0);
    assert_eq!(fc["predictions"][0]["index"], 3);
    assert_eq!(fc["predictions"][0]["value"], 40.0);
    assert_eq!(fc["predictions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn moving_average_defaults_to_window_of_three() {
    let routes = routes();
    let csv = "date,v\n2024-01-01,3\n2024-01-02,6\n2024-01-03,9\n2024-01-04,12\n";
    let (_, body) = upload(&routes, "file", csv).await;
    let id = body["fileId"].as_str().unwrap().to_string();

    let (status, ma) = get(
        &routes,
        &format!("/analytics/{id}/moving-average?series=v&window=oops"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ma[3]["average"], 9.0);
}

#[tokio::test]
async fn header_only_upload_is_cached_but_not_analyzable() {
    let routes = routes();
    let (status, body) = upload(&routes, "file", "Month,A,B\n").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 0);
    let id = body["fileId"].as_str().unwrap().to_string();

    for view in [
        "total",
        "correlation",
        "moving-average?series=A",
        "forecast?series=A",
    ] {
        let (status, err) = get(&routes, &format!("/analytics/{id}/{view}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "view {view}");
        assert_eq!(err["error"], "not_found");
    }
}

#[tokio::test]
async fn unknown_dataset_and_series() {
    let routes = routes();
    let (status, err) = get(&routes, "/analytics/does-not-exist/total").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "not_found");

    let (_, body) = upload(&routes, "file", MONTHS_CSV).await;
    let id = body["fileId"].as_str().unwrap().to_string();

    let (status, err) = get(&routes, &format!("/analytics/{id}/forecast?series=Z")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");

    let (status, err) = get(&routes, &format!("/analytics/{id}/moving-average")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "missing_parameter");
}

#[tokio::test]
async fn forecast_length_is_capped() {
    let routes = routes();
    let (_, body) = upload(&routes, "file", MONTHS_CSV).await;
    let id = body["fileId"].as_str().unwrap().to_string();

    for query in [
        format!("months={}", usize::MAX),
        "monthsForecast=100000000000".to_string(),
    ] {
        let path = format!("/analytics/{id}/forecast?series=A&{query}");
        let (status, fc) = get(&routes, &path).await;
        assert_eq!(status, StatusCode::OK, "{query}");
        let predictions = fc["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), csvstats::analytics::MAX_PERIODS);
        assert_eq!(predictions[0]["index"], 3);
    }
}

#[tokio::test]
async fn upload_without_content_length() {
    let routes = routes();
    let resp = warp::test::request()
        .method("POST")
        .path("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), StatusCode::LENGTH_REQUIRED);
    let err: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(err["error"], "length_required");
}

#[tokio::test]
async fn upload_without_file_field() {
    let routes = routes();
    let (status, err) = upload(&routes, "attachment", MONTHS_CSV).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "missing_parameter");
}

#[tokio::test]
async fn datasets_are_listed_in_upload_order() {
    let routes = routes();
    let (_, first) = upload(&routes, "file", MONTHS_CSV).await;
    let (_, second) = upload(&routes, "file", "Month,A\n").await;

    let (status, list) = get(&routes, "/datasets").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["fileId"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            first["fileId"].as_str().unwrap(),
            second["fileId"].as_str().unwrap()
        ]
    );
}

#[tokio::test]
async fn unknown_routes_are_json_404s() {
    let routes = routes();
    let (status, err) = get(&routes, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");

    let (status, _) = get(&routes, "/analytics/x/median").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
