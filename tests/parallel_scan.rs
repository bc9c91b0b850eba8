// Parallel scanner tests: bounded workers, discarding, aggregation and output

use bucketrust::config::{Endpoints, ProviderFilter, ScanConfig};
use bucketrust::parallel_executor::ParallelBucketScanner;
use bucketrust::providers::ProviderKind;
use bucketrust::report_generator::save_flat_file;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn endpoints_at(base: &str) -> Endpoints {
    Endpoints {
        aws_virtual_hosted: format!("{}/vhost/{{name}}", base),
        aws_path_style: format!("{}/path/{{name}}", base),
        gcp: format!("{}/gcs/{{name}}", base),
        azure_account: format!("{}/azure/{{name}}", base),
        azure_containers: vec!["$web".into(), "public".into()],
        alibaba: format!("{}/oss/{{region}}/{{name}}", base),
        alibaba_regions: vec!["oss-cn-hangzhou".into(), "oss-us-west-1".into()],
        digitalocean: format!("{}/do/{{region}}/{{name}}", base),
        digitalocean_regions: vec!["nyc3".into(), "fra1".into()],
    }
}

fn closed_port_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_peak_workers_bounded_by_concurrency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;

    let config = ScanConfig {
        concurrency: 2,
        timeout_secs: 5,
        providers: ProviderFilter::only(&[ProviderKind::Aws]),
        endpoints: endpoints_at(&server.uri()),
        ..ScanConfig::default()
    };
    let scanner = ParallelBucketScanner::new(config).unwrap();
    let targets: Vec<String> = (0..6).map(|i| format!("bucket-{i}")).collect();

    let results = scanner.scan(targets, |_| {}).await;

    assert!(results.is_empty());
    assert_eq!(scanner.completed_targets(), 6);
    assert!(scanner.peak_workers() >= 1);
    assert!(scanner.peak_workers() <= 2);
    // Two candidates per target, every target probed
    assert_eq!(server.received_requests().await.unwrap().len(), 12);
}

#[tokio::test]
async fn test_unreachable_everywhere_is_discarded() {
    let config = ScanConfig {
        timeout_secs: 5,
        endpoints: endpoints_at(&closed_port_base()),
        ..ScanConfig::default()
    };
    let scanner = ParallelBucketScanner::new(config).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let results = scanner
        .scan(vec!["ghost-bucket".to_string()], move |r| {
            sink.lock().unwrap().push(r.clone())
        })
        .await;

    assert!(results.is_empty());
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_only_accepted_results_reach_caller_and_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vhost/open-bucket"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<ListBucketResult><Contents><Key>e1</Key></Contents><Contents><Key>e2</Key></Contents><Contents><Key>e3</Key></Contents></ListBucketResult>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gcs/locked-bucket"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let config = ScanConfig {
        concurrency: 4,
        timeout_secs: 5,
        list_files: true,
        providers: ProviderFilter::only(&[ProviderKind::Aws, ProviderKind::Gcp]),
        endpoints: endpoints_at(&server.uri()),
        ..ScanConfig::default()
    };
    let scanner = ParallelBucketScanner::new(config).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let targets = vec![
        "open-bucket".to_string(),
        "locked-bucket".to_string(),
        "ghost-bucket".to_string(),
    ];
    let mut results = scanner
        .scan(targets, move |r| sink.lock().unwrap().push(r.name.clone()))
        .await;
    results.sort_by(|a, b| a.name.cmp(&b.name));

    assert_eq!(results.len(), 2);
    assert_eq!(seen.lock().unwrap().len(), 2);

    let locked = &results[0];
    assert_eq!(locked.name, "locked-bucket");
    assert_eq!(locked.provider, ProviderKind::Gcp);
    assert!(locked.exists && !locked.public_read && !locked.public_list);

    let open = &results[1];
    assert_eq!(open.name, "open-bucket");
    assert_eq!(open.provider, ProviderKind::Aws);
    assert_eq!(open.files, vec!["e1", "e2", "e3"]);
    assert!(!open.public_write);

    for result in &results {
        assert!(result.files.len() <= 10);
        assert!(!result.public_list || result.public_read);
    }

    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("found.txt");
    save_flat_file(&results, &out).unwrap();
    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(!content.contains("ghost-bucket"));
    assert!(content.contains(&format!(
        "open-bucket | AWS S3 | {}/vhost/open-bucket | Read:true | List:true | Write:false",
        server.uri()
    )));
}

#[tokio::test]
async fn test_overlapping_scans_keep_their_own_results() {
    let server = MockServer::start().await;
    for (bucket, delay) in [("fast-bucket", 0), ("mid-bucket", 150), ("slow-bucket", 300)] {
        Mock::given(method("GET"))
            .and(path(format!("/gcs/{}", bucket)))
            .respond_with(ResponseTemplate::new(403).set_delay(Duration::from_millis(delay)))
            .mount(&server)
            .await;
    }

    let config = ScanConfig {
        concurrency: 4,
        timeout_secs: 5,
        providers: ProviderFilter::only(&[ProviderKind::Gcp]),
        endpoints: endpoints_at(&server.uri()),
        ..ScanConfig::default()
    };
    let scanner = ParallelBucketScanner::new(config).unwrap();

    let (first, second) = tokio::join!(
        scanner.scan(vec!["fast-bucket".to_string(), "slow-bucket".to_string()], |_| {}),
        scanner.scan(vec!["mid-bucket".to_string()], |_| {}),
    );

    let mut first: Vec<String> = first.into_iter().map(|r| r.name).collect();
    first.sort();
    let second: Vec<String> = second.into_iter().map(|r| r.name).collect();

    assert_eq!(first, vec!["fast-bucket", "slow-bucket"]);
    assert_eq!(second, vec!["mid-bucket"]);
    assert_eq!(scanner.completed_targets(), 3);
}
