mod common;

use std::io::Write;
use std::path::PathBuf;

use common::{MockEngine, RecordingReporter, Script};
use qlik_cache_warmer::error::InputError;
use qlik_cache_warmer::models::load_uris_from_spreadsheet;
use qlik_cache_warmer::{Config, Warmer};
use tokio_test::assert_ok;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[tokio::test]
async fn reads_urls_from_first_worksheet_row_by_row() {
    let uris = assert_ok!(load_uris_from_spreadsheet(&fixture("views.xlsx")).await);

    let found: Vec<String> = uris.iter().map(|u| u.to_string()).collect();
    assert_eq!(
        found,
        vec![
            "https://qlik.example.com/sales/single?appid=A1&sheet=S1",
            "https://qlik.example.com/sales/single?appid=A1&sheet=S2&select=Year%2C2024",
            "http://qlik.local:4848/single?appid=B7&sheet=Main",
        ]
    );
    // 第二个工作表不读取
    assert!(!found.iter().any(|u| u.contains("Z9")));
}

#[tokio::test]
async fn label_cells_do_not_count_as_unparsed() {
    let uris = assert_ok!(load_uris_from_spreadsheet(&fixture("views.xlsx")).await);

    let script = Script::new()
        .app("A1")
        .app("B7")
        .field("Year")
        .sheet("S1", &["c1"])
        .sheet("S2", &["c2"])
        .sheet("Main", &[]);
    let warmer = Warmer::new(MockEngine::new(script), RecordingReporter::new(), &Config::default());

    let summary = warmer.run_urls(uris).await;

    assert_eq!(summary.unparsed, 0);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.warmed, 3);
    assert!(summary.is_success(), "{:?}", summary);
}

#[tokio::test]
async fn corrupt_workbook_is_a_read_failure() {
    let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
    writeln!(file, "this is not a zip archive").unwrap();

    let result = load_uris_from_spreadsheet(file.path()).await;
    assert!(matches!(result, Err(InputError::ReadFailed { .. })), "{:?}", result);
}
