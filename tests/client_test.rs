//! End-to-end lookups against a mock portal

mod common;

use masothue::{LookupClient, LookupError, NeverCancel};
use mockito::{Matcher, Server};

use common::{captcha_page, create_html_mock, detail_page, search_page, test_config};

const DETAIL_PATH: &str = "/1234567890-cong-ty-tnhh-a";

#[tokio::test]
async fn test_tax_code_lookup_merges_details() {
    let mut server = Server::new_async().await;
    let search = search_page(&[
        ("CÔNG TY TNHH A", "1234567890", DETAIL_PATH),
        ("CÔNG TY TNHH A CHI NHÁNH", "1234567890-001", "/1234567890-001-chi-nhanh"),
    ]);
    let _search = create_html_mock(&mut server, "/Search/", &search).await;
    let _detail = create_html_mock(
        &mut server,
        DETAIL_PATH,
        &detail_page("1234567890", "Nguyễn Văn A"),
    )
    .await;

    let client = LookupClient::new(test_config(&server.url(), None)).unwrap();
    let results = client.lookup("1234567890", &NeverCancel).await.unwrap();

    assert_eq!(results.len(), 1);
    let hit = &results[0];
    assert_eq!(hit.tax_code, "1234567890");
    assert_eq!(hit.name, "CÔNG TY TNHH A");
    assert!(hit.has_details());
    assert_eq!(hit.representative.as_deref(), Some("Nguyễn Văn A"));
    assert_eq!(hit.address.as_deref(), Some("Số 2 Hàng Khay, Hoàn Kiếm, Hà Nội"));
    assert_eq!(hit.phone.as_deref(), Some("024 3825 1234"));
    assert_eq!(hit.other_businesses.len(), 2);
}

#[tokio::test]
async fn test_fetch_details_reports_tax_code() {
    let mut server = Server::new_async().await;
    let _detail = create_html_mock(
        &mut server,
        DETAIL_PATH,
        &detail_page("1234567890", "Nguyễn Văn A"),
    )
    .await;

    let client = LookupClient::new(test_config(&server.url(), None)).unwrap();
    let details = client.fetch_details(DETAIL_PATH, &NeverCancel).await.unwrap();
    assert_eq!(details.tax_code(), Some("1234567890"));
    assert_eq!(details.status(), Some("Đang hoạt động (đã được cấp GCN ĐKT)"));
}

#[tokio::test]
async fn test_details_come_from_cache_on_repeat() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new_async().await;
    let search = search_page(&[("CÔNG TY TNHH A", "1234567890", DETAIL_PATH)]);
    let _search = create_html_mock(&mut server, "/Search/", &search).await;
    let detail = server
        .mock("GET", DETAIL_PATH)
        .with_status(200)
        .with_body(detail_page("1234567890", "Nguyễn Văn A"))
        .expect(1)
        .create_async()
        .await;

    let client = LookupClient::new(test_config(&server.url(), Some(dir.path()))).unwrap();
    let first = client.lookup("1234567890", &NeverCancel).await.unwrap();
    let second = client.lookup("1234567890", &NeverCancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(client.cache().unwrap().entry_count(), 1);
    detail.assert_async().await;
}

#[tokio::test]
async fn test_tax_code_without_exact_match() {
    let mut server = Server::new_async().await;
    let search = search_page(&[("CÔNG TY TNHH A", "1234567890", DETAIL_PATH)]);
    let _search = create_html_mock(&mut server, "/Search/", &search).await;

    let client = LookupClient::new(test_config(&server.url(), None)).unwrap();
    assert!(client.lookup("9999999999", &NeverCancel).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_name_lookup_returns_all_candidates() {
    let mut server = Server::new_async().await;
    let search = search_page(&[
        ("CÔNG TY TNHH A", "1234567890", DETAIL_PATH),
        ("CÔNG TY CỔ PHẦN B", "0109876543", "/0109876543-cong-ty-co-phan-b"),
    ]);
    let _search = server
        .mock("GET", "/Search/")
        .match_query(Matcher::UrlEncoded("q".into(), "công ty".into()))
        .with_status(200)
        .with_body(search)
        .create_async()
        .await;
    let detail = server
        .mock("GET", DETAIL_PATH)
        .expect(0)
        .create_async()
        .await;

    let client = LookupClient::new(test_config(&server.url(), None)).unwrap();
    let results = client.lookup("  công ty ", &NeverCancel).await.unwrap();

    let codes: Vec<&str> = results.iter().map(|r| r.tax_code.as_str()).collect();
    assert_eq!(codes, vec!["1234567890", "0109876543"]);
    assert!(results.iter().all(|r| !r.has_details()));
    assert_eq!(
        results[1].representative.as_deref(),
        Some("Người Đại Diện 0109876543")
    );
    detail.assert_async().await;
}

#[tokio::test]
async fn test_name_lookup_with_details() {
    let mut server = Server::new_async().await;
    let search = search_page(&[("CÔNG TY TNHH A", "1234567890", DETAIL_PATH)]);
    let _search = create_html_mock(&mut server, "/Search/", &search).await;
    let _detail = create_html_mock(
        &mut server,
        DETAIL_PATH,
        &detail_page("1234567890", "Nguyễn Văn A"),
    )
    .await;

    let config = test_config(&server.url(), None)
        .into_builder()
        .fetch_details_for_names(true)
        .build()
        .unwrap();
    let client = LookupClient::new(config).unwrap();
    let results = client.lookup("công ty a", &NeverCancel).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].has_details());
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let client = LookupClient::new(test_config("http://127.0.0.1:9", None)).unwrap();
    let err = client.lookup("   ", &NeverCancel).await.unwrap_err();
    assert!(matches!(err, LookupError::Validation { .. }));
}

#[tokio::test]
async fn test_challenge_on_search_page() {
    let mut server = Server::new_async().await;
    let _search = create_html_mock(&mut server, "/Search/", &captcha_page()).await;

    let client = LookupClient::new(test_config(&server.url(), None)).unwrap();
    let err = client.lookup("1234567890", &NeverCancel).await.unwrap_err();
    assert!(matches!(err, LookupError::Blocked { .. }));
    assert!(!err.user_message().is_empty());
}

#[tokio::test]
async fn test_detail_failure_keeps_search_result() {
    let mut server = Server::new_async().await;
    let search = search_page(&[("CÔNG TY TNHH A", "1234567890", DETAIL_PATH)]);
    let _search = create_html_mock(&mut server, "/Search/", &search).await;
    let _detail = server
        .mock("GET", DETAIL_PATH)
        .with_status(500)
        .create_async()
        .await;

    let client = LookupClient::new(test_config(&server.url(), None)).unwrap();
    let results = client.lookup("1234567890", &NeverCancel).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].has_details());
    assert_eq!(
        results[0].representative.as_deref(),
        Some("Người Đại Diện 1234567890")
    );
}
