//! Shared fixtures for the integration tests

use masothue::LookupConfig;
use mockito::{Matcher, Mock, Server};
use std::path::Path;

/// Configuration pointed at a mock server, with no pacing delays
#[allow(dead_code)]
pub fn test_config(base_url: &str, cache_dir: Option<&Path>) -> LookupConfig {
    let builder = LookupConfig::builder()
        .base_url(base_url)
        .max_requests(100)
        .min_delay(0.0)
        .max_delay(0.0)
        .use_random_delay(false)
        .request_timeout(5.0)
        .request_retries(2)
        .retry_delay(0.0)
        .cooldown_chunk(1.0);
    let builder = match cache_dir {
        Some(dir) => builder.cache_dir(dir),
        None => builder.cache_enabled(false),
    };
    builder.build().expect("test config is valid")
}

/// Search listing with one block per `(name, tax_code, detail_path)`
#[allow(dead_code)]
pub fn search_page(entries: &[(&str, &str, &str)]) -> String {
    let blocks: String = entries
        .iter()
        .map(|(name, tax_code, path)| {
            format!(
                r#"<div class="tax-listing-item">
    <h3><a href="{path}">{name}</a></h3>
    <div>Mã số thuế: <a href="{path}">{tax_code}</a></div>
    <div>Người đại diện: <a href="/tra-cuu-ma-so-thue-theo-ten-nguoi-dai-dien/{tax_code}">Người Đại Diện {tax_code}</a></div>
    <address>Số 1 Đường Láng, Đống Đa, Hà Nội</address>
</div>
"#
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="vi">
<head><meta charset="UTF-8"><title>Tra cứu mã số thuế</title></head>
<body>
<nav><a href="/">Trang chủ</a></nav>
<div class="tax-listing">
{blocks}</div>
<footer>Chính sách bảo mật reCAPTCHA của Google</footer>
</body>
</html>"#
    )
}

/// Detail page with the info table and an industry list
#[allow(dead_code)]
pub fn detail_page(tax_code: &str, representative: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="vi">
<head><meta charset="UTF-8"><title>{tax_code} - CÔNG TY TNHH A</title></head>
<body>
<div class="intro">
  <p>Người đại diện: <strong>Tên Trong Đoạn Giới Thiệu</strong></p>
</div>
<table class="table-taxinfo">
  <thead><tr><th colspan="2"><h1>CÔNG TY TNHH A</h1></th></tr></thead>
  <tbody>
    <tr><td><i class="fa fa-hashtag"></i> Mã số thuế</td><td itemprop="taxID"><span class="copy">{tax_code}</span></td></tr>
    <tr><td>Địa chỉ Thuế</td><td itemprop="address"><span id="tax-address-html">Số 1 Tràng Tiền, Hoàn Kiếm, Hà Nội</span></td></tr>
    <tr><td>Địa chỉ</td><td itemprop="address">Số 2 Hàng Khay, Hoàn Kiếm, Hà Nội</td></tr>
    <tr><td>Người đại diện</td><td><span itemprop="name"><a href="/tra-cuu/nguoi-dai-dien">{representative}</a></span>
        <br>Ngoài ra {representative} còn đại diện các doanh nghiệp khác</td></tr>
    <tr><td>Điện thoại</td><td itemprop="telephone">024 3825 1234</td></tr>
    <tr><td>Ngày hoạt động</td><td><span class="copy">2010-05-12</span></td></tr>
    <tr><td>Quản lý bởi</td><td>Chi cục Thuế Quận Hoàn Kiếm</td></tr>
    <tr><td>Loại hình DN</td><td><a href="/loai-hinh/tnhh">Công ty trách nhiệm hữu hạn ngoài NN</a></td></tr>
    <tr><td>Tình trạng</td><td><a href="/tinh-trang">Đang hoạt động (đã được cấp GCN ĐKT)</a></td></tr>
  </tbody>
</table>
<h3>Ngành nghề kinh doanh</h3>
<table class="table">
  <thead><tr><th>Mã</th><th>Ngành</th></tr></thead>
  <tbody>
    <tr><td><a href="/nganh/4620">4620</a></td><td><strong><a href="/nganh/4620">Bán buôn nông, lâm sản nguyên liệu</a></strong></td></tr>
    <tr><td><a href="/nganh/4632">4632</a></td><td>Bán buôn thực phẩm</td></tr>
  </tbody>
</table>
</body>
</html>"#
    )
}

/// Verification challenge page served instead of content
#[allow(dead_code)]
pub fn captcha_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><script src="https://www.google.com/recaptcha/api.js" async defer></script></head>
<body>
  <p>Vui lòng xác minh bạn không phải robot</p>
  <form method="post"><div class="g-recaptcha" data-sitekey="6Lc-test"></div></form>
</body>
</html>"#
        .to_string()
}

/// Mock serving `html` at `path`, whatever the query string
#[allow(dead_code)]
pub async fn create_html_mock(server: &mut Server, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create_async()
        .await
}

/// Mock answering `path` with `status`
#[allow(dead_code)]
pub async fn create_error_mock(server: &mut Server, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::Any)
        .with_status(status)
        .with_body("Error")
        .create_async()
        .await
}
