// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leadrs::config::settings::EngineConfig;
use leadrs::engines::chromium_engine::ChromiumEngine;
use leadrs::engines::traits::ScraperEngine;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPANY_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Acme Analytics - Business Intelligence Platform</title>
    <meta name="description" content="Acme Analytics turns raw traffic into revenue insights for B2B SaaS teams.">
    <meta property="og:site_name" content="Acme Analytics">
    <meta property="og:title" content="Acme Analytics">
    <link rel="icon" href="/favicon.png">
</head>
<body>
    <header>
        <img src="/logo.png" alt="Acme Analytics logo">
        <nav>
            <a href="/pricing">Pricing</a>
            <a href="/about">About us</a>
            <a href="/contact">Contact</a>
        </nav>
    </header>
    <main>
        <h1>Know your pipeline</h1>
        <p>We help demand generation teams score and route inbound leads.</p>
    </main>
    <footer>
        <a href="mailto:sales@acme.io">sales@acme.io</a>
        <a href="tel:+14155550123">+1 415 555 0123</a>
        <a href="https://linkedin.com/company/acme-analytics">LinkedIn</a>
        <a href="https://twitter.com/acmeanalytics">Twitter</a>
    </footer>
</body>
</html>"#;

/// 需要本机安装Chromium，默认跳过
#[tokio::test]
#[ignore]
async fn test_scrape_live_page_produces_scored_lead() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(COMPANY_PAGE, "text/html"))
        .mount(&server)
        .await;

    let engine = ChromiumEngine::new(EngineConfig::default());
    engine.initialize().await.unwrap();

    let record = engine.scrape(&server.uri()).await.unwrap();

    assert!(!record.is_failure());
    assert_eq!(record.name, "Acme Analytics");
    assert_eq!(record.email, "sales@acme.io");
    assert!(record.seo.title.contains("Acme Analytics"));
    assert!(!record.pages.pricing.is_empty());
    assert!(!record.socials.linkedin.is_empty());
    assert!(record.confidence > 0);
    assert!(record.lead_score > 0);

    engine.close().await.unwrap();
}

/// 需要本机安装Chromium，默认跳过
#[tokio::test]
#[ignore]
async fn test_screenshot_writes_full_page_png() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(COMPANY_PAGE, "text/html"))
        .mount(&server)
        .await;

    let engine = ChromiumEngine::new(EngineConfig::default());
    engine.initialize().await.unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("acme.png");
    engine.screenshot(&server.uri(), &target).await.unwrap();

    let metadata = std::fs::metadata(&target).unwrap();
    assert!(metadata.len() > 0);

    engine.close().await.unwrap();
}
