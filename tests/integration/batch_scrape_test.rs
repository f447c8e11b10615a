// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::mock_engine::{MockEngine, ScriptedOutcome};
use leadrs::config::settings::ScreenshotSettings;
use leadrs::engines::traits::{BatchOptions, ScraperEngine};
use std::time::Duration;

#[tokio::test]
async fn test_batch_results_match_input_in_order_and_length() {
    tokio::time::pause();

    let engine = MockEngine::new(vec![
        (
            "https://acme.io",
            ScriptedOutcome::Lead {
                lead_score: 85,
                confidence: 90,
            },
        ),
        (
            "https://unreachable.example",
            ScriptedOutcome::NavigationError("net::ERR_NAME_NOT_RESOLVED"),
        ),
        (
            "https://initech.com",
            ScriptedOutcome::Lead {
                lead_score: 45,
                confidence: 60,
            },
        ),
        ("https://slow.example", ScriptedOutcome::Timeout),
    ]);
    let urls: Vec<String> = vec![
        "https://acme.io".to_string(),
        "https://unreachable.example".to_string(),
        "https://initech.com".to_string(),
        "https://slow.example".to_string(),
    ];

    let results = engine.scrape_batch(&urls, &BatchOptions::default()).await;

    assert_eq!(results.len(), urls.len());
    let result_urls: Vec<&str> = results.iter().map(|record| record.url.as_str()).collect();
    assert_eq!(
        result_urls,
        vec![
            "https://acme.io",
            "https://unreachable.example",
            "https://initech.com",
            "https://slow.example"
        ]
    );

    assert!(!results[0].is_failure());
    assert_eq!(results[0].lead_score, 85);
    assert!(results[1].is_failure());
    assert!(results[1]
        .error
        .as_deref()
        .unwrap()
        .contains("net::ERR_NAME_NOT_RESOLVED"));
    assert!(results[3].is_failure());
}

#[tokio::test]
async fn test_leads_at_or_above_threshold_get_screenshots() {
    tokio::time::pause();

    let engine = MockEngine::new(vec![
        (
            "https://www.acme.io",
            ScriptedOutcome::Lead {
                lead_score: 85,
                confidence: 90,
            },
        ),
        (
            "https://initech.com",
            ScriptedOutcome::Lead {
                lead_score: 70,
                confidence: 80,
            },
        ),
        (
            "https://hooli.com",
            ScriptedOutcome::Lead {
                lead_score: 69,
                confidence: 75,
            },
        ),
    ]);
    let urls: Vec<String> = vec![
        "https://www.acme.io".to_string(),
        "https://initech.com".to_string(),
        "https://hooli.com".to_string(),
    ];

    let tmp = tempfile::tempdir().unwrap();
    let screenshot_dir = tmp.path().join(ScreenshotSettings::default().output_dir);
    let options = BatchOptions {
        screenshot_high_priority: true,
        screenshot_dir: screenshot_dir.clone(),
        ..BatchOptions::default()
    };

    engine.scrape_batch(&urls, &options).await;

    // Screenshots for scores 85 and 70 only, named after the stripped hostname
    let paths = engine.screenshot_paths.lock().unwrap().clone();
    assert_eq!(
        paths,
        vec![
            screenshot_dir.join("acme.io.png"),
            screenshot_dir.join("initech.com.png")
        ]
    );
    assert!(screenshot_dir.is_dir());
}

#[tokio::test(start_paused = true)]
async fn test_inter_batch_delay_applies_between_chunks_only() {
    let engine = MockEngine::new(vec![
        (
            "https://a.example",
            ScriptedOutcome::Lead {
                lead_score: 10,
                confidence: 10,
            },
        ),
        (
            "https://b.example",
            ScriptedOutcome::Lead {
                lead_score: 10,
                confidence: 10,
            },
        ),
        (
            "https://c.example",
            ScriptedOutcome::Lead {
                lead_score: 10,
                confidence: 10,
            },
        ),
        (
            "https://d.example",
            ScriptedOutcome::Lead {
                lead_score: 10,
                confidence: 10,
            },
        ),
    ]);
    let urls: Vec<String> = vec![
        "https://a.example".to_string(),
        "https://b.example".to_string(),
        "https://c.example".to_string(),
        "https://d.example".to_string(),
    ];

    // Two chunks of two, one delay in between
    let options = BatchOptions {
        batch_size: 2,
        inter_batch_delay_ms: 2000,
        ..BatchOptions::default()
    };
    let start = tokio::time::Instant::now();
    engine.scrape_batch(&urls, &options).await;
    assert_eq!(start.elapsed(), Duration::from_millis(2000));

    // A single chunk finishes without any delay
    let options = BatchOptions {
        batch_size: 8,
        inter_batch_delay_ms: 2000,
        ..BatchOptions::default()
    };
    let start = tokio::time::Instant::now();
    engine.scrape_batch(&urls, &options).await;
    assert_eq!(start.elapsed(), Duration::ZERO);
}
