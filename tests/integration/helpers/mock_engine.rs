use async_trait::async_trait;
use leadrs::domain::models::scraped_record::{Priority, ScrapedRecord};
use leadrs::engines::traits::{EngineError, ScraperEngine};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Scripted per-URL behaviour for the mock engine.
pub enum ScriptedOutcome {
    Lead { lead_score: u8, confidence: u8 },
    NavigationError(&'static str),
    Timeout,
}

/// In-memory stand-in for the browser engine.
///
/// Returns scripted records instead of driving Chromium and records
/// every call so tests can assert on engine interactions.
pub struct MockEngine {
    outcomes: HashMap<String, ScriptedOutcome>,
    failing_initializations: u32,
    pub initialize_calls: AtomicU32,
    pub close_calls: AtomicU32,
    pub scraped_urls: Mutex<Vec<String>>,
    pub screenshot_paths: Mutex<Vec<PathBuf>>,
}

impl MockEngine {
    pub fn new(outcomes: Vec<(&str, ScriptedOutcome)>) -> Self {
        Self {
            outcomes: outcomes
                .into_iter()
                .map(|(url, outcome)| (url.to_string(), outcome))
                .collect(),
            failing_initializations: 0,
            initialize_calls: AtomicU32::new(0),
            close_calls: AtomicU32::new(0),
            scraped_urls: Mutex::new(Vec::new()),
            screenshot_paths: Mutex::new(Vec::new()),
        }
    }

    /// The first `count` initialize calls fail with a launch error.
    pub fn failing_first_initializations(mut self, count: u32) -> Self {
        self.failing_initializations = count;
        self
    }
}

#[async_trait]
impl ScraperEngine for MockEngine {
    async fn initialize(&self) -> Result<(), EngineError> {
        let call = self.initialize_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failing_initializations {
            return Err(EngineError::LaunchFailed("chromium not found".to_string()));
        }
        Ok(())
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedRecord, EngineError> {
        self.scraped_urls.lock().unwrap().push(url.to_string());
        match self.outcomes.get(url) {
            Some(ScriptedOutcome::Lead {
                lead_score,
                confidence,
            }) => {
                let mut record = ScrapedRecord::new(url);
                record.lead_score = *lead_score;
                record.confidence = *confidence;
                record.priority = Priority::from_score(*lead_score);
                Ok(record)
            }
            Some(ScriptedOutcome::NavigationError(message)) => {
                Err(EngineError::NavigationFailed(message.to_string()))
            }
            Some(ScriptedOutcome::Timeout) => Err(EngineError::Timeout),
            None => Err(EngineError::Other(format!(
                "no scripted outcome for {}",
                url
            ))),
        }
    }

    async fn screenshot(&self, _url: &str, path: &Path) -> Result<(), EngineError> {
        self.screenshot_paths.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
