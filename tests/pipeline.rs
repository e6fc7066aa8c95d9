use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use toll_scraper::{
    Amount, CheckerConfig, PaymentStatus, PlatePage, PlateRecord, ProgressEvent, ScraperError,
    Session, SessionLauncher, SessionProvider, TollChecker,
};

const NO_DUES: &str = "Résultat : Aucun passage en attente de paiement.";

/// プレートごとの本文を返すだけのポータル
#[derive(Clone, Default)]
struct Portal {
    bodies: Arc<HashMap<String, Result<String, String>>>,
}

struct PortalPage {
    portal: Portal,
    plate: Mutex<Option<String>>,
}

#[async_trait]
impl PlatePage for PortalPage {
    async fn goto(&self, _url: &str, _timeout: Duration) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), ScraperError> {
        if selector.contains("tarteaucitron") {
            return Err(ScraperError::Timeout(selector.to_string()));
        }
        Ok(())
    }

    async fn click(&self, _selector: &str) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn click_label(&self, _label: &str) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn fill(&self, _selector: &str, text: &str) -> Result<(), ScraperError> {
        *self.plate.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    async fn text_of(&self, _selector: &str) -> Result<Option<String>, ScraperError> {
        Ok(None)
    }

    async fn body_text(&self) -> Result<String, ScraperError> {
        let plate = self.plate.lock().unwrap().clone().unwrap_or_default();
        match self.portal.bodies.get(&plate) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(e)) => Err(ScraperError::Navigation(e.clone())),
            None => Ok(NO_DUES.to_string()),
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError> {
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<(), ScraperError> {
        Ok(())
    }
}

#[async_trait]
impl Session for Portal {
    async fn new_page(&self) -> Result<Box<dyn PlatePage>, ScraperError> {
        Ok(Box::new(PortalPage {
            portal: self.clone(),
            plate: Mutex::new(None),
        }))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        Ok(())
    }
}

struct PortalEngine {
    portal: Portal,
}

#[async_trait]
impl SessionLauncher for PortalEngine {
    fn name(&self) -> &str {
        "portal"
    }

    async fn launch(&self) -> Result<Box<dyn Session>, ScraperError> {
        Ok(Box::new(self.portal.clone()))
    }
}

struct MissingEngine;

#[async_trait]
impl SessionLauncher for MissingEngine {
    fn name(&self) -> &str {
        "missing"
    }

    async fn launch(&self) -> Result<Box<dyn Session>, ScraperError> {
        Err(ScraperError::BrowserInit("not installed".into()))
    }
}

fn portal() -> Portal {
    let mut bodies = HashMap::new();
    bodies.insert(
        "GH-404-IJ".to_string(),
        Ok("01/03/2024 A26 12,50 € 15/01/2024 A1 7,00 € 01/03/2024 total 12,50 €".to_string()),
    );
    bodies.insert(
        "KL-500-MN".to_string(),
        Err("net::ERR_CONNECTION_RESET".to_string()),
    );
    bodies.insert(
        "OP-600-QR".to_string(),
        Ok(format!("{} ancien passage 3,00 € 02/02/2023", NO_DUES)),
    );
    Portal {
        bodies: Arc::new(bodies),
    }
}

fn checker(batch_size: usize) -> TollChecker {
    let engines: Vec<Box<dyn SessionLauncher>> = vec![
        Box::new(MissingEngine),
        Box::new(PortalEngine { portal: portal() }),
    ];
    TollChecker::new(
        CheckerConfig::new()
            .without_delays()
            .with_batch_size(batch_size),
    )
    .with_provider(SessionProvider::new(engines))
}

fn input() -> Vec<PlateRecord> {
    ["OP-600-QR", " GH-404-IJ ", "AB-100-CD", "KL-500-MN", "ab-100-cd", "EF-200-GH", "ZZ-999-ZZ"]
        .iter()
        .map(|id| PlateRecord::new(id).unwrap())
        .collect()
}

#[tokio::test]
async fn test_one_sorted_result_per_plate() {
    let checker = Arc::new(checker(3));
    let (mut progress, handle) = checker.spawn(input());

    let mut events = Vec::new();
    while let Some(event) = progress.recv().await {
        events.push(event);
    }
    let report = handle.await.unwrap().unwrap();

    let ids: Vec<&str> = report.results.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(
        ids,
        vec!["AB-100-CD", "EF-200-GH", "GH-404-IJ", "KL-500-MN", "OP-600-QR", "ZZ-999-ZZ", "ab-100-cd"]
    );

    let due = &report.results[2];
    assert_eq!(due.status, PaymentStatus::Due(2));
    assert_eq!(due.amount, Amount::Value("12.50 €".into()));
    assert_eq!(due.formatted_dates(), vec!["15/01/2024", "01/03/2024"]);

    let failed = &report.results[3];
    assert_eq!(failed.status, PaymentStatus::Error);
    assert_eq!(failed.amount, Amount::NotApplicable);

    // 未払いなしの文言が優先
    let stale = &report.results[4];
    assert_eq!(stale.status, PaymentStatus::NoneDue);
    assert_eq!(stale.amount, Amount::zero());
    assert!(stale.passage_dates.is_empty());

    let increments: usize = events
        .iter()
        .map(|e| match e {
            ProgressEvent::Incremented(n) => *n,
            _ => 0,
        })
        .sum();
    assert_eq!(increments, 7);
    assert_eq!(
        events.iter().filter(|e| **e == ProgressEvent::Completed).count(),
        1
    );
    assert_eq!(events.last(), Some(&ProgressEvent::Completed));
}

#[tokio::test]
async fn test_results_independent_of_batch_size() {
    let (tx, _rx) = toll_scraper::progress::channel();
    let baseline = checker(1).run(input(), tx.clone()).await.unwrap().results;

    for batch_size in [2, 4, 7, 50] {
        let results = checker(batch_size).run(input(), tx.clone()).await.unwrap().results;
        assert_eq!(results, baseline, "batch size {}", batch_size);
    }
}

#[tokio::test]
async fn test_no_engine_is_fatal() {
    let engines: Vec<Box<dyn SessionLauncher>> = vec![Box::new(MissingEngine)];
    let checker = TollChecker::new(CheckerConfig::new().without_delays())
        .with_provider(SessionProvider::new(engines));
    let (tx, mut rx) = toll_scraper::progress::channel();

    let err = checker.run(input(), tx).await.unwrap_err();

    assert!(err.is_fatal());
    assert!(rx
        .poll()
        .iter()
        .all(|e| !matches!(e, ProgressEvent::Incremented(_) | ProgressEvent::Completed)));
}

#[tokio::test]
async fn test_empty_input() {
    let (tx, mut rx) = toll_scraper::progress::channel();

    let err = checker(5).run(Vec::new(), tx).await.unwrap_err();

    assert!(matches!(err, ScraperError::EmptyInput));
    assert!(rx.poll().is_empty());
}
