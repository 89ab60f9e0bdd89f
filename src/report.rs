use crate::analyzer::{AnalyzerImpl, QueryAnalysis};
use crate::config::HistoryConfig;
use crate::model::{DatasetOverview, DeclineQuery, PriceRecord, StockListing};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub name: String,
    #[serde(flatten)]
    pub analysis: QueryAnalysis,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub symbol: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub records: Vec<PriceRecord>,
}

/// The JSON document written by the binary after every query has run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub overview: DatasetOverview,
    pub stocks: Vec<StockListing>,
    pub histories: Vec<HistoryReport>,
    pub queries: Vec<QueryReport>,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dataset overview under the default query, the stock listing and the requested histories,
/// followed by the finished query reports.
pub fn build_report(
    analyzer: &AnalyzerImpl,
    histories: &[HistoryConfig],
    queries: Vec<QueryReport>,
) -> Report {
    let histories = histories
        .iter()
        .map(|h| HistoryReport {
            symbol: h.symbol.trim().to_uppercase(),
            start_date: h.start_date,
            end_date: h.end_date,
            records: analyzer.history(&h.symbol, h.start_date, h.end_date).to_vec(),
        })
        .collect();

    Report {
        overview: analyzer.overview(&DeclineQuery::default()),
        stocks: analyzer.list_stocks(),
        histories,
        queries,
    }
}

pub fn write_report(path: &str, report: &Report) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::series::tests::{day, record};
    use crate::storage::{CompanyDirectory, SeriesStore};
    use std::sync::Arc;

    fn analyzer() -> AnalyzerImpl {
        let store = SeriesStore::build(vec![
            record("ABC", day(1), 100.0),
            record("ABC", day(2), 70.0),
            record("ABC", day(3), 80.0),
            record("XYZ", day(1), 10.0),
            record("XYZ", day(2), 11.0),
        ])
        .unwrap();
        let directory: CompanyDirectory = [("abc", "Abc Corp")].into_iter().collect();
        AnalyzerImpl::new(Arc::new(store), Arc::new(directory))
    }

    #[tokio::test]
    async fn report_carries_overview_listing_and_histories() {
        let analyzer = analyzer();
        let analysis = analyzer.analyze(&DeclineQuery::default(), None).await.unwrap();
        let histories = vec![HistoryConfig {
            symbol: "abc".into(),
            start_date: Some(day(2)),
            end_date: None,
        }];
        let queries = vec![QueryReport {
            name: "all".into(),
            analysis,
        }];

        let report = build_report(&analyzer, &histories, queries);
        assert_eq!(report.overview.total_records, 5);
        assert_eq!(report.overview.decline_count, 1);
        let worst = report.overview.worst_decline.as_ref().unwrap();
        assert_eq!((worst.symbol.as_str(), worst.company_name.as_str()), ("ABC", "Abc Corp"));
        assert_eq!(report.stocks.len(), 2);
        assert_eq!(report.stocks[0].name, "Abc Corp");
        assert_eq!(report.histories[0].symbol, "ABC");
        assert_eq!(report.histories[0].records.len(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overview"]["unique_symbols"], 2);
        assert_eq!(json["stocks"][1]["symbol"], "XYZ");
        assert_eq!(json["queries"][0]["name"], "all");
        assert_eq!(json["queries"][0]["statistics"]["total_count"], 1);
        assert_eq!(json["histories"][0]["records"][0]["open"], 70.0);
    }

    #[test]
    fn writes_pretty_json() {
        let path =
            std::env::temp_dir().join(format!("dip-scout-report-{}.json", std::process::id()));
        let report = build_report(&analyzer(), &[], Vec::new());
        write_report(path.to_str().unwrap(), &report).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["queries"], serde_json::json!([]));
        assert_eq!(json["overview"]["worst_decline"]["symbol"], "ABC");
    }
}
