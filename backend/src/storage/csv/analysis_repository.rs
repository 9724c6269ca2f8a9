use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use super::connection::CsvConnection;
use crate::domain::models::analysis::AnalysisResult;
use crate::storage::traits::AnalysisStorage;

/// Analysis results stored as a YAML list in `analysis_results.yaml`
#[derive(Clone)]
pub struct AnalysisRepository {
    connection: CsvConnection,
}

impl AnalysisRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_results_path(&self) -> PathBuf {
        self.connection.base_directory().join("analysis_results.yaml")
    }
}

impl AnalysisStorage for AnalysisRepository {
    fn store_result(&self, result: &AnalysisResult) -> Result<()> {
        let mut results = self.list_results()?;
        results.push(result.clone());
        self.connection.write_yaml(&self.get_results_path(), &results)?;
        debug!("Stored analysis result {} ({} total)", result.id, results.len());
        Ok(())
    }

    fn list_results(&self) -> Result<Vec<AnalysisResult>> {
        Ok(self
            .connection
            .read_yaml(&self.get_results_path())?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;
    use chrono::Utc;
    use shared::AnalysisType;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[test]
    fn test_results_append() {
        let env = TestEnvironment::new().unwrap();
        let repo = AnalysisRepository::new(env.connection.clone());
        assert!(repo.list_results().unwrap().is_empty());

        let mut scores = BTreeMap::new();
        scores.insert("motor".to_string(), 0.8);
        let result = AnalysisResult {
            id: Uuid::new_v4(),
            media_id: Uuid::new_v4(),
            analysis_type: AnalysisType::Development,
            result: "Analysis complete".to_string(),
            confidence: 0.9,
            recommendations: vec!["Tummy time".to_string()],
            development_scores: scores,
            emotion_tags: Vec::new(),
            analyzed_at: Utc::now(),
        };
        repo.store_result(&result).unwrap();
        repo.store_result(&result).unwrap();

        let results = repo.list_results().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].development_scores["motor"], 0.8);
    }
}
