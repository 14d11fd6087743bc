use thiserror::Error;

use super::types::{LifeExpectancy, Population};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no life expectancy entry for population {0:?}")]
    UnknownPopulation(Population),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifeTableEntry {
    pub population: Population,
    pub age: f64,
}

/// Static life-expectancy table with shared provenance metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LifeTable {
    pub source: String,
    pub year: String,
    pub country: String,
    pub entries: Vec<LifeTableEntry>,
}

impl Default for LifeTable {
    /// 2023 national baseline preset: male 76, female 80, general 78.
    fn default() -> Self {
        Self {
            source: "China national baseline (preset)".to_string(),
            year: "2023".to_string(),
            country: "China".to_string(),
            entries: vec![
                LifeTableEntry {
                    population: Population::Male,
                    age: 76.0,
                },
                LifeTableEntry {
                    population: Population::Female,
                    age: 80.0,
                },
                LifeTableEntry {
                    population: Population::General,
                    age: 78.0,
                },
            ],
        }
    }
}

impl LifeTable {
    pub fn lookup(&self, population: Population) -> Result<LifeExpectancy, LookupError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.population == population)
            .ok_or(LookupError::UnknownPopulation(population))?;
        Ok(LifeExpectancy {
            age: entry.age,
            source: self.source.clone(),
            year: self.year.clone(),
            country: self.country.clone(),
            population,
        })
    }
}
