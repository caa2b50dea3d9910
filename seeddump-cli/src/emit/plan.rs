//! Emitter that records the calls it receives instead of writing rows

use std::convert::Infallible;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmitOptions, Emitter};
use crate::catalog::EntityType;

/// One recorded emission call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedEmission {
    /// Zero-based position in the run
    pub position: usize,
    pub entity: String,
    pub options: EmitOptions,
}

/// Ordered emission calls of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionPlan {
    pub emissions: Vec<PlannedEmission>,
}

impl EmissionPlan {
    pub fn order(&self) -> Vec<&str> {
        self.emissions.iter().map(|e| e.entity.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }
}

/// Collects an [`EmissionPlan`]
#[derive(Debug, Default)]
pub struct PlanEmitter {
    plan: EmissionPlan,
}

impl PlanEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self) -> &EmissionPlan {
        &self.plan
    }

    pub fn into_plan(self) -> EmissionPlan {
        self.plan
    }
}

#[async_trait]
impl Emitter for PlanEmitter {
    type Error = Infallible;

    async fn emit(&mut self, entity: &EntityType, options: &EmitOptions) -> Result<(), Self::Error> {
        let position = self.plan.emissions.len();
        log::debug!("Planned {} at position {}", entity.name, position);
        self.plan.emissions.push(PlannedEmission {
            position,
            entity: entity.name.clone(),
            options: options.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let mut emitter = PlanEmitter::new();
        let first = EmitOptions::default();
        let rest = EmitOptions {
            append: true,
            ..EmitOptions::default()
        };

        emitter.emit(&EntityType::new("users", true), &first).await.unwrap();
        emitter.emit(&EntityType::new("posts", true), &rest).await.unwrap();

        let plan = emitter.into_plan();
        assert_eq!(plan.order(), vec!["users", "posts"]);
        assert_eq!(plan.emissions[1].position, 1);
        assert!(!plan.emissions[0].options.append);
        assert!(plan.emissions[1].options.append);
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let plan = EmissionPlan {
            emissions: vec![PlannedEmission {
                position: 0,
                entity: "users".into(),
                options: EmitOptions::default(),
            }],
        };

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["emissions"][0]["entity"], "users");
        assert_eq!(json["emissions"][0]["options"]["append"], false);
        assert!(json["emissions"][0]["options"].get("limit").is_none());
    }
}
