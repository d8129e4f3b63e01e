use std::collections::BTreeMap;

use super::domain::{
    EvaluationMethod, EvaluationResult, InspectionId, InspectionItem, ItemId, ItemSupplement,
    Requirement, RequirementClass, RequirementId, Verdict,
};
use super::evaluation::InspectionResultCalculator;
use super::store::RequirementEvaluationStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementTemplate {
    pub sequence: u16,
    pub class: RequirementClass,
    pub description: &'static str,
}

/// Master checklist entry copied into every new inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTemplate {
    pub item_number: u16,
    pub key: &'static str,
    pub title: &'static str,
    pub supplement: ItemSupplement,
    pub requirements: Vec<RequirementTemplate>,
}

/// Supplies the fixed, ordered set of items used to pre-populate an inspection.
pub trait RequirementTemplateProvider: Send + Sync {
    fn items(&self) -> Vec<ItemTemplate>;
}

/// Good agricultural practice checklist used for field inspections.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTemplate;

fn main_requirement(sequence: u16, description: &'static str) -> RequirementTemplate {
    RequirementTemplate {
        sequence,
        class: RequirementClass::Main,
        description,
    }
}

fn secondary_requirement(sequence: u16, description: &'static str) -> RequirementTemplate {
    RequirementTemplate {
        sequence,
        class: RequirementClass::Secondary,
        description,
    }
}

impl RequirementTemplateProvider for StandardTemplate {
    fn items(&self) -> Vec<ItemTemplate> {
        vec![
            ItemTemplate {
                item_number: 1,
                key: "land",
                title: "Land history and site selection",
                supplement: ItemSupplement::LandHistory {
                    previous_land_use: None,
                    contamination_risk: None,
                },
                requirements: vec![
                    main_requirement(
                        1,
                        "Land is free from hazardous waste and heavy metal contamination",
                    ),
                    secondary_requirement(
                        2,
                        "Land use over the previous two seasons is documented",
                    ),
                    secondary_requirement(3, "Erosion control is in place on sloped plots"),
                ],
            },
            ItemTemplate {
                item_number: 2,
                key: "water",
                title: "Water source and irrigation",
                supplement: ItemSupplement::WaterSource {
                    source: None,
                    last_tested_on: None,
                },
                requirements: vec![
                    main_requirement(
                        1,
                        "Irrigation water is not drawn from sewage or industrial outflow",
                    ),
                    secondary_requirement(
                        2,
                        "Water quality was tested within the last twelve months",
                    ),
                    secondary_requirement(3, "Water sources are marked on the farm map"),
                ],
            },
            ItemTemplate {
                item_number: 3,
                key: "inputs",
                title: "Fertilizer and pesticide use",
                supplement: ItemSupplement::AgroInputs {
                    storage_locked: None,
                    registered_products_only: None,
                },
                requirements: vec![
                    main_requirement(1, "Only registered pesticides are applied"),
                    main_requirement(2, "Pre-harvest intervals are observed"),
                    secondary_requirement(3, "Chemical storage is locked and ventilated"),
                    secondary_requirement(4, "Application records list product, dose and date"),
                ],
            },
            ItemTemplate {
                item_number: 4,
                key: "harvest",
                title: "Harvest and post-harvest handling",
                supplement: ItemSupplement::Harvest {
                    containers_clean: None,
                    estimated_yield_kg: None,
                },
                requirements: vec![
                    main_requirement(
                        1,
                        "Harvest containers are clean and never used for chemicals",
                    ),
                    secondary_requirement(2, "Produce is kept off bare ground after picking"),
                    secondary_requirement(3, "Clean water is available for hand washing"),
                ],
            },
            ItemTemplate {
                item_number: 5,
                key: "records",
                title: "Records and traceability",
                supplement: ItemSupplement::Generic {
                    answers: BTreeMap::new(),
                },
                requirements: vec![
                    secondary_requirement(1, "Planting and harvest dates are recorded"),
                    secondary_requirement(2, "Produce lots can be traced back to a plot"),
                    secondary_requirement(3, "Customer complaints are logged and followed up"),
                ],
            },
        ]
    }
}

/// Build unevaluated inspection items from a template.
pub fn instantiate_items(
    inspection_id: &InspectionId,
    templates: Vec<ItemTemplate>,
    calculator: &InspectionResultCalculator,
) -> Vec<InspectionItem> {
    let mut items: Vec<InspectionItem> = templates
        .into_iter()
        .map(|template| {
            let requirements = template
                .requirements
                .iter()
                .map(|requirement| Requirement {
                    id: RequirementId(format!("{}-{:02}", template.key, requirement.sequence)),
                    sequence: requirement.sequence,
                    class: requirement.class,
                    description: requirement.description.to_string(),
                    result: EvaluationResult::Unevaluated,
                    method: EvaluationMethod::Pending,
                    note: None,
                })
                .collect();

            let mut item = InspectionItem {
                id: ItemId(format!("{inspection_id}-{}", template.key)),
                item_number: template.item_number,
                title: template.title.to_string(),
                requirements: RequirementEvaluationStore::new(requirements),
                result: Verdict::Fail,
                supplement: template.supplement,
            };
            item.result = calculator.item_verdict(&item);
            item
        })
        .collect();

    items.sort_by_key(|item| item.item_number);
    items
}
