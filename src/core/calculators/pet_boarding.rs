use crate::core::engine::Calculator;
use crate::core::error::CalcError;
use crate::core::schema::{CalculatorSchema, ChoiceOption, FieldSpec};
use crate::core::tiers::{Tier, TierScan, TierTable};
use crate::core::types::{InputRecord, ResultBuilder, ResultRecord, Unit};

use super::factor;

const PET_TYPES: &[ChoiceOption] = &[
    ChoiceOption::new("dog", "Dog"),
    ChoiceOption::new("cat", "Cat"),
    ChoiceOption::new("other", "Other small pet"),
];

const PET_SIZES: &[ChoiceOption] = &[
    ChoiceOption::new("small", "Small (under 20 lb)"),
    ChoiceOption::new("medium", "Medium (20-50 lb)"),
    ChoiceOption::new("large", "Large (50-90 lb)"),
    ChoiceOption::new("giant", "Giant (over 90 lb)"),
];

const FACILITIES: &[ChoiceOption] = &[
    ChoiceOption::new("standard", "Standard kennel"),
    ChoiceOption::new("luxury", "Luxury suite"),
    ChoiceOption::new("in-home", "In-home sitter"),
];

const TYPE_FACTORS: &[(&str, f64)] = &[("dog", 1.00), ("cat", 0.80), ("other", 0.70)];
const SIZE_FACTORS: &[(&str, f64)] = &[
    ("small", 1.00),
    ("medium", 1.10),
    ("large", 1.25),
    ("giant", 1.40),
];
const FACILITY_FACTORS: &[(&str, f64)] = &[("standard", 1.00), ("luxury", 1.50), ("in-home", 0.90)];

pub const HOLIDAY_SURCHARGE: f64 = 0.15;
pub const GROOMING_FEE_PER_PET: f64 = 40.0;
pub const MEDICATION_FEE_PER_NIGHT: f64 = 5.0;

const DURATION_TIERS: &[Tier] = &[
    Tier::new(30.0, "monthly", 0.20),
    Tier::new(14.0, "extended", 0.15),
    Tier::new(7.0, "weekly", 0.10),
];

pub static DURATION_DISCOUNT: TierTable =
    TierTable::new("duration_discount", TierScan::AtLeast, DURATION_TIERS, "standard", 0.0);

pub struct PetBoarding {
    schema: CalculatorSchema,
}

impl PetBoarding {
    pub fn new() -> Self {
        Self {
            schema: CalculatorSchema {
                slug: "pet-boarding-cost",
                name: "Pet Boarding Cost Calculator",
                summary: "Estimate a boarding stay from nightly rate, pet profile, facility and extras.",
                fields: vec![
                    FieldSpec::choice("pet_type", "Pet type", PET_TYPES).default_choice("dog"),
                    FieldSpec::choice("pet_size", "Pet size", PET_SIZES).default_choice("medium"),
                    FieldSpec::integer("nights", "Number of nights", 1.0, 365.0),
                    FieldSpec::integer("pets", "Number of pets", 1.0, 10.0).default_number(1.0),
                    FieldSpec::number("nightly_rate", "Base nightly rate", 0.01, 1_000.0)
                        .default_number(45.0),
                    FieldSpec::choice("facility", "Facility type", FACILITIES)
                        .default_choice("standard"),
                    FieldSpec::flag("holiday", "Holiday period"),
                    FieldSpec::flag("grooming", "Add grooming"),
                    FieldSpec::flag("medication", "Medication administration"),
                ],
            },
        }
    }
}

impl Default for PetBoarding {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for PetBoarding {
    fn schema(&self) -> &CalculatorSchema {
        &self.schema
    }

    fn tier_tables(&self) -> Vec<&'static TierTable> {
        vec![&DURATION_DISCOUNT]
    }

    fn evaluate(&self, input: &InputRecord) -> Result<ResultRecord, CalcError> {
        let pet_type = input.choice("pet_type")?;
        let nights = input.number("nights")?;
        let pets = input.number("pets")?;
        let rate = input.number("nightly_rate")?;

        let type_factor = factor(TYPE_FACTORS, "pet_type", pet_type)?;
        let size_factor = if pet_type == "dog" {
            factor(SIZE_FACTORS, "pet_size", input.choice("pet_size")?)?
        } else {
            1.0
        };
        let facility_factor = factor(FACILITY_FACTORS, "facility", input.choice("facility")?)?;

        let base = rate * nights * pets;
        let pet_adjustment = base * (type_factor * size_factor - 1.0);
        let facility_adjustment = (base + pet_adjustment) * (facility_factor - 1.0);

        let mut result = ResultBuilder::new("Total boarding cost", Unit::Currency);
        result
            .component("base", "Base cost", base)
            .component("pet_adjustment", "Pet type and size adjustment", pet_adjustment)
            .component("facility_adjustment", "Facility adjustment", facility_adjustment);

        if input.flag("holiday") {
            let surcharge = result.subtotal() * HOLIDAY_SURCHARGE;
            result.component("holiday_surcharge", "Holiday surcharge", surcharge);
        }

        let tier = DURATION_DISCOUNT.classify(nights);
        let discount = -result.subtotal() * tier.value;
        result
            .component(
                "duration_discount",
                format!("Duration discount ({})", tier.label),
                discount,
            )
            .classification(DURATION_DISCOUNT.name, nights, tier);

        if input.flag("grooming") {
            result.component("grooming", "Grooming", GROOMING_FEE_PER_PET * pets);
        }
        if input.flag("medication") {
            result.component(
                "medication",
                "Medication administration",
                MEDICATION_FEE_PER_NIGHT * nights * pets,
            );
        }

        let total = result.subtotal();
        result.metric(
            "cost_per_pet_night",
            "Effective cost per pet per night",
            total / (nights * pets),
            Unit::Currency,
        );
        if tier.index.is_none() && nights >= 5.0 {
            result.note("Stays of 7 nights or more qualify for the weekly discount.");
        }

        Ok(result.build())
    }
}
