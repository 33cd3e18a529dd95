use clap::ValueEnum;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Ingredients,
    Tags,
}

impl Kind {
    pub fn label(self) -> &'static str {
        match self {
            Kind::Ingredients => "ingredients",
            Kind::Tags => "tags",
        }
    }
}

/// One entry of an ingredients fixture, e.g. `{"name": "flour", "measurement_unit": "g"}`.
#[derive(Deserialize, Debug)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Deserialize, Debug)]
pub struct TagRecord {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub inserted: usize,
    pub skipped: usize,
}
